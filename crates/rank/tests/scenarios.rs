//! End-to-end matching scenarios: rank, classify and compose.

use cardmatch_classify::classify;
use cardmatch_explain::compose;
use cardmatch_model::{
    CardRecord, Dimension, ExperienceLevel, FallbackStrategy, RecommendationDetail, UserContext,
};
use cardmatch_rank::{find_best_match, Matcher, ScoringConfig, ScoringWeights};
use pretty_assertions::assert_eq;

fn gogo() -> CardRecord {
    CardRecord::new("taiwan_gogo", "台新@GoGo卡")
        .with_rate("supermarket", 3.0)
        .with_rate("dining", 3.0)
        .with_rate("overseas", 2.8)
        .with_rate("digital", 3.8)
        .with_rate("online", 5.0)
        .with_rate("general", 1.0)
        .with_store("7-11", 3.0)
        .with_store("家樂福", 3.0)
        .with_store("momo", 5.0)
        .with_store("PChome", 5.0)
        .with_audience("數位原生")
        .with_audience("小資族")
        .with_audience("學生")
        .with_benefit("永久免年費")
        .with_benefit("數位通路高回饋")
}

fn koko() -> CardRecord {
    CardRecord::new("cathay_koko", "國泰KOKO卡")
        .with_rate("online", 5.0)
        .with_rate("mobile", 3.0)
        .with_rate("streaming", 5.0)
        .with_rate("general", 0.5)
        .with_store("Netflix", 5.0)
        .with_store("Spotify", 5.0)
        .with_store("momo", 5.0)
        .with_audience("年輕族群")
        .with_benefit("指定網購5%回饋")
}

fn basic() -> CardRecord {
    CardRecord::new("basic", "基本卡").with_rate("general", 1.0)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_seven_eleven_store_outranks_card_without_it() {
    let catalog = vec![koko(), gogo()];
    let message = "我想要在7-11消費有回饋的信用卡";
    let ranked = Matcher::default()
        .rank(message, &catalog, &UserContext::default())
        .unwrap();

    assert_eq!(ranked[0].card.id, "taiwan_gogo");
    assert!(approx(ranked[0].breakdown.exact_store_match, 1.3));
    let weights = ScoringWeights::default();
    assert!(approx(
        ranked[0].breakdown.exact_store_match * weights.weight(Dimension::ExactStoreMatch),
        65.0
    ));
    assert!(ranked[0].score > ranked[1].score);
    assert_eq!(ranked[1].breakdown.exact_store_match, 0.0);
}

#[test]
fn test_fee_free_fallback_picks_higher_max_cashback() {
    // Without the annual-fee signal nothing in this message scores.
    let config = ScoringConfig {
        weights: ScoringWeights {
            annual_fee: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let catalog = vec![basic(), koko()];
    let best = Matcher::new(config)
        .find_best_match("免年費的信用卡有哪些", &catalog, &UserContext::default())
        .unwrap();

    assert_eq!(best.card.id, "cathay_koko");
    assert_eq!(best.score, 10.0);
    assert_eq!(best.fallback, Some(FallbackStrategy::FreeCardWithBestRate));
}

#[test]
fn test_fee_free_request_scores_free_cards() {
    let paid = basic().with_fee(1800);
    let catalog = vec![paid, koko()];
    let best = find_best_match("免年費的信用卡有哪些", &catalog, &UserContext::default()).unwrap();
    assert_eq!(best.card.id, "cathay_koko");
    assert_eq!(best.breakdown.annual_fee, 1.0);
    assert_eq!(best.fallback, None);
}

#[test]
fn test_unmatched_message_uses_sentinel() {
    for catalog in [vec![gogo(), koko()], vec![basic().with_fee(600)]] {
        let best = find_best_match("信用卡", &catalog, &UserContext::default()).unwrap();
        assert!(best.score == 10.0 || best.score == 8.0, "score {}", best.score);
        assert!(best.fallback.is_some());
    }
}

#[test]
fn test_breakdown_always_complete() {
    let catalog = vec![gogo(), koko(), basic()];
    for message in ["", "信用卡", "momo", "免年費", "海外旅遊高回饋"] {
        let best = find_best_match(message, &catalog, &UserContext::default()).unwrap();
        assert_eq!(best.breakdown.iter().count(), 7);
        assert_eq!(best.breakdown.get(Dimension::FallbackBonus), 5.0);
    }
}

#[test]
fn test_every_score_has_floor() {
    let catalog = vec![gogo(), koko(), basic()];
    let weights = ScoringWeights::default();
    let floor = weights.fallback_bonus * weights.fallback_bonus;
    let ranked = Matcher::default()
        .rank("海外餐廳", &catalog, &UserContext::default())
        .unwrap();
    assert!(ranked.iter().all(|c| c.score >= floor));
}

#[test]
fn test_raising_category_rate_never_lowers_score() {
    let message = "超市買菜有回饋嗎";
    let context = UserContext::default();
    let mut previous = f64::MIN;
    for rate in [0.0, 0.5, 1.0, 1.5, 2.0, 3.0, 5.0, 8.0] {
        let card = basic().with_rate("supermarket", rate);
        let (score, _) =
            cardmatch_rank::score_card(&card, message, &context, &ScoringConfig::default());
        assert!(score >= previous, "rate {} dropped score", rate);
        previous = score;
    }
}

#[test]
fn test_matching_is_idempotent() {
    let catalog = vec![gogo(), koko(), basic()];
    let message = "網購momo高回饋";
    let first = find_best_match(message, &catalog, &UserContext::default()).unwrap();
    let second = find_best_match(message, &catalog, &UserContext::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_full_pipeline_for_novice() {
    // both cards target students; the tie keeps catalog order
    let catalog = vec![gogo(), koko()];
    let message = "我是學生，想要申請第一張信用卡，不知道怎麼選";
    let best = find_best_match(message, &catalog, &UserContext::default()).unwrap();
    let level = classify(message);
    let rec = compose(&best.card, message, level, vec![]);

    assert_eq!(level, ExperienceLevel::Novice);
    assert_eq!(rec.card.id, "taiwan_gogo");
    assert_eq!(rec.explanations, vec!["適合學生".to_string()]);
    assert!(matches!(rec.detail, RecommendationDetail::Simple { .. }));
}

#[test]
fn test_full_pipeline_for_advanced() {
    let catalog = vec![koko(), gogo()];
    let message = "想要比較台新和國泰的信用卡，分析一下優缺點和回饋率";
    let best = find_best_match(message, &catalog, &UserContext::default()).unwrap();
    let level = classify(message);
    let rec = compose(&best.card, message, level, vec![]);

    assert_eq!(level, ExperienceLevel::Advanced);
    assert!(matches!(rec.detail, RecommendationDetail::Detailed { .. }));
    assert!(rec.explanations.iter().any(|e| e.starts_with("最高")));
}

#[test]
fn test_english_word_containing_ok_falls_back() {
    let grocery = CardRecord::new("grocery", "超市卡").with_rate("supermarket", 3.0);
    let flat = CardRecord::new("flat", "一般卡").with_rate("general", 4.0);
    let catalog = vec![grocery, flat];
    let best = find_best_match("facebook廣告刷哪張", &catalog, &UserContext::default()).unwrap();

    assert_eq!(best.breakdown.store_category, 0.0);
    assert_eq!(best.card.id, "flat");
    assert_eq!(best.score, 10.0);
    assert_eq!(best.fallback, Some(FallbackStrategy::FreeCardWithBestRate));
}
