//! Shared signal rules.
//!
//! Each rule inspects one (card, message) pair and yields hits carrying a
//! raw contribution for one scoring dimension together with the phrase that
//! explains it. The scorer sums the contributions, the composer collects the
//! phrases, so the two can never disagree about what fired.

use cardmatch_model::{CardRecord, Dimension, UserContext};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contains_any;
use crate::lexicon::{
    audience_keywords, category_display_name, category_field_rate, store_aliases,
    CASHBACK_TOKENS, CATEGORY_KEYWORDS, FEE_FREE_TOKENS, FEE_TOKEN,
};

/// `base + rate / divisor`, the shape shared by the rate-scaled signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBonus {
    pub base: f64,
    pub divisor: f64,
}

impl RateBonus {
    pub fn apply(&self, rate: f64) -> f64 {
        self.base + rate / self.divisor
    }
}

/// Bucket for the cashback-rate signal: cards whose max rate is at least
/// `min_rate` score `value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashbackTier {
    pub min_rate: f64,
    pub value: f64,
}

/// Thresholds and raw values used by the rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub exact_store: RateBonus,
    pub store_category: RateBonus,
    pub general_category: RateBonus,
    /// Category rates must exceed this to count
    pub min_category_rate: f64,
    /// Checked in order, first match wins
    pub cashback_tiers: Vec<CashbackTier>,
    pub fee_free_match: f64,
    pub fee_mention: f64,
    pub audience_match: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            exact_store: RateBonus { base: 1.0, divisor: 10.0 },
            store_category: RateBonus { base: 0.8, divisor: 20.0 },
            general_category: RateBonus { base: 0.3, divisor: 30.0 },
            min_category_rate: 1.0,
            cashback_tiers: vec![
                CashbackTier { min_rate: 5.0, value: 1.0 },
                CashbackTier { min_rate: 3.0, value: 0.7 },
                CashbackTier { min_rate: 2.0, value: 0.4 },
            ],
            fee_free_match: 1.0,
            fee_mention: 0.2,
            audience_match: 0.5,
        }
    }
}

impl SignalConfig {
    fn cashback_tier(&self, max_rate: f64) -> f64 {
        self.cashback_tiers
            .iter()
            .find(|tier| max_rate >= tier.min_rate)
            .map(|tier| tier.value)
            .unwrap_or(0.0)
    }
}

/// A normalized message plus caller context.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub message: &'a str,
    pub context: &'a UserContext,
}

impl<'a> Query<'a> {
    /// `message` must already be normalized.
    pub fn new(message: &'a str, context: &'a UserContext) -> Self {
        Self { message, context }
    }
}

/// One fired condition.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub dimension: Dimension,
    /// Raw (unweighted) contribution, may be 0 for explanation-only hits
    pub value: f64,
    pub explanation: String,
}

impl RuleHit {
    fn new(dimension: Dimension, value: f64, explanation: String) -> Self {
        Self { dimension, value, explanation }
    }
}

pub type Evaluate = fn(&CardRecord, &Query<'_>, &SignalConfig) -> Vec<RuleHit>;

/// A scoring rule bound to the dimension it feeds.
pub struct Rule {
    pub dimension: Dimension,
    pub evaluate: Evaluate,
}

/// Every message-driven rule, in explanation order.
pub const RULES: &[Rule] = &[
    Rule { dimension: Dimension::ExactStoreMatch, evaluate: exact_store },
    Rule { dimension: Dimension::StoreCategory, evaluate: store_category },
    Rule { dimension: Dimension::GeneralCategory, evaluate: general_category },
    Rule { dimension: Dimension::AnnualFee, evaluate: annual_fee },
    Rule { dimension: Dimension::CashbackRate, evaluate: cashback_rate },
    Rule { dimension: Dimension::TargetAudience, evaluate: target_audience },
];

/// Run every rule against a card.
pub fn evaluate_rules(card: &CardRecord, query: &Query<'_>, config: &SignalConfig) -> Vec<RuleHit> {
    RULES
        .iter()
        .flat_map(|rule| (rule.evaluate)(card, query, config))
        .collect()
}

/// Hits follow the card's store map, which iterates in key order.
fn exact_store(card: &CardRecord, query: &Query<'_>, config: &SignalConfig) -> Vec<RuleHit> {
    card.specific_stores
        .iter()
        .filter(|(store, _)| contains_any(query.message, &store_aliases(store)))
        .map(|(store, rate)| {
            let value = config.exact_store.apply(*rate);
            debug!(card = %card.id, store = %store, rate, value, "exact store match");
            RuleHit::new(
                Dimension::ExactStoreMatch,
                value,
                format!("{}消費享{}%回饋", store, rate),
            )
        })
        .collect()
}

/// Keywords are matched as written against the lowercased message, so a
/// keyword with upper-case letters (`OK`) never fires.
fn store_category(card: &CardRecord, query: &Query<'_>, config: &SignalConfig) -> Vec<RuleHit> {
    let mut hits = Vec::new();
    for (category, keywords) in CATEGORY_KEYWORDS {
        let Some(keyword) = keywords.iter().find(|k| query.message.contains(**k)) else {
            continue;
        };
        let rate = category_field_rate(card, category);
        if rate > config.min_category_rate {
            let value = config.store_category.apply(rate);
            debug!(card = %card.id, category, rate, value, "store category match");
            hits.push(RuleHit::new(
                Dimension::StoreCategory,
                value,
                format!("{}消費{}%回饋", keyword, rate),
            ));
        }
    }
    hits
}

fn general_category(card: &CardRecord, query: &Query<'_>, config: &SignalConfig) -> Vec<RuleHit> {
    card.cashback_rates
        .iter()
        .filter(|(_, rate)| **rate > config.min_category_rate)
        .filter_map(|(category, rate)| {
            let name = category_display_name(category);
            if !query.message.contains(name.to_lowercase().as_str()) {
                return None;
            }
            let value = config.general_category.apply(*rate);
            debug!(card = %card.id, category = %category, rate, value, "general category match");
            Some(RuleHit::new(
                Dimension::GeneralCategory,
                value,
                format!("{}消費{}%回饋", name, rate),
            ))
        })
        .collect()
}

fn fee_phrase(card: &CardRecord) -> String {
    if card.is_fee_free() {
        "永久免年費".to_string()
    } else {
        format!("年費{}元", card.annual_fee)
    }
}

fn annual_fee(card: &CardRecord, query: &Query<'_>, config: &SignalConfig) -> Vec<RuleHit> {
    let value = if contains_any(query.message, FEE_FREE_TOKENS) {
        if card.is_fee_free() {
            config.fee_free_match
        } else {
            0.0
        }
    } else if query.message.contains(FEE_TOKEN) {
        config.fee_mention
    } else {
        return Vec::new();
    };
    debug!(card = %card.id, fee = card.annual_fee, value, "annual fee signal");
    vec![RuleHit::new(Dimension::AnnualFee, value, fee_phrase(card))]
}

fn cashback_rate(card: &CardRecord, query: &Query<'_>, config: &SignalConfig) -> Vec<RuleHit> {
    if !contains_any(query.message, CASHBACK_TOKENS) {
        return Vec::new();
    }
    let max_rate = card.max_cashback_rate();
    let value = config.cashback_tier(max_rate);
    debug!(card = %card.id, max_rate, value, "cashback signal");
    vec![RuleHit::new(
        Dimension::CashbackRate,
        value,
        format!("最高{}%回饋", max_rate),
    )]
}

fn target_audience(card: &CardRecord, query: &Query<'_>, config: &SignalConfig) -> Vec<RuleHit> {
    card.target_audience
        .iter()
        .filter(|tag| {
            query.context.declares(tag) || contains_any(query.message, &audience_keywords(tag))
        })
        .map(|tag| {
            debug!(card = %card.id, audience = %tag, "target audience match");
            RuleHit::new(
                Dimension::TargetAudience,
                config.audience_match,
                format!("適合{}", tag),
            )
        })
        .collect()
}
