//! Recommendation composition.
//!
//! Turns a selected card into the structured recommendation handed to the
//! rendering layer: explanation phrases from the shared rule table, the
//! response shape for the user's experience level, and active promotions.

use cardmatch_features::{category_rate_label, evaluate_rules, normalize_message, Query, SignalConfig};
use cardmatch_model::{
    CardRecord, ExperienceLevel, Promotion, RateEntry, Recommendation, RecommendationDetail,
    UserContext,
};
use tracing::debug;

/// Phrases shown to novices.
pub const NOVICE_EXPLANATION_LIMIT: usize = 2;

/// Benefit lines used when no rule fired.
pub const DEFAULT_BENEFIT_COUNT: usize = 2;

pub const PROMOTION_LIMIT: usize = 2;

/// Composes recommendations.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    signals: SignalConfig,
}

impl Composer {
    /// Use the same signal configuration as the scorer.
    pub fn new(signals: SignalConfig) -> Self {
        Self { signals }
    }

    /// Explanation phrases for a card, in rule order, without duplicates.
    pub fn explanations(&self, card: &CardRecord, message: &str, context: &UserContext) -> Vec<String> {
        let normalized = normalize_message(message);
        let query = Query::new(&normalized, context);

        let mut phrases: Vec<String> = Vec::new();
        for hit in evaluate_rules(card, &query, &self.signals) {
            if !phrases.contains(&hit.explanation) {
                phrases.push(hit.explanation);
            }
        }

        if phrases.is_empty() {
            phrases.extend(card.benefits.iter().take(DEFAULT_BENEFIT_COUNT).cloned());
        }
        phrases
    }

    pub fn compose(
        &self,
        card: &CardRecord,
        message: &str,
        level: ExperienceLevel,
        promotions: Vec<Promotion>,
    ) -> Recommendation {
        self.compose_with_context(card, message, &UserContext::default(), level, promotions)
    }

    pub fn compose_with_context(
        &self,
        card: &CardRecord,
        message: &str,
        context: &UserContext,
        level: ExperienceLevel,
        promotions: Vec<Promotion>,
    ) -> Recommendation {
        let mut explanations = self.explanations(card, message, context);

        let detail = match level {
            ExperienceLevel::Advanced => RecommendationDetail::Detailed {
                rate_table: rate_table(card, self.signals.min_category_rate),
                requirements: card.application_requirements.clone(),
            },
            ExperienceLevel::Novice => {
                explanations.truncate(NOVICE_EXPLANATION_LIMIT);
                RecommendationDetail::Simple {
                    education: education_sentence(card),
                }
            }
        };

        debug!(card = %card.id, %level, explanations = ?explanations, "composed recommendation");
        Recommendation {
            card: card.clone(),
            level,
            explanations,
            promotions: promotions.into_iter().take(PROMOTION_LIMIT).collect(),
            detail,
        }
    }
}

/// Categories above the minimum rate, with long labels.
pub fn rate_table(card: &CardRecord, min_rate: f64) -> Vec<RateEntry> {
    card.cashback_rates
        .iter()
        .filter(|(_, rate)| **rate > min_rate)
        .map(|(category, rate)| RateEntry {
            category: category.clone(),
            label: category_rate_label(category).to_string(),
            rate: *rate,
        })
        .collect()
}

/// One sentence telling a novice why the card suits them.
pub fn education_sentence(card: &CardRecord) -> String {
    let audience = card
        .target_audience
        .first()
        .map(String::as_str)
        .unwrap_or("一般用戶");
    let ease = if card.is_fee_free() { "無年費負擔" } else { "回饋豐富" };
    format!("這張卡特別適合{}，使用簡單且{}。", audience, ease)
}

/// Compose with the default signal configuration.
pub fn compose(
    card: &CardRecord,
    message: &str,
    level: ExperienceLevel,
    promotions: Vec<Promotion>,
) -> Recommendation {
    Composer::default().compose(card, message, level, promotions)
}
