//! Scoring and ranking for credit card candidates.
//!
//! Scores every catalog card against a user message with the shared rule
//! table, ranks them, and falls back to a catalog-wide policy when no
//! message signal fired on any card.

use cardmatch_features::{evaluate_rules, normalize_message, Query, SignalConfig};
use cardmatch_model::{
    CardCatalog, CardRecord, Dimension, FallbackStrategy, ScoreBreakdown, ScoredCard, UserContext,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("Card catalog is empty")]
    EmptyCatalog,
}

/// Weight applied to each raw dimension value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub exact_store_match: f64,
    pub store_category: f64,
    pub cashback_rate: f64,
    pub annual_fee: f64,
    pub target_audience: f64,
    pub general_category: f64,
    /// Also the raw value of the fallback-bonus dimension
    pub fallback_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_store_match: 50.0,
            store_category: 30.0,
            cashback_rate: 25.0,
            annual_fee: 20.0,
            target_audience: 15.0,
            general_category: 10.0,
            fallback_bonus: 5.0,
        }
    }
}

impl ScoringWeights {
    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::ExactStoreMatch => self.exact_store_match,
            Dimension::StoreCategory => self.store_category,
            Dimension::CashbackRate => self.cashback_rate,
            Dimension::AnnualFee => self.annual_fee,
            Dimension::TargetAudience => self.target_audience,
            Dimension::GeneralCategory => self.general_category,
            Dimension::FallbackBonus => self.fallback_bonus,
        }
    }

    /// Weighted sum over every dimension.
    pub fn total(&self, breakdown: &ScoreBreakdown) -> f64 {
        breakdown.iter().map(|(d, v)| v * self.weight(d)).sum()
    }

    /// Weighted sum of the message-driven dimensions only.
    pub fn signal_total(&self, breakdown: &ScoreBreakdown) -> f64 {
        breakdown
            .iter()
            .filter(|(d, _)| *d != Dimension::FallbackBonus)
            .map(|(d, v)| v * self.weight(d))
            .sum()
    }
}

/// Configuration for the scorer and matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub signals: SignalConfig,
    /// Sentinel score for a fee-free fallback pick
    pub fallback_free_score: f64,
    /// Sentinel score for a best-cashback fallback pick
    pub fallback_cashback_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            signals: SignalConfig::default(),
            fallback_free_score: 10.0,
            fallback_cashback_score: 8.0,
        }
    }
}

/// Score a single card against a normalized message.
pub fn score_card(
    card: &CardRecord,
    message: &str,
    context: &UserContext,
    config: &ScoringConfig,
) -> (f64, ScoreBreakdown) {
    let query = Query::new(message, context);
    let mut breakdown = ScoreBreakdown::default();

    for hit in evaluate_rules(card, &query, &config.signals) {
        breakdown.add(hit.dimension, hit.value);
    }
    breakdown.set(Dimension::FallbackBonus, config.weights.fallback_bonus);

    (config.weights.total(&breakdown), breakdown)
}

/// Ranks catalog cards for a message.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: ScoringConfig,
}

impl Matcher {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score every card, in catalog order.
    fn score_all(&self, message: &str, cards: &[CardRecord], context: &UserContext) -> Vec<ScoredCard> {
        let normalized = normalize_message(message);
        cards
            .iter()
            .map(|card| {
                let (score, breakdown) = score_card(card, &normalized, context, &self.config);
                debug!(card = %card.id, score, "scored card");
                ScoredCard {
                    card: card.clone(),
                    score,
                    breakdown,
                    fallback: None,
                }
            })
            .collect()
    }

    /// All cards sorted by score descending; ties keep catalog order.
    pub fn rank<C: CardCatalog + ?Sized>(
        &self,
        message: &str,
        catalog: &C,
        context: &UserContext,
    ) -> Result<Vec<ScoredCard>, MatchError> {
        let cards = catalog.cards();
        if cards.is_empty() {
            return Err(MatchError::EmptyCatalog);
        }

        let mut scored = self.score_all(message, cards, context);
        // Stable sort, so equal scores stay in catalog order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored)
    }

    /// Pick the single best card for a message.
    pub fn find_best_match<C: CardCatalog + ?Sized>(
        &self,
        message: &str,
        catalog: &C,
        context: &UserContext,
    ) -> Result<ScoredCard, MatchError> {
        let ranked = self.rank(message, catalog, context)?;
        let best = &ranked[0];

        if self.config.weights.signal_total(&best.breakdown) == 0.0 {
            warn!(query = message, "no signal matched any card, applying fallback selection");
            // Every total is equal here, so ranked order is catalog order
            return self.fallback(ranked).ok_or(MatchError::EmptyCatalog);
        }

        info!(card = %best.card.id, name = %best.card.name, score = best.score, "best match");
        debug!(breakdown = ?best.breakdown, "best match breakdown");
        Ok(best.clone())
    }

    /// Up to `count` best cards with a strictly positive score.
    pub fn top_matches<C: CardCatalog + ?Sized>(
        &self,
        message: &str,
        count: usize,
        catalog: &C,
        context: &UserContext,
    ) -> Result<Vec<ScoredCard>, MatchError> {
        let ranked = self.rank(message, catalog, context)?;
        Ok(ranked
            .into_iter()
            .take(count)
            .filter(|c| c.score > 0.0)
            .collect())
    }

    /// Degenerate-case selection over cards in catalog order.
    fn fallback(&self, scored: Vec<ScoredCard>) -> Option<ScoredCard> {
        let (pool, strategy, sentinel): (Vec<ScoredCard>, _, _) =
            if scored.iter().any(|c| c.card.is_fee_free()) {
                (
                    scored.into_iter().filter(|c| c.card.is_fee_free()).collect(),
                    FallbackStrategy::FreeCardWithBestRate,
                    self.config.fallback_free_score,
                )
            } else {
                (
                    scored,
                    FallbackStrategy::HighestCashbackRate,
                    self.config.fallback_cashback_score,
                )
            };

        let mut chosen = best_max_rate(pool)?;
        info!(
            card = %chosen.card.id,
            strategy = strategy.label(),
            score = sentinel,
            "fallback selection"
        );
        chosen.score = sentinel;
        chosen.fallback = Some(strategy);
        Some(chosen)
    }
}

/// First card with the highest maximum cashback rate.
fn best_max_rate(pool: Vec<ScoredCard>) -> Option<ScoredCard> {
    pool.into_iter().reduce(|best, candidate| {
        if candidate.card.max_cashback_rate() > best.card.max_cashback_rate() {
            candidate
        } else {
            best
        }
    })
}

/// Best match with the default configuration.
pub fn find_best_match<C: CardCatalog + ?Sized>(
    message: &str,
    catalog: &C,
    context: &UserContext,
) -> Result<ScoredCard, MatchError> {
    Matcher::default().find_best_match(message, catalog, context)
}

/// Top matches with the default configuration.
pub fn top_matches<C: CardCatalog + ?Sized>(
    message: &str,
    count: usize,
    catalog: &C,
    context: &UserContext,
) -> Result<Vec<ScoredCard>, MatchError> {
    Matcher::default().top_matches(message, count, catalog, context)
}
