//! Core domain model for cardmatch credit card recommendation.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `CardRecord`: A card as supplied by the catalog
//! - `ScoreBreakdown`: Raw per-dimension signal values
//! - `ScoredCard`: A card with its weighted score
//! - `ExperienceLevel`: Novice or advanced user
//! - `Recommendation`: The structured result handed to rendering
//! - `CardCatalog`: The read-only catalog collaborator

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Application requirements published by the issuer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRequirements {
    /// Minimum applicant age in years
    #[serde(default)]
    pub min_age: u32,

    /// Minimum yearly income in NTD (0 = no requirement)
    #[serde(default)]
    pub min_income: u64,
}

/// A credit card as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Catalog key
    pub id: String,

    /// Display name (e.g. "台新@GoGo卡")
    pub name: String,

    /// Issuing bank
    #[serde(default)]
    pub bank: String,

    /// Annual fee in NTD (0 = free)
    #[serde(default)]
    pub annual_fee: u32,

    /// Category code to cashback percentage
    #[serde(default)]
    pub cashback_rates: BTreeMap<String, f64>,

    /// Store name to cashback percentage
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specific_stores: BTreeMap<String, f64>,

    /// Target audience tags (e.g. "學生")
    #[serde(default)]
    pub target_audience: Vec<String>,

    /// Free-text benefit lines
    #[serde(default)]
    pub benefits: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_requirements: Option<ApplicationRequirements>,
}

impl CardRecord {
    /// Create a minimal free card for testing.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bank: String::new(),
            annual_fee: 0,
            cashback_rates: BTreeMap::new(),
            specific_stores: BTreeMap::new(),
            target_audience: Vec::new(),
            benefits: Vec::new(),
            application_requirements: None,
        }
    }

    pub fn with_fee(mut self, annual_fee: u32) -> Self {
        self.annual_fee = annual_fee;
        self
    }

    pub fn with_rate(mut self, category: impl Into<String>, rate: f64) -> Self {
        self.cashback_rates.insert(category.into(), rate);
        self
    }

    pub fn with_store(mut self, store: impl Into<String>, rate: f64) -> Self {
        self.specific_stores.insert(store.into(), rate);
        self
    }

    pub fn with_audience(mut self, tag: impl Into<String>) -> Self {
        self.target_audience.push(tag.into());
        self
    }

    pub fn with_benefit(mut self, benefit: impl Into<String>) -> Self {
        self.benefits.push(benefit.into());
        self
    }

    /// Whether the card charges no annual fee.
    pub fn is_fee_free(&self) -> bool {
        self.annual_fee == 0
    }

    /// Highest cashback rate across all categories, 0 when the table is empty.
    pub fn max_cashback_rate(&self) -> f64 {
        self.cashback_rates.values().copied().fold(0.0_f64, f64::max)
    }

    /// Cashback rate for a category code, 0 when absent.
    pub fn rate(&self, category: &str) -> f64 {
        self.cashback_rates.get(category).copied().unwrap_or(0.0)
    }
}

/// One of the seven scoring signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    ExactStoreMatch,
    StoreCategory,
    CashbackRate,
    AnnualFee,
    TargetAudience,
    GeneralCategory,
    FallbackBonus,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::ExactStoreMatch,
        Dimension::StoreCategory,
        Dimension::CashbackRate,
        Dimension::AnnualFee,
        Dimension::TargetAudience,
        Dimension::GeneralCategory,
        Dimension::FallbackBonus,
    ];

    /// Stable key used in logs and JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ExactStoreMatch => "exact_store_match",
            Self::StoreCategory => "store_category",
            Self::CashbackRate => "cashback_rate",
            Self::AnnualFee => "annual_fee",
            Self::TargetAudience => "target_audience",
            Self::GeneralCategory => "general_category",
            Self::FallbackBonus => "fallback_bonus",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw (unweighted) value of every scoring dimension.
///
/// All seven fields are always present; a dimension that did not fire is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub exact_store_match: f64,
    pub store_category: f64,
    pub cashback_rate: f64,
    pub annual_fee: f64,
    pub target_audience: f64,
    pub general_category: f64,
    pub fallback_bonus: f64,
}

impl ScoreBreakdown {
    pub fn get(&self, dimension: Dimension) -> f64 {
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

    fn slot(&mut self, dimension: Dimension) -> &mut f64 {
        match dimension {
            Dimension::ExactStoreMatch => &mut self.exact_store_match,
            Dimension::StoreCategory => &mut self.store_category,
            Dimension::CashbackRate => &mut self.cashback_rate,
            Dimension::AnnualFee => &mut self.annual_fee,
            Dimension::TargetAudience => &mut self.target_audience,
            Dimension::GeneralCategory => &mut self.general_category,
            Dimension::FallbackBonus => &mut self.fallback_bonus,
        }
    }

    /// Accumulate a raw value into a dimension.
    pub fn add(&mut self, dimension: Dimension, value: f64) {
        *self.slot(dimension) += value;
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        *self.slot(dimension) = value;
    }

    /// Iterate `(dimension, raw value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.iter().map(move |d| (*d, self.get(*d)))
    }
}

/// Which Fallback Selection path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Fee-free card with the best maximum cashback
    FreeCardWithBestRate,
    /// Catalog-wide best maximum cashback
    HighestCashbackRate,
}

impl FallbackStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FreeCardWithBestRate => "free_card_with_best_rate",
            Self::HighestCashbackRate => "highest_cashback_rate",
        }
    }
}

/// A card with its weighted score for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCard {
    pub card: CardRecord,

    /// Weighted sum of the breakdown, or a fallback sentinel
    pub score: f64,

    pub breakdown: ScoreBreakdown,

    /// Set when the card was chosen by Fallback Selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackStrategy>,
}

/// User sophistication, used only to shape the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[default]
    Novice,
    Advanced,
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Novice => f.write_str("novice"),
            Self::Advanced => f.write_str("advanced"),
        }
    }
}

/// An active promotion for a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
}

/// One row of the advanced rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub category: String,
    pub label: String,
    pub rate: f64,
}

/// Response shape chosen by experience level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RecommendationDetail {
    /// Short answer with one educational sentence
    Simple { education: String },

    /// Full rate table and eligibility
    Detailed {
        rate_table: Vec<RateEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        requirements: Option<ApplicationRequirements>,
    },
}

/// The structured recommendation handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub card: CardRecord,
    pub level: ExperienceLevel,
    pub explanations: Vec<String>,
    pub promotions: Vec<Promotion>,
    pub detail: RecommendationDetail,
}

/// Caller-supplied context for a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// Audience tags the caller already knows apply (e.g. "學生")
    #[serde(default)]
    pub audiences: Vec<String>,
}

impl UserContext {
    pub fn with_audience(mut self, tag: impl Into<String>) -> Self {
        self.audiences.push(tag.into());
        self
    }

    pub fn declares(&self, tag: &str) -> bool {
        self.audiences.iter().any(|a| a == tag)
    }
}

/// Read-only card catalog supplied by the host.
///
/// Card order is significant: it breaks score ties.
pub trait CardCatalog {
    /// All cards in catalog order.
    fn cards(&self) -> &[CardRecord];

    /// Promotions active now for the card with this display name.
    fn active_promotions(&self, card_name: &str) -> Vec<Promotion>;
}

impl CardCatalog for Vec<CardRecord> {
    fn cards(&self) -> &[CardRecord] {
        self
    }

    fn active_promotions(&self, _card_name: &str) -> Vec<Promotion> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_level_serde_lowercase() {
        let level: ExperienceLevel = serde_json::from_str(r#""advanced""#).unwrap();
        assert_eq!(level, ExperienceLevel::Advanced);
        assert_eq!(serde_json::to_string(&ExperienceLevel::Novice).unwrap(), r#""novice""#);
    }

    #[test]
    fn test_card_deserialization_defaults() {
        let json = r#"{"id": "gogo", "name": "台新@GoGo卡", "cashback_rates": {"online": 5}}"#;
        let card: CardRecord = serde_json::from_str(json).unwrap();
        assert_eq!(card.annual_fee, 0);
        assert!(card.specific_stores.is_empty());
        assert_eq!(card.rate("online"), 5.0);
        assert_eq!(card.rate("dining"), 0.0);
    }

    #[test]
    fn test_max_cashback_rate() {
        let card = CardRecord::new("a", "A").with_rate("online", 5.0).with_rate("general", 0.5);
        assert_eq!(card.max_cashback_rate(), 5.0);
        assert_eq!(CardRecord::new("b", "B").max_cashback_rate(), 0.0);
    }

    #[test]
    fn test_breakdown_has_all_dimensions() {
        let mut breakdown = ScoreBreakdown::default();
        breakdown.add(Dimension::ExactStoreMatch, 1.3);
        breakdown.add(Dimension::ExactStoreMatch, 1.5);
        let keys: Vec<_> = breakdown.iter().map(|(d, _)| d.key()).collect();
        assert_eq!(keys.len(), 7);
        assert!((breakdown.get(Dimension::ExactStoreMatch) - 2.8).abs() < 1e-9);

        let json = serde_json::to_value(breakdown).unwrap();
        let object = json.as_object().unwrap();
        for dimension in Dimension::ALL {
            assert!(object.contains_key(dimension.key()));
        }
    }
}
