//! File-backed card catalog.
//!
//! Implements the `CardCatalog` trait over a JSON document so the matcher
//! can be driven without a database. Card order in the document is the
//! catalog order used for tie-breaking.

use std::collections::HashSet;
use std::path::Path;

use cardmatch_model::{CardCatalog, CardRecord, Promotion};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from catalog loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate card id: {0}")]
    DuplicateId(String),

    #[error("Promotion references unknown card: {0}")]
    UnknownCard(String),
}

/// A promotion with its validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRecord {
    pub card_id: String,

    #[serde(default)]
    pub title: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,

    /// First valid day (inclusive)
    pub start_date: NaiveDate,

    /// Last valid day (inclusive)
    pub end_date: NaiveDate,
}

impl PromotionRecord {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub cards: Vec<CardRecord>,

    #[serde(default)]
    pub promotions: Vec<PromotionRecord>,
}

/// In-memory catalog loaded from JSON.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    cards: Vec<CardRecord>,
    promotions: Vec<PromotionRecord>,
    today: Option<NaiveDate>,
}

impl JsonCatalog {
    /// Build from a parsed document, validating ids.
    pub fn new(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for card in &document.cards {
            if !seen.insert(card.id.as_str()) {
                return Err(CatalogError::DuplicateId(card.id.clone()));
            }
        }
        if let Some(promo) = document
            .promotions
            .iter()
            .find(|p| !seen.contains(p.card_id.as_str()))
        {
            return Err(CatalogError::UnknownCard(promo.card_id.clone()));
        }

        tracing::debug!(
            cards = document.cards.len(),
            promotions = document.promotions.len(),
            "Loaded card catalog"
        );

        Ok(Self {
            cards: document.cards,
            promotions: document.promotions,
            today: None,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Pin the date used for promotion windows.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn card(&self, id: &str) -> Option<&CardRecord> {
        self.cards.iter().find(|c| c.id == id)
    }

    fn card_by_name(&self, name: &str) -> Option<&CardRecord> {
        self.cards.iter().find(|c| c.name == name)
    }
}

impl CardCatalog for JsonCatalog {
    fn cards(&self) -> &[CardRecord] {
        &self.cards
    }

    fn active_promotions(&self, card_name: &str) -> Vec<Promotion> {
        let Some(card) = self.card_by_name(card_name) else {
            return Vec::new();
        };
        let today = self.today();

        self.promotions
            .iter()
            .filter(|p| p.card_id == card.id && p.is_active_on(today))
            .map(|p| Promotion {
                description: p.description.clone(),
                terms: p.terms.clone(),
            })
            .collect()
    }
}
