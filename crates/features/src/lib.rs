//! Feature extraction for card matching.
//!
//! Provides the pure building blocks used in scoring and explanation:
//! - Lexicon tables (store aliases, category and audience keywords)
//! - Message normalization and substring helpers
//! - The shared signal rule table

pub mod lexicon;
pub mod rules;

pub use lexicon::{
    audience_keywords, category_display_name, category_field_rate, category_keywords,
    category_rate_label, store_aliases,
};
pub use rules::{evaluate_rules, Query, RateBonus, RuleHit, SignalConfig, RULES};

/// Normalize a user message for matching.
///
/// Only case is folded; Chinese text has no case and punctuation such as
/// `%` or `-` is significant to the rules.
pub fn normalize_message(text: &str) -> String {
    text.to_lowercase()
}

/// Whether any needle occurs in the (already normalized) message.
///
/// Needles are compared case-insensitively.
pub fn contains_any<S: AsRef<str>>(message: &str, needles: &[S]) -> bool {
    needles
        .iter()
        .any(|n| message.contains(n.as_ref().to_lowercase().as_str()))
}

/// Number of needles that occur in the message.
pub fn count_hits<S: AsRef<str>>(message: &str, needles: &[S]) -> usize {
    needles
        .iter()
        .filter(|n| message.contains(n.as_ref().to_lowercase().as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_message() {
        assert_eq!(normalize_message("PChome 網購 7-11"), "pchome 網購 7-11");
        assert_eq!(normalize_message("Costco"), "costco");
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("想在costco買", &["好市多", "Costco"]));
        assert!(!contains_any("信用卡", &["回饋"]));
        assert!(!contains_any::<&str>("信用卡", &[]));
    }

    #[test]
    fn test_count_hits() {
        assert_eq!(count_hits("比較一下優缺點", &["比較", "優缺點", "審核"]), 2);
    }
}
