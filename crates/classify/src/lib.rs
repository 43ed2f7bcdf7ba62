//! Experience level classification.
//!
//! Labels a message as coming from a novice or an advanced user by
//! counting cue phrases. The result only shapes the response; it never
//! affects ranking.

use cardmatch_features::{contains_any, count_hits, normalize_message};
use cardmatch_model::ExperienceLevel;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cue lists and length heuristics for the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// First-card, newcomer and uncertainty phrases
    pub novice_cues: Vec<String>,
    /// Comparison, analysis and eligibility phrases
    pub advanced_cues: Vec<String>,
    /// Long messages stating an intent lean advanced
    pub long_message_chars: usize,
    pub intent_phrases: Vec<String>,
    /// Short messages asking for a pick lean novice
    pub short_message_chars: usize,
    pub request_phrases: Vec<String>,
    pub nudge: f64,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            novice_cues: strings(&[
                "第一張", "首卡", "新手", "不懂", "不知道", "怎麼選", "推薦", "學生", "剛畢業",
                "社會新鮮人", "沒有經驗", "初學者",
            ]),
            advanced_cues: strings(&[
                "比較", "分析", "優缺點", "差異", "哪個好", "評估", "考量", "回饋率", "年費",
                "申請條件", "信用分數", "財力證明", "審核",
            ]),
            long_message_chars: 50,
            intent_phrases: strings(&["想要", "希望"]),
            short_message_chars: 20,
            request_phrases: strings(&["推薦", "建議"]),
            nudge: 0.5,
        }
    }
}

/// Cue counts behind a classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelScores {
    pub novice: f64,
    pub advanced: f64,
}

impl LevelScores {
    /// Advanced only on a strict majority; ties stay novice.
    pub fn level(&self) -> ExperienceLevel {
        if self.advanced > self.novice {
            ExperienceLevel::Advanced
        } else {
            ExperienceLevel::Novice
        }
    }
}

/// Keyword-based experience classifier.
#[derive(Debug, Clone, Default)]
pub struct ExperienceClassifier {
    config: ClassifierConfig,
}

impl ExperienceClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Count cues in a raw message.
    pub fn scores(&self, message: &str) -> LevelScores {
        let lowered = normalize_message(message);
        let length = message.chars().count();
        let config = &self.config;

        let mut novice = count_hits(&lowered, &config.novice_cues) as f64;
        let mut advanced = count_hits(&lowered, &config.advanced_cues) as f64;

        if length > config.long_message_chars && contains_any(&lowered, &config.intent_phrases) {
            advanced += config.nudge;
        }
        if length < config.short_message_chars && contains_any(&lowered, &config.request_phrases) {
            novice += config.nudge;
        }

        LevelScores { novice, advanced }
    }

    pub fn classify(&self, message: &str) -> ExperienceLevel {
        let scores = self.scores(message);
        let level = scores.level();
        debug!(novice = scores.novice, advanced = scores.advanced, %level, "classified message");
        level
    }
}

/// Classify with the default cue lists.
pub fn classify(message: &str) -> ExperienceLevel {
    ExperienceClassifier::default().classify(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_card_student_is_novice() {
        assert_eq!(
            classify("我是學生，想要申請第一張信用卡，不知道怎麼選"),
            ExperienceLevel::Novice
        );
    }

    #[test]
    fn test_comparison_is_advanced() {
        assert_eq!(
            classify("想要比較台新和國泰的信用卡，分析一下優缺點和回饋率"),
            ExperienceLevel::Advanced
        );
    }

    #[test]
    fn test_no_cues_defaults_to_novice() {
        assert_eq!(classify("信用卡"), ExperienceLevel::Novice);
        assert_eq!(classify(""), ExperienceLevel::Novice);
    }

    #[test]
    fn test_tie_is_novice() {
        // one cue each
        assert_eq!(classify("新手想比較"), ExperienceLevel::Novice);
    }

    #[test]
    fn test_short_request_nudges_novice() {
        let scores = ExperienceClassifier::default().scores("給我建議");
        assert_eq!(scores.novice, 0.5);
        assert_eq!(scores.advanced, 0.0);
    }

    #[test]
    fn test_long_intent_nudges_advanced() {
        let message = format!("我希望{}", "平常在各種通路消費都能拿到不錯的現金回饋而且還有機場貴賓室與旅遊保險等等額外的福利可以使用的那種卡片");
        assert!(message.chars().count() > 50);
        let scores = ExperienceClassifier::default().scores(&message);
        assert_eq!(scores.advanced, 0.5);
        assert_eq!(scores.level(), ExperienceLevel::Advanced);
    }

    #[test]
    fn test_custom_cues() {
        let config = ClassifierConfig {
            advanced_cues: vec!["apr".to_string()],
            ..Default::default()
        };
        let classifier = ExperienceClassifier::new(config);
        assert_eq!(classifier.classify("Compare APR"), ExperienceLevel::Advanced);
    }
}
