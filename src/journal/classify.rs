use crate::journal::rules::{CategoryRule, RuleTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub track: Option<String>,
    pub facet: Option<String>,
    pub priority: Priority,
}

fn matches_any(low: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| low.contains(kw.as_str()))
}

/// Keyword classifier over a normalised [`RuleTable`].
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleTable,
}

impl Classifier {
    pub fn new(rules: &RuleTable) -> Self {
        Self {
            rules: rules.normalized(),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    fn winning_rule(&self, low: &str) -> Option<&CategoryRule> {
        self.rules
            .categories
            .iter()
            .find(|rule| matches_any(low, &rule.keywords))
    }

    pub fn classify(&self, text: &str) -> Classification {
        let low = text.to_lowercase();
        let priority = self.priority(text);

        let Some(rule) = self.winning_rule(&low) else {
            return Classification {
                category: self.rules.unclassified_label.clone(),
                track: None,
                facet: None,
                priority,
            };
        };

        let (track, facet) = match &rule.track {
            Some(track) => {
                let facet = track
                    .facets
                    .iter()
                    .find(|facet| matches_any(&low, &facet.keywords))
                    .map(|facet| facet.label.clone());
                (Some(track.id.clone()), facet)
            }
            None => (None, None),
        };

        Classification {
            category: rule.label.clone(),
            track,
            facet,
            priority,
        }
    }

    /// High is checked before low, so text carrying both markers is high.
    pub fn priority(&self, text: &str) -> Priority {
        let low = text.to_lowercase();
        if matches_any(&low, &self.rules.priority.high) {
            Priority::High
        } else if matches_any(&low, &self.rules.priority.low) {
            Priority::Low
        } else {
            Priority::Medium
        }
    }

    pub fn is_learning(&self, text: &str) -> bool {
        matches_any(&text.to_lowercase(), &self.rules.learning_triggers)
    }

    pub fn is_deep_work(&self, text: &str) -> bool {
        matches_any(&text.to_lowercase(), &self.rules.deep_work_hints)
    }
}
