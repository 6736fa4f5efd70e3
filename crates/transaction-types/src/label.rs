//! Classification labels and the topics they are published to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// A classification label assigned to a transaction.
///
/// `HighValue` is assigned independently of the other two; exactly one of
/// `Valid` and `Suspicious` applies to every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    HighValue,
    Valid,
    Suspicious,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::HighValue, Label::Valid, Label::Suspicious];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::HighValue => "high-value",
            Label::Valid => "valid",
            Label::Suspicious => "suspicious",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high-value" => Ok(Label::HighValue),
            "valid" => Ok(Label::Valid),
            "suspicious" => Ok(Label::Suspicious),
            other => Err(CodecError::UnknownLabel(other.to_string())),
        }
    }
}

/// Topic names for each label.
///
/// Defaults match the names the downstream services have always used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicNames {
    pub valid: String,
    pub suspicious: String,
    pub high_value: String,
}

impl Default for TopicNames {
    fn default() -> Self {
        Self {
            valid: "valid-transactions".to_string(),
            suspicious: "suspicious-transactions".to_string(),
            high_value: "high-value-transactions".to_string(),
        }
    }
}

impl TopicNames {
    pub fn topic_for(&self, label: Label) -> &str {
        match label {
            Label::HighValue => &self.high_value,
            Label::Valid => &self.valid,
            Label::Suspicious => &self.suspicious,
        }
    }

    /// Reverse lookup used by consumers to recover the label a record arrived under.
    pub fn label_for(&self, topic: &str) -> Option<Label> {
        Label::ALL
            .into_iter()
            .find(|label| self.topic_for(*label) == topic)
    }

    pub fn topics_for(&self, labels: &[Label]) -> Vec<String> {
        labels
            .iter()
            .map(|label| self.topic_for(*label).to_string())
            .collect()
    }

    pub fn all(&self) -> Vec<String> {
        self.topics_for(&Label::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_string_forms() {
        for label in Label::ALL {
            assert_eq!(label.as_str().parse::<Label>().unwrap(), label);
        }
        assert!("frozen".parse::<Label>().is_err());
    }

    #[test]
    fn test_topic_lookup_both_directions() {
        let topics = TopicNames::default();
        assert_eq!(topics.topic_for(Label::Valid), "valid-transactions");
        assert_eq!(
            topics.label_for("high-value-transactions"),
            Some(Label::HighValue)
        );
        assert_eq!(topics.label_for("payments"), None);
    }

    #[test]
    fn test_custom_topic_names() {
        let topics = TopicNames {
            valid: "ok".to_string(),
            suspicious: "check".to_string(),
            high_value: "big".to_string(),
        };
        assert_eq!(topics.label_for("check"), Some(Label::Suspicious));
        assert_eq!(
            topics.topics_for(&[Label::Suspicious, Label::HighValue]),
            vec!["check".to_string(), "big".to_string()]
        );
    }
}
