//! Handover report value objects
//!
//! Mirrors the summarization service's wire shape: a rendered markdown
//! report plus a structured breakdown of the shift.

pub mod markdown;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue priority as classified by the summarization service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Med,
    Low,
}

impl Priority {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Med => "Med",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An alarm the incoming shift must know about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalAlarm {
    pub alarm: String,
    pub meaning: String,
}

/// An unresolved issue carried over to the next shift
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenIssue {
    pub issue: String,
    pub priority: Priority,
    /// Service confidence in the classification, 0-100
    pub confidence: u8,
}

/// Structured breakdown of the shift, as returned by the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSummary {
    #[serde(default)]
    pub shift_summary: Vec<String>,
    #[serde(default)]
    pub critical_alarms: Vec<CriticalAlarm>,
    #[serde(default)]
    pub open_issues: Vec<OpenIssue>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
}

/// A generated handover report
#[derive(Debug, Clone)]
pub struct HandoverReport {
    /// The full report as markdown
    pub markdown: String,
    /// Structured summary of the same content
    pub summary: StructuredSummary,
    /// Server-side session id, when the service stored the report
    pub session_id: Option<String>,
}

/// Attachments submitted alongside the shift notes
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    /// Alarm system export, already parsed as JSON
    pub alarms: Option<serde_json::Value>,
    /// Historian trend export, raw CSV text
    pub trends_csv: Option<String>,
}

impl Attachments {
    /// Check if no attachments were provided
    pub fn is_empty(&self) -> bool {
        self.alarms.is_none() && self.trends_csv.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_serializes_as_capitalized() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
        assert_eq!(serde_json::to_string(&Priority::Med).unwrap(), "\"Med\"");
    }

    #[test]
    fn summary_deserializes_camel_case() {
        let json = r#"{
            "shiftSummary": ["reactor stable"],
            "criticalAlarms": [{"alarm": "LIC-301-HI", "meaning": "separator level high"}],
            "openIssues": [{"issue": "calibrate LIC-301", "priority": "High", "confidence": 85}],
            "recommendedActions": ["monitor C-202"],
            "questions": []
        }"#;

        let summary: StructuredSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.shift_summary, vec!["reactor stable"]);
        assert_eq!(summary.critical_alarms[0].alarm, "LIC-301-HI");
        assert_eq!(summary.open_issues[0].priority, Priority::High);
        assert_eq!(summary.open_issues[0].confidence, 85);
    }

    #[test]
    fn summary_tolerates_missing_sections() {
        let summary: StructuredSummary = serde_json::from_str("{}").unwrap();
        assert!(summary.shift_summary.is_empty());
        assert!(summary.open_issues.is_empty());
    }

    #[test]
    fn attachments_empty_check() {
        assert!(Attachments::default().is_empty());
        let attachments = Attachments {
            trends_csv: Some("timestamp,tag,value".to_string()),
            ..Default::default()
        };
        assert!(!attachments.is_empty());
    }
}
