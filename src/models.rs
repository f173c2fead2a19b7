// Data models for the to-do store

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// ISO-8601 creation time, informational only
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Task {
    /// Build an incomplete task stamped with the current time.
    ///
    /// `text` is stored as given; trimming and validation belong to the store.
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at: now_iso(),
        }
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_now_iso_format() {
        let ts = now_iso();
        assert!(ts.ends_with('Z'));
        // 2026-10-19T08:15:02.123Z
        assert_eq!(ts.len(), 24);
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new(7, "Buy milk");
        assert_eq!(task.id, 7);
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
        assert!(!task.created_at.is_empty());
    }

    #[test]
    fn test_task_serialization_field_names() {
        let task = Task {
            id: 1,
            text: "Test".to_string(),
            completed: true,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
        };

        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"text":"Test","completed":true,"createdAt":"2024-01-01T00:00:00.000Z"}"#
        );

        let deserialized: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, task);
    }

    #[test]
    fn test_task_completed_defaults_to_false() {
        let task: Task = serde_json::from_str(r#"{"id":3,"text":"x","createdAt":"2024-01-01T00:00:00.000Z"}"#).unwrap();
        assert!(!task.completed);
    }
}
