//! Structured meeting minutes returned by the API.

use serde::{Deserialize, Serialize};

/// Priority levels for action items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Parse an exact lowercase priority label.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// A single topic that was discussed in the meeting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicDiscussed {
    pub topic: String,
    pub summary: String,
    #[serde(default)]
    pub decisions: Vec<String>,
}

/// A task assigned during the meeting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionItem {
    pub task: String,
    pub assignee: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

/// The complete, structured meeting minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeetingMinutes {
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    pub attendees: Vec<String>,
    pub topics_discussed: Vec<TopicDiscussed>,
    pub action_items: Vec<ActionItem>,
    #[serde(default)]
    pub next_meeting: Option<String>,
}

/// Minutes wrapped with processing information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinutesWithMetadata {
    pub minutes: MeetingMinutes,
    pub processing_time_ms: f64,
    pub model_used: String,
    pub input_character_count: usize,
    pub generated_at: String,
}
