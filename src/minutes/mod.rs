//! Minutes generation.
//!
//! Owns the prompt sent to the language model and the conversion of its JSON reply into
//! [`MeetingMinutes`]. Talking to the provider is the gateway's job (see [`crate::llm`]).

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::llm::{generate_json, json_type_name, CompletionRequest, LanguageModel, LlmError};
use crate::models::{ActionItem, MeetingMinutes, Priority, TopicDiscussed};

/// Low temperature keeps the output factual and consistent between runs.
const MINUTES_TEMPERATURE: f32 = 0.2;

pub const SYSTEM_PROMPT: &str = r#"You are an expert meeting secretary working in a
professional financial services environment. Your job is to convert
raw meeting notes into perfectly structured meeting minutes.

INSTRUCTIONS:
1. Extract ALL attendees mentioned (by name or role)
2. Identify the main topics discussed and summarize each one
3. Capture every decision that was made
4. Extract EVERY action item with a clear owner
5. If a deadline is mentioned, include it
6. Mark items as high priority if urgent language was used
   (e.g., "critical", "ASAP", "by end of week", "blocker")
7. Infer the meeting title from the context

RESPONSE FORMAT:
Return ONLY a valid JSON object. No explanation, no markdown,
no text before or after the JSON. The JSON must have this structure:

{
  "title": "Short, descriptive meeting title",
  "date": "Date if mentioned, or null",
  "attendees": ["Name 1", "Name 2"],
  "topics_discussed": [
    {
      "topic": "Topic name",
      "summary": "2-3 sentence summary of the discussion",
      "decisions": ["Decision 1", "Decision 2"]
    }
  ],
  "action_items": [
    {
      "task": "Clear description of what needs to be done",
      "assignee": "Person responsible",
      "deadline": "Deadline or null",
      "priority": "high or medium or low"
    }
  ],
  "next_meeting": "Date/time or null"
}

RULES:
- Every action item MUST have an assignee
- If the assignee is unclear, use "Team" or "TBD"
- Decisions should be concrete, not vague
- Topic summaries should be 2-3 sentences, not one word
- Return valid JSON only - no trailing commas"#;

/// Wrap raw notes in the user prompt.
pub fn build_prompt(raw_notes: &str) -> String {
    format!(
        "Here are the raw meeting notes to process:\n\n\
         --- START OF MEETING NOTES ---\n\
         {raw_notes}\n\
         --- END OF MEETING NOTES ---\n\n\
         Convert these notes into structured meeting minutes."
    )
}

/// Turns raw notes into structured minutes using a language model.
pub struct MinutesService {
    llm: Arc<dyn LanguageModel>,
}

impl MinutesService {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Name of the model producing the minutes.
    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Process raw meeting notes and return structured minutes.
    pub async fn generate_minutes(&self, raw_notes: &str) -> Result<MeetingMinutes, LlmError> {
        tracing::info!(
            "Processing meeting notes ({} chars)",
            raw_notes.chars().count()
        );

        let request = CompletionRequest::new(build_prompt(raw_notes))
            .with_system_message(SYSTEM_PROMPT)
            .with_temperature(MINUTES_TEMPERATURE);

        let data = generate_json(self.llm.as_ref(), &request).await?;
        let minutes = minutes_from_json(&data)?;

        tracing::info!(
            "Minutes generated: {} topics, {} action items",
            minutes.topics_discussed.len(),
            minutes.action_items.len()
        );

        Ok(minutes)
    }
}

/// Convert the model's JSON object into minutes, filling in defaults for missing fields.
///
/// A key that is absent or `null` takes its default. A key holding the wrong JSON type,
/// or a priority other than exactly "high", "medium" or "low", is rejected.
// Deliberately lenient: an explicit `null` for a required field such as `title` or
// `attendees` falls back to the default instead of failing, and a non-object reply is
// rejected earlier by `parse_json_object` as an invalid AI response (422).
pub fn minutes_from_json(data: &Map<String, Value>) -> Result<MeetingMinutes, LlmError> {
    let topics_discussed = objects(data, "topics_discussed")?
        .into_iter()
        .map(|t| {
            Ok(TopicDiscussed {
                topic: string_or(t, "topic", "Unknown Topic")?,
                summary: string_or(t, "summary", "")?,
                decisions: strings(t, "decisions")?,
            })
        })
        .collect::<Result<Vec<_>, LlmError>>()?;

    let action_items = objects(data, "action_items")?
        .into_iter()
        .map(|a| {
            Ok(ActionItem {
                task: string_or(a, "task", "")?,
                assignee: string_or(a, "assignee", "TBD")?,
                deadline: optional_string(a, "deadline")?,
                priority: priority(a)?,
            })
        })
        .collect::<Result<Vec<_>, LlmError>>()?;

    Ok(MeetingMinutes {
        title: string_or(data, "title", "Untitled Meeting")?,
        date: optional_string(data, "date")?,
        attendees: strings(data, "attendees")?,
        topics_discussed,
        action_items,
        next_meeting: optional_string(data, "next_meeting")?,
    })
}

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn wrong_type(key: &str, expected: &str, got: &Value) -> LlmError {
    LlmError::InvalidShape(format!(
        "field '{}' should be {}, got {}",
        key,
        expected,
        json_type_name(got)
    ))
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, LlmError> {
    match present(obj, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_type(key, "a string", other)),
    }
}

fn string_or(obj: &Map<String, Value>, key: &str, default: &str) -> Result<String, LlmError> {
    Ok(optional_string(obj, key)?.unwrap_or_else(|| default.to_string()))
}

fn array<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a [Value], LlmError> {
    match present(obj, key) {
        None => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(wrong_type(key, "an array", other)),
    }
}

fn strings(obj: &Map<String, Value>, key: &str) -> Result<Vec<String>, LlmError> {
    array(obj, key)?
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(wrong_type(key, "an array of strings", other)),
        })
        .collect()
}

fn objects<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> Result<Vec<&'a Map<String, Value>>, LlmError> {
    array(obj, key)?
        .iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(wrong_type(key, "an array of objects", other)),
        })
        .collect()
}

fn priority(obj: &Map<String, Value>) -> Result<Priority, LlmError> {
    match optional_string(obj, "priority")? {
        None => Ok(Priority::default()),
        Some(label) => Priority::parse(&label).ok_or_else(|| {
            LlmError::InvalidShape(format!("'{}' is not a valid priority", label))
        }),
    }
}
