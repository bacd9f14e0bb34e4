use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::constants::names;

static RECOGNIZED_EVENTS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| names::ALL.iter().copied().collect());

/// 工作流执行期间观察到的一条追踪事件
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TraceEvent {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_attributes")]
    pub attributes: Value,
    #[serde(default, deserialize_with = "deserialize_span_events")]
    pub events: Vec<SpanEvent>,
    #[serde(
        default,
        rename = "startTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,
}

/// span 上附带的子事件（例如 `exception`）
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpanEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// 按事件名称区分的属性载荷
///
/// 缺失或类型不符的嵌套字段一律视为 `None`，不会报错。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventPayload {
    CrewKickoff,
    StartTask {
        agent_studio_id: Option<String>,
        task_description: Option<String>,
    },
    Completion {
        output: Option<String>,
    },
    EndTask {
        agent_studio_id: Option<String>,
    },
    ToolUse {
        tool_name: Option<String>,
        calling: Option<String>,
    },
    ToolEndUse {
        tool_name: Option<String>,
    },
    CrewComplete {
        crew_output: Option<String>,
    },
    Unknown,
}

impl TraceEvent {
    pub fn new<I, N>(id: I, name: N, attributes: Value) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            attributes,
            events: Vec::new(),
            start_time: None,
        }
    }

    pub fn with_span_event(mut self, event: SpanEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_start_time<T: Into<String>>(mut self, start_time: T) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn is_recognized(&self) -> bool {
        RECOGNIZED_EVENTS.contains(self.name.as_str())
    }

    pub fn payload(&self) -> EventPayload {
        let attrs = &self.attributes;
        match self.name.as_str() {
            names::CREW_KICKOFF => EventPayload::CrewKickoff,
            names::AGENT_START_TASK => EventPayload::StartTask {
                agent_studio_id: non_empty(attrs.get("agent_studio_id")),
                task_description: text_at(attrs, "/task/description"),
            },
            names::COMPLETION => EventPayload::Completion {
                output: text_at(attrs, "/output/value"),
            },
            names::AGENT_END_TASK => EventPayload::EndTask {
                agent_studio_id: non_empty(attrs.get("agent_studio_id")),
            },
            names::TOOL_USE => EventPayload::ToolUse {
                tool_name: text_at(attrs, "/tool/name"),
                calling: attrs.pointer("/input/value").and_then(parse_calling),
            },
            names::TOOL_END_USE => EventPayload::ToolEndUse {
                tool_name: text_at(attrs, "/tool/name"),
            },
            names::CREW_COMPLETE => EventPayload::CrewComplete {
                crew_output: attrs.get("crew_output").and_then(value_text),
            },
            _ => EventPayload::Unknown,
        }
    }

    /// 该事件是否为带异常的 completion
    pub fn exception(&self) -> Option<&SpanEvent> {
        if self.name != names::COMPLETION {
            return None;
        }
        self.events.iter().find(|e| e.name == names::EXCEPTION)
    }
}

/// 只保留可识别的事件，并按开始时间升序排列
///
/// 只有当每条事件都带有 `startTime` 时才排序，排序是稳定的。
pub fn normalize_batch(mut events: Vec<TraceEvent>) -> Vec<TraceEvent> {
    events.retain(TraceEvent::is_recognized);
    if events.iter().all(|e| e.start_time.is_some()) {
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    }
    events
}

fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(value_text)
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(value_text)
        .filter(|text| !text.is_empty())
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_calling(input: &Value) -> Option<String> {
    let parsed = match input {
        Value::String(raw) => serde_json::from_str::<Value>(raw).ok()?,
        Value::Object(_) => input.clone(),
        _ => return None,
    };
    parsed.get("calling").and_then(value_text)
}

fn deserialize_attributes<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    })
}

fn deserialize_span_events<'de, D>(deserializer: D) -> Result<Vec<SpanEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<SpanEvent>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_task_payload_reads_nested_fields() {
        let event = TraceEvent::new(
            "e1",
            names::AGENT_START_TASK,
            json!({"agent_studio_id": "a1", "task": {"description": "Summarize"}}),
        );
        assert_eq!(
            event.payload(),
            EventPayload::StartTask {
                agent_studio_id: Some("a1".into()),
                task_description: Some("Summarize".into()),
            }
        );
    }

    #[test]
    fn empty_agent_id_is_treated_as_absent() {
        let event = TraceEvent::new("e1", names::AGENT_END_TASK, json!({"agent_studio_id": ""}));
        assert_eq!(event.payload(), EventPayload::EndTask { agent_studio_id: None });
    }

    #[test]
    fn tool_use_parses_calling_from_json_string() {
        let event = TraceEvent::new(
            "e1",
            names::TOOL_USE,
            json!({"tool": {"name": "search"}, "input": {"value": "{\"calling\": \"search(q)\"}"}}),
        );
        assert_eq!(
            event.payload(),
            EventPayload::ToolUse {
                tool_name: Some("search".into()),
                calling: Some("search(q)".into()),
            }
        );
    }

    #[test]
    fn malformed_tool_input_yields_no_calling() {
        let event = TraceEvent::new(
            "e1",
            names::TOOL_USE,
            json!({"tool": {"name": "search"}, "input": {"value": "not json"}}),
        );
        assert_eq!(
            event.payload(),
            EventPayload::ToolUse {
                tool_name: Some("search".into()),
                calling: None,
            }
        );
    }

    #[test]
    fn string_encoded_attributes_are_decoded() {
        let raw = json!({
            "id": "e1",
            "name": "completion",
            "attributes": "{\"output\": {\"value\": \"hi\"}}",
            "events": null
        });
        let event: TraceEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.payload(), EventPayload::Completion { output: Some("hi".into()) });
        assert!(event.events.is_empty());
    }

    #[test]
    fn exception_only_reported_for_completion_events() {
        let exception = SpanEvent {
            name: "exception".into(),
            message: Some("boom".into()),
            timestamp: None,
        };
        let completion = TraceEvent::new("c1", names::COMPLETION, json!({}))
            .with_span_event(exception.clone());
        let other = TraceEvent::new("t1", names::TOOL_USE, json!({})).with_span_event(exception);

        assert_eq!(
            completion.exception().and_then(|e| e.message.as_deref()),
            Some("boom")
        );
        assert!(other.exception().is_none());
    }

    #[test]
    fn normalize_batch_filters_and_sorts() {
        let events = vec![
            TraceEvent::new("2", names::CREW_COMPLETE, json!({})).with_start_time("2024-01-01T00:00:02Z"),
            TraceEvent::new("x", "LLM.call", json!({})).with_start_time("2024-01-01T00:00:00Z"),
            TraceEvent::new("1", names::CREW_KICKOFF, json!({})).with_start_time("2024-01-01T00:00:01Z"),
        ];
        let ids: Vec<_> = normalize_batch(events).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
