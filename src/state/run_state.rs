use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::StudioError;
use crate::trace::TraceEvent;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunPhase {
    #[default]
    Idle,
    Starting,
    Running,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new<T: Into<String>>(role: MessageRole, content: T) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
        }
    }

    pub fn with_id<T: Into<String>>(mut self, id: T) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// completion 事件中报告的异常
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunFailure {
    pub event_id: String,
    pub message: String,
}

impl From<RunFailure> for StudioError {
    fn from(failure: RunFailure) -> Self {
        StudioError::RunException {
            event_id: failure.event_id,
            message: failure.message,
        }
    }
}

/// 单次运行的状态，只由 `RunController` 修改
#[derive(Clone, Debug, Default)]
pub struct RunState {
    pub phase: RunPhase,
    pub trace_id: Option<String>,
    pub events: Vec<TraceEvent>,
    pub processed_exception_ids: HashSet<String>,
    pub current_event_index: usize,
    pub project_id: Option<String>,
    pub crew_output: Option<String>,
    pub chat_messages: Vec<ChatMessage>,
    /// 最近一次运行因异常结束时记录
    pub failure: Option<RunFailure>,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn is_busy(&self) -> bool {
        self.phase != RunPhase::Idle
    }

    /// 新一轮轮询开始前清空上一轮的事件与输出
    pub(crate) fn reset_for_polling(&mut self) {
        self.events.clear();
        self.processed_exception_ids.clear();
        self.current_event_index = 0;
        self.crew_output = None;
        self.failure = None;
    }

    pub(crate) fn finish(&mut self) {
        self.phase = RunPhase::Idle;
    }
}
