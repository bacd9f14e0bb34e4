// 状态管理模块

mod context;
mod notifications;
mod run_state;

pub use context::StudioContext;
pub use notifications::{Notification, NotificationBus, NotificationLevel};
pub use run_state::{ChatMessage, MessageRole, RunFailure, RunPhase, RunState};
