use parking_lot::RwLock;

use super::notifications::{Notification, NotificationBus};
use super::run_state::{ChatMessage, RunState};
use crate::trace::{reduce, ActiveNode};
use crate::workflow::WorkflowTopology;

/// 应用级上下文：运行状态存储与通知总线
///
/// 由宿主创建并注入到控制器中，而不是作为全局单例。
#[derive(Default)]
pub struct StudioContext {
    run: RwLock<RunState>,
    notifications: NotificationBus,
}

impl StudioContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notifications(notifications: NotificationBus) -> Self {
        Self {
            run: RwLock::new(RunState::default()),
            notifications,
        }
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.notifications
    }

    pub fn notify(&self, notification: Notification) {
        self.notifications.publish(notification);
    }

    pub fn run_state(&self) -> RunState {
        self.run.read().clone()
    }

    pub fn read_run<R>(&self, f: impl FnOnce(&RunState) -> R) -> R {
        f(&self.run.read())
    }

    pub(crate) fn update_run<R>(&self, f: impl FnOnce(&mut RunState) -> R) -> R {
        f(&mut self.run.write())
    }

    pub fn is_running(&self) -> bool {
        self.run.read().is_running()
    }

    pub fn crew_output(&self) -> Option<String> {
        self.run.read().crew_output.clone()
    }

    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.run.read().chat_messages.clone()
    }

    pub fn clear_chat(&self) {
        self.run.write().chat_messages.clear();
    }

    /// 回放进度条：索引会被限制在事件范围内
    pub fn set_event_index(&self, index: usize) -> usize {
        let mut run = self.run.write();
        let clamped = index.min(run.events.len().saturating_sub(1));
        run.current_event_index = clamped;
        clamped
    }

    /// 基于当前回放位置重新推导活跃节点
    pub fn active_nodes(&self, topology: &WorkflowTopology) -> Vec<ActiveNode> {
        let run = self.run.read();
        if run.events.is_empty() {
            return Vec::new();
        }
        let end = run.current_event_index.min(run.events.len() - 1);
        reduce(&run.events[..=end], topology)
    }
}
