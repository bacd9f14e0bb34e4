use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// 面向用户的提示消息
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn error<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// 发布/订阅通知总线
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// 返回收到通知的订阅者数量；没有订阅者时通知被丢弃
    pub fn publish(&self, notification: Notification) -> usize {
        tracing::debug!(
            level = ?notification.level,
            title = %notification.title,
            "publishing notification"
        );
        self.sender.send(notification).unwrap_or(0)
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
