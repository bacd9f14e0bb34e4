/// 一次轮询的结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// 运行仍在进行
    Continue { event_count: usize },
    /// 拉取失败，本次跳过
    Skipped,
    /// 观察到 `Crew.complete`
    Completed { output: Option<String> },
    /// completion 事件中带有异常
    Failed { event_id: String, message: String },
    /// 运行已不在进行（外部停止或 trace 已切换）
    Stopped,
}

impl TickOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TickOutcome::Completed { .. } | TickOutcome::Failed { .. } | TickOutcome::Stopped
        )
    }
}
