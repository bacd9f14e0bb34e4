/// 追踪事件相关的常量定义

/// 事件名称
pub mod names {
    pub const CREW_KICKOFF: &str = "Crew.kickoff";
    pub const AGENT_START_TASK: &str = "Agent._start_task";
    pub const AGENT_END_TASK: &str = "Agent._end_task";
    pub const COMPLETION: &str = "completion";
    pub const TOOL_USE: &str = "ToolUsage._use";
    pub const TOOL_END_USE: &str = "ToolUsage._end_use";
    pub const CREW_COMPLETE: &str = "Crew.complete";

    /// span 内部子事件
    pub const EXCEPTION: &str = "exception";

    pub const ALL: [&str; 7] = [
        CREW_KICKOFF,
        AGENT_START_TASK,
        COMPLETION,
        TOOL_USE,
        TOOL_END_USE,
        AGENT_END_TASK,
        CREW_COMPLETE,
    ];
}

/// 图节点相关常量
pub mod nodes {
    /// 管理者 agent 在图中的固定节点 id
    pub const MANAGER_AGENT: &str = "manager-agent";
}

/// 协作委派工具，不在图中展示
pub mod delegation {
    pub const DELEGATE_WORK: &str = "Delegate work to coworker";
    pub const ASK_QUESTION: &str = "Ask question to coworker";

    pub fn is_delegation_tool(name: &str) -> bool {
        name == DELEGATE_WORK || name == ASK_QUESTION
    }
}
