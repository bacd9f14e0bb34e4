// 工作流拓扑与启动输入

mod inputs;
mod topology;

pub use inputs::{
    check_readiness, conversational_inputs, inputs_with_defaults, workflow_inputs,
    ReadinessIssue, CONTEXT_KEY, USER_INPUT_KEY,
};
pub use topology::{
    AgentMetadata, CrewAiAgentMetadata, CrewAiWorkflowMetadata, ProcessKind, TaskMetadata,
    ToolInstance, Workflow, WorkflowTopology,
};
