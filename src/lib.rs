pub mod client;
pub mod config;
pub mod error;
pub mod run;
pub mod state;
pub mod trace;
pub mod utils;
pub mod workflow;

#[cfg(feature = "http-client")]
pub use client::HttpStudioClient;
pub use client::{
    normalize_trace_id, DynStudioApi, EventsResponse, KickoffRequest, KickoffResponse, StudioApi,
    ToolUserParameters,
};
pub use config::{EnvConfig, RenderMode, StudioConfig};
pub use error::{Result, StudioError};
pub use run::{PollHandle, RunController, TickOutcome};
pub use state::{
    ChatMessage, MessageRole, Notification, NotificationBus, NotificationLevel, RunFailure,
    RunPhase, RunState, StudioContext,
};
pub use trace::{normalize_batch, reduce, ActiveNode, EventPayload, InfoType, SpanEvent, TraceEvent};
pub use utils::logging;
pub use workflow::{
    check_readiness, conversational_inputs, inputs_with_defaults, workflow_inputs, AgentMetadata,
    CrewAiAgentMetadata, CrewAiWorkflowMetadata, ProcessKind, ReadinessIssue, TaskMetadata,
    ToolInstance, Workflow, WorkflowTopology,
};
