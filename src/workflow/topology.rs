use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessKind {
    #[default]
    Sequential,
    Hierarchical,
}

impl ProcessKind {
    /// 未知或空字符串按 sequential 处理
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hierarchical" => ProcessKind::Hierarchical,
            _ => ProcessKind::Sequential,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessKind::Sequential => "sequential",
            ProcessKind::Hierarchical => "hierarchical",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrewAiAgentMetadata {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub backstory: String,
    #[serde(default)]
    pub goal: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew_ai_agent_metadata: Option<CrewAiAgentMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_id: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskMetadata {
    pub task_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub assigned_agent_id: String,
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl TaskMetadata {
    pub fn is_assigned(&self) -> bool {
        !self.assigned_agent_id.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInstance {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workflow_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrewAiWorkflowMetadata {
    #[serde(default)]
    pub agent_id: Vec<String>,
    #[serde(default)]
    pub task_id: Vec<String>,
    #[serde(default)]
    pub manager_agent_id: String,
    #[serde(default)]
    pub process: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workflow {
    pub workflow_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew_ai_workflow_metadata: Option<CrewAiWorkflowMetadata>,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub is_conversational: bool,
}

impl Workflow {
    pub fn metadata(&self) -> CrewAiWorkflowMetadata {
        self.crew_ai_workflow_metadata.clone().unwrap_or_default()
    }

    pub fn manager_agent_id(&self) -> Option<&str> {
        self.crew_ai_workflow_metadata
            .as_ref()
            .map(|m| m.manager_agent_id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn process(&self) -> ProcessKind {
        self.crew_ai_workflow_metadata
            .as_ref()
            .map(|m| ProcessKind::parse_lossy(&m.process))
            .unwrap_or_default()
    }

    /// hierarchical 模式下未指定管理者 agent 时使用默认管理者
    pub fn has_default_manager(&self) -> bool {
        self.process() == ProcessKind::Hierarchical && self.manager_agent_id().is_none()
    }
}

/// 宿主应用提供的只读工作流拓扑
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowTopology {
    pub workflow: Workflow,
    #[serde(default)]
    pub agents: Vec<AgentMetadata>,
    #[serde(default)]
    pub tasks: Vec<TaskMetadata>,
    #[serde(default, alias = "toolInstances")]
    pub tool_instances: Vec<ToolInstance>,
}

impl WorkflowTopology {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow,
            agents: Vec::new(),
            tasks: Vec::new(),
            tool_instances: Vec::new(),
        }
    }

    pub fn with_agent(mut self, agent: AgentMetadata) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn with_task(mut self, task: TaskMetadata) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn with_tool_instance(mut self, tool: ToolInstance) -> Self {
        self.tool_instances.push(tool);
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StudioError::InvalidTopology(format!("failed to read `{}`: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| StudioError::InvalidTopology(e.to_string()))
    }

    pub fn manager_agent_id(&self) -> Option<&str> {
        self.workflow.manager_agent_id()
    }

    pub fn has_default_manager(&self) -> bool {
        self.workflow.has_default_manager()
    }

    /// 按显示名称查找工具实例，重名时取第一个
    pub fn tool_by_name(&self, name: &str) -> Option<&ToolInstance> {
        self.tool_instances.iter().find(|tool| tool.name == name)
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskMetadata> {
        self.tasks.iter().find(|task| task.task_id == task_id)
    }
}
