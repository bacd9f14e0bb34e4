use serde::{Deserialize, Serialize};

use super::constants::{delegation, nodes};
use super::event::{EventPayload, TraceEvent};
use crate::workflow::WorkflowTopology;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum InfoType {
    TaskStart,
    Completion,
    ToolInput,
}

/// 图中一个“正在工作”的节点
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    pub info_type: InfoType,
    #[serde(default)]
    pub is_most_recent: bool,
}

impl ActiveNode {
    fn new(id: impl Into<String>, info: Option<String>, info_type: InfoType) -> Self {
        Self {
            id: id.into(),
            info,
            info_type,
            is_most_recent: false,
        }
    }
}

/// 按顺序重放事件，推导当前活跃的图节点
///
/// 纯函数：可以对任意前缀重复调用（用于回放进度条）。
pub fn reduce(events: &[TraceEvent], topology: &WorkflowTopology) -> Vec<ActiveNode> {
    let manager_agent_id = topology.manager_agent_id();
    let mut active: Vec<ActiveNode> = Vec::new();

    for event in events {
        match event.payload() {
            EventPayload::StartTask {
                agent_studio_id,
                task_description,
            } => {
                let info = task_description
                    .map(|description| format!("I am starting a task: \"{description}\""));
                match agent_studio_id {
                    Some(agent_id) if manager_agent_id == Some(agent_id.as_str()) => {
                        active.push(ActiveNode::new(nodes::MANAGER_AGENT, info, InfoType::TaskStart));
                    }
                    Some(agent_id) => {
                        active.push(ActiveNode::new(agent_id, info, InfoType::TaskStart));
                    }
                    // 默认管理者不会触发该事件，这个分支实际上不可达
                    None => {
                        if topology.has_default_manager() {
                            active.push(ActiveNode::new(
                                nodes::MANAGER_AGENT,
                                info,
                                InfoType::TaskStart,
                            ));
                        }
                    }
                }
            }
            EventPayload::Completion { output } => match active.last_mut() {
                Some(last) => {
                    last.info = output;
                    last.info_type = InfoType::Completion;
                }
                // 没有活跃节点时视为默认管理者的 LLM 调用
                None => {
                    active.push(ActiveNode::new(nodes::MANAGER_AGENT, output, InfoType::Completion));
                }
            },
            EventPayload::EndTask {
                agent_studio_id: Some(agent_id),
            } => {
                active.retain(|node| node.id != agent_id);
            }
            EventPayload::ToolUse {
                tool_name: Some(tool_name),
                calling,
            } => {
                if delegation::is_delegation_tool(&tool_name) {
                    continue;
                }
                if let Some(tool) = topology.tool_by_name(&tool_name) {
                    active.push(ActiveNode::new(tool.id.clone(), calling, InfoType::ToolInput));
                }
            }
            EventPayload::ToolEndUse {
                tool_name: Some(tool_name),
            } => {
                if let Some(tool) = topology.tool_by_name(&tool_name) {
                    active.retain(|node| node.id != tool.id);
                }
            }
            EventPayload::CrewComplete { .. } => active.clear(),
            _ => {}
        }
    }

    if let Some(last) = active.last_mut() {
        last.is_most_recent = true;
    }
    active
}
