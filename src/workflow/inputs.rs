use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::json;

use crate::error::Result;
use crate::state::ChatMessage;

use super::topology::{ProcessKind, WorkflowTopology};

pub const USER_INPUT_KEY: &str = "user_input";
pub const CONTEXT_KEY: &str = "context";

/// 工作流引用的所有任务输入名称（去重，保持首次出现顺序）
pub fn workflow_inputs(topology: &WorkflowTopology) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();
    for task_id in &topology.workflow.metadata().task_id {
        let Some(task) = topology.task(task_id) else {
            continue;
        };
        for input in &task.inputs {
            if seen.insert(input.clone()) {
                inputs.push(input.clone());
            }
        }
    }
    inputs
}

/// 为每个输入补齐空字符串默认值，再用用户提供的值覆盖
pub fn inputs_with_defaults(
    topology: &WorkflowTopology,
    provided: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut inputs: HashMap<String, String> = workflow_inputs(topology)
        .into_iter()
        .map(|name| (name, String::new()))
        .collect();
    inputs.extend(provided.iter().map(|(k, v)| (k.clone(), v.clone())));
    inputs
}

/// 对话式工作流的输入：本轮用户输入加上历史消息上下文
pub fn conversational_inputs(
    user_input: &str,
    history: &[ChatMessage],
) -> Result<HashMap<String, String>> {
    let context: Vec<_> = history
        .iter()
        .map(|message| json!({"role": message.role, "content": message.content}))
        .collect();
    let mut inputs = HashMap::new();
    inputs.insert(USER_INPUT_KEY.to_string(), user_input.to_string());
    inputs.insert(CONTEXT_KEY.to_string(), serde_json::to_string(&context)?);
    Ok(inputs)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadinessIssue {
    NoDefaultModel,
    NotReady,
    NoAgents,
    NoTasks,
    UnassignedTasks,
}

impl fmt::Display for ReadinessIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReadinessIssue::NoDefaultModel => {
                "no default LLM model is configured; configure one to use workflows"
            }
            ReadinessIssue::NotReady => "the workflow is still being configured",
            ReadinessIssue::NoAgents => "the workflow does not have any agents",
            ReadinessIssue::NoTasks => "the workflow does not have any tasks",
            ReadinessIssue::UnassignedTasks => {
                "tasks must be assigned to an agent because there is no manager agent"
            }
        };
        f.write_str(text)
    }
}

/// 返回阻止启动的第一个问题
pub fn check_readiness(
    topology: &WorkflowTopology,
    has_default_model: bool,
) -> Option<ReadinessIssue> {
    let workflow = &topology.workflow;
    let metadata = workflow.metadata();

    if !has_default_model {
        return Some(ReadinessIssue::NoDefaultModel);
    }
    if !workflow.is_ready {
        return Some(ReadinessIssue::NotReady);
    }
    if metadata.agent_id.is_empty() {
        return Some(ReadinessIssue::NoAgents);
    }
    if metadata.task_id.is_empty() {
        return Some(ReadinessIssue::NoTasks);
    }

    if workflow.process() == ProcessKind::Sequential {
        let unassigned = metadata
            .task_id
            .iter()
            .filter_map(|id| topology.task(id))
            .any(|task| !task.is_assigned());
        if unassigned {
            return Some(ReadinessIssue::UnassignedTasks);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MessageRole;
    use crate::workflow::{CrewAiWorkflowMetadata, TaskMetadata, Workflow};

    fn task(id: &str, agent: &str, inputs: &[&str]) -> TaskMetadata {
        TaskMetadata {
            task_id: id.into(),
            description: format!("task {id}"),
            expected_output: String::new(),
            assigned_agent_id: agent.into(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn topology(process: &str, manager: &str, tasks: Vec<TaskMetadata>) -> WorkflowTopology {
        let workflow = Workflow {
            workflow_id: "wf".into(),
            name: "Workflow".into(),
            crew_ai_workflow_metadata: Some(CrewAiWorkflowMetadata {
                agent_id: vec!["a1".into()],
                task_id: tasks.iter().map(|t| t.task_id.clone()).collect(),
                manager_agent_id: manager.into(),
                process: process.into(),
            }),
            is_ready: true,
            is_conversational: false,
        };
        tasks
            .into_iter()
            .fold(WorkflowTopology::new(workflow), |t, task| t.with_task(task))
    }

    #[test]
    fn inputs_are_deduplicated_in_task_order() {
        let topology = topology(
            "sequential",
            "",
            vec![task("t1", "a1", &["topic", "tone"]), task("t2", "a1", &["tone", "audience"])],
        );
        assert_eq!(workflow_inputs(&topology), vec!["topic", "tone", "audience"]);
    }

    #[test]
    fn provided_inputs_override_defaults() {
        let topology = topology("sequential", "", vec![task("t1", "a1", &["topic", "tone"])]);
        let provided = HashMap::from([("topic".to_string(), "rust".to_string())]);
        let inputs = inputs_with_defaults(&topology, &provided);
        assert_eq!(inputs.get("topic").map(String::as_str), Some("rust"));
        assert_eq!(inputs.get("tone").map(String::as_str), Some(""));
    }

    #[test]
    fn conversational_inputs_encode_history() {
        let history = vec![ChatMessage::new(MessageRole::User, "hello")];
        let inputs = conversational_inputs("next", &history).unwrap();
        assert_eq!(inputs[USER_INPUT_KEY], "next");
        assert_eq!(inputs[CONTEXT_KEY], r#"[{"content":"hello","role":"user"}]"#);
    }

    #[test]
    fn unassigned_tasks_block_sequential_workflows_only() {
        let sequential = topology("sequential", "", vec![task("t1", "", &[])]);
        assert_eq!(
            check_readiness(&sequential, true),
            Some(ReadinessIssue::UnassignedTasks)
        );

        let hierarchical = topology("hierarchical", "", vec![task("t1", "", &[])]);
        assert_eq!(check_readiness(&hierarchical, true), None);
    }

    #[test]
    fn missing_default_model_is_reported_first() {
        let topology = topology("sequential", "", vec![]);
        assert_eq!(
            check_readiness(&topology, false),
            Some(ReadinessIssue::NoDefaultModel)
        );
        assert_eq!(check_readiness(&topology, true), Some(ReadinessIssue::NoTasks));
    }
}
