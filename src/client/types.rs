use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::trace::TraceEvent;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolUserParameters {
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// `/grpc/testWorkflow` 请求体
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KickoffRequest {
    pub workflow_id: String,
    pub inputs: HashMap<String, String>,
    #[serde(default)]
    pub tool_user_parameters: HashMap<String, ToolUserParameters>,
    /// JSON 编码后的生成参数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<String>,
}

impl KickoffRequest {
    pub fn new<T: Into<String>>(workflow_id: T, inputs: HashMap<String, String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            inputs,
            tool_user_parameters: HashMap::new(),
            generation_config: None,
        }
    }

    pub fn with_tool_user_parameters(
        mut self,
        parameters: HashMap<String, ToolUserParameters>,
    ) -> Self {
        self.tool_user_parameters = parameters;
        self
    }

    pub fn with_generation_config(mut self, config: &Value) -> Result<Self> {
        self.generation_config = Some(serde_json::to_string(config)?);
        Ok(self)
    }

    /// 已部署应用的 kickoff 请求体，输入经 base64 编码
    pub fn deployed_body(&self) -> Result<Value> {
        let encoded = STANDARD.encode(serde_json::to_vec(&self.inputs)?);
        Ok(json!({
            "request": {
                "action_type": "kickoff",
                "kickoff_inputs": encoded,
            }
        }))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KickoffResponse {
    #[serde(default)]
    pub trace_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EventsResponse {
    #[serde(default, rename = "projectId", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployed_body_base64_encodes_inputs() {
        let request = KickoffRequest::new(
            "wf",
            HashMap::from([("topic".to_string(), "rust".to_string())]),
        );
        let body = request.deployed_body().unwrap();
        assert_eq!(body["request"]["action_type"], "kickoff");

        let encoded = body["request"]["kickoff_inputs"].as_str().unwrap();
        let decoded: HashMap<String, String> =
            serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded["topic"], "rust");
    }

    #[test]
    fn generation_config_is_sent_as_string() {
        let request = KickoffRequest::new("wf", HashMap::new())
            .with_generation_config(&json!({"temperature": 0.1}))
            .unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["generation_config"], r#"{"temperature":0.1}"#);
    }
}
