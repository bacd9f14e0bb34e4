use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, instrument};

use super::types::{EventsResponse, KickoffRequest, KickoffResponse};
use super::StudioApi;
use crate::config::{RenderMode, StudioConfig};
use crate::error::{Result, StudioError};
use crate::trace::normalize_batch;

const TEST_WORKFLOW_PATH: &str = "/grpc/testWorkflow";
const EVENTS_PATH: &str = "/api/ops/events";

/// 基于 reqwest 的后端客户端
#[derive(Clone)]
pub struct HttpStudioClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    render_mode: RenderMode,
    workflow_model_url: Option<String>,
}

impl HttpStudioClient {
    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| StudioError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            render_mode: config.render_mode,
            workflow_model_url: config.workflow_model_url.clone(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn kickoff_test(&self, request: &KickoffRequest) -> Result<KickoffResponse> {
        let url = format!("{}{}", self.base_url, TEST_WORKFLOW_PATH);
        let response = self
            .authorized(self.client.post(url))
            .json(request)
            .send()
            .await
            .map_err(|e| StudioError::Transport(e.to_string()))?;
        let response = ensure_success(response).await?;
        response
            .json::<KickoffResponse>()
            .await
            .map_err(|e| StudioError::Decode(e.to_string()))
    }

    async fn kickoff_deployed(&self, request: &KickoffRequest) -> Result<KickoffResponse> {
        let url = self.workflow_model_url.as_deref().ok_or_else(|| {
            StudioError::Config("workflow render mode requires a workflow model url".into())
        })?;
        let response = self
            .authorized(self.client.post(url))
            .json(&request.deployed_body()?)
            .send()
            .await
            .map_err(|e| StudioError::Transport(e.to_string()))?;
        let payload: Value = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| StudioError::Decode(e.to_string()))?;

        let trace_id = payload
            .pointer("/response/trace_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(KickoffResponse { trace_id })
    }
}

#[async_trait]
impl StudioApi for HttpStudioClient {
    #[instrument(skip(self, request), fields(workflow_id = %request.workflow_id, mode = ?self.render_mode))]
    async fn kickoff(&self, request: KickoffRequest) -> Result<KickoffResponse> {
        match self.render_mode {
            RenderMode::Studio => self.kickoff_test(&request).await,
            RenderMode::Workflow => self.kickoff_deployed(&request).await,
        }
    }

    #[instrument(skip(self))]
    async fn events(&self, trace_id: &str) -> Result<EventsResponse> {
        if trace_id.is_empty() {
            return Ok(EventsResponse::default());
        }

        let url = format!("{}{}", self.base_url, EVENTS_PATH);
        let response = self
            .authorized(self.client.get(url))
            .query(&[("traceId", trace_id)])
            .send()
            .await
            .map_err(|e| StudioError::Transport(e.to_string()))?;
        let mut payload: EventsResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| StudioError::Decode(e.to_string()))?;

        payload.events = normalize_batch(payload.events);
        debug!(count = payload.events.len(), "fetched trace events");
        Ok(payload)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StudioError::Transport(format!(
        "request failed with status {status}: {body}"
    )))
}
