mod env;

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

pub use env::EnvConfig;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEV_BASE_URL: &str = "http://127.0.0.1:8123";

/// 页面渲染模式：studio 内测试，或已部署的工作流应用
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Studio,
    Workflow,
}

impl FromStr for RenderMode {
    type Err = StudioError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "studio" => Ok(RenderMode::Studio),
            "workflow" => Ok(RenderMode::Workflow),
            other => Err(StudioError::Config(format!("unknown render mode `{other}`"))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudioConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub render_mode: RenderMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_model_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            render_mode: RenderMode::default(),
            workflow_model_url: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl StudioConfig {
    /// 从环境变量构建配置
    ///
    /// - AGENT_STUDIO_BASE_URL
    /// - AGENT_STUDIO_POLL_INTERVAL_MS
    /// - AGENT_STUDIO_RENDER_MODE（studio | workflow）
    /// - AGENT_STUDIO_WORKFLOW_MODEL_URL
    /// - CDSW_APIV2_KEY
    /// - AGENT_STUDIO_DEPLOYMENT_CONFIG=dev 时使用本地开发地址
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StudioError::Config(format!("failed to read `{}`: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| StudioError::Config(format!("invalid config `{}`: {e}", path.display())))?;
        config.validated()
    }

    /// 环境变量覆盖已有配置
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(base_url) = EnvConfig::get_env_optional("AGENT_STUDIO_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(interval) = EnvConfig::parse_env::<u64>("AGENT_STUDIO_POLL_INTERVAL_MS")? {
            self.poll_interval_ms = interval;
        }
        if let Some(mode) = EnvConfig::get_env_optional("AGENT_STUDIO_RENDER_MODE") {
            self.render_mode = mode.parse()?;
        }
        if let Some(url) = EnvConfig::get_env_optional("AGENT_STUDIO_WORKFLOW_MODEL_URL") {
            self.workflow_model_url = Some(url);
        }
        if let Some(key) = EnvConfig::get_env_optional("CDSW_APIV2_KEY") {
            self.api_key = Some(key);
        }
        if EnvConfig::get_env_optional("AGENT_STUDIO_DEPLOYMENT_CONFIG").as_deref() == Some("dev") {
            self.base_url = DEV_BASE_URL.to_string();
        }
        self.validated()
    }

    fn validated(mut self) -> Result<Self> {
        if self.poll_interval_ms == 0 {
            return Err(StudioError::Config("poll interval must be positive".into()));
        }
        if self.render_mode == RenderMode::Workflow && self.workflow_model_url.is_none() {
            return Err(StudioError::Config(
                "workflow render mode requires a workflow model url".into(),
            ));
        }
        if let Some(key) = &self.api_key {
            self.api_key = Some(EnvConfig::resolve_secret(key)?);
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
