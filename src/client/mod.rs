// 后端协作方接口

#[cfg(feature = "http-client")]
mod http;
mod trace_id;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

#[cfg(feature = "http-client")]
pub use http::HttpStudioClient;
pub use trace_id::{normalize_trace_id, TRACE_ID_HEX_LEN};
pub use types::{EventsResponse, KickoffRequest, KickoffResponse, ToolUserParameters};

/// 启动工作流与拉取追踪事件的 RPC 接口
#[async_trait]
pub trait StudioApi: Send + Sync {
    async fn kickoff(&self, request: KickoffRequest) -> Result<KickoffResponse>;

    /// 每次返回该 trace 的完整事件历史
    async fn events(&self, trace_id: &str) -> Result<EventsResponse>;
}

pub type DynStudioApi = Arc<dyn StudioApi>;
