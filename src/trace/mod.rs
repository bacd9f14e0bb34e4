// 执行追踪事件与图状态推导

pub mod constants;
mod event;
mod reducer;

pub use event::{normalize_batch, EventPayload, SpanEvent, TraceEvent};
pub use reducer::{reduce, ActiveNode, InfoType};
