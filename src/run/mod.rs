// 运行生命周期：kickoff、轮询、终止

mod controller;
mod poller;
mod types;

pub use controller::RunController;
pub use poller::PollHandle;
pub use types::TickOutcome;
