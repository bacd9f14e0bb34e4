use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::poller::PollHandle;
use super::types::TickOutcome;
use crate::client::{normalize_trace_id, DynStudioApi, KickoffRequest, ToolUserParameters};
use crate::error::{Result, StudioError};
use crate::state::{
    ChatMessage, MessageRole, Notification, RunFailure, RunPhase, StudioContext,
};
use crate::trace::constants::names;
use crate::trace::EventPayload;
use crate::workflow::{check_readiness, conversational_inputs, inputs_with_defaults, WorkflowTopology};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// 驱动一次工作流运行：kickoff、定时拉取事件、检测结束
///
/// 同一时间最多只有一个轮询循环；控制器被丢弃时轮询随之停止。
pub struct RunController {
    inner: Arc<RunInner>,
    poller: Mutex<Option<PollHandle>>,
    poll_interval: Duration,
    has_default_model: bool,
    tool_user_parameters: HashMap<String, ToolUserParameters>,
    generation_config: Option<Value>,
}

struct RunInner {
    api: DynStudioApi,
    context: Arc<StudioContext>,
    topology: Arc<WorkflowTopology>,
}

impl RunController {
    pub fn new(api: DynStudioApi, context: Arc<StudioContext>, topology: WorkflowTopology) -> Self {
        Self {
            inner: Arc::new(RunInner {
                api,
                context,
                topology: Arc::new(topology),
            }),
            poller: Mutex::new(None),
            poll_interval: DEFAULT_POLL_INTERVAL,
            has_default_model: true,
            tool_user_parameters: HashMap::new(),
            generation_config: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_default_model(mut self, has_default_model: bool) -> Self {
        self.has_default_model = has_default_model;
        self
    }

    pub fn with_tool_user_parameters(
        mut self,
        parameters: HashMap<String, ToolUserParameters>,
    ) -> Self {
        self.tool_user_parameters = parameters;
        self
    }

    pub fn with_generation_config(mut self, config: Value) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn context(&self) -> &Arc<StudioContext> {
        &self.inner.context
    }

    pub fn topology(&self) -> &WorkflowTopology {
        &self.inner.topology
    }

    /// 非对话式工作流：缺省输入补为空字符串后启动
    pub async fn kickoff(&self, inputs: HashMap<String, String>) -> Result<String> {
        let inputs = inputs_with_defaults(&self.inner.topology, &inputs);
        self.kickoff_with_inputs(inputs).await
    }

    /// 对话式工作流：把用户消息加入历史，并以历史为上下文启动
    ///
    /// 只有运行被接受后消息才会写入历史。
    pub async fn send_message(&self, user_input: &str) -> Result<String> {
        let history = self.inner.context.chat_messages();
        let inputs = conversational_inputs(user_input, &history)?;
        let request = self.build_request(inputs)?;
        self.begin_run(Some(ChatMessage::new(MessageRole::User, user_input)))?;
        self.submit(request).await
    }

    async fn kickoff_with_inputs(&self, inputs: HashMap<String, String>) -> Result<String> {
        let request = self.build_request(inputs)?;
        self.kickoff_request(request).await
    }

    fn build_request(&self, inputs: HashMap<String, String>) -> Result<KickoffRequest> {
        let request = KickoffRequest::new(self.inner.topology.workflow.workflow_id.clone(), inputs)
            .with_tool_user_parameters(self.tool_user_parameters.clone());
        match &self.generation_config {
            Some(config) => request.with_generation_config(config),
            None => Ok(request),
        }
    }

    /// 提交 kickoff 请求并在拿到 trace id 后开始轮询
    pub async fn kickoff_request(&self, request: KickoffRequest) -> Result<String> {
        self.begin_run(None)?;
        self.submit(request).await
    }

    /// 检查就绪状态并占用运行槽位，进入 Starting
    fn begin_run(&self, user_message: Option<ChatMessage>) -> Result<()> {
        if let Some(issue) = check_readiness(&self.inner.topology, self.has_default_model) {
            return Err(self.kickoff_failed(issue.to_string()));
        }

        self.inner.context.update_run(|run| {
            if run.is_busy() {
                let current = run.trace_id.clone().unwrap_or_else(|| "pending".to_string());
                return Err(StudioError::RunInProgress(current));
            }
            run.phase = RunPhase::Starting;
            if let Some(message) = user_message {
                run.chat_messages.push(message);
            }
            Ok(())
        })
    }

    async fn submit(&self, request: KickoffRequest) -> Result<String> {
        let context = &self.inner.context;

        info!(workflow_id = %request.workflow_id, "kicking off workflow");
        let response = match self.inner.api.kickoff(request).await {
            Ok(response) => response,
            Err(error) => {
                context.update_run(|run| run.finish());
                return Err(self.kickoff_failed(error.to_string()));
            }
        };

        let Some(trace_id) = normalize_trace_id(&response.trace_id) else {
            context.update_run(|run| run.finish());
            return Err(self.kickoff_failed("backend returned no trace id".to_string()));
        };

        context.update_run(|run| {
            run.trace_id = Some(trace_id.clone());
            run.phase = RunPhase::Running;
            run.reset_for_polling();
        });
        info!(trace_id = %trace_id, "workflow run started");
        self.start_polling(trace_id.clone());
        Ok(trace_id)
    }

    fn kickoff_failed(&self, reason: String) -> StudioError {
        warn!(%reason, "could not start the workflow");
        self.inner
            .context
            .notify(Notification::error("Could not start the workflow", reason.clone()));
        StudioError::KickoffFailed(reason)
    }

    fn start_polling(&self, trace_id: String) {
        let mut poller = self.poller.lock();
        // 旧循环绑定的是上一个 trace，直接替换
        if let Some(previous) = poller.take() {
            debug!("replacing previous poll loop");
            drop(previous);
        }

        let inner = Arc::clone(&self.inner);
        *poller = Some(PollHandle::spawn(self.poll_interval, move || {
            let inner = Arc::clone(&inner);
            let trace_id = trace_id.clone();
            async move {
                if inner.tick(&trace_id).await.is_terminal() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        }));
    }

    /// 手动执行一次轮询
    pub async fn poll_once(&self) -> TickOutcome {
        let trace_id = self.inner.context.read_run(|run| run.trace_id.clone());
        match trace_id {
            Some(trace_id) => self.inner.tick(&trace_id).await,
            None => TickOutcome::Stopped,
        }
    }

    /// 外部终止当前运行
    pub fn stop(&self) {
        let was_running = self.inner.context.update_run(|run| {
            let was_running = run.is_running();
            run.finish();
            was_running
        });
        if let Some(handle) = self.poller.lock().take() {
            handle.stop();
        }
        if was_running {
            info!("workflow run stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// 等待当前轮询循环结束；运行因异常结束时返回 `RunException`
    pub async fn wait(&self) -> Result<()> {
        let handle = self.poller.lock().take();
        if let Some(handle) = handle {
            handle.join().await;
        }
        match self.inner.context.read_run(|run| run.failure.clone()) {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }
}

impl RunInner {
    async fn tick(&self, trace_id: &str) -> TickOutcome {
        if !self.is_current(trace_id) {
            return TickOutcome::Stopped;
        }

        let response = match self.api.events(trace_id).await {
            Ok(response) => response,
            Err(error) => {
                warn!(%trace_id, %error, "error polling for events");
                return TickOutcome::Skipped;
            }
        };

        let conversational = self.topology.workflow.is_conversational;
        let outcome = self.context.update_run(|run| {
            if !(run.is_running() && run.trace_id.as_deref() == Some(trace_id)) {
                return TickOutcome::Stopped;
            }

            run.events = response.events;
            run.current_event_index = run.events.len().saturating_sub(1);
            run.project_id = response.project_id;

            // 先检查异常，避免把失败当作成功
            let exception = run.events.iter().find_map(|event| {
                let exception = event.exception()?;
                if run.processed_exception_ids.contains(&event.id) {
                    return None;
                }
                Some((
                    event.id.clone(),
                    exception
                        .message
                        .clone()
                        .unwrap_or_else(|| "unknown error".to_string()),
                ))
            });
            if let Some((event_id, message)) = exception {
                run.processed_exception_ids.insert(event_id.clone());
                run.failure = Some(RunFailure {
                    event_id: event_id.clone(),
                    message: message.clone(),
                });
                run.finish();
                let text = format!("Error: {message}");
                if conversational {
                    run.chat_messages
                        .push(ChatMessage::new(MessageRole::Assistant, text));
                } else {
                    run.crew_output = Some(text);
                }
                return TickOutcome::Failed { event_id, message };
            }

            let complete = run
                .events
                .iter()
                .find(|event| event.name == names::CREW_COMPLETE)
                .map(|event| {
                    let output = match event.payload() {
                        EventPayload::CrewComplete { crew_output } => crew_output,
                        _ => None,
                    };
                    (event.id.clone(), output)
                });
            if let Some((event_id, output)) = complete {
                run.finish();
                run.crew_output = output.clone();
                if conversational {
                    run.chat_messages.push(
                        ChatMessage::new(MessageRole::Assistant, output.clone().unwrap_or_default())
                            .with_id(event_id),
                    );
                }
                return TickOutcome::Completed { output };
            }

            TickOutcome::Continue {
                event_count: run.events.len(),
            }
        });

        match &outcome {
            TickOutcome::Failed { event_id, message } => {
                warn!(%trace_id, %event_id, %message, "workflow run failed");
                self.context
                    .notify(Notification::error("Workflow run failed", message.clone()));
            }
            TickOutcome::Completed { .. } => {
                info!(%trace_id, "workflow run completed");
                self.context
                    .notify(Notification::success("Workflow run completed", trace_id));
            }
            TickOutcome::Continue { event_count } => {
                debug!(%trace_id, event_count, "polled trace events");
            }
            _ => {}
        }
        outcome
    }

    fn is_current(&self, trace_id: &str) -> bool {
        self.context
            .read_run(|run| run.is_running() && run.trace_id.as_deref() == Some(trace_id))
    }
}
