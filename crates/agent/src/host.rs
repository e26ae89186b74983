//! The hosting agent: owns the registry and runs dispatches off the async
//! runtime with a deadline.

use std::sync::Arc;
use std::time::Duration;

use dispatch::{DispatchRequest, DispatchResult, Dispatcher, ToolRegistry, select};
use serde::Serialize;
use uuid::Uuid;

use crate::builtins;
use crate::config::Config;
use crate::model::ModelResponder;
use crate::Result;

const TIMED_OUT_REPLY: &str = "Sorry, the request took too long to complete. Please try again.";
const CRASHED_REPLY: &str = "Sorry, something went wrong while handling your request.";

/// One handled request, tagged with its task id.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReply {
    pub task_id: Uuid,
    #[serde(flatten)]
    pub result: DispatchResult,
}

/// A configured agent.
pub struct Agent {
    registry: Arc<ToolRegistry>,
    dispatcher: Dispatcher,
    timeout: Duration,
}

impl Agent {
    pub fn new(registry: ToolRegistry, dispatcher: Dispatcher, timeout: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            dispatcher,
            timeout,
        }
    }

    /// Build the registry and responder from configuration.
    ///
    /// Registry errors are fatal: an agent with a broken tool set must not
    /// serve traffic.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = builtins::registry(&config.agent.tools)?;

        let dispatcher = match &config.backend.api_key {
            Some(key) => {
                tracing::info!(model = %config.backend.model, "direct answers use the model backend");
                let mut responder = ModelResponder::new(
                    key.clone(),
                    &config.backend,
                    &config.agent,
                    config.dispatch_timeout(),
                );
                if let Some(endpoint) = &config.backend.endpoint {
                    responder = responder.with_endpoint(endpoint.clone());
                }
                Dispatcher::new(responder)
            }
            None => {
                tracing::info!("no API key configured, direct answers use placeholder replies");
                Dispatcher::default()
            }
        };

        Ok(Self::new(registry, dispatcher, config.dispatch_timeout()))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one request.
    ///
    /// Dispatch runs on the blocking pool so tools and the model client may
    /// block. Past the deadline the caller gets a failed result; the
    /// abandoned dispatch keeps no shared state, so finishing late is
    /// harmless.
    pub async fn handle(&self, text: impl Into<String>) -> TaskReply {
        let task_id = Uuid::new_v4();
        let span = tracing::info_span!("task", id = %task_id);
        let request = DispatchRequest::new(text);

        let registry = Arc::clone(&self.registry);
        let dispatcher = self.dispatcher.clone();
        let worker_span = span.clone();
        let worker_request = request.clone();
        let task = tokio::task::spawn_blocking(move || {
            let _entered = worker_span.enter();
            dispatcher.dispatch(&worker_request, &registry)
        });

        let result = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                span.in_scope(|| tracing::error!(error = %e, "dispatch task failed"));
                self.failure(&request, CRASHED_REPLY)
            }
            Err(_) => {
                span.in_scope(|| {
                    tracing::warn!(timeout = ?self.timeout, "dispatch timed out")
                });
                self.failure(&request, TIMED_OUT_REPLY)
            }
        };

        TaskReply { task_id, result }
    }

    fn failure(&self, request: &DispatchRequest, reply: &str) -> DispatchResult {
        DispatchResult {
            reply_text: reply.to_string(),
            used_tool: select(&request.text, &self.registry)
                .tool_name()
                .map(str::to_string),
            succeeded: false,
            error: None,
        }
    }
}
