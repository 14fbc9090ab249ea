//! TaskRunner - RetriableTask の実行と 1 回限りの recovery retry
//!
//! # 状態遷移
//! ```text
//! attempt 1 ── ok ──> map ──> Succeeded
//!     │
//!     └─ err ─> cancelled? ──> Cancelled
//!               custom_error で置き換え
//!               can_retry でない / retry 不可 / recovery なし ──> Failed(E)
//!               recovery 実行 ── err ──> Failed(RecoveryFailed)
//!                   │
//!                   └─ ok ─> on_success(request) ─> second_try ─> attempt 2
//!                                                   attempt 2 err ──> Failed(RetryExhausted)
//! ```
//!
//! # 設計
//! - `perform` は `&mut RetriableTask` を取るので、1 つのタスクに同時に 2 つの
//!   perform が走ることはコンパイル時に排除される
//! - runner 自体は共有可変状態を持たない（`Arc<TaskRunner>` で並行利用可）
//! - recovery と 2 回目は `.await` で直列化される

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{
    ApiError, RetriableTask, SubTask, TaskOutcome, TaskResponse, TaskState,
};
use crate::mapping::ObjectMapper;
use crate::ports::{NoDelegate, TaskRunnerDelegate, Transport};

pub struct TaskRunner {
    transport: Arc<dyn Transport>,
    mapper: ObjectMapper,
    delegate: Arc<dyn TaskRunnerDelegate>,
}

impl TaskRunner {
    pub fn new(transport: Arc<dyn Transport>, mapper: ObjectMapper) -> Self {
        Self {
            transport,
            mapper,
            delegate: Arc::new(NoDelegate),
        }
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn TaskRunnerDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn mapper(&self) -> &ObjectMapper {
        &self.mapper
    }

    /// Run `task` to a terminal outcome.
    ///
    /// Exactly one outcome per call. A cancelled task resolves to
    /// `TaskOutcome::Cancelled` and never reports success or failure.
    #[tracing::instrument(
        name = "perform",
        skip_all,
        fields(task_id = %task.id(), method = %task.request().method, url = %task.request().url)
    )]
    pub async fn perform(&self, task: &mut RetriableTask) -> TaskOutcome {
        let outcome = self.drive(task).await;
        task.set_active_sub_task(None);
        task.set_state(match &outcome {
            TaskOutcome::Succeeded(_) => TaskState::Succeeded,
            TaskOutcome::Failed(_) => TaskState::FailedTerminal,
            TaskOutcome::Cancelled => TaskState::Cancelled,
        });
        outcome
    }

    async fn drive(&self, task: &mut RetriableTask) -> TaskOutcome {
        task.set_state(TaskState::Running);

        loop {
            if task.is_cancelled() {
                debug!("cancelled before attempt");
                return TaskOutcome::Cancelled;
            }

            let attempt = if task.retry().is_second_try() { 2 } else { 1 };
            task.set_active_sub_task(Some(SubTask::Transport { attempt }));
            let result = self.transport.issue(task.request(), task.cancel_signal()).await;
            task.set_active_sub_task(None);

            if task.is_cancelled() {
                debug!(attempt, "cancelled while in flight");
                return TaskOutcome::Cancelled;
            }

            let failure = match result {
                Ok(raw) => return self.complete(task, raw),
                Err(failure) => failure,
            };

            let error = self
                .delegate
                .custom_error(&failure.response, &failure.error)
                .unwrap_or(failure.error);

            if task.retry().is_second_try() {
                warn!(attempt, error = %error, "second attempt failed");
                return TaskOutcome::Failed(ApiError::RetryExhausted(Box::new(error)));
            }
            if !task.retry().can_retry() || !error.is_retryable() {
                debug!(attempt, error = %error, "failed, not retriable");
                return TaskOutcome::Failed(error);
            }
            let Some(mut recovery) = self.delegate.recovery_task(task, &error) else {
                debug!(attempt, error = %error, "failed, no recovery offered");
                return TaskOutcome::Failed(error);
            };

            info!(error = %error, "first attempt failed, running recovery");
            task.set_state(TaskState::RetryPending);
            task.set_active_sub_task(Some(SubTask::Recovery));
            let recovered = recovery.run(task.cancel_signal()).await;
            task.set_active_sub_task(None);

            if task.is_cancelled() {
                debug!("cancelled during recovery");
                return TaskOutcome::Cancelled;
            }
            if let Err(recovery_error) = recovered {
                // the original error is dropped in favour of the recovery error
                warn!(error = %recovery_error, "recovery failed");
                return TaskOutcome::Failed(ApiError::RecoveryFailed(Box::new(recovery_error)));
            }

            recovery.on_success(task.request_mut());
            let consumed = task.consume_retry();
            debug_assert!(consumed, "recovery only runs for a retry-eligible task");
            task.set_state(TaskState::Running);
        }
    }

    fn complete(&self, task: &RetriableTask, raw: Value) -> TaskOutcome {
        match self.mapper.map_response(task.response_type(), &raw) {
            Ok(mapped) => TaskOutcome::Succeeded(TaskResponse { raw, mapped }),
            Err(err) => {
                warn!(error = %err, "response mapping failed");
                TaskOutcome::Failed(err.into())
            }
        }
    }
}
