//! TaskRunnerDelegate port - エラーの書き換えと recovery task の供給
//!
//! 2 つのフックはどちらも任意です。デフォルト実装は「何もしない」なので、
//! 必要なものだけ override します。
//!
//! # 典型例
//! アクセストークンの期限切れ（401）で 1 回目が失敗したら、
//! recovery task でトークンを更新し、`on_success` で Authorization ヘッダを
//! 書き換えてから 2 回目を実行する。

use async_trait::async_trait;

use crate::domain::{ApiError, CancelSignal, RawResponse, Request, RetriableTask};

/// One-shot recovery operation that must succeed before the failed task is
/// re-issued.
#[async_trait]
pub trait RecoveryTask: Send {
    async fn run(&mut self, cancel: CancelSignal) -> Result<(), ApiError>;

    /// Called after a successful `run`, before the second attempt, with the
    /// original task's request so credentials or headers can be rewritten.
    fn on_success(self: Box<Self>, _request: &mut Request) {}
}

pub trait TaskRunnerDelegate: Send + Sync {
    /// Replace `error` with a domain-specific one, e.g. built from the
    /// error body in `response`. `None` keeps the original.
    fn custom_error(&self, _response: &RawResponse, _error: &ApiError) -> Option<ApiError> {
        None
    }

    /// Recovery step for a task whose first attempt failed with `error`
    /// (already rewritten by `custom_error`). `None` means the failure is
    /// reported as-is.
    fn recovery_task(
        &self,
        _task: &RetriableTask,
        _error: &ApiError,
    ) -> Option<Box<dyn RecoveryTask>> {
        None
    }
}

/// Delegate with neither hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelegate;

impl TaskRunnerDelegate for NoDelegate {}
