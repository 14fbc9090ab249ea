//! RetriableTask - 1 つの論理リクエストの記述子
//!
//! # 学習ポイント
//! - 「1 回だけ retry できる」を bool の書き換えではなく
//!   `RetryContext` の一方向の状態遷移として表現する
//! - 取り消しは共有フラグ（`CancelHandle`）で協調的に行う
//! - `active_sub_task` は「今なにが走っているか」の記述だけを持ち、
//!   所有権は持たない

use super::cancel::{CancelHandle, CancelSignal};
use super::ids::TaskId;
use super::request::Request;
use super::state::TaskState;

/// How the raw payload of a successful response is mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseType {
    /// Deliver the raw payload as-is.
    Raw,
    /// Map a single object of the named type.
    Object(String),
    /// Map a sequence whose elements are of the named type.
    ArrayOf(String),
}

impl ResponseType {
    pub fn object(type_name: impl Into<String>) -> Self {
        Self::Object(type_name.into())
    }

    pub fn array_of(type_name: impl Into<String>) -> Self {
        Self::ArrayOf(type_name.into())
    }
}

/// Retry state threaded between attempts.
///
/// `can_retry` is chosen by the issuer. `second_try` flips exactly once,
/// through [`RetryContext::into_second_try`], and from then on the context is
/// never eligible again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryContext {
    can_retry: bool,
    second_try: bool,
}

impl RetryContext {
    pub fn new(can_retry: bool) -> Self {
        Self {
            can_retry,
            second_try: false,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.can_retry
    }

    pub fn is_second_try(&self) -> bool {
        self.second_try
    }

    pub fn is_retry_eligible(&self) -> bool {
        self.can_retry && !self.second_try
    }

    /// Consume the single retry. `None` when it was already used or never allowed.
    pub fn into_second_try(self) -> Option<Self> {
        self.is_retry_eligible().then_some(Self {
            second_try: true,
            ..self
        })
    }
}

/// The operation currently running on behalf of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubTask {
    /// Transport call; `attempt` is 1 or 2.
    Transport { attempt: u8 },
    /// Recovery step supplied by the delegate.
    Recovery,
}

/// A unit of network-bound work that may be recovered and re-issued once.
///
/// # 使用例
/// ```ignore
/// let mut task = RetriableTask::new(id, Request::get(url), ResponseType::object("User"))
///     .retriable(true);
/// let cancel = task.cancel_handle();
/// let outcome = runner.perform(&mut task).await;
/// ```
#[derive(Debug)]
pub struct RetriableTask {
    id: TaskId,
    request: Request,
    response_type: ResponseType,
    retry: RetryContext,
    state: TaskState,
    cancel: CancelHandle,
    active_sub_task: Option<SubTask>,
}

impl RetriableTask {
    pub fn new(id: TaskId, request: Request, response_type: ResponseType) -> Self {
        Self {
            id,
            request,
            response_type,
            retry: RetryContext::new(false),
            state: TaskState::Created,
            cancel: CancelHandle::new(),
            active_sub_task: None,
        }
    }

    /// Allow (or forbid) one recovery-and-retry cycle.
    pub fn retriable(mut self, can_retry: bool) -> Self {
        self.retry = RetryContext::new(can_retry);
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response_type(&self) -> &ResponseType {
        &self.response_type
    }

    pub fn retry(&self) -> RetryContext {
        self.retry
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn active_sub_task(&self) -> Option<SubTask> {
        self.active_sub_task
    }

    /// Handle the caller keeps to cancel the task while it runs.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel_signal(&self) -> CancelSignal {
        self.cancel.signal()
    }

    pub(crate) fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub(crate) fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    pub(crate) fn set_active_sub_task(&mut self, sub_task: Option<SubTask>) {
        self.active_sub_task = sub_task;
    }

    /// Move to the second try. Returns false when the retry is not available.
    pub(crate) fn consume_retry(&mut self) -> bool {
        match self.retry.into_second_try() {
            Some(next) => {
                self.retry = next;
                true
            }
            None => false,
        }
    }
}
