//! ScriptedTransport - テスト・デモ用の transport
//!
//! # 学習ポイント
//! - tokio::sync::Mutex で async context から状態を共有
//! - `tokio::select!` で latency（sleep）と取り消しを競合させる
//!
//! 返す応答をあらかじめキューに積んでおき、`issue` のたびに先頭から 1 つ
//! 取り出します。発行されたリクエストはすべて記録されます。

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{CancelSignal, Request, TransportFailure};
use crate::ports::Transport;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Payload(Value),
    Failure(TransportFailure),
}

/// Transport that replays a queue of replies.
///
/// # 使用例
/// ```ignore
/// let transport = ScriptedTransport::new()
///     .reply_err(TransportFailure::status(401, "token expired"))
///     .reply_ok(json!({ "login": "octocat" }));
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    issued: Mutex<Vec<Request>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_ok(mut self, payload: Value) -> Self {
        self.replies.get_mut().push_back(Reply::Payload(payload));
        self
    }

    pub fn reply_err(mut self, failure: TransportFailure) -> Self {
        self.replies.get_mut().push_back(Reply::Failure(failure));
        self
    }

    /// Delay every reply; a cancelled task stops waiting early.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn push(&self, reply: Reply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Every request issued so far, in order.
    pub async fn issued(&self) -> Vec<Request> {
        self.issued.lock().await.clone()
    }

    pub async fn issued_count(&self) -> usize {
        self.issued.lock().await.len()
    }

    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn issue(&self, request: &Request, mut cancel: CancelSignal) -> Result<Value, TransportFailure> {
        self.issued.lock().await.push(request.clone());
        debug!(method = %request.method, url = %request.url, "scripted request");

        if let Some(latency) = self.latency {
            tokio::select! {
                _ = tokio::time::sleep(latency) => {}
                _ = cancel.cancelled() => {
                    return Err(TransportFailure::network("request cancelled"));
                }
            }
        }

        match self.replies.lock().await.pop_front() {
            Some(Reply::Payload(payload)) => Ok(payload),
            Some(Reply::Failure(failure)) => Err(failure),
            None => Err(TransportFailure::network("no scripted reply left")),
        }
    }
}
