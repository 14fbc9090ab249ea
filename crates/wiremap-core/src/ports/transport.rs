//! Transport port - ネットワーク I/O の抽象化
//!
//! コアはこの形だけに依存し、HTTP クライアントの実装には依存しません。

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{CancelSignal, Request, TransportFailure};

/// Issues one request and completes with the decoded payload or a failure.
///
/// Implementations run on their own execution context; the runner only
/// awaits the returned future. `cancel` lets a cancellable implementation
/// stop early. Ignoring it is allowed: cancellation is cooperative.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn issue(&self, request: &Request, cancel: CancelSignal) -> Result<Value, TransportFailure>;
}
