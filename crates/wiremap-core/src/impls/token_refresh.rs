//! Bearer token refresh as a recovery step.
//!
//! On an authentication failure (401 / 403 by default) the delegate offers a
//! recovery task that obtains a fresh token from a `TokenRefresher` and
//! rewrites the `Authorization` header of the failed request before it is
//! issued again.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::{ApiError, CancelSignal, Request, RetriableTask};
use crate::ports::{RecoveryTask, TaskRunnerDelegate};

/// Source of fresh access tokens (refresh-token grant, re-login, ...).
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<String, ApiError>;
}

pub struct TokenRefreshDelegate {
    refresher: Arc<dyn TokenRefresher>,
    statuses: Vec<u16>,
    header: String,
}

impl TokenRefreshDelegate {
    pub fn new(refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            refresher,
            statuses: vec![401, 403],
            header: "Authorization".to_string(),
        }
    }

    /// Statuses that trigger a refresh.
    pub fn with_statuses(mut self, statuses: &[u16]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn triggers_on(&self, error: &ApiError) -> bool {
        error.status().is_some_and(|s| self.statuses.contains(&s))
    }
}

impl std::fmt::Debug for TokenRefreshDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefreshDelegate")
            .field("statuses", &self.statuses)
            .field("header", &self.header)
            .finish()
    }
}

impl TaskRunnerDelegate for TokenRefreshDelegate {
    fn recovery_task(&self, task: &RetriableTask, error: &ApiError) -> Option<Box<dyn RecoveryTask>> {
        if !self.triggers_on(error) {
            debug!(task_id = %task.id(), error = %error, "not an auth failure, no refresh");
            return None;
        }
        Some(Box::new(RefreshToken {
            refresher: Arc::clone(&self.refresher),
            header: self.header.clone(),
            token: None,
        }))
    }
}

struct RefreshToken {
    refresher: Arc<dyn TokenRefresher>,
    header: String,
    token: Option<String>,
}

#[async_trait]
impl RecoveryTask for RefreshToken {
    async fn run(&mut self, _cancel: CancelSignal) -> Result<(), ApiError> {
        let token = self.refresher.refresh().await?;
        info!("access token refreshed");
        self.token = Some(token);
        Ok(())
    }

    fn on_success(self: Box<Self>, request: &mut Request) {
        if let Some(token) = self.token {
            request.set_header(self.header, format!("Bearer {token}"));
        }
    }
}
