//! Errors - エラー型と分類
//!
//! - `ApiError`: タスク実行の結果として呼び出し側に返るエラー
//! - `TransformError`: 1 フィールド分の値変換エラー（呼び出し側には届かない）
//!
//! `ErrorKind` でエラーを運用上の分類に落とし、recovery + retry の
//! 対象になるかどうかを判断します。

use std::fmt::Display;

use serde_json::Value;
use thiserror::Error;

/// ErrorKind は実行エラーの分類
///
/// - Transient: 一時的なエラー（recovery の後に 1 回だけ再実行できる）
/// - Permanent: 恒久的なエラー（リトライ無意味）
/// - Configuration: スキーマ定義の不備（即時に表面化、リトライしない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Configuration,
}

/// A single field failed scalar conversion.
///
/// Always contained to that field: the mapper logs it and leaves the
/// attribute unset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("cannot convert {value}: {reason}")]
    Unparseable { value: String, reason: String },

    #[error("{0}")]
    Custom(String),
}

impl TransformError {
    pub fn unparseable(value: &Value, reason: impl Display) -> Self {
        Self::Unparseable {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Errors surfaced to whoever performs a task.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Network / HTTP failure reported by the transport.
    #[error("transport error (status={status:?}): {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Error produced by a delegate from the raw response.
    #[error("{message}")]
    Custom {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("unknown type '{0}' referenced by schema")]
    UnknownType(String),

    #[error("unknown transformer '{0}' referenced by schema")]
    UnknownTransformer(String),

    #[error("cannot construct '{type_name}' from mapped value: {reason}")]
    Construct { type_name: String, reason: String },

    #[error("cannot decode response: {0}")]
    Decode(String),

    #[error("recovery failed: {0}")]
    RecoveryFailed(Box<ApiError>),

    #[error("retry exhausted: {0}")]
    RetryExhausted(Box<ApiError>),

    #[error("task cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn custom(status: Option<u16>, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Custom {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport { .. } | ApiError::Custom { .. } => ErrorKind::Transient,
            ApiError::UnknownType(_)
            | ApiError::UnknownTransformer(_)
            | ApiError::Construct { .. } => ErrorKind::Configuration,
            ApiError::Decode(_)
            | ApiError::RecoveryFailed(_)
            | ApiError::RetryExhausted(_)
            | ApiError::Cancelled => ErrorKind::Permanent,
        }
    }

    /// Whether a recovery step followed by a second attempt makes sense.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// HTTP status carried by this error, looking through wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } | ApiError::Custom { status, .. } => *status,
            ApiError::RecoveryFailed(inner) | ApiError::RetryExhausted(inner) => inner.status(),
            _ => None,
        }
    }
}
