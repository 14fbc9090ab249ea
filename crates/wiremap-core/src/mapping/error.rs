use thiserror::Error;

use crate::domain::{ApiError, TransformError};

/// Errors raised while mapping a payload.
///
/// Configuration defects (`UnknownType`, `UnknownTransformer`, `Construct`)
/// always reach the caller. Data defects (`NotAnObject`, `Transform`,
/// `Rejected`) are
/// contained to the field, element or entry that caused them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("unknown transformer '{0}'")]
    UnknownTransformer(String),

    #[error("cannot construct '{type_name}': {reason}")]
    Construct { type_name: String, reason: String },

    #[error("'{type_name}' expects an object, found {found}")]
    NotAnObject {
        type_name: String,
        found: &'static str,
    },

    #[error("'{type_name}' transform failed: {source}")]
    Transform {
        type_name: String,
        source: TransformError,
    },

    /// Every field the payload carried for this type failed to map.
    #[error("no field of '{type_name}' could be mapped ({failed} failed)")]
    Rejected { type_name: String, failed: usize },
}

impl MapError {
    pub fn is_config_defect(&self) -> bool {
        matches!(
            self,
            MapError::UnknownType(_) | MapError::UnknownTransformer(_) | MapError::Construct { .. }
        )
    }
}

impl From<MapError> for ApiError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::UnknownType(name) => ApiError::UnknownType(name),
            MapError::UnknownTransformer(name) => ApiError::UnknownTransformer(name),
            MapError::Construct { type_name, reason } => ApiError::Construct { type_name, reason },
            other => ApiError::Decode(other.to_string()),
        }
    }
}
