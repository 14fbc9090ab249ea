//! Mapping - スキーマに従って decode 済みの payload を型付きオブジェクトにする
//!
//! - **mapper**: `ObjectMapper`（`Value` -> `Value`、ベストエフォート）
//! - **typed**: `Mappable` trait と型付きの表層 API
//! - **error**: `MapError`（設定不備とデータ不備の区別）

pub mod error;
pub mod mapper;
pub mod typed;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::error::MapError;
pub use self::mapper::ObjectMapper;
pub use self::typed::Mappable;
