//! Mappable trait - 型名と Rust の型を対応付ける
//!
//! # 学習ポイント
//! - Associated Constants (`const TYPE`)
//! - 二層構造: 内部は `Value` で動的にマッピングし、表層で一度だけ
//!   `serde_json::from_value` して具体的な型にする（型消去パターン）
//!
//! # 使用例
//! ```ignore
//! #[derive(Debug, Default, Deserialize)]
//! #[serde(default)]
//! struct Repository {
//!     id: u64,
//!     name: String,
//!     created_at: Option<DateTime<Utc>>,
//!     owner: User,
//! }
//!
//! impl Mappable for Repository {
//!     const TYPE: &'static str = "Repository";
//! }
//!
//! let repo: Repository = mapper.map(&raw)?;
//! ```

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::error::MapError;
use super::mapper::ObjectMapper;
use crate::domain::ResponseType;

/// A type the mapper can produce.
///
/// # Trait Bounds
/// - `DeserializeOwned`: マッピング結果の `Value` から構築するため
/// - `Default`: 欠けた属性をデフォルト値のままにするため。
///   struct には `#[serde(default)]` を付けること
/// - `Send + 'static`: タスクの結果として他の task に渡せるように
pub trait Mappable: DeserializeOwned + Default + Send + 'static {
    /// Schema registry key of this type.
    const TYPE: &'static str;
}

fn construct_error(type_name: &str, err: serde_json::Error) -> MapError {
    MapError::Construct {
        type_name: type_name.to_string(),
        reason: err.to_string(),
    }
}

fn construct<T: DeserializeOwned>(type_name: &str, value: Value) -> Result<T, MapError> {
    serde_json::from_value(value).map_err(|e| construct_error(type_name, e))
}

/// Build a `T` from a mapped object.
///
/// A top-level attribute whose value does not fit the Rust field (a negative
/// number for a `u64`, say) is left at its default. Only a `T` that cannot be
/// built even from the attributes that do fit is a `Construct` error.
pub(crate) fn construct_object<T: Mappable>(mapped: Value) -> Result<T, MapError> {
    let err = match T::deserialize(&mapped) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    let Value::Object(fields) = mapped else {
        return Err(construct_error(T::TYPE, err));
    };

    let kept: Map<String, Value> = fields
        .into_iter()
        .filter(|(key, value)| {
            let single = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
            match T::deserialize(&single) {
                Ok(_) => true,
                Err(err) => {
                    warn!(type_name = T::TYPE, key = %key, error = %err, "attribute does not fit, left at default");
                    false
                }
            }
        })
        .collect();
    construct(T::TYPE, Value::Object(kept))
}

/// Build a `Vec<T>` from a mapped sequence, dropping elements that do not
/// fit `T`. Order is preserved.
pub(crate) fn construct_list<T: Mappable>(mapped: Value) -> Result<Vec<T>, MapError> {
    let Value::Array(items) = mapped else {
        return construct(T::TYPE, mapped);
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match T::deserialize(&item) {
            Ok(value) => out.push(value),
            Err(err) => {
                // not even `{}` builds a T: the struct and the schema disagree
                T::deserialize(&Value::Object(Map::new()))
                    .map_err(|e| construct_error(T::TYPE, e))?;
                warn!(type_name = T::TYPE, index, error = %err, "dropping element that does not fit");
            }
        }
    }
    Ok(out)
}

impl ObjectMapper {
    /// Map `raw` into a `T`. Only configuration defects are errors; a payload
    /// that is not an object at all yields `T::default()`.
    pub fn map<T: Mappable>(&self, raw: &Value) -> Result<T, MapError> {
        let mapped = self.map_response(&ResponseType::object(T::TYPE), raw)?;
        construct_object(mapped)
    }

    /// Map a sequence of `T`, dropping elements that fail to map.
    pub fn map_list<T: Mappable>(&self, raw: &Value) -> Result<Vec<T>, MapError> {
        let mapped = self.map_response(&ResponseType::array_of(T::TYPE), raw)?;
        construct_list(mapped)
    }
}
