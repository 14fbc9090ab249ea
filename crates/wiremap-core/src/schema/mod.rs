//! Schema - 型名ごとの宣言的なマッピング定義
//!
//! - **rule**: FieldRule / FieldKind / FieldTable / TargetPath
//! - **registry**: SchemaRegistry（型名 -> FieldTable | 変換関数）
//! - **config**: JSON のスキーマ設定フォーマット
//! - **transformers**: 組み込みの値変換（日付など）

pub mod config;
pub mod registry;
pub mod rule;
pub mod transformers;

pub use self::config::{SchemaConfig, SchemaConfigError};
pub use self::registry::{
    ClassTransform, RegistryError, Schema, SchemaRegistry, TransformRef, ValueTransformer,
};
pub use self::rule::{FieldKind, FieldRule, FieldTable, ScalarType, TargetPath};
