//! App - アプリケーション層
//!
//! ports を組み合わせて、タスクの実行と API 表層を実装します。
//!
//! # 主要コンポーネント
//! - **TaskRunner**: RetriableTask の実行（1 回限りの recovery retry 付き）
//! - **ApiController**: タスク生成と型付き API
//! - **ControllerBuilder**: 構築とワイヤリング（起動時検証）
//! - **ClientConfig**: base URL・既定ヘッダ・retry 設定

pub mod builder;
pub mod config;
pub mod controller;
pub mod runner;

pub use self::builder::{BuildError, ControllerBuilder};
pub use self::config::{ClientConfig, ConfigError};
pub use self::controller::ApiController;
pub use self::runner::TaskRunner;
