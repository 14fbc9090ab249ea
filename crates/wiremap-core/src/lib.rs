//! wiremap-core
//!
//! Schema-driven object mapping and a retriable task runner with a single
//! recovery step.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, request, response, errors, state, outcome, cancel, task）
//! - **schema**: スキーマ定義（FieldRule, SchemaRegistry, JSON 設定, 組み込み変換）
//! - **mapping**: ObjectMapper と型付きの `Mappable` API
//! - **ports**: 抽象化レイヤー（Transport, TaskRunnerDelegate, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（TaskRunner, ApiController, ControllerBuilder）
//! - **impls**: 実装（ScriptedTransport, TokenRefreshDelegate）

pub mod app;
pub mod domain;
pub mod impls;
pub mod mapping;
pub mod ports;
pub mod schema;
