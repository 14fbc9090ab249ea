//! Impls - ports の実装
//!
//! - **ScriptedTransport**: 応答を台本どおりに返す開発・テスト用 transport
//! - **TokenRefreshDelegate**: 認証エラー時にトークンを更新する delegate

pub mod scripted_transport;
pub mod token_refresh;

pub use self::scripted_transport::{Reply, ScriptedTransport};
pub use self::token_refresh::{TokenRefreshDelegate, TokenRefresher};
