//! ControllerBuilder - ApiController の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: スキーマの登録漏れをリクエスト時ではなく
//!   build 時に見つける

use std::sync::Arc;

use super::config::ClientConfig;
use super::controller::ApiController;
use super::runner::TaskRunner;
use crate::mapping::{Mappable, ObjectMapper};
use crate::ports::{IdGenerator, SystemClock, TaskRunnerDelegate, Transport, UlidGenerator};
use crate::schema::{SchemaConfigError, SchemaRegistry};

/// # 使用例
/// ```ignore
/// let api = ControllerBuilder::new()
///     .base_url("https://api.github.com")
///     .load_schema(SCHEMA_JSON)?
///     .transport(Arc::new(transport))
///     .delegate(Arc::new(TokenRefreshDelegate::new(refresher)))
///     .expect::<Repository>()
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_types() / expect() で使う予定の型名を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」と、登録済みスキーマの
///   参照先がすべて解決できることをチェック
pub struct ControllerBuilder {
    config: Option<ClientConfig>,
    registry: SchemaRegistry,
    transport: Option<Arc<dyn Transport>>,
    delegate: Option<Arc<dyn TaskRunnerDelegate>>,
    ids: Option<Arc<dyn IdGenerator>>,
    expected_types: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("no client config: call config() or base_url()")]
    MissingConfig,

    #[error("no transport: call transport()")]
    MissingTransport,

    #[error("Missing types: {0:?}. These types were expected but not registered.")]
    MissingTypes(Vec<String>),

    #[error("Unresolved schema references: {0:?}")]
    UnresolvedReferences(Vec<String>),
}

impl ControllerBuilder {
    /// Starts from a registry with the built-in value transformers.
    pub fn new() -> Self {
        Self {
            config: None,
            registry: SchemaRegistry::with_builtins(),
            transport: None,
            delegate: None,
            ids: None,
            expected_types: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        self.config(ClientConfig::new(base_url))
    }

    /// Replace the schema registry.
    pub fn schema(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Merge a JSON schema configuration into the registry.
    pub fn load_schema(mut self, json: &str) -> Result<Self, SchemaConfigError> {
        self.registry.load_config(json)?;
        Ok(self)
    }

    pub fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn delegate(mut self, delegate: Arc<dyn TaskRunnerDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn expect_types(mut self, type_names: &[&str]) -> Self {
        let expected = self.expected_types.get_or_insert_with(Vec::new);
        expected.extend(type_names.iter().map(|t| t.to_string()));
        self
    }

    pub fn expect<T: Mappable>(self) -> Self {
        self.expect_types(&[T::TYPE])
    }

    /// # 検証
    /// - config と transport が設定されているか
    /// - expect されていれば、期待する型が全て登録済みで、かつ
    ///   registry 全体の参照（要素型・変換関数）が解決できるか
    pub fn build(self) -> Result<ApiController, BuildError> {
        let config = self.config.ok_or(BuildError::MissingConfig)?;
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;

        if let Some(expected) = &self.expected_types {
            let missing: Vec<String> = expected
                .iter()
                .filter(|t| !self.registry.contains(t))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTypes(missing));
            }
            self.registry
                .validate()
                .map_err(BuildError::UnresolvedReferences)?;
        }

        let mut runner = TaskRunner::new(transport, ObjectMapper::new(Arc::new(self.registry)));
        if let Some(delegate) = self.delegate {
            runner = runner.with_delegate(delegate);
        }
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));

        Ok(ApiController::new(config, runner, ids))
    }
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
