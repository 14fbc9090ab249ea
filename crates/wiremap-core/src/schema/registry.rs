//! SchemaRegistry - 型名ごとのスキーマ登録と解決
//!
//! # 学習ポイント
//! - 実行時リフレクションの代わりに、型名 -> (FieldTable | 変換関数) の
//!   明示的なテーブルを持つ
//! - `Arc<dyn Fn ...>` で変換関数を型消去して HashMap に格納
//! - 登録は遅延評価: 参照先の型が未登録でも登録時には失敗しない。
//!   解決はマッピング時に行い、未登録なら `MapError::UnknownType`

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::rule::{FieldKind, FieldTable};
use crate::domain::TransformError;
use crate::mapping::MapError;

/// Value transform (wire representation -> attribute representation).
pub type ValueTransformer = Arc<dyn Fn(&Value) -> Result<Value, TransformError> + Send + Sync>;

/// Class-level transform (raw dictionary -> whole object).
pub type ClassTransform =
    Arc<dyn Fn(&Map<String, Value>) -> Result<Value, TransformError> + Send + Sync>;

/// Reference to a class-level transform: by name, or the function itself.
#[derive(Clone)]
pub enum TransformRef {
    Named(String),
    Inline(ClassTransform),
}

impl fmt::Debug for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            TransformRef::Inline(_) => f.write_str("Inline(<fn>)"),
        }
    }
}

/// What `resolve` hands to the mapper. A class transform wins over a field
/// table registered for the same type.
pub enum Schema<'a> {
    Transform(&'a ClassTransform),
    Fields(&'a FieldTable),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("field table for type '{0}' is already registered")]
    FieldsAlreadyRegistered(String),

    #[error("transform for type '{0}' is already registered")]
    TransformAlreadyRegistered(String),
}

#[derive(Debug, Clone, Default)]
struct Entry {
    fields: Option<FieldTable>,
    transform: Option<TransformRef>,
}

/// Registry of schemas, class transforms and value transformers.
///
/// Built during initialization (mutable), then shared behind an `Arc` by the
/// mapper (immutable).
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    entries: HashMap<String, Entry>,
    class_transforms: HashMap<String, ClassTransform>,
    value_transformers: HashMap<String, ValueTransformer>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in value transformers already registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::transformers::register_builtins(&mut registry);
        registry
    }

    pub fn register_fields(
        &mut self,
        type_name: impl Into<String>,
        table: FieldTable,
    ) -> Result<(), RegistryError> {
        let type_name = type_name.into();
        let entry = self.entries.entry(type_name.clone()).or_default();
        if entry.fields.is_some() {
            return Err(RegistryError::FieldsAlreadyRegistered(type_name));
        }
        entry.fields = Some(table);
        Ok(())
    }

    /// Map `type_name` through the class transform registered as `transform_name`.
    pub fn register_transform(
        &mut self,
        type_name: impl Into<String>,
        transform_name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.set_transform(type_name.into(), TransformRef::Named(transform_name.into()))
    }

    /// Map `type_name` through `transform` directly.
    pub fn register_transform_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        transform: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&Map<String, Value>) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.set_transform(type_name.into(), TransformRef::Inline(Arc::new(transform)))
    }

    fn set_transform(&mut self, type_name: String, transform: TransformRef) -> Result<(), RegistryError> {
        let entry = self.entries.entry(type_name.clone()).or_default();
        if entry.transform.is_some() {
            return Err(RegistryError::TransformAlreadyRegistered(type_name));
        }
        entry.transform = Some(transform);
        Ok(())
    }

    /// Named class transform, referenced by `register_transform` or a schema
    /// configuration string entry. Last registration wins.
    pub fn register_class_transform<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(&Map<String, Value>) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.class_transforms.insert(name.into(), Arc::new(transform));
    }

    /// Named value transformer for scalar fields. Last registration wins.
    pub fn register_value_transformer<F>(&mut self, name: impl Into<String>, transformer: F)
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.value_transformers.insert(name.into(), Arc::new(transformer));
    }

    pub fn resolve(&self, type_name: &str) -> Result<Schema<'_>, MapError> {
        let entry = self
            .entries
            .get(type_name)
            .ok_or_else(|| MapError::UnknownType(type_name.to_string()))?;

        match (&entry.transform, &entry.fields) {
            (Some(TransformRef::Inline(f)), _) => Ok(Schema::Transform(f)),
            (Some(TransformRef::Named(name)), _) => self
                .class_transforms
                .get(name)
                .map(Schema::Transform)
                .ok_or_else(|| MapError::UnknownTransformer(name.clone())),
            (None, Some(table)) => Ok(Schema::Fields(table)),
            (None, None) => Err(MapError::UnknownType(type_name.to_string())),
        }
    }

    pub fn value_transformer(&self, name: &str) -> Result<&ValueTransformer, MapError> {
        self.value_transformers
            .get(name)
            .ok_or_else(|| MapError::UnknownTransformer(name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.entries.keys().cloned().collect();
        types.sort();
        types
    }

    /// Check every reference between registered schemas.
    ///
    /// Mapping does not need this (it resolves lazily); it exists for
    /// fail-fast startup. Returns one message per dangling reference.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = BTreeSet::new();

        for (type_name, entry) in &self.entries {
            if let Some(TransformRef::Named(name)) = &entry.transform
                && !self.class_transforms.contains_key(name)
            {
                problems.insert(format!("{type_name}: unknown class transform '{name}'"));
            }

            let Some(table) = &entry.fields else {
                continue;
            };
            for (wire_key, rule) in table.iter() {
                if rule.target.is_empty() {
                    problems.insert(format!("{type_name}.{wire_key}: empty target path"));
                }
                match &rule.kind {
                    FieldKind::Scalar {
                        transformer: Some(name),
                        ..
                    } if !self.value_transformers.contains_key(name) => {
                        problems.insert(format!(
                            "{type_name}.{wire_key}: unknown value transformer '{name}'"
                        ));
                    }
                    kind => {
                        if let Some(referenced) = kind.referenced_type()
                            && self.resolve(referenced).is_err()
                        {
                            problems.insert(format!(
                                "{type_name}.{wire_key}: unresolved type '{referenced}'"
                            ));
                        }
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.into_iter().collect())
        }
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut class_transforms: Vec<_> = self.class_transforms.keys().collect();
        class_transforms.sort();
        let mut value_transformers: Vec<_> = self.value_transformers.keys().collect();
        value_transformers.sort();
        f.debug_struct("SchemaRegistry")
            .field("types", &self.registered_types())
            .field("class_transforms", &class_transforms)
            .field("value_transformers", &value_transformers)
            .finish()
    }
}
