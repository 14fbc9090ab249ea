//! Schema configuration format.
//!
//! A JSON object from type name to either a field table or the name of a
//! class transform:
//!
//! ```json
//! {
//!   "Repository": {
//!     "full_name":  { "key": "name", "type": "String" },
//!     "created_at": { "key": "created_at", "type": "String", "transformer": "iso8601_date" },
//!     "owner":      { "key": "owner", "kindOf": "User" },
//!     "topics":     { "key": "topics", "arrayOf": "Topic" },
//!     "languages":  { "key": "languages", "dictionaryOf": "Language" }
//!   },
//!   "Money": "parse_money"
//! }
//! ```
//!
//! Field tables are keyed by wire-key; `key` is the target key path.
//! This format is stable: existing configuration files must keep parsing.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::registry::{RegistryError, SchemaRegistry};
use super::rule::{FieldKind, FieldRule, FieldTable, ScalarType, TargetPath};

#[derive(Debug, thiserror::Error)]
pub enum SchemaConfigError {
    #[error("invalid schema configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{type_name}.{wire_key}: unknown scalar type '{name}'")]
    UnknownScalarType {
        type_name: String,
        wire_key: String,
        name: String,
    },

    #[error("{type_name}.{wire_key}: one of type, kindOf, arrayOf, dictionaryOf is required")]
    MissingKind { type_name: String, wire_key: String },

    #[error("{type_name}.{wire_key}: type, kindOf, arrayOf and dictionaryOf are mutually exclusive")]
    AmbiguousKind { type_name: String, wire_key: String },

    #[error("{type_name}.{wire_key}: empty key path")]
    EmptyKeyPath { type_name: String, wire_key: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SchemaEntry {
    Transform(String),
    Fields(BTreeMap<String, FieldEntry>),
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    key: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    transformer: Option<String>,
    #[serde(rename = "kindOf")]
    kind_of: Option<String>,
    #[serde(rename = "arrayOf")]
    array_of: Option<String>,
    #[serde(rename = "dictionaryOf")]
    dictionary_of: Option<String>,
}

impl FieldEntry {
    fn into_rule(self, type_name: &str, wire_key: &str) -> Result<FieldRule, SchemaConfigError> {
        let context = || (type_name.to_string(), wire_key.to_string());

        let target = TargetPath::parse(&self.key);
        if target.is_empty() {
            let (type_name, wire_key) = context();
            return Err(SchemaConfigError::EmptyKeyPath { type_name, wire_key });
        }

        let scalar = self.ty.is_some() || self.transformer.is_some();
        let kinds = [
            scalar,
            self.kind_of.is_some(),
            self.array_of.is_some(),
            self.dictionary_of.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();
        if kinds == 0 {
            let (type_name, wire_key) = context();
            return Err(SchemaConfigError::MissingKind { type_name, wire_key });
        }
        if kinds > 1 {
            let (type_name, wire_key) = context();
            return Err(SchemaConfigError::AmbiguousKind { type_name, wire_key });
        }

        let kind = if let Some(t) = self.kind_of {
            FieldKind::Nested(t)
        } else if let Some(t) = self.array_of {
            FieldKind::ArrayOf(t)
        } else if let Some(t) = self.dictionary_of {
            FieldKind::DictionaryOf(t)
        } else {
            let ty = match self.ty {
                // a bare transformer leaves the result unchecked
                None => ScalarType::Any,
                Some(name) => ScalarType::from_name(&name).ok_or_else(|| {
                    let (type_name, wire_key) = context();
                    SchemaConfigError::UnknownScalarType {
                        type_name,
                        wire_key,
                        name,
                    }
                })?,
            };
            FieldKind::Scalar {
                ty,
                transformer: self.transformer,
            }
        };

        Ok(FieldRule { target, kind })
    }
}

/// Parsed schema configuration, not yet applied to a registry.
#[derive(Debug)]
pub struct SchemaConfig {
    entries: BTreeMap<String, SchemaEntry>,
}

impl SchemaConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SchemaConfigError> {
        let entries = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaConfigError> {
        let entries = serde_json::from_value(value)?;
        Ok(Self { entries })
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Register every entry. Stops at the first invalid field entry.
    pub fn apply(self, registry: &mut SchemaRegistry) -> Result<(), SchemaConfigError> {
        for (type_name, entry) in self.entries {
            match entry {
                SchemaEntry::Transform(name) => registry.register_transform(type_name, name)?,
                SchemaEntry::Fields(fields) => {
                    let mut table = FieldTable::new();
                    for (wire_key, field) in fields {
                        let rule = field.into_rule(&type_name, &wire_key)?;
                        table = table.rule(wire_key, rule);
                    }
                    registry.register_fields(type_name, table)?;
                }
            }
        }
        Ok(())
    }
}

impl SchemaRegistry {
    /// Parse a JSON schema configuration and register its entries.
    pub fn load_config(&mut self, json: &str) -> Result<(), SchemaConfigError> {
        SchemaConfig::from_json_str(json)?.apply(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    const GITHUB: &str = r#"{
        "Repository": {
            "full_name":  { "key": "name", "type": "String" },
            "created_at": { "key": "created_at", "type": "String", "transformer": "iso8601_date" },
            "owner":      { "key": "owner", "kindOf": "User" },
            "topics":     { "key": "meta.topics", "arrayOf": "Topic" },
            "languages":  { "key": "languages", "dictionaryOf": "Language" }
        },
        "User": {
            "login": { "key": "login", "type": "string" }
        },
        "Money": "parse_money"
    }"#;

    #[test]
    fn parses_every_field_kind() {
        let mut registry = SchemaRegistry::new();
        registry.load_config(GITHUB).unwrap();

        let Ok(Schema::Fields(table)) = registry.resolve("Repository") else {
            panic!("Repository should have a field table");
        };
        assert_eq!(
            table.get("created_at").unwrap().kind,
            FieldKind::Scalar {
                ty: ScalarType::String,
                transformer: Some("iso8601_date".into())
            }
        );
        assert_eq!(table.get("owner").unwrap().kind, FieldKind::Nested("User".into()));
        assert_eq!(table.get("topics").unwrap().kind, FieldKind::ArrayOf("Topic".into()));
        assert_eq!(table.get("topics").unwrap().target.to_string(), "meta.topics");
        assert_eq!(
            table.get("languages").unwrap().kind,
            FieldKind::DictionaryOf("Language".into())
        );
        assert_eq!(table.get("full_name").unwrap().target.to_string(), "name");
    }

    #[test]
    fn string_entry_registers_named_transform() {
        let mut registry = SchemaRegistry::new();
        registry.load_config(GITHUB).unwrap();
        // transform not registered yet: resolved lazily
        assert!(registry.resolve("Money").is_err());
        registry.register_class_transform("parse_money", |_| Ok(serde_json::json!(0)));
        assert!(matches!(registry.resolve("Money"), Ok(Schema::Transform(_))));
    }

    #[test]
    fn accepts_foundation_type_names() {
        let mut registry = SchemaRegistry::new();
        registry
            .load_config(
                r#"{ "User": {
                    "login": { "key": "login", "type": "NSString" },
                    "site_admin": { "key": "admin", "type": "NSNumber" }
                } }"#,
            )
            .unwrap();

        let Ok(Schema::Fields(table)) = registry.resolve("User") else {
            panic!("User should have a field table");
        };
        assert_eq!(
            table.get("login").unwrap().kind,
            FieldKind::Scalar { ty: ScalarType::String, transformer: None }
        );
        assert_eq!(
            table.get("site_admin").unwrap().kind,
            FieldKind::Scalar { ty: ScalarType::Any, transformer: None }
        );
    }

    #[test]
    fn rejects_unknown_scalar_type() {
        let err = SchemaConfig::from_json_str(r#"{ "User": { "id": { "key": "id", "type": "Decimal128" } } }"#)
            .unwrap()
            .apply(&mut SchemaRegistry::new())
            .unwrap_err();
        assert!(matches!(err, SchemaConfigError::UnknownScalarType { name, .. } if name == "Decimal128"));
    }

    #[test]
    fn rejects_missing_and_ambiguous_kinds() {
        let missing = SchemaRegistry::new()
            .load_config(r#"{ "User": { "id": { "key": "id" } } }"#)
            .unwrap_err();
        assert!(matches!(missing, SchemaConfigError::MissingKind { .. }));

        let ambiguous = SchemaRegistry::new()
            .load_config(r#"{ "User": { "id": { "key": "id", "type": "Integer", "kindOf": "Id" } } }"#)
            .unwrap_err();
        assert!(matches!(ambiguous, SchemaConfigError::AmbiguousKind { .. }));
    }

    #[test]
    fn rejects_empty_key_path() {
        let err = SchemaRegistry::new()
            .load_config(r#"{ "User": { "id": { "key": "", "type": "Integer" } } }"#)
            .unwrap_err();
        assert!(matches!(err, SchemaConfigError::EmptyKeyPath { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SchemaConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SchemaConfigError::Parse(_)));
    }
}
