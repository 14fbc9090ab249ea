//! FieldRule - wire-key から object attribute への移し方
//!
//! # 学習ポイント
//! - enum で「scalar / nested / array / dictionary」の 4 種を閉じた集合として表現
//! - KeyPath（`owner.login`）は Vec<String> に分解して保持し、代入時に
//!   中間 object を作りながら辿る

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::domain::TransformError;

/// Declared attribute type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Integer,
    Float,
    Bool,
    /// No type check.
    Any,
}

impl ScalarType {
    /// Parse the name used in schema configuration files.
    ///
    /// Foundation class names from older configuration files are accepted
    /// too. `NSNumber` boxes booleans as well as numbers, so it is unchecked.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" | "string" | "NSString" => Some(ScalarType::String),
            "Integer" | "integer" | "int" => Some(ScalarType::Integer),
            "Float" | "float" | "number" => Some(ScalarType::Float),
            "Bool" | "bool" | "boolean" => Some(ScalarType::Bool),
            "Any" | "any" | "NSNumber" | "NSDate" | "NSArray" | "NSDictionary" | "id" => {
                Some(ScalarType::Any)
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Integer => "Integer",
            ScalarType::Float => "Float",
            ScalarType::Bool => "Bool",
            ScalarType::Any => "Any",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ScalarType::String => value.is_string(),
            ScalarType::Integer => value.is_i64() || value.is_u64(),
            // integers are valid floats
            ScalarType::Float => value.is_number(),
            ScalarType::Bool => value.is_boolean(),
            ScalarType::Any => true,
        }
    }

    pub fn check(&self, value: &Value) -> Result<(), TransformError> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(TransformError::TypeMismatch {
                expected: self.name(),
                found: value_kind(value),
            })
        }
    }
}

/// Short name of a JSON value's kind, for messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Dot-separated key path into the mapped object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetPath {
    segments: Vec<String>,
}

impl TargetPath {
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Store `value` at this path, creating (or replacing non-object)
    /// intermediate values. An empty path stores nothing.
    pub fn assign(&self, target: &mut Map<String, Value>, value: Value) {
        let Some((last, parents)) = self.segments.split_last() else {
            return;
        };
        let mut current = target;
        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(map) = slot else {
                return;
            };
            current = map;
        }
        current.insert(last.clone(), value);
    }
}

impl From<&str> for TargetPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// How one wire value becomes one attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar {
        ty: ScalarType,
        transformer: Option<String>,
    },
    Nested(String),
    ArrayOf(String),
    DictionaryOf(String),
}

impl FieldKind {
    /// Element / sub-object type this rule refers to, if any.
    pub fn referenced_type(&self) -> Option<&str> {
        match self {
            FieldKind::Scalar { .. } => None,
            FieldKind::Nested(t) | FieldKind::ArrayOf(t) | FieldKind::DictionaryOf(t) => Some(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub target: TargetPath,
    pub kind: FieldKind,
}

impl FieldRule {
    pub fn new(target: impl Into<TargetPath>, kind: FieldKind) -> Self {
        Self {
            target: target.into(),
            kind,
        }
    }
}

/// Field table of one object type: wire-key -> rule.
///
/// # 使用例
/// ```ignore
/// let table = FieldTable::new()
///     .scalar("full_name", "name", ScalarType::String)
///     .transformed("created_at", "created_at", ScalarType::String, "iso8601_date")
///     .nested("owner", "owner", "User")
///     .array_of("topics", "topics", "Topic");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTable {
    rules: BTreeMap<String, FieldRule>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for `wire_key`.
    pub fn rule(mut self, wire_key: impl Into<String>, rule: FieldRule) -> Self {
        self.rules.insert(wire_key.into(), rule);
        self
    }

    pub fn scalar(self, wire_key: impl Into<String>, target: &str, ty: ScalarType) -> Self {
        self.rule(
            wire_key,
            FieldRule::new(target, FieldKind::Scalar { ty, transformer: None }),
        )
    }

    pub fn transformed(
        self,
        wire_key: impl Into<String>,
        target: &str,
        ty: ScalarType,
        transformer: impl Into<String>,
    ) -> Self {
        self.rule(
            wire_key,
            FieldRule::new(
                target,
                FieldKind::Scalar {
                    ty,
                    transformer: Some(transformer.into()),
                },
            ),
        )
    }

    pub fn nested(self, wire_key: impl Into<String>, target: &str, type_name: impl Into<String>) -> Self {
        self.rule(wire_key, FieldRule::new(target, FieldKind::Nested(type_name.into())))
    }

    pub fn array_of(self, wire_key: impl Into<String>, target: &str, type_name: impl Into<String>) -> Self {
        self.rule(wire_key, FieldRule::new(target, FieldKind::ArrayOf(type_name.into())))
    }

    pub fn dictionary_of(
        self,
        wire_key: impl Into<String>,
        target: &str,
        type_name: impl Into<String>,
    ) -> Self {
        self.rule(
            wire_key,
            FieldRule::new(target, FieldKind::DictionaryOf(type_name.into())),
        )
    }

    pub fn get(&self, wire_key: &str) -> Option<&FieldRule> {
        self.rules.get(wire_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldRule)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::string(ScalarType::String, json!("x"), true)]
    #[case::string_rejects_number(ScalarType::String, json!(1), false)]
    #[case::integer(ScalarType::Integer, json!(42), true)]
    #[case::integer_rejects_float(ScalarType::Integer, json!(4.2), false)]
    #[case::float_accepts_integer(ScalarType::Float, json!(42), true)]
    #[case::float(ScalarType::Float, json!(4.2), true)]
    #[case::bool(ScalarType::Bool, json!(true), true)]
    #[case::bool_rejects_string(ScalarType::Bool, json!("true"), false)]
    #[case::any(ScalarType::Any, json!([1, 2]), true)]
    fn scalar_type_acceptance(#[case] ty: ScalarType, #[case] value: Value, #[case] ok: bool) {
        assert_eq!(ty.accepts(&value), ok);
    }

    #[rstest]
    #[case::ns_string("NSString", Some(ScalarType::String))]
    #[case::ns_number("NSNumber", Some(ScalarType::Any))]
    #[case::ns_date("NSDate", Some(ScalarType::Any))]
    #[case::native("Integer", Some(ScalarType::Integer))]
    #[case::unknown("NSData", None)]
    fn scalar_type_names(#[case] name: &str, #[case] expected: Option<ScalarType>) {
        assert_eq!(ScalarType::from_name(name), expected);
    }

    #[test]
    fn type_mismatch_names_both_sides() {
        let err = ScalarType::Integer.check(&json!("7")).unwrap_err();
        assert_eq!(
            err,
            TransformError::TypeMismatch {
                expected: "Integer",
                found: "string"
            }
        );
    }

    #[test]
    fn assign_creates_intermediate_objects() {
        let mut out = Map::new();
        TargetPath::parse("owner.login").assign(&mut out, json!("octocat"));
        TargetPath::parse("owner.id").assign(&mut out, json!(1));
        TargetPath::parse("name").assign(&mut out, json!("hello"));
        assert_eq!(
            Value::Object(out),
            json!({ "owner": { "login": "octocat", "id": 1 }, "name": "hello" })
        );
    }

    #[test]
    fn assign_replaces_non_object_parent() {
        let mut out = Map::new();
        out.insert("owner".into(), json!("flat"));
        TargetPath::parse("owner.login").assign(&mut out, json!("octocat"));
        assert_eq!(out["owner"], json!({ "login": "octocat" }));
    }

    #[test]
    fn empty_path_assigns_nothing() {
        let mut out = Map::new();
        let path = TargetPath::parse("..");
        assert!(path.is_empty());
        path.assign(&mut out, json!(1));
        assert!(out.is_empty());
    }

    #[test]
    fn table_builder_records_kinds() {
        let table = FieldTable::new()
            .scalar("id", "id", ScalarType::Integer)
            .nested("owner", "owner", "User")
            .array_of("topics", "topics", "Topic")
            .dictionary_of("languages", "languages", "Language");

        assert_eq!(table.len(), 4);
        assert_eq!(table.get("owner").unwrap().kind.referenced_type(), Some("User"));
        assert_eq!(table.get("id").unwrap().kind.referenced_type(), None);
        assert_eq!(table.get("topics").unwrap().target.to_string(), "topics");
    }
}
