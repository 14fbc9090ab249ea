//! ObjectMapper - decoded payload -> mapped object, driven by the schema registry.
//!
//! Works on `serde_json::Value` end to end: the result of mapping a type is
//! the object value with every successfully mapped attribute stored at its
//! target path. Typed construction happens once, on top (see `typed`).
//!
//! Mapping is best-effort. A field that cannot be converted is skipped, an
//! element that cannot be mapped is dropped; only schema configuration
//! defects abort. An object counts as unmappable when it is not an object,
//! its class transform rejects it, or every field it carries fails.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::MapError;
use crate::domain::ResponseType;
use crate::schema::rule::{FieldKind, FieldRule, FieldTable, ScalarType, value_kind};
use crate::schema::{Schema, SchemaRegistry};

#[derive(Debug, Clone)]
pub struct ObjectMapper {
    registry: Arc<SchemaRegistry>,
}

impl ObjectMapper {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Map one object of `type_name`.
    ///
    /// Errors: configuration defects, or `raw` itself not being mappable as
    /// `type_name` (not an object, class transform rejected it). Field-level
    /// problems never produce an error.
    pub fn map_value(&self, type_name: &str, raw: &Value) -> Result<Value, MapError> {
        let schema = self.registry.resolve(type_name)?;

        let Value::Object(object) = raw else {
            return Err(MapError::NotAnObject {
                type_name: type_name.to_string(),
                found: value_kind(raw),
            });
        };

        match schema {
            // the transform's result is used as-is
            Schema::Transform(transform) => transform(object).map_err(|source| MapError::Transform {
                type_name: type_name.to_string(),
                source,
            }),
            Schema::Fields(table) => self.map_fields(type_name, table, object),
        }
    }

    /// Map a response payload the way `response_type` asks.
    ///
    /// Data defects at the top level degrade to an empty object / empty
    /// sequence; configuration defects are returned.
    pub fn map_response(&self, response_type: &ResponseType, raw: &Value) -> Result<Value, MapError> {
        match response_type {
            ResponseType::Raw => Ok(raw.clone()),
            ResponseType::Object(type_name) => match self.map_value(type_name, raw) {
                Ok(mapped) => Ok(mapped),
                Err(err) if err.is_config_defect() => Err(err),
                Err(err) => {
                    warn!(type_name = %type_name, error = %err, "response not mappable, using defaults");
                    Ok(Value::Object(Map::new()))
                }
            },
            ResponseType::ArrayOf(type_name) => {
                self.registry.resolve(type_name)?;
                match raw.as_array() {
                    Some(items) => self.map_elements(type_name, items).map(Value::Array),
                    None => {
                        warn!(type_name = %type_name, found = value_kind(raw), "expected a sequence, using empty");
                        Ok(Value::Array(Vec::new()))
                    }
                }
            }
        }
    }

    fn map_fields(
        &self,
        type_name: &str,
        table: &FieldTable,
        object: &Map<String, Value>,
    ) -> Result<Value, MapError> {
        let mut out = Map::new();
        let (mut present, mut failed) = (0, 0);
        for (wire_key, rule) in table.iter() {
            // absent and null both leave the attribute at its default
            let Some(value) = object.get(wire_key).filter(|v| !v.is_null()) else {
                continue;
            };
            present += 1;
            match self.map_field(type_name, wire_key, rule, value)? {
                Some(mapped) => rule.target.assign(&mut out, mapped),
                None => failed += 1,
            }
        }
        // partial objects are fine; an object with nothing usable is malformed
        if present > 0 && failed == present {
            return Err(MapError::Rejected {
                type_name: type_name.to_string(),
                failed,
            });
        }
        Ok(Value::Object(out))
    }

    /// `Ok(None)` means the field is skipped.
    fn map_field(
        &self,
        type_name: &str,
        wire_key: &str,
        rule: &FieldRule,
        value: &Value,
    ) -> Result<Option<Value>, MapError> {
        match &rule.kind {
            FieldKind::Scalar { ty, transformer } => {
                self.map_scalar(type_name, wire_key, *ty, transformer.as_deref(), value)
            }
            FieldKind::Nested(element_type) => match self.map_value(element_type, value) {
                Ok(mapped) => Ok(Some(mapped)),
                Err(err) if err.is_config_defect() => Err(err),
                Err(err) => {
                    warn!(type_name, wire_key, error = %err, "skipping nested object");
                    Ok(None)
                }
            },
            FieldKind::ArrayOf(element_type) => {
                self.registry.resolve(element_type)?;
                let Some(items) = value.as_array() else {
                    debug!(type_name, wire_key, found = value_kind(value), "expected a sequence, skipping");
                    return Ok(None);
                };
                self.map_elements(element_type, items).map(|v| Some(Value::Array(v)))
            }
            FieldKind::DictionaryOf(element_type) => {
                self.registry.resolve(element_type)?;
                let Some(entries) = value.as_object() else {
                    debug!(type_name, wire_key, found = value_kind(value), "expected a mapping, skipping");
                    return Ok(None);
                };
                self.map_entries(element_type, entries).map(|m| Some(Value::Object(m)))
            }
        }
    }

    fn map_scalar(
        &self,
        type_name: &str,
        wire_key: &str,
        ty: ScalarType,
        transformer: Option<&str>,
        value: &Value,
    ) -> Result<Option<Value>, MapError> {
        let converted = match transformer {
            Some(name) => {
                let transform = self.registry.value_transformer(name)?;
                match transform(value) {
                    Ok(converted) => converted,
                    Err(err) => {
                        warn!(type_name, wire_key, transformer = name, error = %err, "transform failed, field left unset");
                        return Ok(None);
                    }
                }
            }
            None => value.clone(),
        };

        if let Err(err) = ty.check(&converted) {
            warn!(type_name, wire_key, error = %err, "type mismatch, field left unset");
            return Ok(None);
        }
        Ok(Some(converted))
    }

    /// Map every element, dropping the ones that fail. Order is preserved.
    fn map_elements(&self, element_type: &str, items: &[Value]) -> Result<Vec<Value>, MapError> {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.map_value(element_type, item) {
                Ok(mapped) => out.push(mapped),
                Err(err) if err.is_config_defect() => return Err(err),
                Err(err) => warn!(element_type, index, error = %err, "dropping element"),
            }
        }
        Ok(out)
    }

    /// Map every value, keeping keys; failing entries are dropped.
    fn map_entries(
        &self,
        element_type: &str,
        entries: &Map<String, Value>,
    ) -> Result<Map<String, Value>, MapError> {
        let mut out = Map::new();
        for (key, item) in entries {
            match self.map_value(element_type, item) {
                Ok(mapped) => {
                    out.insert(key.clone(), mapped);
                }
                Err(err) if err.is_config_defect() => return Err(err),
                Err(err) => warn!(element_type, key = %key, error = %err, "dropping entry"),
            }
        }
        Ok(out)
    }
}
