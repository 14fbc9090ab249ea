//! GitHub-like schema shared by the mapping and runner tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::typed::Mappable;
use crate::schema::transformers::{INTEGER_TO_BOOL, ISO8601_DATE};
use crate::schema::{FieldTable, ScalarType, SchemaRegistry};

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct User {
    pub login: String,
    pub id: u64,
    pub admin: bool,
}

impl Mappable for User {
    const TYPE: &'static str = "User";
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Topic {
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Language {
    pub bytes: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub private: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub owner: User,
    pub topics: Vec<Topic>,
    pub languages: BTreeMap<String, Language>,
}

impl Mappable for Repository {
    const TYPE: &'static str = "Repository";
}

pub fn github_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::with_builtins();
    registry
        .register_fields(
            "Repository",
            FieldTable::new()
                .scalar("id", "id", ScalarType::Integer)
                .scalar("full_name", "name", ScalarType::String)
                .scalar("private", "private", ScalarType::Bool)
                .transformed("created_at", "created_at", ScalarType::String, ISO8601_DATE)
                .nested("owner", "owner", "User")
                .array_of("topics", "topics", "Topic")
                .dictionary_of("languages", "languages", "Language"),
        )
        .expect("fixture schema");
    registry
        .register_fields(
            "User",
            FieldTable::new()
                .scalar("login", "login", ScalarType::String)
                .scalar("id", "id", ScalarType::Integer)
                .transformed("site_admin", "admin", ScalarType::Bool, INTEGER_TO_BOOL),
        )
        .expect("fixture schema");
    registry
        .register_fields("Topic", FieldTable::new().scalar("name", "name", ScalarType::String))
        .expect("fixture schema");
    registry
        .register_fields("Language", FieldTable::new().scalar("bytes", "bytes", ScalarType::Integer))
        .expect("fixture schema");
    registry
}
