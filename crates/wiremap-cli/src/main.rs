use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wiremap_core::app::{ClientConfig, ControllerBuilder};
use wiremap_core::domain::{ApiError, RawResponse, RetriableTask, TransportFailure};
use wiremap_core::impls::{ScriptedTransport, TokenRefreshDelegate, TokenRefresher};
use wiremap_core::mapping::Mappable;
use wiremap_core::ports::{RecoveryTask, TaskRunnerDelegate};

const CONFIG: &str = r#"{
    "base_url": "https://api.github.com",
    "default_headers": {
        "Accept": "application/vnd.github+json",
        "Authorization": "Bearer expired-token"
    }
}"#;

const SCHEMA: &str = r#"{
    "Repository": {
        "full_name":  { "key": "name", "type": "String" },
        "stargazers_count": { "key": "stars", "type": "Integer" },
        "created_at": { "key": "created_at", "type": "String", "transformer": "iso8601_date" },
        "owner":      { "key": "owner", "kindOf": "User" },
        "topics":     { "key": "topics", "arrayOf": "Topic" }
    },
    "User": {
        "login":      { "key": "login", "type": "String" },
        "site_admin": { "key": "admin", "type": "Bool" }
    },
    "Topic": "topic_from_name"
}"#;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Repository {
    name: String,
    stars: u64,
    created_at: Option<DateTime<Utc>>,
    owner: User,
    topics: Vec<Topic>,
}

impl Mappable for Repository {
    const TYPE: &'static str = "Repository";
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct User {
    login: String,
    admin: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Topic {
    name: String,
}

/// refresher：本番では refresh token で token endpoint を叩く
struct DemoRefresher {
    issued: AtomicU32,
}

#[async_trait]
impl TokenRefresher for DemoRefresher {
    async fn refresh(&self) -> Result<String, ApiError> {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("fresh-token-{n}"))
    }
}

/// GitHub のエラー本文 `{"message": ...}` を ApiError にし、
/// recovery は TokenRefreshDelegate に任せる
struct GithubDelegate {
    refresh: TokenRefreshDelegate,
}

impl TaskRunnerDelegate for GithubDelegate {
    fn custom_error(&self, response: &RawResponse, _error: &ApiError) -> Option<ApiError> {
        let message = response.body.as_ref()?.get("message")?.as_str()?;
        Some(ApiError::custom(response.status, None, message))
    }

    fn recovery_task(&self, task: &RetriableTask, error: &ApiError) -> Option<Box<dyn RecoveryTask>> {
        self.refresh.recovery_task(task, error)
    }
}

fn scripted_github() -> ScriptedTransport {
    ScriptedTransport::new()
        .reply_err(TransportFailure::new(
            ApiError::transport(Some(401), "401 Unauthorized"),
            RawResponse::with_status(401).with_body(json!({ "message": "Bad credentials" })),
        ))
        .reply_ok(json!([
            {
                "full_name": "octocat/Hello-World",
                "stargazers_count": 2600,
                "created_at": "2011-01-26T19:01:12+00:00",
                "owner": { "login": "octocat", "site_admin": false },
                "topics": [{ "name": "Demo" }, { "name": "Hello" }]
            },
            {
                "full_name": "octocat/linguist",
                "stargazers_count": "not a number",
                "owner": { "login": "octocat", "site_admin": false },
                "topics": ["stray string"]
            },
            "garbage element"
        ]))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug で runner / mapper の詳細が見える
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // (A) 設定とスキーマ
    let config = ClientConfig::from_json_str(CONFIG)?;
    let mut builder = ControllerBuilder::new().config(config).load_schema(SCHEMA)?;
    builder.registry_mut().register_class_transform("topic_from_name", |raw| {
        // object でない要素は transform に届く前に落とされる
        let name = raw.get("name").and_then(|v| v.as_str()).unwrap_or_default();
        Ok(json!({ "name": name.to_lowercase() }))
    });

    // (B) transport と delegate を組み立てて起動時検証
    let transport = Arc::new(scripted_github());
    let delegate = GithubDelegate {
        refresh: TokenRefreshDelegate::new(Arc::new(DemoRefresher {
            issued: AtomicU32::new(0),
        })),
    };
    let api = builder
        .transport(transport.clone())
        .delegate(Arc::new(delegate))
        .expect::<Repository>()
        .expect_types(&["User", "Topic"])
        .build()?;

    // (C) 1 回目は 401 → token 更新 → 2 回目で成功
    let repos: Vec<Repository> = api.get_objects("users/octocat/repos").await?;

    for request in transport.issued().await {
        info!(
            url = %request.url,
            authorization = request.header("Authorization").unwrap_or("-"),
            "issued"
        );
    }
    for repo in &repos {
        println!(
            "{:<24} stars={:<6} owner={}{} created={} topics={}",
            repo.name,
            repo.stars,
            repo.owner.login,
            if repo.owner.admin { " (admin)" } else { "" },
            repo.created_at.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".into()),
            repo.topics.len(),
        );
    }
    for topic in repos.iter().flat_map(|r| &r.topics) {
        println!("topic: {}", topic.name);
    }

    Ok(())
}
