//! ApiController - runner の上に載る型付きの API 表層
//!
//! # 学習ポイント
//! - タスク生成（URL 結合・既定ヘッダ・retry 可否・TaskId 採番）を 1 か所に集約
//! - 型付き API は `Mappable::TYPE` で ResponseType を決め、
//!   最後に `construct_object` / `construct_list` で具体的な型にする
//!   （合わない属性はデフォルト、合わない要素は落とす）

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::config::ClientConfig;
use super::runner::TaskRunner;
use crate::domain::{ApiError, HttpMethod, Request, ResponseType, RetriableTask, TaskOutcome};
use crate::mapping::typed::{construct_list, construct_object};
use crate::mapping::{Mappable, ObjectMapper};
use crate::ports::IdGenerator;

/// Build one with [`ControllerBuilder`](super::ControllerBuilder).
#[derive(Clone)]
pub struct ApiController {
    config: ClientConfig,
    runner: Arc<TaskRunner>,
    ids: Arc<dyn IdGenerator>,
}

impl ApiController {
    pub(crate) fn new(config: ClientConfig, runner: TaskRunner, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            config,
            runner: Arc::new(runner),
            ids,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn mapper(&self) -> &ObjectMapper {
        self.runner.mapper()
    }

    /// New task for `path` with the configured base URL, default headers and
    /// retry setting.
    pub fn task(&self, method: HttpMethod, path: &str, response_type: ResponseType) -> RetriableTask {
        let mut request = Request::new(method, self.config.url_for(path));
        for (name, value) in &self.config.default_headers {
            request.set_header(name.clone(), value.clone());
        }
        RetriableTask::new(self.ids.generate_task_id(), request, response_type)
            .retriable(self.config.retry_on_failure)
    }

    pub async fn perform(&self, task: &mut RetriableTask) -> TaskOutcome {
        self.runner.perform(task).await
    }

    pub async fn get_object<T: Mappable>(&self, path: &str) -> Result<T, ApiError> {
        let mut task = self.task(HttpMethod::Get, path, ResponseType::object(T::TYPE));
        Ok(construct_object::<T>(self.run_mapped(&mut task).await?)?)
    }

    pub async fn get_objects<T: Mappable>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let mut task = self.task(HttpMethod::Get, path, ResponseType::array_of(T::TYPE));
        Ok(construct_list::<T>(self.run_mapped(&mut task).await?)?)
    }

    /// Send `body` as JSON and map the response into `T`.
    pub async fn send_object<T: Mappable, B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut task = self.task(method, path, ResponseType::object(T::TYPE));
        attach_json(&mut task, body)?;
        Ok(construct_object::<T>(self.run_mapped(&mut task).await?)?)
    }

    /// POST `body` and return the decoded payload without mapping.
    pub async fn post_data<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let mut task = self.task(HttpMethod::Post, path, ResponseType::Raw);
        attach_json(&mut task, body)?;
        Ok(self.perform(&mut task).await.into_result()?.raw)
    }

    async fn run_mapped(&self, task: &mut RetriableTask) -> Result<Value, ApiError> {
        Ok(self.perform(task).await.into_result()?.mapped)
    }
}

fn attach_json<B: Serialize + ?Sized>(task: &mut RetriableTask, body: &B) -> Result<(), ApiError> {
    let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Decode(format!("request body: {e}")))?;
    let request = task.request_mut();
    request.set_header("Content-Type", "application/json");
    request.body = Some(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ControllerBuilder;
    use crate::domain::TransportFailure;
    use crate::impls::ScriptedTransport;
    use crate::mapping::fixtures::{Repository, github_registry};
    use serde_json::json;

    fn controller(transport: Arc<ScriptedTransport>) -> ApiController {
        ControllerBuilder::new()
            .config(ClientConfig::new("https://api.github.test/").with_header("Accept", "application/json"))
            .schema(github_registry())
            .transport(transport)
            .build()
            .unwrap()
    }

    #[test]
    fn task_applies_config() {
        let c = controller(Arc::new(ScriptedTransport::new()));
        let t = c.task(HttpMethod::Get, "/users/octocat/repos", ResponseType::array_of("Repository"));

        assert_eq!(t.request().url, "https://api.github.test/users/octocat/repos");
        assert_eq!(t.request().header("accept"), Some("application/json"));
        assert!(t.retry().can_retry());
        assert!(t.id().to_string().starts_with("task-"));
    }

    #[test]
    fn each_task_gets_a_fresh_id() {
        let c = controller(Arc::new(ScriptedTransport::new()));
        let a = c.task(HttpMethod::Get, "a", ResponseType::Raw);
        let b = c.task(HttpMethod::Get, "a", ResponseType::Raw);
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn get_object_maps_into_type() {
        let transport = Arc::new(ScriptedTransport::new().reply_ok(json!({
            "id": 7,
            "full_name": "octocat/linguist",
            "owner": { "login": "octocat", "site_admin": 0 },
        })));
        let c = controller(transport);

        let repo: Repository = c.get_object("repos/octocat/linguist").await.unwrap();
        assert_eq!(repo.id, 7);
        assert_eq!(repo.name, "octocat/linguist");
        assert!(!repo.owner.admin);
    }

    #[tokio::test]
    async fn get_objects_maps_sequence() {
        let transport = Arc::new(ScriptedTransport::new().reply_ok(json!([
            { "id": 1, "full_name": "a" },
            { "id": 2, "full_name": "b" },
        ])));
        let c = controller(transport);

        let repos: Vec<Repository> = c.get_objects("users/octocat/repos").await.unwrap();
        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn get_objects_drops_elements_that_do_not_fit() {
        let transport = Arc::new(ScriptedTransport::new().reply_ok(json!([
            { "id": 1, "full_name": "a" },
            { "id": -5, "full_name": "negative" },
            { "id": 2, "full_name": "b" },
        ])));
        let c = controller(transport);

        let repos: Vec<Repository> = c.get_objects("users/octocat/repos").await.unwrap();
        let ids: Vec<_> = repos.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn get_object_keeps_attributes_that_fit() {
        let transport = Arc::new(ScriptedTransport::new().reply_ok(json!({ "id": -1, "full_name": "a/b" })));
        let c = controller(transport);

        let repo: Repository = c.get_object("repos/a/b").await.unwrap();
        assert_eq!(repo.id, 0);
        assert_eq!(repo.name, "a/b");
    }

    #[tokio::test]
    async fn send_object_attaches_json_body() {
        let transport = Arc::new(ScriptedTransport::new().reply_ok(json!({ "id": 9, "full_name": "octocat/new" })));
        let c = controller(Arc::clone(&transport));

        let repo: Repository = c
            .send_object(HttpMethod::Post, "user/repos", &json!({ "name": "new" }))
            .await
            .unwrap();
        assert_eq!(repo.id, 9);

        let issued = transport.issued().await;
        assert_eq!(issued[0].method, HttpMethod::Post);
        assert_eq!(issued[0].header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_slice(issued[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "name": "new" }));
    }

    #[tokio::test]
    async fn post_data_returns_raw_payload() {
        let transport = Arc::new(ScriptedTransport::new().reply_ok(json!({ "ok": true, "extra": [1] })));
        let c = controller(transport);

        let raw = c.post_data("markdown", &json!({ "text": "# hi" })).await.unwrap();
        assert_eq!(raw, json!({ "ok": true, "extra": [1] }));
    }

    #[tokio::test]
    async fn failures_surface_as_errors() {
        let transport = Arc::new(ScriptedTransport::new().reply_err(TransportFailure::status(404, "Not Found")));
        let c = controller(transport);

        let err = c.get_object::<Repository>("repos/missing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
