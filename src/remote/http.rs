//! REST adapter for the remote store.
//!
//! Maps each [`RemoteStore`] operation onto the project-management API:
//! `/projects`, `/tasks`, `/tasks/{id}/comments`, `/comments/{id}` and
//! `/users`. A bearer token, when configured, is attached to every request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{ApiError, RemoteError, RemoteResult, RemoteStore};
use crate::models::{
    Comment, CommentDraft, CommentId, Page, Project, ProjectDraft, ProjectId, ProjectQuery, Task,
    TaskDraft, TaskId, TaskPatch, User,
};

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("kanban-sync/", env!("CARGO_PKG_VERSION"));

/// Remote store backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base: String,
    token: Option<String>,
}

impl HttpRemoteStore {
    /// Create a store rooted at `base` (e.g. `http://localhost:8080/api`).
    pub fn new(base: impl Into<String>, token: Option<String>, timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| crate::Error::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_status(status, &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn discard(&self, request: RequestBuilder) -> RemoteResult<()> {
        self.send(request).await.map(|_| ())
    }
}

/// Translate a non-success response into a [`RemoteError`].
///
/// The API answers errors as `{"code": "...", "message": "..."}`; anything else
/// is reported verbatim.
fn error_from_status(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ApiError>(body)
        .ok()
        .filter(|e| !e.message.is_empty())
        .map(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string());
    if status == StatusCode::NOT_FOUND {
        RemoteError::NotFound(message)
    } else {
        RemoteError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

/// Query string for the project list endpoint.
fn project_query_params(query: &ProjectQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        params.push(("q", q.to_string()));
    }
    if let Some(status) = query.status {
        params.push(("status", status.as_str().to_string()));
    }
    params.push(("page", query.page.to_string()));
    params.push(("pageSize", query.page_size.to_string()));
    params
}

#[async_trait(?Send)]
impl RemoteStore for HttpRemoteStore {
    async fn list_projects(&self, query: &ProjectQuery) -> RemoteResult<Page<Project>> {
        let request = self
            .client
            .get(self.url("projects"))
            .query(&project_query_params(query));
        self.fetch(request).await
    }

    async fn get_project(&self, id: ProjectId) -> RemoteResult<Project> {
        self.fetch(self.client.get(self.url(&format!("projects/{}", id))))
            .await
    }

    async fn create_project(&self, draft: &ProjectDraft) -> RemoteResult<Project> {
        self.fetch(self.client.post(self.url("projects")).json(draft))
            .await
    }

    async fn delete_project(&self, id: ProjectId) -> RemoteResult<()> {
        self.discard(self.client.delete(self.url(&format!("projects/{}", id))))
            .await
    }

    async fn list_tasks(&self, project_id: ProjectId) -> RemoteResult<Vec<Task>> {
        let request = self
            .client
            .get(self.url("tasks"))
            .query(&[("projectId", project_id.to_string())]);
        let page: Page<Task> = self.fetch(request).await?;
        Ok(page.items)
    }

    async fn create_task(&self, draft: &TaskDraft) -> RemoteResult<Task> {
        self.fetch(self.client.post(self.url("tasks")).json(draft))
            .await
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RemoteResult<Task> {
        self.fetch(self.client.put(self.url(&format!("tasks/{}", id))).json(patch))
            .await
    }

    async fn delete_task(&self, id: TaskId) -> RemoteResult<()> {
        self.discard(self.client.delete(self.url(&format!("tasks/{}", id))))
            .await
    }

    async fn list_comments(&self, task_id: TaskId) -> RemoteResult<Vec<Comment>> {
        let page: Page<Comment> = self
            .fetch(
                self.client
                    .get(self.url(&format!("tasks/{}/comments", task_id))),
            )
            .await?;
        Ok(page.items)
    }

    async fn create_comment(
        &self,
        task_id: TaskId,
        draft: &CommentDraft,
    ) -> RemoteResult<Comment> {
        self.fetch(
            self.client
                .post(self.url(&format!("tasks/{}/comments", task_id)))
                .json(draft),
        )
        .await
    }

    async fn delete_comment(&self, id: CommentId) -> RemoteResult<()> {
        self.discard(self.client.delete(self.url(&format!("comments/{}", id))))
            .await
    }

    async fn list_users(&self) -> RemoteResult<Vec<User>> {
        let page: Page<User> = self.fetch(self.client.get(self.url("users"))).await?;
        Ok(page.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectStatus;

    fn store() -> HttpRemoteStore {
        HttpRemoteStore::new("http://localhost:8080/api/", None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        let store = store();
        assert_eq!(store.base(), "http://localhost:8080/api");
        assert_eq!(store.url("/tasks/4"), "http://localhost:8080/api/tasks/4");
        assert_eq!(store.url("users"), "http://localhost:8080/api/users");
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let store =
            HttpRemoteStore::new("http://x", Some(String::new()), Duration::from_secs(1)).unwrap();
        assert!(store.token.is_none());
    }

    #[test]
    fn test_project_query_params() {
        let params = project_query_params(&ProjectQuery {
            q: Some("alpha".to_string()),
            status: Some(ProjectStatus::Archived),
            page: 2,
            page_size: 50,
        });
        assert_eq!(
            params,
            vec![
                ("q", "alpha".to_string()),
                ("status", "archived".to_string()),
                ("page", "2".to_string()),
                ("pageSize", "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_project_query_params_skip_empty_filters() {
        let params = project_query_params(&ProjectQuery {
            q: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(
            params,
            vec![("page", "1".to_string()), ("pageSize", "20".to_string())]
        );
    }

    #[test]
    fn test_error_from_api_body() {
        let err = error_from_status(
            StatusCode::BAD_REQUEST,
            r#"{"code":"BAD_REQUEST","message":"title is required"}"#,
        );
        assert_eq!(
            err,
            RemoteError::Http {
                status: 400,
                message: "title is required".to_string()
            }
        );
    }

    #[test]
    fn test_error_not_found() {
        let err = error_from_status(
            StatusCode::NOT_FOUND,
            r#"{"code":"NOT_FOUND","message":"task not found"}"#,
        );
        assert_eq!(err, RemoteError::NotFound("task not found".to_string()));
    }

    #[test]
    fn test_error_plain_body() {
        let err = error_from_status(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(
            err,
            RemoteError::Http {
                status: 502,
                message: "upstream down".to_string()
            }
        );
    }
}
