use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
  Response,
  StatusCode,
  Url
};
use serde::de::DeserializeOwned;
use serde::{
  Deserialize,
  Serialize
};
use taskboard_shared::{
  PageQuery,
  Task,
  TaskCreate,
  TaskId,
  TaskPage,
  TaskPatch,
  TaskStatistics,
  TaskStatus
};
use tracing::{
  debug,
  instrument,
  warn
};

use super::TaskStore;
use crate::config::Config;
use crate::error::StoreError;

pub const DEFAULT_API_URL: &str =
  "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
  pub base_url: String,
  pub timeout:  Duration
}

impl HttpStoreConfig {
  pub fn from_config(
    cfg: &Config
  ) -> anyhow::Result<Self> {
    let base_url = cfg
      .get("api.url")
      .unwrap_or_else(|| {
        DEFAULT_API_URL.to_string()
      });
    let timeout_secs = cfg
      .get_u64("api.timeout")?
      .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Ok(Self {
      base_url,
      timeout: Duration::from_secs(
        timeout_secs
      )
    })
  }
}

/// [`TaskStore`] over the task service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
  client:   reqwest::Client,
  base_url: Url
}

#[derive(Deserialize)]
struct TaskEnvelope {
  task: Task
}

#[derive(Serialize)]
struct StatusBody {
  status: TaskStatus
}

#[derive(Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  error:   Option<String>
}

impl HttpTaskStore {
  pub fn new(
    config: &HttpStoreConfig
  ) -> anyhow::Result<Self> {
    let base_url =
      Url::parse(config.base_url.trim())
        .with_context(|| {
          format!(
            "invalid api.url: {}",
            config.base_url
          )
        })?;
    if base_url.cannot_be_a_base() {
      anyhow::bail!(
        "api.url cannot be used as a \
         base URL: {base_url}"
      );
    }

    let client =
      reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .context(
          "failed building HTTP client \
           for the task store"
        )?;

    Ok(Self {
      client,
      base_url
    })
  }

  fn endpoint(
    &self,
    segments: &[&str]
  ) -> Result<Url, StoreError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|()| {
        StoreError::Transport(format!(
          "invalid base URL: {}",
          self.base_url
        ))
      })?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  fn list_url(
    &self,
    status: TaskStatus,
    query: &PageQuery,
    overdue: bool
  ) -> Result<Url, StoreError> {
    let mut segments =
      vec!["tasks", "status", status.as_str()];
    if overdue {
      segments.push("overdue");
    }
    let mut url = self.endpoint(&segments)?;
    url
      .query_pairs_mut()
      .append_pair(
        "page",
        &query.page.to_string()
      )
      .append_pair(
        "limit",
        &query.limit.to_string()
      )
      .append_pair("sortBy", &query.sort_by)
      .append_pair(
        "sortOrder",
        query.sort_order.as_str()
      );
    Ok(url)
  }

  async fn fetch_page(
    &self,
    url: Url
  ) -> Result<TaskPage, StoreError> {
    debug!(url = %url, "listing tasks");
    let response =
      self.client.get(url).send().await?;
    decode(response, None).await
  }
}

async fn decode<T: DeserializeOwned>(
  response: Response,
  task_id: Option<&TaskId>
) -> Result<T, StoreError> {
  let response =
    check_status(response, task_id).await?;
  let body = response.bytes().await?;
  Ok(serde_json::from_slice(&body)?)
}

async fn check_status(
  response: Response,
  task_id: Option<&TaskId>
) -> Result<Response, StoreError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  if status == StatusCode::NOT_FOUND
    && let Some(id) = task_id
  {
    return Err(StoreError::NotFound(
      id.clone()
    ));
  }

  let body =
    response.text().await.unwrap_or_default();
  let message = error_message(&body);
  warn!(
    status = status.as_u16(),
    message = %message,
    "task store rejected request"
  );
  Err(StoreError::Status {
    status: status.as_u16(),
    message
  })
}

fn error_message(body: &str) -> String {
  if let Ok(parsed) =
    serde_json::from_str::<ErrorBody>(body)
    && let Some(message) =
      parsed.message.or(parsed.error)
  {
    return message;
  }
  body
    .trim()
    .chars()
    .take(MAX_ERROR_BODY_CHARS)
    .collect()
}

#[async_trait]
impl TaskStore for HttpTaskStore {
  #[instrument(skip(self, query), fields(status = %status, page = query.page))]
  async fn list_tasks_by_status(
    &self,
    status: TaskStatus,
    query: &PageQuery
  ) -> Result<TaskPage, StoreError> {
    let url =
      self.list_url(status, query, false)?;
    self.fetch_page(url).await
  }

  #[instrument(skip(self, query), fields(status = %status, page = query.page))]
  async fn list_overdue_tasks_by_status(
    &self,
    status: TaskStatus,
    query: &PageQuery
  ) -> Result<TaskPage, StoreError> {
    let url =
      self.list_url(status, query, true)?;
    self.fetch_page(url).await
  }

  #[instrument(skip(self, payload), fields(title_len = payload.title.len()))]
  async fn create_task(
    &self,
    payload: &TaskCreate
  ) -> Result<Task, StoreError> {
    let url = self.endpoint(&["tasks"])?;
    let response = self
      .client
      .post(url)
      .json(payload)
      .send()
      .await?;
    let envelope: TaskEnvelope =
      decode(response, None).await?;
    Ok(envelope.task)
  }

  #[instrument(skip(self, patch), fields(task_id = %id))]
  async fn update_task(
    &self,
    id: &TaskId,
    patch: &TaskPatch
  ) -> Result<Task, StoreError> {
    let url = self
      .endpoint(&["tasks", id.as_str()])?;
    let response = self
      .client
      .put(url)
      .json(patch)
      .send()
      .await?;
    let envelope: TaskEnvelope =
      decode(response, Some(id)).await?;
    Ok(envelope.task)
  }

  #[instrument(skip(self), fields(task_id = %id, status = %status))]
  async fn update_task_status(
    &self,
    id: &TaskId,
    status: TaskStatus
  ) -> Result<Task, StoreError> {
    let url = self.endpoint(&[
      "tasks",
      id.as_str(),
      "status"
    ])?;
    let response = self
      .client
      .patch(url)
      .json(&StatusBody { status })
      .send()
      .await?;
    let envelope: TaskEnvelope =
      decode(response, Some(id)).await?;
    Ok(envelope.task)
  }

  #[instrument(skip(self), fields(task_id = %id))]
  async fn delete_task(
    &self,
    id: &TaskId
  ) -> Result<(), StoreError> {
    let url = self
      .endpoint(&["tasks", id.as_str()])?;
    let response =
      self.client.delete(url).send().await?;
    check_status(response, Some(id))
      .await?;
    Ok(())
  }

  #[instrument(skip(self))]
  async fn task_statistics(
    &self
  ) -> Result<TaskStatistics, StoreError> {
    let url = self.endpoint(&[
      "tasks",
      "statistics"
    ])?;
    let response =
      self.client.get(url).send().await?;
    decode(response, None).await
  }
}
