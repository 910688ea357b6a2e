//! The remote task store, as seen by the coordinator.

pub mod http;

use async_trait::async_trait;
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

use crate::error::StoreError;

pub use self::http::{
  HttpStoreConfig,
  HttpTaskStore
};

/// REST-like task service. Timeouts and retries below the call boundary
/// belong to the implementation; the coordinator treats every error the
/// same way.
#[async_trait]
pub trait TaskStore: Send + Sync {
  async fn list_tasks_by_status(
    &self,
    status: TaskStatus,
    query: &PageQuery
  ) -> Result<TaskPage, StoreError>;

  /// Same shape as [`TaskStore::list_tasks_by_status`], pre-filtered to
  /// overdue tasks.
  async fn list_overdue_tasks_by_status(
    &self,
    status: TaskStatus,
    query: &PageQuery
  ) -> Result<TaskPage, StoreError>;

  async fn create_task(
    &self,
    payload: &TaskCreate
  ) -> Result<Task, StoreError>;

  async fn update_task(
    &self,
    id: &TaskId,
    patch: &TaskPatch
  ) -> Result<Task, StoreError>;

  async fn update_task_status(
    &self,
    id: &TaskId,
    status: TaskStatus
  ) -> Result<Task, StoreError>;

  async fn delete_task(
    &self,
    id: &TaskId
  ) -> Result<(), StoreError>;

  async fn task_statistics(
    &self
  ) -> Result<TaskStatistics, StoreError>;
}
