//! Scripted in-memory task store for coordinator tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{
  DateTime,
  NaiveDate,
  TimeZone,
  Utc
};
use parking_lot::Mutex;
use taskboard_core::coordinator::{
  SyncSettings,
  TaskSyncCoordinator
};
use taskboard_core::{
  Board,
  StoreError,
  TaskStore
};
use taskboard_shared::{
  PageQuery,
  Pagination,
  StatusSummary,
  Task,
  TaskCreate,
  TaskId,
  TaskPage,
  TaskPatch,
  TaskPriority,
  TaskStatistics,
  TaskStatus
};
use tokio::sync::oneshot;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
)]
pub enum Op {
  List(TaskStatus),
  ListOverdue(TaskStatus),
  Create,
  Update,
  Move,
  Delete,
  Stats
}

#[derive(Default)]
struct ServerState {
  /// Server order: most recently updated first.
  tasks:   Vec<Task>,
  failing: HashSet<Op>,
  gates:   Vec<(Op, oneshot::Receiver<()>)>,
  calls:   Vec<(Op, u32)>,
  next_id: u32
}

#[derive(Default)]
pub struct FakeStore {
  state: Mutex<ServerState>
}

pub fn now() -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(2026, 10, 16, 9, 0, 0)
    .single()
    .expect("valid now")
}

pub fn days_ago(days: i64) -> NaiveDate {
  now().date_naive()
    - chrono::Duration::days(days)
}

pub fn task(
  id: &str,
  status: TaskStatus
) -> Task {
  Task {
    id: TaskId::from(id),
    title: format!("task {id}"),
    description: None,
    priority: TaskPriority::Medium,
    status,
    due_date: None,
    due_time: None,
    due_timezone: None,
    category: "general".to_string(),
    tags: vec![],
    estimated_hours: None,
    assignees: vec![],
    assigner: None,
    created_at: now(),
    updated_at: now(),
    overdue: None,
    extra: Default::default()
  }
}

pub fn settings(page_size: u32) -> SyncSettings {
  SyncSettings {
    page_size,
    reconcile_interval: Duration::from_secs(
      300
    ),
    ..SyncSettings::default()
  }
}

pub fn coordinator(
  store: &Arc<FakeStore>,
  page_size: u32
) -> TaskSyncCoordinator {
  let store: Arc<dyn TaskStore> = store.clone();
  TaskSyncCoordinator::with_clock(
    store,
    settings(page_size),
    Arc::new(now)
  )
}

pub fn ids(
  board: &Board,
  status: TaskStatus
) -> Vec<String> {
  board
    .column(status)
    .tasks
    .iter()
    .map(|t| t.id.as_str().to_string())
    .collect()
}

/// Every task sits in exactly the column named by its status.
pub fn assert_single_column(board: &Board) {
  let mut seen = HashSet::new();
  for column in board.columns() {
    for task in &column.tasks {
      assert_eq!(
        task.status, column.status,
        "task {} stored under the wrong column",
        task.id
      );
      assert!(
        seen.insert(task.id.clone()),
        "task {} appears more than once",
        task.id
      );
    }
  }
}

impl FakeStore {
  pub fn with_tasks(tasks: Vec<Task>) -> Arc<Self> {
    let store = Self::default();
    store.state.lock().tasks = tasks;
    Arc::new(store)
  }

  pub fn set_tasks(&self, tasks: Vec<Task>) {
    self.state.lock().tasks = tasks;
  }

  pub fn push_front(&self, task: Task) {
    self.state.lock().tasks.insert(0, task);
  }

  pub fn fail(&self, op: Op) {
    self.state.lock().failing.insert(op);
  }

  pub fn heal(&self, op: Op) {
    self.state.lock().failing.remove(&op);
  }

  /// Holds the next `op` call after it has built its response until the
  /// returned sender fires (or is dropped).
  pub fn gate(
    &self,
    op: Op
  ) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.state.lock().gates.push((op, rx));
    tx
  }

  pub fn pending_gates(&self) -> usize {
    self.state.lock().gates.len()
  }

  /// Yields until every gated call has reached its gate.
  pub async fn wait_for_gated_calls(&self) {
    for _ in 0..1_000 {
      if self.pending_gates() == 0 {
        return;
      }
      tokio::task::yield_now().await;
    }
    panic!("gated call never arrived");
  }

  pub fn calls(&self, op: Op) -> usize {
    self
      .state
      .lock()
      .calls
      .iter()
      .filter(|(called, _)| *called == op)
      .count()
  }

  pub fn pages_requested(
    &self,
    op: Op
  ) -> Vec<u32> {
    self
      .state
      .lock()
      .calls
      .iter()
      .filter(|(called, _)| *called == op)
      .map(|(_, page)| *page)
      .collect()
  }

  /// Records the call, then reports whether it should fail and which
  /// gate (if any) to wait on.
  fn enter(
    &self,
    op: Op,
    page: u32
  ) -> (bool, Option<oneshot::Receiver<()>>) {
    let mut state = self.state.lock();
    state.calls.push((op, page));
    let gate = state
      .gates
      .iter()
      .position(|(gated, _)| *gated == op)
      .map(|idx| state.gates.remove(idx).1);
    (state.failing.contains(&op), gate)
  }

  async fn hold(
    gate: Option<oneshot::Receiver<()>>
  ) {
    if let Some(gate) = gate {
      let _ = gate.await;
    }
  }

  fn page(
    &self,
    status: TaskStatus,
    query: &PageQuery,
    overdue_only: bool
  ) -> TaskPage {
    let state = self.state.lock();
    let today = now().date_naive();
    let matching: Vec<Task> = state
      .tasks
      .iter()
      .filter(|t| t.status == status)
      .filter(|t| {
        !overdue_only
          || t.due_date.is_some_and(|d| d < today)
      })
      .cloned()
      .collect();

    let limit = query.limit.max(1);
    let total = matching.len() as u32;
    let total_pages = total.div_ceil(limit).max(1);
    let start =
      ((query.page.max(1) - 1) * limit) as usize;
    let tasks: Vec<Task> = matching
      .into_iter()
      .skip(start)
      .take(limit as usize)
      .collect();

    TaskPage {
      tasks,
      pagination: Pagination {
        current_page:  query.page,
        total_pages,
        total_tasks:   u64::from(total),
        has_next_page: query.page < total_pages,
        has_prev_page: query.page > 1,
        limit:         0
      },
      status_metadata: Some(StatusSummary {
        total: u64::from(total),
        ..StatusSummary::default()
      }),
      overdue_metadata: None
    }
  }

  fn boom(op: Op) -> StoreError {
    StoreError::Status {
      status:  500,
      message: format!("{op:?} failed")
    }
  }
}

#[async_trait]
impl TaskStore for FakeStore {
  async fn list_tasks_by_status(
    &self,
    status: TaskStatus,
    query: &PageQuery
  ) -> Result<TaskPage, StoreError> {
    let op = Op::List(status);
    let (fail, gate) = self.enter(op, query.page);
    let page = self.page(status, query, false);
    Self::hold(gate).await;
    if fail {
      return Err(Self::boom(op));
    }
    Ok(page)
  }

  async fn list_overdue_tasks_by_status(
    &self,
    status: TaskStatus,
    query: &PageQuery
  ) -> Result<TaskPage, StoreError> {
    let op = Op::ListOverdue(status);
    let (fail, gate) = self.enter(op, query.page);
    let page = self.page(status, query, true);
    Self::hold(gate).await;
    if fail {
      return Err(Self::boom(op));
    }
    Ok(page)
  }

  async fn create_task(
    &self,
    payload: &TaskCreate
  ) -> Result<Task, StoreError> {
    let (fail, gate) = self.enter(Op::Create, 0);
    Self::hold(gate).await;
    if fail {
      return Err(Self::boom(Op::Create));
    }

    let mut state = self.state.lock();
    state.next_id += 1;
    let mut created = task(
      &format!("new-{}", state.next_id),
      payload.status.unwrap_or_default()
    );
    created.title = payload.title.clone();
    created.due_date = payload.due_date;
    created.tags = payload.tags.clone();
    state.tasks.insert(0, created.clone());
    Ok(created)
  }

  async fn update_task(
    &self,
    id: &TaskId,
    patch: &TaskPatch
  ) -> Result<Task, StoreError> {
    let (fail, gate) = self.enter(Op::Update, 0);
    Self::hold(gate).await;
    if fail {
      return Err(Self::boom(Op::Update));
    }

    let mut state = self.state.lock();
    let idx = state
      .tasks
      .iter()
      .position(|t| &t.id == id)
      .ok_or_else(|| {
        StoreError::NotFound(id.clone())
      })?;
    let mut updated = state.tasks.remove(idx);
    if let Some(title) = &patch.title {
      updated.title = title.clone();
    }
    if let Some(status) = patch.status {
      updated.status = status;
    }
    if let Some(due) = patch.due_date {
      updated.due_date = due;
    }
    if let Some(priority) = patch.priority {
      updated.priority = priority;
    }
    updated.overdue = None;
    state.tasks.insert(0, updated.clone());
    Ok(updated)
  }

  async fn update_task_status(
    &self,
    id: &TaskId,
    status: TaskStatus
  ) -> Result<Task, StoreError> {
    let (fail, gate) = self.enter(Op::Move, 0);
    Self::hold(gate).await;
    if fail {
      return Err(Self::boom(Op::Move));
    }

    let mut state = self.state.lock();
    let idx = state
      .tasks
      .iter()
      .position(|t| &t.id == id)
      .ok_or_else(|| {
        StoreError::NotFound(id.clone())
      })?;
    let mut moved = state.tasks.remove(idx);
    moved.status = status;
    state.tasks.insert(0, moved.clone());
    Ok(moved)
  }

  async fn delete_task(
    &self,
    id: &TaskId
  ) -> Result<(), StoreError> {
    let (fail, gate) = self.enter(Op::Delete, 0);
    Self::hold(gate).await;
    if fail {
      return Err(Self::boom(Op::Delete));
    }
    self.state.lock().tasks.retain(|t| &t.id != id);
    Ok(())
  }

  async fn task_statistics(
    &self
  ) -> Result<TaskStatistics, StoreError> {
    let (fail, gate) = self.enter(Op::Stats, 0);
    Self::hold(gate).await;
    if fail {
      return Err(Self::boom(Op::Stats));
    }
    let state = self.state.lock();
    let mut stats = TaskStatistics {
      total_tasks: state.tasks.len() as u64,
      ..TaskStatistics::default()
    };
    for t in &state.tasks {
      match t.status {
        | TaskStatus::Todo => {
          stats.normal_breakdown.todo += 1
        }
        | TaskStatus::InProgress => {
          stats.normal_breakdown.in_progress += 1
        }
        | TaskStatus::Done => {
          stats.normal_breakdown.done += 1
        }
      }
    }
    Ok(stats)
  }
}
