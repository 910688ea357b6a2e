//! Per-status board state.
//!
//! [`ColumnStore`] holds one [`ColumnState`] per [`TaskStatus`] plus the
//! global [`OperationState`]. Every write replaces the board inside a
//! single `watch` send, so readers only ever observe complete snapshots.
//! Writes are crate-private; the coordinator is the only writer.

use taskboard_shared::{
  OverdueSummary,
  PageQuery,
  Pagination,
  StatusSummary,
  Task,
  TaskId,
  TaskStatus
};
use tokio::sync::watch;
use tracing::{
  debug,
  warn
};

/// Sequence numbers used to order racing fetches of one column.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub(crate) struct FetchTickets {
  /// Last ticket handed out for any fetch.
  pub issued:  u64,
  /// Ticket of the newest fetch that will replace the list.
  pub replace: u64
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnState {
  pub status:          TaskStatus,
  /// Server sort order, most recently updated first.
  pub tasks:           Vec<Task>,
  pub pagination:      Pagination,
  pub loading:         bool,
  pub refreshing:      bool,
  pub error:           Option<String>,
  pub status_summary:  Option<StatusSummary>,
  pub overdue_summary:
    Option<OverdueSummary>,
  /// Query behind the current list; load-more continues it.
  pub query:           Option<PageQuery>,
  pub(crate) tickets:  FetchTickets
}

impl ColumnState {
  pub fn empty(
    status: TaskStatus,
    page_size: u32
  ) -> Self {
    Self {
      status,
      tasks: Vec::new(),
      pagination: Pagination::empty(
        page_size
      ),
      loading: false,
      refreshing: false,
      error: None,
      status_summary: None,
      overdue_summary: None,
      query: None,
      tickets: FetchTickets::default()
    }
  }

  /// State right after mount, before the first fetch lands.
  pub fn mounting(
    status: TaskStatus,
    page_size: u32
  ) -> Self {
    Self {
      loading: true,
      ..Self::empty(status, page_size)
    }
  }

  pub fn position(
    &self,
    id: &TaskId
  ) -> Option<usize> {
    self
      .tasks
      .iter()
      .position(|task| &task.id == id)
  }

  pub fn contains(
    &self,
    id: &TaskId
  ) -> bool {
    self.position(id).is_some()
  }

  pub fn is_busy(&self) -> bool {
    self.loading || self.refreshing
  }

  pub fn can_load_more(&self) -> bool {
    !self.is_busy()
      && self.pagination.has_next_page
  }

  /// Appends tasks not already present, keeping their order.
  pub(crate) fn append_unique(
    &mut self,
    incoming: Vec<Task>
  ) -> usize {
    let mut appended = 0;
    for task in incoming {
      if self.contains(&task.id) {
        debug!(
          status = %self.status,
          task_id = %task.id,
          "skipping duplicate task on append"
        );
        continue;
      }
      self.tasks.push(task);
      appended += 1;
    }
    appended
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
)]
pub enum OperationKind {
  Create,
  Update,
  Delete
}

impl OperationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      | OperationKind::Create => "create",
      | OperationKind::Update => "update",
      | OperationKind::Delete => "delete"
    }
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub struct OperationSlot {
  /// Calls of this kind still awaiting the store. Update and move share a
  /// slot, so several can overlap.
  pub in_flight: u32,
  pub error:     Option<String>
}

impl OperationSlot {
  pub fn is_busy(&self) -> bool {
    self.in_flight > 0
  }
}

/// Loading and error state for mutations, which may touch any column.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub struct OperationState {
  pub create: OperationSlot,
  pub update: OperationSlot,
  pub delete: OperationSlot
}

impl OperationState {
  pub fn slot(
    &self,
    kind: OperationKind
  ) -> &OperationSlot {
    match kind {
      | OperationKind::Create => {
        &self.create
      }
      | OperationKind::Update => {
        &self.update
      }
      | OperationKind::Delete => {
        &self.delete
      }
    }
  }

  pub(crate) fn slot_mut(
    &mut self,
    kind: OperationKind
  ) -> &mut OperationSlot {
    match kind {
      | OperationKind::Create => {
        &mut self.create
      }
      | OperationKind::Update => {
        &mut self.update
      }
      | OperationKind::Delete => {
        &mut self.delete
      }
    }
  }

  pub fn any_in_flight(&self) -> bool {
    self.create.is_busy()
      || self.update.is_busy()
      || self.delete.is_busy()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
  columns:        [ColumnState; 3],
  pub operations: OperationState
}

impl Board {
  pub fn new(page_size: u32) -> Self {
    Self {
      columns:    TaskStatus::ALL.map(
        |status| {
          ColumnState::empty(
            status, page_size
          )
        }
      ),
      operations: OperationState::default()
    }
  }

  pub fn mounting(
    page_size: u32
  ) -> Self {
    Self {
      columns:    TaskStatus::ALL.map(
        |status| {
          ColumnState::mounting(
            status, page_size
          )
        }
      ),
      operations: OperationState::default()
    }
  }

  pub fn column(
    &self,
    status: TaskStatus
  ) -> &ColumnState {
    &self.columns[status.index()]
  }

  pub(crate) fn column_mut(
    &mut self,
    status: TaskStatus
  ) -> &mut ColumnState {
    &mut self.columns[status.index()]
  }

  pub fn columns(
    &self
  ) -> impl Iterator<Item = &ColumnState>
  {
    self.columns.iter()
  }

  pub fn locate(
    &self,
    id: &TaskId
  ) -> Option<(TaskStatus, usize)> {
    self.columns.iter().find_map(|col| {
      col
        .position(id)
        .map(|idx| (col.status, idx))
    })
  }

  pub fn find(
    &self,
    id: &TaskId
  ) -> Option<&Task> {
    let (status, idx) = self.locate(id)?;
    self.column(status).tasks.get(idx)
  }

  /// No column fetch and no mutation in flight.
  pub fn is_idle(&self) -> bool {
    !self.operations.any_in_flight()
      && self
        .columns
        .iter()
        .all(|col| !col.is_busy())
  }

  /// Removes every copy of `id`, returning the first one found.
  pub(crate) fn remove_task(
    &mut self,
    id: &TaskId
  ) -> Option<Task> {
    let mut removed = None;
    for col in &mut self.columns {
      while let Some(idx) = col.position(id)
      {
        let task = col.tasks.remove(idx);
        removed.get_or_insert(task);
      }
    }
    removed
  }

  /// Places the canonical copy of a task: replaced in place when it stays
  /// in its column, otherwise removed from the old column and put at the
  /// head of the new one.
  pub(crate) fn upsert_task(
    &mut self,
    task: Task
  ) {
    match self.locate(&task.id) {
      | Some((status, idx))
        if status == task.status =>
      {
        self.column_mut(status).tasks[idx] =
          task;
      }
      | _ => self.insert_head(task)
    }
  }

  pub(crate) fn insert_head(
    &mut self,
    task: Task
  ) {
    self.remove_task(&task.id);
    let status = task.status;
    self
      .column_mut(status)
      .tasks
      .insert(0, task);
  }

  /// Installs a freshly fetched list for `status`. Tasks tagged with
  /// another status are dropped; tasks still shown in another column are
  /// pulled out of it.
  pub(crate) fn install_fetched(
    &mut self,
    status: TaskStatus,
    tasks: Vec<Task>,
    append: bool
  ) -> usize {
    let mut accepted =
      Vec::with_capacity(tasks.len());
    for task in tasks {
      if task.status != status {
        warn!(
          column = %status,
          task_id = %task.id,
          task_status = %task.status,
          "dropping task listed under the wrong status"
        );
        continue;
      }
      if accepted
        .iter()
        .any(|t: &Task| t.id == task.id)
      {
        continue;
      }
      accepted.push(task);
    }

    for other in TaskStatus::ALL {
      if other == status {
        continue;
      }
      let col = self.column_mut(other);
      let before = col.tasks.len();
      col.tasks.retain(|existing| {
        !accepted
          .iter()
          .any(|t| t.id == existing.id)
      });
      if col.tasks.len() != before {
        debug!(
          from = %other,
          to = %status,
          moved = before - col.tasks.len(),
          "removed tasks that moved columns remotely"
        );
      }
    }

    let col = self.column_mut(status);
    if append {
      col.append_unique(accepted)
    } else {
      let count = accepted.len();
      col.tasks = accepted;
      count
    }
  }
}

pub struct ColumnStore {
  tx:        watch::Sender<Board>,
  page_size: u32
}

impl ColumnStore {
  pub fn new(page_size: u32) -> Self {
    Self {
      tx: watch::Sender::new(Board::new(
        page_size
      )),
      page_size
    }
  }

  pub fn page_size(&self) -> u32 {
    self.page_size
  }

  pub fn snapshot(&self) -> Board {
    self.tx.borrow().clone()
  }

  pub fn column(
    &self,
    status: TaskStatus
  ) -> ColumnState {
    self.tx.borrow().column(status).clone()
  }

  /// Receiver notified after every write.
  pub fn subscribe(
    &self
  ) -> watch::Receiver<Board> {
    self.tx.subscribe()
  }

  pub(crate) fn patch_column(
    &self,
    status: TaskStatus,
    patch: impl FnOnce(&mut ColumnState)
  ) {
    self.transact(|board| {
      patch(board.column_mut(status))
    })
  }

  /// Applies a multi-column change as one write.
  pub(crate) fn transact(
    &self,
    change: impl FnOnce(&mut Board)
  ) {
    self.tx.send_modify(change);
  }

  /// Like [`ColumnStore::transact`], but `change` may decline by returning
  /// `None`, in which case subscribers are not notified.
  pub(crate) fn transact_if<R>(
    &self,
    change: impl FnOnce(&mut Board) -> Option<R>
  ) -> Option<R> {
    let mut out = None;
    self.tx.send_if_modified(|board| {
      out = change(board);
      out.is_some()
    });
    out
  }

  pub(crate) fn reset(
    &self,
    board: Board
  ) {
    self.tx.send_replace(board);
  }
}
