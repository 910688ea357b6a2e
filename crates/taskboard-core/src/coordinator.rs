//! Task sync coordinator.
//!
//! Owns the [`ColumnStore`] and is the only code that writes to it. Every
//! operation follows the same shape: mark the relevant slot busy, await
//! the remote store, then apply the outcome in one atomic write. Writes are
//! tagged with the mount epoch so results that land after
//! [`TaskSyncCoordinator::on_unmount`] are dropped instead of applied.

use std::sync::atomic::{
  AtomicBool,
  AtomicU64,
  Ordering
};
use std::sync::{
  Arc,
  Weak
};
use std::time::Duration;

use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use parking_lot::Mutex;
use taskboard_shared::{
  PageQuery,
  SortOrder,
  Task,
  TaskCreate,
  TaskId,
  TaskPage,
  TaskPatch,
  TaskStatistics,
  TaskStatus
};
use tokio::task::JoinHandle;
use tokio::time::{
  Instant,
  MissedTickBehavior
};
use tracing::{
  debug,
  error,
  info,
  instrument,
  warn
};
use uuid::Uuid;

use crate::column::{
  Board,
  ColumnState,
  ColumnStore,
  OperationKind
};
use crate::config::Config;
use crate::datetime::resolve_client_timezone;
use crate::error::{
  StoreError,
  SyncError,
  ValidationError
};
use crate::overdue;
use crate::remote::TaskStore;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_SORT_BY: &str =
  "updatedAt";
pub const DEFAULT_RECONCILE_INTERVAL:
  Duration = Duration::from_secs(5 * 60);

pub type Clock =
  Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct SyncSettings {
  pub page_size:          u32,
  pub sort_by:            String,
  pub sort_order:         SortOrder,
  pub reconcile_interval: Duration,
  pub client_tz:          Tz
}

impl Default for SyncSettings {
  fn default() -> Self {
    Self {
      page_size:          DEFAULT_PAGE_SIZE,
      sort_by:            DEFAULT_SORT_BY
        .to_string(),
      sort_order:         SortOrder::Desc,
      reconcile_interval:
        DEFAULT_RECONCILE_INTERVAL,
      client_tz:          chrono_tz::UTC
    }
  }
}

impl SyncSettings {
  pub fn from_config(
    cfg: &Config
  ) -> anyhow::Result<Self> {
    let defaults = Self::default();
    let page_size = match cfg
      .get_u64("page.size")?
    {
      | Some(0) => anyhow::bail!(
        "page.size must be at least 1"
      ),
      | Some(size) => u32::try_from(size)
        .map_err(|_| {
          anyhow::anyhow!(
            "page.size is too large: \
             {size}"
          )
        })?,
      | None => defaults.page_size
    };
    let sort_order = match cfg
      .get("sort.order")
    {
      | Some(raw) => raw
        .parse::<SortOrder>()
        .map_err(anyhow::Error::msg)?,
      | None => defaults.sort_order
    };
    let reconcile_interval = match cfg
      .get_u64("sync.interval")?
    {
      | Some(0) => anyhow::bail!(
        "sync.interval must be at least \
         1 second"
      ),
      | Some(secs) => {
        Duration::from_secs(secs)
      }
      | None => defaults.reconcile_interval
    };

    Ok(Self {
      page_size,
      sort_by: cfg
        .get("sort.by")
        .unwrap_or(defaults.sort_by),
      sort_order,
      reconcile_interval,
      client_tz: resolve_client_timezone(
        cfg.get("timezone").as_deref()
      )
    })
  }
}

/// Per-call query overrides. Unset fields fall back to the column's last
/// query, then to [`SyncSettings`].
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub struct FetchParams {
  pub page:         Option<u32>,
  pub limit:        Option<u32>,
  pub sort_by:      Option<String>,
  pub sort_order:   Option<SortOrder>,
  pub overdue_only: Option<bool>
}

impl FetchParams {
  pub fn overdue_only() -> Self {
    Self {
      overdue_only: Some(true),
      ..Self::default()
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  /// The response was written into the column.
  Applied { tasks: usize },
  /// A newer fetch superseded this one, or the board was unmounted.
  Discarded,
  /// Load-more guard: the column is busy or has no further pages.
  Skipped
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchAllSummary {
  pub applied:   Vec<TaskStatus>,
  pub discarded: Vec<TaskStatus>,
  pub failed:    Vec<TaskStatus>
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
  Deleted(Task),
  /// The user declined the confirmation; nothing was sent.
  Declined
}

/// Confirmation step in front of a delete.
pub trait ConfirmDelete {
  fn confirm_delete(&self, task: &Task) -> bool;
}

impl<F> ConfirmDelete for F
where
  F: Fn(&Task) -> bool
{
  fn confirm_delete(&self, task: &Task) -> bool {
    self(task)
  }
}

#[derive(Debug, Clone)]
struct FetchTicket {
  seq:            u64,
  replace_at:     u64,
  page_at:        u32,
  append:         bool,
  query:          PageQuery
}

struct Inner {
  store:      Arc<dyn TaskStore>,
  board:      ColumnStore,
  settings:   SyncSettings,
  clock:      Clock,
  epoch:      AtomicU64,
  mounted:    AtomicBool,
  reconciler: Mutex<Option<JoinHandle<()>>>
}

impl Drop for Inner {
  fn drop(&mut self) {
    if let Some(handle) =
      self.reconciler.get_mut().take()
    {
      handle.abort();
    }
  }
}

#[derive(Clone)]
pub struct TaskSyncCoordinator {
  inner: Arc<Inner>
}

impl TaskSyncCoordinator {
  pub fn new(
    store: Arc<dyn TaskStore>,
    settings: SyncSettings
  ) -> Self {
    Self::with_clock(
      store,
      settings,
      Arc::new(Utc::now)
    )
  }

  pub fn with_clock(
    store: Arc<dyn TaskStore>,
    settings: SyncSettings,
    clock: Clock
  ) -> Self {
    Self {
      inner: Arc::new(Inner {
        store,
        board: ColumnStore::new(
          settings.page_size
        ),
        settings,
        clock,
        epoch: AtomicU64::new(0),
        mounted: AtomicBool::new(false),
        reconciler: Mutex::new(None)
      })
    }
  }

  pub fn settings(&self) -> &SyncSettings {
    &self.inner.settings
  }

  /// Read-only view of the column store.
  pub fn board(&self) -> &ColumnStore {
    &self.inner.board
  }

  pub fn now(&self) -> DateTime<Utc> {
    (self.inner.clock)()
  }

  pub fn is_mounted(&self) -> bool {
    self.inner.mounted.load(Ordering::SeqCst)
  }

  fn current_epoch(
    &self
  ) -> Result<u64, SyncError> {
    if !self.is_mounted() {
      return Err(SyncError::Unmounted);
    }
    Ok(self.inner.epoch.load(Ordering::SeqCst))
  }

  /// Applies `change` unless the board was unmounted since `epoch` was
  /// captured. The check runs inside the store write, so an unmount can
  /// never interleave with it.
  fn apply<R>(
    &self,
    epoch: u64,
    change: impl FnOnce(&mut Board) -> R
  ) -> Option<R> {
    let epoch_now = &self.inner.epoch;
    self.inner.board.transact_if(|board| {
      (epoch_now.load(Ordering::SeqCst)
        == epoch)
        .then(|| change(board))
    })
  }

  /// Resets the board to its loading state and starts a new epoch.
  #[instrument(skip(self))]
  pub fn mount(&self) {
    let epoch = self
      .inner
      .epoch
      .fetch_add(1, Ordering::SeqCst)
      + 1;
    self.inner.board.reset(Board::mounting(
      self.inner.settings.page_size
    ));
    self
      .inner
      .mounted
      .store(true, Ordering::SeqCst);
    info!(epoch, "board mounted");
  }

  /// Mount hook: fresh board, then the first load of every column.
  pub async fn on_mount(
    &self
  ) -> FetchAllSummary {
    self.mount();
    self.fetch_all_columns(false).await
  }

  /// Interval hook: refreshes every column when nothing else is in
  /// flight. Returns whether a sweep ran.
  #[instrument(skip(self))]
  pub async fn on_interval(&self) -> bool {
    if !self.is_mounted() {
      return false;
    }
    if !self.inner.board.snapshot().is_idle()
    {
      debug!(
        "skipping reconciliation; board \
         is busy"
      );
      return false;
    }
    let summary =
      self.fetch_all_columns(true).await;
    debug!(?summary, "reconciliation sweep finished");
    true
  }

  /// Unmount hook: stops the sweep, drops every in-flight result and
  /// clears the board.
  #[instrument(skip(self))]
  pub fn on_unmount(&self) {
    self
      .inner
      .mounted
      .store(false, Ordering::SeqCst);
    self
      .inner
      .epoch
      .fetch_add(1, Ordering::SeqCst);
    if let Some(handle) =
      self.inner.reconciler.lock().take()
    {
      handle.abort();
    }
    self.inner.board.reset(Board::new(
      self.inner.settings.page_size
    ));
    info!("board unmounted");
  }

  /// Starts the periodic reconciliation sweep. The task holds only a weak
  /// reference and stops once the coordinator is dropped or unmounted.
  pub fn spawn_reconciliation(&self) {
    let period =
      self.inner.settings.reconcile_interval;
    let weak: Weak<Inner> =
      Arc::downgrade(&self.inner);
    let handle = tokio::spawn(async move {
      let mut ticker =
        tokio::time::interval_at(
          Instant::now() + period,
          period
        );
      ticker.set_missed_tick_behavior(
        MissedTickBehavior::Skip
      );
      loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade()
        else {
          break;
        };
        let coordinator =
          TaskSyncCoordinator { inner };
        if !coordinator.is_mounted() {
          break;
        }
        coordinator.on_interval().await;
      }
    });

    if let Some(previous) = self
      .inner
      .reconciler
      .lock()
      .replace(handle)
    {
      previous.abort();
    }
    info!(
      interval_secs = period.as_secs(),
      "periodic reconciliation started"
    );
  }

  fn build_query(
    &self,
    column: &ColumnState,
    params: &FetchParams,
    page: u32
  ) -> PageQuery {
    let settings = &self.inner.settings;
    let last = column.query.as_ref();
    PageQuery {
      page,
      limit: params
        .limit
        .or(last.map(|q| q.limit))
        .unwrap_or(settings.page_size),
      sort_by: params
        .sort_by
        .clone()
        .or(last.map(|q| q.sort_by.clone()))
        .unwrap_or_else(|| {
          settings.sort_by.clone()
        }),
      sort_order: params
        .sort_order
        .or(last.map(|q| q.sort_order))
        .unwrap_or(settings.sort_order),
      overdue_only: params
        .overdue_only
        .or(last.map(|q| q.overdue_only))
        .unwrap_or(false)
    }
  }

  /// Fetches one column. A refresh or plain fetch replaces the list; a
  /// load-more appends the next page. Failures are recorded on the column
  /// (keeping its tasks and metadata) and also returned.
  #[instrument(skip(self, params))]
  pub async fn fetch_column(
    &self,
    status: TaskStatus,
    params: FetchParams,
    is_refresh: bool,
    is_load_more: bool
  ) -> Result<FetchOutcome, SyncError> {
    let epoch = self.current_epoch()?;
    let append = is_load_more && !is_refresh;

    let ticket = self.apply(epoch, |board| {
      let column = board.column_mut(status);
      if append && !column.can_load_more() {
        return None;
      }

      let page = if append {
        column.pagination.current_page + 1
      } else {
        params.page.unwrap_or(1)
      };
      let query =
        self.build_query(column, &params, page);

      column.tickets.issued += 1;
      let seq = column.tickets.issued;
      if !append {
        column.tickets.replace = seq;
      }
      if is_refresh {
        column.refreshing = true;
      } else {
        column.loading = true;
      }
      column.error = None;

      Some(FetchTicket {
        seq,
        replace_at: column.tickets.replace,
        page_at: column.pagination.current_page,
        append,
        query
      })
    });

    let ticket = match ticket {
      | None => return Ok(FetchOutcome::Discarded),
      | Some(None) => {
        debug!(
          "load more skipped; column busy \
           or on its last page"
        );
        return Ok(FetchOutcome::Skipped);
      }
      | Some(Some(ticket)) => ticket
    };

    debug!(
      seq = ticket.seq,
      page = ticket.query.page,
      overdue_only = ticket.query.overdue_only,
      "requesting column page"
    );
    let store = &self.inner.store;
    let result = if ticket.query.overdue_only {
      store
        .list_overdue_tasks_by_status(
          status,
          &ticket.query
        )
        .await
    } else {
      store
        .list_tasks_by_status(
          status,
          &ticket.query
        )
        .await
    };

    self.finish_fetch(epoch, status, ticket, result)
  }

  fn finish_fetch(
    &self,
    epoch: u64,
    status: TaskStatus,
    ticket: FetchTicket,
    result: Result<TaskPage, StoreError>
  ) -> Result<FetchOutcome, SyncError> {
    let now = self.now();
    let tz = self.inner.settings.client_tz;
    let result = result.map(|mut page| {
      for task in &mut page.tasks {
        overdue::annotate(task, now, tz);
      }
      page
    });

    let applied = self.apply(epoch, |board| {
      let column = board.column(status);
      let current = if ticket.append {
        column.tickets.replace
          == ticket.replace_at
          && column.pagination.current_page
            == ticket.page_at
      } else {
        column.tickets.replace == ticket.seq
      };
      if !current {
        return None;
      }

      Some(match result {
        | Ok(page) => {
          let count = board.install_fetched(
            status,
            page.tasks,
            ticket.append
          );
          let column = board.column_mut(status);
          column.pagination = page.pagination;
          if column.pagination.limit == 0 {
            column.pagination.limit =
              ticket.query.limit;
          }
          column.status_summary =
            page.status_metadata;
          column.overdue_summary =
            page.overdue_metadata;
          column.query = Some(ticket.query);
          column.loading = false;
          column.refreshing = false;
          column.error = None;
          Ok(FetchOutcome::Applied {
            tasks: count
          })
        }
        | Err(err) => {
          let err = SyncError::from(err);
          let column = board.column_mut(status);
          column.loading = false;
          column.refreshing = false;
          column.error =
            Some(err.user_message());
          Err(err)
        }
      })
    });

    match applied {
      | Some(Some(Ok(outcome))) => {
        debug!(?outcome, "column page applied");
        Ok(outcome)
      }
      | Some(Some(Err(err))) => {
        error!(error = %err, "column fetch failed");
        Err(err)
      }
      | Some(None) | None => {
        debug!(
          seq = ticket.seq,
          "discarding superseded column \
           response"
        );
        Ok(FetchOutcome::Discarded)
      }
    }
  }

  /// Fetches all three columns concurrently. A failing column never
  /// affects the others, and no error escapes the fan-out.
  pub async fn fetch_all_columns(
    &self,
    is_refresh: bool
  ) -> FetchAllSummary {
    self
      .fetch_all_columns_with(
        FetchParams::default(),
        is_refresh
      )
      .await
  }

  /// [`TaskSyncCoordinator::fetch_all_columns`] with the same query
  /// overrides applied to every column.
  #[instrument(skip(self, params))]
  pub async fn fetch_all_columns_with(
    &self,
    params: FetchParams,
    is_refresh: bool
  ) -> FetchAllSummary {
    let [todo, in_progress, done] =
      TaskStatus::ALL;
    let (todo_res, in_progress_res, done_res) = tokio::join!(
      self.fetch_column(
        todo,
        params.clone(),
        is_refresh,
        false
      ),
      self.fetch_column(
        in_progress,
        params.clone(),
        is_refresh,
        false
      ),
      self.fetch_column(
        done,
        params,
        is_refresh,
        false
      )
    );

    let mut summary =
      FetchAllSummary::default();
    for (status, result) in [
      (todo, todo_res),
      (in_progress, in_progress_res),
      (done, done_res)
    ] {
      match result {
        | Ok(FetchOutcome::Applied {
          ..
        }) => summary.applied.push(status),
        | Ok(_) => {
          summary.discarded.push(status)
        }
        | Err(err) => {
          warn!(status = %status, error = %err, "column fetch failed during fan-out");
          summary.failed.push(status);
        }
      }
    }
    summary
  }

  pub async fn refresh_column(
    &self,
    status: TaskStatus
  ) -> Result<FetchOutcome, SyncError> {
    self
      .fetch_column(
        status,
        FetchParams::default(),
        true,
        false
      )
      .await
  }

  pub async fn load_more_column_tasks(
    &self,
    status: TaskStatus
  ) -> Result<FetchOutcome, SyncError> {
    self
      .fetch_column(
        status,
        FetchParams::default(),
        false,
        true
      )
      .await
  }

  /// Loads further pages of every column until `id` shows up on the board
  /// or no column has pages left.
  #[instrument(skip(self))]
  pub async fn load_until_found(
    &self,
    id: &TaskId
  ) -> Result<Option<Task>, SyncError> {
    loop {
      if let Some(task) =
        self.inner.board.snapshot().find(id)
      {
        return Ok(Some(task.clone()));
      }
      let mut progressed = false;
      for status in TaskStatus::ALL {
        if let FetchOutcome::Applied {
          ..
        } = self
          .load_more_column_tasks(status)
          .await?
        {
          progressed = true;
        }
      }
      if !progressed {
        debug!(task_id = %id, "task not found on any page");
        return Ok(None);
      }
    }
  }

  fn begin_operation(
    &self,
    epoch: u64,
    kind: OperationKind
  ) -> Result<(), SyncError> {
    self
      .apply(epoch, |board| {
        let slot =
          board.operations.slot_mut(kind);
        // Overlapping calls keep each other's errors until all settle.
        if !slot.is_busy() {
          slot.error = None;
        }
        slot.in_flight += 1;
      })
      .ok_or(SyncError::Unmounted)
  }

  /// Clears the operation's busy flag and either applies `on_success` or
  /// records the failure, all in one write.
  fn finish_operation<T, R>(
    &self,
    epoch: u64,
    kind: OperationKind,
    result: Result<T, StoreError>,
    on_success: impl FnOnce(&mut Board, T) -> R
  ) -> Result<R, SyncError> {
    let outcome = self.apply(epoch, |board| {
      match result {
        | Ok(value) => {
          let slot =
            board.operations.slot_mut(kind);
          slot.in_flight =
            slot.in_flight.saturating_sub(1);
          Ok(on_success(board, value))
        }
        | Err(err) => {
          let err = SyncError::from(err);
          let slot =
            board.operations.slot_mut(kind);
          slot.in_flight =
            slot.in_flight.saturating_sub(1);
          slot.error =
            Some(err.user_message());
          Err(err)
        }
      }
    });

    match outcome {
      | Some(result) => result,
      | None => {
        debug!(
          operation = kind.as_str(),
          "discarding operation result after unmount"
        );
        Err(SyncError::Unmounted)
      }
    }
  }

  fn annotated(&self, mut task: Task) -> Task {
    overdue::annotate(
      &mut task,
      self.now(),
      self.inner.settings.client_tz
    );
    task
  }

  /// Creates a task and puts the store's canonical copy at the head of its
  /// column.
  #[instrument(skip(self, input), fields(title_len = input.title.len()))]
  pub async fn create_task(
    &self,
    input: TaskCreate
  ) -> Result<Task, SyncError> {
    let payload =
      validate_create(input)?;
    let request_id = Uuid::new_v4();
    let epoch = self.current_epoch()?;
    info!(
      request_id = %request_id,
      status = ?payload.status,
      has_due = payload.due_date.is_some(),
      tag_count = payload.tags.len(),
      "create task invoked"
    );

    self.begin_operation(
      epoch,
      OperationKind::Create
    )?;
    let result = self
      .inner
      .store
      .create_task(&payload)
      .await
      .map(|task| self.annotated(task));

    self
      .finish_operation(
        epoch,
        OperationKind::Create,
        result,
        |board, task| {
          board.insert_head(task.clone());
          task
        }
      )
      .inspect_err(|err| {
        error!(request_id = %request_id, error = %err, "create task failed");
      })
  }

  /// Applies a partial update. The returned task replaces the old copy; a
  /// status change moves it to the head of its new column in the same
  /// write.
  #[instrument(skip(self, patch))]
  pub async fn update_task(
    &self,
    id: &TaskId,
    patch: TaskPatch
  ) -> Result<Task, SyncError> {
    let patch = validate_patch(patch)?;
    let request_id = Uuid::new_v4();
    let epoch = self.current_epoch()?;
    info!(
      request_id = %request_id,
      task_id = %id,
      status = ?patch.status,
      "update task invoked"
    );

    self.begin_operation(
      epoch,
      OperationKind::Update
    )?;
    let result = self
      .inner
      .store
      .update_task(id, &patch)
      .await
      .map(|task| self.annotated(task));

    self
      .finish_operation(
        epoch,
        OperationKind::Update,
        result,
        reconcile
      )
      .inspect_err(|err| {
        error!(request_id = %request_id, error = %err, "update task failed");
      })
  }

  /// Status-only update through the store's dedicated endpoint.
  #[instrument(skip(self))]
  pub async fn move_task(
    &self,
    id: &TaskId,
    status: TaskStatus
  ) -> Result<Task, SyncError> {
    let request_id = Uuid::new_v4();
    let epoch = self.current_epoch()?;
    let from = self
      .inner
      .board
      .snapshot()
      .locate(id)
      .map(|(from, _)| from);
    info!(
      request_id = %request_id,
      task_id = %id,
      from = ?from,
      to = %status,
      "move task invoked"
    );

    self.begin_operation(
      epoch,
      OperationKind::Update
    )?;
    let result = self
      .inner
      .store
      .update_task_status(id, status)
      .await
      .map(|task| self.annotated(task));

    self
      .finish_operation(
        epoch,
        OperationKind::Update,
        result,
        reconcile
      )
      .inspect_err(|err| {
        error!(request_id = %request_id, error = %err, "move task failed");
      })
  }

  /// Deletes a task after `confirm` approves it. Only tasks currently on
  /// the board can be deleted.
  #[instrument(skip(self, confirm))]
  pub async fn delete_task(
    &self,
    id: &TaskId,
    confirm: &(dyn ConfirmDelete + Sync)
  ) -> Result<DeleteOutcome, SyncError> {
    let request_id = Uuid::new_v4();
    let epoch = self.current_epoch()?;
    let task = self
      .inner
      .board
      .snapshot()
      .find(id)
      .cloned()
      .ok_or_else(|| {
        SyncError::TaskNotFound(id.clone())
      })?;

    if !confirm.confirm_delete(&task) {
      info!(request_id = %request_id, task_id = %id, "delete declined");
      return Ok(DeleteOutcome::Declined);
    }
    info!(request_id = %request_id, task_id = %id, "delete task invoked");

    self.begin_operation(
      epoch,
      OperationKind::Delete
    )?;
    let result =
      self.inner.store.delete_task(id).await;

    self
      .finish_operation(
        epoch,
        OperationKind::Delete,
        result,
        |board, ()| {
          board
            .remove_task(id)
            .unwrap_or(task)
        }
      )
      .map(DeleteOutcome::Deleted)
      .inspect_err(|err| {
        error!(request_id = %request_id, error = %err, "delete task failed");
      })
  }

  /// Dashboard aggregate; read-only, never touches the board.
  #[instrument(skip(self))]
  pub async fn statistics(
    &self
  ) -> Result<TaskStatistics, SyncError> {
    self
      .inner
      .store
      .task_statistics()
      .await
      .map_err(SyncError::from)
      .inspect_err(|err| {
        error!(error = %err, "statistics request failed");
      })
  }

  pub fn dismiss_column_error(
    &self,
    status: TaskStatus
  ) {
    self.inner.board.patch_column(
      status,
      |column| column.error = None
    );
  }

  pub fn dismiss_operation_error(
    &self,
    kind: OperationKind
  ) {
    self.inner.board.transact(|board| {
      board.operations.slot_mut(kind).error =
        None;
    });
  }
}

fn reconcile(
  board: &mut Board,
  task: Task
) -> Task {
  board.upsert_task(task.clone());
  task
}

fn validate_create(
  mut input: TaskCreate
) -> Result<TaskCreate, ValidationError> {
  let title = input.title.trim();
  if title.is_empty() {
    return Err(ValidationError::EmptyTitle);
  }
  input.title = title.to_string();
  if input
    .estimated_hours
    .is_some_and(|hours| !(hours > 0.0))
  {
    return Err(
      ValidationError::InvalidEstimate
    );
  }
  input.status =
    Some(input.status.unwrap_or_default());
  Ok(input)
}

fn validate_patch(
  mut patch: TaskPatch
) -> Result<TaskPatch, ValidationError> {
  if patch.is_empty() {
    return Err(ValidationError::EmptyPatch);
  }
  if let Some(title) = patch.title.as_mut() {
    let trimmed = title.trim();
    if trimmed.is_empty() {
      return Err(ValidationError::EmptyTitle);
    }
    *title = trimmed.to_string();
  }
  if let Some(Some(hours)) =
    patch.estimated_hours
    && !(hours > 0.0)
  {
    return Err(
      ValidationError::InvalidEstimate
    );
  }
  Ok(patch)
}
