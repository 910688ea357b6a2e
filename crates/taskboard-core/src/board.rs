//! Display records built from a board snapshot.
//!
//! Read-only: nothing here writes back to the column store.

use std::collections::HashMap;

use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use taskboard_shared::{
  Overdue,
  Severity,
  Task,
  TaskId,
  TaskPriority,
  TaskStatistics,
  TaskStatus,
  UserRef
};

use crate::column::{
  Board,
  ColumnState,
  OperationKind
};
use crate::datetime::{
  due_timezone,
  format_due,
  local_today
};
use crate::overdue::effective_overdue;

/// Known user ids to display names, for references the store returned
/// without a populated profile.
#[derive(Debug, Clone, Default)]
pub struct Directory {
  names: HashMap<String, String>
}

impl Directory {
  pub fn insert(
    &mut self,
    id: impl Into<String>,
    name: impl Into<String>
  ) {
    self.names.insert(id.into(), name.into());
  }

  pub fn display_name(
    &self,
    user: &UserRef
  ) -> String {
    if let Some(name) = user
      .name
      .as_deref()
      .map(str::trim)
      .filter(|name| !name.is_empty())
    {
      return name.to_string();
    }
    if let Some(name) = self.names.get(&user.id)
    {
      return name.clone();
    }
    user
      .email
      .clone()
      .filter(|email| !email.trim().is_empty())
      .unwrap_or_else(|| user.id.clone())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
  pub id:             TaskId,
  pub title:          String,
  pub status:         TaskStatus,
  pub priority:       TaskPriority,
  pub category:       String,
  pub tags:           Vec<String>,
  pub due_label:      Option<String>,
  pub overdue:        Overdue,
  /// "3 days overdue", "due today", or nothing.
  pub overdue_label:  Option<String>,
  pub assignees:      Vec<String>,
  pub assigner:       Option<String>,
  pub estimate_label: Option<String>,
  pub updated_label:  String
}

impl CardView {
  pub fn severity(&self) -> Option<Severity> {
    self
      .overdue
      .is_overdue
      .then_some(self.overdue.severity)
      .flatten()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
  pub status:        TaskStatus,
  pub title:         &'static str,
  pub cards:         Vec<CardView>,
  pub loading:       bool,
  pub refreshing:    bool,
  pub error:         Option<String>,
  pub footer:        String,
  pub can_load_more: bool,
  pub overdue_count: u64
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
  pub columns:          Vec<ColumnView>,
  pub busy:             Vec<OperationKind>,
  pub operation_errors: Vec<(OperationKind, String)>
}

/// Dashboard counters from the store's statistics endpoint.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct SummaryChips {
  pub total:       u64,
  pub overdue:     u64,
  pub critical:    u64,
  pub high:        u64,
  pub medium:      u64,
  pub low:         u64,
  pub todo:        u64,
  pub in_progress: u64,
  pub done:        u64
}

impl SummaryChips {
  pub fn from_statistics(
    stats: &TaskStatistics
  ) -> Self {
    let overdue = &stats.overdue_breakdown;
    let normal = &stats.normal_breakdown;
    Self {
      total:       stats.total_tasks,
      overdue:     overdue.total(),
      critical:    overdue.critical,
      high:        overdue.high,
      medium:      overdue.medium,
      low:         overdue.low,
      todo:        normal.todo,
      in_progress: normal.in_progress,
      done:        normal.done
    }
  }

  /// Chips in display order; zero-valued severity chips are left out.
  pub fn labels(&self) -> Vec<String> {
    let mut out = vec![
      format!("{} total", self.total),
      format!(
        "{} {}",
        self.todo,
        TaskStatus::Todo.label()
      ),
      format!(
        "{} {}",
        self.in_progress,
        TaskStatus::InProgress.label()
      ),
      format!(
        "{} {}",
        self.done,
        TaskStatus::Done.label()
      ),
      format!("{} overdue", self.overdue),
    ];
    for (count, severity) in [
      (self.critical, Severity::Critical),
      (self.high, Severity::High),
      (self.medium, Severity::Medium),
      (self.low, Severity::Low)
    ] {
      if count > 0 {
        out.push(format!(
          "{count} {}",
          severity.as_str()
        ));
      }
    }
    out
  }
}

#[derive(Debug, Clone)]
pub struct BoardViewAdapter {
  client_tz: Tz,
  directory: Directory
}

impl BoardViewAdapter {
  pub fn new(client_tz: Tz) -> Self {
    Self {
      client_tz,
      directory: Directory::default()
    }
  }

  pub fn with_directory(
    mut self,
    directory: Directory
  ) -> Self {
    self.directory = directory;
    self
  }

  #[tracing::instrument(skip_all)]
  pub fn view(
    &self,
    board: &Board,
    now: DateTime<Utc>
  ) -> BoardView {
    let ops = &board.operations;
    let kinds = [
      OperationKind::Create,
      OperationKind::Update,
      OperationKind::Delete
    ];
    BoardView {
      columns:          board
        .columns()
        .map(|col| self.column_view(col, now))
        .collect(),
      busy:             kinds
        .into_iter()
        .filter(|kind| ops.slot(*kind).is_busy())
        .collect(),
      operation_errors: kinds
        .into_iter()
        .filter_map(|kind| {
          ops
            .slot(kind)
            .error
            .clone()
            .map(|err| (kind, err))
        })
        .collect()
    }
  }

  pub fn column_view(
    &self,
    column: &ColumnState,
    now: DateTime<Utc>
  ) -> ColumnView {
    let cards: Vec<CardView> = column
      .tasks
      .iter()
      .map(|task| self.card_view(task, now))
      .collect();
    let overdue_count = column
      .overdue_summary
      .as_ref()
      .map(|summary| summary.total_overdue)
      .unwrap_or_else(|| {
        cards
          .iter()
          .filter(|card| card.overdue.is_overdue)
          .count() as u64
      });

    ColumnView {
      status: column.status,
      title: column.status.label(),
      footer: footer(column),
      cards,
      loading: column.loading,
      refreshing: column.refreshing,
      error: column.error.clone(),
      can_load_more: column.can_load_more(),
      overdue_count
    }
  }

  pub fn card_view(
    &self,
    task: &Task,
    now: DateTime<Utc>
  ) -> CardView {
    let overdue =
      effective_overdue(task, now, self.client_tz);
    let due = task.due();
    let overdue_label = if overdue.is_overdue {
      Some(days_overdue_label(
        overdue.days_past_due
      ))
    } else {
      due
        .as_ref()
        .filter(|due| {
          task.status.is_active()
            && due.date
              == local_today(
                now,
                due_timezone(due, self.client_tz)
              )
        })
        .map(|_| "due today".to_string())
    };

    CardView {
      id: task.id.clone(),
      title: task.title.clone(),
      status: task.status,
      priority: task.priority,
      category: task.category.clone(),
      tags: task.tags.clone(),
      due_label: due.as_ref().map(format_due),
      overdue,
      overdue_label,
      assignees: task
        .assignees
        .iter()
        .map(|user| {
          self.directory.display_name(user)
        })
        .collect(),
      assigner: task.assigner.as_ref().map(
        |user| self.directory.display_name(user)
      ),
      estimate_label: task
        .estimated_hours
        .map(|hours| format!("{hours}h")),
      updated_label: task
        .updated_at
        .with_timezone(&self.client_tz)
        .format("%b %d, %Y")
        .to_string()
    }
  }
}

fn days_overdue_label(days: u32) -> String {
  if days == 1 {
    "1 day overdue".to_string()
  } else {
    format!("{days} days overdue")
  }
}

fn footer(column: &ColumnState) -> String {
  let page = &column.pagination;
  let shown = column.tasks.len();
  let mut out = format!(
    "{shown} of {}",
    page.total_tasks.max(shown as u64)
  );
  if page.total_pages > 1 {
    out.push_str(&format!(
      " | page {}/{}",
      page.current_page, page.total_pages
    ));
  }
  if page.has_next_page {
    out.push_str(" | more available");
  }
  out
}
