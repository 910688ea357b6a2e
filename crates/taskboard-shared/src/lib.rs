use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  NaiveDate,
  NaiveTime,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};

mod wire_time;

pub const DEFAULT_CATEGORY: &str =
  "general";

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
  pub fn new(
    id: impl Into<String>
  ) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for TaskId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TaskId {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

/// Board lane a task lives in. Every status owns exactly one column.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  #[default]
  Todo,
  InProgress,
  Done
}

impl TaskStatus {
  pub const ALL: [TaskStatus; 3] = [
    TaskStatus::Todo,
    TaskStatus::InProgress,
    TaskStatus::Done
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | TaskStatus::Todo => "todo",
      | TaskStatus::InProgress => {
        "in_progress"
      }
      | TaskStatus::Done => "done"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | TaskStatus::Todo => "To Do",
      | TaskStatus::InProgress => {
        "In Progress"
      }
      | TaskStatus::Done => "Done"
    }
  }

  pub fn index(self) -> usize {
    match self {
      | TaskStatus::Todo => 0,
      | TaskStatus::InProgress => 1,
      | TaskStatus::Done => 2
    }
  }

  pub fn is_active(self) -> bool {
    self != TaskStatus::Done
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TaskStatus {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .replace('-', "_")
      .as_str()
    {
      | "todo" | "not_started" => {
        Ok(TaskStatus::Todo)
      }
      | "in_progress" | "doing" => {
        Ok(TaskStatus::InProgress)
      }
      | "done" | "completed" => {
        Ok(TaskStatus::Done)
      }
      | other => Err(format!(
        "unknown task status: {other}"
      ))
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
  Low,
  #[default]
  Medium,
  High
}

impl TaskPriority {
  pub fn as_str(self) -> &'static str {
    match self {
      | TaskPriority::Low => "low",
      | TaskPriority::Medium => "medium",
      | TaskPriority::High => "high"
    }
  }
}

impl FromStr for TaskPriority {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "l" | "low" => {
        Ok(TaskPriority::Low)
      }
      | "m" | "med" | "medium" => {
        Ok(TaskPriority::Medium)
      }
      | "h" | "high" => {
        Ok(TaskPriority::High)
      }
      | other => Err(format!(
        "unknown priority: {other}"
      ))
    }
  }
}

/// Ordinal classification of how late an active task is.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  Medium,
  High,
  Critical
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      | Severity::Low => "low",
      | Severity::Medium => "medium",
      | Severity::High => "high",
      | Severity::Critical => "critical"
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum OverdueSource {
  #[default]
  Server,
  Client
}

/// Overdue annotation attached to a single task.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct Overdue {
  #[serde(default)]
  pub is_overdue:    bool,
  #[serde(default)]
  pub days_past_due: u32,
  #[serde(default)]
  pub severity:      Option<Severity>,
  #[serde(skip)]
  pub source:        OverdueSource
}

impl Overdue {
  pub fn not_overdue(
    source: OverdueSource
  ) -> Self {
    Self {
      is_overdue: false,
      days_past_due: 0,
      severity: None,
      source
    }
  }
}

/// Due date as entered: a calendar date, optionally a wall-clock time and
/// an IANA timezone label.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
)]
pub struct DueDate {
  pub date:     NaiveDate,
  pub time:     Option<NaiveTime>,
  pub timezone: Option<String>
}

impl DueDate {
  pub fn on(date: NaiveDate) -> Self {
    Self {
      date,
      time: None,
      timezone: None
    }
  }
}

/// Reference to a user as returned by the store: either a bare id or an
/// embedded profile.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(from = "UserRefWire")]
pub struct UserRef {
  pub id:    String,
  #[serde(default)]
  pub name:  Option<String>,
  #[serde(default)]
  pub email: Option<String>
}

impl UserRef {
  pub fn id(id: impl Into<String>) -> Self {
    Self {
      id:    id.into(),
      name:  None,
      email: None
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserRefWire {
  Id(String),
  Profile {
    #[serde(alias = "_id")]
    id:    String,
    #[serde(default)]
    name:  Option<String>,
    #[serde(default)]
    email: Option<String>
  }
}

impl From<UserRefWire> for UserRef {
  fn from(wire: UserRefWire) -> Self {
    match wire {
      | UserRefWire::Id(id) => {
        UserRef::id(id)
      }
      | UserRefWire::Profile {
        id,
        name,
        email
      } => UserRef {
        id,
        name,
        email
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  #[serde(alias = "_id")]
  pub id:              TaskId,
  pub title:           String,
  #[serde(default)]
  pub description:     Option<String>,
  #[serde(default)]
  pub priority:        TaskPriority,
  #[serde(default)]
  pub status:          TaskStatus,
  #[serde(
    default,
    with = "wire_time::due_date",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:        Option<NaiveDate>,
  #[serde(
    default,
    with = "wire_time::clock",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_time:        Option<NaiveTime>,
  #[serde(
    default,
    rename = "timezone",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_timezone:    Option<String>,
  #[serde(default = "default_category")]
  pub category:        String,
  #[serde(default)]
  pub tags:            Vec<String>,
  #[serde(default)]
  pub estimated_hours: Option<f64>,
  #[serde(default, alias = "assignedTo")]
  pub assignees:       Vec<UserRef>,
  #[serde(default, alias = "assignedBy")]
  pub assigner:        Option<UserRef>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  #[serde(
    default,
    rename = "overdueMetadata",
    skip_serializing_if = "Option::is_none"
  )]
  pub overdue:         Option<Overdue>,
  #[serde(flatten)]
  pub extra:
    BTreeMap<String, serde_json::Value>
}

impl Task {
  pub fn due(&self) -> Option<DueDate> {
    self.due_date.map(|date| DueDate {
      date,
      time: self.due_time,
      timezone: self.due_timezone.clone()
    })
  }

  pub fn is_overdue(&self) -> bool {
    self
      .overdue
      .as_ref()
      .is_some_and(|o| o.is_overdue)
  }
}

fn default_category() -> String {
  DEFAULT_CATEGORY.to_string()
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  #[serde(default = "first_page")]
  pub current_page:  u32,
  #[serde(default)]
  pub total_pages:   u32,
  #[serde(default)]
  pub total_tasks:   u64,
  #[serde(default)]
  pub has_next_page: bool,
  #[serde(default)]
  pub has_prev_page: bool,
  #[serde(default, alias = "pageSize")]
  pub limit:         u32
}

impl Pagination {
  pub fn empty(limit: u32) -> Self {
    Self {
      current_page: 1,
      total_pages: 0,
      total_tasks: 0,
      has_next_page: false,
      has_prev_page: false,
      limit
    }
  }
}

fn first_page() -> u32 {
  1
}

/// Per-status counts reported by the store alongside a page.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
  #[serde(default, alias = "count")]
  pub total:         u64,
  #[serde(default, alias = "overdueCount")]
  pub overdue:       u64,
  #[serde(default)]
  pub high_priority: u64,
  #[serde(flatten)]
  pub extra:
    BTreeMap<String, serde_json::Value>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct SeverityBreakdown {
  #[serde(default)]
  pub low:      u64,
  #[serde(default)]
  pub medium:   u64,
  #[serde(default)]
  pub high:     u64,
  #[serde(default)]
  pub critical: u64
}

impl SeverityBreakdown {
  pub fn total(&self) -> u64 {
    self.low
      + self.medium
      + self.high
      + self.critical
  }

  pub fn count(
    &self,
    severity: Severity
  ) -> u64 {
    match severity {
      | Severity::Low => self.low,
      | Severity::Medium => self.medium,
      | Severity::High => self.high,
      | Severity::Critical => {
        self.critical
      }
    }
  }
}

/// Severity breakdown of the overdue tasks within one status.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct OverdueSummary {
  #[serde(default, alias = "overdueCount")]
  pub total_overdue: u64,
  #[serde(default, alias = "severityBreakdown")]
  pub by_severity:   SeverityBreakdown,
  #[serde(flatten)]
  pub extra:
    BTreeMap<String, serde_json::Value>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
  #[serde(default)]
  pub tasks:           Vec<Task>,
  pub pagination:      Pagination,
  #[serde(default)]
  pub status_metadata: Option<StatusSummary>,
  #[serde(default)]
  pub overdue_metadata:
    Option<OverdueSummary>
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc
}

impl SortOrder {
  pub fn as_str(self) -> &'static str {
    match self {
      | SortOrder::Asc => "asc",
      | SortOrder::Desc => "desc"
    }
  }
}

impl FromStr for SortOrder {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "asc" | "ascending" => {
        Ok(SortOrder::Asc)
      }
      | "desc" | "descending" => {
        Ok(SortOrder::Desc)
      }
      | other => Err(format!(
        "unknown sort order: {other}"
      ))
    }
  }
}

/// Query sent with every list call. `overdue_only` selects the overdue
/// listing endpoint and never goes on the wire.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
  pub page:         u32,
  pub limit:        u32,
  pub sort_by:      String,
  pub sort_order:   SortOrder,
  #[serde(skip)]
  pub overdue_only: bool
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskCreate {
  pub title:           String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority:        Option<TaskPriority>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:          Option<TaskStatus>,
  #[serde(
    with = "wire_time::due_date",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:        Option<NaiveDate>,
  #[serde(
    with = "wire_time::clock",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_time:        Option<NaiveTime>,
  #[serde(
    rename = "timezone",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_timezone:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category:        Option<String>,
  pub tags:            Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub estimated_hours: Option<f64>,
  #[serde(rename = "assignedTo")]
  pub assignees:       Vec<String>
}

impl TaskCreate {
  pub fn titled(
    title: impl Into<String>
  ) -> Self {
    Self {
      title: title.into(),
      ..Self::default()
    }
  }
}

/// Partial update. `Some(None)` on a clearable field sends an explicit
/// `null` so the store drops the value.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description:
    Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority:        Option<TaskPriority>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:          Option<TaskStatus>,
  #[serde(
    with = "wire_time::patch_due_date",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:
    Option<Option<NaiveDate>>,
  #[serde(
    with = "wire_time::patch_clock",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_time:
    Option<Option<NaiveTime>>,
  #[serde(
    rename = "timezone",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_timezone:
    Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tags:            Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub estimated_hours:
    Option<Option<f64>>,
  #[serde(
    rename = "assignedTo",
    skip_serializing_if = "Option::is_none"
  )]
  pub assignees:
    Option<Vec<String>>
}

impl TaskPatch {
  pub fn status(
    status: TaskStatus
  ) -> Self {
    Self {
      status: Some(status),
      ..Self::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
  #[serde(default)]
  pub todo:        u64,
  #[serde(default, alias = "in_progress")]
  pub in_progress: u64,
  #[serde(default)]
  pub done:        u64
}

impl StatusBreakdown {
  pub fn count(
    &self,
    status: TaskStatus
  ) -> u64 {
    match status {
      | TaskStatus::Todo => self.todo,
      | TaskStatus::InProgress => {
        self.in_progress
      }
      | TaskStatus::Done => self.done
    }
  }
}

/// Dashboard aggregate returned by the statistics endpoint.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
  #[serde(default)]
  pub total_tasks:       u64,
  #[serde(default)]
  pub overdue_breakdown: SeverityBreakdown,
  #[serde(default)]
  pub normal_breakdown:  StatusBreakdown,
  #[serde(flatten)]
  pub extra:
    BTreeMap<String, serde_json::Value>
}
