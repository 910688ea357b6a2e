//! Overdue classification.
//!
//! The store normally annotates tasks with [`Overdue`]; when it does not,
//! the classifier derives the same annotation client-side from the due
//! date and status. Everything here is pure: `now` and the client timezone
//! are always passed in.

use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use taskboard_shared::{
  DueDate,
  Overdue,
  OverdueSource,
  Severity,
  Task,
  TaskStatus
};

use crate::datetime::{
  due_timezone,
  local_today
};

/// How an active task whose due date is today is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueTodayPolicy {
  /// Due today is still on time (`days_past_due = 0`).
  NotYetOverdue,
  /// The deadline passes when the day starts (`days_past_due = 1`).
  OverdueFromStartOfDay
}

pub const DUE_TODAY_POLICY: DueTodayPolicy =
  DueTodayPolicy::NotYetOverdue;

pub const CRITICAL_AFTER_DAYS: u32 = 7;
pub const HIGH_AFTER_DAYS: u32 = 3;
pub const MEDIUM_AFTER_DAYS: u32 = 1;

/// Client-side severity tier. `Low` is never produced here; it only
/// arrives from the store.
pub fn severity_for(
  days_past_due: u32
) -> Option<Severity> {
  if days_past_due >= CRITICAL_AFTER_DAYS
  {
    Some(Severity::Critical)
  } else if days_past_due
    >= HIGH_AFTER_DAYS
  {
    Some(Severity::High)
  } else if days_past_due
    >= MEDIUM_AFTER_DAYS
  {
    Some(Severity::Medium)
  } else {
    None
  }
}

/// Classifies against an already-resolved local date.
pub fn classify_on(
  due: Option<NaiveDate>,
  status: TaskStatus,
  today: NaiveDate,
  policy: DueTodayPolicy
) -> Overdue {
  let not_overdue =
    Overdue::not_overdue(
      OverdueSource::Client
    );
  if !status.is_active() {
    return not_overdue;
  }
  let Some(due) = due else {
    return not_overdue;
  };

  let elapsed =
    today.signed_duration_since(due)
      .num_days();
  let days_past_due = match elapsed {
    | days if days > 0 => {
      u32::try_from(days)
        .unwrap_or(u32::MAX)
    }
    | 0 if policy
      == DueTodayPolicy::OverdueFromStartOfDay =>
    {
      1
    }
    | _ => return not_overdue
  };

  Overdue {
    is_overdue: true,
    days_past_due,
    severity: severity_for(days_past_due),
    source: OverdueSource::Client
  }
}

pub fn classify_with_policy(
  due: Option<&DueDate>,
  status: TaskStatus,
  now: DateTime<Utc>,
  client_tz: Tz,
  policy: DueTodayPolicy
) -> Overdue {
  let today = match due {
    | Some(due) => local_today(
      now,
      due_timezone(due, client_tz)
    ),
    | None => local_today(now, client_tz)
  };
  classify_on(
    due.map(|d| d.date),
    status,
    today,
    policy
  )
}

pub fn classify(
  due: Option<&DueDate>,
  status: TaskStatus,
  now: DateTime<Utc>,
  client_tz: Tz
) -> Overdue {
  classify_with_policy(
    due,
    status,
    now,
    client_tz,
    DUE_TODAY_POLICY
  )
}

/// Annotation to show for `task`: the store's own when present (a finished
/// task is never overdue), otherwise a fresh client-side classification.
/// Earlier client annotations are recomputed against `now`.
pub fn effective_overdue(
  task: &Task,
  now: DateTime<Utc>,
  client_tz: Tz
) -> Overdue {
  match task
    .overdue
    .as_ref()
    .filter(|o| o.source == OverdueSource::Server)
  {
    | Some(_)
      if task.status
        == TaskStatus::Done =>
    {
      Overdue::not_overdue(
        OverdueSource::Server
      )
    }
    | Some(server) => {
      let mut server = server.clone();
      if server.is_overdue
        && server.severity.is_none()
      {
        server.severity = severity_for(
          server.days_past_due
        );
      }
      server
    }
    | None => classify(
      task.due().as_ref(),
      task.status,
      now,
      client_tz
    )
  }
}

/// Writes the effective annotation into the task.
pub fn annotate(
  task: &mut Task,
  now: DateTime<Utc>,
  client_tz: Tz
) {
  let overdue =
    effective_overdue(task, now, client_tz);
  task.overdue = Some(overdue);
}
