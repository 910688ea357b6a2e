use std::io::{
  self,
  BufRead,
  Write
};

use anyhow::{
  Context,
  anyhow
};
use taskboard_shared::{
  DueDate,
  Task,
  TaskCreate,
  TaskId,
  TaskPatch,
  TaskStatus
};
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::board::{
  BoardViewAdapter,
  SummaryChips
};
use crate::cli::{
  AddArgs,
  Command,
  EditArgs
};
use crate::coordinator::{
  DeleteOutcome,
  FetchAllSummary,
  FetchOutcome,
  FetchParams,
  TaskSyncCoordinator
};
use crate::datetime::parse_due_expr;
use crate::render::Renderer;

pub struct Session {
  pub coordinator: TaskSyncCoordinator,
  pub adapter:     BoardViewAdapter,
  pub renderer:    Renderer
}

#[instrument(skip(session))]
pub async fn dispatch(
  session: &Session,
  command: Command
) -> anyhow::Result<()> {
  debug!(?command, "dispatching command");
  match command {
    | Command::Board {
      overdue
    } => cmd_board(session, overdue).await,
    | Command::Add(args) => {
      cmd_add(session, args).await
    }
    | Command::Edit(args) => {
      cmd_edit(session, args).await
    }
    | Command::Move {
      id,
      status
    } => cmd_move(session, id, status).await,
    | Command::Delete {
      id,
      yes
    } => cmd_delete(session, id, yes).await,
    | Command::More {
      status,
      pages
    } => cmd_more(session, status, pages).await,
    | Command::Stats => cmd_stats(session).await,
    | Command::Watch => cmd_watch(session).await
  }
}

fn print_board(
  session: &Session
) -> anyhow::Result<()> {
  let coordinator = &session.coordinator;
  let view = session.adapter.view(
    &coordinator.board().snapshot(),
    coordinator.now()
  );
  session.renderer.print_board(&view)
}

fn print_task(
  session: &Session,
  task: &Task
) -> anyhow::Result<()> {
  let card = session
    .adapter
    .card_view(task, session.coordinator.now());
  session.renderer.print_card(&card)
}

fn all_failed(
  summary: &FetchAllSummary
) -> anyhow::Result<()> {
  if summary.failed.len() == TaskStatus::ALL.len()
  {
    return Err(anyhow!(
      "could not load any column from the \
       task server"
    ));
  }
  Ok(())
}

async fn cmd_board(
  session: &Session,
  overdue: bool
) -> anyhow::Result<()> {
  let coordinator = &session.coordinator;
  let summary = if overdue {
    coordinator.mount();
    coordinator
      .fetch_all_columns_with(
        FetchParams::overdue_only(),
        false
      )
      .await
  } else {
    coordinator.on_mount().await
  };
  print_board(session)?;
  all_failed(&summary)
}

fn due_fields(
  session: &Session,
  expr: &str
) -> anyhow::Result<DueDate> {
  let coordinator = &session.coordinator;
  parse_due_expr(
    expr,
    coordinator.now(),
    coordinator.settings().client_tz
  )
  .with_context(|| {
    format!("invalid due date: {expr}")
  })
}

async fn cmd_add(
  session: &Session,
  args: AddArgs
) -> anyhow::Result<()> {
  let due = args
    .due
    .as_deref()
    .map(|expr| due_fields(session, expr))
    .transpose()?;

  let payload = TaskCreate {
    title: args.title.join(" "),
    description: args.description,
    priority: args.priority,
    status: args.status,
    due_date: due.as_ref().map(|d| d.date),
    due_time: due.as_ref().and_then(|d| d.time),
    due_timezone: due.and_then(|d| d.timezone),
    category: args.category,
    tags: args.tags,
    estimated_hours: args.estimate,
    assignees: args.assignees
  };

  let coordinator = &session.coordinator;
  coordinator.mount();
  let task =
    coordinator.create_task(payload).await?;
  info!(task_id = %task.id, "task created");
  println!("Created task {}.", task.id);
  print_task(session, &task)
}

fn build_patch(
  session: &Session,
  args: EditArgs
) -> anyhow::Result<TaskPatch> {
  let mut patch = TaskPatch {
    title: args.title,
    priority: args.priority,
    status: args.status,
    category: args.category,
    ..TaskPatch::default()
  };

  if args.clear_description {
    patch.description = Some(None);
  } else if let Some(description) =
    args.description
  {
    patch.description = Some(Some(description));
  }

  if args.clear_due {
    patch.due_date = Some(None);
    patch.due_time = Some(None);
    patch.due_timezone = Some(None);
  } else if let Some(expr) = args.due.as_deref()
  {
    let due = due_fields(session, expr)?;
    patch.due_date = Some(Some(due.date));
    patch.due_time = Some(due.time);
    patch.due_timezone = Some(due.timezone);
  }

  if !args.tags.is_empty() {
    patch.tags = Some(args.tags);
  }

  if args.clear_estimate {
    patch.estimated_hours = Some(None);
  } else if let Some(hours) = args.estimate {
    patch.estimated_hours = Some(Some(hours));
  }

  Ok(patch)
}

async fn cmd_edit(
  session: &Session,
  args: EditArgs
) -> anyhow::Result<()> {
  let id = TaskId::new(args.id.clone());
  let patch = build_patch(session, args)?;
  let coordinator = &session.coordinator;
  coordinator.mount();
  let task =
    coordinator.update_task(&id, patch).await?;
  println!("Updated task {}.", task.id);
  print_task(session, &task)
}

async fn cmd_move(
  session: &Session,
  id: String,
  status: TaskStatus
) -> anyhow::Result<()> {
  let id = TaskId::new(id);
  let coordinator = &session.coordinator;
  coordinator.mount();
  let task =
    coordinator.move_task(&id, status).await?;
  println!(
    "Moved task {} to {}.",
    task.id,
    task.status.label()
  );
  Ok(())
}

/// Asks for confirmation; anything but an explicit yes declines.
fn prompt_delete(
  task: &Task,
  input: &mut impl BufRead,
  output: &mut impl Write
) -> bool {
  let asked = write!(
    output,
    "Permanently delete task {} '{}'? \
     (yes/no) ",
    task.id, task.title
  )
  .and_then(|()| output.flush());
  if let Err(err) = asked {
    warn!(error = %err, "failed writing confirmation prompt");
    return false;
  }
  let mut answer = String::new();
  match input.read_line(&mut answer) {
    | Ok(_) => matches!(
      answer.trim().to_ascii_lowercase().as_str(),
      "y" | "yes"
    ),
    | Err(err) => {
      warn!(error = %err, "failed reading confirmation");
      false
    }
  }
}

async fn cmd_delete(
  session: &Session,
  id: String,
  yes: bool
) -> anyhow::Result<()> {
  let id = TaskId::new(id);
  let coordinator = &session.coordinator;
  all_failed(&coordinator.on_mount().await)?;
  // Deletion needs the task on the board, which may be past page one.
  let Some(task) =
    coordinator.load_until_found(&id).await?
  else {
    anyhow::bail!("no task with id {id}");
  };

  let confirmed = yes
    || tokio::task::spawn_blocking(move || {
      prompt_delete(
        &task,
        &mut io::stdin().lock(),
        &mut io::stdout()
      )
    })
    .await
    .context("confirmation prompt failed")?;

  let outcome = coordinator
    .delete_task(&id, &move |_: &Task| confirmed)
    .await?;

  match outcome {
    | DeleteOutcome::Deleted(task) => {
      println!(
        "Deleted task {} '{}'.",
        task.id, task.title
      );
    }
    | DeleteOutcome::Declined => {
      println!("Task not deleted.");
    }
  }
  Ok(())
}

async fn cmd_more(
  session: &Session,
  status: TaskStatus,
  pages: u32
) -> anyhow::Result<()> {
  let coordinator = &session.coordinator;
  coordinator.mount();
  coordinator
    .fetch_column(
      status,
      FetchParams::default(),
      false,
      false
    )
    .await?;

  for _ in 0..pages {
    match coordinator
      .load_more_column_tasks(status)
      .await?
    {
      | FetchOutcome::Applied {
        tasks
      } => {
        debug!(status = %status, tasks, "loaded another page");
      }
      | FetchOutcome::Skipped
      | FetchOutcome::Discarded => break
    }
  }

  let column = session.adapter.column_view(
    &coordinator.board().column(status),
    coordinator.now()
  );
  session.renderer.print_column(&column)
}

async fn cmd_stats(
  session: &Session
) -> anyhow::Result<()> {
  let stats =
    session.coordinator.statistics().await?;
  session
    .renderer
    .print_chips(&SummaryChips::from_statistics(
      &stats
    ))
}

async fn cmd_watch(
  session: &Session
) -> anyhow::Result<()> {
  let coordinator = &session.coordinator;
  let mut changes =
    coordinator.board().subscribe();
  coordinator.on_mount().await;
  coordinator.spawn_reconciliation();
  print_board(session)?;
  changes.mark_unchanged();

  loop {
    tokio::select! {
      changed = changes.changed() => {
        if changed.is_err() {
          break;
        }
        let idle = changes.borrow_and_update().is_idle();
        if idle {
          println!();
          println!(
            "-- {} --",
            coordinator.now().format("%Y-%m-%d %H:%M:%S UTC")
          );
          print_board(session)?;
        }
      }
      signal = tokio::signal::ctrl_c() => {
        signal.context("failed listening for Ctrl-C")?;
        info!("interrupt received; closing board");
        break;
      }
    }
  }

  coordinator.on_unmount();
  Ok(())
}
