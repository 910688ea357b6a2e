use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{
  ArgAction,
  Args,
  Parser,
  Subcommand
};
use taskboard_shared::{
  TaskPriority,
  TaskStatus
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
  pub cleaned_args: Vec<OsString>,
  pub rc_overrides: Vec<(String, String)>
}

#[derive(Debug, Clone)]
pub struct KeyVal {
  pub key:   String,
  pub value: String
}

impl std::str::FromStr for KeyVal {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let (k, v) =
      s.split_once('=').ok_or_else(|| {
        anyhow!(
          "expected KEY=VALUE, got: {s}"
        )
      })?;
    Ok(Self {
      key:   k.trim().to_string(),
      value: v.trim().to_string()
    })
  }
}

#[derive(Parser, Debug, Clone)]
#[command(
  name = "taskboard",
  version,
  about = "Three-column task board synced \
           with a remote task service",
  disable_help_subcommand = true
)]
pub struct GlobalCli {
  #[arg(
    short = 'v',
    long = "verbose",
    action = ArgAction::Count,
    global = true
  )]
  pub verbose: u8,

  #[arg(
    short = 'q',
    long = "quiet",
    action = ArgAction::Count,
    global = true
  )]
  pub quiet: u8,

  #[arg(
    long = "rc",
    value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
    action = ArgAction::Append,
    global = true
  )]
  pub rc_overrides: Vec<KeyVal>,

  #[arg(long = "rc-file", global = true)]
  pub rc_file: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Option<Command>
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
  /// Show all three columns.
  Board {
    /// Only tasks past their due date.
    #[arg(long)]
    overdue: bool
  },
  /// Create a task.
  Add(AddArgs),
  /// Change fields of a task.
  Edit(EditArgs),
  /// Move a task to another column.
  Move {
    id:     String,
    #[arg(value_parser = parse_status)]
    status: TaskStatus
  },
  /// Delete a task after confirmation.
  Delete {
    id:  String,
    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    yes: bool
  },
  /// Load further pages of one column.
  More {
    #[arg(value_parser = parse_status)]
    status: TaskStatus,
    #[arg(long, default_value_t = 1)]
    pages:  u32
  },
  /// Dashboard counters.
  Stats,
  /// Keep the board open and reconcile periodically until Ctrl-C.
  Watch
}

impl Default for Command {
  fn default() -> Self {
    Command::Board {
      overdue: false
    }
  }
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
  #[arg(required = true, num_args = 1..)]
  pub title:       Vec<String>,
  #[arg(short = 'd', long)]
  pub description: Option<String>,
  #[arg(short = 'p', long, value_parser = parse_priority)]
  pub priority:    Option<TaskPriority>,
  #[arg(short = 's', long, value_parser = parse_status)]
  pub status:      Option<TaskStatus>,
  /// today, tomorrow, friday, +3d, 2026-10-20 14:00, optionally @Area/City
  #[arg(long)]
  pub due:         Option<String>,
  #[arg(short = 'c', long)]
  pub category:    Option<String>,
  #[arg(short = 't', long = "tag", action = ArgAction::Append)]
  pub tags:        Vec<String>,
  #[arg(short = 'e', long = "estimate")]
  pub estimate:    Option<f64>,
  /// User id to assign; repeatable.
  #[arg(short = 'a', long = "assign", action = ArgAction::Append)]
  pub assignees:   Vec<String>
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
  pub id:                String,
  #[arg(long)]
  pub title:             Option<String>,
  #[arg(short = 'd', long, conflicts_with = "clear_description")]
  pub description:       Option<String>,
  #[arg(long)]
  pub clear_description: bool,
  #[arg(short = 'p', long, value_parser = parse_priority)]
  pub priority:          Option<TaskPriority>,
  #[arg(short = 's', long, value_parser = parse_status)]
  pub status:            Option<TaskStatus>,
  #[arg(long, conflicts_with = "clear_due")]
  pub due:               Option<String>,
  #[arg(long)]
  pub clear_due:         bool,
  #[arg(short = 'c', long)]
  pub category:          Option<String>,
  /// Replaces the tag list; repeatable.
  #[arg(short = 't', long = "tag", action = ArgAction::Append)]
  pub tags:              Vec<String>,
  #[arg(short = 'e', long = "estimate", conflicts_with = "clear_estimate")]
  pub estimate:          Option<f64>,
  #[arg(long)]
  pub clear_estimate:    bool
}

fn parse_status(
  raw: &str
) -> Result<TaskStatus, String> {
  raw.parse()
}

fn parse_priority(
  raw: &str
) -> Result<TaskPriority, String> {
  raw.parse()
}

pub fn init_tracing(
  verbose: u8,
  quiet: u8
) -> anyhow::Result<()> {
  let default_level = if quiet >= 2 {
    "error"
  } else if quiet == 1 {
    "warn"
  } else if verbose >= 3 {
    "trace"
  } else if verbose == 2 {
    "debug"
  } else if verbose == 1 {
    "info"
  } else {
    "warn"
  };

  let env_filter =
    EnvFilter::try_from_default_env()
      .or_else(|_| {
        EnvFilter::try_new(default_level)
      })
      .map_err(|e| {
        anyhow!(
          "invalid RUST_LOG / log filter: \
           {e}"
        )
      })?;

  let init_result =
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_level(true)
      .with_thread_ids(true)
      .with_writer(std::io::stderr)
      .with_ansi(
        std::io::stderr().is_terminal()
      )
      .try_init();

  if let Err(err) = init_result {
    debug!(error = %err, "tracing subscriber already set, continuing");
  }

  Ok(())
}

/// Pulls positional `rc.key=value` (or `rc.key:value`) overrides out of
/// the argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(
  raw: &[OsString]
) -> PreprocessedArgs {
  let mut cleaned =
    Vec::with_capacity(raw.len());
  let mut overrides: Vec<(String, String)> =
    Vec::new();

  let mut iter = raw.iter().cloned();
  if let Some(bin) = iter.next() {
    cleaned.push(bin);
  }

  for arg in iter {
    let s = arg.to_string_lossy();
    if let Some(rest) = s.strip_prefix("rc.")
    {
      let parsed = rest
        .split_once('=')
        .or_else(|| rest.split_once(':'))
        .map(|(k, v)| {
          (format!("rc.{k}"), v.to_string())
        });

      if let Some((k, v)) = parsed {
        debug!(key = %k, value = %v, "captured positional rc override");
        overrides.push((k, v));
        continue;
      }
    }

    cleaned.push(arg);
  }

  PreprocessedArgs {
    cleaned_args: cleaned,
    rc_overrides: overrides
  }
}
