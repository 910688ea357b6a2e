pub mod board;
pub mod cli;
pub mod column;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod datetime;
pub mod error;
pub mod overdue;
pub mod remote;
pub mod render;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use crate::column::{
  Board,
  ColumnState,
  ColumnStore,
  OperationKind
};
pub use crate::coordinator::{
  SyncSettings,
  TaskSyncCoordinator
};
pub use crate::error::{
  StoreError,
  SyncError,
  ValidationError
};
pub use crate::remote::TaskStore;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre = cli::preprocess_args(&raw_args);
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskboard CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let settings =
    SyncSettings::from_config(&cfg)
      .context("invalid sync settings")?;
  let store = remote::HttpTaskStore::new(
    &remote::HttpStoreConfig::from_config(
      &cfg
    )?
  )?;
  let session = commands::Session {
    adapter:     board::BoardViewAdapter::new(
      settings.client_tz
    ),
    renderer:    render::Renderer::new(&cfg)?,
    coordinator: TaskSyncCoordinator::new(
      Arc::new(store),
      settings
    )
  };

  let runtime =
    tokio::runtime::Builder::new_multi_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;
  runtime.block_on(commands::dispatch(
    &session,
    cli.command.unwrap_or_default()
  ))?;

  info!("done");
  Ok(())
}
