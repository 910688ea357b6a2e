use taskboard_shared::TaskId;
use thiserror::Error;

/// Failures reported by a [`crate::remote::TaskStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
  /// Request never produced a response (connect, timeout, TLS, ...).
  #[error("request failed: {0}")]
  Transport(String),

  #[error("task store returned {status}: {message}")]
  Status { status: u16, message: String },

  #[error("task not found: {0}")]
  NotFound(TaskId),

  #[error("could not decode task store response: {0}")]
  Decode(String)
}

impl From<reqwest::Error> for StoreError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      StoreError::Decode(err.to_string())
    } else {
      StoreError::Transport(
        err.to_string()
      )
    }
  }
}

impl From<serde_json::Error>
  for StoreError
{
  fn from(
    err: serde_json::Error
  ) -> Self {
    StoreError::Decode(err.to_string())
  }
}

/// Input rejected before any remote call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("title is required")]
  EmptyTitle,

  #[error("nothing to update")]
  EmptyPatch,

  #[error("estimated hours must be positive")]
  InvalidEstimate
}

#[derive(Debug, Error)]
pub enum SyncError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Remote(#[from] StoreError),

  #[error("task {0} is not on the board")]
  TaskNotFound(TaskId),

  /// The board was unmounted while the call was in flight; its result
  /// was dropped.
  #[error("board is not mounted")]
  Unmounted
}

impl SyncError {
  /// Text written into a column or operation error slot.
  pub fn user_message(&self) -> String {
    match self {
      | SyncError::Validation(err) => {
        err.to_string()
      }
      | SyncError::Remote(
        StoreError::Transport(_)
      ) => "Could not reach the task \
            server. Check your \
            connection and try again."
        .to_string(),
      | SyncError::Remote(
        StoreError::Status {
          message,
          ..
        }
      ) if !message.trim().is_empty() => {
        message.clone()
      }
      | SyncError::Remote(
        StoreError::NotFound(_)
      )
      | SyncError::TaskNotFound(_) => {
        "This task no longer exists."
          .to_string()
      }
      | SyncError::Remote(_) => {
        "The task server returned an \
         unexpected response."
          .to_string()
      }
      | SyncError::Unmounted => {
        self.to_string()
      }
    }
  }
}
