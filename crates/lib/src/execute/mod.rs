//! Action execution.
//!
//! [`Runner`] is the seam between planning and side effects. The driver only
//! ever talks to a runner; [`Executor`] is the implementation that actually
//! spawns processes, downloads archives and edits files. Tests substitute a
//! runner that records actions and can be told to fail.

pub mod actions;
pub mod types;

use std::future::Future;

use tracing::debug;

use crate::action::Action;

pub use actions::execute_action;
pub use types::{ActionStatus, ExecuteError};

/// Executes actions one at a time.
pub trait Runner {
  fn run(&mut self, action: &Action) -> impl Future<Output = Result<ActionStatus, ExecuteError>>;
}

/// Runs actions for real.
#[derive(Debug, Clone)]
pub struct Executor {
  jobs: usize,
}

impl Executor {
  /// `jobs` is passed to the native build tool's `--parallel`.
  pub fn new(jobs: usize) -> Self {
    Self { jobs: jobs.max(1) }
  }
}

impl Runner for Executor {
  async fn run(&mut self, action: &Action) -> Result<ActionStatus, ExecuteError> {
    debug!(%action, "executing");
    execute_action(action, self.jobs).await
  }
}
