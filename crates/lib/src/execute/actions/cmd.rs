//! External tool invocation.
//!
//! Tools inherit stdout/stderr so their own console output is what the user
//! sees while a dependency builds. Exactly one process runs at a time and there
//! is no timeout: a hung tool hangs the run.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::types::ExecuteError;

/// Run `program` with `args` in `cwd` and wait for it.
///
/// A non-zero exit is returned as [`ExecuteError::ToolFailed`].
pub async fn run_tool(program: &str, args: &[String], cwd: &Path) -> Result<(), ExecuteError> {
  info!(program, args = %args.join(" "), cwd = %cwd.display(), "running");

  let status = Command::new(program)
    .args(args)
    .current_dir(cwd)
    .status()
    .await
    .map_err(|source| ExecuteError::Spawn {
      program: program.to_string(),
      source,
    })?;

  if !status.success() {
    return Err(ExecuteError::ToolFailed {
      program: program.to_string(),
      args: args.to_vec(),
      code: status.code(),
    });
  }

  debug!(program, "finished");
  Ok(())
}
