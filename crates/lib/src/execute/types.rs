//! Types for action execution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while executing a single action.
///
/// None of these are retried: the driver aborts on the first one.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The program could not be started at all (not installed, not on PATH).
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// An external tool exited unsuccessfully.
  #[error("'{program} {}' failed with exit code {code:?}", .args.join(" "))]
  ToolFailed {
    program: String,
    args: Vec<String>,
    code: Option<i32>,
  },

  /// HTTP request failed during an archive download.
  #[error("fetch failed for {url}: {message}")]
  FetchFailed { url: String, message: String },

  /// SHA256 hash mismatch after download.
  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  #[error("cannot unpack {url}: unsupported archive format")]
  UnsupportedArchive { url: String },

  #[error("failed to unpack {url}: {message}")]
  Extract { url: String, message: String },

  /// Opening a repository or resolving a revision failed.
  #[error("git error in {repo}: {source}")]
  Git {
    repo: PathBuf,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// HEAD does not point at the pinned revision after a pin/reset.
  #[error("{repo} is at {actual}, expected pinned revision {expected}")]
  PinDrift {
    repo: PathBuf,
    expected: String,
    actual: String,
  },

  /// A file a patch applies to does not exist.
  #[error("cannot patch {0}: file does not exist")]
  PatchTargetMissing(PathBuf),

  /// A step finished successfully but the path it should have produced is missing.
  #[error("expected {0} to exist after the previous step")]
  MissingAfterStep(PathBuf),

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Whether an action did any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
  Ran,
  /// Already satisfied (existing clone, existing download, patch already applied).
  AlreadySatisfied,
}
