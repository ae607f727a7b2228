//! Post-run sanity checks on generated files.
//!
//! A failed check never fails the run; it becomes a warning in the report.

use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
  pub file: PathBuf,
  /// Text whose presence in `file` triggers the warning.
  pub needle: String,
  pub warning: String,
}

impl Check {
  pub fn warn_if_contains(file: &Path, needle: &str, warning: &str) -> Self {
    Self {
      file: file.to_path_buf(),
      needle: needle.to_string(),
      warning: warning.to_string(),
    }
  }

  /// The warning to report, if any.
  pub async fn evaluate(&self) -> Option<String> {
    match tokio::fs::read_to_string(&self.file).await {
      Ok(content) if content.contains(&self.needle) => Some(self.warning.clone()),
      Ok(_) => None,
      Err(e) => Some(format!("could not read {}: {e}", self.file.display())),
    }
  }
}
