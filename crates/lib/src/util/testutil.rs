//! Test utilities for unideps-lib.
//!
//! Cross-platform helpers for tests that spawn shell commands or need a real
//! git repository, plus a [`Runner`] that only records what it was asked to do.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::action::Action;
use crate::execute::{ActionStatus, ExecuteError, Runner};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to create an empty file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  ("/usr/bin/touch", vec![filename.to_string()])
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  // Use PowerShell to create an empty file - more reliable than cmd.exe approaches
  (
    "powershell.exe",
    vec![
      "-NoProfile".to_string(),
      "-Command".to_string(),
      format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
    ],
  )
}

fn git(repo: &Path, args: &[&str]) -> String {
  let output = Command::new("git")
    .args(args)
    .current_dir(repo)
    .env("GIT_AUTHOR_NAME", "unideps")
    .env("GIT_AUTHOR_EMAIL", "unideps@example.invalid")
    .env("GIT_COMMITTER_NAME", "unideps")
    .env("GIT_COMMITTER_EMAIL", "unideps@example.invalid")
    .output()
    .expect("git must be installed to run these tests");
  assert!(
    output.status.success(),
    "git {args:?} failed: {}",
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create an empty repository at `dir`.
pub fn init_repo(dir: &Path) -> PathBuf {
  std::fs::create_dir_all(dir).unwrap();
  git(dir, &["init", "--quiet"]);
  git(dir, &["config", "commit.gpgsign", "false"]);
  dir.to_path_buf()
}

/// Write `name` with `content`, commit it, and return the full commit hash.
pub fn commit_file(repo: &Path, name: &str, content: &str) -> String {
  std::fs::write(repo.join(name), content).unwrap();
  git(repo, &["add", name]);
  git(repo, &["commit", "--quiet", "-m", &format!("update {name}")]);
  git(repo, &["rev-parse", "HEAD"])
}

/// Records every action instead of executing it.
#[derive(Debug, Default)]
pub struct RecordingRunner {
  pub actions: Vec<Action>,
  fail_on: Option<fn(&Action) -> bool>,
}

impl RecordingRunner {
  /// A runner that fails the first action matching `pred`.
  pub fn failing_on(pred: fn(&Action) -> bool) -> Self {
    Self {
      actions: Vec::new(),
      fail_on: Some(pred),
    }
  }
}

impl Runner for RecordingRunner {
  async fn run(&mut self, action: &Action) -> Result<ActionStatus, ExecuteError> {
    self.actions.push(action.clone());
    if self.fail_on.is_some_and(|fail| fail(action)) {
      return Err(ExecuteError::ToolFailed {
        program: action.to_string(),
        args: Vec::new(),
        code: Some(1),
      });
    }
    Ok(ActionStatus::Ran)
  }
}
