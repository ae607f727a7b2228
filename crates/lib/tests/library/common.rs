//! Shared helpers for library integration tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use unideps_lib::action::Action;
use unideps_lib::config::{BuildConfig, ConfigLayer};
use unideps_lib::execute::{ActionStatus, ExecuteError, Runner};
use unideps_lib::platform::Platform;
use unideps_lib::platform::arch::Arch;
use unideps_lib::platform::os::Os;

/// Linux x86_64 configuration rooted at `root`.
pub fn config(root: &Path) -> BuildConfig {
  let layer = ConfigLayer {
    root_dir: Some(root.to_path_buf()),
    ..ConfigLayer::default()
  };
  BuildConfig::resolve(layer, Platform::new(Arch::X86_64, Os::Linux), root).unwrap()
}

/// Records every action and succeeds, unless the action's display text contains `fail_on`.
#[derive(Default)]
pub struct Recorder {
  pub actions: Vec<Action>,
  pub fail_on: Option<String>,
}

impl Runner for Recorder {
  async fn run(&mut self, action: &Action) -> Result<ActionStatus, ExecuteError> {
    self.actions.push(action.clone());
    match &self.fail_on {
      Some(needle) if action.to_string().contains(needle.as_str()) => Err(ExecuteError::ToolFailed {
        program: "recorder".to_string(),
        args: vec![action.to_string()],
        code: Some(1),
      }),
      _ => Ok(ActionStatus::Ran),
    }
  }
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
    .unwrap();
  assert!(
    output.status.success(),
    "git {args:?} failed: {}",
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Create an upstream repository with one commit per `(file, content)` and return
/// its path and the commit hashes in order.
pub fn upstream(dir: &Path, commits: &[(&str, &str)]) -> (PathBuf, Vec<String>) {
  let repo = dir.join("upstream");
  std::fs::create_dir_all(&repo).unwrap();
  git(&repo, &["init", "-q"]);
  git(&repo, &["config", "commit.gpgsign", "false"]);

  let mut hashes = Vec::new();
  for (file, content) in commits {
    std::fs::write(repo.join(file), content).unwrap();
    git(&repo, &["add", file]);
    git(&repo, &["commit", "-q", "-m", file]);
    hashes.push(git(&repo, &["rev-parse", "HEAD"]));
  }
  (repo, hashes)
}

pub fn head(repo: &Path) -> String {
  git(repo, &["rev-parse", "HEAD"])
}
