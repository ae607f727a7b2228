//! Version-control actions.
//!
//! Mutating operations (clone, fetch, reset, checkout, sparse checkout) shell out
//! to `git` so they behave exactly like the upstream build instructions expect.
//! Read-only lookups (HEAD, "is this revision present") go through `gix`, which
//! avoids spawning a process just to parse `rev-parse` output.

use std::path::Path;

use tracing::{debug, info};

use crate::action::PinMode;
use crate::execute::actions::cmd::run_tool;
use crate::execute::types::{ActionStatus, ExecuteError};

fn git_args<I, S>(args: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  args.into_iter().map(Into::into).collect()
}

/// Clone `url` into `dest` unless `dest` already exists.
pub async fn clone(
  url: &str,
  dest: &Path,
  branch: Option<&str>,
  recurse_submodules: bool,
  no_checkout: bool,
) -> Result<ActionStatus, ExecuteError> {
  if dest.exists() {
    debug!(dest = %dest.display(), "working copy already present, not cloning");
    return Ok(ActionStatus::AlreadySatisfied);
  }

  info!(url, dest = %dest.display(), "not found, cloning");

  let parent = match dest.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  tokio::fs::create_dir_all(parent).await?;

  let mut args = git_args(["clone"]);
  if recurse_submodules {
    args.push("--recurse-submodules".into());
  }
  if no_checkout {
    args.push("--no-checkout".into());
  }
  if let Some(branch) = branch {
    args.extend(git_args(["-b", branch]));
  }
  args.push(url.to_string());
  args.push(dest.to_string_lossy().into_owned());

  run_tool("git", &args, parent).await?;

  if !dest.exists() {
    return Err(ExecuteError::MissingAfterStep(dest.to_path_buf()));
  }
  Ok(ActionStatus::Ran)
}

pub async fn fetch(repo: &Path) -> Result<(), ExecuteError> {
  run_tool("git", &git_args(["fetch"]), repo).await
}

/// `git reset --hard [rev]`.
pub async fn reset_hard(repo: &Path, rev: Option<&str>) -> Result<(), ExecuteError> {
  let mut args = git_args(["reset", "--hard"]);
  if let Some(rev) = rev {
    args.push(rev.to_string());
  }
  run_tool("git", &args, repo).await
}

pub async fn sparse_checkout(repo: &Path, paths: &[String]) -> Result<(), ExecuteError> {
  let mut args = git_args(["sparse-checkout", "set"]);
  args.extend(paths.iter().cloned());
  run_tool("git", &args, repo).await
}

/// Move `repo` to `rev`.
///
/// The remote is only contacted when `rev` is not already known locally, so
/// re-pinning an up-to-date checkout works offline.
pub async fn pin(repo: &Path, rev: &str, mode: PinMode) -> Result<(), ExecuteError> {
  if has_revision(repo, rev)? {
    debug!(repo = %repo.display(), rev, "revision present locally");
  } else {
    info!(repo = %repo.display(), rev, "revision not present locally, fetching");
    fetch(repo).await?;
  }

  match mode {
    PinMode::HardReset => {
      reset_hard(repo, Some(rev)).await?;
      if repo.join(".gitmodules").exists() {
        run_tool("git", &git_args(["submodule", "update", "--init", "--recursive"]), repo).await?;
      }
    }
    PinMode::Checkout => {
      run_tool("git", &git_args(["checkout", rev]), repo).await?;
    }
  }
  Ok(())
}

/// Fail with [`ExecuteError::PinDrift`] unless HEAD is the commit `rev` names.
pub fn verify_head(repo: &Path, rev: &str) -> Result<(), ExecuteError> {
  let git = open(repo)?;
  let head = git.head_id().map_err(|e| git_err(repo, e))?.detach();
  let expected = git
    .rev_parse_single(format!("{rev}^{{commit}}").as_str())
    .map_err(|e| git_err(repo, e))?
    .detach();

  if head != expected {
    return Err(ExecuteError::PinDrift {
      repo: repo.to_path_buf(),
      expected: rev.to_string(),
      actual: head.to_string(),
    });
  }
  debug!(repo = %repo.display(), rev, "HEAD matches pinned revision");
  Ok(())
}

/// Whether `rev` resolves to a commit in the local object database.
pub fn has_revision(repo: &Path, rev: &str) -> Result<bool, ExecuteError> {
  let git = open(repo)?;
  Ok(git.rev_parse_single(format!("{rev}^{{commit}}").as_str()).is_ok())
}

fn open(repo: &Path) -> Result<gix::Repository, ExecuteError> {
  gix::open(repo).map_err(|e| git_err(repo, e))
}

fn git_err(repo: &Path, e: impl std::error::Error + Send + Sync + 'static) -> ExecuteError {
  ExecuteError::Git {
    repo: repo.to_path_buf(),
    source: Box::new(e),
  }
}
