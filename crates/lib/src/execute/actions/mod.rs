//! Action execution module.
//!
//! This module provides the dispatch logic for executing a single [`Action`].

pub mod cmake;
pub mod cmd;
pub mod fetch;
pub mod file;
pub mod git;

use crate::action::Action;
use crate::execute::types::{ActionStatus, ExecuteError};

pub use cmd::run_tool;
pub use fetch::fetch_archive;

/// Execute a single action.
///
/// # Arguments
///
/// * `action` - The action to execute
/// * `jobs` - Parallel job count handed to the native build tool
pub async fn execute_action(action: &Action, jobs: usize) -> Result<ActionStatus, ExecuteError> {
  match action {
    Action::GitClone {
      url,
      dest,
      branch,
      recurse_submodules,
      no_checkout,
    } => git::clone(url, dest, branch.as_deref(), *recurse_submodules, *no_checkout).await,

    Action::GitFetch { repo } => ran(git::fetch(repo).await),

    Action::GitReset { repo, rev } => ran(git::reset_hard(repo, rev.as_deref()).await),

    Action::GitPin { repo, rev, mode } => ran(git::pin(repo, rev, *mode).await),

    Action::GitSparseCheckout { repo, paths } => ran(git::sparse_checkout(repo, paths).await),

    Action::VerifyHead { repo, rev } => ran(git::verify_head(repo, rev)),

    Action::FetchArchive {
      url,
      dest,
      creates,
      sha256,
    } => fetch_archive(url, dest, creates.as_deref(), sha256.as_deref()).await,

    Action::ReplaceText {
      file,
      from,
      to,
      unless_contains,
    } => file::replace_text(file, from, to, unless_contains.as_deref()).await,

    Action::CopyFile { from, to_dir } => ran(file::copy_into(from, to_dir).await),

    Action::MakeDir { path } => ran(file::make_dir(path).await),

    Action::Run { program, args, cwd } => ran(run_tool(program, args, cwd).await),

    Action::CmakeConfigure {
      source,
      build_dir,
      generator,
      args,
    } => ran(cmake::configure(source, build_dir, generator, args).await),

    Action::CmakeBuild {
      build_dir,
      config,
      targets,
    } => ran(cmake::build(build_dir, config, targets, jobs).await),
  }
}

fn ran(result: Result<(), ExecuteError>) -> Result<ActionStatus, ExecuteError> {
  result.map(|()| ActionStatus::Ran)
}
