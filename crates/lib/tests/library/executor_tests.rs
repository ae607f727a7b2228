//! The real executor against local git repositories and files. Requires `git` on PATH.

use tempfile::TempDir;

use unideps_lib::action::Action;
use unideps_lib::driver::{DriveError, Driver, Outcome};
use unideps_lib::execute::{ActionStatus, ExecuteError, Executor, Runner};
use unideps_lib::recipe::{Gate, Recipe};

use super::common::{config, head, upstream};

#[tokio::test]
async fn clone_then_pin_to_older_commit() {
  let temp = TempDir::new().unwrap();
  let (origin, commits) = upstream(temp.path(), &[("a.txt", "one"), ("b.txt", "two")]);
  let dest = temp.path().join("deps").join("clone");
  let url = origin.to_string_lossy().into_owned();

  let mut exec = Executor::new(1);
  assert_eq!(exec.run(&Action::clone_repo(&url, &dest)).await.unwrap(), ActionStatus::Ran);
  assert_eq!(
    exec.run(&Action::clone_repo(&url, &dest)).await.unwrap(),
    ActionStatus::AlreadySatisfied
  );

  exec.run(&Action::pin(&dest, &commits[0])).await.unwrap();
  assert_eq!(head(&dest), commits[0]);
  assert!(!dest.join("b.txt").exists());
}

#[tokio::test]
async fn verify_head_detects_drift() {
  let temp = TempDir::new().unwrap();
  let (origin, commits) = upstream(temp.path(), &[("a.txt", "one"), ("b.txt", "two")]);

  let mut exec = Executor::new(1);
  let verify = Action::VerifyHead {
    repo: origin.clone(),
    rev: commits[0].clone(),
  };
  let err = exec.run(&verify).await.unwrap_err();
  assert!(matches!(err, ExecuteError::PinDrift { .. }));

  exec.run(&Action::reset_hard(&origin, Some(commits[0].as_str()))).await.unwrap();
  exec.run(&verify).await.unwrap();
}

#[tokio::test]
async fn patch_applies_once() {
  let temp = TempDir::new().unwrap();
  let file = temp.path().join("CMakeLists.txt");
  std::fs::write(&file, "if(WITH_CYCLES_STANDALONE)\n  add_subdirectory(app)\nendif()\n").unwrap();

  let patch = Action::patch_once(&file, "if(WITH_CYCLES_STANDALONE)", "if(false)");
  let mut exec = Executor::new(1);
  assert_eq!(exec.run(&patch).await.unwrap(), ActionStatus::Ran);
  assert_eq!(exec.run(&patch).await.unwrap(), ActionStatus::AlreadySatisfied);

  let content = std::fs::read_to_string(&file).unwrap();
  assert_eq!(content.matches("if(false)").count(), 1);
  assert!(!content.contains("WITH_CYCLES_STANDALONE"));
}

#[tokio::test]
async fn unconditional_patch_ignores_unrelated_replacement_text() {
  let temp = TempDir::new().unwrap();
  let file = temp.path().join("CMakeLists.txt");
  std::fs::write(
    &file,
    "if(false)\n  add_subdirectory(legacy)\nendif()\nif(WITH_CYCLES_STANDALONE)\n  add_subdirectory(app)\nendif()\n",
  )
  .unwrap();

  let patch = Action::ReplaceText {
    file: file.clone(),
    from: "if(WITH_CYCLES_STANDALONE)".into(),
    to: "if(false)".into(),
    unless_contains: None,
  };
  let mut exec = Executor::new(1);
  assert_eq!(exec.run(&patch).await.unwrap(), ActionStatus::Ran);
  assert_eq!(exec.run(&patch).await.unwrap(), ActionStatus::AlreadySatisfied);

  let content = std::fs::read_to_string(&file).unwrap();
  assert_eq!(content.matches("if(false)").count(), 2);
  assert!(!content.contains("WITH_CYCLES_STANDALONE"));
}

#[tokio::test]
async fn patch_of_missing_file_fails() {
  let temp = TempDir::new().unwrap();
  let patch = Action::patch_once(temp.path().join("absent.cmake"), "a", "b");
  let err = Executor::new(1).run(&patch).await.unwrap_err();
  assert!(matches!(err, ExecuteError::PatchTargetMissing(_)));
}

#[tokio::test]
async fn gated_recipe_builds_once_per_revision() {
  let temp = TempDir::new().unwrap();
  let (origin, commits) = upstream(temp.path(), &[("a.txt", "one"), ("b.txt", "two")]);
  let cfg = config(temp.path());
  let repo = cfg.deps_dir.join("dep");
  let url = origin.to_string_lossy().into_owned();

  let recipe_at = |rev: &str| {
    let mut recipe = Recipe::new("dep");
    recipe.prelude.push(Action::clone_repo(&url, &repo));
    recipe.gate = Some(Gate::in_repo(
      &repo,
      rev,
      vec![Action::pin(&repo, rev), Action::copy(repo.join("a.txt"), repo.join("out"))],
    ));
    recipe.artifacts.library("DEPENDENCY_DEP_LIBRARY", repo.join("out").join("a.txt"));
    recipe
  };

  let first = recipe_at(&commits[0]);
  let report = Driver::new(cfg.clone(), Executor::new(1))
    .strict(true)
    .run(std::slice::from_ref(&first))
    .await
    .unwrap();
  assert_eq!(report.outcome("dep"), Some(Outcome::Built));
  assert_eq!(std::fs::read_to_string(repo.join("lastbuildsha")).unwrap(), commits[0]);

  // Removing the output does not trigger a rebuild; only the revision does.
  std::fs::remove_dir_all(repo.join("out")).unwrap();
  let report = Driver::new(cfg.clone(), Executor::new(1))
    .run(std::slice::from_ref(&first))
    .await
    .unwrap();
  assert_eq!(report.outcome("dep"), Some(Outcome::Skipped));
  assert_eq!(report.warnings.len(), 1);

  let second = recipe_at(&commits[1]);
  let report = Driver::new(cfg, Executor::new(1))
    .strict(true)
    .run(std::slice::from_ref(&second))
    .await
    .unwrap();
  assert_eq!(report.outcome("dep"), Some(Outcome::Built));
  assert_eq!(head(&repo), commits[1]);
  assert_eq!(std::fs::read_to_string(repo.join("lastbuildsha")).unwrap(), commits[1]);
}

#[tokio::test]
async fn failing_tool_is_reported_with_recipe_and_step() {
  let temp = TempDir::new().unwrap();
  let cfg = config(temp.path());
  let repo = temp.path().join("dep");
  std::fs::create_dir_all(&repo).unwrap();

  let mut recipe = Recipe::new("broken");
  recipe.gate = Some(Gate::in_repo(
    &repo,
    "abc",
    vec![Action::run("git", ["definitely-not-a-subcommand"], &repo)],
  ));

  let err = Driver::new(cfg, Executor::new(1))
    .run(std::slice::from_ref(&recipe))
    .await
    .unwrap_err();
  match err {
    DriveError::Step { recipe, action, source } => {
      assert_eq!(recipe, "broken");
      assert!(action.contains("definitely-not-a-subcommand"));
      assert!(matches!(source, ExecuteError::ToolFailed { .. }));
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(!repo.join("lastbuildsha").exists());
}
