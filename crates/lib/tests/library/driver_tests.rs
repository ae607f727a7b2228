//! End-to-end driver runs over the real recipe plan with a recording runner.

use tempfile::TempDir;

use unideps_lib::action::Action;
use unideps_lib::config::BuildConfig;
use unideps_lib::driver::{DriveError, Driver, GateStatus, Outcome, gate_status};
use unideps_lib::recipe::plan;

use super::common::{Recorder, config};

fn source_build_config(root: &std::path::Path) -> BuildConfig {
  let mut cfg = config(root);
  cfg.build_cycles = true;
  cfg.prebuilt_dependencies = false;
  cfg
}

#[tokio::test]
async fn second_run_only_repeats_preludes() {
  let temp = TempDir::new().unwrap();
  let cfg = source_build_config(temp.path());
  let recipes = plan(&cfg);

  let mut first = Driver::new(cfg.clone(), Recorder::default());
  let report = first.run(&recipes).await.unwrap();
  for name in ["oidn", "opencolorio", "opensubdiv", "cycles"] {
    assert_eq!(report.outcome(name), Some(Outcome::Built), "{name}");
  }

  let mut second = Driver::new(cfg, Recorder::default());
  let report = second.run(&recipes).await.unwrap();
  for name in ["oidn", "opencolorio", "opensubdiv", "cycles"] {
    assert_eq!(report.outcome(name), Some(Outcome::Skipped), "{name}");
  }

  let preludes: Vec<Action> = recipes.iter().flat_map(|r| r.prelude.iter().cloned()).collect();
  assert_eq!(second.runner().actions, preludes);

  let gated_work = recipes
    .iter()
    .filter_map(|r| r.gate.as_ref())
    .flat_map(|g| g.actions.iter())
    .filter(|a| a.is_fetch_or_build())
    .count();
  assert!(gated_work > 0);
  let second_work: Vec<&Action> = second.runner().actions.iter().filter(|a| a.is_fetch_or_build()).collect();
  let prelude_work: Vec<&Action> = preludes.iter().filter(|a| a.is_fetch_or_build()).collect();
  assert_eq!(second_work, prelude_work);
}

#[tokio::test]
async fn bumped_pin_rebuilds_only_that_dependency() {
  let temp = TempDir::new().unwrap();
  let cfg = source_build_config(temp.path());
  let mut recipes = plan(&cfg);

  Driver::new(cfg.clone(), Recorder::default()).run(&recipes).await.unwrap();

  let oidn = recipes.iter_mut().find(|r| r.name == "oidn").unwrap();
  oidn.gate.as_mut().unwrap().target = "0123456789abcdef0123456789abcdef01234567".to_string();
  assert!(matches!(gate_status(oidn).await.unwrap(), Some(GateStatus::Stale { .. })));

  let report = Driver::new(cfg, Recorder::default()).run(&recipes).await.unwrap();
  assert_eq!(report.outcome("oidn"), Some(Outcome::Built));
  assert_eq!(report.outcome("cycles"), Some(Outcome::Skipped));
}

#[tokio::test]
async fn failed_build_leaves_marker_and_stops() {
  let temp = TempDir::new().unwrap();
  let cfg = source_build_config(temp.path());
  let recipes = plan(&cfg);

  let recorder = Recorder {
    fail_on: Some("--target OpenImageDenoise".to_string()),
    ..Recorder::default()
  };
  let mut driver = Driver::new(cfg.clone(), recorder);
  let err = driver.run(&recipes).await.unwrap_err();
  match err {
    DriveError::Step { recipe, .. } => assert_eq!(recipe, "oidn"),
    other => panic!("unexpected error: {other}"),
  }

  let oidn = recipes.iter().find(|r| r.name == "oidn").unwrap();
  assert_eq!(gate_status(oidn).await.unwrap(), Some(GateStatus::NeverBuilt));
  assert!(!driver.runner().actions.iter().any(|a| a.to_string().contains("opencolorio")));

  // The next run picks up where the failure left off.
  let report = Driver::new(cfg, Recorder::default()).run(&recipes).await.unwrap();
  assert_eq!(report.outcome("oidn"), Some(Outcome::Built));
}

#[tokio::test]
async fn registry_carries_cycles_flag_and_targets() {
  let temp = TempDir::new().unwrap();
  let cfg = source_build_config(temp.path());

  let report = Driver::new(cfg.clone(), Recorder::default())
    .run(&plan(&cfg))
    .await
    .unwrap();

  let args = report.registry.cmake_args();
  assert_eq!(args[0], "-DPR_UNIRENDER_WITH_CYCLES=1");
  assert!(args.iter().any(|a| a.starts_with("-DDEPENDENCY_OPENIMAGEDENOISE_INCLUDE=")));
  assert!(args.iter().any(|a| a.starts_with("-DDEPENDENCY_UTIL_RAYTRACING_INCLUDE=")));
  assert_eq!(report.registry.build_targets, ["UniRender_cycles", "render_raytracing"]);
  // Nothing was really built, so every artifact is reported missing.
  assert!(report.warnings.iter().any(|w| w.starts_with("missing artifact")));
}

#[tokio::test]
async fn strict_run_fails_on_missing_artifacts() {
  let temp = TempDir::new().unwrap();
  let cfg = config(temp.path());

  let err = Driver::new(cfg.clone(), Recorder::default())
    .strict(true)
    .run(&plan(&cfg))
    .await
    .unwrap_err();
  assert!(matches!(err, DriveError::MissingArtifacts { .. }));
}

#[tokio::test]
async fn prebuilt_configuration_has_no_cycles_flag() {
  let temp = TempDir::new().unwrap();
  let cfg = config(temp.path());

  let report = Driver::new(cfg.clone(), Recorder::default())
    .run(&plan(&cfg))
    .await
    .unwrap();

  assert!(report.registry.flags.is_empty());
  assert!(report.registry.build_targets.is_empty());
  assert_eq!(report.outcome("cycles-dependencies"), Some(Outcome::Built));
  assert_eq!(report.outcome("cycles-prebuilt"), Some(Outcome::Ungated));
}
