//! CMake configure and build invocations.

use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::execute::actions::cmd::run_tool;
use crate::execute::types::ExecuteError;

/// Arguments for `cmake <source> -G <generator> <extra…>`.
pub fn configure_args(source: &Path, generator: &str, extra: &[String]) -> Vec<String> {
  let mut args = vec![
    source.to_string_lossy().into_owned(),
    "-G".to_string(),
    generator.to_string(),
  ];
  args.extend(extra.iter().cloned());
  args
}

/// Arguments for `cmake --build . --config <config> [--target …] --parallel <jobs>`.
pub fn build_args(config: &str, targets: &[String], jobs: usize) -> Vec<String> {
  let mut args = vec![
    "--build".to_string(),
    ".".to_string(),
    "--config".to_string(),
    config.to_string(),
  ];
  if !targets.is_empty() {
    args.push("--target".to_string());
    args.extend(targets.iter().cloned());
  }
  args.push("--parallel".to_string());
  args.push(jobs.to_string());
  args
}

pub async fn configure(source: &Path, build_dir: &Path, generator: &str, extra: &[String]) -> Result<(), ExecuteError> {
  fs::create_dir_all(build_dir).await?;
  let args = configure_args(source, generator, extra);
  info!(build_dir = %build_dir.display(), "configuring");
  run_tool("cmake", &args, build_dir).await
}

pub async fn build(build_dir: &Path, config: &str, targets: &[String], jobs: usize) -> Result<(), ExecuteError> {
  if !build_dir.is_dir() {
    return Err(ExecuteError::MissingAfterStep(build_dir.to_path_buf()));
  }
  let args = build_args(config, targets, jobs);
  info!(build_dir = %build_dir.display(), config, jobs, "building");
  run_tool("cmake", &args, build_dir).await
}
