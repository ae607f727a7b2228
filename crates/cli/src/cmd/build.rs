//! Implementation of the `unideps build` command.
//!
//! Runs every recipe in order, writes the artifact registry into the deps
//! directory and prints the CMake arguments for the downstream project.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use unideps_lib::consts::REGISTRY_FILENAME;
use unideps_lib::driver::{Driver, Outcome};
use unideps_lib::execute::Executor;
use unideps_lib::recipe::plan;

use super::{GlobalArgs, load_config};
use crate::output::{format_duration, print_info, print_json, print_skipped, print_stat, print_success, print_warning};

pub fn cmd_build(global: &GlobalArgs, strict: bool) -> Result<()> {
  let config = load_config(global, None)?;
  let recipes = plan(&config);
  let started = Instant::now();

  // Strictly sequential: one external process at a time.
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;

  let mut driver = Driver::new(config.clone(), Executor::new(config.jobs)).strict(strict);
  let report = rt.block_on(driver.run(&recipes)).context("Build failed")?;

  let registry_path = config.deps_dir.join(REGISTRY_FILENAME);
  report
    .registry
    .save(&registry_path)
    .with_context(|| format!("Failed to write registry: {}", registry_path.display()))?;
  info!(path = %registry_path.display(), "registry saved");

  if global.output.is_json() {
    return print_json(&report);
  }

  for recipe in &report.recipes {
    match recipe.outcome {
      Outcome::Built => print_success(&format!("{} built", recipe.name)),
      Outcome::Skipped => print_skipped(&format!("{} up to date", recipe.name)),
      Outcome::Ungated => print_success(&recipe.name),
    }
  }
  for warning in &report.warnings {
    print_warning(warning);
  }

  println!();
  print_info(&format!("Completed in {}", format_duration(started.elapsed())));
  print_stat("Registry", &registry_path.display().to_string());
  if !report.registry.build_targets.is_empty() {
    print_stat("Additional build targets", &report.registry.build_targets.join(" "));
  }

  println!();
  println!("CMake arguments:");
  for arg in report.registry.cmake_args() {
    println!("  {arg}");
  }
  Ok(())
}
