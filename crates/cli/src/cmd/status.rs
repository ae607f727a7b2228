//! Status command implementation.
//!
//! Reads every gated recipe's build marker and reports whether the dependency
//! was built at its pinned revision.

use anyhow::{Context, Result};
use serde::Serialize;

use unideps_lib::driver::{GateStatus, gate_status};
use unideps_lib::recipe::plan;

use super::{GlobalArgs, load_config};
use crate::output::{print_error, print_info, print_json, print_skipped, print_success, print_warning, truncate_hash};

#[derive(Serialize)]
struct Entry<'a> {
  name: &'a str,
  target: &'a str,
  #[serde(flatten)]
  status: GateStatus,
}

pub fn cmd_status(global: &GlobalArgs) -> Result<()> {
  let config = load_config(global, None)?;
  let recipes = plan(&config);
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;

  let mut entries = Vec::new();
  for recipe in &recipes {
    let status = match rt.block_on(gate_status(recipe)) {
      Ok(Some(status)) => status,
      Ok(None) => continue,
      Err(e) => {
        print_error(&format!("Error reading build marker of {}: {}", recipe.name, e));
        return Err(e.into());
      }
    };
    let target = recipe.gate.as_ref().map_or("", |g| g.target.as_str());
    entries.push(Entry {
      name: &recipe.name,
      target,
      status,
    });
  }

  if global.output.is_json() {
    return print_json(&entries);
  }

  if entries.is_empty() {
    print_info("No gated dependencies in this configuration.");
    return Ok(());
  }

  for entry in &entries {
    match &entry.status {
      GateStatus::UpToDate => print_success(&format!("{}: up to date ({})", entry.name, truncate_hash(entry.target))),
      GateStatus::NeverBuilt => print_skipped(&format!("{}: never built", entry.name)),
      GateStatus::Stale { last } => print_warning(&format!(
        "{}: stale (built {}, pinned {})",
        entry.name,
        truncate_hash(last),
        truncate_hash(entry.target)
      )),
    }
  }
  Ok(())
}
