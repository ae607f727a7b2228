use anyhow::Result;

use super::{GlobalArgs, load_config};
use crate::output::{print_info, print_json, print_stat};

pub fn cmd_info(global: &GlobalArgs) -> Result<()> {
  let config = load_config(global, None)?;

  if global.output.is_json() {
    return print_json(&config);
  }

  print_info(&format!("unideps v{}", env!("CARGO_PKG_VERSION")));
  print_stat("Platform", &config.platform.triple());
  print_stat("Root", &config.root_dir.display().to_string());
  print_stat("Deps", &config.deps_dir.display().to_string());
  print_stat("Install", &config.install_dir.display().to_string());
  print_stat("Tools", &config.tools_dir.display().to_string());
  print_stat("Generator", &config.generator);
  print_stat("Build config", &config.build_config);
  print_stat("Jobs", &config.jobs.to_string());
  print_stat("Python", &config.python);
  print_stat("Build Cycles", &config.builds_cycles().to_string());
  print_stat("Prebuilt dependencies", &config.prebuilt_dependencies.to_string());
  Ok(())
}
