mod build;
mod info;
mod plan;
mod status;

pub use build::cmd_build;
pub use info::cmd_info;
pub use plan::cmd_plan;
pub use status::cmd_status;

use std::path::PathBuf;

use anyhow::{Context, Result};

use unideps_lib::config::{BuildConfig, ConfigLayer};
use unideps_lib::platform::Platform;
use unideps_lib::platform::arch::Arch;
use unideps_lib::platform::os::Os;

use crate::ModeArgs;
use crate::output::OutputFormat;

/// Options every command receives.
pub struct GlobalArgs {
  pub config: Option<PathBuf>,
  pub root: Option<PathBuf>,
  pub modes: ModeArgs,
  pub output: OutputFormat,
}

impl ModeArgs {
  /// The command-line configuration layer.
  fn to_layer(&self) -> ConfigLayer {
    ConfigLayer {
      deps_dir: self.deps_dir.clone(),
      install_dir: self.install_dir.clone(),
      generator: self.generator.clone(),
      build_config: self.build_config.clone(),
      jobs: self.jobs,
      build_cycles: self.build_cycles,
      build_all: self.build_all.then_some(true),
      prebuilt_dependencies: self.source_deps.then_some(false),
      ..ConfigLayer::default()
    }
  }
}

/// Resolve the configuration from defaults, config file, environment and flags.
///
/// `os` overrides the detected operating system (for planning another platform).
pub fn load_config(global: &GlobalArgs, os: Option<Os>) -> Result<BuildConfig> {
  let cwd = std::env::current_dir().context("Failed to determine current directory")?;

  let env = ConfigLayer::from_env().context("Invalid UNIDEPS_* environment variable")?;
  let cli = ConfigLayer {
    root_dir: global.root.clone(),
    ..global.modes.to_layer()
  };

  // The root decides where unideps.toml is looked up, so it is resolved first.
  let root = cli
    .root_dir
    .clone()
    .or_else(|| env.root_dir.clone())
    .map(|r| cwd.join(r))
    .unwrap_or_else(|| cwd.clone());
  let file = ConfigLayer::discover(&root, global.config.as_deref())
    .with_context(|| format!("Failed to load config for {}", root.display()))?;

  let platform = match (Platform::current(), os) {
    (Some(current), Some(os)) => Platform::new(current.arch, os),
    (Some(current), None) => current,
    (None, Some(os)) => Platform::new(Arch::X86_64, os),
    (None, None) => anyhow::bail!("Unsupported host platform; pass --platform to plan for a supported one"),
  };

  BuildConfig::resolve(file.merge(env).merge(cli), platform, &cwd).context("Invalid configuration")
}
