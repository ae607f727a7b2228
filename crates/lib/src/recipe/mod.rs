//! Dependency recipes.
//!
//! A [`Recipe`] describes one dependency: the actions that always run (clone,
//! download, pin), an optional revision-gated block (patch, configure, build),
//! and the artifacts it registers for the downstream build. Recipes are pure
//! data computed from a [`BuildConfig`]; nothing touches the filesystem until
//! the [`Driver`](crate::driver::Driver) runs them.

pub mod cycles;
pub mod extras;
pub mod pins;
pub mod prebuilt;
pub mod source;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::action::Action;
use crate::artifacts::Artifacts;
use crate::checks::Check;
use crate::config::BuildConfig;
use crate::marker::BuildMarker;

/// The revision-gated part of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gate {
  /// Pinned revision the marker is compared against.
  pub target: String,
  /// Marker file recording the last successful build.
  pub marker: PathBuf,
  pub actions: Vec<Action>,
}

impl Gate {
  /// Gate using the default marker file inside `repo`.
  pub fn in_repo(repo: &Path, target: &str, actions: Vec<Action>) -> Self {
    Self {
      target: target.to_string(),
      marker: BuildMarker::in_dir(repo).path().to_path_buf(),
      actions,
    }
  }

  pub fn marker(&self) -> BuildMarker {
    BuildMarker::new(&self.marker)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recipe {
  pub name: String,
  /// Always executed, before the gate.
  pub prelude: Vec<Action>,
  pub gate: Option<Gate>,
  pub artifacts: Artifacts,
  /// Extra flags for the downstream configure step.
  pub flags: Vec<String>,
  /// Extra targets the downstream build must build.
  pub build_targets: Vec<String>,
  /// Post-run sanity checks; failures become warnings.
  pub checks: Vec<Check>,
}

impl Recipe {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      ..Self::default()
    }
  }

  /// Every action in execution order, gated ones included.
  pub fn all_actions(&self) -> impl Iterator<Item = &Action> {
    self
      .prelude
      .iter()
      .chain(self.gate.iter().flat_map(|g| g.actions.iter()))
  }
}

/// Clone a repository if missing and pin it; nothing is built.
pub(crate) fn clone_and_pin(url: &str, dest: &Path, rev: &str) -> Vec<Action> {
  vec![Action::clone_repo(url, dest), Action::pin(dest, rev)]
}

/// Configure and build a CMake project in `<src>/<build_dir_name>`.
pub(crate) fn cmake_steps(
  cfg: &BuildConfig,
  src: &Path,
  build_dir_name: &str,
  configure_args: Vec<String>,
  targets: &[&str],
) -> Vec<Action> {
  let build_dir = src.join(build_dir_name);
  vec![
    Action::MakeDir {
      path: build_dir.clone(),
    },
    Action::CmakeConfigure {
      source: src.to_path_buf(),
      build_dir: build_dir.clone(),
      generator: cfg.generator.clone(),
      args: configure_args,
    },
    Action::CmakeBuild {
      build_dir,
      config: cfg.build_config.clone(),
      targets: targets.iter().map(|t| t.to_string()).collect(),
    },
  ]
}

/// `-D<name>=<path>` for configure arguments.
pub(crate) fn define(name: &str, path: impl AsRef<Path>) -> String {
  format!("-D{name}={}", path.as_ref().display())
}

/// The full, ordered list of recipes for this configuration.
pub fn plan(cfg: &BuildConfig) -> Vec<Recipe> {
  let mut recipes = if cfg.prebuilt_dependencies {
    vec![prebuilt::cycles_dependencies(cfg)]
  } else {
    source::all(cfg)
  };

  recipes.push(if cfg.builds_cycles() {
    cycles::build(cfg)
  } else {
    cycles::prebuilt_bundle(cfg)
  });

  recipes.push(extras::util_ocio(cfg));
  if cfg.platform.is_windows() {
    recipes.push(extras::glog(cfg));
    recipes.push(extras::gflags(cfg));
  }
  if cfg.builds_cycles() {
    recipes.push(extras::render_raytracing(cfg));
  }
  recipes.push(extras::unirender(cfg));

  recipes
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::path::Path;

  use crate::config::{BuildConfig, ConfigLayer};
  use crate::platform::Platform;
  use crate::platform::arch::Arch;
  use crate::platform::os::Os;

  pub fn config(os: Os, layer: ConfigLayer) -> BuildConfig {
    BuildConfig::resolve(layer, Platform::new(Arch::X86_64, os), Path::new("/proj")).unwrap()
  }
}
