//! Glue repositories and the Windows-only logging libraries.

use crate::action::Action;
use crate::config::BuildConfig;

use super::pins::{
  GFLAGS_COMMIT, GFLAGS_REPO, GLOG_COMMIT, GLOG_REPO, RENDER_RAYTRACING_COMMIT, RENDER_RAYTRACING_REPO,
  UNIRENDER_COMMIT, UNIRENDER_REPO, UTIL_OCIO_COMMIT, UTIL_OCIO_REPO,
};
use super::{Gate, Recipe, clone_and_pin, cmake_steps};

pub const RENDER_RAYTRACING_TARGET: &str = "render_raytracing";

pub fn util_ocio(cfg: &BuildConfig) -> Recipe {
  let root = cfg.external_libs_dir().join("util_ocio");
  let mut recipe = Recipe::new("util_ocio");
  recipe.prelude = clone_and_pin(UTIL_OCIO_REPO, &root, UTIL_OCIO_COMMIT);
  recipe
    .artifacts
    .include("DEPENDENCY_UTIL_OCIO_INCLUDE", root.join("include"));
  recipe
}

/// glog for Cycles' logging on Windows; Linux uses the system package.
pub fn glog(cfg: &BuildConfig) -> Recipe {
  let root = cfg.deps_dir.join("glog");
  let build = root.join("build");

  let mut actions = vec![Action::pin(&root, GLOG_COMMIT)];
  actions.extend(cmake_steps(cfg, &root, "build", Vec::new(), &[]));
  // Generated headers include these two from their own directory.
  for header in ["log_severity.h", "platform.h"] {
    actions.push(Action::copy(root.join("src/glog").join(header), build.join("glog")));
  }

  let mut recipe = Recipe::new("glog");
  recipe.prelude.push(Action::clone_repo(GLOG_REPO, &root));
  recipe.gate = Some(Gate::in_repo(&root, GLOG_COMMIT, actions));
  recipe
    .artifacts
    .include("DEPENDENCY_CYCLES_GLOG_INCLUDE", &build)
    .library(
      "DEPENDENCY_CYCLES_GLOG_LIBRARY",
      cfg.config_output_dir(&build).join(cfg.os().static_lib("glog")),
    );
  recipe
}

pub fn gflags(cfg: &BuildConfig) -> Recipe {
  let root = cfg.deps_dir.join("gflags");
  let build = root.join("build_files");

  // A plain reset without the submodule sync; gflags fails to build after a full pin.
  let mut actions = vec![Action::reset_hard(&root, Some(GFLAGS_COMMIT))];
  actions.extend(cmake_steps(cfg, &root, "build_files", Vec::new(), &[]));

  let mut recipe = Recipe::new("gflags");
  recipe.prelude.push(Action::clone_repo(GFLAGS_REPO, &root));
  recipe.gate = Some(Gate::in_repo(&root, GFLAGS_COMMIT, actions));
  recipe
    .artifacts
    .include("DEPENDENCY_GFLAGS_INCLUDE", build.join("include"))
    .library(
      "DEPENDENCY_GFLAGS_LIBRARY",
      cfg
        .config_output_dir(&build.join("lib"))
        .join(cfg.os().static_lib("gflags_static")),
    );
  recipe
}

/// Command line renderer; built by the downstream project as an extra target.
pub fn render_raytracing(cfg: &BuildConfig) -> Recipe {
  let root = cfg.tools_dir.join("render_raytracing");
  let mut recipe = Recipe::new("render_raytracing");
  recipe.prelude = clone_and_pin(RENDER_RAYTRACING_REPO, &root, RENDER_RAYTRACING_COMMIT);
  recipe.build_targets.push(RENDER_RAYTRACING_TARGET.to_string());
  recipe
}

pub fn unirender(cfg: &BuildConfig) -> Recipe {
  let root = cfg.external_libs_dir().join("util_raytracing");
  let mut recipe = Recipe::new("unirender");
  recipe.prelude = clone_and_pin(UNIRENDER_REPO, &root, UNIRENDER_COMMIT);
  recipe
    .artifacts
    .include("DEPENDENCY_UTIL_RAYTRACING_INCLUDE", root.join("include"));
  recipe
}
