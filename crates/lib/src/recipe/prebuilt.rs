//! Cycles dependencies taken from Blender's precompiled library repository.

use std::path::PathBuf;

use crate::action::{Action, PinMode};
use crate::config::BuildConfig;
use crate::platform::os::Os;

use super::pins::{BLENDER_LIB_PATHS, blender_libs};
use super::{Gate, Recipe};

/// Working copy of the library repository for the configured platform.
pub fn libs_root(cfg: &BuildConfig) -> PathBuf {
  cfg
    .deps_dir
    .join("cycles_dependencies")
    .join(format!("lib-{}", cfg.platform.lib_dir_name()))
}

/// Sparse checkout of only the library directories UniRender links against.
///
/// The repository holds gigabytes of binaries, so it is cloned without a
/// worktree and narrowed before the pinned commit is checked out.
pub fn cycles_dependencies(cfg: &BuildConfig) -> Recipe {
  let os = cfg.os();
  let (url, commit) = blender_libs(os);
  let root = libs_root(cfg);

  let mut recipe = Recipe::new("cycles-dependencies");
  recipe.prelude.push(Action::clone_no_checkout(url, &root));
  recipe.gate = Some(Gate::in_repo(
    &root,
    commit,
    vec![
      Action::GitSparseCheckout {
        repo: root.clone(),
        paths: BLENDER_LIB_PATHS.iter().map(|p| p.to_string()).collect(),
      },
      Action::GitPin {
        repo: root.clone(),
        rev: commit.to_string(),
        mode: PinMode::Checkout,
      },
    ],
  ));

  let oidn = root.join("openimagedenoise");
  let tbb = root.join("tbb");
  let ocio = root.join("opencolorio");
  let imath = root.join("imath");
  let oiio = root.join("openimageio");
  let osd = root.join("opensubdiv");

  let a = &mut recipe.artifacts;
  a.location("UNIRENDER_PREBUILT_BINARY_LOCATION", &root);

  a.include("DEPENDENCY_OPENIMAGEDENOISE_INCLUDE", oidn.join("include"));
  match os {
    Os::Linux => {
      a.library("DEPENDENCY_OPENIMAGEDENOISE_LIBRARY", oidn.join("lib/libOpenImageDenoise.so"))
        .library(
          "DEPENDENCY_OPENIMAGEDENOISE_CORE_LIBRARY",
          oidn.join("lib/libOpenImageDenoise_core.so.2.3.0"),
        );
    }
    Os::Windows => {
      a.library("DEPENDENCY_OPENIMAGEDENOISE_LIBRARY", oidn.join("lib/openimagedenoise.lib"))
        .library(
          "DEPENDENCY_OPENIMAGEDENOISE_CORE_LIBRARY",
          oidn.join("lib/OpenImageDenoise_core.lib"),
        );
    }
  }

  a.library("DEPENDENCY_TBB_LIBRARY", tbb.join("lib").join(os.shared_lib("tbb")));

  a.include("DEPENDENCY_OPENCOLORIO_INCLUDE", ocio.join("include"))
    .library("DEPENDENCY_OPENCOLORIO_LIBRARY", ocio.join("lib").join(os.shared_lib("OpenColorIO")));

  a.include("DEPENDENCY_IMATH_INCLUDE", imath.join("include"))
    .library("DEPENDENCY_IMATH_LIBRARY", imath.join("lib").join(os.shared_lib("Imath")));

  a.include("DEPENDENCY_OPENIMAGEIO_INCLUDE", oiio.join("include"))
    .library("DEPENDENCY_OPENIMAGEIO_LIBRARY", oiio.join("lib").join(os.shared_lib("OpenImageIO")));

  a.include("DEPENDENCY_OPENSUBDIV_INCLUDE", osd.join("include"))
    .library("DEPENDENCY_OPENSUBDIV_LIBRARY", osd.join("lib").join(os.shared_lib("osdGPU")))
    .library("DEPENDENCY_OPENSUBDIV_CPU_LIBRARY", osd.join("lib").join(os.shared_lib("osdCPU")));

  recipe
}
