//! Cycles dependencies compiled from source.
//!
//! Used when `prebuilt_dependencies` is off. Archives are downloaded once;
//! every pinned git dependency is rebuilt only when its pin moves.

use std::path::{Path, PathBuf};

use crate::action::Action;
use crate::config::BuildConfig;
use crate::platform::os::Os;

use super::pins::{
  ISPC_VERSION, OCIO_COMMIT, OCIO_REPO, OIDN_COMMIT, OIDN_REPO, OPENSUBDIV_COMMIT, OPENSUBDIV_REPO, TBB_DIR,
  TBB_RELEASE,
};
use super::{Gate, Recipe, cmake_steps, define};

/// Every source-built dependency, in build order.
pub fn all(cfg: &BuildConfig) -> Vec<Recipe> {
  vec![
    ispc(cfg),
    tbb(cfg),
    oidn(cfg),
    opencolorio(cfg),
    openimageio(cfg),
    opensubdiv(cfg),
  ]
}

pub fn ispc_root(cfg: &BuildConfig) -> PathBuf {
  cfg.deps_dir.join(format!("ispc-{ISPC_VERSION}-{}", cfg.os()))
}

pub fn tbb_root(cfg: &BuildConfig) -> PathBuf {
  cfg.deps_dir.join(TBB_DIR)
}

fn tbb_args(cfg: &BuildConfig) -> Vec<String> {
  let tbb = tbb_root(cfg);
  vec![define("TBB_ROOT", &tbb), define("TBB_INCLUDE_DIR", tbb.join("include"))]
}

/// ISPC compiler release, needed by OIDN's kernels.
pub fn ispc(cfg: &BuildConfig) -> Recipe {
  let archive = match cfg.os() {
    Os::Linux => format!("ispc-{ISPC_VERSION}-linux.tar.gz"),
    Os::Windows => format!("ispc-{ISPC_VERSION}-windows.zip"),
  };

  let mut recipe = Recipe::new("ispc");
  recipe.prelude.push(Action::FetchArchive {
    url: format!("https://github.com/ispc/ispc/releases/download/{ISPC_VERSION}/{archive}"),
    dest: cfg.deps_dir.clone(),
    creates: Some(ispc_root(cfg)),
    sha256: None,
  });
  recipe
}

pub fn tbb(cfg: &BuildConfig) -> Recipe {
  let root = tbb_root(cfg);
  let archive = match cfg.os() {
    Os::Linux => format!("{TBB_DIR}_lin.tgz"),
    Os::Windows => format!("{TBB_DIR}_win.zip"),
  };

  let mut recipe = Recipe::new("tbb");
  recipe.prelude.push(Action::FetchArchive {
    url: format!("https://github.com/oneapi-src/oneTBB/releases/download/{TBB_RELEASE}/{archive}"),
    dest: cfg.deps_dir.clone(),
    creates: Some(root.clone()),
    sha256: None,
  });

  match cfg.os() {
    Os::Linux => {
      recipe
        .artifacts
        .library("DEPENDENCY_TBB_LIBRARY", root.join("lib/intel64/gcc4.7/libtbb.so.2"));
    }
    Os::Windows => {
      let lib_dir = root.join("lib/intel64/vc14");
      // The runtime dll has to sit next to the import library for the consumer's copy step.
      recipe
        .prelude
        .push(Action::copy(root.join("bin/intel64/vc14/tbb.dll"), &lib_dir));
      recipe.artifacts.library("DEPENDENCY_TBB_LIBRARY", lib_dir.join("tbb.lib"));
    }
  }
  recipe
}

/// Path of a library produced in `dir` of a CMake build tree.
fn built_lib(cfg: &BuildConfig, dir: &Path, file: &str) -> PathBuf {
  cfg.config_output_dir(dir).join(file)
}

pub fn oidn(cfg: &BuildConfig) -> Recipe {
  let os = cfg.os();
  let root = cfg.deps_dir.join("oidn");
  let build = root.join("build");

  let mut args = tbb_args(cfg);
  let ispc_exe = match os {
    Os::Linux => "ispc",
    Os::Windows => "ispc.exe",
  };
  args.push(define("ISPC_EXECUTABLE", ispc_root(cfg).join("bin").join(ispc_exe)));

  let mut recipe = Recipe::new("oidn");
  recipe.prelude.push(Action::clone_repo(OIDN_REPO, &root));

  let mut actions = vec![Action::pin(&root, OIDN_COMMIT)];
  actions.extend(cmake_steps(cfg, &root, "build", args, &["OpenImageDenoise"]));
  recipe.gate = Some(Gate::in_repo(&root, OIDN_COMMIT, actions));

  recipe
    .artifacts
    .include("DEPENDENCY_OPENIMAGEDENOISE_INCLUDE", root.join("include"))
    .library(
      "DEPENDENCY_OPENIMAGEDENOISE_LIBRARY",
      built_lib(cfg, &build, &os.shared_lib("OpenImageDenoise")),
    )
    .library(
      "DEPENDENCY_OPENIMAGEDENOISE_CORE_LIBRARY",
      built_lib(cfg, &build, &os.shared_lib("OpenImageDenoise_core")),
    );
  recipe
}

pub fn opencolorio(cfg: &BuildConfig) -> Recipe {
  let os = cfg.os();
  let root = cfg.deps_dir.join("OpenColorIO");

  let args = match os {
    Os::Linux => vec!["-DOCIO_BUILD_PYTHON=OFF".to_string()],
    Os::Windows => Vec::new(),
  };

  let mut recipe = Recipe::new("opencolorio");
  recipe.prelude.push(Action::clone_repo(OCIO_REPO, &root));

  let mut actions = vec![Action::pin(&root, OCIO_COMMIT)];
  actions.extend(cmake_steps(cfg, &root, "build", args, &["OpenColorIO"]));
  // The ABI header is generated at configure time but included from the source tree.
  actions.push(Action::copy(
    root.join("build/include/OpenColorIO/OpenColorABI.h"),
    root.join("include/OpenColorIO"),
  ));
  recipe.gate = Some(Gate::in_repo(&root, OCIO_COMMIT, actions));

  recipe
    .artifacts
    .include("DEPENDENCY_OPENCOLORIO_INCLUDE", root.join("include"))
    .library(
      "DEPENDENCY_OPENCOLORIO_LIBRARY",
      built_lib(cfg, &root.join("build/src/OpenColorIO"), &os.shared_lib("OpenColorIO")),
    );
  recipe
}

/// OpenImageIO through vcpkg, which resolves its long tail of image-format libraries.
pub fn openimageio(cfg: &BuildConfig) -> Recipe {
  let os = cfg.os();
  let triplet = cfg.platform.vcpkg_triplet();
  let vcpkg = cfg.vcpkg_root.join(match os {
    Os::Linux => "vcpkg",
    Os::Windows => "vcpkg.exe",
  });

  let args = match os {
    Os::Linux => vec![
      "install".to_string(),
      format!("openimageio:{triplet}"),
      format!("--overlay-triplets={}", cfg.vcpkg_root.join("triplets").join("community").display()),
    ],
    Os::Windows => vec!["install".to_string(), "openimageio".to_string()],
  };

  let installed = cfg.vcpkg_root.join("installed").join(&triplet);

  let mut recipe = Recipe::new("openimageio");
  recipe
    .prelude
    .push(Action::run(&vcpkg.to_string_lossy(), args, &cfg.vcpkg_root));
  recipe
    .artifacts
    .include("DEPENDENCY_OPENIMAGEIO_INCLUDE", installed.join("include"))
    .library(
      "DEPENDENCY_OPENIMAGEIO_LIBRARY",
      installed.join("lib").join(os.shared_lib("OpenImageIO")),
    );
  recipe
}

pub fn opensubdiv(cfg: &BuildConfig) -> Recipe {
  let os = cfg.os();
  let root = cfg.deps_dir.join("OpenSubdiv");

  let mut args = tbb_args(cfg);
  args.extend(
    [
      "NO_PTEX", "NO_DOC", "NO_OMP", "NO_TBB", "NO_CUDA", "NO_OPENCL", "NO_CLEW", "NO_EXAMPLES", "NO_DX",
    ]
    .iter()
    .map(|opt| format!("-D{opt}=1")),
  );

  let mut recipe = Recipe::new("opensubdiv");
  recipe.prelude.push(Action::clone_repo(OPENSUBDIV_REPO, &root));

  let mut actions = vec![Action::pin(&root, OPENSUBDIV_COMMIT)];
  actions.extend(cmake_steps(
    cfg,
    &root,
    "build",
    args,
    &["osd_static_cpu", "osd_static_gpu"],
  ));
  recipe.gate = Some(Gate::in_repo(&root, OPENSUBDIV_COMMIT, actions));

  let lib_dir = root.join("build/lib");
  recipe
    .artifacts
    .include("DEPENDENCY_OPENSUBDIV_INCLUDE", &root)
    .library(
      "DEPENDENCY_OPENSUBDIV_LIBRARY",
      built_lib(cfg, &lib_dir, &os.static_lib("osdGPU")),
    )
    .library(
      "DEPENDENCY_OPENSUBDIV_CPU_LIBRARY",
      built_lib(cfg, &lib_dir, &os.static_lib("osdCPU")),
    );
  recipe
}
