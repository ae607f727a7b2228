//! The Cycles renderer, either compiled from the pinned fork or taken from a
//! prebuilt bundle.

use std::path::PathBuf;

use crate::action::{Action, update_then_pin};
use crate::checks::Check;
use crate::config::BuildConfig;
use crate::platform::os::Os;

use super::pins::{CYCLES_BUNDLE_URL, CYCLES_COMMIT, CYCLES_REPO};
use super::{Gate, Recipe, cmake_steps, define};

pub const WITH_CYCLES_FLAG: &str = "-DPR_UNIRENDER_WITH_CYCLES=1";
pub const CYCLES_TARGET: &str = "UniRender_cycles";

/// Libraries from the Cycles library tree: variable, Linux path, Windows path.
///
/// Paths are relative to [`BuildConfig::cycles_deps_root`].
const CYCLES_LIBRARIES: &[(&str, &str, &str)] = &[
  ("DEPENDENCY_CYCLES_TBB_LIBRARY", "tbb/lib/libtbb.so", "tbb/lib/tbb.lib"),
  ("DEPENDENCY_CYCLES_EMBREE_LIBRARY", "embree/lib/libembree4.so", "embree/lib/embree4.lib"),
  (
    "DEPENDENCY_CYCLES_OPENCOLORIO_LIBRARY",
    "opencolorio/lib/libOpenColorIO.so",
    "opencolorio/lib/OpenColorIO.lib",
  ),
  (
    "DEPENDENCY_CYCLES_OPENIMAGEIO_LIBRARY",
    "OpenImageIO/lib/libOpenImageIO.so",
    "OpenImageIO/lib/OpenImageIO.lib",
  ),
  (
    "DEPENDENCY_CYCLES_OPENIMAGEDENOISE_LIBRARY",
    "openimagedenoise/lib/libopenimagedenoise.so",
    "openimagedenoise/lib/openimagedenoise.lib",
  ),
  ("DEPENDENCY_CYCLES_IMATH_LIBRARY", "imath/lib/libimath.so", "imath/lib/imath.lib"),
  ("DEPENDENCY_JPEG_LIBRARY", "jpeg/build/libjpeg.a", "jpeg/lib/libjpeg.lib"),
  ("DEPENDENCY_TIFF_LIBRARY", "tiff/build/libtiff/libtiff.so", "tiff/lib/libtiff.lib"),
  ("DEPENDENCY_CYCLES_LPNG_LIBRARY", "png/lib/libpng.a", "png/lib/libpng.lib"),
  (
    "DEPENDENCY_OPENEXR_IMATH_LIBRARY",
    "Imath/build/src/Imath/libImath-3_1.so",
    "imath/lib/Imath.lib",
  ),
  ("DEPENDENCY_OPENEXR_UTIL_LIBRARY", "openexr/lib/libOpenEXR.so", "openexr/lib/OpenEXRUtil_s.lib"),
  (
    "DEPENDENCY_OPENEXR_ILMTHREAD_LIBRARY",
    "openexr/lib/libIlmThread.so",
    "openexr/lib/IlmThread_s.lib",
  ),
  ("DEPENDENCY_OPENEXR_IEX_LIBRARY", "openexr/lib/libIex.so", "openexr/lib/Iex_s.lib"),
  (
    "DEPENDENCY_OPENIMAGEDENOISE_LIBRARY",
    "openimagedenoise/lib/libopenimagedenoise.so",
    "openimagedenoise/lib/openimagedenoise.lib",
  ),
  (
    "DEPENDENCY_OPENIMAGEDENOISE_CORE_LIBRARY",
    "openimagedenoise/lib/libOpenImageDenoise_core.so",
    "openimagedenoise/lib/openimagedenoise_core.lib",
  ),
];

/// OIIO and OIDN roots inside the Cycles library tree; the directory names differ per platform.
fn oiio_oidn_roots(cfg: &BuildConfig) -> (PathBuf, PathBuf) {
  let deps = cfg.cycles_deps_root();
  match cfg.os() {
    Os::Linux => (deps.join("oiio"), deps.join("oidn")),
    Os::Windows => (deps.join("openimageio"), deps.join("openimagedenoise")),
  }
}

/// Source patches and the `make_update.py` run that differ per platform.
fn prepare(cfg: &BuildConfig) -> Vec<Action> {
  let root = cfg.cycles_root();
  let make_update = root.join("src/cmake/make_update.py").to_string_lossy().into_owned();

  let mut actions = vec![Action::GitFetch { repo: root.clone() }];
  let update_flag = match cfg.os() {
    Os::Windows => "--no-cycles",
    Os::Linux => "--no-libraries",
  };
  // Drop patches from earlier pins.
  actions.push(Action::reset_hard(&root, Some(CYCLES_COMMIT)));
  // make_update.py always pulls the latest Cycles.
  actions.extend(update_then_pin(
    Action::run(&cfg.python, [make_update.as_str(), update_flag], &root),
    &root,
    CYCLES_COMMIT,
  ));

  match cfg.os() {
    Os::Windows => {
      actions.push(Action::patch_once(
        root.join("CMakeLists.txt"),
        r#""Build Cycles Hydra render delegate" ON"#,
        r#""Build Cycles Hydra render delegate" OFF"#,
      ));
      // Cycles does not link OpenImageIO itself although OpenColorIO needs it.
      actions.push(Action::ReplaceText {
        file: root.join("src/cmake/macros.cmake"),
        from: "if(WITH_OPENCOLORIO)".into(),
        to: "list(APPEND ${libraries} ${OPENIMAGEIO_LIBRARIES})\n  if(WITH_OPENCOLORIO)".into(),
        unless_contains: Some("list(APPEND ${libraries} ${OPENIMAGEIO_LIBRARIES})".into()),
      });
      actions.push(Action::patch_once(
        root.join("src/kernel/CMakeLists.txt"),
        "${CUDA_NVCC_FLAGS}",
        "${CUDA_NVCC_FLAGS} --allow-unsupported-compiler",
      ));
    }
    Os::Linux => {
      // The standalone app does not build against our dependencies and is not needed.
      // Once the condition is gone the replacement finds nothing to do.
      actions.push(Action::ReplaceText {
        file: root.join("src/app/CMakeLists.txt"),
        from: "if(WITH_CYCLES_STANDALONE)".into(),
        to: "if(false)".into(),
        unless_contains: None,
      });
    }
  }
  actions
}

fn configure_args(cfg: &BuildConfig) -> Vec<String> {
  let (oiio_root, oidn_root) = oiio_oidn_roots(cfg);
  let mut args: Vec<String> = [
    "-DWITH_CYCLES_CUDA_BINARIES=ON",
    "-DWITH_CYCLES_DEVICE_OPTIX=ON",
    "-DWITH_CYCLES_DEVICE_CUDA=ON",
  ]
  .iter()
  .map(|s| s.to_string())
  .collect();
  args.push(define("ZLIB_INCLUDE_DIR", &cfg.zlib_root));
  args.push(define("ZLIB_LIBRARY", &cfg.zlib_library));
  args.extend(
    [
      "-DWITH_CYCLES_OSL=OFF",
      "-DWITH_CYCLES_HYDRA_RENDER_DELEGATE=OFF",
      "-DWITH_CYCLES_USD=OFF",
    ]
    .iter()
    .map(|s| s.to_string()),
  );
  args.push(define("OPENIMAGEIO_ROOT_DIR:PATH", &oiio_root));

  if cfg.os() == Os::Linux {
    let install = &cfg.cycles_deps_install;
    args.push(define("OPENCOLORIO_ROOT_DIR:PATH", install.join("ocio")));
    args.push(define("OPENSUBDIV_ROOT_DIR:PATH", install.join("osd")));
    args.push(define("OPENIMAGEDENOISE_ROOT_DIR:PATH", &oidn_root));
    // pugixml is only used by the standalone app; CMake just needs the variables set.
    args.push("-DPUGIXML_INCLUDE_DIR:PATH=/usr/include".into());
    args.push("-DPUGIXML_LIBRARY:PATH=/usr/lib".into());
    args.push(define("TIFF_INCLUDE_DIR:PATH", install.join("tiff/libtiff")));
    args.push(define("TIFF_LIBRARY:FILEPATH", install.join("tiff/build/libtiff/libtiff.so")));
  }
  args
}

/// Compile Cycles from the pinned fork.
pub fn build(cfg: &BuildConfig) -> Recipe {
  let os = cfg.os();
  let root = cfg.cycles_root();
  let deps = cfg.cycles_deps_root();
  let (oiio_root, oidn_root) = oiio_oidn_roots(cfg);

  let mut actions = prepare(cfg);
  actions.push(match os {
    Os::Linux => Action::run("make", ["update"], &root),
    Os::Windows => Action::run("cmd", ["/C", "make.bat", "update"], &root),
  });
  actions.extend(cmake_steps(cfg, &root, "build", configure_args(cfg), &[]));

  let mut recipe = Recipe::new("cycles");
  recipe.prelude.push(Action::clone_repo(CYCLES_REPO, &root));
  recipe.gate = Some(Gate::in_repo(&root, CYCLES_COMMIT, actions));
  recipe.flags.push(WITH_CYCLES_FLAG.to_string());
  recipe.build_targets.push(CYCLES_TARGET.to_string());

  let a = &mut recipe.artifacts;
  a.include("DEPENDENCY_CYCLES_INCLUDE", root.join("src"))
    .location("DEPENDENCY_CYCLES_ROOT", &root)
    .location("DEPENDENCY_CYCLES_BUILD_LOCATION", root.join("build"))
    .include("DEPENDENCY_CYCLES_ATOMIC_INCLUDE", root.join("third_party/atomic"))
    .include("DEPENDENCY_CYCLES_OPENIMAGEIO_INCLUDE", oiio_root.join("include"))
    .include("DEPENDENCY_CYCLES_PUGIXML_INCLUDE", deps.join("pugixml/include"))
    .include("DEPENDENCY_CYCLES_OPENIMAGEDENOISE_INCLUDE", oidn_root.join("include"))
    .include("DEPENDENCY_CYCLES_OPENEXR_INCLUDE", deps.join("openexr/include"))
    .include("DEPENDENCY_CYCLES_EMBREE_INCLUDE", deps.join("embree/include"))
    .include("DEPENDENCY_CYCLES_OSL_INCLUDE", deps.join("osl/include"))
    .include("DEPENDENCY_CYCLES_TBB_INCLUDE", deps.join("tbb/include"))
    .location("DEPENDENCY_CYCLES_OPENVDB_LIBRARY_PATH", deps.join("openvdb/lib"))
    .location("DEPENDENCY_CYCLES_DEPENDENCIES_LOCATION", &deps)
    .include("DEPENDENCY_OPENEXR_INCLUDE", deps.join("openexr/include"))
    .include("DEPENDENCY_OPENEXR_IMATH_INCLUDE", deps.join("imath/include"))
    .include("DEPENDENCY_OPENIMAGEDENOISE_INCLUDE", deps.join("openimagedenoise/include"))
    .location(
      "DEPENDENCY_CYCLES_LIBRARY_LOCATION",
      cfg.config_output_dir(&root.join("build/lib")),
    );

  for (var, linux, windows) in CYCLES_LIBRARIES {
    let rel = match os {
      Os::Linux => linux,
      Os::Windows => windows,
    };
    a.library(var, deps.join(rel));
  }

  let cache = root.join("build/CMakeCache.txt");
  recipe.checks = vec![
    Check::warn_if_contains(
      &cache,
      "WITH_CYCLES_DEVICE_CUDA:BOOL=OFF",
      "CUDA is disabled for Cycles! Is CUDA installed on the system?",
    ),
    Check::warn_if_contains(
      &cache,
      "WITH_CYCLES_DEVICE_OPTIX:BOOL=OFF",
      "OptiX is disabled for Cycles! Is OptiX installed on the system?",
    ),
  ];

  recipe
}

/// Release asset of the prebuilt bundle for `os`.
pub fn bundle_asset(os: Os) -> &'static str {
  match os {
    Os::Linux => "binaries_linux64.tar.gz",
    Os::Windows => "binaries_windows64.zip",
  }
}

/// Download the prebuilt UniRender Cycles bundle into the install directory.
///
/// The bundle tracks a rolling `latest` release, so it is fetched on every run.
pub fn prebuilt_bundle(cfg: &BuildConfig) -> Recipe {
  let mut recipe = Recipe::new("cycles-prebuilt");
  recipe.prelude.push(Action::FetchArchive {
    url: format!("{CYCLES_BUNDLE_URL}{}", bundle_asset(cfg.os())),
    dest: cfg.install_dir.clone(),
    creates: None,
    sha256: None,
  });
  recipe
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::artifacts::ArtifactKind;
  use crate::config::ConfigLayer;
  use crate::recipe::test_support::config;
  use std::path::Path;

  fn cycles_config(os: Os) -> BuildConfig {
    config(
      os,
      ConfigLayer {
        build_cycles: Some(true),
        ..Default::default()
      },
    )
  }

  fn gate_actions(recipe: &Recipe) -> &[Action] {
    &recipe.gate.as_ref().unwrap().actions
  }

  #[test]
  fn update_is_followed_by_reset_to_pin_on_every_platform() {
    let root = Path::new("/proj/deps/cycles");
    for (os, flag) in [(Os::Linux, "--no-libraries"), (Os::Windows, "--no-cycles")] {
      let recipe = build(&cycles_config(os));
      let actions = gate_actions(&recipe);

      let update = actions
        .iter()
        .position(|a| matches!(a, Action::Run { args, .. } if args.iter().any(|x| x == flag)))
        .unwrap();
      assert_eq!(actions[update + 1], Action::reset_hard(root, Some(CYCLES_COMMIT)), "{os}");
      assert!(
        matches!(&actions[update + 2], Action::VerifyHead { rev, .. } if rev == CYCLES_COMMIT),
        "{os}"
      );
      assert!(
        actions[update + 3..]
          .iter()
          .all(|a| !matches!(a, Action::Run { args, .. } if args.iter().any(|x| x.ends_with("make_update.py")))),
        "{os}"
      );
      // Patches land on the pinned tree, never before the reset that follows the update.
      assert!(
        actions[..update].iter().all(|a| !matches!(a, Action::ReplaceText { .. })),
        "{os}"
      );
    }
  }

  #[test]
  fn standalone_app_patch_is_unconditional() {
    let recipe = build(&cycles_config(Os::Linux));
    let patch = gate_actions(&recipe)
      .iter()
      .find(|a| matches!(a, Action::ReplaceText { from, .. } if from == "if(WITH_CYCLES_STANDALONE)"))
      .unwrap();
    assert!(matches!(patch, Action::ReplaceText { unless_contains: None, .. }));
  }

  #[test]
  fn windows_patches_hydra_and_nvcc() {
    let recipe = build(&cycles_config(Os::Windows));
    let patched: Vec<_> = gate_actions(&recipe)
      .iter()
      .filter_map(|a| match a {
        Action::ReplaceText { file, .. } => Some(file.clone()),
        _ => None,
      })
      .collect();
    assert_eq!(
      patched,
      vec![
        PathBuf::from("/proj/deps/cycles/CMakeLists.txt"),
        PathBuf::from("/proj/deps/cycles/src/cmake/macros.cmake"),
        PathBuf::from("/proj/deps/cycles/src/kernel/CMakeLists.txt"),
      ]
    );
    assert!(
      gate_actions(&recipe)
        .iter()
        .any(|a| matches!(a, Action::Run { program, .. } if program == "cmd"))
    );
  }

  #[test]
  fn linux_configure_points_at_self_built_dependencies() {
    let args = configure_args(&cycles_config(Os::Linux));
    assert!(args.contains(&"-DOPENIMAGEIO_ROOT_DIR:PATH=/proj/deps/cycles/lib/linux_x64/oiio".to_string()));
    assert!(args.contains(&"-DOPENCOLORIO_ROOT_DIR:PATH=/proj/deps/ocio".to_string()));
    assert!(args.contains(&"-DZLIB_LIBRARY=/proj/deps/zlib/build/libz.a".to_string()));

    let win = configure_args(&cycles_config(Os::Windows));
    assert!(win.contains(&"-DOPENIMAGEIO_ROOT_DIR:PATH=/proj/deps/cycles/lib/windows_x64/openimageio".to_string()));
    assert!(!win.iter().any(|a| a.starts_with("-DPUGIXML")));
  }

  #[test]
  fn registers_flag_target_and_same_library_variables() {
    let linux = build(&cycles_config(Os::Linux));
    let win = build(&cycles_config(Os::Windows));

    assert_eq!(linux.flags, vec![WITH_CYCLES_FLAG]);
    assert_eq!(linux.build_targets, vec![CYCLES_TARGET]);

    let libs = |r: &Recipe| {
      r.artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::Library)
        .map(|a| a.var.clone())
        .collect::<Vec<_>>()
    };
    assert_eq!(libs(&linux), libs(&win));
    assert_eq!(
      linux.artifacts.get("DEPENDENCY_CYCLES_INCLUDE"),
      win.artifacts.get("DEPENDENCY_CYCLES_INCLUDE")
    );
    assert_eq!(
      win.artifacts.get("DEPENDENCY_CYCLES_LIBRARY_LOCATION").unwrap().path,
      PathBuf::from("/proj/deps/cycles/build/lib/RelWithDebInfo")
    );
  }

  #[test]
  fn prebuilt_bundle_goes_to_install_dir() {
    let recipe = prebuilt_bundle(&config(Os::Windows, ConfigLayer::default()));
    assert!(recipe.gate.is_none());
    match &recipe.prelude[0] {
      Action::FetchArchive { url, dest, .. } => {
        assert!(url.ends_with("/latest/binaries_windows64.zip"));
        assert_eq!(dest, &PathBuf::from("/proj/install"));
      }
      other => panic!("unexpected {other:?}"),
    }
  }
}
