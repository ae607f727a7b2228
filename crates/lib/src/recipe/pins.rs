//! Pinned upstream sources.
//!
//! To move Cycles to a newer release:
//! - pick the release tag on https://github.com/blender/cycles/tags
//! - move the fork https://github.com/Silverlan/cycles to that commit
//! - update [`CYCLES_COMMIT`]
//! - update the prebuilt library commits below and the source-built TBB, OIDN,
//!   OCIO and OpenSubdiv pins so they match what that Cycles release expects

use crate::platform::os::Os;

pub const CYCLES_REPO: &str = "https://github.com/Silverlan/cycles.git";
/// Cycles 4.1.1
pub const CYCLES_COMMIT: &str = "ee4a5f249e43e02aef439877e747f14fa5c8c3c9";

/// Prebuilt Cycles library bundle used when Cycles itself is not compiled.
pub const CYCLES_BUNDLE_URL: &str = "https://github.com/Silverlan/UniRender_Cycles/releases/download/latest/";

/// Blender's precompiled library repository for `os`, and the commit matching [`CYCLES_COMMIT`].
pub fn blender_libs(os: Os) -> (&'static str, &'static str) {
  match os {
    Os::Linux => ("https://projects.blender.org/blender/lib-linux_x64.git", "4d2e4b4"),
    Os::Windows => ("https://projects.blender.org/blender/lib-windows_x64.git", "30392df"),
  }
}

/// Subdirectories of the Blender library repository that are actually used.
pub const BLENDER_LIB_PATHS: &[&str] = &[
  "openimagedenoise/",
  "tbb/",
  "opencolorio/",
  "openimageio/",
  "opensubdiv/",
  "imath/",
];

pub const ISPC_VERSION: &str = "v1.21.0";

pub const TBB_RELEASE: &str = "2019_U8";
pub const TBB_DIR: &str = "tbb2019_20190605oss";

pub const OIDN_REPO: &str = "https://github.com/RenderKit/oidn.git";
/// v2.2.2
pub const OIDN_COMMIT: &str = "713ec7838ba650f99e0a896549c0dca5eeb3652d";

pub const OCIO_REPO: &str = "https://github.com/Silverlan/OpenColorIO.git";
// 2.2.0 pulls in its own zlib, which clashes with the project's zlib.
pub const OCIO_COMMIT: &str = "8c767e5";

pub const OPENSUBDIV_REPO: &str = "https://github.com/PixarAnimationStudios/OpenSubdiv.git";
/// v3.6.0
pub const OPENSUBDIV_COMMIT: &str = "7d0ab5530feef693ac0a920585b5c663b80773b3";

pub const UTIL_OCIO_REPO: &str = "https://github.com/Silverlan/util_ocio.git";
pub const UTIL_OCIO_COMMIT: &str = "19d48ea21c58f79d7359075197c786c705d7817f";

pub const GLOG_REPO: &str = "https://github.com/google/glog";
pub const GLOG_COMMIT: &str = "b33e3ba";

pub const GFLAGS_REPO: &str = "https://github.com/gflags/gflags.git";
pub const GFLAGS_COMMIT: &str = "e171aa2";

pub const RENDER_RAYTRACING_REPO: &str = "https://github.com/Silverlan/render_raytracing.git";
pub const RENDER_RAYTRACING_COMMIT: &str = "10293584e1c4ae5d674dcdc9b3c82e354e561a11";

pub const UNIRENDER_REPO: &str = "https://github.com/Silverlan/UniRender.git";
pub const UNIRENDER_COMMIT: &str = "f5d113b79a99ed2227f5e81cc637566ddc8f3204";
