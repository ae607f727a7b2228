//! Build configuration.
//!
//! Every step receives a [`BuildConfig`] explicitly instead of reading ambient
//! globals. The record is assembled from layers, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `unideps.toml` in the project root (or an explicit `--config` path)
//! 3. `UNIDEPS_*` environment variables
//! 4. command-line overrides
//!
//! Layers 2–4 share the same shape ([`ConfigLayer`]) and are folded with
//! [`ConfigLayer::merge`] before being resolved against the platform.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::CONFIG_FILENAME;
use crate::platform::Platform;
use crate::platform::os::Os;

/// Generator whose single build tree holds one output directory per configuration.
pub const NINJA_MULTI_CONFIG: &str = "Ninja Multi-Config";

const DEFAULT_BUILD_CONFIG: &str = "RelWithDebInfo";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value for {var}: '{value}'")]
  InvalidEnv { var: &'static str, value: String },

  #[error("job count must be at least 1")]
  ZeroJobs,

  #[error("could not determine the current directory: {0}")]
  CurrentDir(#[source] io::Error),
}

/// One partial layer of configuration.
///
/// All fields are optional; `None` means "not set at this layer".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
  pub root_dir: Option<PathBuf>,
  pub deps_dir: Option<PathBuf>,
  pub install_dir: Option<PathBuf>,
  pub tools_dir: Option<PathBuf>,
  pub generator: Option<String>,
  pub build_config: Option<String>,
  pub jobs: Option<usize>,
  pub python: Option<String>,
  pub vcpkg_root: Option<PathBuf>,
  pub zlib_root: Option<PathBuf>,
  pub zlib_library: Option<PathBuf>,
  pub cycles_deps_install: Option<PathBuf>,
  pub build_cycles: Option<bool>,
  pub build_all: Option<bool>,
  pub prebuilt_dependencies: Option<bool>,
}

macro_rules! merge_fields {
  ($low:ident, $high:ident, $($field:ident),+ $(,)?) => {
    ConfigLayer {
      $($field: $high.$field.or($low.$field),)+
    }
  };
}

impl ConfigLayer {
  /// Parse a TOML config file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        ConfigError::NotFound(path.to_path_buf())
      } else {
        ConfigError::Read {
          path: path.to_path_buf(),
          source: e,
        }
      }
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })
  }

  /// Load the config file for a project.
  ///
  /// An explicit path must exist. Without one, `unideps.toml` in `root` is used
  /// when present and an empty layer otherwise.
  pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
    match explicit {
      Some(path) => Self::load(path),
      None => {
        let candidate = root.join(CONFIG_FILENAME);
        if candidate.is_file() {
          debug!(path = %candidate.display(), "loading project config");
          Self::load(&candidate)
        } else {
          Ok(Self::default())
        }
      }
    }
  }

  /// Read the `UNIDEPS_*` environment variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    let path = |var: &str| std::env::var_os(var).map(PathBuf::from);
    let string = |var: &str| std::env::var(var).ok().filter(|v| !v.is_empty());

    let jobs = match std::env::var("UNIDEPS_JOBS") {
      Ok(value) => Some(value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
        var: "UNIDEPS_JOBS",
        value,
      })?),
      Err(_) => None,
    };

    Ok(Self {
      root_dir: path("UNIDEPS_ROOT"),
      deps_dir: path("UNIDEPS_DEPS_DIR"),
      install_dir: path("UNIDEPS_INSTALL_DIR"),
      tools_dir: path("UNIDEPS_TOOLS_DIR"),
      generator: string("UNIDEPS_GENERATOR"),
      build_config: string("UNIDEPS_BUILD_CONFIG"),
      jobs,
      ..Self::default()
    })
  }

  /// Combine two layers; values set in `higher` win.
  pub fn merge(self, higher: ConfigLayer) -> ConfigLayer {
    let low = self;
    merge_fields!(
      low,
      higher,
      root_dir,
      deps_dir,
      install_dir,
      tools_dir,
      generator,
      build_config,
      jobs,
      python,
      vcpkg_root,
      zlib_root,
      zlib_library,
      cycles_deps_install,
      build_cycles,
      build_all,
      prebuilt_dependencies,
    )
  }
}

/// Fully resolved configuration passed to every step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildConfig {
  #[serde(serialize_with = "serialize_platform")]
  pub platform: Platform,
  /// Root of the downstream project (`external_libs/` lives here).
  pub root_dir: PathBuf,
  /// Where third-party dependencies are cloned and built.
  pub deps_dir: PathBuf,
  /// Where prebuilt binary bundles are extracted.
  pub install_dir: PathBuf,
  /// Where auxiliary tools are cloned.
  pub tools_dir: PathBuf,
  pub generator: String,
  pub build_config: String,
  pub jobs: usize,
  pub python: String,
  pub vcpkg_root: PathBuf,
  pub zlib_root: PathBuf,
  pub zlib_library: PathBuf,
  /// Where self-built OCIO (`ocio/`), OpenSubdiv (`osd/`) and TIFF (`tiff/`) are
  /// installed; Cycles is pointed at them on Linux.
  pub cycles_deps_install: PathBuf,
  pub build_cycles: bool,
  pub build_all: bool,
  pub prebuilt_dependencies: bool,
}

fn serialize_platform<S: serde::Serializer>(platform: &Platform, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&platform.triple())
}

impl BuildConfig {
  /// Resolve a merged layer into a complete config for `platform`.
  ///
  /// Relative paths are interpreted against the project root, which itself
  /// defaults to `cwd`.
  pub fn resolve(layer: ConfigLayer, platform: Platform, cwd: &Path) -> Result<Self, ConfigError> {
    let root_dir = absolutize(cwd, layer.root_dir.unwrap_or_else(|| cwd.to_path_buf()));
    // Plain paths on Windows: CMake and vcpkg reject `\\?\` prefixes.
    let root_dir = dunce::canonicalize(&root_dir).unwrap_or(root_dir);
    let under_root = |p: Option<PathBuf>, default: &str| absolutize(&root_dir, p.unwrap_or_else(|| PathBuf::from(default)));

    let deps_dir = under_root(layer.deps_dir, "deps");
    let install_dir = under_root(layer.install_dir, "install");
    let tools_dir = under_root(layer.tools_dir, "tools");

    let build_config = layer.build_config.unwrap_or_else(|| DEFAULT_BUILD_CONFIG.to_string());
    let generator = layer.generator.unwrap_or_else(|| default_generator(platform.os).to_string());

    let jobs = layer.jobs.unwrap_or_else(num_cpus::get);
    if jobs == 0 {
      return Err(ConfigError::ZeroJobs);
    }

    let python = layer.python.unwrap_or_else(|| default_python(platform.os).to_string());
    let vcpkg_root = absolutize(&root_dir, layer.vcpkg_root.unwrap_or_else(|| deps_dir.join("vcpkg")));
    let zlib_root = absolutize(&root_dir, layer.zlib_root.unwrap_or_else(|| deps_dir.join("zlib")));
    let zlib_library = match layer.zlib_library {
      Some(p) => absolutize(&root_dir, p),
      None => match platform.os {
        Os::Linux => zlib_root.join("build").join("libz.a"),
        Os::Windows => zlib_root.join("build").join(&build_config).join("zlibstatic.lib"),
      },
    };

    let cycles_deps_install = match layer.cycles_deps_install {
      Some(p) => absolutize(&root_dir, p),
      None => deps_dir.clone(),
    };

    Ok(Self {
      platform,
      root_dir,
      deps_dir,
      install_dir,
      tools_dir,
      generator,
      build_config,
      jobs,
      python,
      vcpkg_root,
      zlib_root,
      zlib_library,
      cycles_deps_install,
      build_cycles: layer.build_cycles.unwrap_or(false),
      build_all: layer.build_all.unwrap_or(false),
      prebuilt_dependencies: layer.prebuilt_dependencies.unwrap_or(true),
    })
  }

  /// Whether Cycles is compiled locally instead of using the prebuilt bundle.
  pub fn builds_cycles(&self) -> bool {
    self.build_cycles || self.build_all
  }

  pub fn os(&self) -> Os {
    self.platform.os
  }

  /// Per-configuration output subdirectory inside a CMake build tree, if any.
  ///
  /// Visual Studio always nests outputs under the configuration name; on Linux
  /// only the multi-config Ninja generator does.
  pub fn config_subdir(&self) -> Option<&str> {
    match self.platform.os {
      Os::Windows => Some(&self.build_config),
      Os::Linux if self.generator == NINJA_MULTI_CONFIG => Some(&self.build_config),
      Os::Linux => None,
    }
  }

  /// `dir` joined with the configuration subdirectory when the generator uses one.
  pub fn config_output_dir(&self, dir: &Path) -> PathBuf {
    match self.config_subdir() {
      Some(sub) => dir.join(sub),
      None => dir.to_path_buf(),
    }
  }

  /// Working copy of the Cycles fork.
  pub fn cycles_root(&self) -> PathBuf {
    self.deps_dir.join("cycles")
  }

  /// Libraries fetched by Cycles' own `make update`.
  pub fn cycles_deps_root(&self) -> PathBuf {
    self.cycles_root().join("lib").join(self.platform.lib_dir_name())
  }

  /// Directory the external-library glue repositories are cloned into.
  pub fn external_libs_dir(&self) -> PathBuf {
    self.root_dir.join("external_libs")
  }
}

fn default_generator(os: Os) -> &'static str {
  match os {
    Os::Linux => "Unix Makefiles",
    Os::Windows => "Visual Studio 17 2022",
  }
}

fn default_python(os: Os) -> &'static str {
  match os {
    Os::Linux => "python3",
    Os::Windows => "python",
  }
}

fn absolutize(base: &Path, path: PathBuf) -> PathBuf {
  if path.is_absolute() { path } else { base.join(path) }
}
