//! Artifact registry handed to the downstream build.
//!
//! Every recipe registers where its headers and libraries ended up as CMake
//! cache variables (`DEPENDENCY_OPENIMAGEIO_INCLUDE=/deps/...`). The driver
//! merges them into a [`Registry`], which is printed as `-D` arguments and
//! written to disk as JSON for the consuming project.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
  /// A header search directory.
  Include,
  /// A library file to link.
  Library,
  /// Any other directory the consumer needs (build trees, install roots).
  Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
  pub var: String,
  pub path: PathBuf,
  pub kind: ArtifactKind,
}

impl Artifact {
  /// `-D<VAR>=<path>`
  pub fn cmake_arg(&self) -> String {
    format!("-D{}={}", self.var, self.path.display())
  }
}

/// Ordered artifact list for one dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
  entries: Vec<Artifact>,
}

impl Artifacts {
  pub fn new() -> Self {
    Self::default()
  }

  fn push(&mut self, var: &str, path: impl Into<PathBuf>, kind: ArtifactKind) -> &mut Self {
    let var = var.to_string();
    let path = path.into();
    // Later registrations win, like repeated -D flags on a CMake command line.
    self.entries.retain(|a| a.var != var);
    self.entries.push(Artifact { var, path, kind });
    self
  }

  pub fn include(&mut self, var: &str, path: impl Into<PathBuf>) -> &mut Self {
    self.push(var, path, ArtifactKind::Include)
  }

  pub fn library(&mut self, var: &str, path: impl Into<PathBuf>) -> &mut Self {
    self.push(var, path, ArtifactKind::Library)
  }

  pub fn location(&mut self, var: &str, path: impl Into<PathBuf>) -> &mut Self {
    self.push(var, path, ArtifactKind::Location)
  }

  pub fn get(&self, var: &str) -> Option<&Artifact> {
    self.entries.iter().find(|a| a.var == var)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
    self.entries.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn extend(&mut self, other: &Artifacts) {
    for a in &other.entries {
      self.push(&a.var, a.path.clone(), a.kind);
    }
  }

  pub fn cmake_args(&self) -> Vec<String> {
    self.entries.iter().map(Artifact::cmake_arg).collect()
  }

  /// Registered paths that do not exist on disk.
  pub fn missing(&self) -> Vec<&Artifact> {
    self.entries.iter().filter(|a| !a.path.exists()).collect()
  }
}

/// Everything the downstream build needs from a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
  /// Platform the registry was assembled for.
  pub platform: String,
  pub artifacts: Artifacts,
  /// Extra CMake flags (`-DPR_UNIRENDER_WITH_CYCLES=1`).
  pub flags: Vec<String>,
  /// Additional targets the downstream build must build.
  pub build_targets: Vec<String>,
}

impl Registry {
  pub fn new(platform: impl Into<String>) -> Self {
    Self {
      platform: platform.into(),
      ..Self::default()
    }
  }

  pub fn add_flag(&mut self, flag: &str) {
    if !self.flags.iter().any(|f| f == flag) {
      self.flags.push(flag.to_string());
    }
  }

  pub fn add_target(&mut self, target: &str) {
    if !self.build_targets.iter().any(|t| t == target) {
      self.build_targets.push(target.to_string());
    }
  }

  /// Flags followed by every artifact as `-D` arguments.
  pub fn cmake_args(&self) -> Vec<String> {
    let mut args = self.flags.clone();
    args.extend(self.artifacts.cmake_args());
    args
  }

  pub fn save(&self, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "registry written");
    Ok(())
  }

}
