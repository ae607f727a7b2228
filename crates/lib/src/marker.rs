//! Build markers and the revision gate.
//!
//! Rebuilding a dependency like Cycles recompiles every kernel and takes a long
//! time, so a successful build records the revision it was built at in a marker
//! file (`lastbuildsha`). The next run compares that record against the pinned
//! target and skips the whole fetch/patch/build sequence when they match.
//!
//! The marker is only ever written after the gated sequence returns `Ok`, so a
//! failed build leaves the previous record (or its absence) in place and the next
//! run starts over.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::consts::MARKER_FILENAME;

#[derive(Debug, Error)]
pub enum MarkerError {
  #[error("failed to read build marker {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write build marker {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Persisted record of the last successfully built revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMarker {
  path: PathBuf,
}

impl BuildMarker {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Marker stored under the default file name inside `dir`.
  pub fn in_dir(dir: &Path) -> Self {
    Self::new(dir.join(MARKER_FILENAME))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Read the recorded revision.
  ///
  /// A missing file, or one holding only whitespace, means "never built".
  pub async fn read(&self) -> Result<Option<String>, MarkerError> {
    match fs::read_to_string(&self.path).await {
      Ok(content) => {
        let rev = content.trim();
        Ok(if rev.is_empty() { None } else { Some(rev.to_string()) })
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(MarkerError::Read {
        path: self.path.clone(),
        source: e,
      }),
    }
  }

  /// Record `rev` as the last successful build.
  ///
  /// Written to a temporary file next to the marker and renamed over it, so a
  /// crash mid-write never leaves a truncated revision behind.
  pub async fn write(&self, rev: &str) -> Result<(), MarkerError> {
    let err = |source| MarkerError::Write {
      path: self.path.clone(),
      source,
    };

    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).await.map_err(err)?;
    }

    let mut tmp = self.path.clone().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, rev).await.map_err(err)?;
    if let Err(e) = fs::rename(&tmp, &self.path).await {
      let _ = fs::remove_file(&tmp).await;
      return Err(err(e));
    }

    debug!(path = %self.path.display(), rev, "build marker updated");
    Ok(())
  }
}

/// What the gate decided for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
  /// The recorded revision differs from the target (or there is none).
  Build { last: Option<String> },
  /// The recorded revision equals the target.
  Skip,
}

/// Compare the recorded revision with the pinned target.
pub fn decide(last: Option<&str>, target: &str) -> GateDecision {
  match last {
    Some(last) if last == target => GateDecision::Skip,
    other => GateDecision::Build {
      last: other.map(str::to_string),
    },
  }
}

/// Outcome of a gated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
  Built,
  Skipped,
}

/// Run `body` only when the marker does not already record `target`.
///
/// On success the marker is overwritten with `target`. On failure the error is
/// returned untouched and the marker is left as it was.
pub async fn run_gated<F, Fut, E>(marker: &BuildMarker, target: &str, body: F) -> Result<GateOutcome, E>
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<(), E>>,
  E: From<MarkerError>,
{
  let last = marker.read().await?;

  match decide(last.as_deref(), target) {
    GateDecision::Skip => {
      info!(
        marker = %marker.path().display(),
        rev = target,
        "revision has not changed since the last build, skipping build"
      );
      Ok(GateOutcome::Skipped)
    }
    GateDecision::Build { last } => {
      info!(
        marker = %marker.path().display(),
        last = last.as_deref().unwrap_or("<none>"),
        target,
        "revision changed, rebuilding"
      );
      body().await?;
      marker.write(target).await?;
      Ok(GateOutcome::Built)
    }
  }
}
