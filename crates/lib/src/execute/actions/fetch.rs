//! Archive download and extraction.
//!
//! Used for tool releases (ISPC, TBB) and the prebuilt binary bundle. Archives
//! are downloaded into the destination directory, optionally verified against a
//! SHA256 hash, unpacked in place and then removed.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info};

use crate::execute::types::{ActionStatus, ExecuteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
  Zip,
  TarGz,
}

impl ArchiveFormat {
  /// Detect the format from the URL's file name.
  pub fn from_url(url: &str) -> Option<Self> {
    let name = url_to_filename(url).to_ascii_lowercase();
    if name.ends_with(".zip") {
      Some(Self::Zip)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
      Some(Self::TarGz)
    } else {
      None
    }
  }
}

/// Download `url` and unpack it into `dest`.
///
/// Skipped entirely when `creates` is given and already exists. When `creates`
/// is given it must exist after extraction.
pub async fn fetch_archive(
  url: &str,
  dest: &Path,
  creates: Option<&Path>,
  expected_sha256: Option<&str>,
) -> Result<ActionStatus, ExecuteError> {
  if let Some(creates) = creates
    && creates.exists()
  {
    debug!(path = %creates.display(), "archive already unpacked");
    return Ok(ActionStatus::AlreadySatisfied);
  }

  let format = ArchiveFormat::from_url(url).ok_or_else(|| ExecuteError::UnsupportedArchive { url: url.to_string() })?;

  info!(url = %url, dest = %dest.display(), "downloading");
  fs::create_dir_all(dest).await?;

  let response = reqwest::get(url).await.map_err(|e| ExecuteError::FetchFailed {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  if !response.status().is_success() {
    return Err(ExecuteError::FetchFailed {
      url: url.to_string(),
      message: format!("HTTP {}", response.status()),
    });
  }

  let bytes = response.bytes().await.map_err(|e| ExecuteError::FetchFailed {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  if let Some(expected) = expected_sha256 {
    let actual = sha256_hex(&bytes);
    if !actual.eq_ignore_ascii_case(expected) {
      return Err(ExecuteError::HashMismatch {
        url: url.to_string(),
        expected: expected.to_string(),
        actual,
      });
    }
  }

  let archive_path = dest.join(url_to_filename(url));
  fs::write(&archive_path, &bytes).await?;
  debug!(path = %archive_path.display(), size = bytes.len(), "download complete");

  unpack(url, &archive_path, dest, format).await?;
  fs::remove_file(&archive_path).await?;

  if let Some(creates) = creates
    && !creates.exists()
  {
    return Err(ExecuteError::MissingAfterStep(creates.to_path_buf()));
  }

  info!(url = %url, "unpacked");
  Ok(ActionStatus::Ran)
}

/// Unpack an archive file on a blocking thread and wait for it.
pub async fn unpack(url: &str, archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<(), ExecuteError> {
  let archive: PathBuf = archive.to_path_buf();
  let dest: PathBuf = dest.to_path_buf();
  let extract_err = |message: String| ExecuteError::Extract {
    url: url.to_string(),
    message,
  };

  tokio::task::spawn_blocking(move || extract(&archive, &dest, format))
    .await
    .map_err(|e| extract_err(e.to_string()))?
    .map_err(|e| extract_err(e.to_string()))
}

fn extract(archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  let file = File::open(archive)?;
  match format {
    ArchiveFormat::Zip => {
      let mut zip = zip::ZipArchive::new(file)?;
      zip.extract(dest)?;
    }
    ArchiveFormat::TarGz => {
      let mut tar = tar::Archive::new(GzDecoder::new(file));
      tar.unpack(dest)?;
    }
  }
  Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

/// Convert a URL to a safe filename.
///
/// Takes the last path component and sanitizes it. Falls back to hash of URL
/// if no suitable filename can be extracted.
pub fn url_to_filename(url: &str) -> String {
  if let Some(filename) = url.rsplit('/').next() {
    let filename = filename.split('?').next().unwrap_or(filename);

    let sanitized: String = filename
      .chars()
      .map(|c| {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
          c
        } else {
          '_'
        }
      })
      .collect();

    if !sanitized.is_empty() && sanitized != "." && sanitized != ".." {
      return sanitized;
    }
  }

  format!("download_{}", &sha256_hex(url.as_bytes())[..16])
}
