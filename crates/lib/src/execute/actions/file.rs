//! Source patches and small file operations.

use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use crate::execute::types::{ActionStatus, ExecuteError};

/// Replace every occurrence of `from` with `to` in `file`.
///
/// When `unless_contains` is present in the file the patch counts as already
/// applied and the file is left alone. A file without `from` is also left alone:
/// upstream sometimes drops the line being patched between versions.
pub async fn replace_text(
  file: &Path,
  from: &str,
  to: &str,
  unless_contains: Option<&str>,
) -> Result<ActionStatus, ExecuteError> {
  if !file.is_file() {
    return Err(ExecuteError::PatchTargetMissing(file.to_path_buf()));
  }

  let content = fs::read_to_string(file).await?;

  if let Some(applied) = unless_contains
    && content.contains(applied)
  {
    debug!(file = %file.display(), "patch already applied");
    return Ok(ActionStatus::AlreadySatisfied);
  }

  if !content.contains(from) {
    debug!(file = %file.display(), pattern = from, "patch pattern not found, leaving file untouched");
    return Ok(ActionStatus::AlreadySatisfied);
  }

  fs::write(file, content.replace(from, to)).await?;
  info!(file = %file.display(), "patched");
  Ok(ActionStatus::Ran)
}

/// Copy `from` into the directory `to_dir`, keeping its file name.
pub async fn copy_into(from: &Path, to_dir: &Path) -> Result<(), ExecuteError> {
  let name = from
    .file_name()
    .ok_or_else(|| ExecuteError::MissingAfterStep(from.to_path_buf()))?;
  if !from.is_file() {
    return Err(ExecuteError::MissingAfterStep(from.to_path_buf()));
  }

  fs::create_dir_all(to_dir).await?;
  fs::copy(from, to_dir.join(name)).await?;
  debug!(from = %from.display(), to = %to_dir.display(), "copied");
  Ok(())
}

pub async fn make_dir(path: &Path) -> Result<(), ExecuteError> {
  fs::create_dir_all(path).await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  const HYDRA_ON: &str = r#"option(WITH_CYCLES_HYDRA_RENDER_DELEGATE "Build Cycles Hydra render delegate" ON)"#;

  #[tokio::test]
  async fn patch_applies_once() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("CMakeLists.txt");
    std::fs::write(&file, HYDRA_ON).unwrap();

    let from = r#""Build Cycles Hydra render delegate" ON"#;
    let to = r#""Build Cycles Hydra render delegate" OFF"#;

    assert_eq!(replace_text(&file, from, to, Some(to)).await.unwrap(), ActionStatus::Ran);
    assert!(std::fs::read_to_string(&file).unwrap().ends_with("OFF)"));

    assert_eq!(
      replace_text(&file, from, to, Some(to)).await.unwrap(),
      ActionStatus::AlreadySatisfied
    );
  }

  #[tokio::test]
  async fn insertion_patch_keeps_original_line() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("macros.cmake");
    std::fs::write(&file, "  if(WITH_OPENCOLORIO)\n").unwrap();

    let link = "list(APPEND ${libraries} ${OPENIMAGEIO_LIBRARIES})";
    let to = format!("{link}\n  if(WITH_OPENCOLORIO)");
    replace_text(&file, "if(WITH_OPENCOLORIO)", &to, Some(link)).await.unwrap();
    replace_text(&file, "if(WITH_OPENCOLORIO)", &to, Some(link)).await.unwrap();

    let content = std::fs::read_to_string(&file).unwrap();
    assert_eq!(content.matches(link).count(), 1);
    assert!(content.contains("if(WITH_OPENCOLORIO)"));
  }

  #[tokio::test]
  async fn missing_pattern_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("CMakeLists.txt");
    std::fs::write(&file, "add_subdirectory(app)\n").unwrap();

    let status = replace_text(&file, "if(WITH_CYCLES_STANDALONE)", "if(false)", None)
      .await
      .unwrap();

    assert_eq!(status, ActionStatus::AlreadySatisfied);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "add_subdirectory(app)\n");
  }

  #[tokio::test]
  async fn patching_a_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let result = replace_text(&temp.path().join("nope.txt"), "a", "b", None).await;
    assert!(matches!(result, Err(ExecuteError::PatchTargetMissing(_))));
  }

  #[tokio::test]
  async fn copy_into_creates_directory() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("OpenColorABI.h");
    std::fs::write(&src, "#define ABI").unwrap();
    let dest = temp.path().join("include").join("OpenColorIO");

    copy_into(&src, &dest).await.unwrap();

    assert_eq!(
      std::fs::read_to_string(dest.join("OpenColorABI.h")).unwrap(),
      "#define ABI"
    );
  }

  #[tokio::test]
  async fn copying_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let result = copy_into(&temp.path().join("tbb.dll"), temp.path()).await;
    assert!(matches!(result, Err(ExecuteError::MissingAfterStep(_))));
  }
}
