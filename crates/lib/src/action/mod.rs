//! The actions a dependency recipe is made of.
//!
//! Each [`Action`] is a single external-tool invocation or a small file edit.
//! Recipes are plain lists of actions so they can be printed by `plan`, recorded
//! in tests, and executed one at a time by an [`Executor`](crate::execute::Executor).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// How `GitPin` moves the working copy to the pinned revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
  /// `git reset --hard <rev>`, then sync submodules.
  HardReset,
  /// `git checkout <rev>`; used for sparse, no-checkout clones.
  Checkout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
  /// Clone `url` into `dest` unless `dest` already exists.
  GitClone {
    url: String,
    dest: PathBuf,
    branch: Option<String>,
    recurse_submodules: bool,
    no_checkout: bool,
  },

  GitFetch {
    repo: PathBuf,
  },

  /// `git reset --hard [rev]`.
  GitReset {
    repo: PathBuf,
    rev: Option<String>,
  },

  /// Move the working copy to `rev`, fetching first only if `rev` is not known locally.
  GitPin {
    repo: PathBuf,
    rev: String,
    mode: PinMode,
  },

  GitSparseCheckout {
    repo: PathBuf,
    paths: Vec<String>,
  },

  /// Fail unless HEAD resolves to the same commit as `rev`.
  VerifyHead {
    repo: PathBuf,
    rev: String,
  },

  /// Download an archive and unpack it into `dest`.
  ///
  /// Skipped when `creates` is set and already exists.
  FetchArchive {
    url: String,
    dest: PathBuf,
    creates: Option<PathBuf>,
    sha256: Option<String>,
  },

  /// Replace `from` with `to` in `file`, unless `file` already contains `unless_contains`.
  ReplaceText {
    file: PathBuf,
    from: String,
    to: String,
    unless_contains: Option<String>,
  },

  CopyFile {
    from: PathBuf,
    to_dir: PathBuf,
  },

  MakeDir {
    path: PathBuf,
  },

  Run {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
  },

  CmakeConfigure {
    source: PathBuf,
    build_dir: PathBuf,
    generator: String,
    args: Vec<String>,
  },

  CmakeBuild {
    build_dir: PathBuf,
    config: String,
    targets: Vec<String>,
  },
}

impl Action {
  /// Plain clone with submodules, the default for source dependencies.
  pub fn clone_repo(url: &str, dest: impl Into<PathBuf>) -> Self {
    Self::GitClone {
      url: url.to_string(),
      dest: dest.into(),
      branch: None,
      recurse_submodules: true,
      no_checkout: false,
    }
  }

  /// Clone without checking out a worktree, for repositories narrowed by sparse checkout.
  pub fn clone_no_checkout(url: &str, dest: impl Into<PathBuf>) -> Self {
    Self::GitClone {
      url: url.to_string(),
      dest: dest.into(),
      branch: None,
      recurse_submodules: false,
      no_checkout: true,
    }
  }

  pub fn pin(repo: impl Into<PathBuf>, rev: &str) -> Self {
    Self::GitPin {
      repo: repo.into(),
      rev: rev.to_string(),
      mode: PinMode::HardReset,
    }
  }

  pub fn reset_hard(repo: impl Into<PathBuf>, rev: Option<&str>) -> Self {
    Self::GitReset {
      repo: repo.into(),
      rev: rev.map(str::to_string),
    }
  }

  /// A patch that is applied once: skipped when `to` is already present.
  pub fn patch_once(file: impl Into<PathBuf>, from: &str, to: &str) -> Self {
    Self::ReplaceText {
      file: file.into(),
      from: from.to_string(),
      to: to.to_string(),
      unless_contains: Some(to.to_string()),
    }
  }

  pub fn run<I, S>(program: &str, args: I, cwd: impl Into<PathBuf>) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::Run {
      program: program.to_string(),
      args: args.into_iter().map(Into::into).collect(),
      cwd: cwd.into(),
    }
  }

  pub fn copy(from: impl Into<PathBuf>, to_dir: impl Into<PathBuf>) -> Self {
    Self::CopyFile {
      from: from.into(),
      to_dir: to_dir.into(),
    }
  }

  /// Whether this action talks to a remote or builds something.
  pub fn is_fetch_or_build(&self) -> bool {
    matches!(
      self,
      Self::GitClone { .. }
        | Self::GitFetch { .. }
        | Self::GitPin { .. }
        | Self::FetchArchive { .. }
        | Self::Run { .. }
        | Self::CmakeConfigure { .. }
        | Self::CmakeBuild { .. }
    )
  }
}

/// Pair an update step that cannot pin with the mandatory reset back to `rev`.
///
/// Some upstream update scripts pull the latest revision as a side effect. The
/// reset and a HEAD check always follow immediately so the build never sees the
/// drifted tree.
pub fn update_then_pin(update: Action, repo: &Path, rev: &str) -> [Action; 3] {
  [
    update,
    Action::reset_hard(repo, Some(rev)),
    Action::VerifyHead {
      repo: repo.to_path_buf(),
      rev: rev.to_string(),
    },
  ]
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::GitClone {
        url,
        dest,
        branch,
        recurse_submodules,
        no_checkout,
      } => {
        write!(f, "git clone")?;
        if *recurse_submodules {
          write!(f, " --recurse-submodules")?;
        }
        if *no_checkout {
          write!(f, " --no-checkout")?;
        }
        if let Some(branch) = branch {
          write!(f, " -b {branch}")?;
        }
        write!(f, " {url} {}", dest.display())
      }
      Self::GitFetch { repo } => write!(f, "git fetch ({})", repo.display()),
      Self::GitReset { repo, rev } => match rev {
        Some(rev) => write!(f, "git reset --hard {rev} ({})", repo.display()),
        None => write!(f, "git reset --hard ({})", repo.display()),
      },
      Self::GitPin { repo, rev, mode } => {
        let verb = match mode {
          PinMode::HardReset => "reset --hard",
          PinMode::Checkout => "checkout",
        };
        write!(f, "pin {} to {rev} (git {verb})", repo.display())
      }
      Self::GitSparseCheckout { repo, paths } => {
        write!(f, "git sparse-checkout set {} ({})", paths.join(" "), repo.display())
      }
      Self::VerifyHead { repo, rev } => write!(f, "verify HEAD of {} is {rev}", repo.display()),
      Self::FetchArchive { url, dest, .. } => write!(f, "download {url} -> {}", dest.display()),
      Self::ReplaceText { file, from, to, .. } => {
        write!(f, "patch {}: '{from}' -> '{}'", file.display(), to.replace('\n', "\\n"))
      }
      Self::CopyFile { from, to_dir } => write!(f, "copy {} -> {}", from.display(), to_dir.display()),
      Self::MakeDir { path } => write!(f, "mkdir {}", path.display()),
      Self::Run { program, args, cwd } => {
        write!(f, "{program}")?;
        for arg in args {
          write!(f, " {arg}")?;
        }
        write!(f, " (in {})", cwd.display())
      }
      Self::CmakeConfigure {
        source,
        build_dir,
        generator,
        args,
      } => {
        write!(f, "cmake {} -G \"{generator}\"", source.display())?;
        for arg in args {
          write!(f, " {arg}")?;
        }
        write!(f, " (in {})", build_dir.display())
      }
      Self::CmakeBuild {
        build_dir,
        config,
        targets,
      } => {
        write!(f, "cmake --build {} --config {config}", build_dir.display())?;
        if !targets.is_empty() {
          write!(f, " --target {}", targets.join(" "))?;
        }
        Ok(())
      }
    }
  }
}
