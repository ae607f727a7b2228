use std::fmt;
use std::str::FromStr;

/// Operating systems the dependency recipes know how to build for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::Windows => "windows",
    }
  }

  /// File name of a shared library as the linker expects it (`libfoo.so` / `foo.lib`).
  ///
  /// On Windows the import library is what gets linked, so both shared and static
  /// names end up as `.lib`.
  pub fn shared_lib(&self, stem: &str) -> String {
    match self {
      Self::Linux => format!("lib{stem}.so"),
      Self::Windows => format!("{stem}.lib"),
    }
  }

  /// File name of a static library (`libfoo.a` / `foo.lib`).
  pub fn static_lib(&self, stem: &str) -> String {
    match self {
      Self::Linux => format!("lib{stem}.a"),
      Self::Windows => format!("{stem}.lib"),
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Os {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "linux" => Ok(Self::Linux),
      "windows" | "win32" | "win64" => Ok(Self::Windows),
      other => Err(format!("unsupported platform '{other}', expected 'linux' or 'windows'")),
    }
  }
}
