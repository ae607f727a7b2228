pub mod arch;
pub mod os;

use arch::Arch;
use os::Os;
use std::fmt;

/// Platform identifier combining architecture and OS (e.g., "x86_64-linux")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  /// Returns the platform triple string (e.g., "x86_64-linux")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }

  /// Directory naming used by the Blender prebuilt library repositories (`linux_x64`).
  pub fn lib_dir_name(&self) -> String {
    format!("{}_{}", self.os, self.arch.short())
  }

  /// vcpkg triplet for dynamically linked packages.
  ///
  /// Linux needs an overlay triplet to get shared libraries; Windows defaults are fine.
  pub fn vcpkg_triplet(&self) -> String {
    match self.os {
      Os::Linux => format!("{}-linux-dynamic", self.arch.short()),
      Os::Windows => format!("{}-windows", self.arch.short()),
    }
  }

  pub fn is_windows(&self) -> bool {
    self.os == Os::Windows
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
