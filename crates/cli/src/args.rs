//! Tolerant argument handling.
//!
//! Unknown flags are dropped before clap sees the command line, so wrapper
//! scripts can pass their own options through to `unideps` unchanged. An
//! unknown flag written as `--flag value` loses its value too.

use std::collections::HashSet;

use clap::Command;

/// Flags and subcommands known to `cmd` or any of its subcommands.
struct KnownFlags {
  long: HashSet<String>,
  short: HashSet<char>,
  /// Long flags whose optional value must be attached with `=`.
  attached: HashSet<String>,
  subcommands: HashSet<String>,
}

impl KnownFlags {
  fn collect(cmd: &Command) -> Self {
    let mut known = Self {
      long: ["help", "version"].iter().map(|s| s.to_string()).collect(),
      short: ['h', 'V'].into_iter().collect(),
      attached: HashSet::new(),
      subcommands: ["help".to_string()].into_iter().collect(),
    };
    known.add(cmd);
    known
  }

  fn add(&mut self, cmd: &Command) {
    for arg in cmd.get_arguments() {
      if let Some(longs) = arg.get_long_and_visible_aliases() {
        if arg.is_require_equals_set() {
          self.attached.extend(longs.iter().map(|s| s.to_string()));
        }
        self.long.extend(longs.into_iter().map(str::to_string));
      }
      if let Some(shorts) = arg.get_short_and_visible_aliases() {
        self.short.extend(shorts);
      }
    }
    for sub in cmd.get_subcommands() {
      self.subcommands.insert(sub.get_name().to_string());
      self.subcommands.extend(sub.get_all_aliases().map(str::to_string));
      self.add(sub);
    }
  }

  fn accepts(&self, arg: &str) -> bool {
    if arg == "--" {
      return true;
    }
    if let Some(long) = arg.strip_prefix("--") {
      let name = long.split_once('=').map_or(long, |(name, _)| name);
      return self.long.contains(name);
    }
    if let Some(short) = arg.strip_prefix('-') {
      return match short.chars().next() {
        Some(c) => self.short.contains(&c),
        // A lone "-" is a value.
        None => true,
      };
    }
    true
  }

  /// Whether `next` can only be the value of the flag before it.
  fn is_detached_value(&self, next: &str) -> bool {
    !is_flag(next) && !self.subcommands.contains(next)
  }

  /// `--flag` (no `=`) of a known flag whose optional value must be attached.
  fn wants_attached(&self, arg: &str) -> bool {
    arg.strip_prefix("--").is_some_and(|name| self.attached.contains(name))
  }
}

fn is_flag(arg: &str) -> bool {
  arg.len() > 1 && arg.starts_with('-')
}

/// `--flag` or `-x`, as opposed to `--flag=value` or `-xvalue`.
fn value_may_follow(flag: &str) -> bool {
  match flag.strip_prefix("--") {
    Some(long) => !long.contains('='),
    None => flag.chars().count() == 2,
  }
}

/// Split `args` (program name first) into what clap should parse and the
/// unrecognized flags that were dropped, values included.
///
/// `--build-cycles true` is rewritten to `--build-cycles=true`. Everything
/// after a literal `--` is passed through untouched.
pub fn split_known<I>(args: I, cmd: &Command) -> (Vec<String>, Vec<String>)
where
  I: IntoIterator<Item = String>,
{
  let known = KnownFlags::collect(cmd);
  let mut kept = Vec::new();
  let mut ignored = Vec::new();
  let mut args = args.into_iter().peekable();

  if let Some(program) = args.next() {
    kept.push(program);
  }

  while let Some(arg) = args.next() {
    if arg == "--" {
      kept.push(arg);
      kept.extend(args.by_ref());
      break;
    }

    let detached_value = args.next_if(|next| known.is_detached_value(next));
    if known.accepts(&arg) {
      match detached_value {
        Some(value) if known.wants_attached(&arg) => kept.push(format!("{arg}={value}")),
        Some(value) => {
          kept.push(arg);
          kept.push(value);
        }
        None => kept.push(arg),
      }
    } else if value_may_follow(&arg) {
      ignored.push(arg);
      ignored.extend(detached_value);
    } else {
      ignored.push(arg);
      // `--flag=value` and `-Xvalue` carry their own value; what follows is unrelated.
      kept.extend(detached_value);
    }
  }
  (kept, ignored)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Cli;
  use clap::{CommandFactory, Parser};

  fn split(args: &[&str]) -> (Vec<String>, Vec<String>) {
    split_known(args.iter().map(|s| s.to_string()), &Cli::command())
  }

  #[test]
  fn unknown_long_flags_are_dropped() {
    let (kept, ignored) = split(&["unideps", "--build-cycles", "--with-pr-unirender", "build", "--cuda=12"]);
    assert_eq!(kept, vec!["unideps", "--build-cycles", "build"]);
    assert_eq!(ignored, vec!["--with-pr-unirender", "--cuda=12"]);
  }

  #[test]
  fn known_flags_with_values_and_shorts_survive() {
    let (kept, ignored) = split(&["unideps", "-v", "-j4", "--generator=Ninja", "plan", "--platform", "windows"]);
    assert_eq!(
      kept,
      vec!["unideps", "-v", "-j4", "--generator=Ninja", "plan", "--platform", "windows"]
    );
    assert!(ignored.is_empty());
  }

  #[test]
  fn subcommand_only_flags_are_known() {
    let (kept, _) = split(&["unideps", "build", "--strict"]);
    assert_eq!(kept, vec!["unideps", "build", "--strict"]);
  }

  #[test]
  fn unknown_short_flag_is_dropped() {
    let (kept, ignored) = split(&["unideps", "-Z", "info"]);
    assert_eq!(kept, vec!["unideps", "info"]);
    assert_eq!(ignored, vec!["-Z"]);
  }

  #[test]
  fn unknown_flag_takes_its_value_along() {
    let (kept, ignored) = split(&["unideps", "--foo", "bar", "info"]);
    assert_eq!(kept, vec!["unideps", "info"]);
    assert_eq!(ignored, vec!["--foo", "bar"]);

    let cli = Cli::try_parse_from(kept).unwrap();
    assert!(matches!(cli.command, Some(crate::Commands::Info)));
  }

  #[test]
  fn attached_unknown_value_leaves_next_token_alone() {
    let (kept, ignored) = split(&["unideps", "--cuda=12", "-Xfoo", "--deps-dir", "third_party", "info"]);
    assert_eq!(kept, vec!["unideps", "--deps-dir", "third_party", "info"]);
    assert_eq!(ignored, vec!["--cuda=12", "-Xfoo"]);
  }

  #[test]
  fn detached_build_cycles_value_is_attached() {
    let (kept, _) = split(&["unideps", "--build-cycles", "true", "plan"]);
    assert_eq!(kept, vec!["unideps", "--build-cycles=true", "plan"]);

    let cli = Cli::try_parse_from(kept).unwrap();
    assert_eq!(cli.modes.build_cycles, Some(true));
    assert!(matches!(cli.command, Some(crate::Commands::Plan { .. })));
  }

  #[test]
  fn everything_after_double_dash_is_kept() {
    let (kept, ignored) = split(&["unideps", "--nope", "--", "--nope", "x"]);
    assert_eq!(kept, vec!["unideps", "--", "--nope", "x"]);
    assert_eq!(ignored, vec!["--nope"]);
  }

  #[test]
  fn build_cycles_accepts_optional_bool() {
    let cli = Cli::try_parse_from(["unideps", "--build-cycles"]).unwrap();
    assert_eq!(cli.modes.build_cycles, Some(true));

    let cli = Cli::try_parse_from(["unideps", "--build-cycles=no"]).unwrap();
    assert_eq!(cli.modes.build_cycles, Some(false));

    // The value must be attached, so a following subcommand is not swallowed.
    let cli = Cli::try_parse_from(["unideps", "--build-cycles", "status"]).unwrap();
    assert_eq!(cli.modes.build_cycles, Some(true));
    assert!(matches!(cli.command, Some(crate::Commands::Status)));

    let cli = Cli::try_parse_from(["unideps", "info"]).unwrap();
    assert_eq!(cli.modes.build_cycles, None);
  }
}
