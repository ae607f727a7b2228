mod args;
mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap::builder::BoolishValueParser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use unideps_lib::platform::os::Os;

use crate::cmd::{cmd_build, cmd_info, cmd_plan, cmd_status};
use crate::output::OutputFormat;

/// Fetch, patch and build the native dependencies of UniRender
#[derive(Parser)]
#[command(name = "unideps")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to a config file (default: unideps.toml in the project root)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Project root (default: current directory)
  #[arg(long, global = true)]
  root: Option<PathBuf>,

  /// Output format
  #[arg(short = 'o', long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(flatten)]
  modes: ModeArgs,

  /// Defaults to `build`
  #[command(subcommand)]
  command: Option<Commands>,
}

/// Switches shared by every command that computes a plan.
#[derive(Args, Debug, Clone, Default)]
pub struct ModeArgs {
  /// Build Cycles locally instead of downloading the prebuilt bundle
  #[arg(
    long,
    global = true,
    num_args = 0..=1,
    require_equals = true,
    default_missing_value = "true",
    value_parser = BoolishValueParser::new()
  )]
  pub build_cycles: Option<bool>,

  /// Build everything that can be built locally
  #[arg(long, global = true)]
  pub build_all: bool,

  /// Compile Cycles' dependencies from source instead of using Blender's prebuilt libraries
  #[arg(long, global = true)]
  pub source_deps: bool,

  /// Where dependencies are cloned and built
  #[arg(long, global = true)]
  pub deps_dir: Option<PathBuf>,

  /// Where prebuilt bundles are extracted
  #[arg(long, global = true)]
  pub install_dir: Option<PathBuf>,

  /// CMake generator
  #[arg(long, global = true)]
  pub generator: Option<String>,

  /// CMake build configuration
  #[arg(long, global = true)]
  pub build_config: Option<String>,

  /// Parallel jobs for the native build tool
  #[arg(short, long, global = true)]
  pub jobs: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch, patch and build every dependency
  Build {
    /// Fail when a registered artifact is missing after the run
    #[arg(long)]
    strict: bool,
  },

  /// Show the recipes and their actions without running anything
  Plan {
    /// Plan for another platform
    #[arg(long)]
    platform: Option<Os>,
  },

  /// Show whether each gated dependency is built at its pinned revision
  Status,

  /// Show platform and resolved configuration
  Info,
}

fn main() -> Result<()> {
  let (argv, ignored) = args::split_known(std::env::args(), &Cli::command());
  let cli = Cli::parse_from(argv);

  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  for arg in &ignored {
    debug!(arg = %arg, "ignoring unrecognized argument");
  }

  let global = cmd::GlobalArgs {
    config: cli.config,
    root: cli.root,
    modes: cli.modes,
    output: cli.output,
  };

  match cli.command.unwrap_or(Commands::Build { strict: false }) {
    Commands::Build { strict } => cmd_build(&global, strict),
    Commands::Plan { platform } => cmd_plan(&global, platform),
    Commands::Status => cmd_status(&global),
    Commands::Info => cmd_info(&global),
  }
}
