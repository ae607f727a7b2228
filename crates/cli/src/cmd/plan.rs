//! Implementation of the `unideps plan` command.
//!
//! Prints every recipe with its actions for the chosen platform. Nothing is
//! executed and nothing on disk is read apart from the config file.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use unideps_lib::platform::os::Os;
use unideps_lib::recipe::plan;

use super::{GlobalArgs, load_config};
use crate::output::{print_info, print_json, symbols, truncate_hash};

pub fn cmd_plan(global: &GlobalArgs, platform: Option<Os>) -> Result<()> {
  let config = load_config(global, platform)?;
  let recipes = plan(&config);

  if global.output.is_json() {
    return print_json(&recipes);
  }

  print_info(&format!("Plan for {} ({} recipes)", config.platform, recipes.len()));
  for recipe in &recipes {
    println!();
    println!("{}", recipe.name.if_supports_color(Stream::Stdout, |s| s.bold()));
    for action in &recipe.prelude {
      println!("  {} {action}", symbols::ARROW);
    }
    if let Some(gate) = &recipe.gate {
      println!(
        "  {} {}",
        "unless built at".if_supports_color(Stream::Stdout, |s| s.dimmed()),
        truncate_hash(&gate.target)
      );
      for action in &gate.actions {
        println!("    {} {action}", symbols::ARROW);
      }
    }
    for artifact in recipe.artifacts.iter() {
      println!(
        "  {} {}",
        symbols::INFO,
        artifact.cmake_arg().if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
    for target in &recipe.build_targets {
      println!("  {} target {target}", symbols::INFO);
    }
  }
  Ok(())
}
