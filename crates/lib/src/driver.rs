//! Sequential execution of a dependency plan.
//!
//! The driver walks the recipes in order, runs each prelude, passes each gate
//! through [`run_gated`], collects registered artifacts into a [`Registry`], and
//! evaluates post-run checks. Nothing runs concurrently and the first failure
//! ends the run.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::artifacts::Registry;
use crate::config::BuildConfig;
use crate::execute::{ActionStatus, ExecuteError, Runner};
use crate::marker::{GateDecision, GateOutcome, MarkerError, decide, run_gated};
use crate::recipe::Recipe;

#[derive(Debug, Error)]
pub enum DriveError {
  #[error("{recipe}: step '{action}' failed: {source}")]
  Step {
    recipe: String,
    action: String,
    #[source]
    source: ExecuteError,
  },

  #[error(transparent)]
  Marker(#[from] MarkerError),

  #[error("{} registered artifact(s) missing: {}", .missing.len(), .missing.join(", "))]
  MissingArtifacts { missing: Vec<String> },
}

/// What happened to one recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  /// The gate ran its sequence and recorded the new revision.
  Built,
  /// The marker already matched the pin.
  Skipped,
  /// The recipe has no gate; only its prelude ran.
  Ungated,
}

impl From<GateOutcome> for Outcome {
  fn from(outcome: GateOutcome) -> Self {
    match outcome {
      GateOutcome::Built => Self::Built,
      GateOutcome::Skipped => Self::Skipped,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeReport {
  pub name: String,
  pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
  pub recipes: Vec<RecipeReport>,
  pub registry: Registry,
  pub warnings: Vec<String>,
}

impl Report {
  pub fn outcome(&self, name: &str) -> Option<Outcome> {
    self.recipes.iter().find(|r| r.name == name).map(|r| r.outcome)
  }
}

pub struct Driver<R> {
  config: BuildConfig,
  runner: R,
  strict: bool,
}

impl<R: Runner> Driver<R> {
  pub fn new(config: BuildConfig, runner: R) -> Self {
    Self {
      config,
      runner,
      strict: false,
    }
  }

  /// Treat registered artifacts that are missing after the run as fatal.
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  pub fn runner(&self) -> &R {
    &self.runner
  }

  pub async fn run(&mut self, recipes: &[Recipe]) -> Result<Report, DriveError> {
    let mut registry = Registry::new(self.config.platform.triple());
    let mut reports = Vec::with_capacity(recipes.len());
    let mut warnings = Vec::new();

    info!(recipes = recipes.len(), platform = %self.config.platform, "starting dependency build");

    for recipe in recipes {
      info!(recipe = %recipe.name, "processing dependency");
      let outcome = self.run_recipe(recipe).await?;

      registry.artifacts.extend(&recipe.artifacts);
      for flag in &recipe.flags {
        registry.add_flag(flag);
      }
      for target in &recipe.build_targets {
        registry.add_target(target);
      }

      for check in &recipe.checks {
        if let Some(warning) = check.evaluate().await {
          warn!(recipe = %recipe.name, "{warning}");
          warnings.push(warning);
        }
      }

      debug!(recipe = %recipe.name, ?outcome, "dependency done");
      reports.push(RecipeReport {
        name: recipe.name.clone(),
        outcome,
      });
    }

    let missing: Vec<String> = registry
      .artifacts
      .missing()
      .into_iter()
      .map(|a| format!("{} ({})", a.var, a.path.display()))
      .collect();
    if !missing.is_empty() {
      if self.strict {
        return Err(DriveError::MissingArtifacts { missing });
      }
      for entry in missing {
        warn!(artifact = %entry, "registered artifact does not exist");
        warnings.push(format!("missing artifact {entry}"));
      }
    }

    info!(artifacts = registry.artifacts.len(), warnings = warnings.len(), "dependency build complete");
    Ok(Report {
      recipes: reports,
      registry,
      warnings,
    })
  }

  async fn run_recipe(&mut self, recipe: &Recipe) -> Result<Outcome, DriveError> {
    run_actions(&mut self.runner, &recipe.name, &recipe.prelude).await?;

    let Some(gate) = &recipe.gate else {
      return Ok(Outcome::Ungated);
    };

    let runner = &mut self.runner;
    let outcome = run_gated(&gate.marker(), &gate.target, move || {
      run_actions(runner, &recipe.name, &gate.actions)
    })
    .await?;
    Ok(outcome.into())
  }
}

async fn run_actions<R: Runner>(runner: &mut R, recipe: &str, actions: &[Action]) -> Result<(), DriveError> {
  for action in actions {
    info!(recipe, %action, "running");
    let status = runner.run(action).await.map_err(|source| DriveError::Step {
      recipe: recipe.to_string(),
      action: action.to_string(),
      source,
    })?;
    if status == ActionStatus::AlreadySatisfied {
      debug!(recipe, %action, "already satisfied");
    }
  }
  Ok(())
}

/// Gate state of a recipe as seen on disk, without running anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateStatus {
  NeverBuilt,
  UpToDate,
  Stale { last: String },
}

/// Read the marker of `recipe`'s gate; `None` for ungated recipes.
pub async fn gate_status(recipe: &Recipe) -> Result<Option<GateStatus>, MarkerError> {
  let Some(gate) = &recipe.gate else {
    return Ok(None);
  };
  let last = gate.marker().read().await?;
  Ok(Some(match decide(last.as_deref(), &gate.target) {
    GateDecision::Skip => GateStatus::UpToDate,
    GateDecision::Build { last: None } => GateStatus::NeverBuilt,
    GateDecision::Build { last: Some(last) } => GateStatus::Stale { last },
  }))
}
