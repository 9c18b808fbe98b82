//! Arguments and loading shared by every command that works on an atlas.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dialogue_content::{AtlasLoader, ConfigLoader};
use dialogue_core::{GraphModel, PlannerConfig};
use planner::Goal;
use runtime::{Runtime, RuntimeConfig, SessionHandle};

#[derive(Args, Debug)]
pub struct WorldArgs {
    /// World atlas: a `.ron` file or an atlas directory
    #[arg(value_name = "ATLAS")]
    pub atlas: PathBuf,

    /// Planner configuration (TOML); defaults apply when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl WorldArgs {
    pub fn load_graph(&self) -> Result<GraphModel> {
        AtlasLoader::load(&self.atlas)
            .with_context(|| format!("Failed to load atlas {}", self.atlas.display()))
    }

    pub fn planner_config(&self) -> Result<PlannerConfig> {
        match &self.config {
            Some(path) => ConfigLoader::load(path),
            None => Ok(PlannerConfig::default()),
        }
    }

    /// Planner file settings overridden by `NPC_*` environment variables.
    pub fn runtime_config(&self) -> Result<RuntimeConfig> {
        let base = RuntimeConfig {
            planner: self.planner_config()?,
            ..RuntimeConfig::default()
        };
        Ok(base.with_overrides(|name| std::env::var(name).ok())?)
    }
}

/// Goal selection; the character's terminal context when nothing is given.
#[derive(Args, Debug, Default)]
pub struct GoalArgs {
    /// Plan to visit this context instead
    #[arg(long, value_name = "CONTEXT")]
    pub goal_context: Option<String>,

    /// Plan to hold this concept
    #[arg(long, value_name = "CONCEPT")]
    pub goal_concept: Option<String>,
}

impl GoalArgs {
    pub fn resolve(&self, graph: &GraphModel) -> Result<Goal> {
        let mut goals = Vec::new();
        if let Some(context) = &self.goal_context {
            goals.push(Goal::Visited(graph.context_id(context)?));
        }
        if let Some(concept) = &self.goal_concept {
            goals.push(Goal::HoldsConcept(graph.concept_id(concept)?));
        }
        Ok(match goals.len() {
            0 => Goal::TerminalContext,
            1 => goals.remove(0),
            _ => Goal::All(goals),
        })
    }
}

/// Builds a runtime over `graph` and opens one session for `character`.
pub async fn open_session(
    config: RuntimeConfig,
    graph: GraphModel,
    character: &str,
) -> Result<(Runtime, SessionHandle)> {
    let runtime = Runtime::builder().config(config).graph(graph).build().await?;
    let session = runtime.open_session(character).await?;
    Ok((runtime, session))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tavern() -> GraphModel {
        let atlas = concat!(env!("CARGO_MANIFEST_DIR"), "/../dialogue/content/data/tavern");
        AtlasLoader::load(std::path::Path::new(atlas)).unwrap()
    }

    #[test]
    fn goals_default_to_the_terminal_context() {
        assert_eq!(GoalArgs::default().resolve(&tavern()).unwrap(), Goal::TerminalContext);
    }

    #[test]
    fn context_and_concept_goals_combine() {
        let graph = tavern();
        let args = GoalArgs {
            goal_context: Some("ctx_bar_counter".into()),
            goal_concept: Some("cpt_trusted".into()),
        };
        assert_eq!(
            args.resolve(&graph).unwrap(),
            Goal::All(vec![
                Goal::Visited(graph.context_id("ctx_bar_counter").unwrap()),
                Goal::HoldsConcept(graph.concept_id("cpt_trusted").unwrap()),
            ])
        );
    }

    #[test]
    fn unknown_goal_names_are_errors() {
        let args = GoalArgs {
            goal_context: Some("ctx_moon".into()),
            goal_concept: None,
        };
        assert!(args.resolve(&tavern()).is_err());
    }
}
