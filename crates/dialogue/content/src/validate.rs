//! Load-time validation of a whole world.
//!
//! Every character's start session is synthesized, rendered, parsed back and
//! grounded once, so a world that passes here cannot fail synthesis at the
//! first turn of a conversation.

use anyhow::Context as _;
use dialogue_core::{GraphModel, GraphWarning, PlannerConfig, SessionState, analyze};
use planner::{GroundTask, Goal, Synthesizer, pddl};

use crate::loaders::LoadResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterReport {
    pub character: String,
    pub warnings: Vec<GraphWarning>,
    /// Ground actions of the start-state task.
    pub ground_actions: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldReport {
    pub characters: Vec<CharacterReport>,
}

impl WorldReport {
    pub fn warnings(&self) -> impl Iterator<Item = &GraphWarning> {
        self.characters.iter().flat_map(|c| c.warnings.iter())
    }

    pub fn is_clean(&self) -> bool {
        self.warnings().next().is_none()
    }
}

pub fn validate_world(graph: &GraphModel, config: &PlannerConfig) -> LoadResult<WorldReport> {
    let synthesizer = Synthesizer::new(graph, config);
    let mut report = WorldReport::default();

    for def in graph.characters() {
        let name = def.name.as_str();
        let reach = analyze(graph, def.id)?;
        for warning in &reach.warnings {
            tracing::warn!(%warning, "dead content");
        }

        let state = SessionState::new(graph, def.id)?;
        let text = synthesizer
            .synthesize_default(&state, &Goal::TerminalContext)
            .with_context(|| format!("synthesis failed for character '{name}'"))?
            .render();
        let domain = pddl::parse_domain(&text.domain)
            .with_context(|| format!("domain of '{name}' does not parse back"))?;
        let problem = pddl::parse_problem(&text.problem)
            .with_context(|| format!("problem of '{name}' does not parse back"))?;
        let task = GroundTask::new(&domain, &problem)
            .with_context(|| format!("task of '{name}' does not ground"))?;

        tracing::debug!(character = name, actions = task.actions().len(), "character validated");
        report.characters.push(CharacterReport {
            character: name.to_owned(),
            warnings: reach.warnings,
            ground_actions: task.actions().len(),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use dialogue_core::fixtures;

    use super::*;

    #[test]
    fn tavern_validates_cleanly() {
        let report = validate_world(&fixtures::tavern(), &PlannerConfig::default()).unwrap();
        assert_eq!(report.characters.len(), 1);
        assert_eq!(report.characters[0].character, fixtures::BARKEEP);
        assert!(report.characters[0].ground_actions > 0);
    }

    #[test]
    fn vault_reports_its_unreachable_goal() {
        let report = validate_world(&fixtures::sealed_vault(), &PlannerConfig::default()).unwrap();
        assert!(report.warnings().any(|w| matches!(w, GraphWarning::GoalUnreachable { .. })));
    }

    #[test]
    fn invalid_agent_name_fails_validation() {
        let config = PlannerConfig {
            agent: "The Player".into(),
            ..PlannerConfig::default()
        };
        assert!(validate_world(&fixtures::tavern(), &config).is_err());
    }
}
