//! Plan synthesis: graph + session snapshot -> planning domain and problem.
//!
//! Synthesis builds an AST and renders it with the deterministic printer, so
//! identical inputs always yield byte-identical text. Behavior rules are
//! canonicalized (sorted, deduplicated) before compilation and the goal only
//! ever changes the `:goal` section.

mod domain;
mod problem;

pub use domain::{BEHAVIOR_PREFIX, DOMAIN_NAME, behavior_action, behavior_action_name};
pub use problem::PROBLEM_NAME;

use std::collections::HashMap;

use dialogue_core::{
    DialogueError, ErrorSeverity, GraphError, GraphModel, ObjectKind, PlannerConfig, RuleId,
    SessionState, is_valid_identifier,
};

use crate::pddl::{Domain, Effect, Formula, Problem, Term};

/// Goal condition of a synthesized problem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Goal {
    /// The character's configured terminal context has been visited.
    #[default]
    TerminalContext,
    Visited(dialogue_core::ContextId),
    HoldsConcept(dialogue_core::ConceptId),
    Fired(RuleId),
    /// Every listed goal holds at once.
    All(Vec<Goal>),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error(transparent)]
    UnknownReference(#[from] GraphError),

    #[error("{kind} '{name}' does not belong to character '{character}'")]
    ForeignObject {
        kind: ObjectKind,
        name: String,
        character: String,
    },

    #[error("agent name '{0}' is not a valid planning identifier")]
    InvalidAgentName(String),

    #[error("'{name}' is bound as both {first} and {second}")]
    ConflictingBinding {
        name: String,
        first: String,
        second: String,
    },

    #[error("action '{action}' references undeclared symbol '{name}'")]
    UndeclaredSymbol { action: String, name: String },

    #[error("session is bound to graph generation {state}, synthesizing against {graph}")]
    GenerationMismatch { state: u64, graph: u64 },
}

impl DialogueError for SynthesisError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownReference(_)
            | Self::ForeignObject { .. }
            | Self::InvalidAgentName(_)
            | Self::GenerationMismatch { .. } => ErrorSeverity::Validation,
            Self::ConflictingBinding { .. } | Self::UndeclaredSymbol { .. } => {
                ErrorSeverity::Internal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownReference(_) => "SYNTH_UNKNOWN_REFERENCE",
            Self::ForeignObject { .. } => "SYNTH_FOREIGN_OBJECT",
            Self::InvalidAgentName(_) => "SYNTH_INVALID_AGENT_NAME",
            Self::ConflictingBinding { .. } => "SYNTH_CONFLICTING_BINDING",
            Self::UndeclaredSymbol { .. } => "SYNTH_UNDECLARED_SYMBOL",
            Self::GenerationMismatch { .. } => "SYNTH_GENERATION_MISMATCH",
        }
    }
}

/// Rendered planning texts handed to a solver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskText {
    pub domain: String,
    pub problem: String,
}

/// A synthesized domain/problem pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanningTask {
    pub domain: Domain,
    pub problem: Problem,
}

impl PlanningTask {
    pub fn render(&self) -> TaskText {
        TaskText {
            domain: self.domain.to_string(),
            problem: self.problem.to_string(),
        }
    }
}

/// Synthesizes planning tasks against one graph snapshot.
#[derive(Clone, Debug)]
pub struct Synthesizer<'g> {
    graph: &'g GraphModel,
    agent: String,
}

impl<'g> Synthesizer<'g> {
    pub fn new(graph: &'g GraphModel, config: &PlannerConfig) -> Self {
        Self {
            graph,
            agent: config.agent.clone(),
        }
    }

    pub fn graph(&self) -> &'g GraphModel {
        self.graph
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Synthesizes with every behavior rule the session's character owns.
    pub fn synthesize_default(
        &self,
        state: &SessionState,
        goal: &Goal,
    ) -> Result<PlanningTask, SynthesisError> {
        let rules = self.graph.require_character(state.character)?.rules.clone();
        self.synthesize(state, &rules, goal)
    }

    pub fn synthesize(
        &self,
        state: &SessionState,
        rules: &[RuleId],
        goal: &Goal,
    ) -> Result<PlanningTask, SynthesisError> {
        if state.generation != self.graph.generation() {
            return Err(SynthesisError::GenerationMismatch {
                state: state.generation,
                graph: self.graph.generation(),
            });
        }
        if !is_valid_identifier(&self.agent) {
            return Err(SynthesisError::InvalidAgentName(self.agent.clone()));
        }

        let character = self.graph.require_character(state.character)?;

        let mut canonical = rules.to_vec();
        canonical.sort_unstable();
        canonical.dedup();
        let mut compiled = Vec::with_capacity(canonical.len());
        for id in canonical {
            let rule = self.graph.require_rule(id)?;
            if rule.character != character.id {
                return Err(SynthesisError::ForeignObject {
                    kind: ObjectKind::Rule,
                    name: rule.name.clone(),
                    character: character.name.clone(),
                });
            }
            compiled.push(rule);
        }

        let domain = domain::build(self.graph, &compiled)?;
        let problem = problem::build(
            &problem::ProblemInput {
                graph: self.graph,
                character,
                state,
                agent: &self.agent,
                domain: &domain,
            },
            goal,
        )?;

        let task = PlanningTask { domain, problem };
        check_bindings(&task)?;

        tracing::debug!(
            character = %character.name,
            rules = compiled.len(),
            facts = task.problem.init.len(),
            "synthesized planning task"
        );
        Ok(task)
    }
}

/// Synthesizes and renders in one call.
pub fn synthesize(
    graph: &GraphModel,
    state: &SessionState,
    rules: &[RuleId],
    goal: &Goal,
    config: &PlannerConfig,
) -> Result<TaskText, SynthesisError> {
    Synthesizer::new(graph, config)
        .synthesize(state, rules, goal)
        .map(|task| task.render())
}

/// Every symbol has exactly one type and every constant used by an action,
/// fact or goal is declared.
fn check_bindings(task: &PlanningTask) -> Result<(), SynthesisError> {
    let mut bindings: HashMap<&str, &str> = HashMap::new();
    for typed in task.domain.constants.iter().chain(&task.problem.objects) {
        if let Some(first) = bindings.insert(typed.name.as_str(), typed.ty.as_str())
            && first != typed.ty
        {
            return Err(SynthesisError::ConflictingBinding {
                name: typed.name.clone(),
                first: first.to_owned(),
                second: typed.ty.clone(),
            });
        }
    }

    let undeclared = |action: &str, name: &str| SynthesisError::UndeclaredSymbol {
        action: action.to_owned(),
        name: name.to_owned(),
    };

    for action in &task.domain.actions {
        let mut constants = Vec::new();
        formula_constants(&action.precondition, &mut constants);
        effect_constants(&action.effect, &mut constants);
        if let Some(name) = constants.into_iter().find(|name| !bindings.contains_key(name)) {
            return Err(undeclared(&action.name, name));
        }
    }
    for fact in &task.problem.init {
        if let Some(name) = fact.args.iter().find(|arg| !bindings.contains_key(arg.as_str())) {
            return Err(undeclared(":init", name));
        }
    }
    let mut constants = Vec::new();
    formula_constants(&task.problem.goal, &mut constants);
    if let Some(name) = constants.into_iter().find(|name| !bindings.contains_key(name)) {
        return Err(undeclared(":goal", name));
    }
    Ok(())
}

fn term_constants<'a>(args: &'a [Term], out: &mut Vec<&'a str>) {
    out.extend(args.iter().filter_map(|term| match term {
        Term::Const(name) => Some(name.as_str()),
        Term::Var(_) => None,
    }));
}

fn formula_constants<'a>(formula: &'a Formula, out: &mut Vec<&'a str>) {
    match formula {
        Formula::Atom(atom) => term_constants(&atom.args, out),
        Formula::Not(inner) | Formula::Forall(_, inner) => formula_constants(inner, out),
        Formula::And(parts) | Formula::Or(parts) => {
            parts.iter().for_each(|part| formula_constants(part, out));
        }
        Formula::Imply(premise, conclusion) => {
            formula_constants(premise, out);
            formula_constants(conclusion, out);
        }
    }
}

fn effect_constants<'a>(effect: &'a Effect, out: &mut Vec<&'a str>) {
    match effect {
        Effect::Add(atom) | Effect::Del(atom) => term_constants(&atom.args, out),
        Effect::And(parts) => parts.iter().for_each(|part| effect_constants(part, out)),
        Effect::Forall(_, body) => effect_constants(body, out),
        Effect::When(condition, body) => {
            formula_constants(condition, out);
            effect_constants(body, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogue_core::fixtures;

    fn barkeep_task(config: &PlannerConfig) -> Result<PlanningTask, SynthesisError> {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        Synthesizer::new(&graph, config).synthesize_default(&state, &Goal::TerminalContext)
    }

    #[test]
    fn initial_facts_mirror_the_session() {
        let task = barkeep_task(&PlannerConfig::default()).unwrap();
        let text = task.render().problem;

        for fact in [
            "(active-context player ctx_tavern_intro)",
            "(has-concept player cpt_quest_none)",
            "(locked ctx_neutral_talk)",
            "(requires-combo ctx_shadow_entry cpt_shadow_rumor cpt_shadow_token)",
            "(current-mood player neutral)",
            "(holding player item_focus_stone)",
            "(wearing player item_grey_cloak)",
            "(visited ctx_tavern_intro)",
        ] {
            assert!(text.contains(fact), "missing {fact}");
        }
        assert!(text.contains("(:goal (visited ctx_shadow_den))"));
    }

    #[test]
    fn goal_override_only_changes_the_goal() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let synth = Synthesizer::new(&graph, &PlannerConfig::default());

        let terminal = synth.synthesize_default(&state, &Goal::TerminalContext).unwrap();
        let trusted = Goal::HoldsConcept(graph.concept_id("cpt_trusted").unwrap());
        let quest = synth.synthesize_default(&state, &trusted).unwrap();

        assert_eq!(terminal.render().domain, quest.render().domain);
        assert_eq!(terminal.problem.init, quest.problem.init);
        assert_eq!(terminal.problem.objects, quest.problem.objects);
        assert_eq!(quest.problem.goal.to_string(), "(has-concept player cpt_trusted)");
    }

    #[test]
    fn rule_order_does_not_change_the_text() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let config = PlannerConfig::default();
        let mut rules = graph.character(state.character).unwrap().rules.clone();

        let forward = synthesize(&graph, &state, &rules, &Goal::TerminalContext, &config).unwrap();
        rules.reverse();
        rules.push(rules[0]);
        let backward = synthesize(&graph, &state, &rules, &Goal::TerminalContext, &config).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn agent_name_clashing_with_a_tag_is_rejected() {
        let config = PlannerConfig {
            agent: "focus".into(),
            ..PlannerConfig::default()
        };
        assert!(matches!(
            barkeep_task(&config),
            Err(SynthesisError::ConflictingBinding { .. })
        ));

        let config = PlannerConfig {
            agent: "The Player".into(),
            ..PlannerConfig::default()
        };
        assert_eq!(
            barkeep_task(&config).unwrap_err().error_code(),
            "SYNTH_INVALID_AGENT_NAME"
        );
    }

    #[test]
    fn foreign_rules_and_goals_are_rejected() {
        let mut builder = fixtures::tavern_builder();
        builder.character(dialogue_core::CharacterSpec {
            id: "mira".into(),
            goal: "mira_home".into(),
            contexts: vec![dialogue_core::ContextSpec::new("mira_home").start()],
            behavior_rules: vec![dialogue_core::RuleSpec::new(
                "rule_wave",
                "neutral",
                dialogue_core::ItemCondition::Unrestricted,
            )],
            ..Default::default()
        });
        let graph = builder.build().unwrap();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let synth = Synthesizer::new(&graph, &PlannerConfig::default());

        let wave = graph.rule_id("rule_wave").unwrap();
        assert!(matches!(
            synth.synthesize(&state, &[wave], &Goal::TerminalContext),
            Err(SynthesisError::ForeignObject { kind: ObjectKind::Rule, .. })
        ));

        let home = graph.context_id("mira_home").unwrap();
        assert!(matches!(
            synth.synthesize(&state, &[], &Goal::Visited(home)),
            Err(SynthesisError::ForeignObject { kind: ObjectKind::Context, .. })
        ));
    }

    #[test]
    fn stale_sessions_are_rejected() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let reloaded = fixtures::tavern().with_generation(9);
        let err = Synthesizer::new(&reloaded, &PlannerConfig::default())
            .synthesize(&state, &[], &Goal::TerminalContext)
            .unwrap_err();
        assert_eq!(err, SynthesisError::GenerationMismatch { state: 0, graph: 9 });
    }
}
