//! Plans: ordered grounded action applications, and their mapping back to moves.

use core::fmt;

use dialogue_core::{
    ActivateTrigger, ApplyComboConcept, ApplyConcept, ContextId, GraphError, GraphModel,
    LearnConcept, Move, MoveKind, ObjectRef, PerformBehavior, ShiftContext,
};

use crate::pddl::{ParseError, sexpr};
use crate::synth::{BEHAVIOR_PREFIX, behavior_action_name};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("action '{action}' expects {expected} arguments, found {found}")]
    Arity {
        action: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("context '{context}' has no concept to learn or apply")]
    MissingRequirement { context: String },

    /// The step names objects the graph does not pair with its move, e.g. a
    /// concept that is not the one the target context requires.
    #[error("step {step} does not match the graph, expected {expected}")]
    Mismatch { step: String, expected: String },
}

/// One grounded action application, e.g. `(shift-context player a b)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanStep {
    pub action: String,
    pub args: Vec<String>,
}

impl PlanStep {
    pub fn new<I, S>(action: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: action.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Move kind this action corresponds to, if any.
    pub fn kind(&self) -> Option<MoveKind> {
        match self.action.as_str() {
            "shift-context" => Some(MoveKind::ShiftContext),
            "learn-concept" => Some(MoveKind::LearnConcept),
            "activate-trigger" => Some(MoveKind::ActivateTrigger),
            "apply-concept" => Some(MoveKind::ApplyConcept),
            "apply-combo-concept" => Some(MoveKind::ApplyComboConcept),
            name if name.starts_with(BEHAVIOR_PREFIX) => Some(MoveKind::Behavior),
            _ => None,
        }
    }

    fn expect_arity(&self, expected: usize) -> Result<(), PlanError> {
        if self.args.len() == expected {
            Ok(())
        } else {
            Err(PlanError::Arity {
                action: self.action.clone(),
                expected,
                found: self.args.len(),
            })
        }
    }

    fn context(&self, graph: &GraphModel, index: usize) -> Result<ContextId, PlanError> {
        Ok(graph.context_id(&self.args[index])?)
    }

    /// Maps this step back to the move it stands for.
    ///
    /// Arguments the graph implies (the concepts of an unlock, the parent
    /// context of a trigger, the concept a context provides) must match it.
    /// The agent is not checked; see [`PlanStep::to_move_as`].
    pub fn to_move(&self, graph: &GraphModel) -> Result<Move, PlanError> {
        let mv = self.to_move_unchecked(graph)?;
        // A move whose requirements are missing is left for the engine to reject.
        if let Some(agent) = self.args.first()
            && let Ok(expected) = Self::from_move(graph, agent, &mv)
            && expected != *self
        {
            return Err(PlanError::Mismatch {
                step: self.to_string(),
                expected: expected.to_string(),
            });
        }
        Ok(mv)
    }

    /// [`PlanStep::to_move`] for a step that must be performed by `agent`.
    pub fn to_move_as(&self, graph: &GraphModel, agent: &str) -> Result<Move, PlanError> {
        match self.args.first() {
            Some(found) if found != agent => {
                let mut expected = self.clone();
                expected.args[0] = agent.to_owned();
                Err(PlanError::Mismatch {
                    step: self.to_string(),
                    expected: expected.to_string(),
                })
            }
            _ => self.to_move(graph),
        }
    }

    fn to_move_unchecked(&self, graph: &GraphModel) -> Result<Move, PlanError> {
        let kind = self
            .kind()
            .ok_or_else(|| PlanError::UnknownAction(self.action.clone()))?;

        let mv = match kind {
            MoveKind::ShiftContext => {
                self.expect_arity(3)?;
                ShiftContext::new(self.context(graph, 1)?, self.context(graph, 2)?).into()
            }
            MoveKind::LearnConcept => {
                self.expect_arity(3)?;
                LearnConcept::new(self.context(graph, 1)?).into()
            }
            MoveKind::ActivateTrigger => {
                self.expect_arity(3)?;
                ActivateTrigger::new(graph.trigger_id(&self.args[2])?).into()
            }
            MoveKind::ApplyConcept => {
                self.expect_arity(4)?;
                ApplyConcept::new(self.context(graph, 1)?, self.context(graph, 2)?).into()
            }
            MoveKind::ApplyComboConcept => {
                self.expect_arity(5)?;
                ApplyComboConcept::new(self.context(graph, 1)?, self.context(graph, 2)?).into()
            }
            MoveKind::Behavior => {
                let rule_name = self
                    .action
                    .strip_prefix(BEHAVIOR_PREFIX)
                    .ok_or_else(|| PlanError::UnknownAction(self.action.clone()))?;
                let rule = graph.rule_id(rule_name)?;
                let item = match self.args.as_slice() {
                    [_agent] => None,
                    [_agent, item] => Some(graph.item_id(item)?),
                    _ => {
                        return Err(PlanError::Arity {
                            action: self.action.clone(),
                            expected: 2,
                            found: self.args.len(),
                        });
                    }
                };
                PerformBehavior::new(rule, item).into()
            }
        };
        Ok(mv)
    }

    /// Inverse of [`PlanStep::to_move`]: the grounded action `mv` compiles to.
    pub fn from_move(graph: &GraphModel, agent: &str, mv: &Move) -> Result<Self, PlanError> {
        let name = |object: ObjectRef| -> Result<String, GraphError> {
            graph
                .name_of(object)
                .map(str::to_owned)
                .ok_or(GraphError::UnknownIndex {
                    kind: object.kind(),
                    index: object.index(),
                    generation: graph.generation(),
                })
        };
        let context = |id| name(ObjectRef::Context(id));
        let concept = |id| name(ObjectRef::Concept(id));
        let missing = |id: ContextId| -> PlanError {
            match context(id) {
                Ok(context) => PlanError::MissingRequirement { context },
                Err(err) => err.into(),
            }
        };

        let (action, rest): (String, Vec<String>) = match mv {
            Move::ShiftContext(m) => ("shift-context".into(), vec![context(m.from)?, context(m.to)?]),
            Move::LearnConcept(m) => {
                let provided = graph
                    .require_context(m.context)?
                    .provides_concept
                    .ok_or_else(|| missing(m.context))?;
                ("learn-concept".into(), vec![context(m.context)?, concept(provided)?])
            }
            Move::ActivateTrigger(m) => {
                let trigger = graph.require_trigger(m.trigger)?;
                (
                    "activate-trigger".into(),
                    vec![context(trigger.context)?, trigger.name.clone()],
                )
            }
            Move::ApplyConcept(m) => {
                let required = m.concept(graph).ok_or_else(|| missing(m.target))?;
                (
                    "apply-concept".into(),
                    vec![context(m.from)?, context(m.target)?, concept(required)?],
                )
            }
            Move::ApplyComboConcept(m) => {
                let (first, second) = m.concepts(graph).ok_or_else(|| missing(m.target))?;
                (
                    "apply-combo-concept".into(),
                    vec![
                        context(m.from)?,
                        context(m.target)?,
                        concept(first)?,
                        concept(second)?,
                    ],
                )
            }
            Move::Behavior(m) => {
                let rule = graph.require_rule(m.rule)?;
                let item = m.item.map(|id| name(ObjectRef::Item(id))).transpose()?;
                (behavior_action_name(&rule.name), item.into_iter().collect())
            }
        };

        let mut args = Vec::with_capacity(rest.len() + 1);
        args.push(agent.to_owned());
        args.extend(rest);
        Ok(Self { action, args })
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.action)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        f.write_str(")")
    }
}

/// An ordered, immutable action sequence returned by a solver.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    /// Parses solver output: one `(action arg...)` per line.
    ///
    /// Blank lines and `;` comments are skipped, and a leading `<time>:` or
    /// trailing `[duration]` annotation is tolerated.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut steps = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let code = line.split(';').next().unwrap_or_default().trim();
            if code.is_empty() {
                continue;
            }
            let invalid = || ParseError::InvalidPlanLine {
                line: number + 1,
                text: line.trim().to_owned(),
            };

            let code = match code.split_once(':') {
                Some((time, rest)) if time.trim().parse::<f64>().is_ok() => rest.trim(),
                _ => code,
            };
            let code = match code.rsplit_once('[') {
                Some((head, _)) if code.ends_with(']') => head.trim(),
                _ => code,
            };

            let expr = sexpr::read_one(code).map_err(|_| invalid())?;
            let items = expr.as_list().ok_or_else(invalid)?;
            let mut atoms = items.iter().map(|item| item.as_atom().ok_or_else(invalid));
            let action = atoms.next().ok_or_else(invalid)??.to_owned();
            let args = atoms
                .map(|atom| atom.map(str::to_owned))
                .collect::<Result<Vec<_>, _>>()?;
            steps.push(PlanStep { action, args });
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first(&self) -> Option<&PlanStep> {
        self.steps.first()
    }

    /// Number of context-shift steps.
    pub fn context_shifts(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.kind() == Some(MoveKind::ShiftContext))
            .count()
    }

    pub fn to_moves(&self, graph: &GraphModel) -> Result<Vec<Move>, PlanError> {
        self.steps.iter().map(|step| step.to_move(graph)).collect()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogue_core::{SessionState, fixtures, valid_moves};

    #[test]
    fn parses_solver_output() {
        let plan = Plan::parse(
            "; found by search\n(SHIFT-CONTEXT player a b)\n\n0.000: (learn-concept player b k) [1]\n; cost = 2 (unit cost)\n",
        )
        .unwrap();
        assert_eq!(
            plan.steps,
            vec![
                PlanStep::new("shift-context", ["player", "a", "b"]),
                PlanStep::new("learn-concept", ["player", "b", "k"]),
            ]
        );
        assert_eq!(plan.context_shifts(), 1);
        assert_eq!(plan.to_string(), "(shift-context player a b)\n(learn-concept player b k)\n");
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = Plan::parse("(a b)\nnot a step\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidPlanLine {
                line: 2,
                text: "not a step".into()
            }
        );
        assert!(Plan::parse("((nested))").is_err());
    }

    #[test]
    fn moves_survive_the_round_trip() {
        let graph = fixtures::tavern();
        let state = fixtures::at_neutral_talk(&graph);
        for mv in valid_moves(&graph, &state) {
            let step = PlanStep::from_move(&graph, "player", &mv).unwrap();
            assert_eq!(step.to_move(&graph).unwrap(), mv, "{step}");
        }
    }

    #[test]
    fn behavior_steps_bind_the_item() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let hush = valid_moves(&graph, &state)
            .into_iter()
            .find(|mv| mv.kind() == MoveKind::Behavior)
            .unwrap();

        let step = PlanStep::from_move(&graph, "player", &hush).unwrap();
        assert_eq!(step.to_string(), "(do-rule_hush player item_grey_cloak)");
    }

    #[test]
    fn implied_arguments_must_match_the_graph() {
        let graph = fixtures::tavern();
        let wrong_concept = PlanStep::new(
            "apply-concept",
            ["player", "ctx_tavern_intro", "ctx_neutral_talk", "cpt_local_gossip"],
        );
        assert_eq!(
            wrong_concept.to_move(&graph),
            Err(PlanError::Mismatch {
                step: wrong_concept.to_string(),
                expected: "(apply-concept player ctx_tavern_intro ctx_neutral_talk cpt_quest_none)"
                    .into(),
            })
        );

        let wrong_parent =
            PlanStep::new("activate-trigger", ["player", "ctx_bar_counter", "trig_hear_rumor"]);
        assert!(matches!(wrong_parent.to_move(&graph), Err(PlanError::Mismatch { .. })));

        let right = PlanStep::new(
            "apply-concept",
            ["player", "ctx_tavern_intro", "ctx_neutral_talk", "cpt_quest_none"],
        );
        assert!(right.to_move_as(&graph, "player").is_ok());
        assert_eq!(
            right.to_move_as(&graph, "hero"),
            Err(PlanError::Mismatch {
                step: right.to_string(),
                expected: "(apply-concept hero ctx_tavern_intro ctx_neutral_talk cpt_quest_none)"
                    .into(),
            })
        );
    }

    #[test]
    fn unknown_actions_are_reported() {
        let graph = fixtures::tavern();
        let step = PlanStep::new("dance", ["player"]);
        assert_eq!(step.to_move(&graph), Err(PlanError::UnknownAction("dance".into())));

        let short = PlanStep::new("shift-context", ["player", "ctx_tavern_intro"]);
        assert!(matches!(short.to_move(&graph), Err(PlanError::Arity { expected: 3, .. })));
    }
}
