//! State Transition Engine.
//!
//! The [`TransitionEngine`] is the only writer of [`SessionState`]. Every move
//! runs the `pre_validate -> apply -> post_validate` pipeline on a working
//! copy; the copy is returned only when all phases and the session invariants
//! hold, so a rejected move leaves the caller's state untouched.

mod errors;
mod transition;

pub use errors::{TransitionError, TransitionPhase, TransitionPhaseError};

use crate::graph::{GraphModel, RuleId};
use crate::moves::{Move, SystemAction};
use crate::state::{SessionState, StateDelta};

/// Result of a committed transition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    /// New state snapshot.
    pub state: SessionState,

    /// What changed relative to the previous state.
    pub delta: StateDelta,

    /// Behavior rule whose narrative event fired, if the move was a behavior.
    pub event: Option<RuleId>,
}

/// Applies moves against a borrowed graph snapshot.
#[derive(Clone, Copy, Debug)]
pub struct TransitionEngine<'a> {
    graph: &'a GraphModel,
}

impl<'a> TransitionEngine<'a> {
    pub fn new(graph: &'a GraphModel) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'a GraphModel {
        self.graph
    }

    /// Applies one legal move.
    ///
    /// Fails with [`TransitionError::InvalidMove`] when the move is not in
    /// the current legal set.
    pub fn apply(&self, state: &SessionState, candidate: &Move) -> Result<Transition, TransitionError> {
        self.check_generation(state)?;

        let mut next = state.clone();
        transition::execute_move(candidate, &mut next, self.graph)?;
        let transition = self.commit(state, next)?;

        tracing::debug!(
            action = %candidate.describe(self.graph),
            nonce = transition.state.nonce,
            "move applied"
        );

        Ok(Transition {
            event: match candidate {
                Move::Behavior(behavior) => Some(behavior.rule),
                _ => None,
            },
            ..transition
        })
    }

    /// Applies an explicit mood or inventory change.
    pub fn apply_system(
        &self,
        state: &SessionState,
        action: &SystemAction,
    ) -> Result<Transition, TransitionError> {
        self.check_generation(state)?;

        let mut next = state.clone();
        transition::execute_system(action, &mut next, self.graph)?;
        let transition = self.commit(state, next)?;

        tracing::debug!(%action, nonce = transition.state.nonce, "system action applied");
        Ok(transition)
    }

    fn check_generation(&self, state: &SessionState) -> Result<(), TransitionError> {
        if state.generation == self.graph.generation() {
            Ok(())
        } else {
            Err(TransitionError::GenerationMismatch {
                state: state.generation,
                graph: self.graph.generation(),
            })
        }
    }

    fn commit(
        &self,
        before: &SessionState,
        mut after: SessionState,
    ) -> Result<Transition, TransitionError> {
        check_invariants(before, &after)?;

        // Increment nonce after successful execution
        after.nonce += 1;

        Ok(Transition {
            delta: StateDelta::from_states(before, &after),
            state: after,
            event: None,
        })
    }
}

fn check_invariants(before: &SessionState, after: &SessionState) -> Result<(), TransitionError> {
    if !after.concepts.is_superset(&before.concepts) {
        return Err(TransitionError::InvariantViolated("held concepts shrank"));
    }
    if !after.visited.is_superset(&before.visited) {
        return Err(TransitionError::InvariantViolated("visited contexts shrank"));
    }
    if !after.exhausted.is_superset(&before.exhausted) {
        return Err(TransitionError::InvariantViolated("exhausted triggers shrank"));
    }
    if !after.visited.contains(&after.context) {
        return Err(TransitionError::InvariantViolated(
            "current context is not marked visited",
        ));
    }
    Ok(())
}

/// Applies `candidate` to `state` and returns the new state.
pub fn apply(
    graph: &GraphModel,
    state: &SessionState,
    candidate: &Move,
) -> Result<SessionState, TransitionError> {
    TransitionEngine::new(graph)
        .apply(state, candidate)
        .map(|transition| transition.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DialogueError, ErrorSeverity};
    use crate::fixtures;
    use crate::graph::Possession;
    use crate::moves::{ActivateTrigger, ApplyConcept, MoveError, MoveKind, ShiftContext};

    #[test]
    fn rejected_move_leaves_state_untouched() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let intro = graph.context_id("ctx_tavern_intro").unwrap();
        let talk = graph.context_id("ctx_neutral_talk").unwrap();
        let snapshot = state.clone();

        let err = TransitionEngine::new(&graph)
            .apply(&state, &ShiftContext::new(intro, talk).into())
            .unwrap_err();

        assert_eq!(
            err,
            TransitionError::InvalidMove {
                kind: MoveKind::ShiftContext,
                source: TransitionPhaseError::new(
                    TransitionPhase::PreValidate,
                    MoveError::TargetLocked { context: talk }
                ),
            }
        );
        assert!(err.severity().is_recoverable());
        assert_eq!(err.error_code(), "MOVE_TARGET_LOCKED");
        assert_eq!(state, snapshot);
    }

    #[test]
    fn successful_move_reports_delta_and_bumps_nonce() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let intro = graph.context_id("ctx_tavern_intro").unwrap();
        let talk = graph.context_id("ctx_neutral_talk").unwrap();

        let engine = TransitionEngine::new(&graph);
        let unlocked = engine.apply(&state, &ApplyConcept::new(intro, talk).into()).unwrap();
        assert_eq!(unlocked.delta.unlocked, vec![talk]);
        assert_eq!(unlocked.state.nonce, 1);
        assert_eq!(unlocked.event, None);

        let shifted = engine
            .apply(&unlocked.state, &ShiftContext::new(intro, talk).into())
            .unwrap();
        assert_eq!(shifted.delta.context, Some((intro, talk)));
        assert_eq!(shifted.delta.visited, vec![talk]);
        assert_eq!(shifted.state.nonce, 2);
    }

    #[test]
    fn unknown_trigger_is_an_unknown_reference() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let missing = crate::graph::TriggerId(4_000);
        let err = apply(&graph, &state, &ActivateTrigger::new(missing).into()).unwrap_err();
        assert!(matches!(err, TransitionError::UnknownReference(_)));
        assert_eq!(err.severity(), ErrorSeverity::Validation);
    }

    #[test]
    fn stale_generation_is_rejected() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let reloaded = fixtures::tavern().with_generation(1);
        let intro = graph.context_id("ctx_tavern_intro").unwrap();
        let counter = graph.context_id("ctx_bar_counter").unwrap();

        let err = apply(&reloaded, &state, &ShiftContext::new(intro, counter).into()).unwrap_err();
        assert_eq!(err, TransitionError::GenerationMismatch { state: 0, graph: 1 });
    }

    #[test]
    fn system_actions_change_mood_and_inventory() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let engine = TransitionEngine::new(&graph);
        let angry = graph.mood_id("angry").unwrap();
        let coin = graph.item_id("item_shadow_coin").unwrap();
        let stone = graph.item_id("item_focus_stone").unwrap();

        let moody = engine.apply_system(&state, &SystemAction::set_mood(angry)).unwrap();
        assert_eq!(moody.delta.mood, Some((state.mood, angry)));

        let granted = engine
            .apply_system(&moody.state, &SystemAction::grant_item(coin, Possession::Held))
            .unwrap();
        assert_eq!(granted.delta.items_gained, vec![(coin, Possession::Held)]);

        let dropped = engine
            .apply_system(&granted.state, &SystemAction::drop_item(stone))
            .unwrap();
        assert_eq!(dropped.delta.items_lost, vec![stone]);

        let err = engine
            .apply_system(&dropped.state, &SystemAction::drop_item(stone))
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidSystemAction { .. }));
    }
}
