//! Move dispatch and the three-phase pipeline.

use crate::graph::GraphModel;
use crate::moves::{Move, MoveTransition, SystemAction};
use crate::state::SessionState;

use super::errors::{TransitionError, TransitionPhase, TransitionPhaseError};

/// Runs a transition through its three phases.
///
/// 1. `pre_validate` - check preconditions before mutation
/// 2. `apply` - mutate the session state
/// 3. `post_validate` - verify postconditions after mutation
#[inline]
fn drive_transition<T>(
    transition: &T,
    state: &mut SessionState,
    graph: &GraphModel,
) -> Result<(), TransitionPhaseError<T::Error>>
where
    T: MoveTransition,
{
    transition
        .pre_validate(state, graph)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PreValidate, error))?;

    transition
        .apply(state, graph)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::Apply, error))?;

    transition
        .post_validate(state, graph)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PostValidate, error))
}

pub(super) fn execute_move(
    candidate: &Move,
    state: &mut SessionState,
    graph: &GraphModel,
) -> Result<(), TransitionError> {
    let result = match candidate {
        Move::ShiftContext(transition) => drive_transition(transition, state, graph),
        Move::LearnConcept(transition) => drive_transition(transition, state, graph),
        Move::ActivateTrigger(transition) => drive_transition(transition, state, graph),
        Move::ApplyConcept(transition) => drive_transition(transition, state, graph),
        Move::ApplyComboConcept(transition) => drive_transition(transition, state, graph),
        Move::Behavior(transition) => drive_transition(transition, state, graph),
    };
    result.map_err(|source| TransitionError::invalid_move(candidate.kind(), source))
}

pub(super) fn execute_system(
    action: &SystemAction,
    state: &mut SessionState,
    graph: &GraphModel,
) -> Result<(), TransitionError> {
    let result = match action {
        SystemAction::SetMood(transition) => drive_transition(transition, state, graph),
        SystemAction::GrantItem(transition) => drive_transition(transition, state, graph),
        SystemAction::DropItem(transition) => drive_transition(transition, state, graph),
    };
    result.map_err(|source| TransitionError::invalid_system(*action, source))
}
