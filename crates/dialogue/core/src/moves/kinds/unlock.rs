use crate::graph::{ConceptId, ContextDef, ContextId, GraphModel};
use crate::moves::{MoveError, MoveTransition};
use crate::state::SessionState;

use super::navigation::expect_current;

/// Shared checks for both unlock variants: the target is adjacent and still locked.
fn locked_neighbour<'g>(
    state: &SessionState,
    graph: &'g GraphModel,
    from: ContextId,
    target: ContextId,
) -> Result<&'g ContextDef, MoveError> {
    expect_current(state, from)?;
    let def = graph.require_context(target)?;
    if !graph.require_context(from)?.connects_to(target) {
        return Err(MoveError::NotConnected { from, to: target });
    }
    if !state.is_locked(graph, target) {
        return Err(MoveError::AlreadyUnlocked { context: target });
    }
    Ok(def)
}

fn require_held(state: &SessionState, concept: ConceptId) -> Result<(), MoveError> {
    if state.holds(concept) {
        Ok(())
    } else {
        Err(MoveError::MissingConcept { concept })
    }
}

fn ensure_unlocked(
    state: &SessionState,
    graph: &GraphModel,
    target: ContextId,
) -> Result<(), MoveError> {
    if state.is_locked(graph, target) {
        Err(MoveError::PostCondition("target context is still locked"))
    } else {
        Ok(())
    }
}

/// Opens an adjacent context locked by a single concept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApplyConcept {
    pub from: ContextId,
    pub target: ContextId,
}

impl ApplyConcept {
    pub fn new(from: ContextId, target: ContextId) -> Self {
        Self { from, target }
    }

    pub fn concept(&self, graph: &GraphModel) -> Option<ConceptId> {
        graph.context(self.target)?.required_concept
    }
}

impl MoveTransition for ApplyConcept {
    type Error = MoveError;

    fn pre_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        let def = locked_neighbour(state, graph, self.from, self.target)?;
        let concept = def.required_concept.ok_or(MoveError::RequirementMismatch {
            context: self.target,
        })?;
        require_held(state, concept)
    }

    fn apply(&self, state: &mut SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        state.unlocked.insert(self.target);
        Ok(())
    }

    fn post_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        ensure_unlocked(state, graph, self.target)
    }
}

/// Opens an adjacent context locked by a pair of concepts held together.
///
/// Both concepts remain held afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApplyComboConcept {
    pub from: ContextId,
    pub target: ContextId,
}

impl ApplyComboConcept {
    pub fn new(from: ContextId, target: ContextId) -> Self {
        Self { from, target }
    }

    pub fn concepts(&self, graph: &GraphModel) -> Option<(ConceptId, ConceptId)> {
        graph.context(self.target)?.required_combo
    }
}

impl MoveTransition for ApplyComboConcept {
    type Error = MoveError;

    fn pre_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        let def = locked_neighbour(state, graph, self.from, self.target)?;
        let (first, second) = def.required_combo.ok_or(MoveError::RequirementMismatch {
            context: self.target,
        })?;
        require_held(state, first)?;
        require_held(state, second)
    }

    fn apply(&self, state: &mut SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        state.unlocked.insert(self.target);
        Ok(())
    }

    fn post_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        ensure_unlocked(state, graph, self.target)
    }
}
