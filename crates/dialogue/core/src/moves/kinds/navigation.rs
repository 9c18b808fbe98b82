use crate::graph::{ContextId, GraphModel};
use crate::moves::{MoveError, MoveTransition};
use crate::state::SessionState;

pub(crate) fn expect_current(state: &SessionState, context: ContextId) -> Result<(), MoveError> {
    if state.context == context {
        Ok(())
    } else {
        Err(MoveError::WrongContext {
            expected: context,
            actual: state.context,
        })
    }
}

/// Moves the conversation along a connection into an unlocked context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftContext {
    pub from: ContextId,
    pub to: ContextId,
}

impl ShiftContext {
    pub fn new(from: ContextId, to: ContextId) -> Self {
        Self { from, to }
    }
}

impl MoveTransition for ShiftContext {
    type Error = MoveError;

    fn pre_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        expect_current(state, self.from)?;
        graph.require_context(self.to)?;

        if !graph.require_context(self.from)?.connects_to(self.to) {
            return Err(MoveError::NotConnected {
                from: self.from,
                to: self.to,
            });
        }
        if state.is_locked(graph, self.to) {
            return Err(MoveError::TargetLocked { context: self.to });
        }
        Ok(())
    }

    fn apply(&self, state: &mut SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        let target = graph.require_context(self.to)?;

        state.context = self.to;
        state.visited.insert(self.to);

        // Entry effects land together with the move.
        if let Some(mood) = target.induces_mood {
            state.mood = mood;
        }
        if let Some(concept) = target.provides_concept {
            state.concepts.insert(concept);
        }
        Ok(())
    }

    fn post_validate(&self, state: &SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        if state.context == self.to && state.visited.contains(&self.to) {
            Ok(())
        } else {
            Err(MoveError::PostCondition("target context was not entered"))
        }
    }
}

/// Picks up the concept provided by the current context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LearnConcept {
    pub context: ContextId,
}

impl LearnConcept {
    pub fn new(context: ContextId) -> Self {
        Self { context }
    }
}

impl MoveTransition for LearnConcept {
    type Error = MoveError;

    fn pre_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        expect_current(state, self.context)?;
        let concept = graph
            .require_context(self.context)?
            .provides_concept
            .ok_or(MoveError::NothingProvided {
                context: self.context,
            })?;
        if state.holds(concept) {
            return Err(MoveError::ConceptAlreadyHeld { concept });
        }
        Ok(())
    }

    fn apply(&self, state: &mut SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        state.concepts.extend(graph.require_context(self.context)?.provides_concept);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn shift_into_locked_context_is_rejected() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let intro = graph.context_id("ctx_tavern_intro").unwrap();
        let talk = graph.context_id("ctx_neutral_talk").unwrap();

        let err = ShiftContext::new(intro, talk)
            .pre_validate(&state, &graph)
            .unwrap_err();
        assert_eq!(err, MoveError::TargetLocked { context: talk });
    }

    #[test]
    fn shift_requires_a_connection() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let intro = graph.context_id("ctx_tavern_intro").unwrap();
        let den = graph.context_id("ctx_shadow_den").unwrap();

        let err = ShiftContext::new(intro, den)
            .pre_validate(&state, &graph)
            .unwrap_err();
        assert!(matches!(err, MoveError::NotConnected { .. }));
    }

    #[test]
    fn shift_applies_entry_effects() {
        let graph = fixtures::tavern();
        let mut state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let intro = graph.context_id("ctx_tavern_intro").unwrap();
        let counter = graph.context_id("ctx_bar_counter").unwrap();

        let shift = ShiftContext::new(intro, counter);
        shift.pre_validate(&state, &graph).unwrap();
        shift.apply(&mut state, &graph).unwrap();
        shift.post_validate(&state, &graph).unwrap();

        assert_eq!(state.context, counter);
        assert_eq!(graph.mood(state.mood).unwrap().name, "joyful");
        assert!(state.holds(graph.concept_id("cpt_local_gossip").unwrap()));
    }

    #[test]
    fn learning_a_held_concept_is_rejected() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let intro = graph.context_id("ctx_tavern_intro").unwrap();

        let err = LearnConcept::new(intro).pre_validate(&state, &graph).unwrap_err();
        assert!(matches!(err, MoveError::ConceptAlreadyHeld { .. }));
    }
}
