use crate::graph::{GraphModel, TriggerId};
use crate::moves::{MoveError, MoveTransition};
use crate::state::SessionState;

/// Fires a trigger bound to the current context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivateTrigger {
    pub trigger: TriggerId,
}

impl ActivateTrigger {
    pub fn new(trigger: TriggerId) -> Self {
        Self { trigger }
    }
}

impl MoveTransition for ActivateTrigger {
    type Error = MoveError;

    fn pre_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        let trigger = graph.require_trigger(self.trigger)?;

        if trigger.context != state.context {
            return Err(MoveError::TriggerNotHere {
                trigger: self.trigger,
                context: state.context,
            });
        }
        if state.exhausted.contains(&self.trigger) {
            return Err(MoveError::TriggerExhausted {
                trigger: self.trigger,
            });
        }
        if let Some(concept) = trigger.requires
            && !state.holds(concept)
        {
            return Err(MoveError::MissingConcept { concept });
        }
        Ok(())
    }

    fn apply(&self, state: &mut SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        let trigger = graph.require_trigger(self.trigger)?;

        if trigger.is_unique {
            state.exhausted.insert(self.trigger);
        }
        state.concepts.extend(trigger.yields.iter().copied());
        for &item in &trigger.gives {
            let possession = graph.require_item(item)?.category.default_possession();
            // Already owned items keep how they are carried.
            state.inventory.entry(item).or_insert(possession);
        }
        Ok(())
    }

    fn post_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        let trigger = graph.require_trigger(self.trigger)?;
        if trigger.is_unique && !state.exhausted.contains(&self.trigger) {
            return Err(MoveError::PostCondition("unique trigger was not exhausted"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::graph::Possession;

    #[test]
    fn unique_trigger_exhausts_and_yields() {
        let graph = fixtures::tavern();
        let mut state = fixtures::at_neutral_talk(&graph);
        let coin = ActivateTrigger::new(graph.trigger_id("trig_find_coin").unwrap());

        coin.pre_validate(&state, &graph).unwrap();
        coin.apply(&mut state, &graph).unwrap();
        coin.post_validate(&state, &graph).unwrap();

        assert!(state.holds(graph.concept_id("cpt_shadow_token").unwrap()));
        assert_eq!(
            state.possession(graph.item_id("item_shadow_coin").unwrap()),
            Some(Possession::Held)
        );
        assert_eq!(
            coin.pre_validate(&state, &graph),
            Err(MoveError::TriggerExhausted {
                trigger: coin.trigger
            })
        );
    }

    #[test]
    fn gated_trigger_requires_concept() {
        let graph = fixtures::tavern();
        let mut state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        state.context = graph.context_id("ctx_bar_counter").unwrap();
        let secret = ActivateTrigger::new(graph.trigger_id("trig_share_secret").unwrap());

        let err = secret.pre_validate(&state, &graph).unwrap_err();
        assert!(matches!(err, MoveError::MissingConcept { .. }));
    }

    #[test]
    fn trigger_outside_current_context_is_rejected() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let coin = ActivateTrigger::new(graph.trigger_id("trig_find_coin").unwrap());
        assert!(matches!(
            coin.pre_validate(&state, &graph),
            Err(MoveError::TriggerNotHere { .. })
        ));
    }
}
