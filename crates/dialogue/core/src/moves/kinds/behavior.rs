use crate::graph::{GraphModel, ItemCondition, ItemId, RuleId};
use crate::moves::{MoveError, MoveTransition};
use crate::state::SessionState;

/// Performs a mood/tag-gated behavior rule.
///
/// `item` binds the carried item that satisfies a tag condition and is `None`
/// for rules without one. The only effect is recording that the rule fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformBehavior {
    pub rule: RuleId,
    pub item: Option<ItemId>,
}

impl PerformBehavior {
    pub fn new(rule: RuleId, item: Option<ItemId>) -> Self {
        Self { rule, item }
    }
}

impl MoveTransition for PerformBehavior {
    type Error = MoveError;

    fn pre_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), Self::Error> {
        let rule = graph.require_rule(self.rule)?;

        if rule.character != state.character {
            return Err(MoveError::ForeignRule { rule: self.rule });
        }
        if rule.mood != state.mood {
            return Err(MoveError::MoodMismatch {
                rule: self.rule,
                required: rule.mood,
                current: state.mood,
            });
        }

        let unmet = MoveError::ItemConditionUnmet { rule: self.rule };
        match (&rule.condition, self.item) {
            (ItemCondition::Unrestricted, None) => Ok(()),
            (ItemCondition::EmptyHanded, None) if state.is_empty_handed() => Ok(()),
            (ItemCondition::EmptyHanded, None) => Err(MoveError::HandsNotEmpty { rule: self.rule }),
            (ItemCondition::Unrestricted | ItemCondition::EmptyHanded, Some(_)) => Err(unmet),
            (condition, Some(item)) => {
                let possession = state
                    .possession(item)
                    .ok_or(MoveError::ItemNotCarried { item })?;
                let tagged = condition
                    .tag()
                    .is_some_and(|tag| graph.item(item).is_some_and(|def| def.has_tag(*tag)));
                if condition.accepts(possession) && tagged {
                    Ok(())
                } else {
                    Err(unmet)
                }
            }
            (_, None) => Err(unmet),
        }
    }

    fn apply(&self, state: &mut SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        state.fired.insert(self.rule);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::graph::Possession;

    #[test]
    fn tagged_rule_needs_matching_possession() {
        let graph = fixtures::tavern();
        let mut state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        state.mood = graph.mood_id("angry").unwrap();
        let glare = graph.rule_id("rule_glare").unwrap();
        let stone = graph.item_id("item_focus_stone").unwrap();
        let cloak = graph.item_id("item_grey_cloak").unwrap();

        PerformBehavior::new(glare, Some(stone))
            .pre_validate(&state, &graph)
            .unwrap();
        assert_eq!(
            PerformBehavior::new(glare, Some(cloak)).pre_validate(&state, &graph),
            Err(MoveError::ItemConditionUnmet { rule: glare })
        );

        state.inventory.insert(stone, Possession::Worn);
        assert_eq!(
            PerformBehavior::new(glare, Some(stone)).pre_validate(&state, &graph),
            Err(MoveError::ItemConditionUnmet { rule: glare })
        );
    }

    #[test]
    fn mood_gates_every_rule() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let laugh = graph.rule_id("rule_laugh").unwrap();
        assert!(matches!(
            PerformBehavior::new(laugh, None).pre_validate(&state, &graph),
            Err(MoveError::MoodMismatch { .. })
        ));
    }

    #[test]
    fn empty_handed_rule_ignores_worn_items() {
        let graph = fixtures::tavern();
        let mut state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        state.mood = graph.mood_id("wary").unwrap();
        let shrug = graph.rule_id("rule_shrug").unwrap();

        assert_eq!(
            PerformBehavior::new(shrug, None).pre_validate(&state, &graph),
            Err(MoveError::HandsNotEmpty { rule: shrug })
        );

        state
            .inventory
            .remove(&graph.item_id("item_focus_stone").unwrap());
        PerformBehavior::new(shrug, None)
            .pre_validate(&state, &graph)
            .unwrap();
    }
}
