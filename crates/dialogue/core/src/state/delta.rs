use crate::graph::{ConceptId, ContextId, ItemId, MoodId, Possession, RuleId, TriggerId};

use super::SessionState;

/// What changed between two session states.
///
/// Computed by the engine after every committed transition and handed
/// outward together with the new state snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateDelta {
    /// `(from, to)` when the current context changed.
    pub context: Option<(ContextId, ContextId)>,
    /// `(from, to)` when the mood changed.
    pub mood: Option<(MoodId, MoodId)>,
    pub concepts_gained: Vec<ConceptId>,
    pub visited: Vec<ContextId>,
    pub unlocked: Vec<ContextId>,
    pub exhausted: Vec<TriggerId>,
    pub items_gained: Vec<(ItemId, Possession)>,
    pub items_lost: Vec<ItemId>,
    pub fired: Vec<RuleId>,
}

impl StateDelta {
    pub fn from_states(before: &SessionState, after: &SessionState) -> Self {
        Self {
            context: (before.context != after.context).then_some((before.context, after.context)),
            mood: (before.mood != after.mood).then_some((before.mood, after.mood)),
            concepts_gained: after.concepts.difference(&before.concepts).copied().collect(),
            visited: after.visited.difference(&before.visited).copied().collect(),
            unlocked: after.unlocked.difference(&before.unlocked).copied().collect(),
            exhausted: after.exhausted.difference(&before.exhausted).copied().collect(),
            items_gained: after
                .inventory
                .iter()
                .filter(|(item, possession)| before.inventory.get(item) != Some(possession))
                .map(|(item, possession)| (*item, *possession))
                .collect(),
            items_lost: before
                .inventory
                .keys()
                .filter(|item| !after.inventory.contains_key(item))
                .copied()
                .collect(),
            fired: after.fired.difference(&before.fired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
