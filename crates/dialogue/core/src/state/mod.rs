//! Per-conversation session state.
//!
//! [`SessionState`] is the only mutable entity in the core. It is created from
//! a character's start context and changed exclusively through
//! [`TransitionEngine`](crate::engine::TransitionEngine).

mod delta;

pub use delta::StateDelta;

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{
    CharacterId, ConceptId, ContextId, GraphError, GraphModel, ItemId, MoodId, ObjectRef,
    Possession, RuleId, TriggerId,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionState {
    pub character: CharacterId,
    pub context: ContextId,
    pub mood: MoodId,
    pub concepts: BTreeSet<ConceptId>,
    pub visited: BTreeSet<ContextId>,
    pub unlocked: BTreeSet<ContextId>,
    pub exhausted: BTreeSet<TriggerId>,
    pub inventory: BTreeMap<ItemId, Possession>,
    /// Behavior rules whose event has fired at least once.
    pub fired: BTreeSet<RuleId>,
    /// Number of committed transitions.
    pub nonce: u64,
    /// Graph generation the indices above belong to.
    pub generation: u64,
}

impl SessionState {
    /// Creates a session at the character's start context.
    ///
    /// The start context counts as entered: it is visited and its entry
    /// effects (provided concept, induced mood) are applied.
    pub fn new(graph: &GraphModel, character: CharacterId) -> Result<Self, GraphError> {
        let def = graph.require_character(character)?;
        let start = graph.require_context(def.start)?;

        let mut state = Self {
            character,
            context: start.id,
            mood: def.mood,
            concepts: BTreeSet::new(),
            visited: BTreeSet::from([start.id]),
            unlocked: BTreeSet::new(),
            exhausted: BTreeSet::new(),
            inventory: def.equipment.iter().copied().collect(),
            fired: BTreeSet::new(),
            nonce: 0,
            generation: graph.generation(),
        };
        state.concepts.extend(start.provides_concept);
        if let Some(mood) = start.induces_mood {
            state.mood = mood;
        }
        Ok(state)
    }

    /// Returns true if `context` is locked for this session.
    pub fn is_locked(&self, graph: &GraphModel, context: ContextId) -> bool {
        graph
            .context(context)
            .is_some_and(|def| def.is_locked && !self.unlocked.contains(&context))
    }

    pub fn holds(&self, concept: ConceptId) -> bool {
        self.concepts.contains(&concept)
    }

    pub fn possession(&self, item: ItemId) -> Option<Possession> {
        self.inventory.get(&item).copied()
    }

    /// Returns true if no item is held in hand. Worn items do not count.
    pub fn is_empty_handed(&self) -> bool {
        !self.inventory.values().any(|p| *p == Possession::Held)
    }

    /// Number of distinct contexts entered so far, the start included.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Re-expresses this state against a reloaded graph by name.
    ///
    /// Fails if the character or anything the session refers to no longer
    /// exists under the same name.
    pub fn rebind(&self, old: &GraphModel, new: &GraphModel) -> Result<Self, GraphError> {
        fn name(old: &GraphModel, object: ObjectRef) -> Result<&str, GraphError> {
            old.name_of(object).ok_or(GraphError::UnknownIndex {
                kind: object.kind(),
                index: object.index(),
                generation: old.generation(),
            })
        }

        let context = |id| name(old, ObjectRef::Context(id)).and_then(|n| new.context_id(n));
        let concept = |id| name(old, ObjectRef::Concept(id)).and_then(|n| new.concept_id(n));
        let trigger = |id| name(old, ObjectRef::Trigger(id)).and_then(|n| new.trigger_id(n));
        let item = |id| name(old, ObjectRef::Item(id)).and_then(|n| new.item_id(n));
        let rule = |id| name(old, ObjectRef::Rule(id)).and_then(|n| new.rule_id(n));

        Ok(Self {
            character: name(old, ObjectRef::Character(self.character))
                .and_then(|n| new.character_id(n))?,
            context: context(self.context)?,
            mood: name(old, ObjectRef::Mood(self.mood)).and_then(|n| new.mood_id(n))?,
            concepts: self.concepts.iter().map(|id| concept(*id)).collect::<Result<_, _>>()?,
            visited: self.visited.iter().map(|id| context(*id)).collect::<Result<_, _>>()?,
            unlocked: self.unlocked.iter().map(|id| context(*id)).collect::<Result<_, _>>()?,
            exhausted: self
                .exhausted
                .iter()
                .map(|id| trigger(*id))
                .collect::<Result<_, _>>()?,
            inventory: self
                .inventory
                .iter()
                .map(|(id, possession)| item(*id).map(|id| (id, *possession)))
                .collect::<Result<_, _>>()?,
            fired: self.fired.iter().map(|id| rule(*id)).collect::<Result<_, _>>()?,
            nonce: self.nonce,
            generation: new.generation(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn new_session_enters_start_context() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();

        let intro = graph.context_id("ctx_tavern_intro").unwrap();
        assert_eq!(state.context, intro);
        assert!(state.visited.contains(&intro));
        assert!(state.holds(graph.concept_id("cpt_quest_none").unwrap()));
        assert_eq!(graph.mood(state.mood).unwrap().name, "neutral");
        assert_eq!(
            state.possession(graph.item_id("item_focus_stone").unwrap()),
            Some(Possession::Held)
        );
        assert_eq!(
            state.possession(graph.item_id("item_grey_cloak").unwrap()),
            Some(Possession::Worn)
        );
        assert!(!state.is_empty_handed());
    }

    #[test]
    fn locks_follow_unlocked_set() {
        let graph = fixtures::tavern();
        let mut state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let talk = graph.context_id("ctx_neutral_talk").unwrap();

        assert!(state.is_locked(&graph, talk));
        state.unlocked.insert(talk);
        assert!(!state.is_locked(&graph, talk));
    }

    #[test]
    fn rebind_maps_by_name() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();

        let reloaded = fixtures::tavern().with_generation(3);
        let rebound = state.rebind(&graph, &reloaded).unwrap();
        assert_eq!(rebound.generation, 3);
        assert_eq!(rebound.context, state.context);
        assert_eq!(rebound.concepts, state.concepts);
    }

    #[test]
    fn rebind_fails_when_context_disappears() {
        let graph = fixtures::tavern();
        let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
        let other = fixtures::sealed_vault();
        assert!(state.rebind(&graph, &other).is_err());
    }
}
