//! Immutable world graph shared by every session.
//!
//! A [`GraphModel`] is built once by [`GraphBuilder`] from declarative specs,
//! interns every identifier into typed arenas and is then only read. Sessions
//! hold it behind an `Arc` and never mutate it; a reload replaces it wholesale.

mod analysis;
mod builder;
mod error;
mod ids;
mod spec;

pub use analysis::{GraphWarning, ReachabilityReport, analyze};
pub use builder::GraphBuilder;
pub use error::GraphError;
pub use ids::{
    CharacterId, ConceptId, ContextId, ItemId, MoodId, ObjectKind, ObjectRef, RuleId, TagId,
    TriggerId, is_valid_identifier,
};
pub use spec::{
    CharacterSpec, ConnectionSpec, ContextSpec, EquipmentSpec, ItemSpec, RuleSpec, TriggerSpec,
};

use std::collections::HashMap;

/// Whether an item is carried in hand or worn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Possession {
    Held,
    Worn,
}

/// Item category, deciding how an acquired item enters the inventory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemCategory {
    #[default]
    Holdable,
    Wearable,
}

impl ItemCategory {
    pub const fn default_possession(self) -> Possession {
        match self {
            Self::Holdable => Possession::Held,
            Self::Wearable => Possession::Worn,
        }
    }
}

/// Item requirement of a behavior rule.
///
/// Generic over the tag representation so the same closed set of variants is
/// used for authored specs (`String`) and resolved rules ([`TagId`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemCondition<T = TagId> {
    /// No item requirement.
    #[default]
    Unrestricted,
    /// A held item carries the tag.
    Holding(T),
    /// A worn item carries the tag.
    Wearing(T),
    /// A held or worn item carries the tag.
    Carrying(T),
    /// Nothing is held.
    EmptyHanded,
}

impl<T> ItemCondition<T> {
    pub fn tag(&self) -> Option<&T> {
        match self {
            Self::Holding(tag) | Self::Wearing(tag) | Self::Carrying(tag) => Some(tag),
            Self::Unrestricted | Self::EmptyHanded => None,
        }
    }

    /// Whether an item carried with `possession` can satisfy this condition.
    pub fn accepts(&self, possession: Possession) -> bool {
        match self {
            Self::Holding(_) => possession == Possession::Held,
            Self::Wearing(_) => possession == Possession::Worn,
            Self::Carrying(_) => true,
            Self::Unrestricted | Self::EmptyHanded => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextDef {
    pub id: ContextId,
    pub name: String,
    pub character: CharacterId,
    pub is_start: bool,
    pub is_locked: bool,
    pub required_concept: Option<ConceptId>,
    pub required_combo: Option<(ConceptId, ConceptId)>,
    pub provides_concept: Option<ConceptId>,
    pub induces_mood: Option<MoodId>,
    /// Outgoing edges, sorted and free of duplicates.
    pub connections: Vec<ContextId>,
}

impl ContextDef {
    pub fn connects_to(&self, target: ContextId) -> bool {
        self.connections.binary_search(&target).is_ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConceptDef {
    pub id: ConceptId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerDef {
    pub id: TriggerId,
    pub name: String,
    pub character: CharacterId,
    pub context: ContextId,
    pub requires: Option<ConceptId>,
    pub yields: Vec<ConceptId>,
    pub gives: Vec<ItemId>,
    pub is_unique: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub category: ItemCategory,
    /// Sorted tag set.
    pub tags: Vec<TagId>,
}

impl ItemDef {
    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.binary_search(&tag).is_ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagDef {
    pub id: TagId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoodDef {
    pub id: MoodId,
    pub name: String,
}

/// Mood/tag-gated template compiled into a dynamically generated action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BehaviorRule {
    pub id: RuleId,
    pub name: String,
    pub character: CharacterId,
    pub mood: MoodId,
    pub condition: ItemCondition,
    /// Narrative template, opaque to the core.
    pub template: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterDef {
    pub id: CharacterId,
    pub name: String,
    pub start: ContextId,
    pub goal: ContextId,
    pub mood: MoodId,
    pub equipment: Vec<(ItemId, Possession)>,
    pub contexts: Vec<ContextId>,
    pub triggers: Vec<TriggerId>,
    pub rules: Vec<RuleId>,
}

/// Merged, immutable world description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphModel {
    pub(crate) generation: u64,
    pub(crate) names: HashMap<String, ObjectRef>,
    pub(crate) contexts: Vec<ContextDef>,
    pub(crate) concepts: Vec<ConceptDef>,
    pub(crate) triggers: Vec<TriggerDef>,
    pub(crate) items: Vec<ItemDef>,
    pub(crate) tags: Vec<TagDef>,
    pub(crate) moods: Vec<MoodDef>,
    pub(crate) rules: Vec<BehaviorRule>,
    pub(crate) characters: Vec<CharacterDef>,
}

macro_rules! arena_accessors {
    ($get:ident, $iter:ident, $require:ident, $lookup:ident, $field:ident, $id:ty, $def:ty, $variant:ident) => {
        pub fn $get(&self, id: $id) -> Option<&$def> {
            self.$field.get(id.index())
        }

        pub fn $iter(&self) -> impl ExactSizeIterator<Item = &$def> + '_ {
            self.$field.iter()
        }

        /// Like the plain accessor, but reports a missing index as an error.
        pub fn $require(&self, id: $id) -> Result<&$def, GraphError> {
            self.$get(id).ok_or(GraphError::UnknownIndex {
                kind: ObjectKind::$variant,
                index: id.index(),
                generation: self.generation,
            })
        }

        pub fn $lookup(&self, name: &str) -> Result<$id, GraphError> {
            match self.names.get(name) {
                Some(ObjectRef::$variant(id)) => Ok(*id),
                _ => Err(GraphError::unknown(ObjectKind::$variant, name)),
            }
        }
    };
}

impl GraphModel {
    arena_accessors!(context, contexts, require_context, context_id, contexts, ContextId, ContextDef, Context);
    arena_accessors!(concept, concepts, require_concept, concept_id, concepts, ConceptId, ConceptDef, Concept);
    arena_accessors!(trigger, triggers, require_trigger, trigger_id, triggers, TriggerId, TriggerDef, Trigger);
    arena_accessors!(item, items, require_item, item_id, items, ItemId, ItemDef, Item);
    arena_accessors!(tag, tags, require_tag, tag_id, tags, TagId, TagDef, Tag);
    arena_accessors!(mood, moods, require_mood, mood_id, moods, MoodId, MoodDef, Mood);
    arena_accessors!(rule, rules, require_rule, rule_id, rules, RuleId, BehaviorRule, Rule);
    arena_accessors!(
        character,
        characters,
        require_character,
        character_id,
        characters,
        CharacterId,
        CharacterDef,
        Character
    );

    /// Reload generation this graph was published under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns a copy of this graph stamped with a new generation.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Resolves a name in the shared namespace.
    pub fn resolve(&self, name: &str) -> Option<ObjectRef> {
        self.names.get(name).copied()
    }

    /// Returns the name bound to an object reference.
    pub fn name_of(&self, object: ObjectRef) -> Option<&str> {
        let name = match object {
            ObjectRef::Context(id) => &self.context(id)?.name,
            ObjectRef::Concept(id) => &self.concept(id)?.name,
            ObjectRef::Trigger(id) => &self.trigger(id)?.name,
            ObjectRef::Item(id) => &self.item(id)?.name,
            ObjectRef::Tag(id) => &self.tag(id)?.name,
            ObjectRef::Mood(id) => &self.mood(id)?.name,
            ObjectRef::Rule(id) => &self.rule(id)?.name,
            ObjectRef::Character(id) => &self.character(id)?.name,
        };
        Some(name.as_str())
    }

    /// Behavior rules owned by a character, in definition order.
    pub fn character_rules(&self, character: CharacterId) -> impl Iterator<Item = &BehaviorRule> {
        self.character(character)
            .into_iter()
            .flat_map(|def| def.rules.iter())
            .filter_map(|id| self.rule(*id))
    }

    /// Triggers bound to `context`.
    pub fn triggers_in(&self, context: ContextId) -> impl Iterator<Item = &TriggerDef> {
        let owner = self.context(context).map(|def| def.character);
        owner
            .and_then(|character| self.character(character))
            .into_iter()
            .flat_map(|def| def.triggers.iter())
            .filter_map(|id| self.trigger(*id))
            .filter(move |trigger| trigger.context == context)
    }
}
