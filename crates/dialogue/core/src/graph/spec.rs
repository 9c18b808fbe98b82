//! Declarative, name-based descriptions consumed by [`GraphBuilder`](super::GraphBuilder).
//!
//! These mirror the authored content one-to-one; all references are plain
//! strings and are resolved when the graph is built.

use super::{ItemCategory, ItemCondition, Possession};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionSpec {
    pub to: String,
    pub bidirectional: bool,
}

impl ConnectionSpec {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            to: target.into(),
            bidirectional: false,
        }
    }

    pub fn both_ways(target: impl Into<String>) -> Self {
        Self {
            to: target.into(),
            bidirectional: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContextSpec {
    pub id: String,
    pub is_start: bool,
    pub is_locked: bool,
    pub required_concept: Option<String>,
    pub required_combo: Option<(String, String)>,
    pub provides_concept: Option<String>,
    pub induces_mood: Option<String>,
    pub connections: Vec<ConnectionSpec>,
}

impl ContextSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn start(mut self) -> Self {
        self.is_start = true;
        self
    }

    pub fn locked_by(mut self, concept: impl Into<String>) -> Self {
        self.is_locked = true;
        self.required_concept = Some(concept.into());
        self
    }

    pub fn locked_by_combo(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.is_locked = true;
        self.required_combo = Some((first.into(), second.into()));
        self
    }

    pub fn provides(mut self, concept: impl Into<String>) -> Self {
        self.provides_concept = Some(concept.into());
        self
    }

    pub fn induces(mut self, mood: impl Into<String>) -> Self {
        self.induces_mood = Some(mood.into());
        self
    }

    pub fn connect(mut self, connection: ConnectionSpec) -> Self {
        self.connections.push(connection);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TriggerSpec {
    pub id: String,
    pub parent_context: String,
    pub requires: Option<String>,
    pub yields: Vec<String>,
    pub gives: Vec<String>,
    pub is_unique: bool,
}

impl TriggerSpec {
    pub fn new(id: impl Into<String>, parent_context: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_context: parent_context.into(),
            ..Self::default()
        }
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn requires(mut self, concept: impl Into<String>) -> Self {
        self.requires = Some(concept.into());
        self
    }

    pub fn yields(mut self, concept: impl Into<String>) -> Self {
        self.yields.push(concept.into());
        self
    }

    pub fn gives(mut self, item: impl Into<String>) -> Self {
        self.gives.push(item.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ItemSpec {
    pub id: String,
    pub category: ItemCategory,
    pub tags: Vec<String>,
}

impl ItemSpec {
    pub fn new(id: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id: id.into(),
            category,
            tags: Vec::new(),
        }
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EquipmentSpec {
    pub item: String,
    /// Overrides the category default when present.
    pub possession: Option<Possession>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuleSpec {
    pub id: String,
    pub mood: String,
    pub condition: ItemCondition<String>,
    pub template: String,
}

impl RuleSpec {
    pub fn new(
        id: impl Into<String>,
        mood: impl Into<String>,
        condition: ItemCondition<String>,
    ) -> Self {
        Self {
            id: id.into(),
            mood: mood.into(),
            condition,
            template: String::new(),
        }
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CharacterSpec {
    pub id: String,
    /// Falls back to the first context flagged `is_start`.
    pub start: Option<String>,
    pub goal: String,
    /// Falls back to [`PlannerConfig::DEFAULT_MOOD`](crate::PlannerConfig::DEFAULT_MOOD).
    pub mood: Option<String>,
    pub equipment: Vec<EquipmentSpec>,
    pub contexts: Vec<ContextSpec>,
    pub triggers: Vec<TriggerSpec>,
    pub behavior_rules: Vec<RuleSpec>,
}
