//! Typed arena indices for graph objects.
//!
//! Every identifier in a loaded world is interned once by the builder and
//! referred to by a small copyable index afterwards. Indices are only
//! meaningful for the [`GraphModel`](super::GraphModel) that issued them.

use core::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Position of the object inside its arena.
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) const fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Node of a character's mental-state graph.
    ContextId,
    "context"
);
arena_id!(
    /// Boolean knowledge token.
    ConceptId,
    "concept"
);
arena_id!(
    /// Context-bound action yielding concepts and items.
    TriggerId,
    "trigger"
);
arena_id!(ItemId, "item");
arena_id!(TagId, "tag");
arena_id!(MoodId, "mood");
arena_id!(
    /// Behavior rule compiled into a dynamically generated action.
    RuleId,
    "rule"
);
arena_id!(CharacterId, "character");

/// Kind of object a name is bound to.
///
/// All names share a single namespace, so one identifier resolves to at most
/// one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    Context,
    Concept,
    Trigger,
    Item,
    Tag,
    Mood,
    Rule,
    Character,
}

/// Resolved binding of a name inside the graph namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectRef {
    Context(ContextId),
    Concept(ConceptId),
    Trigger(TriggerId),
    Item(ItemId),
    Tag(TagId),
    Mood(MoodId),
    Rule(RuleId),
    Character(CharacterId),
}

impl ObjectRef {
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Context(_) => ObjectKind::Context,
            Self::Concept(_) => ObjectKind::Concept,
            Self::Trigger(_) => ObjectKind::Trigger,
            Self::Item(_) => ObjectKind::Item,
            Self::Tag(_) => ObjectKind::Tag,
            Self::Mood(_) => ObjectKind::Mood,
            Self::Rule(_) => ObjectKind::Rule,
            Self::Character(_) => ObjectKind::Character,
        }
    }

    pub const fn index(&self) -> usize {
        match self {
            Self::Context(id) => id.index(),
            Self::Concept(id) => id.index(),
            Self::Trigger(id) => id.index(),
            Self::Item(id) => id.index(),
            Self::Tag(id) => id.index(),
            Self::Mood(id) => id.index(),
            Self::Rule(id) => id.index(),
            Self::Character(id) => id.index(),
        }
    }
}

/// Returns true if `name` is usable as an object name in planning text.
///
/// Planning text is case-insensitive, so names are lowercase: an ASCII letter
/// first, then letters, digits, `_` or `-`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => chars
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_follow_planning_syntax() {
        assert!(is_valid_identifier("ctx_tavern_intro"));
        assert!(is_valid_identifier("do-glare"));
        assert!(!is_valid_identifier("_hidden"));
        assert!(!is_valid_identifier("9lives"));
        assert!(!is_valid_identifier("has space"));
        assert!(!is_valid_identifier("Ctx_Intro"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn ids_display_with_kind_label() {
        assert_eq!(ContextId(3).to_string(), "context#3");
        assert_eq!(ObjectRef::Tag(TagId(1)).kind().to_string(), "tag");
    }
}
