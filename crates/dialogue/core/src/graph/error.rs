use crate::error::{DialogueError, ErrorSeverity};

use super::ObjectKind;

/// Errors raised while building or querying a [`GraphModel`](super::GraphModel).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphError {
    #[error("unknown {kind} '{name}'")]
    UnknownReference { kind: ObjectKind, name: String },

    #[error("{kind} index {index} is not defined in graph generation {generation}")]
    UnknownIndex {
        kind: ObjectKind,
        index: usize,
        generation: u64,
    },

    #[error("'{name}' is bound as both {existing} and {requested}")]
    NameConflict {
        name: String,
        existing: ObjectKind,
        requested: ObjectKind,
    },

    #[error("{kind} '{name}' is defined more than once")]
    DuplicateDefinition { kind: ObjectKind, name: String },

    #[error("'{name}' is not a valid identifier")]
    InvalidIdentifier { name: String },

    #[error("character '{character}' has no start context")]
    MissingStart { character: String },

    #[error("character '{character}' references context '{context}' owned by another character")]
    ForeignContext { character: String, context: String },

    #[error("context '{context}' combo lock names concept '{concept}' twice")]
    DegenerateCombo { context: String, concept: String },
}

impl GraphError {
    pub fn unknown(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self::UnknownReference {
            kind,
            name: name.into(),
        }
    }
}

impl DialogueError for GraphError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownReference { .. } => "GRAPH_UNKNOWN_REFERENCE",
            Self::UnknownIndex { .. } => "GRAPH_UNKNOWN_INDEX",
            Self::NameConflict { .. } => "GRAPH_NAME_CONFLICT",
            Self::DuplicateDefinition { .. } => "GRAPH_DUPLICATE_DEFINITION",
            Self::InvalidIdentifier { .. } => "GRAPH_INVALID_IDENTIFIER",
            Self::MissingStart { .. } => "GRAPH_MISSING_START",
            Self::ForeignContext { .. } => "GRAPH_FOREIGN_CONTEXT",
            Self::DegenerateCombo { .. } => "GRAPH_DEGENERATE_COMBO",
        }
    }
}
