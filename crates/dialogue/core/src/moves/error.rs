use crate::error::{DialogueError, ErrorSeverity};
use crate::graph::{ConceptId, ContextId, GraphError, ItemId, MoodId, RuleId, TriggerId};

/// Reasons a move is not legal in the current session state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("move starts from {expected} but the session is in {actual}")]
    WrongContext {
        expected: ContextId,
        actual: ContextId,
    },

    #[error("{from} has no connection to {to}")]
    NotConnected { from: ContextId, to: ContextId },

    #[error("{context} is locked")]
    TargetLocked { context: ContextId },

    #[error("{context} is not locked")]
    AlreadyUnlocked { context: ContextId },

    #[error("{context} has no lock of the requested kind")]
    RequirementMismatch { context: ContextId },

    #[error("{concept} is not held")]
    MissingConcept { concept: ConceptId },

    #[error("{concept} is already held")]
    ConceptAlreadyHeld { concept: ConceptId },

    #[error("{context} provides no concept")]
    NothingProvided { context: ContextId },

    #[error("{trigger} is not available in {context}")]
    TriggerNotHere {
        trigger: TriggerId,
        context: ContextId,
    },

    #[error("{trigger} is exhausted")]
    TriggerExhausted { trigger: TriggerId },

    #[error("{rule} does not belong to the active character")]
    ForeignRule { rule: RuleId },

    #[error("{rule} requires {required} but the current mood is {current}")]
    MoodMismatch {
        rule: RuleId,
        required: MoodId,
        current: MoodId,
    },

    #[error("{item} is not carried")]
    ItemNotCarried { item: ItemId },

    #[error("item binding does not satisfy the item condition of {rule}")]
    ItemConditionUnmet { rule: RuleId },

    #[error("{rule} requires empty hands")]
    HandsNotEmpty { rule: RuleId },

    #[error("post-condition failed: {0}")]
    PostCondition(&'static str),
}

impl DialogueError for MoveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Graph(_) => ErrorSeverity::Validation,
            Self::PostCondition(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Graph(inner) => inner.error_code(),
            Self::WrongContext { .. } => "MOVE_WRONG_CONTEXT",
            Self::NotConnected { .. } => "MOVE_NOT_CONNECTED",
            Self::TargetLocked { .. } => "MOVE_TARGET_LOCKED",
            Self::AlreadyUnlocked { .. } => "MOVE_ALREADY_UNLOCKED",
            Self::RequirementMismatch { .. } => "MOVE_REQUIREMENT_MISMATCH",
            Self::MissingConcept { .. } => "MOVE_MISSING_CONCEPT",
            Self::ConceptAlreadyHeld { .. } => "MOVE_CONCEPT_ALREADY_HELD",
            Self::NothingProvided { .. } => "MOVE_NOTHING_PROVIDED",
            Self::TriggerNotHere { .. } => "MOVE_TRIGGER_NOT_HERE",
            Self::TriggerExhausted { .. } => "MOVE_TRIGGER_EXHAUSTED",
            Self::ForeignRule { .. } => "MOVE_FOREIGN_RULE",
            Self::MoodMismatch { .. } => "MOVE_MOOD_MISMATCH",
            Self::ItemNotCarried { .. } => "MOVE_ITEM_NOT_CARRIED",
            Self::ItemConditionUnmet { .. } => "MOVE_ITEM_CONDITION_UNMET",
            Self::HandsNotEmpty { .. } => "MOVE_HANDS_NOT_EMPTY",
            Self::PostCondition(_) => "MOVE_POST_CONDITION",
        }
    }
}

/// Reasons an explicit system transition cannot be applied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("{item} is not carried")]
    ItemNotCarried { item: ItemId },
}

impl DialogueError for SystemError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Graph(inner) => inner.error_code(),
            Self::ItemNotCarried { .. } => "SYSTEM_ITEM_NOT_CARRIED",
        }
    }
}
