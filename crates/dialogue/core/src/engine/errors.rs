//! Error types for the transition pipeline.

use crate::error::{DialogueError, ErrorSeverity};
use crate::graph::GraphError;
use crate::moves::{MoveError, MoveKind, SystemAction, SystemError};

/// Identifies which stage of the transition pipeline produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    PreValidate,
    Apply,
    PostValidate,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::PreValidate => "pre_validate",
            TransitionPhase::Apply => "apply",
            TransitionPhase::PostValidate => "post_validate",
        }
    }
}

/// Associates a transition phase with the underlying error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionPhaseError<E> {
    pub phase: TransitionPhase,
    pub error: E,
}

impl<E> TransitionPhaseError<E> {
    pub fn new(phase: TransitionPhase, error: E) -> Self {
        Self { phase, error }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TransitionPhaseError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.phase.as_str(), self.error)
    }
}

impl<E: std::fmt::Display + std::fmt::Debug> std::error::Error for TransitionPhaseError<E> {}

/// Errors surfaced while applying a move or system action.
///
/// A failed transition never leaves a partially mutated state behind: the
/// engine works on a copy and only returns it on success.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The move is not in the current legal set.
    #[error("invalid {kind} move: {source}")]
    InvalidMove {
        kind: MoveKind,
        source: TransitionPhaseError<MoveError>,
    },

    #[error("system action {action} failed: {source}")]
    InvalidSystemAction {
        action: SystemAction,
        source: TransitionPhaseError<SystemError>,
    },

    /// The move names an object the loaded graph does not define.
    #[error(transparent)]
    UnknownReference(#[from] GraphError),

    #[error("session belongs to graph generation {state} but generation {graph} is loaded")]
    GenerationMismatch { state: u64, graph: u64 },

    #[error("session invariant violated: {0}")]
    InvariantViolated(&'static str),
}

impl TransitionError {
    pub(super) fn invalid_move(kind: MoveKind, source: TransitionPhaseError<MoveError>) -> Self {
        match source.error {
            MoveError::Graph(error) => Self::UnknownReference(error),
            error => Self::InvalidMove {
                kind,
                source: TransitionPhaseError::new(source.phase, error),
            },
        }
    }

    pub(super) fn invalid_system(
        action: SystemAction,
        source: TransitionPhaseError<SystemError>,
    ) -> Self {
        match source.error {
            SystemError::Graph(error) => Self::UnknownReference(error),
            error => Self::InvalidSystemAction {
                action,
                source: TransitionPhaseError::new(source.phase, error),
            },
        }
    }

    /// Returns true if re-querying the legal moves and retrying is sensible.
    pub fn is_invalid_move(&self) -> bool {
        matches!(self, Self::InvalidMove { .. })
    }
}

impl DialogueError for TransitionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidMove { source, .. } => source.error.severity(),
            Self::InvalidSystemAction { source, .. } => source.error.severity(),
            Self::UnknownReference(_) | Self::GenerationMismatch { .. } => {
                ErrorSeverity::Validation
            }
            Self::InvariantViolated(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMove { source, .. } => source.error.error_code(),
            Self::InvalidSystemAction { source, .. } => source.error.error_code(),
            Self::UnknownReference(inner) => inner.error_code(),
            Self::GenerationMismatch { .. } => "TRANSITION_GENERATION_MISMATCH",
            Self::InvariantViolated(_) => "TRANSITION_INVARIANT_VIOLATED",
        }
    }
}
