//! Severity and stable codes shared by every dialogue-core error.
//!
//! Concrete errors (`GraphError`, `MoveError`, `SystemError`,
//! `TransitionError`) live next to the code that raises them; callers only
//! need [`DialogueError`] to decide whether a turn can be retried.

/// How a caller should react to a failed call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The move is not legal right now; list the valid moves and pick again.
    Recoverable,

    /// The request names something the graph does not contain.
    Validation,

    /// A handler broke its own post-condition.
    Internal,

    /// The session state can no longer be trusted (held concepts shrank,
    /// current context missing from the visited set).
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Internal and fatal errors point at a bug rather than at bad input.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Implemented by every error enum in the dialogue crates.
pub trait DialogueError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier such as `MOVE_TARGET_LOCKED`, for logs and events.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fatal_and_internal_are_bugs() {
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(!ErrorSeverity::Validation.is_recoverable());
        assert!(!ErrorSeverity::Validation.is_internal());
        assert!(ErrorSeverity::Internal.is_internal());
        assert!(ErrorSeverity::Fatal.is_internal());
        assert_eq!(ErrorSeverity::Validation.as_str(), "validation");
    }
}
