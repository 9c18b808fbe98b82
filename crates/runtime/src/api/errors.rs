//! Unified error types surfaced by the runtime API.
//!
//! [`ResolveError`] covers failures of a solver invocation itself; an
//! unsolvable task or an expired timeout are [`PlanOutcome`](crate::PlanOutcome)
//! values, never errors. [`RuntimeError`] wraps everything a session call can
//! hit so clients can bubble it up with consistent context.
use std::path::PathBuf;

use dialogue_core::{DialogueError, ErrorSeverity, GraphError, TransitionError};
use planner::{ParseError, PlanError, SynthesisError, TaskError};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::events::SessionId;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("planning task is malformed: {0}")]
    Task(#[from] TaskError),

    #[error("solver output is not a plan: {0}")]
    PlanText(#[source] ParseError),

    #[error("failed to stage planning files: {0}")]
    Io(#[from] std::io::Error),

    #[error("solver {program} exited with {status}: {stderr}")]
    SolverFailed {
        program: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("solver was cancelled")]
    Cancelled,

    #[error("solver task failed to join")]
    Join(#[source] tokio::task::JoinError),

    #[error("simulation pool could not be built: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl DialogueError for ResolveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Task(_) | Self::PlanText(_) => ErrorSeverity::Validation,
            Self::Cancelled => ErrorSeverity::Recoverable,
            Self::Io(_) | Self::SolverFailed { .. } | Self::Join(_) | Self::Pool(_) => {
                ErrorSeverity::Internal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Task(_) => "RESOLVE_TASK",
            Self::PlanText(_) => "RESOLVE_PLAN_TEXT",
            Self::Io(_) => "RESOLVE_IO",
            Self::SolverFailed { .. } => "RESOLVE_SOLVER_FAILED",
            Self::Cancelled => "RESOLVE_CANCELLED",
            Self::Join(_) => "RESOLVE_JOIN",
            Self::Pool(_) => "RESOLVE_POOL",
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime requires a graph model before building")]
    MissingGraph,

    #[error("unknown character '{0}'")]
    UnknownCharacter(String),

    #[error("{0} is not open")]
    UnknownSession(SessionId),

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    /// The graph was reloaded since the caller last listed moves.
    #[error("graph reloaded to generation {generation}; list the valid moves again")]
    GraphReloaded { generation: u64 },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl DialogueError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Transition(inner) => inner.severity(),
            Self::Graph(inner) => inner.severity(),
            Self::Synthesis(inner) => inner.severity(),
            Self::Resolve(inner) => inner.severity(),
            Self::GraphReloaded { .. } => ErrorSeverity::Recoverable,
            Self::MissingGraph
            | Self::UnknownCharacter(_)
            | Self::UnknownSession(_)
            | Self::Plan(_) => ErrorSeverity::Validation,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Internal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Transition(inner) => inner.error_code(),
            Self::Graph(inner) => inner.error_code(),
            Self::Synthesis(inner) => inner.error_code(),
            Self::Resolve(inner) => inner.error_code(),
            Self::MissingGraph => "RUNTIME_MISSING_GRAPH",
            Self::UnknownCharacter(_) => "RUNTIME_UNKNOWN_CHARACTER",
            Self::UnknownSession(_) => "RUNTIME_UNKNOWN_SESSION",
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::GraphReloaded { .. } => "RUNTIME_GRAPH_RELOADED",
            Self::Plan(_) => "RUNTIME_PLAN",
        }
    }
}
