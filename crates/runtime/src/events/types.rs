//! Event types for different topics.

use std::fmt;

use dialogue_core::StateDelta;
use planner::PlanStep;
use serde::{Deserialize, Serialize};

use crate::analytics::DeviationReport;
use crate::resolver::PlanOutcome;

/// Runtime-assigned identifier of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Events about sessions and the graph they run against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    Opened {
        session: SessionId,
        character: String,
    },

    /// A move was committed. The delta uses the indices of the graph
    /// generation the session was bound to.
    MoveApplied {
        session: SessionId,
        step: PlanStep,
        delta: StateDelta,
        nonce: u64,
    },

    /// A move was refused; the session state is unchanged.
    MoveRejected {
        session: SessionId,
        code: String,
        error: String,
    },

    /// The session moved to a different character or back to its start.
    Restarted {
        session: SessionId,
        character: String,
    },

    Closed {
        session: SessionId,
    },

    GraphReloaded {
        generation: u64,
    },
}

/// Compact, serializable view of a [`PlanOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeSummary {
    Found { length: usize },
    Unsolvable,
    Timeout,
}

impl From<&PlanOutcome> for OutcomeSummary {
    fn from(outcome: &PlanOutcome) -> Self {
        match outcome {
            PlanOutcome::Found(plan) => Self::Found { length: plan.len() },
            PlanOutcome::Unsolvable => Self::Unsolvable,
            PlanOutcome::Timeout => Self::Timeout,
        }
    }
}

/// Events related to plan resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlanningEvent {
    PlanResolved {
        session: SessionId,
        outcome: OutcomeSummary,
        elapsed_ms: u64,
    },

    DeviationAssessed {
        session: SessionId,
        report: DeviationReport,
    },
}
