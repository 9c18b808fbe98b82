//! Symbolic moves and the legal-move validator.
//!
//! Every move kind is a small struct implementing [`MoveTransition`]. The
//! validator in [`available`] and the engine share the same `pre_validate`
//! logic, so a move is applicable exactly when it is listed as legal.

pub mod available;
mod error;
mod kinds;
mod system;
mod transition;

pub use available::{is_valid, valid_moves, valid_moves_with_rules};
pub use error::{MoveError, SystemError};
pub use kinds::{
    ActivateTrigger, ApplyComboConcept, ApplyConcept, LearnConcept, PerformBehavior, ShiftContext,
};
pub use system::{DropItem, GrantItem, SetMood, SystemAction};
pub use transition::MoveTransition;

use crate::graph::{GraphModel, ObjectRef};
use crate::state::SessionState;

/// Move kinds as they are named in planning text.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveKind {
    ShiftContext,
    LearnConcept,
    ActivateTrigger,
    ApplyConcept,
    ApplyComboConcept,
    Behavior,
}

impl MoveKind {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A legal-move candidate, one variant per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Move {
    ShiftContext(ShiftContext),
    LearnConcept(LearnConcept),
    ActivateTrigger(ActivateTrigger),
    ApplyConcept(ApplyConcept),
    ApplyComboConcept(ApplyComboConcept),
    Behavior(PerformBehavior),
}

impl Move {
    pub fn kind(&self) -> MoveKind {
        match self {
            Self::ShiftContext(_) => MoveKind::ShiftContext,
            Self::LearnConcept(_) => MoveKind::LearnConcept,
            Self::ActivateTrigger(_) => MoveKind::ActivateTrigger,
            Self::ApplyConcept(_) => MoveKind::ApplyConcept,
            Self::ApplyComboConcept(_) => MoveKind::ApplyComboConcept,
            Self::Behavior(_) => MoveKind::Behavior,
        }
    }

    pub fn is_context_shift(&self) -> bool {
        matches!(self, Self::ShiftContext(_))
    }

    /// Runs the kind-specific precondition check.
    pub fn pre_validate(&self, state: &SessionState, graph: &GraphModel) -> Result<(), MoveError> {
        match self {
            Self::ShiftContext(m) => m.pre_validate(state, graph),
            Self::LearnConcept(m) => m.pre_validate(state, graph),
            Self::ActivateTrigger(m) => m.pre_validate(state, graph),
            Self::ApplyConcept(m) => m.pre_validate(state, graph),
            Self::ApplyComboConcept(m) => m.pre_validate(state, graph),
            Self::Behavior(m) => m.pre_validate(state, graph),
        }
    }

    /// Human-readable label using graph names, e.g. `shift-context ctx_a -> ctx_b`.
    pub fn describe(&self, graph: &GraphModel) -> String {
        let name = |object| graph.name_of(object).unwrap_or("?");
        match self {
            Self::ShiftContext(m) => format!(
                "shift-context {} -> {}",
                name(ObjectRef::Context(m.from)),
                name(ObjectRef::Context(m.to))
            ),
            Self::LearnConcept(m) => {
                format!("learn-concept in {}", name(ObjectRef::Context(m.context)))
            }
            Self::ActivateTrigger(m) => {
                format!("activate-trigger {}", name(ObjectRef::Trigger(m.trigger)))
            }
            Self::ApplyConcept(m) => format!(
                "apply-concept {} -> {}",
                name(ObjectRef::Context(m.from)),
                name(ObjectRef::Context(m.target))
            ),
            Self::ApplyComboConcept(m) => format!(
                "apply-combo-concept {} -> {}",
                name(ObjectRef::Context(m.from)),
                name(ObjectRef::Context(m.target))
            ),
            Self::Behavior(m) => match m.item {
                Some(item) => format!(
                    "behavior {} with {}",
                    name(ObjectRef::Rule(m.rule)),
                    name(ObjectRef::Item(item))
                ),
                None => format!("behavior {}", name(ObjectRef::Rule(m.rule))),
            },
        }
    }
}

impl From<ShiftContext> for Move {
    fn from(m: ShiftContext) -> Self {
        Self::ShiftContext(m)
    }
}

impl From<LearnConcept> for Move {
    fn from(m: LearnConcept) -> Self {
        Self::LearnConcept(m)
    }
}

impl From<ActivateTrigger> for Move {
    fn from(m: ActivateTrigger) -> Self {
        Self::ActivateTrigger(m)
    }
}

impl From<ApplyConcept> for Move {
    fn from(m: ApplyConcept) -> Self {
        Self::ApplyConcept(m)
    }
}

impl From<ApplyComboConcept> for Move {
    fn from(m: ApplyComboConcept) -> Self {
        Self::ApplyComboConcept(m)
    }
}

impl From<PerformBehavior> for Move {
    fn from(m: PerformBehavior) -> Self {
        Self::Behavior(m)
    }
}
