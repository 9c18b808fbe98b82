//! Deterministic symbolic core for planning-driven NPC dialogue.
//!
//! `dialogue-core` defines the canonical rules: the immutable world graph,
//! per-conversation session state, the legal-move validator and the
//! transition engine. It performs no I/O and is shared by the planner,
//! the runtime and offline tools. All state mutation flows through
//! [`engine::TransitionEngine`].
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod moves;
pub mod state;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

#[cfg(test)]
mod scenarios;

pub use config::PlannerConfig;
pub use engine::{
    Transition, TransitionEngine, TransitionError, TransitionPhase, TransitionPhaseError, apply,
};
pub use error::{DialogueError, ErrorSeverity};
pub use graph::{
    BehaviorRule, CharacterDef, CharacterId, CharacterSpec, ConceptDef, ConceptId,
    ConnectionSpec, ContextDef, ContextId, ContextSpec, EquipmentSpec, GraphBuilder, GraphError,
    GraphModel, GraphWarning, ItemCategory, ItemCondition, ItemDef, ItemId, ItemSpec, MoodDef,
    MoodId, ObjectKind, ObjectRef, Possession, ReachabilityReport, RuleId, RuleSpec, TagDef,
    TagId, TriggerDef, TriggerId, TriggerSpec, analyze, is_valid_identifier,
};
pub use moves::{
    ActivateTrigger, ApplyComboConcept, ApplyConcept, LearnConcept, Move, MoveError, MoveKind,
    MoveTransition, PerformBehavior, ShiftContext, SystemAction, SystemError, is_valid,
    valid_moves, valid_moves_with_rules,
};
pub use state::{SessionState, StateDelta};
