//! Runtime orchestration for planning-driven NPC dialogue.
//!
//! This crate wires the deterministic core and the planner into a runtime:
//! one actor per conversation session, a shared graph that can be reloaded
//! atomically, a plan resolver with timeouts and caching, and advisory
//! analytics. Consumers embed [`Runtime`] to open sessions and drive them
//! through [`SessionHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`resolver`] turns planning text into plans
//! - [`analytics`] classifies deviation, archetypes, quest difficulty and
//!   simulated branches
//! - `workers` keeps the session actors internal to the crate
pub mod analytics;
pub mod api;
pub mod config;
pub mod events;
pub mod graph_store;
pub mod resolver;
pub mod runtime;

mod workers;

pub use analytics::{
    Archetype, BatchSimulator, DeviationReport, DeviationStatus, MoveMix, QuestDifficulty,
};
pub use api::{ResolveError, Result, RuntimeError, SessionHandle};
pub use config::{ConfigError, RuntimeConfig, SolverBackend};
pub use events::{Event, EventBus, OutcomeSummary, PlanningEvent, SessionEvent, SessionId, Topic};
pub use graph_store::GraphStore;
pub use resolver::{
    BuiltinSolver, ExternalSolver, PlanCache, PlanOutcome, PlanResolver, SolveBudget, Solver,
    task_key,
};
pub use runtime::{Runtime, RuntimeBuilder};
pub use workers::{AppliedMove, MoveList, SessionSnapshot};
