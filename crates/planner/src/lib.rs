//! Planning layer for the dialogue core.
//!
//! Turns a graph and a session snapshot into a planning domain/problem pair
//! ([`synth`]), reads and prints planning text ([`pddl`]), grounds it into a
//! formal model ([`ground`]) and searches or replays that model
//! ([`search`], [`simulate`]). Nothing here mutates session state.
pub mod ground;
pub mod pddl;
pub mod plan;
pub mod search;
pub mod simulate;
pub mod synth;

pub use ground::{FactSet, GroundAction, GroundTask, GroundingError, TaskError};
pub use pddl::{Domain, ParseError, Problem};
pub use plan::{Plan, PlanError, PlanStep};
pub use search::{Search, SearchError, SearchOutcome};
pub use simulate::{BranchStatus, InventoryEntry, SimulationResult, replay};
pub use synth::{Goal, PlanningTask, SynthesisError, Synthesizer, TaskText, synthesize};
