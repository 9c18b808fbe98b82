//! Advisory analytics over sessions and candidate traces.
//!
//! Nothing in this module mutates a session or the graph: every result is
//! plain data handed outward.

mod archetype;
mod batch;
mod deviation;
mod quest;

pub use archetype::{Archetype, MoveMix};
pub use batch::BatchSimulator;
pub use deviation::{DeviationReport, DeviationStatus};
pub use quest::QuestDifficulty;
