//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod listing;
mod plan;
mod play;
mod print_plans;
mod simulate;
mod synthesize;
mod validate;
mod world;

pub use plan::Plan;
pub use play::Play;
pub use print_plans::PrintPlans;
pub use simulate::Simulate;
pub use synthesize::Synthesize;
pub use validate::Validate;
