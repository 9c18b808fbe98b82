//! Worker tasks that back the runtime orchestration.
//!
//! Each open conversation is served by one session worker that owns its
//! state; planning and simulation run outside the workers.

mod session;

pub use session::{AppliedMove, Command, MoveList, SessionSnapshot, SessionWorker};
