mod behavior;
mod navigation;
mod trigger;
mod unlock;

pub use behavior::PerformBehavior;
pub use navigation::{LearnConcept, ShiftContext};
pub use trigger::ActivateTrigger;
pub use unlock::{ApplyComboConcept, ApplyConcept};
