//! Deviation of a session from its shortest route to the goal.

use planner::PlanStep;
use serde::{Deserialize, Serialize};

use crate::resolver::PlanOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviationStatus {
    OnTrack,
    /// Over the threshold, but the goal is still solvable.
    Deviating,
    DeadEnd,
    /// The solver ran out of time; nothing is known.
    Undetermined,
}

/// Advisory assessment handed to the narrator layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviationReport {
    pub status: DeviationStatus,
    /// Length of the shortest plan from the current state.
    pub l_opt: Option<usize>,
    /// Context shifts the session has taken so far.
    pub l_actual: usize,
    pub threshold: usize,
    /// First step of the shortest plan.
    pub hint: Option<PlanStep>,
}

impl DeviationReport {
    pub fn classify(outcome: &PlanOutcome, l_actual: usize, threshold: usize) -> Self {
        let (status, l_opt, hint) = match outcome {
            PlanOutcome::Found(plan) => {
                let l_opt = plan.len();
                let status = if l_actual <= l_opt.saturating_add(threshold) {
                    DeviationStatus::OnTrack
                } else {
                    DeviationStatus::Deviating
                };
                (status, Some(l_opt), plan.first().cloned())
            }
            PlanOutcome::Unsolvable => (DeviationStatus::DeadEnd, None, None),
            PlanOutcome::Timeout => (DeviationStatus::Undetermined, None, None),
        };
        Self {
            status,
            l_opt,
            l_actual,
            threshold,
            hint,
        }
    }

    pub fn is_on_track(&self) -> bool {
        self.status == DeviationStatus::OnTrack
    }
}

#[cfg(test)]
mod tests {
    use planner::Plan;

    use super::*;

    fn plan(len: usize) -> PlanOutcome {
        let steps = (0..len)
            .map(|i| {
                PlanStep::new(
                    "shift-context",
                    ["player".to_owned(), format!("c{i}"), format!("c{}", i + 1)],
                )
            })
            .collect();
        PlanOutcome::Found(Plan::new(steps))
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(DeviationReport::classify(&plan(3), 5, 2).status, DeviationStatus::OnTrack);
        assert_eq!(DeviationReport::classify(&plan(3), 6, 2).status, DeviationStatus::Deviating);
    }

    #[test]
    fn hint_is_the_next_optimal_step() {
        let report = DeviationReport::classify(&plan(2), 0, 2);
        assert_eq!(report.l_opt, Some(2));
        assert_eq!(report.hint.unwrap().args[2], "c1");
    }

    #[test]
    fn unsolvable_is_a_dead_end_at_any_length() {
        for l_actual in [0, 1, 50] {
            let report = DeviationReport::classify(&PlanOutcome::Unsolvable, l_actual, 2);
            assert_eq!(report.status, DeviationStatus::DeadEnd);
            assert_eq!(report.hint, None);
        }
    }

    #[test]
    fn timeout_is_undetermined() {
        let report = DeviationReport::classify(&PlanOutcome::Timeout, 4, 2);
        assert_eq!(report.status, DeviationStatus::Undetermined);
        assert!(!report.is_on_track());
    }
}
