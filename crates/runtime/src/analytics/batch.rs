//! Parallel replay of candidate traces on a dedicated thread pool.

use std::sync::Arc;

use planner::{GroundTask, PlanStep, SimulationResult, TaskText, replay};
use rayon::prelude::*;

use crate::api::ResolveError;

/// Replays independent traces in parallel.
///
/// Every trace starts from its own copy of the task's initial facts, so the
/// workers share nothing mutable.
#[derive(Clone)]
pub struct BatchSimulator {
    pool: Arc<rayon::ThreadPool>,
}

impl BatchSimulator {
    /// Builds a pool with `threads` workers; `0` lets rayon pick.
    pub fn new(threads: usize) -> Result<Self, ResolveError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("npc-sim-{index}"))
            .build()?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Grounds `task` once and replays every trace against it.
    ///
    /// Results keep the order of `traces`.
    pub fn run(
        &self,
        task: &TaskText,
        traces: &[Vec<PlanStep>],
        max_states: usize,
    ) -> Result<Vec<SimulationResult>, ResolveError> {
        let ground = GroundTask::from_text(&task.domain, &task.problem)?;
        let results: Vec<SimulationResult> = self.pool.install(|| {
            traces
                .par_iter()
                .map(|trace| replay(&ground, trace, max_states))
                .collect()
        });
        tracing::debug!(traces = results.len(), "batch simulated");
        Ok(results)
    }
}

impl std::fmt::Debug for BatchSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchSimulator")
            .field("threads", &self.threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use planner::BranchStatus;

    use super::*;

    fn task() -> TaskText {
        TaskText {
            domain: "
                (define (domain hops)
                  (:requirements :strips :typing)
                  (:types spot)
                  (:predicates (at ?s - spot) (link ?a ?b - spot))
                  (:action hop
                    :parameters (?a ?b - spot)
                    :precondition (and (at ?a) (link ?a ?b))
                    :effect (and (not (at ?a)) (at ?b))))"
                .into(),
            problem: "(define (problem p) (:domain hops) (:objects s0 s1 s2 s3 - spot)
                        (:init (at s0) (link s0 s1) (link s1 s2) (link s0 s3))
                        (:goal (at s2)))"
                .into(),
        }
    }

    fn hop(from: &str, to: &str) -> PlanStep {
        PlanStep::new("hop", [from, to])
    }

    #[test]
    fn traces_are_classified_independently() {
        let simulator = BatchSimulator::new(2).unwrap();
        let traces = vec![
            vec![hop("s0", "s1"), hop("s1", "s2")],
            vec![hop("s0", "s1")],
            vec![hop("s0", "s3")],
            vec![hop("s1", "s2")],
        ];
        let statuses: Vec<_> = simulator
            .run(&task(), &traces, 100)
            .unwrap()
            .into_iter()
            .map(|result| result.status)
            .collect();

        assert_eq!(
            statuses,
            [
                BranchStatus::GoalReached,
                BranchStatus::InProgress,
                BranchStatus::DeadEnd,
                BranchStatus::Rejected {
                    step: 0,
                    action: "(hop s1 s2)".into()
                },
            ]
        );
    }

    #[test]
    fn empty_batch_is_empty() {
        let simulator = BatchSimulator::new(1).unwrap();
        assert!(simulator.run(&task(), &[], 100).unwrap().is_empty());
        assert_eq!(simulator.threads(), 1);
    }
}
