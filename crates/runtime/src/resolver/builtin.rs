//! In-process solver: parse, ground and breadth-first search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use planner::{GroundTask, Search, SearchError, SearchOutcome, TaskText};
use tokio_util::sync::CancellationToken;

use super::{PlanOutcome, SolveBudget, Solver};
use crate::api::ResolveError;

/// Optimal (shortest-plan) solver running on a blocking thread.
///
/// Cancellation is cooperative: the search polls a flag that is raised when
/// the token fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSolver;

impl BuiltinSolver {
    pub fn new() -> Self {
        Self
    }
}

fn search(task: &TaskText, max_states: usize, cancel: &AtomicBool) -> Result<PlanOutcome, ResolveError> {
    let ground = GroundTask::from_text(&task.domain, &task.problem)?;
    tracing::debug!(actions = ground.actions().len(), "task grounded");

    match Search::new(&ground).max_states(max_states).cancel_on(cancel).run() {
        Ok(SearchOutcome::Found(plan)) => Ok(PlanOutcome::Found(plan)),
        Ok(SearchOutcome::Unsolvable) => Ok(PlanOutcome::Unsolvable),
        Err(SearchError::StateBudgetExceeded { limit }) => {
            tracing::warn!(limit, "search budget exhausted");
            Ok(PlanOutcome::Timeout)
        }
        Err(SearchError::Cancelled) => Err(ResolveError::Cancelled),
    }
}

#[async_trait]
impl Solver for BuiltinSolver {
    fn name(&self) -> &'static str {
        "builtin-bfs"
    }

    async fn solve(
        &self,
        task: &TaskText,
        budget: &SolveBudget,
        cancel: &CancellationToken,
    ) -> Result<PlanOutcome, ResolveError> {
        let flag = Arc::new(AtomicBool::new(false));
        let worker_flag = Arc::clone(&flag);
        let task = task.clone();
        let max_states = budget.max_states;

        let mut job =
            tokio::task::spawn_blocking(move || search(&task, max_states, &worker_flag));

        tokio::select! {
            joined = &mut job => joined.map_err(ResolveError::Join)?,
            _ = cancel.cancelled() => {
                flag.store(true, Ordering::Relaxed);
                Err(ResolveError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const DOMAIN: &str = "
        (define (domain hops)
          (:requirements :strips :typing)
          (:types spot)
          (:predicates (at ?s - spot) (link ?a ?b - spot))
          (:action hop
            :parameters (?a ?b - spot)
            :precondition (and (at ?a) (link ?a ?b))
            :effect (and (not (at ?a)) (at ?b))))";

    fn task(goal: &str) -> TaskText {
        TaskText {
            domain: DOMAIN.into(),
            problem: format!(
                "(define (problem p) (:domain hops) (:objects s0 s1 s2 - spot)
                   (:init (at s0) (link s0 s1) (link s1 s2))
                   (:goal {goal}))"
            ),
        }
    }

    fn budget() -> SolveBudget {
        SolveBudget {
            timeout: Duration::from_secs(5),
            max_states: 1_000,
        }
    }

    #[tokio::test]
    async fn solves_and_reports_unsolvable() {
        let solver = BuiltinSolver::new();
        let cancel = CancellationToken::new();

        let found = solver.solve(&task("(at s2)"), &budget(), &cancel).await.unwrap();
        assert!(matches!(found, PlanOutcome::Found(plan) if plan.len() == 2));

        let stuck = task("(link s2 s0)");
        assert_eq!(
            solver.solve(&stuck, &budget(), &cancel).await.unwrap(),
            PlanOutcome::Unsolvable
        );
    }

    #[tokio::test]
    async fn cancelled_token_stops_the_solver() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = BuiltinSolver::new().solve(&task("(at s2)"), &budget(), &cancel).await;
        // Either the search finished first or the cancellation won.
        assert!(matches!(result, Ok(PlanOutcome::Found(_)) | Err(ResolveError::Cancelled)));
    }

    #[tokio::test]
    async fn malformed_text_is_a_task_error() {
        let bad = TaskText {
            domain: "(define".into(),
            problem: String::new(),
        };
        let result = BuiltinSolver::new()
            .solve(&bad, &budget(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ResolveError::Task(_))));
    }
}
