//! Plan resolution behind an explicit request/response boundary.
//!
//! A [`Solver`] turns planning text into a [`PlanOutcome`]. [`PlanResolver`]
//! wraps one with a wall-clock timeout, cancellation and a bounded cache.
//! Resolution never touches session state, so a timeout or a cancelled call
//! simply discards the work.

mod builtin;
mod cache;
mod external;

pub use builtin::BuiltinSolver;
pub use cache::{PlanCache, task_key};
pub use external::ExternalSolver;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use planner::{Plan, PlanStep, SimulationResult, TaskText};
use tokio_util::sync::CancellationToken;

use crate::analytics::BatchSimulator;
use crate::api::ResolveError;

/// The three valid results of planning. Neither `Unsolvable` nor `Timeout`
/// is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Found(Plan),
    Unsolvable,
    Timeout,
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            Self::Found(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::Unsolvable => "unsolvable",
            Self::Timeout => "timeout",
        }
    }
}

/// Limits handed to a solver for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveBudget {
    pub timeout: Duration,
    /// Search state budget for in-process solvers.
    pub max_states: usize,
}

/// A classical planner that accepts domain and problem text.
#[async_trait]
pub trait Solver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Solves one task. Implementations must stop promptly once `cancel`
    /// fires.
    async fn solve(
        &self,
        task: &TaskText,
        budget: &SolveBudget,
        cancel: &CancellationToken,
    ) -> Result<PlanOutcome, ResolveError>;
}

/// Solver front end shared by every session.
pub struct PlanResolver {
    solver: Arc<dyn Solver>,
    cache: Mutex<PlanCache>,
    budget: SolveBudget,
    shutdown: CancellationToken,
    simulator: BatchSimulator,
}

impl PlanResolver {
    pub fn new(
        solver: Arc<dyn Solver>,
        budget: SolveBudget,
        cache_capacity: usize,
        simulator: BatchSimulator,
    ) -> Self {
        Self {
            solver,
            cache: Mutex::new(PlanCache::new(cache_capacity)),
            budget,
            shutdown: CancellationToken::new(),
            simulator,
        }
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn budget(&self) -> &SolveBudget {
        &self.budget
    }

    pub fn cached_plans(&self) -> usize {
        self.cache().len()
    }

    /// Solves with the configured default timeout.
    pub async fn solve_default(&self, task: &TaskText) -> Result<PlanOutcome, ResolveError> {
        self.solve(task, self.budget.timeout).await
    }

    /// Solves `task`, giving up after `timeout`.
    ///
    /// Expiry cancels the solver and yields [`PlanOutcome::Timeout`].
    pub async fn solve(
        &self,
        task: &TaskText,
        timeout: Duration,
    ) -> Result<PlanOutcome, ResolveError> {
        let key = task_key(task);
        let cached = self.cache().get(&key);
        if let Some(outcome) = cached {
            tracing::debug!(key = %key, outcome = outcome.as_str(), "plan cache hit");
            return Ok(outcome);
        }

        let cancel = self.shutdown.child_token();
        let budget = SolveBudget {
            timeout,
            ..self.budget.clone()
        };
        let started = Instant::now();

        let outcome = match tokio::time::timeout(
            timeout,
            self.solver.solve(task, &budget, &cancel),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                cancel.cancel();
                PlanOutcome::Timeout
            }
        };

        let elapsed_ms = started.elapsed().as_millis();
        match &outcome {
            PlanOutcome::Timeout => tracing::warn!(
                solver = self.solver.name(),
                timeout_ms = timeout.as_millis(),
                "solver timed out"
            ),
            _ => tracing::info!(
                solver = self.solver.name(),
                outcome = outcome.as_str(),
                length = outcome.plan().map(Plan::len),
                elapsed_ms,
                "plan resolved"
            ),
        }

        self.cache().insert(key, outcome.clone());
        Ok(outcome)
    }

    /// Replays every trace against the initial facts of `task`, in parallel.
    pub async fn simulate_batch(
        &self,
        task: &TaskText,
        traces: Vec<Vec<PlanStep>>,
    ) -> Result<Vec<SimulationResult>, ResolveError> {
        let simulator = self.simulator.clone();
        let task = task.clone();
        let max_states = self.budget.max_states;
        tokio::task::spawn_blocking(move || simulator.run(&task, &traces, max_states))
            .await
            .map_err(ResolveError::Join)?
    }

    /// Cancels every in-flight solve.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, PlanCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Counts calls and either answers immediately or never.
    struct Scripted {
        calls: AtomicUsize,
        hang: bool,
    }

    #[async_trait]
    impl Solver for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn solve(
            &self,
            _task: &TaskText,
            _budget: &SolveBudget,
            cancel: &CancellationToken,
        ) -> Result<PlanOutcome, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                cancel.cancelled().await;
                return Err(ResolveError::Cancelled);
            }
            Ok(PlanOutcome::Found(Plan::new(vec![PlanStep::new("wait", ["player"])])))
        }
    }

    fn resolver(hang: bool) -> (Arc<Scripted>, PlanResolver) {
        let solver = Arc::new(Scripted {
            calls: AtomicUsize::new(0),
            hang,
        });
        let budget = SolveBudget {
            timeout: Duration::from_millis(50),
            max_states: 100,
        };
        let resolver = PlanResolver::new(solver.clone(), budget, 4, BatchSimulator::new(1).unwrap());
        (solver, resolver)
    }

    fn text() -> TaskText {
        TaskText {
            domain: "(define (domain d))".into(),
            problem: "(define (problem p) (:domain d))".into(),
        }
    }

    #[tokio::test]
    async fn definitive_outcomes_are_cached() {
        let (solver, resolver) = resolver(false);
        let first = resolver.solve_default(&text()).await.unwrap();
        let second = resolver.solve_default(&text()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(solver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_plans(), 1);
    }

    #[tokio::test]
    async fn expiry_yields_timeout_and_is_not_cached() {
        let (solver, resolver) = resolver(true);
        let outcome = resolver.solve(&text(), Duration::from_millis(20)).await.unwrap();

        assert_eq!(outcome, PlanOutcome::Timeout);
        assert_eq!(resolver.cached_plans(), 0);

        resolver.solve(&text(), Duration::from_millis(20)).await.unwrap();
        assert_eq!(solver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shutdown_cancels_in_flight_solves() {
        let (_, resolver) = resolver(true);
        resolver.shutdown();
        let result = resolver.solve(&text(), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ResolveError::Cancelled)));
    }
}
