//! Breadth-first search over a ground task.
//!
//! Every action has unit cost, so the first goal state generated yields a
//! plan of minimal length. Successors are expanded in action order, which
//! makes the returned plan deterministic.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use dialogue_core::PlannerConfig;

use crate::ground::{FactSet, GroundTask};
use crate::plan::Plan;

/// How often, in expanded states, the cancellation flag is polled.
const CANCEL_POLL_INTERVAL: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search exceeded its budget of {limit} states")]
    StateBudgetExceeded { limit: usize },

    #[error("search was cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Plan),
    Unsolvable,
}

struct Node {
    state: FactSet,
    parent: Option<(usize, usize)>,
}

pub struct Search<'t> {
    task: &'t GroundTask,
    max_states: usize,
    cancel: Option<&'t AtomicBool>,
}

impl<'t> Search<'t> {
    pub fn new(task: &'t GroundTask) -> Self {
        Self {
            task,
            max_states: PlannerConfig::DEFAULT_MAX_SEARCH_STATES,
            cancel: None,
        }
    }

    pub fn max_states(mut self, limit: usize) -> Self {
        self.max_states = limit;
        self
    }

    /// Stops the search with [`SearchError::Cancelled`] once `flag` is set.
    pub fn cancel_on(mut self, flag: &'t AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(&self) -> Result<SearchOutcome, SearchError> {
        self.run_from(self.task.init())
    }

    pub fn run_from(&self, start: &FactSet) -> Result<SearchOutcome, SearchError> {
        if self.task.is_goal(start) {
            return Ok(SearchOutcome::Found(Plan::default()));
        }

        let mut nodes = vec![Node {
            state: start.clone(),
            parent: None,
        }];
        let mut seen: HashSet<FactSet> = HashSet::from([start.clone()]);
        let mut frontier = VecDeque::from([0]);
        let mut expanded = 0usize;

        while let Some(current) = frontier.pop_front() {
            if expanded % CANCEL_POLL_INTERVAL == 0 && self.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
            expanded += 1;

            let state = nodes[current].state.clone();
            for action in self.task.applicable(&state) {
                let next = self.task.apply(&state, action);
                if !seen.insert(next.clone()) {
                    continue;
                }
                nodes.push(Node {
                    state: next,
                    parent: Some((current, action)),
                });
                let index = nodes.len() - 1;
                if self.task.is_goal(&nodes[index].state) {
                    tracing::debug!(expanded, generated = nodes.len(), "goal reached");
                    return Ok(SearchOutcome::Found(self.extract(&nodes, index)));
                }
                if nodes.len() > self.max_states {
                    return Err(SearchError::StateBudgetExceeded {
                        limit: self.max_states,
                    });
                }
                frontier.push_back(index);
            }
        }

        tracing::debug!(expanded, "search space exhausted");
        Ok(SearchOutcome::Unsolvable)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn extract(&self, nodes: &[Node], mut index: usize) -> Plan {
        let mut steps = Vec::new();
        while let Some((parent, action)) = nodes[index].parent {
            if let Some(ground) = self.task.action(action) {
                steps.push(ground.step().clone());
            }
            index = parent;
        }
        steps.reverse();
        Plan::new(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "
        (define (domain corridor)
          (:requirements :strips :typing :negative-preconditions)
          (:types cell)
          (:predicates (next ?a ?b - cell) (at ?c - cell) (sealed ?c - cell))
          (:action step
            :parameters (?from ?to - cell)
            :precondition (and (at ?from) (next ?from ?to) (not (sealed ?to)))
            :effect (and (not (at ?from)) (at ?to))))";

    fn problem(goal: &str, extra: &str) -> String {
        format!(
            "(define (problem walk) (:domain corridor) (:objects c0 c1 c2 c3 - cell)
               (:init (at c0) (next c0 c1) (next c1 c2) (next c2 c3) (next c1 c0) {extra})
               (:goal {goal}))"
        )
    }

    #[test]
    fn finds_the_shortest_plan() {
        let task = GroundTask::from_text(DOMAIN, &problem("(at c3)", "")).unwrap();
        let SearchOutcome::Found(plan) = Search::new(&task).run().unwrap() else {
            panic!("corridor is solvable");
        };
        assert_eq!(plan.to_string(), "(step c0 c1)\n(step c1 c2)\n(step c2 c3)\n");
    }

    #[test]
    fn goal_already_true_yields_an_empty_plan() {
        let task = GroundTask::from_text(DOMAIN, &problem("(at c0)", "")).unwrap();
        assert_eq!(Search::new(&task).run(), Ok(SearchOutcome::Found(Plan::default())));
    }

    #[test]
    fn sealed_goal_is_unsolvable() {
        let task = GroundTask::from_text(DOMAIN, &problem("(at c3)", "(sealed c3)")).unwrap();
        assert_eq!(Search::new(&task).run(), Ok(SearchOutcome::Unsolvable));
    }

    #[test]
    fn budget_and_cancellation_stop_the_search() {
        let task = GroundTask::from_text(DOMAIN, &problem("(at c3)", "")).unwrap();
        assert_eq!(
            Search::new(&task).max_states(1).run(),
            Err(SearchError::StateBudgetExceeded { limit: 1 })
        );

        let cancelled = AtomicBool::new(true);
        assert_eq!(
            Search::new(&task).cancel_on(&cancelled).run(),
            Err(SearchError::Cancelled)
        );
    }
}
