//! Replay of candidate action traces against the formal model.
//!
//! A replay never touches a live session: it starts from the task's initial
//! facts and only ever works on its own copy.

use crate::ground::{FactSet, GroundTask};
use crate::plan::PlanStep;
use crate::search::{Search, SearchError, SearchOutcome};

/// Where a replayed trace ended up.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum BranchStatus {
    GoalReached,
    /// The goal is still reachable, or reachability could not be decided
    /// within the search budget.
    InProgress,
    /// No continuation reaches the goal.
    DeadEnd,
    /// Step `step` (zero-based) was not applicable.
    Rejected { step: usize, action: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryEntry {
    pub item: String,
    pub worn: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationResult {
    pub final_context: Option<String>,
    pub concepts: Vec<String>,
    pub inventory: Vec<InventoryEntry>,
    pub steps_applied: usize,
    pub status: BranchStatus,
}

/// Replays `trace` from the initial facts of `task`.
///
/// Replay stops at the first step that is not applicable. When the trace
/// ends short of the goal, a bounded search decides between
/// [`BranchStatus::InProgress`] and [`BranchStatus::DeadEnd`].
pub fn replay(task: &GroundTask, trace: &[PlanStep], max_states: usize) -> SimulationResult {
    let mut state = task.init().clone();
    let mut rejected = None;

    for (index, step) in trace.iter().enumerate() {
        let applicable = task
            .find(step)
            .filter(|action| task.action(*action).is_some_and(|a| a.is_applicable(&state)));
        match applicable {
            Some(action) => state = task.apply(&state, action),
            None => {
                rejected = Some(BranchStatus::Rejected {
                    step: index,
                    action: step.to_string(),
                });
                break;
            }
        }
    }

    let steps_applied = match &rejected {
        Some(BranchStatus::Rejected { step, .. }) => *step,
        _ => trace.len(),
    };
    let status = rejected.unwrap_or_else(|| classify(task, &state, max_states));
    summarize(task, &state, steps_applied, status)
}

fn classify(task: &GroundTask, state: &FactSet, max_states: usize) -> BranchStatus {
    if task.is_goal(state) {
        return BranchStatus::GoalReached;
    }
    match Search::new(task).max_states(max_states).run_from(state) {
        Ok(SearchOutcome::Unsolvable) => BranchStatus::DeadEnd,
        Ok(SearchOutcome::Found(_)) => BranchStatus::InProgress,
        Err(SearchError::StateBudgetExceeded { limit }) => {
            tracing::warn!(limit, "reachability undecided within budget");
            BranchStatus::InProgress
        }
        Err(SearchError::Cancelled) => BranchStatus::InProgress,
    }
}

fn summarize(
    task: &GroundTask,
    state: &FactSet,
    steps_applied: usize,
    status: BranchStatus,
) -> SimulationResult {
    let mut result = SimulationResult {
        final_context: None,
        concepts: Vec::new(),
        inventory: Vec::new(),
        steps_applied,
        status,
    };
    for fact in task.facts(state) {
        match (fact.predicate.as_str(), fact.args.as_slice()) {
            ("active-context", [_, context]) => result.final_context = Some(context.clone()),
            ("has-concept", [_, concept]) => result.concepts.push(concept.clone()),
            ("holding", [_, item]) => result.inventory.push(InventoryEntry {
                item: item.clone(),
                worn: false,
            }),
            ("wearing", [_, item]) => result.inventory.push(InventoryEntry {
                item: item.clone(),
                worn: true,
            }),
            _ => {}
        }
    }
    result.concepts.sort();
    result.inventory.sort_by(|a, b| a.item.cmp(&b.item));
    result
}
