//! End-to-end planning on the reference worlds: synthesize, parse, ground,
//! search and replay.

use dialogue_core::{PlannerConfig, SessionState, TransitionEngine, fixtures};
use planner::{
    BranchStatus, GroundTask, Goal, Plan, PlanStep, Search, SearchOutcome, Synthesizer, replay,
};

fn ground(graph: &dialogue_core::GraphModel, state: &SessionState, goal: &Goal) -> GroundTask {
    let text = Synthesizer::new(graph, &PlannerConfig::default())
        .synthesize_default(state, goal)
        .unwrap()
        .render();
    GroundTask::from_text(&text.domain, &text.problem).unwrap()
}

fn solve(task: &GroundTask) -> Plan {
    match Search::new(task).run().unwrap() {
        SearchOutcome::Found(plan) => plan,
        SearchOutcome::Unsolvable => panic!("task should be solvable"),
    }
}

#[test]
fn synthesis_is_byte_identical_across_calls() {
    let graph = fixtures::tavern();
    let state = fixtures::at_neutral_talk(&graph);
    let config = PlannerConfig::default();

    let first = Synthesizer::new(&graph, &config)
        .synthesize_default(&state, &Goal::TerminalContext)
        .unwrap()
        .render();
    let second = Synthesizer::new(&fixtures::tavern(), &config)
        .synthesize_default(&state.clone(), &Goal::TerminalContext)
        .unwrap()
        .render();
    assert_eq!(first, second);
}

#[test]
fn rendered_text_parses_back_to_the_same_task() {
    let graph = fixtures::tavern();
    let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let task = Synthesizer::new(&graph, &PlannerConfig::default())
        .synthesize_default(&state, &Goal::TerminalContext)
        .unwrap();
    let text = task.render();

    assert_eq!(planner::pddl::parse_domain(&text.domain).unwrap(), task.domain);
    assert_eq!(planner::pddl::parse_problem(&text.problem).unwrap(), task.problem);
}

#[test]
fn shortest_route_to_the_den_takes_seven_moves() {
    let graph = fixtures::tavern();
    let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let plan = solve(&ground(&graph, &state, &Goal::TerminalContext));

    assert_eq!(plan.len(), 7);
    assert_eq!(plan.context_shifts(), 3);

    // The plan drives the real engine to the goal.
    let engine = TransitionEngine::new(&graph);
    let mut current = state;
    for mv in plan.to_moves(&graph).unwrap() {
        current = engine.apply(&current, &mv).unwrap().state;
    }
    assert_eq!(current.context, graph.context_id("ctx_shadow_den").unwrap());
}

#[test]
fn quest_goal_override_plans_for_the_concept() {
    let graph = fixtures::tavern();
    let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let trusted = Goal::HoldsConcept(graph.concept_id("cpt_trusted").unwrap());
    let plan = solve(&ground(&graph, &state, &trusted));

    let last = plan.steps.last().unwrap();
    assert_eq!(last.action, "activate-trigger");
    assert_eq!(last.args.last().map(String::as_str), Some("trig_share_secret"));
}

#[test]
fn sealed_vault_is_unsolvable() {
    let graph = fixtures::sealed_vault();
    let state = SessionState::new(&graph, fixtures::warden(&graph)).unwrap();
    let task = ground(&graph, &state, &Goal::TerminalContext);
    assert_eq!(Search::new(&task).run(), Ok(SearchOutcome::Unsolvable));
}

#[test]
fn replay_classifies_branches() {
    let graph = fixtures::tavern();
    let state = SessionState::new(&graph, fixtures::barkeep(&graph)).unwrap();
    let task = ground(&graph, &state, &Goal::TerminalContext);
    let plan = solve(&task);
    let budget = PlannerConfig::DEFAULT_MAX_SEARCH_STATES;

    let full = replay(&task, &plan.steps, budget);
    assert_eq!(full.status, BranchStatus::GoalReached);
    assert_eq!(full.final_context.as_deref(), Some("ctx_shadow_den"));
    assert!(full.concepts.contains(&"cpt_shadow_token".to_owned()));
    assert!(full.inventory.iter().any(|entry| entry.item == "item_shadow_coin" && !entry.worn));

    let partial = replay(&task, &plan.steps[..2], budget);
    assert_eq!(partial.status, BranchStatus::InProgress);
    assert_eq!(partial.steps_applied, 2);

    let bogus = PlanStep::new(
        "shift-context",
        ["player", "ctx_tavern_intro", "ctx_shadow_den"],
    );
    let rejected = replay(&task, &[plan.steps[0].clone(), bogus], budget);
    assert_eq!(
        rejected.status,
        BranchStatus::Rejected {
            step: 1,
            action: "(shift-context player ctx_tavern_intro ctx_shadow_den)".into()
        }
    );
    assert_eq!(rejected.steps_applied, 1);
}

#[test]
fn replay_in_the_vault_ends_in_a_dead_end() {
    let graph = fixtures::sealed_vault();
    let state = SessionState::new(&graph, fixtures::warden(&graph)).unwrap();
    let task = ground(&graph, &state, &Goal::TerminalContext);

    let trace = [PlanStep::new("shift-context", ["player", "vault_hall", "vault_stairs"])];
    let result = replay(&task, &trace, 1_000);
    assert_eq!(result.status, BranchStatus::DeadEnd);
    assert_eq!(result.final_context.as_deref(), Some("vault_stairs"));
}
