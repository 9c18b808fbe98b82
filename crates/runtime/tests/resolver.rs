//! Plan resolution through the runtime: budgets, caching, simulation and
//! external solvers.

use std::sync::Arc;

use dialogue_core::fixtures;
use planner::{BranchStatus, Goal};
use runtime::{
    DeviationStatus, Event, ExternalSolver, OutcomeSummary, PlanOutcome, PlanningEvent, Runtime,
    RuntimeConfig, Topic,
};

#[tokio::test]
async fn identical_requests_hit_the_cache() {
    let runtime = Runtime::builder().graph(fixtures::tavern()).build().await.unwrap();
    let first = runtime.open_session("barkeep").await.unwrap();
    let second = runtime.open_session("barkeep").await.unwrap();

    let a = first.plan(&Goal::TerminalContext).await.unwrap();
    let b = second.plan(&Goal::TerminalContext).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(runtime.resolver().cached_plans(), 1);
}

#[tokio::test]
async fn exhausted_search_budget_reports_a_timeout() {
    let mut config = RuntimeConfig::default();
    config.planner.max_search_states = 3;
    let runtime = Runtime::builder()
        .config(config)
        .graph(fixtures::tavern())
        .build()
        .await
        .unwrap();
    let session = runtime.open_session("barkeep").await.unwrap();
    let mut planning = runtime.subscribe(Topic::Planning);

    let outcome = session.plan(&Goal::TerminalContext).await.unwrap();
    assert_eq!(outcome, PlanOutcome::Timeout);
    assert_eq!(runtime.resolver().cached_plans(), 0);
    assert!(matches!(
        planning.recv().await.unwrap(),
        Event::Planning(PlanningEvent::PlanResolved {
            outcome: OutcomeSummary::Timeout,
            ..
        })
    ));

    let report = session.assess_deviation().await.unwrap();
    assert_eq!(report.status, DeviationStatus::Undetermined);
    assert_eq!(session.assess_quest(&Goal::TerminalContext).await.unwrap(), None);
}

#[tokio::test]
async fn batch_simulation_leaves_the_session_alone() {
    let runtime = Runtime::builder().graph(fixtures::tavern()).build().await.unwrap();
    let session = runtime.open_session("barkeep").await.unwrap();

    let PlanOutcome::Found(plan) = session.plan(&Goal::TerminalContext).await.unwrap() else {
        panic!("tavern is solvable");
    };
    let traces = vec![
        plan.steps.clone(),
        plan.steps[..3].to_vec(),
        plan.steps[1..].to_vec(),
    ];
    let results = session.simulate(traces).await.unwrap();

    assert_eq!(results[0].status, BranchStatus::GoalReached);
    assert_eq!(results[0].final_context.as_deref(), Some("ctx_shadow_den"));
    assert_eq!(results[1].status, BranchStatus::InProgress);
    assert!(matches!(results[2].status, BranchStatus::Rejected { step: 0, .. }));

    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.state.nonce, 0);
    assert!(snapshot.history.is_empty());
}

#[tokio::test]
async fn plans_drive_the_session_to_the_goal() {
    let runtime = Runtime::builder().graph(fixtures::tavern()).build().await.unwrap();
    let session = runtime.open_session("barkeep").await.unwrap();

    let PlanOutcome::Found(plan) = session.plan(&Goal::TerminalContext).await.unwrap() else {
        panic!("tavern is solvable");
    };
    for step in plan.steps {
        session.apply_step(step).await.unwrap();
    }

    let snapshot = session.snapshot().await.unwrap();
    let den = snapshot.graph.context_id("ctx_shadow_den").unwrap();
    assert_eq!(snapshot.state.context, den);

    let finished = session.plan(&Goal::TerminalContext).await.unwrap();
    assert!(matches!(finished, PlanOutcome::Found(plan) if plan.is_empty()));
}

#[cfg(unix)]
#[tokio::test]
async fn external_solver_output_is_parsed() {
    let script = "echo 'Solution found!'; \
                  echo '(apply-concept player ctx_tavern_intro ctx_neutral_talk cpt_quest_none)'";
    let solver = ExternalSolver::new("sh").args(["-c", script]);
    let runtime = Runtime::builder()
        .graph(fixtures::tavern())
        .solver(Arc::new(solver))
        .build()
        .await
        .unwrap();
    let session = runtime.open_session("barkeep").await.unwrap();

    let outcome = session.plan(&Goal::TerminalContext).await.unwrap();
    let PlanOutcome::Found(plan) = outcome else {
        panic!("expected a plan, got {outcome:?}");
    };
    assert_eq!(plan.len(), 1);
    assert_eq!(runtime.resolver().solver_name(), "external");
}

#[cfg(unix)]
#[tokio::test]
async fn slow_external_solver_times_out() {
    let mut config = RuntimeConfig::default();
    config.planner.solver_timeout_ms = 50;
    let runtime = Runtime::builder()
        .config(config)
        .graph(fixtures::tavern())
        .solver(Arc::new(ExternalSolver::new("sh").args(["-c", "sleep 5"])))
        .build()
        .await
        .unwrap();
    let session = runtime.open_session("barkeep").await.unwrap();

    let started = std::time::Instant::now();
    let outcome = session.plan(&Goal::TerminalContext).await.unwrap();
    assert_eq!(outcome, PlanOutcome::Timeout);
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
}
