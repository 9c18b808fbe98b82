//! Solve a character's planning task through the runtime.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;
use runtime::{PlanOutcome, QuestDifficulty, SolverBackend};

use super::listing::PlanListing;
use super::world::{GoalArgs, WorldArgs, open_session};

/// Plan a route for a character from its start context
#[derive(Parser, Debug)]
pub struct Plan {
    #[command(flatten)]
    world: WorldArgs,

    /// Character to plan for
    #[arg(short, long)]
    character: String,

    #[command(flatten)]
    goal: GoalArgs,

    /// Solver timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Run this external planner instead of the builtin search
    #[arg(long, value_name = "PROGRAM")]
    external: Option<PathBuf>,

    /// Argument for the external planner; `{domain}`, `{problem}` and
    /// `{plan}` are replaced with file paths
    #[arg(long = "external-arg", value_name = "ARG", allow_hyphen_values = true)]
    external_args: Vec<String>,

    /// File the external planner writes its plan to
    #[arg(long, value_name = "NAME")]
    plan_file: Option<String>,

    /// Print the plan as a JSON listing
    #[arg(long)]
    json: bool,
}

impl Plan {
    pub async fn execute(self) -> Result<()> {
        let mut config = self.world.runtime_config()?;
        if let Some(timeout) = self.timeout_ms {
            config.planner.solver_timeout_ms = timeout;
        }
        if let Some(program) = self.external {
            config.solver = SolverBackend::External {
                program,
                args: self.external_args,
                plan_file: self.plan_file,
            };
        }

        let graph = self.world.load_graph()?;
        let goal = self.goal.resolve(&graph)?;
        let (runtime, session) = open_session(config, graph, &self.character).await?;
        let outcome = session.plan(&goal).await?;

        if self.json {
            let listing = PlanListing::from_plans(outcome.plan());
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            print_outcome(&outcome, runtime.resolver().solver_name());
        }

        runtime.shutdown().await?;
        Ok(())
    }
}

fn print_outcome(outcome: &PlanOutcome, solver: &str) {
    println!("{} {}", style("solver").dim(), solver);
    match outcome {
        PlanOutcome::Found(plan) if plan.is_empty() => {
            println!("{}", style("Goal already holds").green().bold());
        }
        PlanOutcome::Found(plan) => {
            println!(
                "{} ({} steps, {} context shifts)",
                style("Plan found").green().bold(),
                plan.len(),
                plan.context_shifts()
            );
            for (i, step) in plan.steps.iter().enumerate() {
                println!("  {:>2}. {}", i + 1, step);
            }
        }
        PlanOutcome::Unsolvable => println!("{}", style("Goal is unreachable").red().bold()),
        PlanOutcome::Timeout => println!("{}", style("Solver timed out").yellow().bold()),
    }
    if let Some(difficulty) = QuestDifficulty::assess(outcome) {
        println!("{} {}", style("quest").dim(), difficulty.concept());
    }
}
