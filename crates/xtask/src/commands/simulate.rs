//! Replay candidate traces against a character's start state.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use planner::PlanStep;

use super::listing::PlanListing;
use super::world::{WorldArgs, open_session};

/// Simulate candidate traces in parallel without touching the session
#[derive(Parser, Debug)]
pub struct Simulate {
    #[command(flatten)]
    world: WorldArgs,

    /// Character whose start state the traces begin from
    #[arg(short, long)]
    character: String,

    /// JSON listing of traces, as written by `xtask plan --json`
    #[arg(long, value_name = "JSON")]
    traces: PathBuf,
}

impl Simulate {
    pub async fn execute(self) -> Result<()> {
        let text = std::fs::read_to_string(&self.traces)
            .with_context(|| format!("File '{}' not found", self.traces.display()))?;
        let listing: PlanListing = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in '{}'", self.traces.display()))?;
        let traces = parse_traces(&listing)?;

        let config = self.world.runtime_config()?;
        let graph = self.world.load_graph()?;
        let (runtime, session) = open_session(config, graph, &self.character).await?;
        let results = session.simulate(traces).await?;
        println!("{}", serde_json::to_string_pretty(&results)?);

        runtime.shutdown().await?;
        Ok(())
    }
}

fn parse_traces(listing: &PlanListing) -> Result<Vec<Vec<PlanStep>>> {
    listing
        .plans
        .iter()
        .enumerate()
        .map(|(i, steps)| {
            planner::Plan::parse(&steps.join("\n"))
                .map(|plan| plan.steps)
                .with_context(|| format!("trace {} is not a plan", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traces_parse_step_by_step() {
        let listing: PlanListing = serde_json::from_str(
            r#"{"plans": [["(shift-context player a b)"], []]}"#,
        )
        .unwrap();
        let traces = parse_traces(&listing).unwrap();
        assert_eq!(
            traces,
            vec![vec![PlanStep::new("shift-context", ["player", "a", "b"])], vec![]]
        );
    }

    #[test]
    fn malformed_trace_names_its_position() {
        let listing: PlanListing =
            serde_json::from_str(r#"{"plans": [[], ["(shift-context"]]}"#).unwrap();
        let err = parse_traces(&listing).unwrap_err();
        assert!(err.to_string().contains("trace 2"));
    }
}
