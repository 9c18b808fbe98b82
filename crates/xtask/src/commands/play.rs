//! Interactive conversation with a character on the terminal.

use anyhow::Result;
use clap::Parser;
use console::style;
use dialogue_core::{GraphModel, ObjectRef, SessionState};
use planner::Goal;
use runtime::{DeviationStatus, PlanOutcome, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::world::{WorldArgs, open_session};

/// Talk to a character by choosing legal moves
#[derive(Parser, Debug)]
pub struct Play {
    #[command(flatten)]
    world: WorldArgs,

    /// Character to talk to
    #[arg(short, long)]
    character: String,
}

enum Input {
    Choose(usize),
    Plan,
    Hint,
    Reset,
    Quit,
    Unknown,
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Ok(n) = line.parse::<usize>() {
            return Self::Choose(n);
        }
        match line {
            "p" | "plan" => Self::Plan,
            "h" | "hint" => Self::Hint,
            "r" | "reset" => Self::Reset,
            "q" | "quit" | "exit" => Self::Quit,
            _ => Self::Unknown,
        }
    }
}

impl Play {
    pub async fn execute(self) -> Result<()> {
        let config = self.world.runtime_config()?;
        let graph = self.world.load_graph()?;
        let (runtime, session) = open_session(config, graph, &self.character).await?;

        println!(
            "{} {}  {}",
            style("Talking to").bold(),
            style(&self.character).cyan().bold(),
            style("[number] move · plan · hint · reset · quit").dim()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let graph = runtime.graph();
            let snapshot = session.snapshot().await?;
            let listed = session.valid_moves().await?;
            print_state(&graph, &snapshot.state);

            if listed.moves.is_empty() {
                println!("{}", style("No moves left.").yellow());
            }
            for (i, mv) in listed.moves.iter().enumerate() {
                println!("  {:>2}. {}", i + 1, mv.describe(&graph));
            }

            eprint!("{} ", style(">").cyan());
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match Input::parse(&line) {
                Input::Choose(n) => match n.checked_sub(1).and_then(|i| listed.moves.get(i)) {
                    Some(mv) => match session.apply(*mv, listed.generation).await {
                        Ok(applied) => println!("{} {}", style("→").green(), applied.step),
                        Err(err) => println!("{} {err}", style("rejected:").red()),
                    },
                    None => println!("{}", style("No such move").red()),
                },
                Input::Plan => print_plan(&session).await?,
                Input::Hint => print_hint(&session).await?,
                Input::Reset => {
                    session.reset().await?;
                    println!("{}", style("Conversation restarted").dim());
                }
                Input::Quit => break,
                Input::Unknown => println!("{}", style("Unknown command").red()),
            }
        }

        runtime.shutdown().await?;
        Ok(())
    }
}

fn print_state(graph: &GraphModel, state: &SessionState) {
    let name = |object| graph.name_of(object).unwrap_or("?");
    let concepts: Vec<&str> = state
        .concepts
        .iter()
        .map(|c| name(ObjectRef::Concept(*c)))
        .collect();
    println!();
    println!(
        "{} {}  {} {}",
        style("context").dim(),
        style(name(ObjectRef::Context(state.context))).bold(),
        style("mood").dim(),
        name(ObjectRef::Mood(state.mood))
    );
    println!("{} {}", style("concepts").dim(), concepts.join(", "));
}

async fn print_plan(session: &SessionHandle) -> Result<()> {
    match session.plan(&Goal::TerminalContext).await? {
        PlanOutcome::Found(plan) if plan.is_empty() => println!("{}", style("Goal reached").green()),
        PlanOutcome::Found(plan) => {
            for (i, step) in plan.steps.iter().enumerate() {
                println!("  {:>2}. {}", i + 1, step);
            }
        }
        PlanOutcome::Unsolvable => println!("{}", style("The goal is out of reach").red()),
        PlanOutcome::Timeout => println!("{}", style("Solver timed out").yellow()),
    }
    Ok(())
}

async fn print_hint(session: &SessionHandle) -> Result<()> {
    let report = session.assess_deviation().await?;
    let status = match report.status {
        DeviationStatus::OnTrack => style("on track").green(),
        DeviationStatus::Deviating => style("deviating").yellow(),
        DeviationStatus::DeadEnd => style("dead end").red(),
        DeviationStatus::Undetermined => style("undetermined").dim(),
    };
    println!(
        "{status}  {} {}  {} {:?}",
        style("shifts").dim(),
        report.l_actual,
        style("optimal").dim(),
        report.l_opt
    );
    if let Some(hint) = report.hint {
        println!("{} {}", style("try").cyan(), hint);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_commands_parse() {
        assert!(matches!(Input::parse(" 3 "), Input::Choose(3)));
        assert!(matches!(Input::parse("plan"), Input::Plan));
        assert!(matches!(Input::parse("h"), Input::Hint));
        assert!(matches!(Input::parse("q"), Input::Quit));
        assert!(matches!(Input::parse("dance"), Input::Unknown));
    }
}
