//! Write the planning domain and problem for a character's start state.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use dialogue_core::SessionState;
use planner::Synthesizer;

use super::world::{GoalArgs, WorldArgs};

/// Synthesize planning text for a character
#[derive(Parser, Debug)]
pub struct Synthesize {
    #[command(flatten)]
    world: WorldArgs,

    /// Character to synthesize for
    #[arg(short, long)]
    character: String,

    #[command(flatten)]
    goal: GoalArgs,

    /// Write domain.pddl and problem.pddl here instead of printing them
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,
}

impl Synthesize {
    pub fn execute(self) -> Result<()> {
        let graph = self.world.load_graph()?;
        let config = self.world.planner_config()?;
        let character = graph.character_id(&self.character)?;
        let state = SessionState::new(&graph, character)?;
        let goal = self.goal.resolve(&graph)?;

        let text = Synthesizer::new(&graph, &config)
            .synthesize_default(&state, &goal)?
            .render();

        match self.out {
            Some(dir) => {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
                for (name, body) in [("domain.pddl", &text.domain), ("problem.pddl", &text.problem)] {
                    let path = dir.join(name);
                    std::fs::write(&path, body)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("{} {}", style("wrote").green(), path.display());
                }
            }
            None => {
                println!("{}", text.domain);
                println!("{}", text.problem);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_domain_and_problem_files() {
        let dir = tempfile::tempdir().unwrap();
        let atlas = concat!(env!("CARGO_MANIFEST_DIR"), "/../dialogue/content/data/tavern");
        let cmd = Synthesize {
            world: WorldArgs {
                atlas: PathBuf::from(atlas),
                config: None,
            },
            character: "barkeep".into(),
            goal: GoalArgs::default(),
            out: Some(dir.path().to_path_buf()),
        };
        cmd.execute().unwrap();

        let domain = std::fs::read_to_string(dir.path().join("domain.pddl")).unwrap();
        let problem = std::fs::read_to_string(dir.path().join("problem.pddl")).unwrap();
        assert!(domain.starts_with("(define (domain"));
        assert!(problem.contains("ctx_tavern_intro"));
    }
}
