//! Load an atlas, lint it and prove every character synthesizes.

use anyhow::Result;
use clap::Parser;
use console::style;
use dialogue_content::validate_world;

use super::world::WorldArgs;

/// Validate a world atlas
#[derive(Parser, Debug)]
pub struct Validate {
    #[command(flatten)]
    world: WorldArgs,

    /// Fail when any dead content is found
    #[arg(long)]
    deny_warnings: bool,
}

impl Validate {
    pub fn execute(self) -> Result<()> {
        let graph = self.world.load_graph()?;
        let config = self.world.planner_config()?;
        let report = validate_world(&graph, &config)?;

        for character in &report.characters {
            let mark = if character.warnings.is_empty() {
                style("✓").green()
            } else {
                style("!").yellow()
            };
            println!(
                "{} {} ({} ground actions)",
                mark,
                style(&character.character).bold(),
                character.ground_actions
            );
            for warning in &character.warnings {
                println!("    {} {}", style("→").yellow(), warning);
            }
        }

        let warnings = report.warnings().count();
        println!();
        if warnings == 0 {
            println!("{}", style("World is clean").green().bold());
        } else {
            println!("{}", style(format!("{warnings} warning(s)")).yellow().bold());
            if self.deny_warnings {
                anyhow::bail!("validation found {warnings} warning(s)");
            }
        }
        Ok(())
    }
}
