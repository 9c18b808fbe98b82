//! Pretty-print a JSON plan listing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::listing::PlanListing;

/// Print the plans stored in a JSON listing
#[derive(Parser, Debug)]
pub struct PrintPlans {
    /// Listing written by `xtask plan --json`
    #[arg(value_name = "JSON")]
    file: PathBuf,
}

impl PrintPlans {
    pub fn execute(self) -> Result<()> {
        let text = std::fs::read_to_string(&self.file)
            .with_context(|| format!("File '{}' not found", self.file.display()))?;
        let listing: PlanListing = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in '{}'", self.file.display()))?;
        print!("{}", listing.render());
        Ok(())
    }
}
