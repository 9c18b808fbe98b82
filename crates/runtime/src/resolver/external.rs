//! External classical planner invoked as a child process.
//!
//! Domain and problem are staged in a private temporary directory. Arguments
//! may reference `{domain}`, `{problem}` and `{plan}`; when none of them
//! appears, the domain and problem paths are appended. The child is killed
//! when the call is cancelled or times out.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use planner::{Plan, TaskText};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::{PlanOutcome, SolveBudget, Solver};
use crate::api::ResolveError;

/// Fast Downward: 11 proves the task unsolvable, 12 means an incomplete
/// search gave up, which decides nothing.
const DEFAULT_UNSOLVABLE_CODES: [i32; 1] = [11];
const DEFAULT_UNSOLVABLE_MARKERS: [&str; 1] = ["Completely explored state space -- no solution!"];
const DEFAULT_INCOMPLETE_CODES: [i32; 1] = [12];
const DEFAULT_INCOMPLETE_MARKERS: [&str; 1] = ["Search stopped without finding a solution."];

#[derive(Debug, Clone)]
pub struct ExternalSolver {
    program: PathBuf,
    args: Vec<String>,
    plan_file: Option<String>,
    unsolvable_codes: Vec<i32>,
    unsolvable_markers: Vec<String>,
    incomplete_codes: Vec<i32>,
    incomplete_markers: Vec<String>,
}

impl ExternalSolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            plan_file: None,
            unsolvable_codes: DEFAULT_UNSOLVABLE_CODES.to_vec(),
            unsolvable_markers: DEFAULT_UNSOLVABLE_MARKERS.map(String::from).to_vec(),
            incomplete_codes: DEFAULT_INCOMPLETE_CODES.to_vec(),
            incomplete_markers: DEFAULT_INCOMPLETE_MARKERS.map(String::from).to_vec(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the plan from this file (relative to the staging directory)
    /// instead of standard output.
    pub fn plan_file(mut self, name: impl Into<String>) -> Self {
        self.plan_file = Some(name.into());
        self
    }

    pub fn unsolvable_codes(mut self, codes: impl Into<Vec<i32>>) -> Self {
        self.unsolvable_codes = codes.into();
        self
    }

    pub fn unsolvable_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsolvable_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Exit codes and output markers of a search that gave up without a
    /// verdict. These resolve to [`PlanOutcome::Timeout`].
    pub fn incomplete_codes(mut self, codes: impl Into<Vec<i32>>) -> Self {
        self.incomplete_codes = codes.into();
        self
    }

    pub fn incomplete_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incomplete_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    fn command_args(&self, domain: &Path, problem: &Path, plan: &Path) -> Vec<String> {
        let has_placeholder = self
            .args
            .iter()
            .any(|a| a.contains("{domain}") || a.contains("{problem}") || a.contains("{plan}"));
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace("{domain}", &domain.to_string_lossy())
                    .replace("{problem}", &problem.to_string_lossy())
                    .replace("{plan}", &plan.to_string_lossy())
            })
            .collect();
        if !has_placeholder {
            args.push(domain.to_string_lossy().into_owned());
            args.push(problem.to_string_lossy().into_owned());
        }
        args
    }

    async fn interpret(
        &self,
        output: &Output,
        plan_path: &Path,
    ) -> Result<PlanOutcome, ResolveError> {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let matches = |codes: &[i32], markers: &[String]| {
            output.status.code().is_some_and(|code| codes.contains(&code))
                || markers.iter().any(|marker| stdout.contains(marker.as_str()))
        };
        if matches(&self.unsolvable_codes, &self.unsolvable_markers) {
            return Ok(PlanOutcome::Unsolvable);
        }
        if matches(&self.incomplete_codes, &self.incomplete_markers) {
            tracing::warn!(program = %self.program.display(), "external search gave up without a verdict");
            return Ok(PlanOutcome::Timeout);
        }
        if !output.status.success() {
            return Err(ResolveError::SolverFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let text = match &self.plan_file {
            Some(_) => tokio::fs::read_to_string(plan_path).await?,
            None => plan_lines(&stdout),
        };
        Plan::parse(&text)
            .map(PlanOutcome::Found)
            .map_err(ResolveError::PlanText)
    }
}

/// Keeps the lines of solver chatter that look like plan steps.
fn plan_lines(stdout: &str) -> String {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with('(')
                || line
                    .split_once(':')
                    .is_some_and(|(time, rest)| {
                        time.trim().parse::<f64>().is_ok() && rest.trim_start().starts_with('(')
                    })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Solver for ExternalSolver {
    fn name(&self) -> &'static str {
        "external"
    }

    async fn solve(
        &self,
        task: &TaskText,
        _budget: &SolveBudget,
        cancel: &CancellationToken,
    ) -> Result<PlanOutcome, ResolveError> {
        let staging = tempfile::tempdir()?;
        let domain = staging.path().join("domain.pddl");
        let problem = staging.path().join("problem.pddl");
        let plan = staging
            .path()
            .join(self.plan_file.as_deref().unwrap_or("plan.txt"));
        tokio::fs::write(&domain, &task.domain).await?;
        tokio::fs::write(&problem, &task.problem).await?;

        let mut command = Command::new(&self.program);
        command
            .args(self.command_args(&domain, &problem, &plan))
            .current_dir(staging.path())
            .kill_on_drop(true);
        tracing::debug!(program = %self.program.display(), "spawning external solver");

        let output = tokio::select! {
            output = command.output() => output?,
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
        };
        self.interpret(&output, &plan).await
    }
}
