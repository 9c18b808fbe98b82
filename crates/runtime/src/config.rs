//! Runtime configuration with environment overrides.

use std::path::PathBuf;
use std::str::FromStr;

use dialogue_core::PlannerConfig;
use thiserror::Error;

/// Which planner answers `solve` calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SolverBackend {
    #[default]
    Builtin,
    /// A classical planner run as a child process.
    External {
        program: PathBuf,
        args: Vec<String>,
        plan_file: Option<String>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}='{value}' is not a valid value")]
    Invalid { var: &'static str, value: String },
}

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub planner: PlannerConfig,
    pub solver: SolverBackend,
    /// Plans kept by the resolver cache; `0` disables caching.
    pub plan_cache_capacity: usize,
    /// Workers for batch simulation; `0` uses one per core.
    pub simulation_threads: usize,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            solver: SolverBackend::Builtin,
            plan_cache_capacity: 256,
            simulation_threads: 0,
            command_buffer_size: 32,
            event_buffer_size: 100,
        }
    }
}

impl RuntimeConfig {
    pub const AGENT_NAME: &'static str = "NPC_AGENT_NAME";
    pub const DEVIATION_THRESHOLD: &'static str = "NPC_DEVIATION_THRESHOLD";
    pub const SOLVER_TIMEOUT_MS: &'static str = "NPC_SOLVER_TIMEOUT_MS";
    pub const SOLVER_MAX_STATES: &'static str = "NPC_SOLVER_MAX_STATES";
    pub const SOLVER_PROGRAM: &'static str = "NPC_SOLVER_PROGRAM";
    pub const SOLVER_ARGS: &'static str = "NPC_SOLVER_ARGS";
    pub const PLAN_CACHE_CAPACITY: &'static str = "NPC_PLAN_CACHE_CAPACITY";
    pub const SIMULATION_THREADS: &'static str = "NPC_SIMULATION_THREADS";
    pub const COMMAND_BUFFER: &'static str = "NPC_COMMAND_BUFFER";
    pub const EVENT_BUFFER: &'static str = "NPC_EVENT_BUFFER";

    /// Defaults overridden by `NPC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::default().with_overrides(lookup)
    }

    /// Applies overrides on top of `self`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(agent) = var(Self::AGENT_NAME) {
            self.planner.agent = agent.trim().to_owned();
        }
        parse_into(&var, Self::DEVIATION_THRESHOLD, &mut self.planner.deviation_threshold)?;
        parse_into(&var, Self::SOLVER_TIMEOUT_MS, &mut self.planner.solver_timeout_ms)?;
        parse_into(&var, Self::SOLVER_MAX_STATES, &mut self.planner.max_search_states)?;
        parse_into(&var, Self::PLAN_CACHE_CAPACITY, &mut self.plan_cache_capacity)?;
        parse_into(&var, Self::SIMULATION_THREADS, &mut self.simulation_threads)?;
        parse_into(&var, Self::COMMAND_BUFFER, &mut self.command_buffer_size)?;
        parse_into(&var, Self::EVENT_BUFFER, &mut self.event_buffer_size)?;

        if let Some(program) = var(Self::SOLVER_PROGRAM) {
            self.solver = SolverBackend::External {
                program: PathBuf::from(program.trim()),
                args: var(Self::SOLVER_ARGS)
                    .map(|args| args.split_whitespace().map(str::to_owned).collect())
                    .unwrap_or_default(),
                plan_file: Some("sas_plan".to_owned()),
            };
        }
        Ok(self)
    }
}

fn parse_into<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    slot: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = var(name) {
        *slot = value.trim().parse().map_err(|_| ConfigError::Invalid {
            var: name,
            value: value.clone(),
        })?;
    }
    Ok(())
}
