/// Planning configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Object name of the acting agent in synthesized problems.
    pub agent: String,
    /// Context-shift moves a session may exceed the optimal plan by before it
    /// is reported as deviating.
    pub deviation_threshold: u32,
    /// Wall-clock budget for a single solver invocation.
    pub solver_timeout_ms: u64,
    /// Upper bound on states expanded by the built-in search.
    pub max_search_states: usize,
}

impl PlannerConfig {
    // ===== identifiers =====
    pub const DEFAULT_AGENT: &'static str = "player";
    pub const DEFAULT_MOOD: &'static str = "neutral";

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_DEVIATION_THRESHOLD: u32 = 2;
    pub const DEFAULT_SOLVER_TIMEOUT_MS: u64 = 5_000;
    pub const DEFAULT_MAX_SEARCH_STATES: usize = 200_000;

    pub fn new() -> Self {
        Self {
            agent: Self::DEFAULT_AGENT.to_owned(),
            deviation_threshold: Self::DEFAULT_DEVIATION_THRESHOLD,
            solver_timeout_ms: Self::DEFAULT_SOLVER_TIMEOUT_MS,
            max_search_states: Self::DEFAULT_MAX_SEARCH_STATES,
        }
    }

    pub fn with_deviation_threshold(mut self, threshold: u32) -> Self {
        self.deviation_threshold = threshold;
        self
    }

    pub fn solver_timeout(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.solver_timeout_ms)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::new()
    }
}
