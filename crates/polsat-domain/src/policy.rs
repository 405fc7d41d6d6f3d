use crate::solver::DEFAULT_MAX_VARIABLES;

/// Upper bound on solve/check rounds in one authorization run.
pub const DEFAULT_MAX_ITERATIONS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizeOptions {
    /// When false, facts that cannot be resolved strictly may be bound `Unknowable`
    /// instead of being forced through deep checks.
    pub strict_access: bool,
    /// Skip all checking; only materialize must-fetch data.
    pub fetch_only: bool,
    /// Render the report at every terminal point. Never affects the decision.
    pub log_final_report: bool,
    pub max_iterations: usize,
}

impl Default for AuthorizeOptions {
    fn default() -> Self {
        Self {
            strict_access: true,
            fetch_only: false,
            log_final_report: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl AuthorizeOptions {
    pub fn lenient() -> Self {
        Self {
            strict_access: false,
            ..Self::default()
        }
    }

    pub fn fetch_only() -> Self {
        Self {
            fetch_only: true,
            ..Self::default()
        }
    }
}

/// Bounds for the reference solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverLimits {
    pub max_variables: usize,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            max_variables: DEFAULT_MAX_VARIABLES,
        }
    }
}
