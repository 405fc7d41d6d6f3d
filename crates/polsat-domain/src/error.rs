use crate::fetch::FetchError;
use crate::model::{FactConflict, Scenario};
use crate::report::Report;
use crate::solver::SolveError;
use polsat_types::{CheckId, ids};
use thiserror::Error;

/// Why one `authorize` call did not produce a state.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AuthorizeError {
    #[error("request `{request}` has no authorization steps configured")]
    NoStepsConfigured { request: String },

    #[error("forbidden")]
    Forbidden(Box<Report>),

    #[error("must-fetch requests can never have their dependencies met: {unmet:?}")]
    DependencyDeadlock { unmet: Vec<String> },

    #[error("fetching made no progress for: {pending:?}")]
    StalledFetch { pending: Vec<String> },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("solver returned a scenario the known facts contradict: {scenario:?}")]
    Inconsistent { scenario: Scenario },
}

impl AuthorizeError {
    /// Stable code for this error, usable with `polsat explain`.
    pub fn code(&self) -> &'static str {
        match self {
            AuthorizeError::NoStepsConfigured { .. } => ids::CODE_NO_STEPS_CONFIGURED,
            AuthorizeError::Forbidden(_) => ids::CODE_FORBIDDEN,
            AuthorizeError::DependencyDeadlock { .. } => ids::CODE_DEPENDENCY_DEADLOCK,
            AuthorizeError::StalledFetch { .. } => ids::CODE_STALLED_FETCH,
            AuthorizeError::Collaborator(_) => ids::CODE_COLLABORATOR_ERROR,
            AuthorizeError::Inconsistent { .. } => ids::CODE_INCONSISTENT_SOLVER_STATE,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            AuthorizeError::Forbidden(report) => Some(report),
            _ => None,
        }
    }
}

impl From<FetchError> for AuthorizeError {
    fn from(err: FetchError) -> Self {
        AuthorizeError::Collaborator(CollaboratorError::Fetch(err))
    }
}

/// Failure reported by one of the pluggable collaborators, passed through untouched.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CollaboratorError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error("solver failed: {0}")]
    Solver(#[from] SolveError),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum CheckError {
    #[error("request `{request}` uses unknown check `{check}`")]
    UnknownCheck { request: String, check: String },

    #[error("check `{check}` on `{request}` failed: {message}")]
    Failed {
        request: String,
        check: String,
        message: String,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Conflict(#[from] FactConflict),

    #[error("checker rebound or dropped fact `{check}`")]
    NonMonotone { check: CheckId },
}

impl CheckError {
    pub fn failed(request: &str, check: &str, message: impl Into<String>) -> Self {
        CheckError::Failed {
            request: request.to_string(),
            check: check.to_string(),
            message: message.into(),
        }
    }
}
