//! Request data materialization and must-fetch resolution.

use crate::error::AuthorizeError;
use crate::model::{Request, State};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("fetching `{request}` failed: {message}")]
pub struct FetchError {
    pub request: String,
    pub message: String,
}

/// Loads the data a request operates on into the state.
pub trait Fetcher: Send + Sync {
    fn fetched(&self, state: &State, request: &Request) -> bool {
        state.contains(&request.state_key)
    }

    fn dependencies_met(&self, state: &State, request: &Request) -> bool {
        request.dependencies.iter().all(|key| state.contains(key))
    }

    /// Return a new state with `request`'s data bound under its state key.
    fn fetch(&self, state: &State, request: &Request) -> Result<State, FetchError>;
}

/// Materialize every must-fetch request, honoring dependencies between them.
///
/// Requests that are not must-fetch are never loaded here, but they still take part in
/// the dependency check: once no must-fetch request is ready, any unfetched request
/// with unmet dependencies surfaces as `DependencyDeadlock`.
pub fn fetch_must_fetch(
    requests: &[Request],
    state: State,
    fetcher: &dyn Fetcher,
) -> Result<State, AuthorizeError> {
    let mut state = state;
    let rounds = requests.len() + 1;

    for round in 0..rounds {
        let (met, unmet): (Vec<&Request>, Vec<&Request>) = requests
            .iter()
            .filter(|r| !fetcher.fetched(&state, r))
            .partition(|r| fetcher.dependencies_met(&state, r));
        let met: Vec<&Request> = met.into_iter().filter(|r| r.must_fetch).collect();

        if met.is_empty() {
            if unmet.is_empty() {
                return Ok(state);
            }
            let unmet: Vec<String> = unmet.iter().map(|r| r.name.clone()).collect();
            warn!(?unmet, "requests have unsatisfiable dependencies");
            return Err(AuthorizeError::DependencyDeadlock { unmet });
        }

        debug!(round, batch = met.len(), "fetching must-fetch requests");
        let mut next = state.clone();
        for request in &met {
            next = fetcher.fetch(&next, request)?;
        }

        if next == state {
            let pending = met.iter().map(|r| r.name.clone()).collect();
            warn!(?pending, "fetch batch left the state unchanged");
            return Err(AuthorizeError::StalledFetch { pending });
        }
        state = next;
    }

    let pending = requests
        .iter()
        .filter(|r| r.must_fetch && !fetcher.fetched(&state, r))
        .map(|r| r.name.clone())
        .collect();
    warn!(?pending, "must-fetch resolution did not settle");
    Err(AuthorizeError::StalledFetch { pending })
}

/// Serves request data from a fixed table keyed by state key.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    sources: BTreeMap<String, Value>,
    fetch_count: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(sources: BTreeMap<String, Value>) -> Self {
        Self {
            sources,
            fetch_count: AtomicUsize::new(0),
        }
    }

    pub fn with_source(mut self, key: &str, value: Value) -> Self {
        self.sources.insert(key.to_string(), value);
        self
    }

    /// Number of successful fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, state: &State, request: &Request) -> Result<State, FetchError> {
        let value = self
            .sources
            .get(&request.state_key)
            .ok_or_else(|| FetchError {
                request: request.name.clone(),
                message: format!("no data source for `{}`", request.state_key),
            })?;
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        debug!(request = %request.name, key = %request.state_key, "fetched");
        Ok(state.with(&request.state_key, value.clone()))
    }
}
