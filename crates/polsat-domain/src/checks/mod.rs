//! Built-in checks and the registry the rule checker resolves check names through.

use crate::error::CheckError;
use crate::model::Request;
use polsat_types::FactValue;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

mod actor;
mod attribute;
mod constant;
mod utils;


pub use actor::{ActorAttributeEquals, ActorPresent};
pub use attribute::{AttributeEquals, RelatesToActorVia};
pub use constant::{Always, Never};

/// What a check can say without looking at fetched data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrictOutcome {
    Known(bool),
    Irrelevant,
    Unknown,
}

/// One named authorization check.
pub trait Check: Send + Sync {
    fn name(&self) -> &'static str;

    fn strict_check(
        &self,
        actor: &Value,
        request: &Request,
        config: &Value,
    ) -> Result<StrictOutcome, CheckError>;

    /// Whether [`Check::check`] can resolve what the strict form leaves unknown.
    fn has_deep_check(&self) -> bool {
        false
    }

    /// Resolve the fact against the request's fetched `data`.
    fn check(
        &self,
        _actor: &Value,
        request: &Request,
        _config: &Value,
        _data: &Value,
    ) -> Result<FactValue, CheckError> {
        Err(CheckError::failed(
            &request.name,
            self.name(),
            "check has no deep form",
        ))
    }
}

#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: BTreeMap<&'static str, Arc<dyn Check>>,
}

impl CheckRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(Always));
        registry.register(Arc::new(Never));
        registry.register(Arc::new(ActorPresent));
        registry.register(Arc::new(ActorAttributeEquals));
        registry.register(Arc::new(AttributeEquals));
        registry.register(Arc::new(RelatesToActorVia));
        registry
    }

    /// Add or replace a check under its own name.
    pub fn register(&mut self, check: Arc<dyn Check>) {
        self.checks.insert(check.name(), check);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Check> {
        self.checks.get(name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.keys().copied()
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
