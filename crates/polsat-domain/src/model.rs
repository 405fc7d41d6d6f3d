use polsat_types::{CheckId, FactValue, Requirement, ids};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One candidate assignment that authorizes the combined requests. Never holds sentinel keys.
pub type Scenario = BTreeMap<CheckId, Requirement>;

/// Primary-key tuple of a concrete resource row already present in the state.
pub type RowIdentity = Vec<Value>;

/// State key always holding the user.
pub const USER_KEY: &str = "user";

/// State key holding primary-key tuples of rows the solver may scope scenarios to.
pub const ROWS_KEY: &str = "rows";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    AuthorizeIf,
    ForbidIf,
    AuthorizeUnless,
    ForbidUnless,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::AuthorizeIf => ids::RULE_AUTHORIZE_IF,
            RuleKind::ForbidIf => ids::RULE_FORBID_IF,
            RuleKind::AuthorizeUnless => ids::RULE_AUTHORIZE_UNLESS,
            RuleKind::ForbidUnless => ids::RULE_FORBID_UNLESS,
        }
    }
}

/// One authorization step: a check plus the configuration it runs with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub kind: RuleKind,
    pub check: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

impl Rule {
    pub fn new(kind: RuleKind, check: &str) -> Self {
        Self {
            kind,
            check: check.to_string(),
            config: Value::Null,
        }
    }

    pub fn authorize_if(check: &str) -> Self {
        Self::new(RuleKind::AuthorizeIf, check)
    }

    pub fn forbid_if(check: &str) -> Self {
        Self::new(RuleKind::ForbidIf, check)
    }

    pub fn authorize_unless(check: &str) -> Self {
        Self::new(RuleKind::AuthorizeUnless, check)
    }

    pub fn forbid_unless(check: &str) -> Self {
        Self::new(RuleKind::ForbidUnless, check)
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Identity of the fact this rule reads when applied to `request`.
    pub fn check_id(&self, request: &str) -> CheckId {
        CheckId::for_rule(request, &self.check, &self.config)
    }

    pub fn describe(&self) -> String {
        if self.config.is_null() {
            format!("{} {}", self.kind.as_str(), self.check)
        } else {
            format!("{} {} {}", self.kind.as_str(), self.check, self.config)
        }
    }
}

/// One protected operation awaiting a decision.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub name: String,
    /// Where this request's data lives in the state once fetched.
    pub state_key: String,
    pub rules: Vec<Rule>,
    /// The data must be materialized even once the decision is known.
    pub must_fetch: bool,
    /// Only strict checks may resolve this request's facts.
    pub strict_check_only: bool,
    /// State keys that must be present before this request can be fetched.
    pub dependencies: Vec<String>,
}

impl Request {
    pub fn new(name: &str, rules: Vec<Rule>) -> Self {
        Self {
            name: name.to_string(),
            state_key: name.to_string(),
            rules,
            must_fetch: false,
            strict_check_only: false,
            dependencies: Vec::new(),
        }
    }

    pub fn with_state_key(mut self, key: &str) -> Self {
        self.state_key = key.to_string();
        self
    }

    pub fn must_fetch(mut self) -> Self {
        self.must_fetch = true;
        self
    }

    pub fn strict_check_only(mut self) -> Self {
        self.strict_check_only = true;
        self
    }

    pub fn depends_on(mut self, key: &str) -> Self {
        self.dependencies.push(key.to_string());
        self
    }

    /// Fact identities read by this request's rules, in rule order.
    pub fn check_ids(&self) -> impl Iterator<Item = CheckId> + '_ {
        self.rules.iter().map(|rule| rule.check_id(&self.name))
    }

    pub fn data<'s>(&self, state: &'s State) -> Option<&'s Value> {
        state.get(&self.state_key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("fact `{check}` is already bound to {existing:?}, refusing {attempted:?}")]
pub struct FactConflict {
    pub check: CheckId,
    pub existing: FactValue,
    pub attempted: FactValue,
}

/// Append-only mapping from check identity to its resolved value.
///
/// Always holds the sentinels `true -> True` and `false -> False`. The only permitted
/// change to a bound key is `Unknowable` resolving to something concrete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactStore {
    facts: BTreeMap<CheckId, FactValue>,
}

impl Default for FactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FactStore {
    pub fn new() -> Self {
        let mut facts = BTreeMap::new();
        facts.insert(CheckId::truthy(), FactValue::True);
        facts.insert(CheckId::falsy(), FactValue::False);
        Self { facts }
    }

    pub fn get(&self, check: &CheckId) -> Option<FactValue> {
        self.facts.get(check).copied()
    }

    pub fn contains(&self, check: &CheckId) -> bool {
        self.facts.contains_key(check)
    }

    /// Bind `check` to `value`. Returns whether the store changed.
    pub fn bind(&mut self, check: CheckId, value: FactValue) -> Result<bool, FactConflict> {
        match self.facts.get(&check).copied() {
            None => {
                self.facts.insert(check, value);
                Ok(true)
            }
            Some(existing) if existing == value => Ok(false),
            Some(FactValue::Unknowable) => {
                self.facts.insert(check, value);
                Ok(true)
            }
            Some(existing) => Err(FactConflict {
                check,
                existing,
                attempted: value,
            }),
        }
    }

    /// First key of `self` that `next` dropped or rebound, if any.
    pub fn first_violation_in(&self, next: &FactStore) -> Option<CheckId> {
        self.facts.iter().find_map(|(check, value)| match next.get(check) {
            Some(n) if n == *value || *value == FactValue::Unknowable => None,
            _ => Some(check.clone()),
        })
    }

    /// Number of bound facts, sentinels excluded.
    pub fn len(&self) -> usize {
        self.facts.keys().filter(|k| !k.is_sentinel()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CheckId, FactValue)> {
        self.facts.iter().map(|(k, v)| (k, *v))
    }

    pub fn to_map(&self) -> BTreeMap<CheckId, FactValue> {
        self.facts.clone()
    }
}

/// Free-form context threaded through one authorization run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    entries: BTreeMap<String, Value>,
}

impl State {
    pub fn for_user(user: Value) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(USER_KEY.to_string(), user);
        Self { entries }
    }

    pub fn user(&self) -> &Value {
        self.entries.get(USER_KEY).unwrap_or(&Value::Null)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Copy of this state with `key` bound to `value`.
    pub fn with(&self, key: &str, value: Value) -> State {
        let mut next = self.clone();
        next.entries.insert(key.to_string(), value);
        next
    }

    /// Primary-key tuples under `rows`, when the state already carries concrete rows.
    pub fn row_identities(&self) -> Option<Vec<RowIdentity>> {
        let rows = self.entries.get(ROWS_KEY)?.as_array()?;
        let ids: Vec<RowIdentity> = rows
            .iter()
            .map(|row| match row {
                Value::Array(parts) => parts.clone(),
                other => vec![other.clone()],
            })
            .collect();
        if ids.is_empty() { None } else { Some(ids) }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
