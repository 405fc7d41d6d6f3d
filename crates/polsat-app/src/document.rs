//! The request document: who is asking, for what, and where the data comes from.
//!
//! ```toml
//! user = { id = 1, role = "admin" }
//!
//! [[requests]]
//! name = "post.read"
//! must_fetch = true
//! rules = [
//!   { kind = "forbid_unless", check = "actor_present" },
//!   { kind = "authorize_if", check = "relates_to_actor_via", config = { attribute = "author_id" } },
//! ]
//!
//! [data]
//! "post.read" = { id = 9, author_id = 1 }
//! ```

use anyhow::Context;
use polsat_domain::model::{Request, Rule};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestDocument {
    /// The actor. Absent means nobody is signed in.
    #[serde(default)]
    pub user: JsonValue,

    #[serde(default)]
    pub requests: Vec<RequestSpec>,

    /// Static fetch sources keyed by state key.
    #[serde(default)]
    pub data: BTreeMap<String, JsonValue>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSpec {
    pub name: String,
    /// Defaults to `name`.
    #[serde(default)]
    pub state_key: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub must_fetch: bool,
    #[serde(default)]
    pub strict_check_only: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl RequestSpec {
    pub fn to_request(&self) -> Request {
        let mut request = Request::new(&self.name, self.rules.clone());
        if let Some(key) = &self.state_key {
            request = request.with_state_key(key);
        }
        request.must_fetch = self.must_fetch;
        request.strict_check_only = self.strict_check_only;
        request.dependencies = self.dependencies.clone();
        request
    }
}

impl RequestDocument {
    pub fn to_requests(&self) -> Vec<Request> {
        self.requests.iter().map(RequestSpec::to_request).collect()
    }
}

pub fn parse_request_document(input: &str) -> anyhow::Result<RequestDocument> {
    let doc: RequestDocument = toml::from_str(input).context("parse request document")?;

    let mut names = BTreeSet::new();
    for spec in &doc.requests {
        if !names.insert(spec.name.as_str()) {
            anyhow::bail!("duplicate request name: {}", spec.name);
        }
    }
    Ok(doc)
}
