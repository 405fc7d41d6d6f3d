use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Resolved outcome of one check.
///
/// `Irrelevant` never blocks a scenario. `Unknowable` can never be determined, so any
/// scenario that needs a concrete value for it is contradicted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FactValue {
    True,
    False,
    Irrelevant,
    Unknowable,
}

impl FactValue {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            FactValue::True => Some(true),
            FactValue::False => Some(false),
            FactValue::Irrelevant | FactValue::Unknowable => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FactValue::True => "true",
            FactValue::False => "false",
            FactValue::Irrelevant => "irrelevant",
            FactValue::Unknowable => "unknowable",
        }
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        if value {
            FactValue::True
        } else {
            FactValue::False
        }
    }
}

/// What a scenario needs from one fact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    True,
    False,
    Irrelevant,
}

impl Requirement {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Requirement::True => Some(true),
            Requirement::False => Some(false),
            Requirement::Irrelevant => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Requirement::True => "true",
            Requirement::False => "false",
            Requirement::Irrelevant => "irrelevant",
        }
    }
}

impl From<bool> for Requirement {
    fn from(value: bool) -> Self {
        if value {
            Requirement::True
        } else {
            Requirement::False
        }
    }
}
