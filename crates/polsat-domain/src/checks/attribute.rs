//! Checks that need the request's fetched rows.
//!
//! Both hold only when every row matches. A request whose data is an empty collection
//! has nothing to protect, so the fact is `Irrelevant`.

use super::utils::{actor_present, config_str, config_str_or, config_value, rows};
use super::{Check, StrictOutcome};
use crate::error::CheckError;
use crate::model::Request;
use polsat_types::FactValue;
use serde_json::Value;

fn all_rows(data: &Value, matches: impl Fn(&Value) -> bool) -> FactValue {
    let rows = rows(data);
    if rows.is_empty() {
        return FactValue::Irrelevant;
    }
    FactValue::from(rows.into_iter().all(matches))
}

/// `{ attribute, value }`: every fetched row has `attribute == value`.
pub struct AttributeEquals;

impl Check for AttributeEquals {
    fn name(&self) -> &'static str {
        "attribute_equals"
    }

    fn strict_check(&self, _: &Value, _: &Request, _: &Value) -> Result<StrictOutcome, CheckError> {
        Ok(StrictOutcome::Unknown)
    }

    fn has_deep_check(&self) -> bool {
        true
    }

    fn check(
        &self,
        _: &Value,
        request: &Request,
        config: &Value,
        data: &Value,
    ) -> Result<FactValue, CheckError> {
        let attribute = config_str(config, "attribute", request, self.name())?;
        let expected = config_value(config, "value", request, self.name())?;
        Ok(all_rows(data, |row| row.get(attribute) == Some(expected)))
    }
}

/// `{ attribute, actor_attribute = "id" }`: every fetched row points at the actor.
pub struct RelatesToActorVia;

impl Check for RelatesToActorVia {
    fn name(&self) -> &'static str {
        "relates_to_actor_via"
    }

    fn strict_check(
        &self,
        actor: &Value,
        _: &Request,
        _: &Value,
    ) -> Result<StrictOutcome, CheckError> {
        if actor_present(actor) {
            Ok(StrictOutcome::Unknown)
        } else {
            Ok(StrictOutcome::Known(false))
        }
    }

    fn has_deep_check(&self) -> bool {
        true
    }

    fn check(
        &self,
        actor: &Value,
        request: &Request,
        config: &Value,
        data: &Value,
    ) -> Result<FactValue, CheckError> {
        let attribute = config_str(config, "attribute", request, self.name())?;
        let actor_attribute = config_str_or(config, "actor_attribute", "id");
        let Some(actor_value) = actor.get(actor_attribute) else {
            return Ok(FactValue::False);
        };
        Ok(all_rows(data, |row| row.get(attribute) == Some(actor_value)))
    }
}
