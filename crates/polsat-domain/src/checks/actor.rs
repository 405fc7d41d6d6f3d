//! Checks answered from the actor alone.

use super::utils::{actor_present, config_str, config_value};
use super::{Check, StrictOutcome};
use crate::error::CheckError;
use crate::model::Request;
use serde_json::Value;

pub struct ActorPresent;

impl Check for ActorPresent {
    fn name(&self) -> &'static str {
        "actor_present"
    }

    fn strict_check(&self, actor: &Value, _: &Request, _: &Value) -> Result<StrictOutcome, CheckError> {
        Ok(StrictOutcome::Known(actor_present(actor)))
    }
}

/// `{ attribute, value }`: the actor's attribute equals `value`.
pub struct ActorAttributeEquals;

impl Check for ActorAttributeEquals {
    fn name(&self) -> &'static str {
        "actor_attribute_equals"
    }

    fn strict_check(
        &self,
        actor: &Value,
        request: &Request,
        config: &Value,
    ) -> Result<StrictOutcome, CheckError> {
        let attribute = config_str(config, "attribute", request, self.name())?;
        let expected = config_value(config, "value", request, self.name())?;
        Ok(StrictOutcome::Known(actor.get(attribute) == Some(expected)))
    }
}
