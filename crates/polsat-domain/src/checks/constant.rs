use super::{Check, StrictOutcome};
use crate::error::CheckError;
use crate::model::Request;
use serde_json::Value;

pub struct Always;

impl Check for Always {
    fn name(&self) -> &'static str {
        "always"
    }

    fn strict_check(&self, _: &Value, _: &Request, _: &Value) -> Result<StrictOutcome, CheckError> {
        Ok(StrictOutcome::Known(true))
    }
}

pub struct Never;

impl Check for Never {
    fn name(&self) -> &'static str {
        "never"
    }

    fn strict_check(&self, _: &Value, _: &Request, _: &Value) -> Result<StrictOutcome, CheckError> {
        Ok(StrictOutcome::Known(false))
    }
}
