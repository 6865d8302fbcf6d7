//! JSON-schema validation of request params.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::{DispatchError, DispatchResult};

/// A structural schema for a handler's params.
///
/// The schema is compiled on first use and the outcome cached, so a
/// malformed schema surfaces on every request that reaches it rather than
/// at registration.
pub struct ValidationSchema {
    raw: Value,
    compiled: OnceLock<Result<Validator, String>>,
}

impl ValidationSchema {
    pub fn new(raw: Value) -> Self {
        Self {
            raw,
            compiled: OnceLock::new(),
        }
    }

    /// The schema document as registered.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    fn validator(&self) -> Result<&Validator, &str> {
        self.compiled
            .get_or_init(|| jsonschema::validator_for(&self.raw).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(String::as_str)
    }

    /// Validate `instance` against the schema.
    ///
    /// Returns [`DispatchError::Validation`] describing the most relevant
    /// violation and [`DispatchError::InvalidSchema`] when the schema cannot be
    /// compiled. The most relevant violation is the one closest to the root of
    /// `instance`; ties go to the first reported.
    pub fn validate(&self, instance: &Value) -> DispatchResult<()> {
        let validator = self
            .validator()
            .map_err(|e| DispatchError::InvalidSchema(e.to_string()))?;

        let best = validator
            .iter_errors(instance)
            .min_by_key(|violation| instance_depth(violation.instance_path.as_str()));

        match best {
            Some(violation) => Err(DispatchError::Validation(violation.to_string())),
            None => Ok(()),
        }
    }
}

/// Number of segments in a JSON pointer. Segments are escaped, so every `/`
/// starts one.
fn instance_depth(pointer: &str) -> usize {
    pointer.matches('/').count()
}

impl std::fmt::Debug for ValidationSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationSchema")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

impl From<Value> for ValidationSchema {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}
