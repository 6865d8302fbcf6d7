//! Declared environment variables, loaded once at process start.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::EnvironmentError;

/// Declaration of one environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    /// Startup fails when a required variable is missing.
    #[serde(default)]
    pub required: bool,
}

impl VariableSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// Values of the declared variables that were present at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentVars {
    values: HashMap<String, String>,
}

impl EnvironmentVars {
    /// Load the declared variables from the process environment.
    pub fn load(declared: &[VariableSpec]) -> Result<Self, EnvironmentError> {
        Self::load_with(declared, |key| std::env::var(key).ok())
    }

    /// Load the declared variables through `lookup`.
    ///
    /// Missing optional variables are skipped silently.
    pub fn load_with<F>(declared: &[VariableSpec], lookup: F) -> Result<Self, EnvironmentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = HashMap::new();

        for spec in declared {
            match lookup(&spec.name) {
                Some(value) => {
                    values.insert(spec.name.clone(), value);
                }
                None if spec.required => {
                    tracing::error!(variable = %spec.name, "Required environment variable not set");
                    return Err(EnvironmentError::MissingRequired(spec.name.clone()));
                }
                None => {
                    tracing::debug!(variable = %spec.name, "Optional environment variable not set");
                }
            }
        }

        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for EnvironmentVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
