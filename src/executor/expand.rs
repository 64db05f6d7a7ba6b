//! Macro expansion of step templates
//!
//! Templates reference build variables with the `${VAR_NAME}` syntax:
//!
//! ```rust
//! use dockstep::expand_variables;
//! use std::collections::HashMap;
//!
//! let env = HashMap::from([("BUILD_NUMBER".to_string(), "42".to_string())]);
//! assert_eq!(expand_variables("app:${BUILD_NUMBER}", &env), "app:42");
//! ```

use crate::pipeline::EnvironmentError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static VAR_PATTERN: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("variable pattern is valid")
});

/// How unresolved `${VAR}` references are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionPolicy {
    /// Leave unresolved references verbatim
    #[default]
    Lenient,
    /// Fail on the first unresolved reference
    Strict,
}

/// Expands `${VAR}` references in `input`
///
/// If a variable is not found, it remains unchanged in the output.
pub fn expand_variables(input: &str, env: &HashMap<String, String>) -> String {
    VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = caps.get(1).map_or("", |m| m.as_str());
            if let Some(value) = env.get(var_name) {
                value.clone()
            } else {
                caps.get(0)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()
            }
        })
        .to_string()
}

/// Returns the names of variables referenced by `input` but absent from `env`
pub fn unresolved_variables(input: &str, env: &HashMap<String, String>) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for cap in VAR_PATTERN.captures_iter(input) {
        if let Some(name) = cap.get(1).map(|m| m.as_str()) {
            if !env.contains_key(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
    }
    missing
}

/// Expands `template` under `policy`
///
/// # Errors
///
/// Under [`ExpansionPolicy::Strict`], returns
/// [`EnvironmentError::UnresolvedVariable`] naming the first reference
/// that `env` cannot satisfy.
pub fn expand(
    template: &str,
    env: &HashMap<String, String>,
    policy: ExpansionPolicy,
) -> Result<String, EnvironmentError> {
    if policy == ExpansionPolicy::Strict {
        if let Some(variable) = unresolved_variables(template, env).into_iter().next() {
            return Err(EnvironmentError::UnresolvedVariable {
                variable,
                template: template.to_string(),
            });
        }
    }
    Ok(expand_variables(template, env))
}
