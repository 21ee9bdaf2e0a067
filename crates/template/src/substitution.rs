//! Placeholder substitution

use serde::Serialize;

/// A placeholder token and the value it stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    /// Literal token, such as `__BUNDLE_IDENTIFIER__`
    pub token: String,

    /// Replacement; `None` when the value could not be resolved
    pub value: Option<String>,
}

impl Substitution {
    /// Create a substitution
    pub fn new(token: impl Into<String>, value: Option<String>) -> Self {
        Self {
            token: token.into(),
            value,
        }
    }

    /// Create a substitution with a known value
    pub fn resolved(token: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(token, Some(value.into()))
    }

    /// Whether the value was resolved
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }
}

/// Replace every occurrence of each token, pair by pair in list order
///
/// Tokens are literal text. An unresolved value replaces its token with the
/// empty string.
pub fn substitute(text: &str, substitutions: &[Substitution]) -> String {
    let mut out = text.to_string();
    for substitution in substitutions {
        if substitution.token.is_empty() {
            continue;
        }
        out = out.replace(
            &substitution.token,
            substitution.value.as_deref().unwrap_or(""),
        );
    }
    out
}

/// Tokens whose value could not be resolved
pub fn missing_values(substitutions: &[Substitution]) -> Vec<&str> {
    substitutions
        .iter()
        .filter(|s| !s.is_resolved())
        .map(|s| s.token.as_str())
        .collect()
}

/// Value of a token, when present and resolved
pub fn lookup<'a>(substitutions: &'a [Substitution], token: &str) -> Option<&'a str> {
    substitutions
        .iter()
        .find(|s| s.token == token)
        .and_then(|s| s.value.as_deref())
}
