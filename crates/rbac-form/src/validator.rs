//! Field validators.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

type CheckFn = Arc<dyn Fn(&Value) -> Result<(), Option<String>> + Send + Sync>;

/// Message used when a failed check has no message of its own and the
/// field has no `error_message`.
pub const INVALID_VALUE_MESSAGE: &str = "Invalid value";

/// A check attached to a field, run after the required and type checks.
///
/// Length and pattern checks only look at string values and pass on an
/// empty value; emptiness is the `required` flag's business.
#[derive(Clone)]
pub enum Validator {
    /// At least this many characters.
    MinLength(usize),
    /// At most this many characters.
    MaxLength(usize),
    /// The whole value must match `regex`.
    Pattern {
        regex: Regex,
        message: Option<String>,
    },
    /// Arbitrary check. `Err(None)` falls back to the field's message.
    Custom { name: String, check: CheckFn },
}

impl Validator {
    /// Compile a pattern validator.
    pub fn pattern(pattern: &str, message: Option<&str>) -> Result<Self, regex::Error> {
        Ok(Self::Pattern {
            regex: Regex::new(pattern)?,
            message: message.map(str::to_string),
        })
    }

    pub fn custom(
        name: impl Into<String>,
        check: impl Fn(&Value) -> Result<(), Option<String>> + Send + Sync + 'static,
    ) -> Self {
        Self::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Run the check. `Err` carries the validator's own message, if any.
    pub fn check(&self, value: &Value) -> Result<(), Option<String>> {
        match self {
            Self::MinLength(min) => match non_empty_str(value) {
                Some(text) if text.chars().count() < *min => {
                    Err(Some(format!("Minimum length is {min} characters")))
                }
                _ => Ok(()),
            },
            Self::MaxLength(max) => match non_empty_str(value) {
                Some(text) if text.chars().count() > *max => {
                    Err(Some(format!("Maximum length is {max} characters")))
                }
                _ => Ok(()),
            },
            Self::Pattern { regex, message } => match non_empty_str(value) {
                Some(text) if !full_match(regex, text) => Err(message.clone()),
                _ => Ok(()),
            },
            Self::Custom { check, .. } => check(value),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength(min) => f.debug_tuple("MinLength").field(min).finish(),
            Self::MaxLength(max) => f.debug_tuple("MaxLength").field(max).finish(),
            Self::Pattern { regex, .. } => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Custom { name, .. } => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn full_match(regex: &Regex, text: &str) -> bool {
    regex
        .find(text)
        .is_some_and(|m| m.start() == 0 && m.end() == text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_length_messages() {
        assert_eq!(
            Validator::MinLength(3).check(&json!("ab")),
            Err(Some("Minimum length is 3 characters".to_string()))
        );
        assert_eq!(
            Validator::MaxLength(2).check(&json!("abc")),
            Err(Some("Maximum length is 2 characters".to_string()))
        );
        assert!(Validator::MinLength(3).check(&json!("")).is_ok());
    }

    #[test]
    fn test_pattern_requires_full_match() {
        let digits = Validator::pattern(r"\d+", None).unwrap();
        assert!(digits.check(&json!("123")).is_ok());
        assert_eq!(digits.check(&json!("12a")), Err(None));
        assert!(Validator::pattern("(", None).is_err());
    }

    #[test]
    fn test_custom_validator() {
        let even = Validator::custom("even", |v| match v.as_i64() {
            Some(n) if n % 2 == 0 => Ok(()),
            _ => Err(Some("Must be even".to_string())),
        });
        assert!(even.check(&json!(4)).is_ok());
        assert_eq!(even.check(&json!(3)), Err(Some("Must be even".to_string())));
    }
}
