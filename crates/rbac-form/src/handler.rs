//! Per-type field behaviour.
//!
//! Each [`FieldType`] has one [`FieldHandler`] registered in a
//! [`HandlerRegistry`]. The form engine never matches on the field type
//! itself; it asks the registry.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde_json::{Number, Value};

use crate::field::FieldType;

pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const URL_MESSAGE: &str = "Please enter a valid URL";
pub const NUMBER_MESSAGE: &str = "Please enter a valid number";
pub const DATE_MESSAGE: &str = "Please enter a valid date";
pub const TIME_MESSAGE: &str = "Please enter a valid time";

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$").ok()
});

static URL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").ok());

/// Behaviour of one field type.
pub trait FieldHandler: Send + Sync {
    /// Value of a control with no seed and no default.
    fn empty_value(&self) -> Value {
        Value::Null
    }

    /// Whether `value` fails a `required` check.
    fn is_empty(&self, value: &Value) -> bool {
        rbac_model::is_empty_value(value)
    }

    /// Canonical form of a value written into the control.
    fn normalize(&self, value: Value) -> Value {
        value
    }

    /// Built-in check for non-empty values; returns the failure message.
    fn validate(&self, _value: &Value) -> Option<&'static str> {
        None
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Free text: text, password, tel, textarea.
#[derive(Debug, Default)]
pub struct TextHandler;

impl FieldHandler for TextHandler {
    fn empty_value(&self) -> Value {
        Value::String(String::new())
    }
}

#[derive(Debug, Default)]
pub struct EmailHandler;

impl FieldHandler for EmailHandler {
    fn empty_value(&self) -> Value {
        Value::String(String::new())
    }

    fn normalize(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        }
    }

    fn validate(&self, value: &Value) -> Option<&'static str> {
        let ok = value
            .as_str()
            .is_some_and(|s| regex_matches(&EMAIL_RE, s));
        (!ok).then_some(EMAIL_MESSAGE)
    }
}

#[derive(Debug, Default)]
pub struct UrlHandler;

impl FieldHandler for UrlHandler {
    fn empty_value(&self) -> Value {
        Value::String(String::new())
    }

    fn validate(&self, value: &Value) -> Option<&'static str> {
        let ok = value.as_str().is_some_and(|s| regex_matches(&URL_RE, s));
        (!ok).then_some(URL_MESSAGE)
    }
}

/// Numbers. Numeric strings are stored as JSON numbers.
#[derive(Debug, Default)]
pub struct NumberHandler;

impl FieldHandler for NumberHandler {
    fn normalize(&self, value: Value) -> Value {
        let Value::String(text) = &value else {
            return value;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Value::Number(n.into());
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(value)
    }

    fn validate(&self, value: &Value) -> Option<&'static str> {
        (!value.is_number()).then_some(NUMBER_MESSAGE)
    }
}

/// Static and paginated selects.
#[derive(Debug, Default)]
pub struct SelectHandler;

impl FieldHandler for SelectHandler {}

#[derive(Debug, Default)]
pub struct CheckboxHandler;

impl FieldHandler for CheckboxHandler {
    fn empty_value(&self) -> Value {
        Value::Bool(false)
    }

    fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Null => Value::Bool(false),
            other => other,
        }
    }
}

/// ISO dates (`YYYY-MM-DD`).
#[derive(Debug, Default)]
pub struct DateHandler;

impl FieldHandler for DateHandler {
    fn validate(&self, value: &Value) -> Option<&'static str> {
        let ok = value
            .as_str()
            .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok());
        (!ok).then_some(DATE_MESSAGE)
    }
}

/// Times (`HH:MM` or `HH:MM:SS`).
#[derive(Debug, Default)]
pub struct TimeHandler;

impl FieldHandler for TimeHandler {
    fn validate(&self, value: &Value) -> Option<&'static str> {
        let ok = value.as_str().is_some_and(|s| {
            NaiveTime::parse_from_str(s, "%H:%M").is_ok()
                || NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
        });
        (!ok).then_some(TIME_MESSAGE)
    }
}

/// Permission lists. `null` becomes an empty list.
#[derive(Debug, Default)]
pub struct PermissionsHandler;

impl FieldHandler for PermissionsHandler {
    fn empty_value(&self) -> Value {
        Value::Array(Vec::new())
    }

    fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Null => Value::Array(Vec::new()),
            other => other,
        }
    }
}

fn regex_matches(regex: &LazyLock<Option<Regex>>, text: &str) -> bool {
    regex.as_ref().is_some_and(|re| re.is_match(text))
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Lookup table from [`FieldType`] to its handler.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<FieldType, Arc<dyn FieldHandler>>,
    fallback: Arc<dyn FieldHandler>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let text: Arc<dyn FieldHandler> = Arc::new(TextHandler);
        let select: Arc<dyn FieldHandler> = Arc::new(SelectHandler);

        let mut registry = Self {
            handlers: HashMap::new(),
            fallback: Arc::clone(&text),
        };
        registry.register_shared(FieldType::Text, Arc::clone(&text));
        registry.register_shared(FieldType::Password, Arc::clone(&text));
        registry.register_shared(FieldType::Tel, Arc::clone(&text));
        registry.register_shared(FieldType::Textarea, text);
        registry.register(FieldType::Email, EmailHandler);
        registry.register(FieldType::Url, UrlHandler);
        registry.register(FieldType::Number, NumberHandler);
        registry.register_shared(FieldType::Select, Arc::clone(&select));
        registry.register_shared(FieldType::PaginatedSelect, select);
        registry.register(FieldType::Checkbox, CheckboxHandler);
        registry.register(FieldType::Date, DateHandler);
        registry.register(FieldType::Time, TimeHandler);
        registry.register(FieldType::Permissions, PermissionsHandler);
        registry
    }
}

impl HandlerRegistry {
    /// Install or replace the handler for `field_type`.
    pub fn register(&mut self, field_type: FieldType, handler: impl FieldHandler + 'static) {
        self.handlers.insert(field_type, Arc::new(handler));
    }

    fn register_shared(&mut self, field_type: FieldType, handler: Arc<dyn FieldHandler>) {
        self.handlers.insert(field_type, handler);
    }

    /// Handler for `field_type`; free text when nothing is registered.
    pub fn get(&self, field_type: FieldType) -> &dyn FieldHandler {
        self.handlers
            .get(&field_type)
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    pub fn is_registered(&self, field_type: FieldType) -> bool {
        self.handlers.contains_key(&field_type)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().map(FieldType::as_str).collect();
        types.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("types", &types)
            .finish()
    }
}
