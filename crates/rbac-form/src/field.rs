//! Field descriptors.

use std::fmt;
use std::sync::Arc;

use rbac_model::{ModuleRef, SelectOption};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::paginated_select::PaginatedSelectConfig;
use crate::validator::Validator;

type ConditionFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Number of layout columns a field may span.
pub const GRID_COLUMNS: u8 = 12;

// =============================================================================
// FIELD TYPE
// =============================================================================

/// Input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
    Textarea,
    Select,
    PaginatedSelect,
    Checkbox,
    Date,
    Time,
    Permissions,
}

impl FieldType {
    /// Every field type, in declaration order.
    pub const ALL: [FieldType; 13] = [
        FieldType::Text,
        FieldType::Email,
        FieldType::Password,
        FieldType::Number,
        FieldType::Tel,
        FieldType::Url,
        FieldType::Textarea,
        FieldType::Select,
        FieldType::PaginatedSelect,
        FieldType::Checkbox,
        FieldType::Date,
        FieldType::Time,
        FieldType::Permissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Number => "number",
            FieldType::Tel => "tel",
            FieldType::Url => "url",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::PaginatedSelect => "paginated-select",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Permissions => "permissions",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONDITIONAL
// =============================================================================

/// Visibility rule: show the field when `condition` holds for the current
/// value of `depends_on`.
#[derive(Clone)]
pub struct Conditional {
    pub depends_on: String,
    condition: ConditionFn,
}

impl Conditional {
    pub fn new(
        depends_on: impl Into<String>,
        condition: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            depends_on: depends_on.into(),
            condition: Arc::new(condition),
        }
    }

    /// Show the field whenever `depends_on` holds a non-empty value.
    pub fn when_present(depends_on: impl Into<String>) -> Self {
        Self::new(depends_on, |value| !rbac_model::is_empty_value(value))
    }

    pub fn holds_for(&self, value: &Value) -> bool {
        (self.condition)(value)
    }
}

impl fmt::Debug for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditional")
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PERMISSIONS CONFIG
// =============================================================================

/// Modules offered by a permissions field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsConfig {
    pub modules: Vec<ModuleRef>,
}

// =============================================================================
// FIELD DESCRIPTOR
// =============================================================================

/// Declarative description of one form input.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Key in the submitted value map. Must match the API field name.
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    pub placeholder: Option<String>,
    /// Help text shown while the field has no error.
    pub hint: Option<String>,
    pub required: bool,
    /// Static disabled flag. External loading never clears it.
    pub disabled: bool,
    pub default_value: Option<Value>,
    /// Extra validators, run in order after the built-in checks.
    pub validators: Vec<Validator>,
    /// Message for failed validators that carry none of their own.
    pub error_message: Option<String>,
    /// Options for static selects.
    pub options: Vec<SelectOption>,
    pub paginated_select: Option<PaginatedSelectConfig>,
    pub permissions: Option<PermissionsConfig>,
    /// Layout span, 1 to 12.
    pub grid_cols: u8,
    /// Display order; ties keep declaration order.
    pub order: i32,
    pub conditional: Option<Conditional>,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            placeholder: None,
            hint: None,
            required: false,
            disabled: false,
            default_value: None,
            validators: Vec::new(),
            error_message: None,
            options: Vec::new(),
            paginated_select: None,
            permissions: None,
            grid_cols: GRID_COLUMNS,
            order: 0,
            conditional: None,
        }
    }

    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Text)
    }

    /// A static select over `options`.
    pub fn select(
        key: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self::new(key, label, FieldType::Select).options(options)
    }

    /// A select whose options are fetched page by page.
    pub fn paginated_select(
        key: impl Into<String>,
        label: impl Into<String>,
        config: PaginatedSelectConfig,
    ) -> Self {
        let mut field = Self::new(key, label, FieldType::PaginatedSelect);
        field.paginated_select = Some(config);
        field
    }

    /// A read/write matrix over `modules`.
    pub fn permissions(
        key: impl Into<String>,
        label: impl Into<String>,
        modules: Vec<ModuleRef>,
    ) -> Self {
        let mut field = Self::new(key, label, FieldType::Permissions);
        field.permissions = Some(PermissionsConfig { modules });
        field
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    #[must_use]
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn grid_cols(mut self, cols: u8) -> Self {
        self.grid_cols = cols;
        self
    }

    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn conditional(mut self, conditional: Conditional) -> Self {
        self.conditional = Some(conditional);
        self
    }

    /// Label used in messages, falling back to the key.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}
