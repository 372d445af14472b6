//! The dynamic form engine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use rbac_api::ApiError;
use rbac_model::{OptionValue, PermissionKind, Record, SelectOption};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::control::FieldControl;
use crate::error::{FormBuildError, SubmitRejected};
use crate::field::{FieldDescriptor, FieldType, GRID_COLUMNS};
use crate::handler::HandlerRegistry;
use crate::paginated_select::{
    LoadRequest, LoadResponse, OptionLoader, PaginatedSelectState, SelectOutcome,
};
use crate::permissions::PermissionsMatrix;
use crate::validator::INVALID_VALUE_MESSAGE;

/// Submitted values, keyed by field key.
pub type FormValues = Map<String, Value>;

// =============================================================================
// TYPES
// =============================================================================

/// Whether the form creates a new resource or edits an existing one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    #[default]
    Create,
    Update,
}

/// Labels shown around the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub title: String,
    pub subtitle: Option<String>,
    pub submit_label: String,
    pub cancel_label: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: None,
            submit_label: "Save".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }
}

/// Events the form hands back to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// The submit handler succeeded with this response.
    SubmitSuccess(Value),
    /// The submit handler failed.
    SubmitError(ApiError),
    /// The form was closed and reset.
    Close,
    /// The "create new" entry of a paginated select was chosen.
    CreateRequested { field: String },
}

/// Proof that a submission was accepted. Hand it back to
/// [`DynamicFormEngine::finish_submit`] with the handler's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    epoch: u64,
    values: FormValues,
}

impl SubmitTicket {
    /// Values to send: every control, hidden ones included.
    pub fn values(&self) -> &FormValues {
        &self.values
    }
}

/// Sends form values to the backend.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, values: FormValues) -> Result<Value, ApiError>;
}

// =============================================================================
// ENGINE
// =============================================================================

/// Editable controls built from field descriptors.
///
/// # Invariants
///
/// - `fields` and `controls` are index-aligned and sorted by `order`.
/// - At most one submission is in flight.
/// - Results of a submission started before the last close or rebuild are
///   dropped.
#[derive(Debug, Clone)]
pub struct DynamicFormEngine {
    config: FormConfig,
    fields: Vec<FieldDescriptor>,
    controls: Vec<FieldControl>,
    registry: HandlerRegistry,
    mode: FormMode,

    submitting: bool,
    external_loading: bool,

    /// Bumped on close and rebuild to invalidate submit tickets.
    epoch: u64,

    /// Key of the open static select, if any.
    open_dropdown: Option<String>,
    selects: HashMap<String, PaginatedSelectState>,
    matrices: HashMap<String, PermissionsMatrix>,
}

impl DynamicFormEngine {
    /// Build a form with the default handlers.
    ///
    /// In update mode a non-null value in `initial_data` seeds its control;
    /// otherwise the field's default is used, else the type's empty value.
    pub fn build(
        fields: Vec<FieldDescriptor>,
        initial_data: Option<&Record>,
        mode: FormMode,
    ) -> Result<Self, FormBuildError> {
        Self::build_with_registry(fields, initial_data, mode, HandlerRegistry::default())
    }

    pub fn build_with_registry(
        mut fields: Vec<FieldDescriptor>,
        initial_data: Option<&Record>,
        mode: FormMode,
        registry: HandlerRegistry,
    ) -> Result<Self, FormBuildError> {
        check_fields(&fields)?;
        fields.sort_by_key(|field| field.order);

        let mut controls = Vec::with_capacity(fields.len());
        let mut selects = HashMap::new();
        let mut matrices = HashMap::new();

        for field in &fields {
            let handler = registry.get(field.field_type);
            let initial = match mode {
                FormMode::Update => initial_data
                    .and_then(|data| data.get(&field.key))
                    .filter(|value| !value.is_null())
                    .cloned(),
                FormMode::Create => None,
            };
            let mut seed = initial
                .or_else(|| field.default_value.clone())
                .map(|value| handler.normalize(value))
                .unwrap_or_else(|| handler.empty_value());

            if let Some(config) = &field.paginated_select {
                let mut state = PaginatedSelectState::new(&field.key, config.clone());
                state.seed(Some(seed.clone()));
                selects.insert(field.key.clone(), state);
            }
            if let Some(config) = &field.permissions {
                let mut matrix = PermissionsMatrix::new(config.modules.clone());
                matrix.write_json(&seed);
                matrix.set_disabled(field.disabled);
                seed = matrix.json_value();
                matrices.insert(field.key.clone(), matrix);
            }

            controls.push(FieldControl::new(seed, field.disabled));
        }

        debug!("Built {:?} form with {} fields", mode, fields.len());

        Ok(Self {
            config: FormConfig::default(),
            fields,
            controls,
            registry,
            mode,
            submitting: false,
            external_loading: false,
            epoch: 0,
            open_dropdown: None,
            selects,
            matrices,
        })
    }

    #[must_use]
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Rebuild in place. Pending submissions and option loads are dropped;
    /// configuration, handlers and external loading carry over.
    pub fn rebuild(
        &mut self,
        fields: Vec<FieldDescriptor>,
        initial_data: Option<&Record>,
        mode: FormMode,
    ) -> Result<(), FormBuildError> {
        let mut next =
            Self::build_with_registry(fields, initial_data, mode, self.registry.clone())?;
        for state in self.selects.values_mut() {
            state.teardown();
        }
        next.config = std::mem::take(&mut self.config);
        next.epoch = self.epoch + 1;
        next.set_disabled_externally(self.external_loading);
        *self = next;
        Ok(())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// All fields in display order, hidden ones included.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.index_of(key).map(|index| &self.fields[index])
    }

    pub fn control(&self, key: &str) -> Option<&FieldControl> {
        self.index_of(key).map(|index| &self.controls[index])
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.control(key).map(FieldControl::value)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_externally_loading(&self) -> bool {
        self.external_loading
    }

    /// Whether the form is busy for any reason.
    pub fn is_loading(&self) -> bool {
        self.external_loading || self.submitting
    }

    /// Text for the submit button.
    pub fn submit_label(&self) -> &str {
        if self.submitting {
            "Saving..."
        } else {
            &self.config.submit_label
        }
    }

    // =========================================================================
    // VISIBILITY & VALIDATION
    // =========================================================================

    /// Fields whose conditional holds for the current values, in display
    /// order.
    pub fn visible_fields(&self) -> Vec<&FieldDescriptor> {
        (0..self.fields.len())
            .filter(|&index| self.is_visible_at(index))
            .map(|index| &self.fields[index])
            .collect()
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.index_of(key)
            .is_some_and(|index| self.is_visible_at(index))
    }

    /// Whether every visible, enabled field passes its checks.
    pub fn validate(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Failure message per failing field, in display order. Hidden and
    /// statically disabled fields are skipped.
    pub fn validation_errors(&self) -> Vec<(String, String)> {
        (0..self.fields.len())
            .filter_map(|index| {
                self.error_at(index)
                    .map(|message| (self.fields[index].key.clone(), message))
            })
            .collect()
    }

    /// Message to show under a field. Only touched fields show errors.
    pub fn field_error(&self, key: &str) -> Option<String> {
        let index = self.index_of(key)?;
        if !self.controls[index].touched {
            return None;
        }
        self.error_at(index)
    }

    // =========================================================================
    // VALUES
    // =========================================================================

    /// Write a value typed by the operator or set by the host.
    ///
    /// A paginated select that does not know the value yet asks for page 1.
    pub fn set_value(&mut self, key: &str, value: Value) -> Option<LoadRequest> {
        let index = self.index_of(key)?;
        let value = self
            .registry
            .get(self.fields[index].field_type)
            .normalize(value);
        trace!("{} = {}", key, value);
        self.write_control(index, value)
    }

    pub fn touch(&mut self, key: &str) {
        if let Some(index) = self.index_of(key) {
            self.controls[index].touched = true;
        }
    }

    pub fn touch_all(&mut self) {
        for control in &mut self.controls {
            control.touched = true;
        }
    }

    /// Every control's value, hidden fields included.
    pub fn raw_values(&self) -> FormValues {
        self.fields
            .iter()
            .zip(&self.controls)
            .map(|(field, control)| (field.key.clone(), control.value.clone()))
            .collect()
    }

    /// Update the named controls, leaving touched state alone. Unknown keys
    /// are ignored.
    pub fn patch_values(&mut self, partial: &FormValues) -> Vec<LoadRequest> {
        let mut requests = Vec::new();
        for (key, value) in partial {
            let Some(index) = self.index_of(key) else {
                trace!("Ignoring patch for unknown field {}", key);
                continue;
            };
            let value = self
                .registry
                .get(self.fields[index].field_type)
                .normalize(value.clone());
            requests.extend(self.write_control(index, value));
        }
        requests
    }

    /// Select a just-created option in a paginated select.
    pub fn patch_created_option(&mut self, key: &str, option: SelectOption) -> Option<LoadRequest> {
        let index = self.index_of(key)?;
        let state = self.selects.get_mut(key)?;
        self.controls[index].value = option.value.clone();
        debug!("Pinned created option {} on {}", option.value, key);
        state.pin_created(option)
    }

    /// Disable the whole form while the host loads, restoring each field's
    /// own flag afterwards.
    pub fn set_disabled_externally(&mut self, disabled: bool) {
        self.external_loading = disabled;
        for (field, control) in self.fields.iter().zip(&mut self.controls) {
            control.disabled = field.disabled || disabled;
            if let Some(matrix) = self.matrices.get_mut(&field.key) {
                matrix.set_disabled(control.disabled);
            }
        }
        if disabled {
            self.close_dropdowns();
        }
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Start a submission.
    ///
    /// Rejected while one is in flight, while the host is loading, or when
    /// validation fails; the latter two mark every field touched so errors
    /// show.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitRejected> {
        if self.submitting {
            return Err(SubmitRejected::AlreadySubmitting);
        }
        if self.external_loading {
            self.touch_all();
            return Err(SubmitRejected::Loading);
        }
        if !self.validate() {
            self.touch_all();
            return Err(SubmitRejected::Invalid);
        }

        self.submitting = true;
        debug!("Submitting {:?} form", self.mode);
        Ok(SubmitTicket {
            epoch: self.epoch,
            values: self.raw_values(),
        })
    }

    /// Finish a submission with the handler's outcome.
    ///
    /// Success emits `SubmitSuccess` and closes the form; failure emits
    /// `SubmitError` and keeps it open. A ticket from before the last close
    /// or rebuild yields nothing.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        outcome: Result<Value, ApiError>,
    ) -> Vec<FormEvent> {
        if ticket.epoch != self.epoch || !self.submitting {
            warn!(
                "Dropping stale submission result (epoch {}, current {})",
                ticket.epoch, self.epoch
            );
            return Vec::new();
        }
        self.submitting = false;

        match outcome {
            Ok(response) => {
                debug!("Submission succeeded");
                let mut events = vec![FormEvent::SubmitSuccess(response)];
                events.extend(self.close());
                events
            }
            Err(err) => {
                warn!("Submission failed: {}", err);
                vec![FormEvent::SubmitError(err)]
            }
        }
    }

    /// Validate, run `handler` and finish in one call.
    pub async fn submit(
        &mut self,
        handler: &dyn SubmitHandler,
    ) -> Result<Vec<FormEvent>, SubmitRejected> {
        let ticket = self.begin_submit()?;
        let outcome = handler.submit(ticket.values.clone()).await;
        Ok(self.finish_submit(ticket, outcome))
    }

    // =========================================================================
    // CLOSING
    // =========================================================================

    /// Reset every control to its seed and emit `Close`.
    ///
    /// Refused while the host is loading. A submission still in flight is
    /// abandoned and its result dropped.
    pub fn close(&mut self) -> Option<FormEvent> {
        if self.external_loading {
            return None;
        }

        for control in &mut self.controls {
            control.reset();
        }
        for (field, control) in self.fields.iter().zip(&self.controls) {
            if let Some(state) = self.selects.get_mut(&field.key) {
                state.reset();
                state.seed(Some(control.seed.clone()));
            }
            if let Some(matrix) = self.matrices.get_mut(&field.key) {
                matrix.write_json(&control.seed);
            }
        }
        self.submitting = false;
        self.open_dropdown = None;
        self.epoch += 1;

        debug!("Form closed");
        Some(FormEvent::Close)
    }

    /// Escape or outside click: close an open dropdown first, otherwise
    /// close the form.
    pub fn on_dismiss_requested(&mut self) -> Option<FormEvent> {
        if self.close_dropdowns() {
            return None;
        }
        self.close()
    }

    /// Cancel debounces and drop in-flight loads and submissions for good.
    pub fn teardown(&mut self) {
        for state in self.selects.values_mut() {
            state.teardown();
        }
        self.submitting = false;
        self.epoch += 1;
    }

    // =========================================================================
    // STATIC SELECTS
    // =========================================================================

    /// Open the dropdown for `key`, closing any other; or close it if open.
    pub fn toggle_select_dropdown(&mut self, key: &str) {
        if self.open_dropdown.as_deref() == Some(key) {
            self.open_dropdown = None;
            return;
        }
        if self.control(key).is_none_or(FieldControl::is_disabled) {
            return;
        }
        self.close_dropdowns();
        self.open_dropdown = Some(key.to_string());
    }

    pub fn is_dropdown_open(&self, key: &str) -> bool {
        self.open_dropdown.as_deref() == Some(key)
    }

    /// Choose `value` from the options of `key`. Disabled or unknown options
    /// are ignored.
    pub fn select_option(&mut self, key: &str, value: &OptionValue) -> bool {
        let Some(index) = self.index_of(key) else {
            return false;
        };
        let allowed = self.fields[index]
            .options
            .iter()
            .any(|option| &option.value == value && !option.disabled);
        if !allowed || self.controls[index].disabled {
            return false;
        }

        self.controls[index].value = value.clone();
        self.controls[index].touched = true;
        self.open_dropdown = None;
        true
    }

    /// Label of the selected static option.
    pub fn selected_option_label(&self, key: &str) -> Option<&str> {
        let index = self.index_of(key)?;
        let value = &self.controls[index].value;
        if rbac_model::is_empty_value(value) {
            return None;
        }
        self.fields[index]
            .options
            .iter()
            .find(|option| &option.value == value)
            .map(|option| option.label.as_str())
    }

    // =========================================================================
    // PAGINATED SELECTS
    // =========================================================================

    pub fn select_state(&self, key: &str) -> Option<&PaginatedSelectState> {
        self.selects.get(key)
    }

    /// Loader configured for the paginated select `key`.
    pub fn loader_for(&self, key: &str) -> Option<Arc<dyn OptionLoader>> {
        self.selects.get(key).map(|state| state.config().loader())
    }

    /// Page-1 loads for every paginated select.
    pub fn initial_loads(&mut self) -> Vec<LoadRequest> {
        self.selects
            .values_mut()
            .filter_map(PaginatedSelectState::load_first_page)
            .collect()
    }

    /// Open or close a paginated select.
    pub fn toggle_paginated(&mut self, key: &str) -> Option<LoadRequest> {
        let disabled = self.control(key)?.is_disabled() || self.is_loading();
        self.open_dropdown = None;
        for (other, state) in &mut self.selects {
            if other != key {
                state.close();
            }
        }
        self.selects.get_mut(key)?.toggle(disabled)
    }

    /// Choose an entry of a paginated select.
    ///
    /// The create entry leaves the value alone and asks the host to open a
    /// creation flow. Disabled fields ignore the choice.
    pub fn choose_paginated_option(&mut self, key: &str, value: &OptionValue) -> Option<FormEvent> {
        let index = self.index_of(key)?;
        if self.controls[index].disabled {
            return None;
        }
        match self.selects.get_mut(key)?.choose(value) {
            SelectOutcome::Selected(value) => {
                self.controls[index].value = value;
                self.controls[index].touched = true;
                None
            }
            SelectOutcome::CreateRequested => Some(FormEvent::CreateRequested {
                field: key.to_string(),
            }),
            SelectOutcome::Ignored => None,
        }
    }

    pub fn paginated_search_input(&mut self, key: &str, term: impl Into<String>, now: Instant) {
        if let Some(state) = self.selects.get_mut(key) {
            state.search_input(term, now);
        }
    }

    /// Searches that have settled by `now`.
    pub fn poll_searches(&mut self, now: Instant) -> Vec<LoadRequest> {
        self.selects
            .values_mut()
            .filter_map(|state| state.poll_search(now))
            .collect()
    }

    pub fn load_more(&mut self, key: &str) -> Option<LoadRequest> {
        self.selects.get_mut(key)?.load_more()
    }

    /// Route a finished option load to its select. Returns `false` for
    /// stale or unknown responses.
    pub fn apply_options(&mut self, response: LoadResponse) -> bool {
        match self.selects.get_mut(&response.field) {
            Some(state) => state.apply(response),
            None => false,
        }
    }

    // =========================================================================
    // PERMISSIONS
    // =========================================================================

    pub fn permissions(&self, key: &str) -> Option<&PermissionsMatrix> {
        self.matrices.get(key)
    }

    /// Set one permission flag and write the matrix value into the control.
    pub fn toggle_permission(
        &mut self,
        key: &str,
        module_id: &str,
        kind: PermissionKind,
        checked: bool,
    ) -> bool {
        let Some(index) = self.index_of(key) else {
            return false;
        };
        let Some(value) = self
            .matrices
            .get_mut(key)
            .and_then(|matrix| matrix.toggle(module_id, kind, checked))
        else {
            return false;
        };

        self.controls[index].value = serde_json::to_value(value).unwrap_or(Value::Array(Vec::new()));
        true
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn index_of(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.key == key)
    }

    fn is_visible_at(&self, index: usize) -> bool {
        let Some(conditional) = &self.fields[index].conditional else {
            return true;
        };
        match self.value(&conditional.depends_on) {
            Some(value) => conditional.holds_for(value),
            None => conditional.holds_for(&Value::Null),
        }
    }

    fn error_at(&self, index: usize) -> Option<String> {
        let field = &self.fields[index];
        if field.disabled || !self.is_visible_at(index) {
            return None;
        }

        let value = &self.controls[index].value;
        let handler = self.registry.get(field.field_type);
        if handler.is_empty(value) {
            if field.required {
                return Some(format!("{} is required", field.display_label()));
            }
        } else if let Some(message) = handler.validate(value) {
            return Some(message.to_string());
        }

        field.validators.iter().find_map(|validator| {
            validator.check(value).err().map(|message| {
                message
                    .or_else(|| field.error_message.clone())
                    .unwrap_or_else(|| INVALID_VALUE_MESSAGE.to_string())
            })
        })
    }

    fn write_control(&mut self, index: usize, value: Value) -> Option<LoadRequest> {
        let key = &self.fields[index].key;
        let mut request = None;
        let value = if let Some(matrix) = self.matrices.get_mut(key) {
            matrix.write_json(&value);
            matrix.json_value()
        } else {
            if let Some(state) = self.selects.get_mut(key) {
                request = state.set_value(Some(value.clone()));
            }
            value
        };
        self.controls[index].value = value;
        request
    }

    /// Close every dropdown. Returns whether one was open.
    fn close_dropdowns(&mut self) -> bool {
        let mut closed = self.open_dropdown.take().is_some();
        for state in self.selects.values_mut() {
            if state.is_open() {
                state.close();
                closed = true;
            }
        }
        closed
    }
}

/// Reject field lists the engine cannot work with.
fn check_fields(fields: &[FieldDescriptor]) -> Result<(), FormBuildError> {
    let mut keys = HashSet::new();
    for field in fields {
        if !keys.insert(field.key.as_str()) {
            return Err(FormBuildError::DuplicateKey {
                key: field.key.clone(),
            });
        }
        if field.grid_cols == 0 || field.grid_cols > GRID_COLUMNS {
            return Err(FormBuildError::InvalidGridCols {
                field: field.key.clone(),
                cols: field.grid_cols,
            });
        }
        if field.field_type == FieldType::PaginatedSelect && field.paginated_select.is_none() {
            return Err(FormBuildError::MissingLoader {
                field: field.key.clone(),
            });
        }
    }

    for field in fields {
        if let Some(conditional) = &field.conditional
            && !keys.contains(conditional.depends_on.as_str())
        {
            return Err(FormBuildError::UnknownDependency {
                field: field.key.clone(),
                depends_on: conditional.depends_on.clone(),
            });
        }
    }
    Ok(())
}
