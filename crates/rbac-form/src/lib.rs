//! Dynamic form engine for the RBAC admin.
//!
//! [`DynamicFormEngine`] turns [`FieldDescriptor`]s into editable controls,
//! validates them, resolves conditional visibility and drives a single
//! submission at a time. Field types are dispatched through a
//! [`HandlerRegistry`].
//!
//! Two field types carry their own state:
//!
//! - **paginated select** ([`PaginatedSelectState`]) - options fetched page
//!   by page through an [`OptionLoader`], with debounced search and
//!   latest-request-wins merging
//! - **permissions** ([`PermissionsMatrix`]) - a read/write grid whose value
//!   lists only granted modules
//!
//! Network work is never performed by the engine itself. Operations that
//! need it return a [`LoadRequest`] or a [`SubmitTicket`] for the host to
//! run.

mod control;
mod debounce;
mod engine;
mod error;
mod field;
mod handler;
mod paginated_select;
mod permissions;
mod validator;

pub use control::FieldControl;
pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use engine::{
    DynamicFormEngine, FormConfig, FormEvent, FormMode, FormValues, SubmitHandler, SubmitTicket,
};
pub use error::{FormBuildError, SubmitRejected};
pub use field::{Conditional, FieldDescriptor, FieldType, GRID_COLUMNS, PermissionsConfig};
pub use handler::{
    CheckboxHandler, DATE_MESSAGE, DateHandler, EMAIL_MESSAGE, EmailHandler, FieldHandler,
    HandlerRegistry, NUMBER_MESSAGE, NumberHandler, PermissionsHandler, SelectHandler,
    TIME_MESSAGE, TextHandler, TimeHandler, URL_MESSAGE, UrlHandler,
};
pub use paginated_select::{
    DEFAULT_CREATE_VALUE, LOAD_MORE_THRESHOLD_PX, LoadError, LoadRequest, LoadResponse,
    OptionLoader, OptionPage, PaginatedSelectConfig, PaginatedSelectState, SelectOutcome,
};
pub use permissions::PermissionsMatrix;
pub use validator::{INVALID_VALUE_MESSAGE, Validator};
