//! Shared data model for the RBAC admin engines.
//!
//! Records are opaque JSON objects supplied by the resource services. The
//! engines never mutate them; they resolve fields by dot path and build
//! display strings, sort keys and row identities from the resolved values.
//!
//! # Modules
//!
//! - `record` - dot-path lookup and display coercion
//! - `row_id` - stable row identity for selection tracking
//! - `option` - select options shared by static and paginated selects
//! - `permission` - module permission tuples
//! - `badge` - badge colours for table cells
//! - `date` - date parsing and display formats

mod badge;
mod date;
mod option;
mod permission;
mod record;
mod row_id;

pub use badge::BadgeColor;
pub use date::{DateFormat, format_date, format_date_at, parse_date};
pub use option::{OptionValue, SelectOption};
pub use permission::{ModuleRef, Permission, PermissionKind};
pub use record::{Record, display_value, is_empty_value, resolve_path};
pub use row_id::RowId;
