//! Data-grid engine for the RBAC admin tables.
//!
//! [`DataGridEngine`] derives the rows a table shows (search, sort, page
//! window) and tracks row selection. It performs no I/O: intents that the
//! host must act on (fetch another page, re-query with a search term) come
//! back as [`GridEvent`]s.
//!
//! # Modes
//!
//! - [`GridMode::Client`] - the full dataset is in memory and every view is
//!   computed locally.
//! - [`GridMode::Server`] - the backing array already is the current page;
//!   search, sort and paging are emitted as events and the host re-fetches.
//!
//! # Example
//!
//! ```ignore
//! use rbac_grid::{ColumnDescriptor, DataGridEngine, GridMode};
//!
//! let mut grid = DataGridEngine::new(
//!     vec![ColumnDescriptor::new("name", "Name"), ColumnDescriptor::new("email_id", "Email")],
//!     GridMode::Client,
//! );
//! grid.set_records(users);
//! grid.set_search_term("acme");
//! let events = grid.toggle_sort("name");
//! for row in grid.page_rows() { /* render */ }
//! ```

mod action;
mod column;
mod config;
mod engine;
mod event;
mod pagination;
mod sort;

pub use action::{ActionVariant, TableAction};
pub use column::{Align, ColumnDescriptor, ColumnKind};
pub use config::GridConfig;
pub use engine::{DataGridEngine, GridMode};
pub use event::{GridEvent, GridMessage};
pub use pagination::{DEFAULT_MAX_PAGE_BUTTONS, page_numbers};
pub use sort::{SortDirection, SortIndicator, SortState, compare_cells};
