//! Contract between the admin engines and the REST resource services.
//!
//! Every managed resource (entities, users, roles, profiles, meters) is
//! served through the same five operations. The engines never talk HTTP
//! themselves; a host wires a [`ResourceService`] implementation in and feeds
//! the results back to the grid and form engines.
//!
//! # Error presentation
//!
//! Failed calls surface as [`ApiError`]. [`ApiError::summary`] extracts a
//! title/detail pair using the API's `"title: detail"` message convention,
//! and [`ApiError::kind`] classifies the failure (authentication failures
//! are handled above the engines).

mod envelope;
mod error;
mod params;
mod service;

pub use envelope::{ApiResponse, Paginated, PaginationMeta};
pub use error::{ApiError, ApiErrorKind, ErrorSummary, FALLBACK_ERROR_TITLE};
pub use params::{ListParams, SortOrder};
pub use service::ResourceService;
