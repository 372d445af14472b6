//! The resource service trait.

use async_trait::async_trait;
use rbac_model::Record;
use serde_json::Value;

use crate::envelope::{ApiResponse, Paginated};
use crate::error::ApiError;
use crate::params::ListParams;

/// Uniform CRUD contract implemented once per resource type.
///
/// Implementations are pass-through wrappers over the REST API; they do not
/// retry. Hosts call them and hand the results to the grid and form engines.
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// Name used in logs and toasts (e.g. `"users"`).
    fn resource_name(&self) -> &str;

    /// Fetch one page of records.
    async fn list(&self, params: &ListParams) -> Result<Paginated<Record>, ApiError>;

    /// Fetch one record.
    async fn get_by_id(&self, id: &str) -> Result<ApiResponse<Record>, ApiError>;

    /// Create a record from a form payload.
    async fn create(&self, payload: &Record) -> Result<ApiResponse<Record>, ApiError>;

    /// Replace the editable fields of a record.
    async fn update(&self, id: &str, payload: &Record) -> Result<ApiResponse<Record>, ApiError>;

    /// Delete a record.
    async fn delete(&self, id: &str) -> Result<ApiResponse<Value>, ApiError>;
}
