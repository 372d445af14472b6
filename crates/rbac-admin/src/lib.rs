//! Host layer for the RBAC admin.
//!
//! Wires a [`ResourceService`](rbac_api::ResourceService) to the grid and
//! form engines: [`ResourcePage`] turns table intents into list fetches,
//! keeps only the latest response, opens create/edit forms and submits them.
//! User feedback goes through a [`ToastQueue`].
//!
//! # Modules
//!
//! - [`page`] - resource page controller
//! - [`toast`] - notification queue
//! - [`settings`] - TOML settings
//! - [`logging`] - tracing subscriber setup

pub mod error;
pub mod logging;
pub mod page;
pub mod settings;
pub mod toast;

pub use error::{LoggingError, PageError, SettingsError};
pub use logging::{LogConfig, LogFormat, init_logging};
pub use page::{FetchTicket, PageEffect, ResourcePage};
pub use settings::{FormSettings, LoggingSettings, Settings, ToastSettings};
pub use toast::{
    Confirmation, DEFAULT_ERROR_TOAST_DURATION, DEFAULT_TOAST_DURATION, Toast, ToastQueue,
    ToastType,
};
