//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::model::TutorSettingsError;
use prep_core::CatalogError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `TutorService` requests.
///
/// Callers of the public tutor operations never see these; they are logged
/// and replaced by the operation's fallback text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TutorError {
    #[error("tutor is not configured")]
    Disabled,
    #[error("tutor returned an empty response")]
    EmptyResponse,
    #[error("tutor request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Settings(#[from] TutorSettingsError),
}
