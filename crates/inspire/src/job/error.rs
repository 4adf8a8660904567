//! Error types for the job controller.

use crate::portal::FetchError;
use thiserror::Error;

/// Why a start request was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("Scraper is already running")]
    AlreadyRunning,

    #[error("Unknown state: {state}")]
    InvalidState { state: String },

    #[error("District '{district}' does not belong to {state}")]
    InvalidDistrict { district: String, state: String },

    #[error("No districts selected")]
    NoDistricts,

    /// The district list for the state could not be fetched from the portal
    #[error("Could not load districts for {state}: {message}")]
    CatalogUnavailable { state: String, message: String },
}

impl StartError {
    /// Machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            StartError::AlreadyRunning => "already_running",
            StartError::InvalidState { .. } => "invalid_state",
            StartError::InvalidDistrict { .. } => "invalid_district",
            StartError::NoDistricts => "no_districts",
            StartError::CatalogUnavailable { .. } => "catalog_unavailable",
        }
    }
}

/// Why there is nothing to download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// A job is still running
    #[error("Scraping is still in progress")]
    NotReady,

    /// No finished job with output files
    #[error("No file available for download")]
    NoOutput,

    #[error("Failed to read output file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Errors that end a run as `failed`.
#[derive(Debug, Error)]
pub enum JobError {
    /// The portal session could not be set up
    #[error("Failed to {step}: {source}")]
    Session {
        step: &'static str,
        #[source]
        source: FetchError,
    },

    /// Output could not be written; later rows can't be trusted to persist
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: csv::Error,
    },
}
