//! Core types and utilities for the repodesk admin client

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod drafts;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use drafts::{
    BookingDraft, CompanyRepoDraft, Draft, OrganisationRepoDraft, RecordDraft, Visibility,
};
pub use error::{Error, Result};
pub use types::{
    Booking, BookingSlot, CompanyRepo, FieldErrors, ListQuery, OrganisationRepo, PageLink,
    PageResult, Record, ResourceKind,
};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let json = config.is_json();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::debug!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}
