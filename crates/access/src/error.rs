use thiserror::Error;

use crate::{AppKey, TierKey};

/// Failures of an access check or report.
///
/// An unknown or unauthenticated user is *not* an error: it resolves to a
/// denial. Every variant here means "no verdict", never "granted".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The application key is not registered (a configuration bug).
    #[error("application not found: {0}")]
    AppNotFound(AppKey),

    #[error("membership tier not found: {0}")]
    TierNotFound(TierKey),

    /// The backing store could not be read (timeout, lost connection, ...).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The store returned a record this model cannot interpret.
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
}
