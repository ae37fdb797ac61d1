use thiserror::Error;

use crate::validation::MAX_SPAN_DAYS;

/// Message shown when the backend fails without a usable `detail` body.
pub const GENERIC_BACKEND_MESSAGE: &str = "The analysis server returned an error";

#[derive(Debug, Error)]
pub enum UhiMapperError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("Unknown base map: {0}")]
    UnknownBaseMap(String),
}

impl From<UhiMapperError> for String {
    fn from(err: UhiMapperError) -> Self {
        err.to_string()
    }
}

/// A requested date window was rejected before any request was issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Start date must be on or before the end date")]
    InvalidOrder,

    #[error("Date range spans {days} days; the maximum is {} days", MAX_SPAN_DAYS)]
    RangeTooLarge { days: i64 },
}

/// A backend request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No response reached us. The cause is kept for logs, users see a generic message.
    #[error("Could not reach the analysis server")]
    Transport(String),

    /// The server answered with a non-2xx status or an unreadable body.
    #[error("{detail}")]
    Backend { status: u16, detail: String },
}

/// Every way a load trigger can fail, as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Validation(#[from] RangeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
