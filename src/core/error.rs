//! Error taxonomy for the refresh pipeline

use rust_decimal::Decimal;
use std::fmt;

/// Failure talking to an upstream price API.
#[derive(Debug)]
pub enum FetchError {
    /// Network failure, timeout or a client that could not be built.
    Request(String),
    /// Upstream answered with a non-2xx status.
    Status { status: u16, source: &'static str },
    /// Body could not be parsed or lacks the expected field.
    Payload(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(msg) => write!(f, "request error: {msg}"),
            Self::Status { status, source } => write!(f, "HTTP error: {status} from {source}"),
            Self::Payload(msg) => write!(f, "invalid payload: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// The metal rate cannot be inverted into a price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DivisionError {
    NonPositiveMetalRate(Decimal),
    Overflow,
}

impl fmt::Display for DivisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveMetalRate(rate) => {
                write!(f, "metal units per base currency must be positive, got {rate}")
            }
            Self::Overflow => write!(f, "gold price computation overflowed"),
        }
    }
}

impl std::error::Error for DivisionError {}

/// Failure reading from or writing to the history store.
#[derive(Debug)]
pub struct PersistenceError(pub String);

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for PersistenceError {}

impl From<fjall::Error> for PersistenceError {
    fn from(e: fjall::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self(format!("corrupt record: {e}"))
    }
}

/// Anything that can go wrong during one refresh cycle.
#[derive(Debug)]
pub enum RefreshError {
    Fetch(FetchError),
    Division(DivisionError),
    Persistence(PersistenceError),
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {e}"),
            Self::Division(e) => write!(f, "calculation failed: {e}"),
            Self::Persistence(e) => write!(f, "persist failed: {e}"),
        }
    }
}

impl std::error::Error for RefreshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Division(e) => Some(e),
            Self::Persistence(e) => Some(e),
        }
    }
}

impl From<FetchError> for RefreshError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<DivisionError> for RefreshError {
    fn from(e: DivisionError) -> Self {
        Self::Division(e)
    }
}

impl From<PersistenceError> for RefreshError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}
