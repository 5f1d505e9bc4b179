//! Error taxonomy for the ledger crate.
//!
//! These map directly onto the error taxonomy in the node's design
//! document: `InvalidArgument`, `ChainNotFound`, `ChainCorrupt`,
//! `ChainInvariantViolation`, and `PeerUnreachable` each have a home
//! here, with `thiserror` doing the `Display`/`Error` boilerplate.

use thiserror::Error;

/// Errors raised by the pure validation functions and by constructors
/// that reject malformed input (empty message text, out-of-range ports,
/// non-positive difficulty, ...).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors raised by [`crate::store::ChainStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no chain file found at the configured path")]
    ChainNotFound,

    #[error("chain file is corrupt: {0}")]
    ChainCorrupt(String),

    #[error("locally loaded chain fails its own invariants")]
    ChainInvariantViolation,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the coordinator's public contract (`submit_message`
/// and friends).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("coordinator is shutting down")]
    ShuttingDown,
}

/// Raised when an outbound peer HTTP call fails or returns a non-2xx
/// status. Logged at warning level by callers; never fatal.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer {0} is unreachable: {1}")]
    Unreachable(String, String),

    #[error("peer {0} returned an unparseable response: {1}")]
    Protocol(String, String),
}
