//! Core domain types: the message envelope, the proof-of-work value,
//! and the block that ties them together.

mod block;
mod envelope;
mod proof;

pub use block::{Block, GENESIS_ENVELOPE_ID, GENESIS_ENVELOPE_TEXT, GENESIS_PREVIOUS_HASH};
pub use envelope::Envelope;
pub use proof::ProofValue;
