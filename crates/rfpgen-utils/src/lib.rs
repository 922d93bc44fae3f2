//! Foundation utilities shared by the rfpgen crates: the error taxonomy,
//! provider and mode enums, structured logging, secret redaction, atomic
//! file writes and the fallback response text.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod fallback;
pub mod logging;
pub mod redaction;
pub mod types;
