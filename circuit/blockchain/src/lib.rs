#![warn(clippy::missing_docs_in_private_items)]

//! Decoding of raw on-chain logs into typed events and core state changes.
//!
//! The ABI descriptions of the recognized events are built once at startup
//! into process-wide immutable tables; decoding afterwards is lock-free.

pub mod decode;
pub mod errors;
pub mod events;
