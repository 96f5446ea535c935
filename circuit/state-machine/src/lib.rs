#![warn(clippy::missing_docs_in_private_items)]

//! The mediated-transfer core: deterministic, message-driven state machines
//! for the initiator, mediator and target roles of a hash-time-locked
//! payment, plus the generic storage-backed manager driving them.

pub mod constants;
pub mod errors;
pub mod machine;
pub mod manager;
#[cfg(test)]
pub mod tests;
pub mod types;
pub mod views;
