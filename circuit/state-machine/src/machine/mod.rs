#![warn(clippy::missing_docs_in_private_items)]

pub mod initiator;
pub mod mediator;
pub mod routes;
pub mod target;
pub mod utils;

use crate::{
	errors::StateTransitionError,
	types::Event,
};

/// Outcome of applying one state change to one machine.
///
/// `new_state == None` marks the machine as terminal.
#[derive(Debug)]
pub struct Transition<S> {
	pub new_state: Option<S>,
	pub events: Vec<Event>,
}

/// Result alias shared by all transition functions.
///
/// `Err` is reserved for invariant violations; every message-validation
/// failure is a dropped state change or a terminal failure event.
pub type TransitionResult<S> = std::result::Result<Transition<S>, StateTransitionError>;
