use thiserror::Error;

/// Errors raised while lifting a decoded chain event into a state change.
#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
	#[error("Event is missing field: {0}")]
	MissingField(&'static str),
	#[error("Unexpected token type for field: {0}")]
	UnexpectedToken(&'static str),
}
