#![warn(clippy::missing_docs_in_private_items)]

use circuit_primitives::types::{
	Bytes,
	SecretHash,
};
use circuit_state_machine::types::{
	ContractReceiveChannelClosed,
	ContractReceiveChannelSettled,
	ContractReceiveSecretReveal,
	StateChange,
};
use ethabi::Token;

use crate::{
	errors::DecodeError,
	events::Event,
};

/// Lifts decoded chain events into core state changes.
pub struct EventDecoder;

impl EventDecoder {
	/// Maps a typed chain event onto the state change the core consumes.
	///
	/// Returns `Ok(None)` for events the core has no use for.
	pub fn as_state_change(&self, event: Event) -> Result<Option<StateChange>, DecodeError> {
		match event.name.as_ref() {
			"ChannelClosed" => self.channel_closed(event),
			"ChannelSettled" => self.channel_settled(event),
			"SecretRevealed" => self.secret_revealed(event),
			_ => Ok(None),
		}
	}

	/// Extracts a uint field from the event data.
	fn uint_field(event: &Event, name: &'static str) -> Result<ethabi::Uint, DecodeError> {
		match event.data.get(name) {
			Some(Token::Uint(value)) => Ok(*value),
			Some(_) => Err(DecodeError::UnexpectedToken(name)),
			None => Err(DecodeError::MissingField(name)),
		}
	}

	/// Lifts a `ChannelClosed` event.
	fn channel_closed(&self, event: Event) -> Result<Option<StateChange>, DecodeError> {
		let channel_identifier = Self::uint_field(&event, "channel_identifier")?;
		Ok(Some(
			ContractReceiveChannelClosed {
				channel_identifier,
				block_number: event.block_number,
			}
			.into(),
		))
	}

	/// Lifts a `ChannelSettled` event.
	fn channel_settled(&self, event: Event) -> Result<Option<StateChange>, DecodeError> {
		let channel_identifier = Self::uint_field(&event, "channel_identifier")?;
		Ok(Some(
			ContractReceiveChannelSettled {
				channel_identifier,
				block_number: event.block_number,
			}
			.into(),
		))
	}

	/// Lifts a `SecretRevealed` event.
	fn secret_revealed(&self, event: Event) -> Result<Option<StateChange>, DecodeError> {
		let secrethash = match event.data.get("secrethash") {
			Some(Token::FixedBytes(bytes)) if bytes.len() == 32 =>
				SecretHash::from_slice(bytes),
			Some(_) => return Err(DecodeError::UnexpectedToken("secrethash")),
			None => return Err(DecodeError::MissingField("secrethash")),
		};
		let secret = match event.data.get("secret") {
			Some(Token::Bytes(bytes)) => Bytes(bytes.clone()),
			Some(_) => return Err(DecodeError::UnexpectedToken("secret")),
			None => return Err(DecodeError::MissingField("secret")),
		};
		Ok(Some(
			ContractReceiveSecretReveal {
				secret,
				secrethash,
				block_number: event.block_number,
			}
			.into(),
		))
	}
}
