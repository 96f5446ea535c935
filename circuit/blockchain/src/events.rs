#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use circuit_primitives::types::{
	Address,
	Log,
	H256,
	U64,
};
use ethabi::{
	EventParam,
	ParamType,
};
use lazy_static::lazy_static;

/// Builds the ABI description of one channel contract event.
fn contract_event(name: &str, inputs: Vec<(&str, ParamType, bool)>) -> ethabi::Event {
	ethabi::Event {
		name: name.to_owned(),
		inputs: inputs
			.into_iter()
			.map(|(name, kind, indexed)| EventParam { name: name.to_owned(), kind, indexed })
			.collect(),
		anonymous: false,
	}
}

lazy_static! {
	/// The recognized channel contract events, built once at startup.
	pub static ref CHANNEL_EVENTS: Vec<ethabi::Event> = vec![
		contract_event(
			"ChannelClosed",
			vec![
				("channel_identifier", ParamType::Uint(256), true),
				("closing_participant", ParamType::Address, true),
				("nonce", ParamType::Uint(256), true),
			],
		),
		contract_event(
			"ChannelSettled",
			vec![
				("channel_identifier", ParamType::Uint(256), true),
				("participant1_amount", ParamType::Uint(256), false),
				("participant2_amount", ParamType::Uint(256), false),
			],
		),
		contract_event(
			"SecretRevealed",
			vec![
				("secrethash", ParamType::FixedBytes(32), true),
				("secret", ParamType::Bytes, false),
			],
		),
	];
}

/// Contains information about an event triggered on-chain.
#[derive(Clone, Debug)]
pub struct Event {
	pub name: String,
	pub address: Address,
	pub block_number: U64,
	pub block_hash: H256,
	pub transaction_hash: H256,
	pub data: HashMap<String, ethabi::Token>,
}

impl Event {
	/// Decodes a log into a typed event.
	///
	/// Returns None if the event is unknown or the log is incomplete.
	pub fn decode(log: &Log) -> Option<Event> {
		for event in CHANNEL_EVENTS.iter() {
			if log.topics.is_empty() || event.signature() != log.topics[0] {
				continue
			}

			let indexed_inputs: Vec<&EventParam> =
				event.inputs.iter().filter(|input| input.indexed).collect();
			let non_indexed_inputs: Vec<&EventParam> =
				event.inputs.iter().filter(|input| !input.indexed).collect();

			let mut data: HashMap<String, ethabi::Token> = HashMap::new();

			let mut indexed_inputs = indexed_inputs.into_iter();
			for topic in &log.topics[1..] {
				let input = indexed_inputs.next()?;
				if let Ok(decoded_value) = ethabi::decode(&[input.kind.clone()], topic.as_bytes()) {
					data.insert(input.name.clone(), decoded_value[0].clone());
				}
			}

			if !log.data.0.is_empty() {
				let kinds: Vec<ParamType> =
					non_indexed_inputs.iter().map(|input| input.kind.clone()).collect();
				if let Ok(decoded_values) = ethabi::decode(&kinds, &log.data.0) {
					for (input, decoded_value) in
						non_indexed_inputs.iter().zip(decoded_values.into_iter())
					{
						data.insert(input.name.clone(), decoded_value);
					}
				}
			}

			return Some(Event {
				name: event.name.clone(),
				address: log.address,
				block_number: log.block_number?,
				block_hash: log.block_hash?,
				transaction_hash: log.transaction_hash?,
				data,
			})
		}
		None
	}
}
