#![warn(clippy::missing_docs_in_private_items)]

use circuit_macros::IntoStateChange;
use circuit_primitives::types::{
	Address,
	BlockNumber,
	ChannelIdentifier,
	Locksroot,
	Nonce,
	Secret,
	SecretHash,
	TokenAmount,
};
use serde::{
	Deserialize,
	Serialize,
};

use super::{
	LockedTransfer,
	Route,
	TransferDescription,
};

/// An enum containing all possible state change variants.
///
/// Every machine matches on this exhaustively; adding a message kind forces
/// each machine to acknowledge it.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum StateChange {
	ActionInitInitiator(ActionInitInitiator),
	ActionInitMediator(ActionInitMediator),
	ActionInitTarget(ActionInitTarget),
	ActionCancelTransfer(ActionCancelTransfer),
	Block(Block),
	ReceiveSecretRequest(ReceiveSecretRequest),
	ReceiveSecretReveal(ReceiveSecretReveal),
	ReceiveBalanceProof(ReceiveBalanceProof),
	ReceiveAnnounceDisposed(ReceiveAnnounceDisposed),
	ContractReceiveChannelClosed(ContractReceiveChannelClosed),
	ContractReceiveChannelSettled(ContractReceiveChannelSettled),
	ContractReceiveSecretReveal(ContractReceiveSecretReveal),
}

/// Entry point of a payment on the initiator node.
///
/// The caller generates the secret; the machine derives the secret hash and
/// picks the first usable route.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionInitInitiator {
	pub our_address: Address,
	pub transfer: TransferDescription,
	pub routes: Vec<Route>,
	pub block_number: BlockNumber,
}

/// Entry point of a mediated hop: the incoming payer transfer plus the
/// candidate routes towards the target.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionInitMediator {
	pub our_address: Address,
	pub from_route: Route,
	pub from_transfer: LockedTransfer,
	pub routes: Vec<Route>,
	pub block_number: BlockNumber,
}

/// Entry point of an incoming payment on the target node.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionInitTarget {
	pub our_address: Address,
	pub from_route: Route,
	pub transfer: LockedTransfer,
	pub block_number: BlockNumber,
}

/// User abort of an ongoing payment.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionCancelTransfer {
	pub secrethash: SecretHash,
}

/// A new block was observed.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct Block {
	pub block_number: BlockNumber,
}

/// The target asks the initiator for the secret.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveSecretRequest {
	pub sender: Address,
	pub amount: TokenAmount,
	pub secrethash: SecretHash,
}

/// A peer disclosed the secret off-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveSecretReveal {
	pub sender: Address,
	pub secret: Secret,
}

/// A peer finalized a new channel balance after an unlock.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveBalanceProof {
	pub sender: Address,
	pub channel_identifier: ChannelIdentifier,
	pub nonce: Nonce,
	pub transferred_amount: TokenAmount,
	pub locksroot: Locksroot,
	pub secrethash: SecretHash,
}

/// A peer refused to forward a specific lock.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveAnnounceDisposed {
	pub sender: Address,
	pub transfer: LockedTransfer,
}

/// A channel close was observed on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveChannelClosed {
	pub channel_identifier: ChannelIdentifier,
	pub block_number: BlockNumber,
}

/// A channel settlement was observed on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveChannelSettled {
	pub channel_identifier: ChannelIdentifier,
	pub block_number: BlockNumber,
}

/// A secret registration was observed on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveSecretReveal {
	pub secret: Secret,
	pub secrethash: SecretHash,
	pub block_number: BlockNumber,
}
