#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use circuit_primitives::types::{
	Address,
	BlockExpiration,
	BlockNumber,
	ChannelIdentifier,
	Locksroot,
	Nonce,
	RevealTimeout,
	Secret,
	SecretHash,
	SettleTimeout,
	TokenAddress,
	TokenAmount,
};
use serde::{
	Deserialize,
	Serialize,
};

use super::{
	Random,
	SendSecretReveal,
};

/// The wire-level off-chain payment primitive.
///
/// Moves `amount` to the recipient of the containing channel, conditional on
/// the secret behind `secrethash` being disclosed before `expiration`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct LockedTransfer {
	pub initiator: Address,
	pub target: Address,
	pub token: TokenAddress,
	pub channel_identifier: ChannelIdentifier,
	pub amount: TokenAmount,
	pub expiration: BlockExpiration,
	pub secrethash: SecretHash,
	pub nonce: Nonce,
	pub transferred_amount: TokenAmount,
	pub locksroot: Locksroot,
}

/// What the user asked the initiator to pay, before any route is chosen.
///
/// The secret is generated by the caller so the transition function stays
/// deterministic; the machine derives the secret hash itself.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct TransferDescription {
	pub initiator: Address,
	pub target: Address,
	pub token: TokenAddress,
	pub amount: TokenAmount,
	pub secret: Secret,
}

/// A candidate next hop for a payment.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct Route {
	pub hop: Address,
	pub channel_identifier: ChannelIdentifier,
	pub available_balance: TokenAmount,
	pub settle_timeout: SettleTimeout,
	pub reveal_timeout: RevealTimeout,
	pub closed_block: Option<BlockNumber>,
}

/// Partitioning of candidate routes.
///
/// Every route is in exactly one of the four lists or is the current pick.
/// `available` keeps the order the routes were supplied in; the head is the
/// next one tried.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct RouteSet {
	pub available: Vec<Route>,
	pub ignored: Vec<Route>,
	pub refunded: Vec<Route>,
	pub canceled: Vec<Route>,
	pub current: Option<Route>,
}

impl RouteSet {
	pub fn new(available: Vec<Route>) -> Self {
		Self { available, ..Default::default() }
	}
}

/// State of an ongoing payment on the initiator node.
///
/// Created by `ActionInitInitiator`, destroyed on success, failure or
/// cancellation.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct InitiatorState {
	pub our_address: Address,
	pub transfer_description: TransferDescription,
	/// The transfer as last sent; updated on every route attempt.
	pub transfer: LockedTransfer,
	pub routes: RouteSet,
	pub secret: Secret,
	pub secrethash: SecretHash,
	/// The reveal already sent to the target, if any.
	pub revealed_secret: Option<SendSecretReveal>,
	pub block_number: BlockNumber,
	pub nonce: Nonce,
	pub pseudo_random_number_generator: Random,
}

/// Lifecycle of one mediated hop pair.
///
/// The prefix names the leg the latest observed event belongs to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub enum PairState {
	/// Both locks outstanding, nothing learned yet.
	PayerPending,
	/// Both locks outstanding; in-flight alias accepted on restore.
	PayeePending,
	/// The payer lock entered the danger zone and a channel close was issued.
	PayerExpired,
	/// The payer channel was closed on-chain.
	PayerClosed,
	/// The payee revealed the secret; the payer was informed.
	PayeeSecretRevealed,
	/// The payer's balance proof arrived and was forwarded to the payee.
	PayeeBalanceProof,
	/// The payee lock expired without the secret being claimed.
	PayeeExpired,
	/// The payee refused the lock with an announce-disposed.
	PayeeRefund,
}

impl PairState {
	/// True while the forward lock is still outstanding and unlockable.
	pub fn is_pending(&self) -> bool {
		matches!(self, PairState::PayerPending | PairState::PayeePending)
	}

	/// True when nothing further can happen off-chain for this pair.
	pub fn is_final(&self) -> bool {
		matches!(
			self,
			PairState::PayeeBalanceProof | PairState::PayeeExpired | PairState::PayeeRefund
		)
	}
}

/// One forward/backward lock pairing owned by a mediator.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct MediatorPair {
	pub payer_route: Route,
	pub payer_transfer: LockedTransfer,
	pub payee_route: Route,
	pub payee_transfer: LockedTransfer,
	pub state: PairState,
}

/// State of one mediated payment on a mediator node.
///
/// Pairs are kept in creation order; retries after a refund append a new
/// pair sharing the payer leg.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct MediatorState {
	pub our_address: Address,
	pub secrethash: SecretHash,
	/// Set once learned, from any side; never overwritten.
	pub secret: Option<Secret>,
	pub routes: RouteSet,
	pub pairs: Vec<MediatorPair>,
	pub block_number: BlockNumber,
	pub nonce: Nonce,
	pub pseudo_random_number_generator: Random,
}

/// Lifecycle of an incoming payment on the target node.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetPhase {
	/// Lock accepted but too close to expiration to request the secret.
	WaitingForTransfer,
	SecretRequestSent,
	SecretRevealed,
	BalanceProofReceived,
	Expired,
}

/// State of one incoming payment on the target node.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct TargetState {
	pub our_address: Address,
	/// The payer-side route the transfer arrived on.
	pub route: Route,
	pub transfer: LockedTransfer,
	pub secret: Option<Secret>,
	pub secrethash: SecretHash,
	pub block_number: BlockNumber,
	pub state: TargetPhase,
	/// Guards against re-issuing the on-chain close intent.
	pub channel_close_requested: bool,
	pub pseudo_random_number_generator: Random,
}

/// Read-model of a channel's balances and outstanding locks.
///
/// Owned and written by the channel bookkeeping collaborator; the core only
/// reads it, typically to build `Route` values.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct ChannelView {
	pub channel_identifier: ChannelIdentifier,
	pub available_balance: TokenAmount,
	pub locks: HashMap<SecretHash, LockedTransfer>,
	pub settle_timeout: SettleTimeout,
	pub reveal_timeout: RevealTimeout,
	pub our_nonce: Nonce,
	pub partner_nonce: Nonce,
	pub closed_block: Option<BlockNumber>,
}
