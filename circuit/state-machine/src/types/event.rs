#![warn(clippy::missing_docs_in_private_items)]

use circuit_macros::IntoEvent;
use circuit_primitives::types::{
	Address,
	BlockNumber,
	ChannelIdentifier,
	Locksroot,
	MessageIdentifier,
	Nonce,
	Secret,
	SecretHash,
	TokenAmount,
};
use derive_more::Deref;
use serde::{
	Deserialize,
	Serialize,
};

use super::LockedTransfer;

/// An enum containing all possible event variants.
///
/// Events are pure side-effect intents: the machines never consume them and
/// each variant carries enough data for the dispatcher to execute it without
/// consulting state.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
	SendLockedTransfer(SendLockedTransfer),
	SendSecretRequest(SendSecretRequest),
	SendSecretReveal(SendSecretReveal),
	SendBalanceProof(SendBalanceProof),
	SendAnnounceDisposed(SendAnnounceDisposed),
	ContractSendChannelClose(ContractSendChannelClose),
	ContractSendWithdraw(ContractSendWithdraw),
	PaymentSentSuccess(PaymentSentSuccess),
	PaymentReceivedSuccess(PaymentReceivedSuccess),
	UnlockSuccess(UnlockSuccess),
	ErrorPaymentSentFailed(ErrorPaymentSentFailed),
	ErrorUnlockFailed(ErrorUnlockFailed),
	ErrorInvariantViolation(ErrorInvariantViolation),
	ErrorUnexpectedStateChange(ErrorUnexpectedStateChange),
}

impl Event {
	/// Returns a string of the inner event's type name.
	pub fn type_name(&self) -> &'static str {
		match self {
			Event::SendLockedTransfer(_) => "SendLockedTransfer",
			Event::SendSecretRequest(_) => "SendSecretRequest",
			Event::SendSecretReveal(_) => "SendSecretReveal",
			Event::SendBalanceProof(_) => "SendBalanceProof",
			Event::SendAnnounceDisposed(_) => "SendAnnounceDisposed",
			Event::ContractSendChannelClose(_) => "ContractSendChannelClose",
			Event::ContractSendWithdraw(_) => "ContractSendWithdraw",
			Event::PaymentSentSuccess(_) => "PaymentSentSuccess",
			Event::PaymentReceivedSuccess(_) => "PaymentReceivedSuccess",
			Event::UnlockSuccess(_) => "UnlockSuccess",
			Event::ErrorPaymentSentFailed(_) => "ErrorPaymentSentFailed",
			Event::ErrorUnlockFailed(_) => "ErrorUnlockFailed",
			Event::ErrorInvariantViolation(_) => "ErrorInvariantViolation",
			Event::ErrorUnexpectedStateChange(_) => "ErrorUnexpectedStateChange",
		}
	}
}

/// Common attributes of message-bearing events.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct SendMessageEventInner {
	pub recipient: Address,
	pub channel_identifier: ChannelIdentifier,
	pub message_identifier: MessageIdentifier,
}

/// A locked transfer that must be sent to `recipient`.
#[derive(Deref, Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct SendLockedTransfer {
	#[deref]
	pub inner: SendMessageEventInner,
	pub transfer: LockedTransfer,
}

/// Event used by a target node to request the secret from the initiator
/// (`recipient`).
#[derive(Deref, Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct SendSecretRequest {
	#[deref]
	pub inner: SendMessageEventInner,
	pub amount: TokenAmount,
	pub secrethash: SecretHash,
}

/// Sends a SecretReveal to another node.
///
/// Used once the secret is known locally and the recipient must act on it:
/// payee-side recipients learn the lock is released, payer-side recipients
/// learn they may unlock off-chain by sending a balance proof.
#[derive(Deref, Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct SendSecretReveal {
	#[deref]
	pub inner: SendMessageEventInner,
	pub secret: Secret,
	pub secrethash: SecretHash,
}

/// Event to send an up-to-date balance proof to the counter-party, finalizing
/// the channel balance after a lock was unlocked locally.
///
/// Used by payers: the initiator and mediator nodes. The recipient updates
/// its balance only on this message, never on the reveal alone; this keeps
/// both channel ends synchronized.
#[derive(Deref, Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct SendBalanceProof {
	#[deref]
	pub inner: SendMessageEventInner,
	pub nonce: Nonce,
	pub transferred_amount: TokenAmount,
	pub locksroot: Locksroot,
	pub secret: Secret,
	pub secrethash: SecretHash,
}

/// Refund message declining to keep a specific lock.
#[derive(Deref, Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct SendAnnounceDisposed {
	#[deref]
	pub inner: SendMessageEventInner,
	pub transfer: LockedTransfer,
}

/// Event emitted to close a channel on-chain, preparing an on-chain unlock.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ContractSendChannelClose {
	pub channel_identifier: ChannelIdentifier,
	pub triggered_by_block: BlockNumber,
}

/// Event emitted to claim a lock on-chain with the known secret.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ContractSendWithdraw {
	pub channel_identifier: ChannelIdentifier,
	pub secret: Secret,
	pub triggered_by_block: BlockNumber,
}

/// Event emitted by the initiator when a transfer is considered successful,
/// i.e. when the payee hop revealed the secret and every hop can unlock.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct PaymentSentSuccess {
	pub target: Address,
	pub amount: TokenAmount,
	pub secrethash: SecretHash,
}

/// Event emitted by the target when a payment is finalized with a balance
/// proof.
///
/// Note:
///     A target knows when a lock claim failed, but not when the whole
///     transfer failed, because the initiator may retry over other routes;
///     for this reason there is no received-failed counterpart.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct PaymentReceivedSuccess {
	pub initiator: Address,
	pub amount: TokenAmount,
	pub secrethash: SecretHash,
}

/// Event emitted when a lock unlock succeeded.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct UnlockSuccess {
	pub secrethash: SecretHash,
}

/// Event emitted by the payer when a transfer has failed terminally.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ErrorPaymentSentFailed {
	pub target: Address,
	pub reason: String,
}

/// Event emitted when a lock could not be unlocked before expiry.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ErrorUnlockFailed {
	pub secrethash: SecretHash,
	pub reason: String,
}

/// Diagnostic event recorded when a transition detected an internal
/// inconsistency and left state untouched.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ErrorInvariantViolation {
	pub reason: String,
}

/// Non-fatal notice that a state change was dispatched to a terminated
/// machine.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ErrorUnexpectedStateChange {
	pub reason: String,
}
