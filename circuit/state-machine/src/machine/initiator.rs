#![warn(clippy::missing_docs_in_private_items)]

use circuit_primitives::{
	constants::LOCKSROOT_OF_NO_LOCKS,
	hashing::{
		compute_locksroot,
		hash_secret,
	},
	types::{
		BlockExpiration,
		ChannelIdentifier,
		Locksroot,
		TokenAmount,
	},
};

use super::{
	utils,
	Transition,
	TransitionResult,
};
use crate::{
	constants::{
		CHANNEL_IDENTIFIER_GLOBAL_QUEUE,
		SECRET_LENGTH,
	},
	types::{
		ActionCancelTransfer,
		ActionInitInitiator,
		Block,
		ErrorPaymentSentFailed,
		InitiatorState,
		LockedTransfer,
		PaymentSentSuccess,
		Random,
		ReceiveAnnounceDisposed,
		ReceiveSecretRequest,
		ReceiveSecretReveal,
		RouteSet,
		SendBalanceProof,
		SendLockedTransfer,
		SendMessageEventInner,
		SendSecretReveal,
		StateChange,
		UnlockSuccess,
	},
};

/// A transition result for the initiator state.
pub type InitiatorTransition = TransitionResult<InitiatorState>;

/// Picks the next usable route and re-issues the locked transfer on it.
///
/// Reuses the secret and secret hash of the payment; only the nonce, the
/// expiration and the channel are fresh. Routes failing the balance check
/// land in the ignored partition; with no candidate left the payment fails
/// terminally.
fn try_new_route(mut state: InitiatorState) -> InitiatorTransition {
	let amount = state.transfer.amount;
	let block_number = state.block_number;

	// Routes with a settle window too small for a safe lock are unusable
	// regardless of their balance.
	let route = state.routes.try_next(|route| {
		route.available_balance >= amount && route.settle_timeout > route.reveal_timeout * 2
	});
	match route {
		Some(route) => {
			state.nonce += 1;
			let expiration: BlockExpiration =
				block_number + route.settle_timeout - route.reveal_timeout;
			let locksroot: Locksroot =
				compute_locksroot(&[(expiration.as_u64(), amount, state.secrethash)]);
			let transfer = LockedTransfer {
				channel_identifier: route.channel_identifier,
				expiration,
				nonce: state.nonce,
				locksroot,
				..state.transfer.clone()
			};
			state.transfer = transfer.clone();

			let message_identifier = state.pseudo_random_number_generator.next();
			let locked_transfer = SendLockedTransfer {
				inner: SendMessageEventInner {
					recipient: route.hop,
					channel_identifier: route.channel_identifier,
					message_identifier,
				},
				transfer,
			};
			Ok(Transition { new_state: Some(state), events: vec![locked_transfer.into()] })
		},
		None => {
			let payment_failed = ErrorPaymentSentFailed {
				target: state.transfer.target,
				reason: "None of the available routes could be used".to_owned(),
			};
			Ok(Transition { new_state: None, events: vec![payment_failed.into()] })
		},
	}
}

/// Handles an `ActionInitInitiator` state change.
fn handle_init(
	initiator_state: Option<InitiatorState>,
	state_change: ActionInitInitiator,
) -> InitiatorTransition {
	if initiator_state.is_some() {
		// A payment for this secret hash is already in flight.
		return Ok(Transition { new_state: initiator_state, events: vec![] })
	}

	let description = state_change.transfer;
	if description.amount == TokenAmount::zero() || description.secret.0.len() != SECRET_LENGTH {
		return Ok(Transition { new_state: None, events: vec![] })
	}

	let secrethash = hash_secret(&description.secret.0);
	let transfer = LockedTransfer {
		initiator: description.initiator,
		target: description.target,
		token: description.token,
		channel_identifier: ChannelIdentifier::zero(),
		amount: description.amount,
		expiration: BlockExpiration::zero(),
		secrethash,
		nonce: 0,
		transferred_amount: TokenAmount::zero(),
		locksroot: Locksroot::zero(),
	};

	let state = InitiatorState {
		our_address: state_change.our_address,
		secret: description.secret.clone(),
		secrethash,
		transfer_description: description,
		transfer,
		routes: RouteSet::new(state_change.routes),
		revealed_secret: None,
		block_number: state_change.block_number,
		nonce: 0,
		pseudo_random_number_generator: Random::new(),
	};

	try_new_route(state)
}

/// Handles a `ReceiveSecretRequest` state change.
///
/// Only the payment's target may request the secret, for the exact amount
/// and secret hash of the transfer; anything else is dropped silently.
fn handle_secret_request(
	initiator_state: Option<InitiatorState>,
	state_change: ReceiveSecretRequest,
) -> InitiatorTransition {
	let mut state = match initiator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	let is_message_from_target = state_change.sender == state.transfer.target &&
		state_change.secrethash == state.secrethash &&
		state_change.amount == state.transfer.amount;

	if !is_message_from_target || state.revealed_secret.is_some() {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	let message_identifier = state.pseudo_random_number_generator.next();
	let secret_reveal = SendSecretReveal {
		inner: SendMessageEventInner {
			recipient: state.transfer.target,
			channel_identifier: CHANNEL_IDENTIFIER_GLOBAL_QUEUE,
			message_identifier,
		},
		secret: state.secret.clone(),
		secrethash: state.secrethash,
	};
	state.revealed_secret = Some(secret_reveal.clone());

	Ok(Transition { new_state: Some(state), events: vec![secret_reveal.into()] })
}

/// Handles a `ReceiveSecretReveal` state change.
///
/// A valid reveal from the current hop completes the payment: the balance
/// proof goes out, the unlock and payment successes are reported and the
/// machine terminates.
fn handle_secret_reveal(
	initiator_state: Option<InitiatorState>,
	state_change: ReceiveSecretReveal,
) -> InitiatorTransition {
	let mut state = match initiator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	let current_hop = state.routes.current.as_ref().map(|route| route.hop);
	let is_valid = utils::is_valid_secret_reveal(&state_change.secret, state.secrethash) &&
		Some(state_change.sender) == current_hop;

	if !is_valid {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	let route = match state.routes.current.clone() {
		Some(route) => route,
		None => return Ok(Transition { new_state: Some(state), events: vec![] }),
	};

	state.nonce += 1;
	let message_identifier = state.pseudo_random_number_generator.next();
	let balance_proof = SendBalanceProof {
		inner: SendMessageEventInner {
			recipient: route.hop,
			channel_identifier: route.channel_identifier,
			message_identifier,
		},
		nonce: state.nonce,
		transferred_amount: state.transfer.amount,
		locksroot: *LOCKSROOT_OF_NO_LOCKS,
		secret: state.secret.clone(),
		secrethash: state.secrethash,
	};
	let unlock_success = UnlockSuccess { secrethash: state.secrethash };
	let payment_sent_success = PaymentSentSuccess {
		target: state.transfer.target,
		amount: state.transfer.amount,
		secrethash: state.secrethash,
	};

	Ok(Transition {
		new_state: None,
		events: vec![balance_proof.into(), unlock_success.into(), payment_sent_success.into()],
	})
}

/// Handles a `ReceiveAnnounceDisposed` state change.
///
/// The refused route moves to the canceled partition and the next candidate
/// is tried with the same secret.
fn handle_announce_disposed(
	initiator_state: Option<InitiatorState>,
	state_change: ReceiveAnnounceDisposed,
) -> InitiatorTransition {
	let mut state = match initiator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	let current_hop = state.routes.current.as_ref().map(|route| route.hop);
	let is_valid = Some(state_change.sender) == current_hop &&
		state_change.transfer.secrethash == state.secrethash;

	if !is_valid {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	state.routes.cancel_current();
	try_new_route(state)
}

/// Handles an `ActionCancelTransfer` state change.
fn handle_cancel_transfer(
	initiator_state: Option<InitiatorState>,
	state_change: ActionCancelTransfer,
) -> InitiatorTransition {
	let state = match initiator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	if state_change.secrethash != state.secrethash {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	let payment_failed = ErrorPaymentSentFailed {
		target: state.transfer.target,
		reason: "User canceled payment".to_owned(),
	};
	Ok(Transition { new_state: None, events: vec![payment_failed.into()] })
}

/// Handles expiration of the outstanding lock on a new block.
fn handle_block(initiator_state: Option<InitiatorState>, state_change: Block) -> InitiatorTransition {
	let mut state = match initiator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	if state_change.block_number < state.block_number {
		// Stale block, monotonicity is externally enforced.
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}
	state.block_number = state_change.block_number;

	if state.block_number >= state.transfer.expiration && state.revealed_secret.is_none() {
		let payment_failed = ErrorPaymentSentFailed {
			target: state.transfer.target,
			reason: "Lock expired".to_owned(),
		};
		return Ok(Transition { new_state: None, events: vec![payment_failed.into()] })
	}

	Ok(Transition { new_state: Some(state), events: vec![] })
}

/// State machine for a payment's initiator node.
pub fn state_transition(
	initiator_state: Option<InitiatorState>,
	state_change: StateChange,
) -> InitiatorTransition {
	match state_change {
		StateChange::ActionInitInitiator(inner) => handle_init(initiator_state, inner),
		StateChange::ReceiveSecretRequest(inner) => handle_secret_request(initiator_state, inner),
		StateChange::ReceiveSecretReveal(inner) => handle_secret_reveal(initiator_state, inner),
		StateChange::ReceiveAnnounceDisposed(inner) =>
			handle_announce_disposed(initiator_state, inner),
		StateChange::ActionCancelTransfer(inner) => handle_cancel_transfer(initiator_state, inner),
		StateChange::Block(inner) => handle_block(initiator_state, inner),
		_ => Ok(Transition { new_state: initiator_state, events: vec![] }),
	}
}
