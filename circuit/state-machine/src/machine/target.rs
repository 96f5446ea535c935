#![warn(clippy::missing_docs_in_private_items)]

use circuit_primitives::{
	constants::LOCKSROOT_OF_NO_LOCKS,
	types::TokenAmount,
};

use super::{
	utils,
	Transition,
	TransitionResult,
};
use crate::{
	constants::CHANNEL_IDENTIFIER_GLOBAL_QUEUE,
	types::{
		ActionInitTarget,
		Block,
		ContractSendChannelClose,
		ErrorUnlockFailed,
		Event,
		PaymentReceivedSuccess,
		Random,
		ReceiveBalanceProof,
		ReceiveSecretReveal,
		SendMessageEventInner,
		SendSecretRequest,
		SendSecretReveal,
		StateChange,
		TargetPhase,
		TargetState,
		UnlockSuccess,
	},
};

/// A transition result for the target state.
pub type TargetTransition = TransitionResult<TargetState>;

/// Handles an `ActionInitTarget` state change.
///
/// A lock addressed to us with enough blocks left triggers a secret request
/// to the initiator. A lock that is already too close to expiration is
/// tracked without requesting: the secret may still surface on-chain.
fn handle_init(
	target_state: Option<TargetState>,
	state_change: ActionInitTarget,
) -> TargetTransition {
	if target_state.is_some() {
		return Ok(Transition { new_state: target_state, events: vec![] })
	}

	let transfer = state_change.transfer;
	if transfer.target != state_change.our_address || transfer.amount == TokenAmount::zero() {
		return Ok(Transition { new_state: None, events: vec![] })
	}

	let from_route = state_change.from_route;
	let safe_to_wait = utils::is_safe_to_wait(
		transfer.expiration,
		from_route.reveal_timeout,
		state_change.block_number,
	)
	.is_ok();

	let mut state = TargetState {
		our_address: state_change.our_address,
		route: from_route,
		secrethash: transfer.secrethash,
		transfer,
		secret: None,
		block_number: state_change.block_number,
		state: TargetPhase::WaitingForTransfer,
		channel_close_requested: false,
		pseudo_random_number_generator: Random::new(),
	};

	if !safe_to_wait {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	let message_identifier = state.pseudo_random_number_generator.next();
	let secret_request = SendSecretRequest {
		inner: SendMessageEventInner {
			recipient: state.transfer.initiator,
			channel_identifier: CHANNEL_IDENTIFIER_GLOBAL_QUEUE,
			message_identifier,
		},
		amount: state.transfer.amount,
		secrethash: state.secrethash,
	};
	state.state = TargetPhase::SecretRequestSent;

	Ok(Transition { new_state: Some(state), events: vec![secret_request.into()] })
}

/// Handles a `ReceiveSecretReveal` state change.
///
/// A valid reveal from the payer hop is stored and echoed back so the payer
/// side can unlock upstream.
fn handle_secret_reveal(
	target_state: Option<TargetState>,
	state_change: ReceiveSecretReveal,
) -> TargetTransition {
	let mut state = match target_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	let expecting_secret = matches!(
		state.state,
		TargetPhase::WaitingForTransfer | TargetPhase::SecretRequestSent
	);
	let is_valid = state_change.sender == state.route.hop &&
		utils::is_valid_secret_reveal(&state_change.secret, state.secrethash) &&
		expecting_secret;

	if !is_valid {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	state.secret = Some(state_change.secret.clone());
	state.state = TargetPhase::SecretRevealed;

	let message_identifier = state.pseudo_random_number_generator.next();
	let reveal = SendSecretReveal {
		inner: SendMessageEventInner {
			recipient: state.route.hop,
			channel_identifier: CHANNEL_IDENTIFIER_GLOBAL_QUEUE,
			message_identifier,
		},
		secret: state_change.secret,
		secrethash: state.secrethash,
	};

	Ok(Transition { new_state: Some(state), events: vec![reveal.into()] })
}

/// Handles the payer's balance proof finalizing the payment.
fn handle_balance_proof(
	target_state: Option<TargetState>,
	state_change: ReceiveBalanceProof,
) -> TargetTransition {
	let state = match target_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	let is_valid = state_change.sender == state.route.hop &&
		state_change.secrethash == state.secrethash &&
		state_change.nonce > state.transfer.nonce &&
		state_change.transferred_amount >= state.transfer.amount &&
		state_change.locksroot == *LOCKSROOT_OF_NO_LOCKS &&
		state.state == TargetPhase::SecretRevealed;

	if !is_valid {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	let unlock_success = UnlockSuccess { secrethash: state.secrethash };
	let payment_received = PaymentReceivedSuccess {
		initiator: state.transfer.initiator,
		amount: state.transfer.amount,
		secrethash: state.secrethash,
	};

	Ok(Transition { new_state: None, events: vec![unlock_success.into(), payment_received.into()] })
}

/// Handles expiration windows on a new block.
///
/// Entering the danger zone without the secret fails the incoming transfer;
/// entering it with the secret forces the channel closed so the lock can be
/// claimed on-chain.
fn handle_block(target_state: Option<TargetState>, state_change: Block) -> TargetTransition {
	let mut state = match target_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	if state_change.block_number < state.block_number {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}
	state.block_number = state_change.block_number;

	let danger_zone =
		state.block_number + state.route.reveal_timeout >= state.transfer.expiration;
	if !danger_zone {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	if state.secret.is_none() {
		let unlock_failed = ErrorUnlockFailed {
			secrethash: state.secrethash,
			reason: "Lock expired before the secret was revealed".to_owned(),
		};
		return Ok(Transition { new_state: None, events: vec![unlock_failed.into()] })
	}

	let mut events: Vec<Event> = vec![];
	if !state.channel_close_requested {
		state.channel_close_requested = true;
		events.push(
			ContractSendChannelClose {
				channel_identifier: state.route.channel_identifier,
				triggered_by_block: state.block_number,
			}
			.into(),
		);
	}

	Ok(Transition { new_state: Some(state), events })
}

/// State machine for the target node of a mediated transfer.
pub fn state_transition(
	target_state: Option<TargetState>,
	state_change: StateChange,
) -> TargetTransition {
	match state_change {
		StateChange::ActionInitTarget(inner) => handle_init(target_state, inner),
		StateChange::ReceiveSecretReveal(inner) => handle_secret_reveal(target_state, inner),
		StateChange::ReceiveBalanceProof(inner) => handle_balance_proof(target_state, inner),
		StateChange::Block(inner) => handle_block(target_state, inner),
		_ => Ok(Transition { new_state: target_state, events: vec![] }),
	}
}
