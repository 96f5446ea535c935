#![warn(clippy::missing_docs_in_private_items)]

use circuit_primitives::{
	constants::LOCKSROOT_OF_NO_LOCKS,
	hashing::compute_locksroot,
	types::{
		Secret,
		SecretHash,
		TokenAmount,
	},
};

use super::{
	utils,
	Transition,
	TransitionResult,
};
use crate::{
	errors::StateTransitionError,
	types::{
		ActionInitMediator,
		Block,
		ContractReceiveChannelClosed,
		ContractReceiveChannelSettled,
		ContractReceiveSecretReveal,
		ContractSendChannelClose,
		ContractSendWithdraw,
		ErrorUnlockFailed,
		Event,
		LockedTransfer,
		MediatorPair,
		MediatorState,
		PairState,
		Random,
		ReceiveAnnounceDisposed,
		ReceiveBalanceProof,
		ReceiveSecretReveal,
		Route,
		RouteSet,
		SendAnnounceDisposed,
		SendBalanceProof,
		SendLockedTransfer,
		SendMessageEventInner,
		SendSecretReveal,
		StateChange,
		UnlockSuccess,
	},
};

/// A transition result for the mediator state.
pub type MediatorTransition = TransitionResult<MediatorState>;

/// Checks the cross-pair invariants of a mediator state.
///
/// Every pair must carry the payment's secret hash on both legs and, with
/// zero fees, forward exactly the amount it received.
fn sanity_check(state: &MediatorState) -> Result<(), StateTransitionError> {
	for pair in &state.pairs {
		if pair.payer_transfer.secrethash != state.secrethash ||
			pair.payee_transfer.secrethash != state.secrethash
		{
			return Err(StateTransitionError {
				msg: "Mediation pairs must share the payment's secret hash".to_owned(),
			})
		}
		if pair.payer_transfer.amount != pair.payee_transfer.amount {
			return Err(StateTransitionError {
				msg: "Forward and backward lock amounts must match".to_owned(),
			})
		}
	}
	Ok(())
}

/// Records the learned secret, refusing to replace it with a different one.
fn set_secret(state: &mut MediatorState, secret: Secret) -> Result<(), StateTransitionError> {
	match &state.secret {
		Some(known) if *known != secret =>
			Err(StateTransitionError { msg: "Secret may not be replaced once learned".to_owned() }),
		Some(_) => Ok(()),
		None => {
			state.secret = Some(secret);
			Ok(())
		},
	}
}

/// Terminates the machine once every pair reached a final state.
fn clear_if_finalized(transition: Transition<MediatorState>) -> MediatorTransition {
	let state = match transition.new_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: transition.events }),
	};

	let all_final = !state.pairs.is_empty() && state.pairs.iter().all(|pair| pair.state.is_final());
	if all_final {
		return Ok(Transition { new_state: None, events: transition.events })
	}

	Ok(Transition { new_state: Some(state), events: transition.events })
}

/// Picks the next payee route able to carry `payer_transfer` and emits the
/// forward locked transfer on it.
///
/// The payee lock expires one reveal timeout earlier than the payer lock so
/// the mediator always has a window to learn the secret from downstream and
/// still unlock upstream. With no usable route the lock is refused upstream
/// with an announce-disposed.
fn forward_transfer_pair(
	mut state: MediatorState,
	payer_route: Route,
	payer_transfer: LockedTransfer,
) -> MediatorTransition {
	let amount = payer_transfer.amount;
	let block_number = state.block_number;
	let payer_expiration = payer_transfer.expiration;

	// A payer lock already inside its danger zone cannot be mediated at
	// all, no matter the routes on offer.
	let safe_to_mediate =
		utils::is_safe_to_wait(payer_expiration, payer_route.reveal_timeout, block_number).is_ok();

	let route = if safe_to_mediate {
		state.routes.try_next(|route| {
			let settle_margin = payer_expiration - block_number + route.reveal_timeout;
			route.available_balance >= amount &&
				route.settle_timeout >= settle_margin &&
				route.closed_block.is_none()
		})
	} else {
		None
	};

	match route {
		Some(payee_route) => {
			state.nonce += 1;
			let expiration = payer_expiration - payer_route.reveal_timeout;
			let locksroot =
				compute_locksroot(&[(expiration.as_u64(), amount, state.secrethash)]);
			let payee_transfer = LockedTransfer {
				channel_identifier: payee_route.channel_identifier,
				expiration,
				nonce: state.nonce,
				locksroot,
				transferred_amount: TokenAmount::zero(),
				..payer_transfer.clone()
			};

			let message_identifier = state.pseudo_random_number_generator.next();
			let locked_transfer = SendLockedTransfer {
				inner: SendMessageEventInner {
					recipient: payee_route.hop,
					channel_identifier: payee_route.channel_identifier,
					message_identifier,
				},
				transfer: payee_transfer.clone(),
			};

			state.pairs.push(MediatorPair {
				payer_route,
				payer_transfer,
				payee_route,
				payee_transfer,
				state: PairState::PayerPending,
			});

			Ok(Transition { new_state: Some(state), events: vec![locked_transfer.into()] })
		},
		None => {
			let message_identifier = state.pseudo_random_number_generator.next();
			let disposed = SendAnnounceDisposed {
				inner: SendMessageEventInner {
					recipient: payer_route.hop,
					channel_identifier: payer_route.channel_identifier,
					message_identifier,
				},
				transfer: payer_transfer,
			};

			if state.pairs.is_empty() {
				// Mediation was refused before any pair existed.
				return Ok(Transition { new_state: None, events: vec![disposed.into()] })
			}
			clear_if_finalized(Transition { new_state: Some(state), events: vec![disposed.into()] })
		},
	}
}

/// Handles an `ActionInitMediator` state change.
fn handle_init(
	mediator_state: Option<MediatorState>,
	state_change: ActionInitMediator,
) -> MediatorTransition {
	if mediator_state.is_some() {
		return Ok(Transition { new_state: mediator_state, events: vec![] })
	}

	let from_transfer = state_change.from_transfer;
	if from_transfer.amount == TokenAmount::zero() ||
		from_transfer.secrethash == SecretHash::zero()
	{
		return Ok(Transition { new_state: None, events: vec![] })
	}

	let state = MediatorState {
		our_address: state_change.our_address,
		secrethash: from_transfer.secrethash,
		secret: None,
		routes: RouteSet::new(state_change.routes),
		pairs: vec![],
		block_number: state_change.block_number,
		nonce: 0,
		pseudo_random_number_generator: Random::new(),
	};

	forward_transfer_pair(state, state_change.from_route, from_transfer)
}

/// Handles a `ReceiveAnnounceDisposed` refund from a payee.
///
/// The refused route is canceled and an alternative is tried for the same
/// payer leg; with none left the refusal propagates upstream.
fn handle_announce_disposed(
	mediator_state: Option<MediatorState>,
	state_change: ReceiveAnnounceDisposed,
) -> MediatorTransition {
	let mut state = match mediator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	if state_change.transfer.secrethash != state.secrethash {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	let pair_index = state
		.pairs
		.iter()
		.position(|pair| pair.state.is_pending() && pair.payee_route.hop == state_change.sender);
	let pair_index = match pair_index {
		Some(pair_index) => pair_index,
		None => return Ok(Transition { new_state: Some(state), events: vec![] }),
	};

	state.pairs[pair_index].state = PairState::PayeeRefund;
	state.routes.cancel_current();

	let payer_route = state.pairs[pair_index].payer_route.clone();
	let payer_transfer = state.pairs[pair_index].payer_transfer.clone();
	forward_transfer_pair(state, payer_route, payer_transfer)
}

/// Reveals the secret to every payer with a pending forward lock, in the
/// order the pairs were created.
fn events_for_secret_reveal(state: &mut MediatorState) -> Vec<Event> {
	let secret = match state.secret.clone() {
		Some(secret) => secret,
		None => return vec![],
	};

	let mut events = vec![];
	for pair in state.pairs.iter_mut() {
		if !pair.state.is_pending() {
			continue
		}
		pair.state = PairState::PayeeSecretRevealed;
		let message_identifier = state.pseudo_random_number_generator.next();
		let reveal = SendSecretReveal {
			inner: SendMessageEventInner {
				recipient: pair.payer_route.hop,
				channel_identifier: pair.payer_route.channel_identifier,
				message_identifier,
			},
			secret: secret.clone(),
			secrethash: state.secrethash,
		};
		events.push(reveal.into());
	}
	events
}

/// Handles a `ReceiveSecretReveal` state change.
///
/// The secret may arrive from either side of any pair; it is only acted
/// upon once and only propagated upstream. The payee learns nothing new
/// from us until the payer's balance proof arrived.
fn handle_secret_reveal(
	mediator_state: Option<MediatorState>,
	state_change: ReceiveSecretReveal,
) -> MediatorTransition {
	let mut state = match mediator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	if !utils::is_valid_secret_reveal(&state_change.secret, state.secrethash) {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	let is_participant = state.pairs.iter().any(|pair| {
		pair.payee_route.hop == state_change.sender || pair.payer_route.hop == state_change.sender
	});
	if !is_participant {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	set_secret(&mut state, state_change.secret)?;
	let events = events_for_secret_reveal(&mut state);

	Ok(Transition { new_state: Some(state), events })
}

/// Handles an on-chain secret registration.
fn handle_contract_secret_reveal(
	mediator_state: Option<MediatorState>,
	state_change: ContractReceiveSecretReveal,
) -> MediatorTransition {
	let mut state = match mediator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	if state_change.secrethash != state.secrethash ||
		!utils::is_valid_secret_reveal(&state_change.secret, state.secrethash)
	{
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	set_secret(&mut state, state_change.secret)?;
	let events = events_for_secret_reveal(&mut state);

	Ok(Transition { new_state: Some(state), events })
}

/// Handles the payer's balance proof, releasing the payee leg.
fn handle_balance_proof(
	mediator_state: Option<MediatorState>,
	state_change: ReceiveBalanceProof,
) -> MediatorTransition {
	let mut state = match mediator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	if state_change.secrethash != state.secrethash {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}

	let pair_index = state.pairs.iter().position(|pair| {
		pair.state == PairState::PayeeSecretRevealed &&
			pair.payer_route.hop == state_change.sender &&
			state_change.nonce > pair.payer_transfer.nonce &&
			state_change.transferred_amount >= pair.payer_transfer.amount
	});
	let pair_index = match pair_index {
		Some(pair_index) => pair_index,
		None => return Ok(Transition { new_state: Some(state), events: vec![] }),
	};

	let secret = match state.secret.clone() {
		Some(secret) => secret,
		None =>
			return Err(StateTransitionError {
				msg: "Balance proof accepted before the secret was known".to_owned(),
			}),
	};

	state.nonce += 1;
	let message_identifier = state.pseudo_random_number_generator.next();
	let pair = &mut state.pairs[pair_index];
	pair.state = PairState::PayeeBalanceProof;

	let balance_proof = SendBalanceProof {
		inner: SendMessageEventInner {
			recipient: pair.payee_route.hop,
			channel_identifier: pair.payee_route.channel_identifier,
			message_identifier,
		},
		nonce: state.nonce,
		transferred_amount: pair.payee_transfer.amount,
		locksroot: *LOCKSROOT_OF_NO_LOCKS,
		secret,
		secrethash: state.secrethash,
	};
	let unlock_success = UnlockSuccess { secrethash: state.secrethash };

	clear_if_finalized(Transition {
		new_state: Some(state),
		events: vec![balance_proof.into(), unlock_success.into()],
	})
}

/// Handles lock expiration windows on a new block.
///
/// Closing the payer channel is only safe once the danger zone is entered
/// AND the secret is known; otherwise the mediator keeps waiting. A payee
/// lock reaching its expiration is a failed unlock.
fn handle_block(mediator_state: Option<MediatorState>, state_change: Block) -> MediatorTransition {
	let mut state = match mediator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	if state_change.block_number < state.block_number {
		return Ok(Transition { new_state: Some(state), events: vec![] })
	}
	state.block_number = state_change.block_number;
	let block_number = state.block_number;

	let secret_known = state.secret.is_some();
	let mut events: Vec<Event> = vec![];

	for pair in state.pairs.iter_mut() {
		let payer_danger_zone =
			block_number + pair.payer_route.reveal_timeout >= pair.payer_transfer.expiration;
		let unlock_deadline_reached =
			matches!(pair.state, PairState::PayerPending | PairState::PayeePending) ||
				pair.state == PairState::PayeeSecretRevealed;
		if payer_danger_zone && secret_known && unlock_deadline_reached {
			pair.state = PairState::PayerExpired;
			events.push(
				ContractSendChannelClose {
					channel_identifier: pair.payer_route.channel_identifier,
					triggered_by_block: block_number,
				}
				.into(),
			);
			continue
		}

		let payee_expired = block_number >= pair.payee_transfer.expiration;
		if payee_expired && !pair.state.is_final() {
			pair.state = PairState::PayeeExpired;
			events.push(
				ErrorUnlockFailed {
					secrethash: pair.payee_transfer.secrethash,
					reason: "Lock expired".to_owned(),
				}
				.into(),
			);
		}
	}

	clear_if_finalized(Transition { new_state: Some(state), events })
}

/// Handles an on-chain close of one of the pairs' payer channels.
fn handle_channel_closed(
	mediator_state: Option<MediatorState>,
	state_change: ContractReceiveChannelClosed,
) -> MediatorTransition {
	let mut state = match mediator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	let secret = state.secret.clone();
	let mut events: Vec<Event> = vec![];

	for pair in state.pairs.iter_mut() {
		if pair.payer_route.channel_identifier != state_change.channel_identifier ||
			pair.state.is_final()
		{
			continue
		}
		pair.state = PairState::PayerClosed;
		pair.payer_route.closed_block = Some(state_change.block_number);

		if let Some(secret) = secret.clone() {
			events.push(
				ContractSendWithdraw {
					channel_identifier: pair.payer_route.channel_identifier,
					secret,
					triggered_by_block: state_change.block_number,
				}
				.into(),
			);
		}
	}

	Ok(Transition { new_state: Some(state), events })
}

/// Retires pairs whose payer channel settled on-chain.
fn handle_channel_settled(
	mediator_state: Option<MediatorState>,
	state_change: ContractReceiveChannelSettled,
) -> MediatorTransition {
	let mut state = match mediator_state {
		Some(state) => state,
		None => return Ok(Transition { new_state: None, events: vec![] }),
	};

	state
		.pairs
		.retain(|pair| pair.payer_route.channel_identifier != state_change.channel_identifier);

	if state.pairs.is_empty() {
		return Ok(Transition { new_state: None, events: vec![] })
	}
	clear_if_finalized(Transition { new_state: Some(state), events: vec![] })
}

/// State machine for a payment's mediator node.
pub fn state_transition(
	mediator_state: Option<MediatorState>,
	state_change: StateChange,
) -> MediatorTransition {
	if let Some(state) = &mediator_state {
		sanity_check(state)?;
	}

	match state_change {
		StateChange::ActionInitMediator(inner) => handle_init(mediator_state, inner),
		StateChange::ReceiveAnnounceDisposed(inner) =>
			handle_announce_disposed(mediator_state, inner),
		StateChange::ReceiveSecretReveal(inner) => handle_secret_reveal(mediator_state, inner),
		StateChange::ContractReceiveSecretReveal(inner) =>
			handle_contract_secret_reveal(mediator_state, inner),
		StateChange::ReceiveBalanceProof(inner) => handle_balance_proof(mediator_state, inner),
		StateChange::Block(inner) => handle_block(mediator_state, inner),
		StateChange::ContractReceiveChannelClosed(inner) =>
			handle_channel_closed(mediator_state, inner),
		StateChange::ContractReceiveChannelSettled(inner) =>
			handle_channel_settled(mediator_state, inner),
		_ => Ok(Transition { new_state: mediator_state, events: vec![] }),
	}
}
