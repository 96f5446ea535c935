use circuit_primitives::types::TokenAmount;

use crate::{
	machine::mediator,
	tests::factories::{
		make_init_mediator,
		make_route,
		make_secret,
		unit_amount,
		Keyring,
		UNIT_REVEAL_TIMEOUT,
	},
	types::{
		Block,
		ContractReceiveChannelClosed,
		ContractReceiveChannelSettled,
		ContractReceiveSecretReveal,
		Event,
		MediatorState,
		PairState,
		ReceiveAnnounceDisposed,
		ReceiveBalanceProof,
		ReceiveSecretReveal,
	},
};

fn setup_mediator() -> MediatorState {
	let routes = vec![make_route(Keyring::Hop2, unit_amount(), 2)];
	let init = make_init_mediator(routes, 1);
	let result = mediator::state_transition(None, init.into()).expect("Init should succeed");
	result.new_state.expect("State should be created")
}

/// Drives a fresh mediator to the point where the payee revealed the secret.
fn setup_mediator_with_secret() -> MediatorState {
	let state = setup_mediator();
	let reveal = ReceiveSecretReveal { sender: Keyring::Hop2.address(), secret: make_secret(1) };
	let result =
		mediator::state_transition(Some(state), reveal.into()).expect("Should succeed");
	result.new_state.expect("State should be kept")
}

#[test]
fn test_init_forwards_transfer() {
	let routes = vec![make_route(Keyring::Hop2, unit_amount(), 2)];
	let init = make_init_mediator(routes, 1);
	let payer_expiration = init.from_transfer.expiration;

	let result =
		mediator::state_transition(None, init.into()).expect("Init should succeed");
	let state = result.new_state.expect("State should be created");

	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::SendLockedTransfer(inner) => {
			assert_eq!(inner.recipient, Keyring::Hop2.address());
			assert_eq!(inner.transfer.amount, unit_amount());
			assert_eq!(inner.transfer.expiration, payer_expiration - UNIT_REVEAL_TIMEOUT);
			assert_eq!(inner.transfer.secrethash, state.secrethash);
		},
		_ => panic!("Expected a forwarded locked transfer"),
	}

	assert_eq!(state.pairs.len(), 1);
	assert_eq!(state.pairs[0].state, PairState::PayerPending);
	assert_eq!(state.pairs[0].payer_transfer.amount, state.pairs[0].payee_transfer.amount);
}

#[test]
fn test_init_without_usable_route_refuses_upstream() {
	// Not enough balance towards the only payee candidate.
	let routes = vec![make_route(Keyring::Hop2, unit_amount() - TokenAmount::from(1), 2)];
	let init = make_init_mediator(routes, 1);

	let result =
		mediator::state_transition(None, init.into()).expect("Init should succeed");

	assert!(result.new_state.is_none());
	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::SendAnnounceDisposed(inner) => assert_eq!(inner.recipient, Keyring::Hop1.address()),
		_ => panic!("Expected an announce disposed to the payer"),
	}
}

#[test]
fn test_refund_tries_next_route() {
	let routes =
		vec![make_route(Keyring::Hop2, unit_amount(), 2), make_route(Keyring::Hop3, unit_amount(), 3)];
	let init = make_init_mediator(routes.clone(), 1);
	let result =
		mediator::state_transition(None, init.into()).expect("Init should succeed");
	let state = result.new_state.expect("State should be created");

	let payee_transfer = state.pairs[0].payee_transfer.clone();
	let disposed =
		ReceiveAnnounceDisposed { sender: Keyring::Hop2.address(), transfer: payee_transfer };
	let result =
		mediator::state_transition(Some(state), disposed.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be kept");

	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::SendLockedTransfer(inner) => assert_eq!(inner.recipient, Keyring::Hop3.address()),
		_ => panic!("Expected a locked transfer on the alternative route"),
	}

	assert_eq!(state.pairs.len(), 2);
	assert_eq!(state.pairs[0].state, PairState::PayeeRefund);
	assert_eq!(state.pairs[1].state, PairState::PayerPending);
	assert_eq!(state.routes.canceled, vec![routes[0].clone()]);
}

#[test]
fn test_refund_without_alternatives_propagates_upstream() {
	let state = setup_mediator();

	let payee_transfer = state.pairs[0].payee_transfer.clone();
	let disposed =
		ReceiveAnnounceDisposed { sender: Keyring::Hop2.address(), transfer: payee_transfer };
	let result =
		mediator::state_transition(Some(state), disposed.into()).expect("Should succeed");

	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::SendAnnounceDisposed(inner) => assert_eq!(inner.recipient, Keyring::Hop1.address()),
		_ => panic!("Expected an announce disposed to the payer"),
	}
	// All pairs refunded, nothing left to mediate.
	assert!(result.new_state.is_none());
}

#[test]
fn test_secret_reveal_propagates_to_payer() {
	let state = setup_mediator();

	let reveal = ReceiveSecretReveal { sender: Keyring::Hop2.address(), secret: make_secret(1) };
	let result =
		mediator::state_transition(Some(state), reveal.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be kept");

	assert_eq!(state.secret, Some(make_secret(1)));
	assert_eq!(state.pairs[0].state, PairState::PayeeSecretRevealed);
	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::SendSecretReveal(inner) => {
			assert_eq!(inner.recipient, Keyring::Hop1.address());
			assert_eq!(inner.secret, make_secret(1));
		},
		_ => panic!("Expected a secret reveal to the payer"),
	}
}

#[test]
fn test_secret_reveal_wrong_secret_is_dropped() {
	let state = setup_mediator();

	let reveal = ReceiveSecretReveal { sender: Keyring::Hop2.address(), secret: make_secret(9) };
	let result = mediator::state_transition(Some(state.clone()), reveal.into())
		.expect("Should succeed");

	assert_eq!(result.events, vec![]);
	assert_eq!(result.new_state, Some(state));
}

#[test]
fn test_secret_reveal_from_stranger_is_dropped() {
	let state = setup_mediator();

	let reveal = ReceiveSecretReveal { sender: Keyring::Hop4.address(), secret: make_secret(1) };
	let result = mediator::state_transition(Some(state.clone()), reveal.into())
		.expect("Should succeed");

	assert_eq!(result.events, vec![]);
	assert_eq!(result.new_state, Some(state));
}

#[test]
fn test_onchain_secret_reveal_propagates_to_payer() {
	let state = setup_mediator();
	let secrethash = state.secrethash;
	let block_number = state.block_number;

	let reveal =
		ContractReceiveSecretReveal { secret: make_secret(1), secrethash, block_number };
	let result =
		mediator::state_transition(Some(state), reveal.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be kept");

	assert_eq!(state.secret, Some(make_secret(1)));
	assert_eq!(result.events.len(), 1);
	assert!(matches!(result.events[0], Event::SendSecretReveal { .. }));
}

#[test]
fn test_balance_proof_releases_payee_leg() {
	let state = setup_mediator_with_secret();
	let payer_nonce = state.pairs[0].payer_transfer.nonce;

	let balance_proof = ReceiveBalanceProof {
		sender: Keyring::Hop1.address(),
		channel_identifier: state.pairs[0].payer_route.channel_identifier,
		nonce: payer_nonce + 1,
		transferred_amount: unit_amount(),
		locksroot: Default::default(),
		secrethash: state.secrethash,
	};
	let result = mediator::state_transition(Some(state), balance_proof.into())
		.expect("Should succeed");

	assert_eq!(result.events.len(), 2);
	match &result.events[0] {
		Event::SendBalanceProof(inner) => {
			assert_eq!(inner.recipient, Keyring::Hop2.address());
			assert_eq!(inner.transferred_amount, unit_amount());
		},
		_ => panic!("Expected a balance proof to the payee"),
	}
	assert!(matches!(result.events[1], Event::UnlockSuccess { .. }));
	// The only pair finished, the machine is done.
	assert!(result.new_state.is_none());
}

#[test]
fn test_balance_proof_before_reveal_is_dropped() {
	let state = setup_mediator();

	let balance_proof = ReceiveBalanceProof {
		sender: Keyring::Hop1.address(),
		channel_identifier: state.pairs[0].payer_route.channel_identifier,
		nonce: state.pairs[0].payer_transfer.nonce + 1,
		transferred_amount: unit_amount(),
		locksroot: Default::default(),
		secrethash: state.secrethash,
	};
	let result = mediator::state_transition(Some(state.clone()), balance_proof.into())
		.expect("Should succeed");

	assert_eq!(result.events, vec![]);
	assert_eq!(result.new_state, Some(state));
}

#[test]
fn test_unlock_deadline_closes_payer_channel_when_secret_known() {
	let state = setup_mediator_with_secret();
	let payer_expiration = state.pairs[0].payer_transfer.expiration;
	let payer_channel = state.pairs[0].payer_route.channel_identifier;

	let block = Block { block_number: payer_expiration - UNIT_REVEAL_TIMEOUT };
	let result =
		mediator::state_transition(Some(state), block.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be kept");

	assert_eq!(state.pairs[0].state, PairState::PayerExpired);
	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::ContractSendChannelClose(inner) => {
			assert_eq!(inner.channel_identifier, payer_channel)
		},
		_ => panic!("Expected a channel close"),
	}
}

#[test]
fn test_unlock_deadline_waits_without_secret() {
	let state = setup_mediator();
	let payer_expiration = state.pairs[0].payer_transfer.expiration;

	// The payer danger zone is entered, but without the secret closing the
	// channel achieves nothing; only the payee leg expires.
	let block = Block { block_number: payer_expiration - UNIT_REVEAL_TIMEOUT };
	let result =
		mediator::state_transition(Some(state), block.into()).expect("Should succeed");

	assert!(!result
		.events
		.iter()
		.any(|event| matches!(event, Event::ContractSendChannelClose { .. })));
	assert_eq!(result.events.len(), 1);
	assert!(matches!(result.events[0], Event::ErrorUnlockFailed { .. }));
}

#[test]
fn test_payee_lock_expires() {
	let state = setup_mediator();
	let payee_expiration = state.pairs[0].payee_transfer.expiration;

	let block = Block { block_number: payee_expiration };
	let result =
		mediator::state_transition(Some(state), block.into()).expect("Should succeed");

	assert_eq!(result.events.len(), 1);
	assert!(matches!(result.events[0], Event::ErrorUnlockFailed { .. }));
	// The only pair expired, the machine is done.
	assert!(result.new_state.is_none());
}

#[test]
fn test_payer_channel_closed_withdraws_with_secret() {
	let state = setup_mediator_with_secret();
	let payer_channel = state.pairs[0].payer_route.channel_identifier;
	let block_number = state.block_number;

	let closed =
		ContractReceiveChannelClosed { channel_identifier: payer_channel, block_number };
	let result =
		mediator::state_transition(Some(state), closed.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be kept");

	assert_eq!(state.pairs[0].state, PairState::PayerClosed);
	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::ContractSendWithdraw(inner) => {
			assert_eq!(inner.channel_identifier, payer_channel);
			assert_eq!(inner.secret, make_secret(1));
		},
		_ => panic!("Expected an on-chain withdraw"),
	}
}

#[test]
fn test_payer_channel_closed_without_secret_waits() {
	let state = setup_mediator();
	let payer_channel = state.pairs[0].payer_route.channel_identifier;
	let block_number = state.block_number;

	let closed =
		ContractReceiveChannelClosed { channel_identifier: payer_channel, block_number };
	let result =
		mediator::state_transition(Some(state), closed.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be kept");

	assert_eq!(state.pairs[0].state, PairState::PayerClosed);
	assert!(result.events.is_empty());
}

#[test]
fn test_payer_channel_settled_retires_pair() {
	let state = setup_mediator();
	let payer_channel = state.pairs[0].payer_route.channel_identifier;
	let block_number = state.block_number;

	let settled =
		ContractReceiveChannelSettled { channel_identifier: payer_channel, block_number };
	let result =
		mediator::state_transition(Some(state), settled.into()).expect("Should succeed");

	assert!(result.events.is_empty());
	assert!(result.new_state.is_none());
}

#[test]
fn test_mismatched_pair_amounts_raise_alarm() {
	let mut state = setup_mediator();
	state.pairs[0].payee_transfer.amount = unit_amount() - TokenAmount::from(1);

	let block = Block { block_number: state.block_number + 1 };
	let result = mediator::state_transition(Some(state), block.into());

	assert!(result.is_err());
}
