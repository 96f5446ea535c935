use circuit_primitives::{
	constants::LOCKSROOT_OF_NO_LOCKS,
	types::BlockExpiration,
};

use crate::{
	machine::target,
	tests::factories::{
		make_init_target,
		make_secret,
		unit_amount,
		Keyring,
		UNIT_BLOCK_NUMBER,
		UNIT_REVEAL_TIMEOUT,
	},
	types::{
		Block,
		Event,
		ReceiveBalanceProof,
		ReceiveSecretReveal,
		TargetPhase,
		TargetState,
	},
};

fn setup_target() -> TargetState {
	let init = make_init_target(1);
	let result = target::state_transition(None, init.into()).expect("Init should succeed");
	result.new_state.expect("State should be created")
}

fn setup_target_with_secret() -> TargetState {
	let state = setup_target();
	let reveal = ReceiveSecretReveal { sender: Keyring::Hop1.address(), secret: make_secret(1) };
	let result =
		target::state_transition(Some(state), reveal.into()).expect("Should succeed");
	result.new_state.expect("State should be kept")
}

#[test]
fn test_init_requests_secret() {
	let init = make_init_target(1);
	let result = target::state_transition(None, init.into()).expect("Init should succeed");
	let state = result.new_state.expect("State should be created");

	assert_eq!(state.state, TargetPhase::SecretRequestSent);
	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::SendSecretRequest(inner) => {
			assert_eq!(inner.recipient, Keyring::Hop4.address());
			assert_eq!(inner.amount, unit_amount());
			assert_eq!(inner.secrethash, state.secrethash);
		},
		_ => panic!("Expected a secret request to the initiator"),
	}
}

#[test]
fn test_init_with_wrong_target_is_dropped() {
	let mut init = make_init_target(1);
	init.transfer.target = Keyring::Hop3.address();

	let result = target::state_transition(None, init.into()).expect("Should succeed");

	assert!(result.new_state.is_none());
	assert_eq!(result.events, vec![]);
}

#[test]
fn test_init_with_unsafe_expiration_waits() {
	let mut init = make_init_target(1);
	init.transfer.expiration = BlockExpiration::from(UNIT_BLOCK_NUMBER + UNIT_REVEAL_TIMEOUT);

	let result = target::state_transition(None, init.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be tracked anyway");

	assert_eq!(state.state, TargetPhase::WaitingForTransfer);
	assert_eq!(result.events, vec![]);
}

#[test]
fn test_secret_reveal_is_stored_and_echoed() {
	let state = setup_target();

	let reveal = ReceiveSecretReveal { sender: Keyring::Hop1.address(), secret: make_secret(1) };
	let result =
		target::state_transition(Some(state), reveal.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be kept");

	assert_eq!(state.state, TargetPhase::SecretRevealed);
	assert_eq!(state.secret, Some(make_secret(1)));
	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::SendSecretReveal(inner) => {
			assert_eq!(inner.recipient, Keyring::Hop1.address());
			assert_eq!(inner.secret, make_secret(1));
		},
		_ => panic!("Expected a secret reveal back to the payer hop"),
	}
}

#[test]
fn test_secret_reveal_rogue_sender_is_dropped() {
	let state = setup_target();

	let reveal = ReceiveSecretReveal { sender: Keyring::Hop3.address(), secret: make_secret(1) };
	let result = target::state_transition(Some(state.clone()), reveal.into())
		.expect("Should succeed");

	assert_eq!(result.events, vec![]);
	assert_eq!(result.new_state, Some(state));
}

#[test]
fn test_balance_proof_finalizes_payment() {
	let state = setup_target_with_secret();

	let balance_proof = ReceiveBalanceProof {
		sender: Keyring::Hop1.address(),
		channel_identifier: state.route.channel_identifier,
		nonce: state.transfer.nonce + 1,
		transferred_amount: unit_amount(),
		locksroot: *LOCKSROOT_OF_NO_LOCKS,
		secrethash: state.secrethash,
	};
	let result = target::state_transition(Some(state), balance_proof.into())
		.expect("Should succeed");

	assert!(result.new_state.is_none());
	assert_eq!(result.events.len(), 2);
	assert!(matches!(result.events[0], Event::UnlockSuccess { .. }));
	assert!(matches!(result.events[1], Event::PaymentReceivedSuccess { .. }));
}

#[test]
fn test_balance_proof_with_stale_nonce_is_dropped() {
	let state = setup_target_with_secret();

	let balance_proof = ReceiveBalanceProof {
		sender: Keyring::Hop1.address(),
		channel_identifier: state.route.channel_identifier,
		nonce: state.transfer.nonce,
		transferred_amount: unit_amount(),
		locksroot: *LOCKSROOT_OF_NO_LOCKS,
		secrethash: state.secrethash,
	};
	let result = target::state_transition(Some(state.clone()), balance_proof.into())
		.expect("Should succeed");

	assert_eq!(result.events, vec![]);
	assert_eq!(result.new_state, Some(state));
}

#[test]
fn test_expiry_without_secret_fails() {
	let state = setup_target();
	let expiration = state.transfer.expiration;

	let block = Block { block_number: expiration - UNIT_REVEAL_TIMEOUT };
	let result =
		target::state_transition(Some(state), block.into()).expect("Should succeed");

	assert!(result.new_state.is_none());
	assert_eq!(result.events.len(), 1);
	assert!(matches!(result.events[0], Event::ErrorUnlockFailed { .. }));
}

#[test]
fn test_danger_zone_with_secret_closes_channel_once() {
	let state = setup_target_with_secret();
	let expiration = state.transfer.expiration;
	let channel_identifier = state.route.channel_identifier;

	let block = Block { block_number: expiration - UNIT_REVEAL_TIMEOUT };
	let result =
		target::state_transition(Some(state), block.into()).expect("Should succeed");
	let state = result.new_state.expect("State should be kept");

	assert_eq!(result.events.len(), 1);
	match &result.events[0] {
		Event::ContractSendChannelClose(inner) => {
			assert_eq!(inner.channel_identifier, channel_identifier)
		},
		_ => panic!("Expected a channel close"),
	}

	// The next block must not re-issue the close.
	let block = Block { block_number: expiration - UNIT_REVEAL_TIMEOUT + 1 };
	let result =
		target::state_transition(Some(state), block.into()).expect("Should succeed");
	assert_eq!(result.events, vec![]);
	assert!(result.new_state.is_some());
}
