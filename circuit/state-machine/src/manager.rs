#![warn(clippy::missing_docs_in_private_items)]

//! The generic driver owning one machine's state.
//!
//! A manager applies state changes strictly sequentially, persists a
//! snapshot after every transition (write-through) and appends emitted
//! events to a durable log keyed by `(manager_id, sequence)` so dispatchers
//! can re-deliver outstanding intents after a crash. Restoring loads the
//! snapshot only: state changes are not replayed and events are never
//! re-emitted by the core.

use std::sync::Arc;

use circuit_storage::{
	types::StorageError,
	StateStorage,
};
use serde::{
	de::DeserializeOwned,
	Serialize,
};
use tracing::error;

use crate::{
	errors::StateTransitionError,
	machine::TransitionResult,
	types::{
		ErrorInvariantViolation,
		ErrorUnexpectedStateChange,
		Event,
		StateChange,
	},
};

/// Result of a manager dispatch.
pub type Result<T> = std::result::Result<T, StateTransitionError>;

/// A pure transition function: same `(state, change)` always yields the
/// same `(state', events)`.
pub type TransitionFn<S> = fn(Option<S>, StateChange) -> TransitionResult<S>;

/// Drives one state machine: holds the current state, applies state changes
/// through the transition function and persists the outcome.
pub struct StateManager<S> {
	pub storage: Arc<StateStorage>,
	pub current_state: Option<S>,
	/// Identifier scoping this machine's records in storage.
	manager_id: String,
	/// The machine's pure transition function.
	transition: TransitionFn<S>,
	/// Set once a transition returned `None`; the machine is done.
	stopped: bool,
	/// Sequence number of the next event appended to the log.
	event_sequence: u64,
}

impl<S> StateManager<S>
where
	S: Clone + Serialize + DeserializeOwned,
{
	/// Creates a manager for a machine that has not run yet.
	pub fn new(storage: Arc<StateStorage>, manager_id: String, transition: TransitionFn<S>) -> Self {
		Self {
			storage,
			current_state: None,
			manager_id,
			transition,
			stopped: false,
			event_sequence: 0,
		}
	}

	/// Restores a manager from its latest snapshot.
	///
	/// No state changes are replayed; the machine resumes at the next
	/// dispatched state change. Re-emission of outstanding events is the
	/// dispatcher's responsibility via the event log.
	pub fn restore(
		storage: Arc<StateStorage>,
		manager_id: String,
		transition: TransitionFn<S>,
	) -> std::result::Result<Self, StorageError> {
		let snapshot = storage.get_latest_snapshot(&manager_id)?;
		let current_state: Option<S> =
			serde_json::from_str(&snapshot.data).map_err(StorageError::Serialization)?;
		let event_sequence = storage.next_event_sequence(&manager_id)?;
		let stopped = current_state.is_none();

		Ok(Self { storage, current_state, manager_id, transition, stopped, event_sequence })
	}

	/// True once the machine completed and rejects further state changes.
	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// Applies one state change to completion and returns the emitted
	/// events, in order.
	///
	/// An invariant violation leaves the state untouched: it is logged, a
	/// diagnostic event is appended to the durable log and the error is
	/// returned to the caller as the process-level alarm.
	pub fn dispatch(&mut self, state_change: StateChange) -> Result<Vec<Event>> {
		if self.stopped {
			let notice = ErrorUnexpectedStateChange {
				reason: "Machine has terminated, state change ignored".to_owned(),
			};
			return Ok(vec![notice.into()])
		}

		match (self.transition)(self.current_state.clone(), state_change.clone()) {
			Ok(transition) => {
				self.stopped = transition.new_state.is_none();
				self.current_state = transition.new_state;
				self.persist(&state_change, &transition.events)?;
				Ok(transition.events)
			},
			Err(e) => {
				error!(
					manager_id = %self.manager_id,
					error = %e,
					"Invariant violation, state left unchanged"
				);
				let diagnostic: Event = ErrorInvariantViolation { reason: e.msg.clone() }.into();
				self.persist(&state_change, &[diagnostic])?;
				Err(e)
			},
		}
	}

	/// Write-through persistence of one dispatch outcome.
	fn persist(&mut self, state_change: &StateChange, events: &[Event]) -> Result<()> {
		let state_change_id = self
			.storage
			.store_state_change(&self.manager_id, state_change)
			.map_err(|e| StateTransitionError { msg: format!("Could not store state change: {}", e) })?;

		self.storage
			.store_snapshot(&self.manager_id, &self.current_state)
			.map_err(|e| StateTransitionError { msg: format!("Could not store snapshot: {}", e) })?;

		if !events.is_empty() {
			self.storage
				.store_events(&self.manager_id, state_change_id, self.event_sequence, events)
				.map_err(|e| StateTransitionError { msg: format!("Could not store events: {}", e) })?;
			self.event_sequence += events.len() as u64;
		}

		Ok(())
	}
}
