#![warn(clippy::missing_docs_in_private_items)]

//! Durable storage for circuit state machines.
//!
//! Every state machine is owned by exactly one manager; storage records are
//! scoped by the manager's identifier. Snapshots are written through after
//! every transition, events are appended to a log keyed by
//! `(manager_id, sequence)` so dispatchers can re-deliver outstanding intents
//! after a crash.

use std::{
	convert::TryInto,
	sync::Mutex,
};

pub use chrono::NaiveDateTime;
use chrono::Utc;
use rusqlite::{
	params,
	Connection,
};
use serde::Serialize;
use ulid::Ulid;

use self::types::{
	EventRecord,
	Result,
	SnapshotRecord,
	StateChangeRecord,
	StorageError,
	StorageID,
};

/// Sqlite schema constants.
mod sqlite;
pub mod types;

/// Storage interface for machine state, state changes and emitted events.
pub struct StateStorage {
	/// The rusqlite connection.
	conn: Mutex<Connection>,
}

impl StateStorage {
	/// Create an instance of `StateStorage`.
	pub fn new(conn: Connection) -> Self {
		Self { conn: Mutex::new(conn) }
	}

	/// Create tables if not already created.
	pub fn setup_database(&self) -> Result<()> {
		let setup_db_sql = format!(
			"
			PRAGMA foreign_keys=off;
			BEGIN TRANSACTION;
			{}{}{}
			COMMIT;
			PRAGMA foreign_keys=on;
			",
			sqlite::DB_CREATE_STATE_CHANGES,
			sqlite::DB_CREATE_SNAPSHOT,
			sqlite::DB_CREATE_STATE_EVENTS,
		);
		self.conn
			.lock()
			.map_err(|_| StorageError::CannotLock)?
			.execute_batch(&setup_db_sql)
			.map_err(StorageError::Sql)?;

		Ok(())
	}

	/// Store a state snapshot for `manager_id`.
	pub fn store_snapshot<S: Serialize>(&self, manager_id: &str, state: &S) -> Result<()> {
		let serialized_state =
			serde_json::to_string(state).map_err(StorageError::Serialization)?;
		let sql = "INSERT INTO state_snapshot(identifier, manager_id, data) VALUES(?1, ?2, ?3)";
		self.conn
			.lock()
			.map_err(|_| StorageError::CannotLock)?
			.execute(sql, params![Ulid::new().to_string(), manager_id, serialized_state])
			.map_err(StorageError::Sql)?;

		Ok(())
	}

	/// Get the latest snapshot stored for `manager_id`.
	pub fn get_latest_snapshot(&self, manager_id: &str) -> Result<SnapshotRecord> {
		// ULIDs created within the same millisecond do not sort; insertion
		// order is authoritative.
		let sql = "SELECT identifier, manager_id, data
			FROM state_snapshot
			WHERE manager_id = ?1
			ORDER BY rowid DESC
			LIMIT 1";
		let conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;
		let mut stmt = conn.prepare(sql).map_err(StorageError::Sql)?;
		let mut rows = stmt.query(params![manager_id]).map_err(StorageError::Sql)?;
		let row = match rows.next().map_err(StorageError::Sql)? {
			Some(row) => row,
			None => return Err(StorageError::Other("No snapshot found")),
		};

		let identifier: String = row.get(0).map_err(StorageError::Sql)?;
		Ok(SnapshotRecord {
			identifier: identifier.try_into()?,
			manager_id: row.get(1).map_err(StorageError::Sql)?,
			data: row.get(2).map_err(StorageError::Sql)?,
		})
	}

	/// Store a state change for `manager_id`.
	pub fn store_state_change<C: Serialize>(
		&self,
		manager_id: &str,
		state_change: &C,
	) -> Result<StorageID> {
		let serialized_state_change =
			serde_json::to_string(state_change).map_err(StorageError::Serialization)?;
		let sql = "INSERT INTO state_changes(identifier, manager_id, data) VALUES(?1, ?2, ?3)";
		let ulid = Ulid::new();
		self.conn
			.lock()
			.map_err(|_| StorageError::CannotLock)?
			.execute(sql, params![ulid.to_string(), manager_id, serialized_state_change])
			.map_err(StorageError::Sql)?;
		Ok(ulid.into())
	}

	/// Store a list of events emitted by a single dispatch.
	///
	/// `first_sequence` is the sequence number of the first event in the
	/// list; the rest follow consecutively.
	pub fn store_events<E: Serialize>(
		&self,
		manager_id: &str,
		state_change_id: StorageID,
		first_sequence: u64,
		events: &[E],
	) -> Result<()> {
		let conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;

		for (offset, event) in events.iter().enumerate() {
			let serialized_event =
				serde_json::to_string(event).map_err(StorageError::Serialization)?;
			let sql = "INSERT INTO state_events(identifier, manager_id, sequence, \
			           source_statechange_id, data, timestamp) VALUES(?1, ?2, ?3, ?4, ?5, ?6)";
			conn.execute(
				sql,
				params![
					Ulid::new().to_string(),
					manager_id,
					first_sequence + offset as u64,
					state_change_id.to_string(),
					serialized_event,
					Utc::now().naive_local(),
				],
			)
			.map_err(StorageError::Sql)?;
		}
		Ok(())
	}

	/// Return all state changes recorded for `manager_id`, oldest first.
	pub fn get_state_changes(&self, manager_id: &str) -> Result<Vec<StateChangeRecord>> {
		let conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;
		let mut stmt = conn
			.prepare(
				"SELECT identifier, manager_id, data FROM state_changes
				WHERE manager_id = ?1
				ORDER BY rowid ASC",
			)
			.map_err(StorageError::Sql)?;

		let mut rows = stmt.query(params![manager_id]).map_err(StorageError::Sql)?;

		let mut state_changes = vec![];
		while let Ok(Some(row)) = rows.next() {
			let identifier: String = row.get(0).map_err(StorageError::Sql)?;
			state_changes.push(StateChangeRecord {
				identifier: identifier.try_into()?,
				manager_id: row.get(1).map_err(StorageError::Sql)?,
				data: row.get(2).map_err(StorageError::Sql)?,
			})
		}

		Ok(state_changes)
	}

	/// Return the next unused event sequence number for `manager_id`.
	pub fn next_event_sequence(&self, manager_id: &str) -> Result<u64> {
		let conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;
		let mut stmt = conn
			.prepare("SELECT MAX(sequence) FROM state_events WHERE manager_id = ?1")
			.map_err(StorageError::Sql)?;
		let max: Option<u64> =
			stmt.query_row(params![manager_id], |row| row.get(0)).map_err(StorageError::Sql)?;
		Ok(max.map(|s| s + 1).unwrap_or(0))
	}

	/// Return the events logged for `manager_id` starting at `from_sequence`.
	pub fn get_events_from(&self, manager_id: &str, from_sequence: u64) -> Result<Vec<EventRecord>> {
		let conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;
		let mut stmt = conn
			.prepare(
				"SELECT identifier, manager_id, sequence, source_statechange_id, data, timestamp
				FROM state_events
				WHERE manager_id = ?1 AND sequence >= ?2
				ORDER BY sequence ASC",
			)
			.map_err(StorageError::Sql)?;

		let mut rows = stmt.query(params![manager_id, from_sequence]).map_err(StorageError::Sql)?;

		let mut events = vec![];
		while let Ok(Some(row)) = rows.next() {
			let identifier: String = row.get(0).map_err(StorageError::Sql)?;
			let source: String = row.get(3).map_err(StorageError::Sql)?;
			events.push(EventRecord {
				identifier: identifier.try_into()?,
				manager_id: row.get(1).map_err(StorageError::Sql)?,
				sequence: row.get(2).map_err(StorageError::Sql)?,
				source_state_change: source.try_into()?,
				data: row.get(4).map_err(StorageError::Sql)?,
				timestamp: row.get(5).map_err(StorageError::Sql)?,
			})
		}

		Ok(events)
	}
}
