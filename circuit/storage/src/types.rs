#![warn(clippy::missing_docs_in_private_items)]

use std::convert::TryFrom;

use chrono::NaiveDateTime;
use derive_more::Display;
use ulid::{
	DecodeError,
	Ulid,
};

/// Result of a storage operation.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error type.
#[derive(Display, Debug)]
pub enum StorageError {
	#[display(fmt = "Storage lock poisoned")]
	CannotLock,
	#[display(fmt = "Cannot serialize for storage: {}", _0)]
	Serialization(serde_json::Error),
	#[display(fmt = "SQL error: {}", _0)]
	Sql(rusqlite::Error),
	#[display(fmt = "Cannot convert value to Ulid: {}", _0)]
	ID(DecodeError),
	#[display(fmt = "Error: {}", _0)]
	Other(&'static str),
}

/// Identifier of a stored record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageID {
	pub(crate) inner: Ulid,
}

impl StorageID {
	/// Returns the zero identifier, ordered before every other.
	pub fn zero() -> Self {
		Self { inner: Ulid::nil() }
	}

	/// Returns the maximum possible identifier.
	pub fn max() -> Self {
		Self { inner: u128::MAX.into() }
	}
}

impl std::fmt::Display for StorageID {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.inner)
	}
}

impl From<Ulid> for StorageID {
	fn from(id: Ulid) -> Self {
		Self { inner: id }
	}
}

impl From<StorageID> for String {
	fn from(id: StorageID) -> Self {
		id.inner.to_string()
	}
}

impl TryFrom<String> for StorageID {
	type Error = StorageError;

	fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
		Ok(Self { inner: Ulid::from_string(&value).map_err(StorageError::ID)? })
	}
}

/// A stored state change.
#[derive(Clone, Debug)]
pub struct StateChangeRecord {
	pub identifier: StorageID,
	pub manager_id: String,
	pub data: String,
}

/// A stored side-effect intent, keyed by `(manager_id, sequence)`.
#[derive(Clone, Debug)]
pub struct EventRecord {
	pub identifier: StorageID,
	pub manager_id: String,
	pub sequence: u64,
	pub source_state_change: StorageID,
	pub data: String,
	pub timestamp: NaiveDateTime,
}

/// A stored state snapshot.
#[derive(Clone, Debug)]
pub struct SnapshotRecord {
	pub identifier: StorageID,
	pub manager_id: String,
	pub data: String,
}
