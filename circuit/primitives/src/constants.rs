use lazy_static::lazy_static;
use web3::signing::keccak256;

use crate::types::Locksroot;

pub const MIN_REVEAL_TIMEOUT: u64 = 1;
pub const DEFAULT_REVEAL_TIMEOUT: u64 = 50;
pub const DEFAULT_SETTLE_TIMEOUT: u64 = 500;

lazy_static! {
	/// Locks root of a channel end with no pending locks.
	pub static ref LOCKSROOT_OF_NO_LOCKS: Locksroot = Locksroot::from_slice(&keccak256(&[]));
}
