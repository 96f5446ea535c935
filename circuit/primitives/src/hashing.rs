use web3::signing::keccak256;

use crate::types::{
	Locksroot,
	SecretHash,
	TokenAmount,
};

/// Hashes a secret preimage into the lock's secret hash.
pub fn hash_secret(secret: &[u8]) -> SecretHash {
	SecretHash::from_slice(&keccak256(secret))
}

/// Computes the root of a channel's pending locks.
///
/// Locks are encoded as `expiration || amount || secrethash` in the order
/// they were created.
pub fn compute_locksroot(locks: &[(u64, TokenAmount, SecretHash)]) -> Locksroot {
	let mut encoded = vec![];
	for (expiration, amount, secrethash) in locks {
		let mut amount_bytes = [0u8; 32];
		amount.to_big_endian(&mut amount_bytes);
		encoded.extend_from_slice(&expiration.to_be_bytes());
		encoded.extend_from_slice(&amount_bytes);
		encoded.extend_from_slice(secrethash.as_bytes());
	}
	Locksroot::from_slice(&keccak256(&encoded))
}
