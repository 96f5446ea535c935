use circuit_primitives::{
	hashing::hash_secret,
	types::{
		BlockExpiration,
		BlockNumber,
		BlockTimeout,
		Secret,
		SecretHash,
	},
};

/// Checks a disclosed preimage against the lock's secret hash.
pub(super) fn is_valid_secret_reveal(secret: &Secret, transfer_secrethash: SecretHash) -> bool {
	hash_secret(&secret.0) == transfer_secrethash
}

/// Whether it is still safe to wait for the secret off-chain.
///
/// The lock must have more than `reveal_timeout` blocks left, otherwise the
/// node can no longer guarantee an on-chain claim before expiration.
pub(super) fn is_safe_to_wait(
	lock_expiration: BlockExpiration,
	reveal_timeout: BlockTimeout,
	block_number: BlockNumber,
) -> Result<(), String> {
	if lock_expiration < reveal_timeout {
		return Err("Lock expiration must be larger than reveal timeout".to_owned())
	}
	if block_number >= lock_expiration {
		return Err(format!(
			"Lock already expired. expiration: {} block_number: {}",
			lock_expiration, block_number
		))
	}
	let lock_timeout = lock_expiration - block_number;
	if lock_timeout > reveal_timeout {
		return Ok(())
	}

	Err(format!(
		"Lock timeout is unsafe. \
         Timeout must be larger than {} but it is {}. \
         expiration: {} block_number: {}",
		reveal_timeout, lock_timeout, lock_expiration, block_number
	))
}
