pub use web3::types::{
	Address,
	Bytes,
	Log,
	H160,
	H256,
	U256,
	U64,
};

pub type BlockExpiration = U64;

pub type BlockNumber = U64;

pub type BlockHash = H256;

pub type BlockTimeout = U64;

pub type ChannelIdentifier = U256;

pub type Locksroot = H256;

pub type MessageIdentifier = u64;

pub type Nonce = u64;

pub type RevealTimeout = U64;

pub type Secret = Bytes;

pub type SecretHash = H256;

pub type SettleTimeout = U64;

pub type TokenAddress = Address;

pub type TokenAmount = U256;

pub type TransactionHash = H256;
