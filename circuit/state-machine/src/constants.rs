use circuit_primitives::types::{
	ChannelIdentifier,
	U256,
};

/// Channel identifier used on direct (non channel-scoped) messages such as
/// secret requests and secret reveals.
pub const CHANNEL_IDENTIFIER_GLOBAL_QUEUE: ChannelIdentifier = U256([0; 4]);

/// Length in bytes of a valid secret preimage.
pub const SECRET_LENGTH: usize = 32;
