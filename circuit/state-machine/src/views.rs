#![warn(clippy::missing_docs_in_private_items)]

//! Read-only helpers over the channel read-model.
//!
//! The channel bookkeeping collaborator owns the `ChannelView` values; hosts
//! use these helpers to derive the route candidates handed to the machines.

use circuit_primitives::types::{
	Address,
	SecretHash,
};

use crate::types::{
	ChannelView,
	LockedTransfer,
	Route,
};

/// True while the channel has not been closed on-chain.
pub fn is_channel_open(channel_view: &ChannelView) -> bool {
	channel_view.closed_block.is_none()
}

/// Returns the outstanding lock for `secrethash`, if any.
pub fn get_lock(channel_view: &ChannelView, secrethash: SecretHash) -> Option<&LockedTransfer> {
	channel_view.locks.get(&secrethash)
}

/// True while a lock for `secrethash` is outstanding.
pub fn is_lock_pending(channel_view: &ChannelView, secrethash: SecretHash) -> bool {
	get_lock(channel_view, secrethash).is_some()
}

/// Builds the route candidate describing `hop` reached through this channel.
pub fn route_from_channel(channel_view: &ChannelView, hop: Address) -> Route {
	Route {
		hop,
		channel_identifier: channel_view.channel_identifier,
		available_balance: channel_view.available_balance,
		settle_timeout: channel_view.settle_timeout,
		reveal_timeout: channel_view.reveal_timeout,
		closed_block: channel_view.closed_block,
	}
}
