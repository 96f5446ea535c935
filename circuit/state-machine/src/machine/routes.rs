#![warn(clippy::missing_docs_in_private_items)]

use crate::types::{
	Route,
	RouteSet,
};

impl RouteSet {
	/// Tries available routes in order until one satisfies `predicate`.
	///
	/// Heads failing the predicate move to `ignored`; the first passing
	/// route becomes `current` and is returned. The previous current route
	/// must have been retired through `cancel_current` or `refund_current`
	/// beforehand; partitions stay disjoint.
	pub fn try_next<P>(&mut self, predicate: P) -> Option<Route>
	where
		P: Fn(&Route) -> bool,
	{
		while !self.available.is_empty() {
			let route = self.available.remove(0);
			if predicate(&route) {
				self.current = Some(route.clone());
				return Some(route)
			}
			self.ignored.push(route);
		}
		None
	}

	/// Moves the current route into the canceled partition.
	pub fn cancel_current(&mut self) {
		if let Some(route) = self.current.take() {
			self.canceled.push(route);
		}
	}

	/// Moves the current route into the refunded partition.
	pub fn refund_current(&mut self) {
		if let Some(route) = self.current.take() {
			self.refunded.push(route);
		}
	}

	/// Moves every remaining available route into the ignored partition.
	pub fn ignore_remaining(&mut self) {
		self.ignored.append(&mut self.available);
	}

	/// Number of routes not yet tried.
	pub fn available_count(&self) -> usize {
		self.available.len()
	}
}
