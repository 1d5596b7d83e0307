// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Named listeners behind a read-write lock.
pub struct ListenerRegistry<L: ?Sized> {
	listeners: RwLock<BTreeMap<String, Arc<L>>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
	pub fn new() -> Self {
		Self {
			listeners: RwLock::new(BTreeMap::new()),
		}
	}

	/// Registers `listener` under `name`, returning the one it replaced.
	pub fn register(&self, name: impl Into<String>, listener: Arc<L>) -> Option<Arc<L>> {
		self.listeners.write().insert(name.into(), listener)
	}

	pub fn unregister(&self, name: &str) -> bool {
		self.listeners.write().remove(name).is_some()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.listeners.read().contains_key(name)
	}

	/// Copies the current listeners out so the lock is not held while they
	/// run.
	pub fn snapshot(&self) -> Vec<(String, Arc<L>)> {
		self.listeners
			.read()
			.iter()
			.map(|(name, listener)| (name.clone(), Arc::clone(listener)))
			.collect()
	}

	pub fn names(&self) -> Vec<String> {
		self.listeners.read().keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.listeners.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.listeners.read().is_empty()
	}
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
	fn default() -> Self {
		Self::new()
	}
}
