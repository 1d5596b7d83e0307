// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::trace;

use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::error::ListenerError;
use crate::listener::{FeatureListener, PropertyListener};
use crate::registry::ListenerRegistry;

pub type FeatureNotifier = Notifier<dyn FeatureListener>;
pub type PropertyNotifier = Notifier<dyn PropertyListener>;

/// Fans an event out to every registered listener through a [`Dispatcher`].
///
/// Several notifiers may share one dispatcher so that feature and property
/// events drain through the same worker pool.
pub struct Notifier<L: ?Sized> {
	registry: ListenerRegistry<L>,
	dispatcher: Arc<Dispatcher>,
}

impl<L: ?Sized + Send + Sync + 'static> Notifier<L> {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self {
			registry: ListenerRegistry::new(),
			dispatcher,
		}
	}

	pub fn register(&self, name: impl Into<String>, listener: Arc<L>) -> Option<Arc<L>> {
		self.registry.register(name, listener)
	}

	pub fn unregister(&self, name: &str) -> bool {
		self.registry.unregister(name)
	}

	pub fn registry(&self) -> &ListenerRegistry<L> {
		&self.registry
	}

	pub fn dispatcher(&self) -> &Arc<Dispatcher> {
		&self.dispatcher
	}

	pub fn stats(&self) -> DispatchStats {
		self.dispatcher.stats()
	}

	/// Queues `callback` once per listener and returns immediately with the
	/// number of invocations queued. Failures are only logged.
	pub fn notify<F>(&self, callback: F) -> usize
	where
		F: Fn(Arc<L>) -> BoxFuture<'static, Result<(), ListenerError>>,
	{
		let listeners = self.registry.snapshot();
		if listeners.is_empty() {
			return 0;
		}

		let mut queued = 0;
		for (name, listener) in listeners {
			if self.dispatcher.dispatch(name, callback(listener)) {
				queued += 1;
			}
		}
		trace!(queued, "listeners notified");
		queued
	}
}
