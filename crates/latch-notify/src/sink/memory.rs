// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use latch_core::{Event, EventAction};
use parking_lot::Mutex;

use super::AuditSink;
use crate::error::ListenerError;

/// Keeps published events in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
	events: Mutex<Vec<Arc<Event>>>,
}

impl MemoryAuditSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<Arc<Event>> {
		self.events.lock().clone()
	}

	pub fn events_for(&self, target_id: &str) -> Vec<Arc<Event>> {
		self.events
			.lock()
			.iter()
			.filter(|e| e.target_id == target_id)
			.cloned()
			.collect()
	}

	pub fn actions(&self) -> Vec<EventAction> {
		self.events.lock().iter().map(|e| e.action).collect()
	}

	pub fn len(&self) -> usize {
		self.events.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.lock().is_empty()
	}

	pub fn clear(&self) {
		self.events.lock().clear();
	}
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
	fn name(&self) -> &str {
		"memory"
	}

	async fn publish(&self, event: Arc<Event>) -> Result<(), ListenerError> {
		self.events.lock().push(event);
		Ok(())
	}
}
