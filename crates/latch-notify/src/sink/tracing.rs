// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use latch_core::{Event, EventAction};

use super::AuditSink;
use crate::error::ListenerError;

/// Writes audit events to the `latch_audit` tracing target.
///
/// Toggle hits are logged at debug level, everything else at info.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn publish(&self, event: Arc<Event>) -> Result<(), ListenerError> {
		let id = event.id.to_string();
		let timestamp = event.timestamp.to_rfc3339();
		let action = event.action.to_string();
		let scope = event.scope.to_string();
		let source = event.source.as_str();
		let target_id = event.target_id.as_str();
		let user = event.user.as_deref();
		let duration_ms = event.duration_ms;
		let value = event.value.as_deref();

		if event.action == EventAction::Hit {
			::tracing::debug!(
				target: "latch_audit",
				id,
				timestamp,
				action,
				scope,
				source,
				target_id,
				user,
				duration_ms,
				value,
				"audit event"
			);
		} else {
			::tracing::info!(
				target: "latch_audit",
				id,
				timestamp,
				action,
				scope,
				source,
				target_id,
				user,
				duration_ms,
				value,
				"audit event"
			);
		}
		Ok(())
	}
}
