// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod memory;
mod tracing;

use std::sync::Arc;

use async_trait::async_trait;
use latch_core::Event;

use crate::error::ListenerError;

pub use self::memory::MemoryAuditSink;
pub use self::tracing::TracingAuditSink;

/// Destination for audit [`Event`]s.
#[async_trait]
pub trait AuditSink: Send + Sync {
	fn name(&self) -> &str;

	async fn publish(&self, event: Arc<Event>) -> Result<(), ListenerError>;
}
