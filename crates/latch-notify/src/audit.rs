// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turns lifecycle callbacks into audit [`Event`]s.

use std::sync::Arc;

use async_trait::async_trait;
use latch_core::{Event, EventAction, EventBuilder, EventScope, ExecutionContext, Feature, Property};
use tracing::warn;

use crate::error::ListenerError;
use crate::listener::{FeatureListener, PropertyListener};
use crate::sink::AuditSink;

const STORE_WIDE: &str = "*";

/// Listener that records every feature and property event to its sinks.
///
/// A failing sink is logged and skipped; the other sinks still receive the
/// event.
pub struct AuditListener {
	source: String,
	sinks: Vec<Arc<dyn AuditSink>>,
}

impl AuditListener {
	pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
		Self {
			source: "latch".to_string(),
			sinks,
		}
	}

	/// Sets the `source` field of emitted events.
	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = source.into();
		self
	}

	pub fn add_sink(&mut self, sink: Arc<dyn AuditSink>) {
		self.sinks.push(sink);
	}

	pub fn sink_names(&self) -> Vec<&str> {
		self.sinks.iter().map(|s| s.name()).collect()
	}

	async fn publish(&self, builder: EventBuilder) -> Result<(), ListenerError> {
		let event = Arc::new(builder.source(self.source.clone()).build());
		for sink in &self.sinks {
			if let Err(e) = sink.publish(Arc::clone(&event)).await {
				warn!(sink = sink.name(), error = %e, "audit sink publish failed");
			}
		}
		Ok(())
	}
}

impl std::fmt::Debug for AuditListener {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuditListener")
			.field("source", &self.source)
			.field("sinks", &self.sink_names())
			.finish()
	}
}

fn feature(action: EventAction, id: &str) -> EventBuilder {
	Event::builder(action, EventScope::Feature, id)
}

fn property(action: EventAction, id: &str) -> EventBuilder {
	Event::builder(action, EventScope::Property, id)
}

#[async_trait]
impl FeatureListener for AuditListener {
	async fn on_create(&self, f: &Feature) -> Result<(), ListenerError> {
		self.publish(feature(EventAction::Create, &f.id).value(f.enabled.to_string()))
			.await
	}

	async fn on_update(&self, f: &Feature) -> Result<(), ListenerError> {
		self.publish(feature(EventAction::Update, &f.id).value(f.enabled.to_string()))
			.await
	}

	async fn on_delete(&self, id: &str) -> Result<(), ListenerError> {
		self.publish(feature(EventAction::Delete, id)).await
	}

	async fn on_delete_all(&self) -> Result<(), ListenerError> {
		self.publish(Event::builder(
			EventAction::DeleteAll,
			EventScope::FeatureStore,
			STORE_WIDE,
		))
		.await
	}

	async fn on_create_schema(&self) -> Result<(), ListenerError> {
		self.publish(Event::builder(
			EventAction::CreateSchema,
			EventScope::FeatureStore,
			STORE_WIDE,
		))
		.await
	}

	async fn on_toggle_on(&self, id: &str) -> Result<(), ListenerError> {
		self.publish(feature(EventAction::ToggleOn, id)).await
	}

	async fn on_toggle_off(&self, id: &str) -> Result<(), ListenerError> {
		self.publish(feature(EventAction::ToggleOff, id)).await
	}

	async fn on_add_to_group(&self, id: &str, group: &str) -> Result<(), ListenerError> {
		self.publish(feature(EventAction::AddToGroup, id).custom("group", group))
			.await
	}

	async fn on_remove_from_group(&self, id: &str, group: &str) -> Result<(), ListenerError> {
		self.publish(feature(EventAction::RemoveFromGroup, id).custom("group", group))
			.await
	}

	async fn on_feature_used(
		&self,
		id: &str,
		context: &ExecutionContext,
	) -> Result<(), ListenerError> {
		let mut builder = feature(EventAction::Hit, id).value("true");
		if let Some(principal) = context.principal() {
			builder = builder.user(principal.user_id.clone());
		}
		self.publish(builder).await
	}
}

#[async_trait]
impl PropertyListener for AuditListener {
	async fn on_create(&self, p: &Property) -> Result<(), ListenerError> {
		self.publish(property(EventAction::Create, &p.id).value(p.value.to_string()))
			.await
	}

	async fn on_update(&self, p: &Property) -> Result<(), ListenerError> {
		self.publish(property(EventAction::Update, &p.id).value(p.value.to_string()))
			.await
	}

	async fn on_delete(&self, id: &str) -> Result<(), ListenerError> {
		self.publish(property(EventAction::Delete, id)).await
	}

	async fn on_delete_all(&self) -> Result<(), ListenerError> {
		self.publish(Event::builder(
			EventAction::DeleteAll,
			EventScope::PropertyStore,
			STORE_WIDE,
		))
		.await
	}

	async fn on_create_schema(&self) -> Result<(), ListenerError> {
		self.publish(Event::builder(
			EventAction::CreateSchema,
			EventScope::PropertyStore,
			STORE_WIDE,
		))
		.await
	}
}
