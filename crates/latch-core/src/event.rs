// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to the target of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
	Create,
	Update,
	Delete,
	DeleteAll,
	CreateSchema,
	ToggleOn,
	ToggleOff,
	AddToGroup,
	RemoveFromGroup,
	/// A toggle check returned true.
	Hit,
}

impl std::fmt::Display for EventAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			EventAction::Create => "create",
			EventAction::Update => "update",
			EventAction::Delete => "delete",
			EventAction::DeleteAll => "delete_all",
			EventAction::CreateSchema => "create_schema",
			EventAction::ToggleOn => "toggle_on",
			EventAction::ToggleOff => "toggle_off",
			EventAction::AddToGroup => "add_to_group",
			EventAction::RemoveFromGroup => "remove_from_group",
			EventAction::Hit => "hit",
		};
		f.write_str(s)
	}
}

/// The kind of target an [`Event`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
	Feature,
	Property,
	FeatureStore,
	PropertyStore,
}

impl std::fmt::Display for EventScope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			EventScope::Feature => "feature",
			EventScope::Property => "property",
			EventScope::FeatureStore => "feature_store",
			EventScope::PropertyStore => "property_store",
		};
		f.write_str(s)
	}
}

/// An immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	/// Component that emitted the event, e.g. `"repository"` or `"evaluator"`.
	pub source: String,
	pub action: EventAction,
	pub scope: EventScope,
	/// Entity id, or `"*"` for store-wide actions.
	pub target_id: String,
	pub user: Option<String>,
	pub duration_ms: Option<u64>,
	pub value: Option<String>,
	#[serde(default)]
	pub custom: BTreeMap<String, String>,
}

impl Event {
	pub fn builder(action: EventAction, scope: EventScope, target_id: impl Into<String>) -> EventBuilder {
		EventBuilder::new(action, scope, target_id)
	}
}

#[derive(Debug, Clone)]
pub struct EventBuilder {
	action: EventAction,
	scope: EventScope,
	target_id: String,
	source: Option<String>,
	user: Option<String>,
	duration_ms: Option<u64>,
	value: Option<String>,
	custom: BTreeMap<String, String>,
}

impl EventBuilder {
	pub fn new(action: EventAction, scope: EventScope, target_id: impl Into<String>) -> Self {
		Self {
			action,
			scope,
			target_id: target_id.into(),
			source: None,
			user: None,
			duration_ms: None,
			value: None,
			custom: BTreeMap::new(),
		}
	}

	/// Defaults to `"latch"`.
	pub fn source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	pub fn user(mut self, user: impl Into<String>) -> Self {
		self.user = Some(user.into());
		self
	}

	pub fn duration_ms(mut self, duration_ms: u64) -> Self {
		self.duration_ms = Some(duration_ms);
		self
	}

	pub fn value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}

	pub fn custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.custom.insert(key.into(), value.into());
		self
	}

	pub fn build(self) -> Event {
		Event {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			source: self.source.unwrap_or_else(|| "latch".to_string()),
			action: self.action,
			scope: self.scope,
			target_id: self.target_id,
			user: self.user,
			duration_ms: self.duration_ms,
			value: self.value,
			custom: self.custom,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_defaults() {
		let event = Event::builder(EventAction::ToggleOn, EventScope::Feature, "f1").build();
		assert_eq!(event.source, "latch");
		assert_eq!(event.target_id, "f1");
		assert!(event.user.is_none());
		assert!(event.custom.is_empty());
	}

	#[test]
	fn test_builder_sets_fields() {
		let event = Event::builder(EventAction::Update, EventScope::Property, "timeout")
			.source("repository")
			.user("alice")
			.duration_ms(3)
			.value("60")
			.custom("region", "eu")
			.build();
		assert_eq!(event.source, "repository");
		assert_eq!(event.user.as_deref(), Some("alice"));
		assert_eq!(event.duration_ms, Some(3));
		assert_eq!(event.value.as_deref(), Some("60"));
		assert_eq!(event.custom.get("region").map(String::as_str), Some("eu"));
	}

	#[test]
	fn test_ids_are_unique() {
		let a = Event::builder(EventAction::Hit, EventScope::Feature, "f1").build();
		let b = Event::builder(EventAction::Hit, EventScope::Feature, "f1").build();
		assert_ne!(a.id, b.id);
	}

	#[test]
	fn test_display() {
		assert_eq!(EventAction::RemoveFromGroup.to_string(), "remove_from_group");
		assert_eq!(EventScope::FeatureStore.to_string(), "feature_store");
	}
}
