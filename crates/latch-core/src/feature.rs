// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acl::AccessControlList;
use crate::entity::{validate_id, Entity, EntityKind};
use crate::error::Result;
use crate::property::Property;
use crate::strategy::StrategyConfig;

/// A named capability that can be switched on and off at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
	pub id: String,
	pub enabled: bool,
	pub description: Option<String>,
	pub owner: Option<String>,
	pub group: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default)]
	pub custom_properties: BTreeMap<String, Property>,
	#[serde(default)]
	pub acl: AccessControlList,
	pub strategy: Option<StrategyConfig>,
}

impl Feature {
	/// Creates a disabled feature with no group, strategy, or ACL entries.
	pub fn new(id: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: id.into(),
			enabled: false,
			description: None,
			owner: None,
			group: None,
			created_at: now,
			updated_at: now,
			custom_properties: BTreeMap::new(),
			acl: AccessControlList::new(),
			strategy: None,
		}
	}

	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
		self.owner = Some(owner.into());
		self
	}

	pub fn with_group(mut self, group: impl Into<String>) -> Self {
		self.group = Some(group.into());
		self
	}

	pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
		self.strategy = Some(strategy);
		self
	}

	pub fn with_acl(mut self, acl: AccessControlList) -> Self {
		self.acl = acl;
		self
	}

	pub fn with_property(mut self, property: Property) -> Self {
		self.custom_properties.insert(property.id.clone(), property);
		self
	}

	pub fn in_group(&self, group: &str) -> bool {
		self.group.as_deref() == Some(group)
	}

	pub fn touch(&mut self) {
		self.updated_at = Utc::now().max(self.created_at);
	}
}

impl Entity for Feature {
	const KIND: EntityKind = EntityKind::Feature;

	fn id(&self) -> &str {
		&self.id
	}

	fn created_at(&self) -> DateTime<Utc> {
		self.created_at
	}

	fn updated_at(&self) -> DateTime<Utc> {
		self.updated_at
	}

	fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
		self.created_at = created_at;
		self.updated_at = updated_at.max(created_at);
	}

	fn validate(&self) -> Result<()> {
		validate_id(&self.id)?;
		if let Some(group) = &self.group {
			validate_id(group)?;
		}
		for property in self.custom_properties.values() {
			property.validate()?;
		}
		Ok(())
	}
}
