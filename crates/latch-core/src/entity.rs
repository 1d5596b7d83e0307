// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LatchError, Result};

const MAX_ID_LEN: usize = 255;

/// The kinds of records a repository can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Feature,
	Property,
	Group,
}

impl std::fmt::Display for EntityKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			EntityKind::Feature => write!(f, "feature"),
			EntityKind::Property => write!(f, "property"),
			EntityKind::Group => write!(f, "group"),
		}
	}
}

/// A record stored in a repository under a unique string identifier.
///
/// Entities have value semantics: caches and listeners always hold clones,
/// never a handle into the store.
pub trait Entity: Clone + Send + Sync + std::fmt::Debug + 'static {
	const KIND: EntityKind;

	fn id(&self) -> &str;

	fn created_at(&self) -> DateTime<Utc>;

	fn updated_at(&self) -> DateTime<Utc>;

	/// Used by stores to keep the original creation time across updates.
	fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

	/// Checks the invariants a store enforces on write.
	fn validate(&self) -> Result<()> {
		validate_id(self.id())
	}
}

/// Returns true if `id` can be used as an entity identifier.
///
/// Identifiers are non-empty, at most 255 characters, and contain no
/// whitespace or control characters.
pub fn is_valid_id(id: &str) -> bool {
	!id.is_empty()
		&& id.chars().count() <= MAX_ID_LEN
		&& !id.chars().any(|c| c.is_whitespace() || c.is_control())
}

pub fn validate_id(id: &str) -> Result<()> {
	if is_valid_id(id) {
		Ok(())
	} else {
		Err(LatchError::InvalidIdentifier(id.to_string()))
	}
}
