// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::acl::Permission;
use crate::entity::EntityKind;

/// Errors that can occur in the toggle and property system.
#[derive(Debug, Error)]
pub enum LatchError {
	#[error("{kind} not found: {id}")]
	NotFound { kind: EntityKind, id: String },

	#[error("{kind} already exists: {id}")]
	AlreadyExists { kind: EntityKind, id: String },

	/// Raised only when authorizing writes. During a toggle check a missing
	/// grant is a `false` result, not an error.
	#[error("access denied: {permission} on {id}")]
	AccessDenied { permission: Permission, id: String },

	#[error("backing store unavailable: {0}")]
	BackingStoreUnavailable(String),

	#[error("invalid strategy configuration for '{strategy}': {message}")]
	InvalidStrategyConfiguration { strategy: String, message: String },

	#[error("invalid identifier: {0:?}")]
	InvalidIdentifier(String),

	#[error("invalid value for property {id}: {message}")]
	InvalidPropertyValue { id: String, message: String },

	#[error("internal error: {0}")]
	Internal(String),
}

impl LatchError {
	pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
		LatchError::NotFound {
			kind,
			id: id.into(),
		}
	}

	pub fn already_exists(kind: EntityKind, id: impl Into<String>) -> Self {
		LatchError::AlreadyExists {
			kind,
			id: id.into(),
		}
	}

	pub fn invalid_strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
		LatchError::InvalidStrategyConfiguration {
			strategy: strategy.into(),
			message: message.into(),
		}
	}

	/// Returns true if retrying the same call may succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, LatchError::BackingStoreUnavailable(_))
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, LatchError::NotFound { .. })
	}
}

pub type Result<T> = std::result::Result<T, LatchError>;
