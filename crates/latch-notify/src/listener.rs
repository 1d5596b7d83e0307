// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use latch_core::{ExecutionContext, Feature, Property};

use crate::error::ListenerError;

/// Observer of feature lifecycle events.
///
/// Every callback defaults to a no-op. Callbacks run on the dispatcher's
/// worker pool after the triggering operation has already returned.
#[async_trait]
pub trait FeatureListener: Send + Sync {
	async fn on_create(&self, _feature: &Feature) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_update(&self, _feature: &Feature) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_delete(&self, _id: &str) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_delete_all(&self) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_create_schema(&self) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_toggle_on(&self, _id: &str) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_toggle_off(&self, _id: &str) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_add_to_group(&self, _id: &str, _group: &str) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_remove_from_group(&self, _id: &str, _group: &str) -> Result<(), ListenerError> {
		Ok(())
	}

	/// A toggle check for `id` returned true.
	async fn on_feature_used(
		&self,
		_id: &str,
		_context: &ExecutionContext,
	) -> Result<(), ListenerError> {
		Ok(())
	}
}

/// Observer of property lifecycle events.
#[async_trait]
pub trait PropertyListener: Send + Sync {
	async fn on_create(&self, _property: &Property) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_update(&self, _property: &Property) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_delete(&self, _id: &str) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_delete_all(&self) -> Result<(), ListenerError> {
		Ok(())
	}

	async fn on_create_schema(&self) -> Result<(), ListenerError> {
		Ok(())
	}
}
