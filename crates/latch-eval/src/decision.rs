// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// Which step of the evaluation chain settled the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
	/// The feature's enabled flag is off.
	Disabled,
	/// The caller lacks USE on the feature.
	AccessDenied,
	/// A strategy supplied for this call decided.
	OverrideStrategy,
	/// The feature's own strategy decided.
	BoundStrategy,
	/// Enabled with no strategy.
	Enabled,
	/// The feature did not exist and was created disabled.
	AutoCreated,
}

impl std::fmt::Display for DecisionReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			DecisionReason::Disabled => "disabled",
			DecisionReason::AccessDenied => "access_denied",
			DecisionReason::OverrideStrategy => "override_strategy",
			DecisionReason::BoundStrategy => "bound_strategy",
			DecisionReason::Enabled => "enabled",
			DecisionReason::AutoCreated => "auto_created",
		};
		f.write_str(s)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleDecision {
	pub feature_id: String,
	pub enabled: bool,
	pub reason: DecisionReason,
}

impl ToggleDecision {
	pub fn new(feature_id: impl Into<String>, enabled: bool, reason: DecisionReason) -> Self {
		Self {
			feature_id: feature_id.into(),
			enabled,
			reason,
		}
	}

	pub(crate) fn off(feature_id: impl Into<String>, reason: DecisionReason) -> Self {
		Self::new(feature_id, false, reason)
	}
}
