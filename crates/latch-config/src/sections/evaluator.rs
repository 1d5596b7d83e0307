// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Toggle evaluation configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluatorConfigLayer {
	pub auto_create: Option<bool>,
	pub audit_enabled: Option<bool>,
}

impl EvaluatorConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.auto_create.is_some() {
			self.auto_create = other.auto_create;
		}
		if other.audit_enabled.is_some() {
			self.audit_enabled = other.audit_enabled;
		}
	}

	pub fn finalize(self) -> EvaluatorConfig {
		EvaluatorConfig {
			auto_create: self.auto_create.unwrap_or(false),
			audit_enabled: self.audit_enabled.unwrap_or(true),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluatorConfig {
	/// Create unknown features as disabled instead of failing the check.
	pub auto_create: bool,
	pub audit_enabled: bool,
}

impl Default for EvaluatorConfig {
	fn default() -> Self {
		EvaluatorConfigLayer::default().finalize()
	}
}
