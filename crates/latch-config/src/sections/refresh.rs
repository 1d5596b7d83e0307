// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background cache refresh configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RefreshConfigLayer {
	pub enabled: Option<bool>,
	pub initial_delay_ms: Option<u64>,
	pub period_ms: Option<u64>,
}

impl RefreshConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.initial_delay_ms.is_some() {
			self.initial_delay_ms = other.initial_delay_ms;
		}
		if other.period_ms.is_some() {
			self.period_ms = other.period_ms;
		}
	}

	pub fn finalize(self) -> RefreshConfig {
		RefreshConfig {
			enabled: self.enabled.unwrap_or(true),
			initial_delay_ms: self.initial_delay_ms.unwrap_or(0),
			period_ms: self.period_ms.unwrap_or(60_000),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshConfig {
	pub enabled: bool,
	pub initial_delay_ms: u64,
	pub period_ms: u64,
}

impl RefreshConfig {
	pub fn initial_delay(&self) -> Duration {
		Duration::from_millis(self.initial_delay_ms)
	}

	pub fn period(&self) -> Duration {
		Duration::from_millis(self.period_ms)
	}
}

impl Default for RefreshConfig {
	fn default() -> Self {
		RefreshConfigLayer::default().finalize()
	}
}
