// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::sections::{
	CacheConfigLayer, EvaluatorConfigLayer, LoggingConfigLayer, NotifierConfigLayer,
	RefreshConfigLayer,
};

/// One partially specified configuration, as produced by a single source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LatchConfigLayer {
	pub cache: Option<CacheConfigLayer>,
	pub refresh: Option<RefreshConfigLayer>,
	pub notifier: Option<NotifierConfigLayer>,
	pub evaluator: Option<EvaluatorConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl LatchConfigLayer {
	/// Overlays `other` on `self`; fields set in `other` win.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.cache, other.cache, CacheConfigLayer::merge);
		merge_section(&mut self.refresh, other.refresh, RefreshConfigLayer::merge);
		merge_section(&mut self.notifier, other.notifier, NotifierConfigLayer::merge);
		merge_section(&mut self.evaluator, other.evaluator, EvaluatorConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(other)) => merge(existing, other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = LatchConfigLayer::default();
		base.merge(LatchConfigLayer {
			cache: Some(CacheConfigLayer {
				max_entries: Some(10),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(base.cache.unwrap().max_entries, Some(10));
	}

	#[test]
	fn test_merge_combines_fields_within_section() {
		let mut base = LatchConfigLayer {
			refresh: Some(RefreshConfigLayer {
				period_ms: Some(1000),
				initial_delay_ms: Some(5),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(LatchConfigLayer {
			refresh: Some(RefreshConfigLayer {
				period_ms: Some(200),
				..Default::default()
			}),
			..Default::default()
		});
		let refresh = base.refresh.unwrap();
		assert_eq!(refresh.period_ms, Some(200));
		assert_eq!(refresh.initial_delay_ms, Some(5));
	}

	#[test]
	fn test_deserialize_full_file() {
		let layer: LatchConfigLayer = toml::from_str(
			r#"
[cache]
default_ttl_ms = 50

[refresh]
period_ms = 200

[notifier]
workers = 2

[evaluator]
auto_create = true

[logging]
level = "debug"
json = true
"#,
		)
		.unwrap();
		assert_eq!(layer.cache.unwrap().default_ttl_ms, Some(50));
		assert_eq!(layer.refresh.unwrap().period_ms, Some(200));
		assert_eq!(layer.notifier.unwrap().workers, Some(2));
		assert_eq!(layer.evaluator.unwrap().auto_create, Some(true));
		assert_eq!(layer.logging.unwrap().json, Some(true));
	}
}
