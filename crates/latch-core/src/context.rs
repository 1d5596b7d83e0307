// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The caller a check or write is performed on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	pub user_id: String,
	#[serde(default)]
	pub groups: BTreeSet<String>,
}

impl Principal {
	pub fn new(user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			groups: BTreeSet::new(),
		}
	}

	pub fn with_group(mut self, group: impl Into<String>) -> Self {
		self.groups.insert(group.into());
		self
	}

	pub fn with_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.groups.extend(groups.into_iter().map(Into::into));
		self
	}

	pub fn is_member_of(&self, group: &str) -> bool {
		self.groups.contains(group)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContextValue {
	String(String),
	Bool(bool),
	Int(i64),
	Double(f64),
	Date(DateTime<Utc>),
}

impl From<&str> for ContextValue {
	fn from(v: &str) -> Self {
		ContextValue::String(v.to_string())
	}
}

impl From<String> for ContextValue {
	fn from(v: String) -> Self {
		ContextValue::String(v)
	}
}

impl From<bool> for ContextValue {
	fn from(v: bool) -> Self {
		ContextValue::Bool(v)
	}
}

impl From<i64> for ContextValue {
	fn from(v: i64) -> Self {
		ContextValue::Int(v)
	}
}

impl From<f64> for ContextValue {
	fn from(v: f64) -> Self {
		ContextValue::Double(v)
	}
}

impl From<DateTime<Utc>> for ContextValue {
	fn from(v: DateTime<Utc>) -> Self {
		ContextValue::Date(v)
	}
}

/// Per-call evaluation input: a key/value bag plus the acting principal.
///
/// Contexts are passed explicitly on every call. A facade may hold a default
/// context and combine it with the caller's via [`ExecutionContext::merged`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
	#[serde(default)]
	values: BTreeMap<String, ContextValue>,
	#[serde(default)]
	principal: Option<Principal>,
}

impl ExecutionContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn for_principal(principal: Principal) -> Self {
		Self {
			values: BTreeMap::new(),
			principal: Some(principal),
		}
	}

	pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
		self.values.insert(key.into(), value.into());
		self
	}

	pub fn with_principal(mut self, principal: Principal) -> Self {
		self.principal = Some(principal);
		self
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
		self.values.insert(key.into(), value.into());
	}

	pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
		self.values.remove(key)
	}

	pub fn set_principal(&mut self, principal: Option<Principal>) {
		self.principal = principal;
	}

	pub fn principal(&self) -> Option<&Principal> {
		self.principal.as_ref()
	}

	pub fn get(&self, key: &str) -> Option<&ContextValue> {
		self.values.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn get_string(&self, key: &str) -> Option<&str> {
		match self.values.get(key) {
			Some(ContextValue::String(s)) => Some(s.as_str()),
			_ => None,
		}
	}

	pub fn get_bool(&self, key: &str) -> Option<bool> {
		match self.values.get(key) {
			Some(ContextValue::Bool(b)) => Some(*b),
			_ => None,
		}
	}

	pub fn get_int(&self, key: &str) -> Option<i64> {
		match self.values.get(key) {
			Some(ContextValue::Int(i)) => Some(*i),
			_ => None,
		}
	}

	/// Ints widen to doubles; other types do not convert.
	pub fn get_double(&self, key: &str) -> Option<f64> {
		match self.values.get(key) {
			Some(ContextValue::Double(d)) => Some(*d),
			Some(ContextValue::Int(i)) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn get_date(&self, key: &str) -> Option<DateTime<Utc>> {
		match self.values.get(key) {
			Some(ContextValue::Date(d)) => Some(*d),
			_ => None,
		}
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty() && self.principal.is_none()
	}

	/// Layers `overrides` on top of `self`. Keys present in `overrides` win, and
	/// its principal replaces ours when set.
	pub fn merged(&self, overrides: &ExecutionContext) -> ExecutionContext {
		let mut values = self.values.clone();
		for (k, v) in &overrides.values {
			values.insert(k.clone(), v.clone());
		}
		ExecutionContext {
			values,
			principal: overrides
				.principal
				.clone()
				.or_else(|| self.principal.clone()),
		}
	}
}
