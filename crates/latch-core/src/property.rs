// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acl::AccessControlList;
use crate::entity::{validate_id, Entity, EntityKind};
use crate::error::{LatchError, Result};

/// A typed runtime parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
	String(String),
	Bool(bool),
	Int(i64),
	Double(f64),
	Date(DateTime<Utc>),
}

impl PropertyValue {
	pub fn type_name(&self) -> &'static str {
		match self {
			PropertyValue::String(_) => "string",
			PropertyValue::Bool(_) => "bool",
			PropertyValue::Int(_) => "int",
			PropertyValue::Double(_) => "double",
			PropertyValue::Date(_) => "date",
		}
	}

	/// Parses `raw` as a value of the same type as `self`.
	pub fn parse_same_type(&self, raw: &str) -> std::result::Result<PropertyValue, String> {
		let raw = raw.trim();
		match self {
			PropertyValue::String(_) => Ok(PropertyValue::String(raw.to_string())),
			PropertyValue::Bool(_) => match raw.to_ascii_lowercase().as_str() {
				"true" | "1" | "yes" | "on" => Ok(PropertyValue::Bool(true)),
				"false" | "0" | "no" | "off" => Ok(PropertyValue::Bool(false)),
				_ => Err(format!("'{raw}' is not a bool")),
			},
			PropertyValue::Int(_) => raw
				.parse::<i64>()
				.map(PropertyValue::Int)
				.map_err(|e| format!("'{raw}' is not an int: {e}")),
			PropertyValue::Double(_) => raw
				.parse::<f64>()
				.map(PropertyValue::Double)
				.map_err(|e| format!("'{raw}' is not a double: {e}")),
			PropertyValue::Date(_) => DateTime::parse_from_rfc3339(raw)
				.map(|d| PropertyValue::Date(d.with_timezone(&Utc)))
				.map_err(|e| format!("'{raw}' is not an RFC 3339 date: {e}")),
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			PropertyValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			PropertyValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			PropertyValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_double(&self) -> Option<f64> {
		match self {
			PropertyValue::Double(d) => Some(*d),
			PropertyValue::Int(i) => Some(*i as f64),
			_ => None,
		}
	}
}

impl std::fmt::Display for PropertyValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PropertyValue::String(s) => f.write_str(s),
			PropertyValue::Bool(b) => write!(f, "{b}"),
			PropertyValue::Int(i) => write!(f, "{i}"),
			PropertyValue::Double(d) => write!(f, "{d}"),
			PropertyValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
	pub id: String,
	pub value: PropertyValue,
	/// When non-empty, `value` must be one of these.
	#[serde(default)]
	pub fixed_values: Vec<PropertyValue>,
	pub description: Option<String>,
	pub owner: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default)]
	pub acl: AccessControlList,
}

impl Property {
	pub fn new(id: impl Into<String>, value: PropertyValue) -> Self {
		let now = Utc::now();
		Self {
			id: id.into(),
			value,
			fixed_values: Vec::new(),
			description: None,
			owner: None,
			created_at: now,
			updated_at: now,
			acl: AccessControlList::new(),
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
		self.owner = Some(owner.into());
		self
	}

	pub fn with_fixed_values(mut self, values: impl IntoIterator<Item = PropertyValue>) -> Self {
		self.fixed_values = values.into_iter().collect();
		self
	}

	pub fn touch(&mut self) {
		self.updated_at = Utc::now().max(self.created_at);
	}

	/// Parses `raw` with the current value's type, checks it against
	/// `fixed_values`, and stores it. On error the value is unchanged.
	pub fn set_value_from_str(&mut self, raw: &str) -> Result<()> {
		let parsed = self
			.value
			.parse_same_type(raw)
			.map_err(|message| LatchError::InvalidPropertyValue {
				id: self.id.clone(),
				message,
			})?;
		self.check_fixed(&parsed)?;
		self.value = parsed;
		self.touch();
		Ok(())
	}

	fn check_fixed(&self, value: &PropertyValue) -> Result<()> {
		if self.fixed_values.is_empty() || self.fixed_values.contains(value) {
			return Ok(());
		}
		Err(LatchError::InvalidPropertyValue {
			id: self.id.clone(),
			message: format!("'{value}' is not one of the allowed values"),
		})
	}
}

impl Entity for Property {
	const KIND: EntityKind = EntityKind::Property;

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
		if let Some(bad) = self
			.fixed_values
			.iter()
			.find(|v| v.type_name() != self.value.type_name())
		{
			return Err(LatchError::InvalidPropertyValue {
				id: self.id.clone(),
				message: format!(
					"fixed value '{bad}' is a {} but the property is a {}",
					bad.type_name(),
					self.value.type_name()
				),
			});
		}
		self.check_fixed(&self.value)
	}
}
