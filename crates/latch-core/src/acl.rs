// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access control lists attached to features and properties.
//!
//! An [`AccessControlList`] maps a [`Permission`] to the [`Grantees`] allowed
//! to exercise it. Two states must not be confused:
//!
//! - no entry for a permission: nobody restricted it, so the permission's
//!   [`DefaultAccess`] applies
//! - an entry with empty grantees: the permission is restricted and nobody
//!   holds it
//!
//! Only [`Permission::Use`] is open by default. Every other permission must be
//! granted explicitly.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::context::Principal;
use crate::error::{LatchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
	Use,
	Read,
	Create,
	Update,
	Delete,
	Toggle,
	EditPermissions,
	ViewAudit,
}

/// What a permission resolves to when the ACL has no entry for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAccess {
	Open,
	Closed,
}

impl Permission {
	pub const ALL: [Permission; 8] = [
		Permission::Use,
		Permission::Read,
		Permission::Create,
		Permission::Update,
		Permission::Delete,
		Permission::Toggle,
		Permission::EditPermissions,
		Permission::ViewAudit,
	];

	pub const fn default_access(self) -> DefaultAccess {
		match self {
			Permission::Use => DefaultAccess::Open,
			_ => DefaultAccess::Closed,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Permission::Use => "USE",
			Permission::Read => "READ",
			Permission::Create => "CREATE",
			Permission::Update => "UPDATE",
			Permission::Delete => "DELETE",
			Permission::Toggle => "TOGGLE",
			Permission::EditPermissions => "EDIT_PERMISSIONS",
			Permission::ViewAudit => "VIEW_AUDIT",
		}
	}
}

impl std::fmt::Display for Permission {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Permission {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Permission::ALL
			.into_iter()
			.find(|p| p.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| format!("unknown permission: {s}"))
	}
}

/// Users and groups holding a permission. The two namespaces are kept apart:
/// a user id never matches a group id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grantees {
	#[serde(default)]
	pub users: BTreeSet<String>,
	#[serde(default)]
	pub groups: BTreeSet<String>,
}

impl Grantees {
	pub fn is_empty(&self) -> bool {
		self.users.is_empty() && self.groups.is_empty()
	}

	pub fn includes(&self, principal: &Principal) -> bool {
		self.users.contains(&principal.user_id)
			|| principal.groups.iter().any(|g| self.groups.contains(g))
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
	#[serde(default)]
	permissions: BTreeMap<Permission, Grantees>,
}

impl AccessControlList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn grant_users<I, S>(&mut self, permission: Permission, user_ids: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let grantees = self.permissions.entry(permission).or_default();
		grantees.users.extend(user_ids.into_iter().map(Into::into));
		self
	}

	pub fn grant_groups<I, S>(&mut self, permission: Permission, group_ids: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let grantees = self.permissions.entry(permission).or_default();
		grantees.groups.extend(group_ids.into_iter().map(Into::into));
		self
	}

	/// Removes users from a permission. The entry stays in place even when it
	/// becomes empty, so the permission remains restricted.
	pub fn revoke_users<I, S>(&mut self, permission: Permission, user_ids: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		if let Some(grantees) = self.permissions.get_mut(&permission) {
			for id in user_ids {
				grantees.users.remove(id.as_ref());
			}
		}
		self
	}

	pub fn revoke_groups<I, S>(&mut self, permission: Permission, group_ids: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		if let Some(grantees) = self.permissions.get_mut(&permission) {
			for id in group_ids {
				grantees.groups.remove(id.as_ref());
			}
		}
		self
	}

	/// Marks a permission as restricted without granting it to anyone.
	pub fn restrict(&mut self, permission: Permission) -> &mut Self {
		self.permissions.entry(permission).or_default();
		self
	}

	/// Drops the entry for a permission so its default access applies again.
	pub fn clear(&mut self, permission: Permission) -> &mut Self {
		self.permissions.remove(&permission);
		self
	}

	pub fn grantees(&self, permission: Permission) -> Option<&Grantees> {
		self.permissions.get(&permission)
	}

	pub fn is_restricted(&self, permission: Permission) -> bool {
		self.permissions.contains_key(&permission)
	}

	pub fn is_empty(&self) -> bool {
		self.permissions.is_empty()
	}

	pub fn permissions(&self) -> impl Iterator<Item = (&Permission, &Grantees)> {
		self.permissions.iter()
	}

	/// Decides whether `principal` holds `permission`.
	///
	/// An anonymous caller (`None`) only passes permissions that are unrestricted
	/// and open by default.
	pub fn is_granted(&self, principal: Option<&Principal>, permission: Permission) -> bool {
		match self.permissions.get(&permission) {
			None => permission.default_access() == DefaultAccess::Open,
			Some(grantees) => principal.is_some_and(|p| grantees.includes(p)),
		}
	}

	/// Like [`is_granted`](Self::is_granted) but reports a denial as
	/// [`LatchError::AccessDenied`] naming `target_id`.
	pub fn authorize(
		&self,
		principal: Option<&Principal>,
		permission: Permission,
		target_id: &str,
	) -> Result<()> {
		if self.is_granted(principal, permission) {
			Ok(())
		} else {
			Err(LatchError::AccessDenied {
				permission,
				id: target_id.to_string(),
			})
		}
	}
}
