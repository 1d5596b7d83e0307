// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use latch_core::{
	AccessControlList, Feature, FeatureRepository, Permission, Principal, Repository, Result,
};
use tracing::instrument;

/// Feature writes performed on behalf of one principal.
///
/// Every write is checked against the ACL of the stored feature before it is
/// applied. Permissions other than USE are closed unless granted, so a
/// feature with an empty ACL cannot be changed through this view.
///
/// Authorization and ACL edits read through [`Repository::fetch`], so a grant
/// revoked in the store takes effect immediately even while a cached copy of
/// the feature still carries it.
pub struct SecuredFeatures {
	features: Arc<dyn FeatureRepository>,
	principal: Principal,
}

impl SecuredFeatures {
	pub fn new(features: Arc<dyn FeatureRepository>, principal: Principal) -> Self {
		Self {
			features,
			principal,
		}
	}

	pub fn principal(&self) -> &Principal {
		&self.principal
	}

	async fn authorized(&self, id: &str, permission: Permission) -> Result<Feature> {
		let feature = self.features.fetch(id).await?;
		feature
			.acl
			.authorize(Some(&self.principal), permission, id)?;
		Ok(feature)
	}

	#[instrument(skip(self), fields(user = %self.principal.user_id))]
	pub async fn toggle_on(&self, id: &str) -> Result<()> {
		self.authorized(id, Permission::Toggle).await?;
		self.features.toggle_on(id).await
	}

	#[instrument(skip(self), fields(user = %self.principal.user_id))]
	pub async fn toggle_off(&self, id: &str) -> Result<()> {
		self.authorized(id, Permission::Toggle).await?;
		self.features.toggle_off(id).await
	}

	/// Needs UPDATE, plus EDIT_PERMISSIONS if the ACL itself changes.
	#[instrument(skip(self, feature), fields(user = %self.principal.user_id, id = %feature.id))]
	pub async fn update(&self, feature: Feature) -> Result<()> {
		let stored = self.authorized(&feature.id, Permission::Update).await?;
		if stored.acl != feature.acl {
			stored
				.acl
				.authorize(Some(&self.principal), Permission::EditPermissions, &feature.id)?;
		}
		self.features.update(feature).await
	}

	#[instrument(skip(self), fields(user = %self.principal.user_id))]
	pub async fn delete(&self, id: &str) -> Result<()> {
		self.authorized(id, Permission::Delete).await?;
		self.features.delete(id).await
	}

	pub async fn grant_users(
		&self,
		id: &str,
		permission: Permission,
		user_ids: &[&str],
	) -> Result<()> {
		self.edit_acl(id, |acl| {
			acl.grant_users(permission, user_ids.iter().copied());
		})
		.await
	}

	pub async fn grant_groups(
		&self,
		id: &str,
		permission: Permission,
		group_ids: &[&str],
	) -> Result<()> {
		self.edit_acl(id, |acl| {
			acl.grant_groups(permission, group_ids.iter().copied());
		})
		.await
	}

	pub async fn revoke_users(
		&self,
		id: &str,
		permission: Permission,
		user_ids: &[&str],
	) -> Result<()> {
		self.edit_acl(id, |acl| {
			acl.revoke_users(permission, user_ids.iter().copied());
		})
		.await
	}

	pub async fn revoke_groups(
		&self,
		id: &str,
		permission: Permission,
		group_ids: &[&str],
	) -> Result<()> {
		self.edit_acl(id, |acl| {
			acl.revoke_groups(permission, group_ids.iter().copied());
		})
		.await
	}

	#[instrument(skip(self, edit), fields(user = %self.principal.user_id))]
	async fn edit_acl<F>(&self, id: &str, edit: F) -> Result<()>
	where
		F: FnOnce(&mut AccessControlList) + Send,
	{
		let mut feature = self.authorized(id, Permission::EditPermissions).await?;
		edit(&mut feature.acl);
		feature.touch();
		self.features.update(feature).await
	}
}
