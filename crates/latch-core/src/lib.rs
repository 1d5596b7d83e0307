// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Latch feature toggle and property system.
//!
//! This crate holds the shared vocabulary every other Latch crate builds on:
//! - [`Feature`] and [`Property`] entities with their [`AccessControlList`]
//! - the [`Repository`] contract and its feature/property extensions
//! - [`ExecutionContext`] and the [`FlippingStrategy`] contract with its
//!   [`StrategyRegistry`]
//! - [`InMemoryRepository`], a map-backed store
//! - the audit [`Event`] record and the [`LatchError`] taxonomy
//!
//! # Example
//!
//! ```
//! use latch_core::{AccessControlList, ExecutionContext, Feature, Permission, Principal};
//!
//! let mut acl = AccessControlList::new();
//! acl.grant_groups(Permission::Use, ["beta-testers"]);
//!
//! let feature = Feature::new("checkout.new-flow")
//!     .enabled(true)
//!     .with_group("checkout")
//!     .with_acl(acl);
//!
//! let ctx = ExecutionContext::for_principal(
//!     Principal::new("alice").with_group("beta-testers"),
//! );
//! assert!(feature.acl.is_granted(ctx.principal(), Permission::Use));
//! ```

pub mod acl;
pub mod context;
pub mod entity;
pub mod error;
pub mod event;
pub mod feature;
pub mod memory;
pub mod property;
pub mod repository;
pub mod strategy;

pub use acl::{AccessControlList, DefaultAccess, Grantees, Permission};
pub use context::{ContextValue, ExecutionContext, Principal};
pub use entity::{is_valid_id, validate_id, Entity, EntityKind};
pub use error::{LatchError, Result};
pub use event::{Event, EventAction, EventBuilder, EventScope};
pub use feature::Feature;
pub use memory::InMemoryRepository;
pub use property::{Property, PropertyValue};
pub use repository::{FeatureRepository, PropertyRepository, Repository};
pub use strategy::{required_param, FlippingStrategy, StrategyConfig, StrategyFactory, StrategyRegistry};
