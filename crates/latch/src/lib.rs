// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime feature toggles and configuration properties.
//!
//! [`Latch`] composes a backing store with a local read-through cache, a
//! periodic refresh, toggle evaluation and asynchronous change notification.
//!
//! # Example
//!
//! ```
//! use latch::{ExecutionContext, Feature, Latch};
//!
//! # tokio_test::block_on(async {
//! let latch = Latch::builder().build().await?;
//! latch.create_feature(Feature::new("checkout.new-flow")).await?;
//! assert!(!latch.check("checkout.new-flow").await?);
//!
//! latch.enable("checkout.new-flow").await?;
//! assert!(latch.check_with("checkout.new-flow", &ExecutionContext::new()).await?);
//! latch.shutdown().await;
//! # Ok::<(), latch::LatchError>(())
//! # }).unwrap();
//! ```

mod builder;
mod client;
mod logging;

pub use builder::LatchBuilder;
pub use client::Latch;
pub use logging::init_logging;

pub use latch_cache::CacheStats;
pub use latch_config::{load_config, LatchConfig, LoggingConfig};
pub use latch_core::{
	AccessControlList, ContextValue, Event, EventAction, EventScope, ExecutionContext, Feature,
	FeatureRepository, FlippingStrategy, InMemoryRepository, LatchError, Permission, Principal,
	Property, PropertyRepository, PropertyValue, Repository, Result, StrategyConfig,
	StrategyRegistry,
};
pub use latch_eval::{DecisionReason, SecuredFeatures, ToggleDecision};
pub use latch_notify::{
	AuditSink, DispatchStats, FeatureListener, ListenerError, MemoryAuditSink, PropertyListener,
	UsageMetrics,
};
