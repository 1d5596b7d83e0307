// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Change notification for Latch.
//!
//! Writes flow through [`NotifyingRepository`], which fans lifecycle events out
//! to registered [`FeatureListener`]s and [`PropertyListener`]s via a
//! [`Notifier`]. Every invocation is queued on a bounded [`Dispatcher`] and
//! run by a fixed pool of workers under a timeout, so listeners never slow
//! down or fail the caller.
//!
//! [`AuditListener`] and [`UsageMetrics`] are the built-in listeners.

pub mod audit;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod metrics;
pub mod notifier;
pub mod registry;
pub mod repository;
pub mod sink;

pub use audit::AuditListener;
pub use dispatcher::{DispatchStats, Dispatcher, ListenerJob};
pub use error::ListenerError;
pub use listener::{FeatureListener, PropertyListener};
pub use metrics::UsageMetrics;
pub use notifier::{FeatureNotifier, Notifier, PropertyNotifier};
pub use registry::ListenerRegistry;
pub use repository::NotifyingRepository;
pub use sink::{AuditSink, MemoryAuditSink, TracingAuditSink};
