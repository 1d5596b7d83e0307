// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Toggle evaluation for Latch.
//!
//! [`ToggleEvaluator`] answers toggle checks through the enabled flag, the USE
//! permission and the feature's strategy. [`SecuredFeatures`] authorizes
//! feature writes against each feature's ACL.

pub mod decision;
pub mod evaluator;
pub mod secured;

pub use decision::{DecisionReason, ToggleDecision};
pub use evaluator::ToggleEvaluator;
pub use secured::SecuredFeatures;
