// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod cache;
mod evaluator;
mod logging;
mod notifier;
mod refresh;

pub use cache::{CacheConfig, CacheConfigLayer};
pub use evaluator::{EvaluatorConfig, EvaluatorConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use notifier::{NotifierConfig, NotifierConfigLayer};
pub use refresh::{RefreshConfig, RefreshConfigLayer};
