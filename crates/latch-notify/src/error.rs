// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// A listener or audit sink could not handle an event.
///
/// These never reach the caller that triggered the event; the dispatcher logs
/// them with the listener name.
#[derive(Debug, Error)]
pub enum ListenerError {
	#[error("listener failed: {0}")]
	Failed(String),

	#[error("audit sink {sink} failed: {message}")]
	Sink { sink: String, message: String },
}

impl ListenerError {
	pub fn failed(message: impl Into<String>) -> Self {
		ListenerError::Failed(message.into())
	}
}
