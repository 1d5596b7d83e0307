// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

struct Running {
	shutdown_tx: broadcast::Sender<()>,
	handle: JoinHandle<()>,
}

/// Runs an async tick on a fixed schedule in a background task.
///
/// The first tick fires after `initial_delay`, then every `period`. Ticks are
/// strictly serial: a tick that overruns its slot delays the next one rather
/// than overlapping it. [`stop`](Self::stop) lets an in-flight tick finish.
pub struct PeriodicWorker {
	name: String,
	initial_delay: Duration,
	period: Duration,
	running: Mutex<Option<Running>>,
}

impl PeriodicWorker {
	/// `period` is clamped to at least one millisecond.
	pub fn new(name: impl Into<String>, initial_delay: Duration, period: Duration) -> Self {
		Self {
			name: name.into(),
			initial_delay,
			period: period.max(Duration::from_millis(1)),
			running: Mutex::new(None),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn period(&self) -> Duration {
		self.period
	}

	/// Spawns the background loop. Returns `false` if it is already running.
	///
	/// Must be called from within a tokio runtime.
	pub fn start<F, Fut>(&self, tick: F) -> bool
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let mut running = self.running.lock();
		if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
			debug!(worker = %self.name, "periodic worker already running");
			return false;
		}

		let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
		let name = self.name.clone();
		let period = self.period;
		let first = Instant::now() + self.initial_delay;
		let tick = Arc::new(tick);

		let handle = tokio::spawn(async move {
			let mut schedule = interval_at(first, period);
			schedule.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				tokio::select! {
					biased;
					_ = shutdown_rx.recv() => {
						info!(worker = %name, "Shutting down periodic worker");
						break;
					}
					_ = schedule.tick() => {
						tick().await;
					}
				}
			}
		});

		*running = Some(Running {
			shutdown_tx,
			handle,
		});
		info!(
			worker = %self.name,
			initial_delay_ms = self.initial_delay.as_millis() as u64,
			period_ms = self.period.as_millis() as u64,
			"Periodic worker started"
		);
		true
	}

	/// Signals the loop to exit and waits for it, including any in-flight tick.
	///
	/// Safe to call before `start` and more than once. Returns `true` if a
	/// running loop was stopped.
	pub async fn stop(&self) -> bool {
		let Some(running) = self.running.lock().take() else {
			return false;
		};
		let _ = running.shutdown_tx.send(());
		let _ = running.handle.await;
		info!(worker = %self.name, "Periodic worker stopped");
		true
	}

	pub fn is_running(&self) -> bool {
		self.running
			.lock()
			.as_ref()
			.is_some_and(|r| !r.handle.is_finished())
	}
}

impl Drop for PeriodicWorker {
	fn drop(&mut self) {
		if let Some(running) = self.running.get_mut().take() {
			let _ = running.shutdown_tx.send(());
		}
	}
}

impl std::fmt::Debug for PeriodicWorker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PeriodicWorker")
			.field("name", &self.name)
			.field("initial_delay", &self.initial_delay)
			.field("period", &self.period)
			.field("running", &self.is_running())
			.finish()
	}
}
