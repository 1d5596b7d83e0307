// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded fire-and-forget execution of listener invocations.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ListenerError;

/// One listener invocation, already bound to its arguments.
pub type ListenerJob = BoxFuture<'static, Result<(), ListenerError>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
	pub dispatched: u64,
	pub completed: u64,
	pub failed: u64,
	pub timed_out: u64,
	pub dropped: u64,
}

#[derive(Default)]
struct Counters {
	dispatched: AtomicU64,
	completed: AtomicU64,
	failed: AtomicU64,
	timed_out: AtomicU64,
	dropped: AtomicU64,
}

struct Task {
	listener: String,
	job: ListenerJob,
}

/// A fixed pool of worker tasks draining a bounded queue.
///
/// Enqueueing never waits: when the queue is full the job is dropped and
/// counted. Each job runs under `task_timeout`; errors, panics and timeouts
/// are logged with the listener name and never propagate.
pub struct Dispatcher {
	/// Read-locked by `dispatch`, so concurrent notifies never queue on each
	/// other; only `shutdown` takes it for writing.
	tx: RwLock<Option<mpsc::Sender<Task>>>,
	workers: Mutex<Vec<JoinHandle<()>>>,
	counters: Arc<Counters>,
	task_timeout: Duration,
}

impl Dispatcher {
	/// Spawns `workers` tasks. Both `workers` and `queue_capacity` are clamped
	/// to at least one. Must be called from within a tokio runtime.
	pub fn new(workers: usize, queue_capacity: usize, task_timeout: Duration) -> Self {
		let (tx, rx) = mpsc::channel::<Task>(queue_capacity.max(1));
		let rx = Arc::new(tokio::sync::Mutex::new(rx));
		let counters = Arc::new(Counters::default());

		let handles = (0..workers.max(1))
			.map(|worker| {
				let rx = Arc::clone(&rx);
				let counters = Arc::clone(&counters);
				tokio::spawn(run_worker(worker, rx, counters, task_timeout))
			})
			.collect();

		info!(
			workers = workers.max(1),
			queue_capacity = queue_capacity.max(1),
			task_timeout_ms = task_timeout.as_millis() as u64,
			"Listener dispatcher started"
		);

		Self {
			tx: RwLock::new(Some(tx)),
			workers: Mutex::new(handles),
			counters,
			task_timeout,
		}
	}

	/// Queues a job without waiting. Returns `false` if it was dropped because
	/// the queue is full or the dispatcher is shut down.
	pub fn dispatch(&self, listener: impl Into<String>, job: ListenerJob) -> bool {
		let listener = listener.into();
		let tx = self.tx.read();
		let Some(tx) = tx.as_ref() else {
			self.counters.dropped.fetch_add(1, Ordering::Relaxed);
			debug!(listener = %listener, "dispatcher shut down, dropping listener job");
			return false;
		};

		match tx.try_send(Task { listener, job }) {
			Ok(()) => {
				self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
				true
			}
			Err(mpsc::error::TrySendError::Full(task)) => {
				self.counters.dropped.fetch_add(1, Ordering::Relaxed);
				warn!(listener = %task.listener, "listener queue full, dropping event");
				false
			}
			Err(mpsc::error::TrySendError::Closed(task)) => {
				self.counters.dropped.fetch_add(1, Ordering::Relaxed);
				debug!(listener = %task.listener, "listener queue closed, dropping event");
				false
			}
		}
	}

	pub fn stats(&self) -> DispatchStats {
		DispatchStats {
			dispatched: self.counters.dispatched.load(Ordering::Relaxed),
			completed: self.counters.completed.load(Ordering::Relaxed),
			failed: self.counters.failed.load(Ordering::Relaxed),
			timed_out: self.counters.timed_out.load(Ordering::Relaxed),
			dropped: self.counters.dropped.load(Ordering::Relaxed),
		}
	}

	pub fn task_timeout(&self) -> Duration {
		self.task_timeout
	}

	pub fn is_shut_down(&self) -> bool {
		self.tx.read().is_none()
	}

	/// Closes the queue, lets the workers drain what is already queued, and
	/// waits for them to exit. Safe to call more than once.
	pub async fn shutdown(&self) {
		let sender = self.tx.write().take();
		if sender.is_none() {
			return;
		}
		drop(sender);

		let handles: Vec<_> = std::mem::take(&mut *self.workers.lock());
		for handle in handles {
			let _ = handle.await;
		}
		info!("Listener dispatcher stopped");
	}
}

impl std::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dispatcher")
			.field("task_timeout", &self.task_timeout)
			.field("stats", &self.stats())
			.finish()
	}
}

async fn run_worker(
	worker: usize,
	rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>,
	counters: Arc<Counters>,
	task_timeout: Duration,
) {
	loop {
		let task = {
			let mut rx = rx.lock().await;
			rx.recv().await
		};
		let Some(Task { listener, job }) = task else {
			debug!(worker, "dispatcher worker exiting");
			break;
		};

		match tokio::time::timeout(task_timeout, AssertUnwindSafe(job).catch_unwind()).await {
			Ok(Ok(Ok(()))) => {
				counters.completed.fetch_add(1, Ordering::Relaxed);
			}
			Ok(Ok(Err(e))) => {
				counters.failed.fetch_add(1, Ordering::Relaxed);
				warn!(listener = %listener, error = %e, "listener failed");
			}
			Ok(Err(_)) => {
				counters.failed.fetch_add(1, Ordering::Relaxed);
				warn!(listener = %listener, "listener panicked");
			}
			Err(_) => {
				counters.timed_out.fetch_add(1, Ordering::Relaxed);
				warn!(
					listener = %listener,
					timeout_ms = task_timeout.as_millis() as u64,
					"listener timed out"
				);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::AtomicUsize;

	async fn failing() -> Result<(), ListenerError> {
		Err(ListenerError::failed("boom"))
	}

	async fn panicking() -> Result<(), ListenerError> {
		panic!("listener bug")
	}

	fn hanging() -> ListenerJob {
		Box::pin(futures::future::pending::<Result<(), ListenerError>>())
	}

	fn ok_job(counter: Arc<AtomicUsize>) -> ListenerJob {
		Box::pin(async move {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		})
	}

	#[tokio::test]
	async fn test_runs_jobs_and_drains_on_shutdown() {
		let dispatcher = Dispatcher::new(2, 16, Duration::from_secs(1));
		let counter = Arc::new(AtomicUsize::new(0));
		for _ in 0..10 {
			assert!(dispatcher.dispatch("counter", ok_job(Arc::clone(&counter))));
		}

		dispatcher.shutdown().await;
		assert_eq!(counter.load(Ordering::SeqCst), 10);
		let stats = dispatcher.stats();
		assert_eq!(stats.dispatched, 10);
		assert_eq!(stats.completed, 10);
		assert_eq!(stats.dropped, 0);
	}

	#[tokio::test]
	async fn test_failing_and_panicking_jobs_are_contained() {
		let dispatcher = Dispatcher::new(1, 16, Duration::from_secs(1));
		let counter = Arc::new(AtomicUsize::new(0));

		dispatcher.dispatch("failing", Box::pin(failing()));
		dispatcher.dispatch("panicking", Box::pin(panicking()));
		dispatcher.dispatch("counter", ok_job(Arc::clone(&counter)));

		dispatcher.shutdown().await;
		assert_eq!(counter.load(Ordering::SeqCst), 1);
		let stats = dispatcher.stats();
		assert_eq!(stats.failed, 2);
		assert_eq!(stats.completed, 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_hanging_job_times_out_and_frees_worker() {
		let dispatcher = Dispatcher::new(1, 16, Duration::from_millis(100));
		let counter = Arc::new(AtomicUsize::new(0));

		dispatcher.dispatch("hanging", hanging());
		dispatcher.dispatch("counter", ok_job(Arc::clone(&counter)));

		tokio::time::sleep(Duration::from_millis(150)).await;
		assert_eq!(counter.load(Ordering::SeqCst), 1);
		assert_eq!(dispatcher.stats().timed_out, 1);
		dispatcher.shutdown().await;
	}

	#[tokio::test(start_paused = true)]
	async fn test_full_queue_drops_without_blocking() {
		let dispatcher = Dispatcher::new(1, 1, Duration::from_secs(10));
		// Occupies the only worker.
		dispatcher.dispatch("hanging", hanging());
		tokio::time::sleep(Duration::from_millis(1)).await;

		let counter = Arc::new(AtomicUsize::new(0));
		assert!(dispatcher.dispatch("queued", ok_job(Arc::clone(&counter))));
		assert!(!dispatcher.dispatch("overflow", ok_job(Arc::clone(&counter))));
		assert_eq!(dispatcher.stats().dropped, 1);

		tokio::time::sleep(Duration::from_secs(11)).await;
		assert_eq!(counter.load(Ordering::SeqCst), 1);
		dispatcher.shutdown().await;
	}

	#[tokio::test]
	async fn test_dispatch_does_not_wait_on_other_dispatchers() {
		let dispatcher = Dispatcher::new(1, 16, Duration::from_secs(1));
		let counter = Arc::new(AtomicUsize::new(0));

		// A dispatch in flight elsewhere holds the sender for reading.
		let in_flight = dispatcher.tx.read();
		assert!(dispatcher.dispatch("counter", ok_job(Arc::clone(&counter))));
		drop(in_flight);

		dispatcher.shutdown().await;
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_dispatch_from_many_threads() {
		let dispatcher = Arc::new(Dispatcher::new(4, 1024, Duration::from_secs(1)));
		let counter = Arc::new(AtomicUsize::new(0));

		let threads: Vec<_> = (0..8)
			.map(|_| {
				let dispatcher = Arc::clone(&dispatcher);
				let counter = Arc::clone(&counter);
				std::thread::spawn(move || {
					for _ in 0..100 {
						dispatcher.dispatch("counter", ok_job(Arc::clone(&counter)));
					}
				})
			})
			.collect();
		for thread in threads {
			thread.join().unwrap();
		}

		dispatcher.shutdown().await;
		let stats = dispatcher.stats();
		assert_eq!(stats.dispatched + stats.dropped, 800);
		assert_eq!(counter.load(Ordering::SeqCst) as u64, stats.dispatched);
	}

	#[tokio::test]
	async fn test_dispatch_after_shutdown_is_dropped() {
		let dispatcher = Dispatcher::new(1, 4, Duration::from_secs(1));
		dispatcher.shutdown().await;
		dispatcher.shutdown().await;
		assert!(dispatcher.is_shut_down());

		let counter = Arc::new(AtomicUsize::new(0));
		assert!(!dispatcher.dispatch("late", ok_job(Arc::clone(&counter))));
		assert_eq!(dispatcher.stats().dropped, 1);
		assert_eq!(counter.load(Ordering::SeqCst), 0);
	}
}
