//! In-process counters for dispatch outcomes.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::DispatchOutcome;

/// Thread-safe counters for dispatch outcomes.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	rejected: AtomicU64,
	failure: AtomicU64,
	preflight: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the number of non-preflight requests that entered the pipeline.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of requests answered with a 2xx status.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of requests answered with a 4xx status.
	pub fn rejections(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Returns the number of requests answered with a 5xx status.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of CORS preflights answered.
	pub fn preflights(&self) -> u64 {
		self.preflight.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record(&self, outcome: DispatchOutcome) {
		let counter = match outcome {
			DispatchOutcome::Preflight => &self.preflight,
			DispatchOutcome::Success => &self.success,
			DispatchOutcome::Rejected => &self.rejected,
			DispatchOutcome::Failure => &self.failure,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
