//! Thread-safe in-memory fixed-window [`RateLimitPolicy`] for single-process deployments and
//! tests.

// self
use crate::{
	_prelude::*,
	auth::{MethodName, UserId},
	ext::{CollaboratorFuture, RateLimitContext, RateLimitPolicy},
};

/// Number of calls allowed per window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitQuota {
	/// Calls allowed inside one window; `0` blocks the method entirely.
	pub limit: u32,
	/// Window length.
	pub window: Duration,
}
impl RateLimitQuota {
	/// Creates a quota of `limit` calls per `window`.
	pub const fn new(limit: u32, window: Duration) -> Self {
		Self { limit, window }
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BucketKey {
	method: MethodName,
	identity: Option<UserId>,
}

#[derive(Clone, Copy, Debug)]
struct Window {
	started_at: OffsetDateTime,
	count: u32,
}

#[derive(Debug)]
struct WindowTable {
	buckets: HashMap<BucketKey, Window>,
	sweep_at: usize,
}

/// Fixed-window limiter keyed by `(method, identity)`.
///
/// Anonymous calls to the same method share a single bucket. Finished windows are swept
/// whenever the table reaches its sweep threshold, after which the threshold moves to twice
/// the surviving size.
#[derive(Clone, Debug)]
pub struct MemoryRateLimiter {
	default_quota: RateLimitQuota,
	overrides: HashMap<MethodName, RateLimitQuota>,
	sweep_threshold: usize,
	windows: Arc<Mutex<WindowTable>>,
}
impl MemoryRateLimiter {
	/// Table size that triggers the first sweep of finished windows.
	pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

	/// Creates a limiter applying `default_quota` to every method.
	pub fn new(default_quota: RateLimitQuota) -> Self {
		Self::with_sweep_threshold(default_quota, Self::DEFAULT_SWEEP_THRESHOLD)
	}

	/// Creates a limiter that sweeps finished windows once `threshold` buckets are tracked.
	pub fn with_sweep_threshold(default_quota: RateLimitQuota, threshold: usize) -> Self {
		let threshold = threshold.max(1);

		Self {
			default_quota,
			overrides: HashMap::new(),
			sweep_threshold: threshold,
			windows: Arc::new(Mutex::new(WindowTable {
				buckets: HashMap::new(),
				sweep_at: threshold,
			})),
		}
	}

	/// Overrides the quota for one method.
	pub fn with_method_quota(mut self, method: MethodName, quota: RateLimitQuota) -> Self {
		self.overrides.insert(method, quota);

		self
	}

	/// Quota applied to `method`.
	pub fn quota_for(&self, method: &str) -> RateLimitQuota {
		self.overrides.get(method).copied().unwrap_or(self.default_quota)
	}

	/// Drops windows that ended before `now`; returns how many were removed.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		self.retain_live(&mut self.windows.lock().buckets, now)
	}

	/// Number of buckets currently tracked.
	pub fn tracked(&self) -> usize {
		self.windows.lock().buckets.len()
	}

	fn retain_live(&self, buckets: &mut HashMap<BucketKey, Window>, now: OffsetDateTime) -> usize {
		let before = buckets.len();

		buckets.retain(|key, window| now - window.started_at < self.quota_for(&key.method).window);

		before - buckets.len()
	}

	fn check_now(
		&self,
		method: &MethodName,
		identity: Option<UserId>,
		now: OffsetDateTime,
	) -> bool {
		let quota = self.quota_for(method);

		if quota.limit == 0 {
			return false;
		}

		let key = BucketKey { method: method.clone(), identity };
		let mut guard = self.windows.lock();
		let table = &mut *guard;

		if table.buckets.len() >= table.sweep_at && !table.buckets.contains_key(&key) {
			self.retain_live(&mut table.buckets, now);

			table.sweep_at = (table.buckets.len() * 2).max(self.sweep_threshold);
		}

		let window = table.buckets.entry(key).or_insert(Window { started_at: now, count: 0 });

		if now - window.started_at >= quota.window {
			*window = Window { started_at: now, count: 0 };
		}
		if window.count >= quota.limit {
			return false;
		}

		window.count += 1;

		true
	}
}
impl RateLimitPolicy for MemoryRateLimiter {
	fn check<'a>(&'a self, context: &'a RateLimitContext<'a>) -> CollaboratorFuture<'a, bool> {
		let allowed = self.check_now(context.method, context.identity, context.observed_at);

		Box::pin(async move { Ok(allowed) })
	}
}
