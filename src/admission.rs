//! Process-wide admission control backed by an intervally refilled token bucket.
//!
//! Every inbound request, exempt paths included, consumes one token. The bucket holds at most
//! `capacity` tokens and regains `refill_tokens` once per elapsed `refill_interval`, so a burst
//! that drains it is refused until the next interval boundary.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	obs::{self, FlowKind, FlowOutcome},
};

/// Admission contract consulted before any other request processing.
pub trait AdmissionControl
where
	Self: Send + Sync,
{
	/// Takes one token, or reports how long until one becomes available.
	fn try_acquire(&self) -> AdmissionDecision;
}

/// Outcome of an admission attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdmissionDecision {
	/// Whether the caller may proceed.
	pub granted: bool,
	/// Tokens left after this attempt.
	pub remaining: u64,
	/// Wait before a token becomes available; zero when granted.
	pub retry_after: StdDuration,
}

/// Bucket parameters; construct through [`BucketConfig::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketConfig {
	capacity: u64,
	refill_tokens: u64,
	refill_interval: StdDuration,
}
impl BucketConfig {
	/// Longest accepted refill interval.
	pub const MAX_REFILL_INTERVAL: StdDuration = StdDuration::from_secs(86_400);

	/// Creates a validated configuration.
	pub fn new(
		capacity: u64,
		refill_tokens: u64,
		refill_interval: StdDuration,
	) -> Result<Self, ConfigError> {
		if capacity == 0 {
			return Err(ConfigError::InvalidRateLimit { field: "capacity" });
		}
		if refill_tokens == 0 {
			return Err(ConfigError::InvalidRateLimit { field: "refill_tokens" });
		}
		if refill_interval.is_zero() || refill_interval > Self::MAX_REFILL_INTERVAL {
			return Err(ConfigError::InvalidRateLimit { field: "refill_interval" });
		}

		Ok(Self { capacity, refill_tokens, refill_interval })
	}

	/// Maximum number of stored tokens.
	pub fn capacity(&self) -> u64 {
		self.capacity
	}

	/// Tokens added per elapsed interval.
	pub fn refill_tokens(&self) -> u64 {
		self.refill_tokens
	}

	/// Refill interval.
	pub fn refill_interval(&self) -> StdDuration {
		self.refill_interval
	}
}
impl Default for BucketConfig {
	fn default() -> Self {
		Self { capacity: 100, refill_tokens: 100, refill_interval: StdDuration::from_secs(60) }
	}
}

#[derive(Debug)]
struct BucketState {
	tokens: u64,
	last_refill: Instant,
}
impl BucketState {
	fn refill(&mut self, config: &BucketConfig, now: Instant) {
		let elapsed = now.saturating_duration_since(self.last_refill);
		let intervals = elapsed.as_nanos() / config.refill_interval.as_nanos();

		if intervals == 0 {
			return;
		}

		let added = u64::try_from(intervals)
			.unwrap_or(u64::MAX)
			.saturating_mul(config.refill_tokens);

		self.tokens = self.tokens.saturating_add(added).min(config.capacity);
		// Keep the phase of the interval grid so partial intervals are not lost.
		self.last_refill = u32::try_from(intervals)
			.ok()
			.and_then(|n| config.refill_interval.checked_mul(n))
			.and_then(|advance| self.last_refill.checked_add(advance))
			.unwrap_or(now);
	}
}

/// Snapshot of admission counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdmissionStats {
	/// Granted attempts.
	pub granted: u64,
	/// Refused attempts.
	pub denied: u64,
}

/// Global token bucket shared by every request.
#[derive(Debug)]
pub struct TokenBucket {
	config: BucketConfig,
	state: Mutex<BucketState>,
	granted: AtomicU64,
	denied: AtomicU64,
}
impl TokenBucket {
	/// Creates a full bucket starting now.
	pub fn new(config: BucketConfig) -> Self {
		Self::starting_at(config, Instant::now())
	}

	/// Creates a full bucket whose refill grid starts at `start`.
	pub fn starting_at(config: BucketConfig, start: Instant) -> Self {
		Self {
			config,
			state: Mutex::new(BucketState { tokens: config.capacity, last_refill: start }),
			granted: AtomicU64::new(0),
			denied: AtomicU64::new(0),
		}
	}

	/// Bucket parameters.
	pub fn config(&self) -> &BucketConfig {
		&self.config
	}

	/// Deterministic twin of [`AdmissionControl::try_acquire`].
	pub fn try_acquire_at(&self, now: Instant) -> AdmissionDecision {
		let decision = {
			let mut state = self.state.lock();

			state.refill(&self.config, now);

			if state.tokens > 0 {
				state.tokens -= 1;

				AdmissionDecision {
					granted: true,
					remaining: state.tokens,
					retry_after: StdDuration::ZERO,
				}
			} else {
				let retry_after = state
					.last_refill
					.checked_add(self.config.refill_interval)
					.map_or(self.config.refill_interval, |next| next.saturating_duration_since(now));

				AdmissionDecision { granted: false, remaining: 0, retry_after }
			}
		};

		if decision.granted {
			self.granted.fetch_add(1, Ordering::Relaxed);
			obs::record_flow_outcome(FlowKind::Admission, FlowOutcome::Success);
		} else {
			self.denied.fetch_add(1, Ordering::Relaxed);
			obs::record_flow_outcome(FlowKind::Admission, FlowOutcome::Failure);
		}

		decision
	}

	/// Returns the admission counters.
	pub fn stats(&self) -> AdmissionStats {
		AdmissionStats {
			granted: self.granted.load(Ordering::Relaxed),
			denied: self.denied.load(Ordering::Relaxed),
		}
	}
}
impl Default for TokenBucket {
	fn default() -> Self {
		Self::new(BucketConfig::default())
	}
}
impl AdmissionControl for TokenBucket {
	fn try_acquire(&self) -> AdmissionDecision {
		self.try_acquire_at(Instant::now())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn bucket(capacity: u64, refill: u64, secs: u64) -> (TokenBucket, Instant) {
		let start = Instant::now();
		let config = BucketConfig::new(capacity, refill, StdDuration::from_secs(secs))
			.expect("Bucket fixture should be valid.");

		(TokenBucket::starting_at(config, start), start)
	}

	#[test]
	fn capacity_requests_pass_and_the_next_is_refused() {
		let (bucket, start) = bucket(100, 100, 60);

		for expected_remaining in (0..100).rev() {
			let decision = bucket.try_acquire_at(start);

			assert!(decision.granted);
			assert_eq!(decision.remaining, expected_remaining);
		}

		let refused = bucket.try_acquire_at(start);

		assert!(!refused.granted);
		assert_eq!(refused.remaining, 0);
		assert_eq!(refused.retry_after, StdDuration::from_secs(60));
		assert_eq!(bucket.stats(), AdmissionStats { granted: 100, denied: 1 });
	}

	#[test]
	fn retry_after_shrinks_toward_the_interval_boundary() {
		let (bucket, start) = bucket(1, 1, 60);

		assert!(bucket.try_acquire_at(start).granted);

		let refused = bucket.try_acquire_at(start + StdDuration::from_secs(45));

		assert!(!refused.granted);
		assert_eq!(refused.retry_after, StdDuration::from_secs(15));
	}

	#[test]
	fn refill_happens_per_whole_interval_and_caps_at_capacity() {
		let (bucket, start) = bucket(10, 4, 60);

		for _ in 0..10 {
			assert!(bucket.try_acquire_at(start).granted);
		}

		assert!(!bucket.try_acquire_at(start + StdDuration::from_secs(59)).granted);

		let after_one = bucket.try_acquire_at(start + StdDuration::from_secs(61));

		assert!(after_one.granted);
		assert_eq!(after_one.remaining, 3);

		let much_later = bucket.try_acquire_at(start + StdDuration::from_secs(3_600));

		assert_eq!(much_later.remaining, 9, "Refill must never exceed capacity.");
	}

	#[test]
	fn concurrent_callers_never_overdraw() {
		let (bucket, start) = bucket(100, 100, 60);
		let granted = AtomicU64::new(0);

		std::thread::scope(|scope| {
			for _ in 0..8 {
				scope.spawn(|| {
					for _ in 0..50 {
						if bucket.try_acquire_at(start).granted {
							granted.fetch_add(1, Ordering::Relaxed);
						}
					}
				});
			}
		});

		assert_eq!(granted.load(Ordering::Relaxed), 100);
		assert_eq!(bucket.stats().denied, 300);
	}

	#[test]
	fn zero_parameters_are_rejected() {
		assert!(BucketConfig::new(0, 1, StdDuration::from_secs(1)).is_err());
		assert!(BucketConfig::new(1, 0, StdDuration::from_secs(1)).is_err());
		assert!(BucketConfig::new(1, 1, StdDuration::ZERO).is_err());
	}

	#[test]
	fn oversized_intervals_are_rejected() {
		assert!(BucketConfig::new(1, 1, BucketConfig::MAX_REFILL_INTERVAL).is_ok());
		assert!(
			BucketConfig::new(1, 1, BucketConfig::MAX_REFILL_INTERVAL + StdDuration::from_secs(1))
				.is_err()
		);
		assert!(BucketConfig::new(1, 1, StdDuration::from_secs(u64::MAX)).is_err());
	}

	#[test]
	fn refusal_at_the_longest_interval_reports_a_bounded_wait() {
		let (bucket, start) = bucket(1, 1, BucketConfig::MAX_REFILL_INTERVAL.as_secs());

		assert!(bucket.try_acquire_at(start).granted);

		let refused = bucket.try_acquire_at(start);

		assert!(!refused.granted);
		assert_eq!(refused.retry_after, BucketConfig::MAX_REFILL_INTERVAL);
	}
}
