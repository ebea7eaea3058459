//! Periodic sweep of dead revocation entries, driven by its own tokio timer.

// crates.io
use tokio::{task::JoinHandle, time::MissedTickBehavior};
// self
use crate::{_prelude::*, error::ConfigError, revocation::RevocationRegistry};

/// Spawns the background sweep task.
#[derive(Clone, Copy, Debug)]
pub struct RevocationSweeper;
impl RevocationSweeper {
	/// Reference sweep period (one hour).
	pub const DEFAULT_PERIOD: StdDuration = StdDuration::from_secs(3_600);
	/// Longest accepted sweep period (one week).
	pub const MAX_PERIOD: StdDuration = StdDuration::from_secs(7 * 86_400);

	/// Rejects zero periods and periods above [`RevocationSweeper::MAX_PERIOD`].
	pub fn check_period(period: StdDuration) -> Result<(), ConfigError> {
		if period.is_zero() || period > Self::MAX_PERIOD {
			return Err(ConfigError::InvalidSweepInterval);
		}

		Ok(())
	}

	/// Starts sweeping `registry` every `period`, first after one full period.
	///
	/// Must be called from within a tokio runtime. The task stops when the returned handle is
	/// dropped or shut down.
	pub fn spawn(
		registry: Arc<dyn RevocationRegistry>,
		period: StdDuration,
	) -> Result<SweeperHandle, ConfigError> {
		Self::check_period(period)?;

		let start = tokio::time::Instant::now()
			.checked_add(period)
			.ok_or(ConfigError::InvalidSweepInterval)?;
		let task = tokio::spawn(async move {
			let mut ticker = tokio::time::interval_at(start, period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				ticker.tick().await;

				match registry.sweep().await {
					Ok(0) => tracing::debug!("Revocation sweep found no dead entries."),
					Ok(removed) => tracing::info!(removed, "Swept dead revocation entries."),
					Err(e) => tracing::warn!(error = %e, "Revocation sweep failed."),
				}
			}
		});

		Ok(SweeperHandle(Some(task)))
	}
}

/// Owner of the sweep task; aborts it on drop.
#[derive(Debug)]
pub struct SweeperHandle(Option<JoinHandle<()>>);
impl SweeperHandle {
	/// Stops the sweep task.
	pub fn shutdown(mut self) {
		if let Some(task) = self.0.take() {
			task.abort();
		}
	}

	/// Returns `true` once the task has stopped.
	pub fn is_finished(&self) -> bool {
		self.0.as_ref().is_none_or(JoinHandle::is_finished)
	}
}
impl Drop for SweeperHandle {
	fn drop(&mut self) {
		if let Some(task) = self.0.take() {
			task.abort();
		}
	}
}
