// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshCounts {
	/// Cycles led by this client.
	pub attempts: u64,
	/// Cycles that produced new credentials.
	pub successes: u64,
	/// Cycles that ended the session.
	pub failures: u64,
	/// Requests that waited on a cycle led by another request.
	pub queued: u64,
}

/// Counters for refresh cycles, shared by every clone of a client.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
	queued: AtomicU64,
}
impl RefreshMetrics {
	/// Cycles led by this client.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Cycles that produced new credentials.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Cycles that ended the session.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Requests that waited on a cycle led by another request.
	pub fn queued(&self) -> u64 {
		self.queued.load(Ordering::Relaxed)
	}

	/// Reads every counter at once.
	pub fn snapshot(&self) -> RefreshCounts {
		RefreshCounts {
			attempts: self.attempts(),
			successes: self.successes(),
			failures: self.failures(),
			queued: self.queued(),
		}
	}

	pub(crate) fn record_attempt(&self) {
		bump(&self.attempts);
	}

	pub(crate) fn record_success(&self) {
		bump(&self.successes);
	}

	pub(crate) fn record_failure(&self) {
		bump(&self.failures);
	}

	pub(crate) fn record_queued(&self) {
		bump(&self.queued);
	}
}

fn bump(counter: &AtomicU64) {
	counter.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn snapshot_reflects_recorded_events() {
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();
		metrics.record_queued();
		metrics.record_queued();
		metrics.record_failure();

		assert_eq!(
			metrics.snapshot(),
			RefreshCounts { attempts: 1, successes: 0, failures: 1, queued: 2 }
		);
	}
}
