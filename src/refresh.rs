//! Single-flight refresh coordination.
//!
//! [`RefreshCoordinator`] owns the refresh-in-progress flag and the queue of waiters blocked on
//! it. A request that observes a 401 calls [`RefreshCoordinator::acquire_or_wait`] and gets one
//! of three tickets:
//!
//! - [`RefreshTicket::Lead`]: no refresh is running; the caller performs the exchange and must
//!   settle the returned [`RefreshLease`].
//! - [`RefreshTicket::Wait`]: a refresh is running; the caller awaits its outcome.
//! - [`RefreshTicket::Settled`]: a refresh settled after the caller's request was sent, so the
//!   401 belongs to that cycle and its outcome is reused instead of starting another exchange.
//!
//! Settling drains every waiter exactly once with a clone of the same outcome, bumps the epoch,
//! and clears the flag in one critical section. A lease dropped without being settled settles
//! itself as [`RefreshFailureReason::Abandoned`], so waiters never hang and the flag is always
//! cleared.

mod failure;
mod metrics;

pub use failure::*;
pub use metrics::{RefreshCounts, RefreshMetrics};

// std
use std::mem;
// crates.io
use futures::channel::oneshot;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Result every participant of a refresh cycle observes: the new access token or the failure.
pub type RefreshOutcome = Result<TokenSecret, RefreshFailure>;

#[derive(Debug, Default)]
struct CoordinatorState {
	refreshing: bool,
	waiters: Vec<oneshot::Sender<RefreshOutcome>>,
	epoch: u64,
	last: Option<RefreshOutcome>,
}

/// Process-wide refresh flag, waiter queue, and settle history.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	state: Mutex<CoordinatorState>,
}
impl RefreshCoordinator {
	/// Number of refresh cycles settled so far.
	///
	/// Callers read the epoch before loading the access token they send; passing it back to
	/// [`acquire_or_wait`](Self::acquire_or_wait) ties a later 401 to the right cycle.
	pub fn epoch(&self) -> u64 {
		self.state.lock().epoch
	}

	/// Returns `true` while a refresh exchange is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().refreshing
	}

	/// Number of waiters queued behind the in-flight refresh.
	pub fn pending(&self) -> usize {
		self.state.lock().waiters.len()
	}

	/// Joins the refresh cycle responsible for a 401 observed on a request sent at
	/// `observed_epoch`.
	pub fn acquire_or_wait(self: &Arc<Self>, observed_epoch: u64) -> RefreshTicket {
		let mut state = self.state.lock();

		if state.refreshing {
			let (tx, rx) = oneshot::channel();

			state.waiters.push(tx);

			return RefreshTicket::Wait(RefreshWaiter(rx));
		}
		if state.epoch > observed_epoch
			&& let Some(outcome) = state.last.clone()
		{
			return RefreshTicket::Settled(outcome);
		}

		state.refreshing = true;

		RefreshTicket::Lead(RefreshLease { coordinator: Arc::clone(self), settled: false })
	}

	fn settle(&self, outcome: RefreshOutcome) -> usize {
		let mut state = self.state.lock();
		let waiters = mem::take(&mut state.waiters);
		let drained = waiters.len();

		for waiter in waiters {
			// A dropped receiver means the caller gave up; nothing left to notify.
			let _ = waiter.send(outcome.clone());
		}

		state.epoch += 1;
		state.last = Some(outcome);
		state.refreshing = false;

		drained
	}
}

/// Role assigned to a request that observed a 401.
#[derive(Debug)]
pub enum RefreshTicket {
	/// Perform the exchange and settle the lease.
	Lead(RefreshLease),
	/// Await the in-flight exchange.
	Wait(RefreshWaiter),
	/// Reuse the outcome of a cycle that settled after the request was sent.
	Settled(RefreshOutcome),
}

/// Exclusive right to run the refresh exchange.
pub struct RefreshLease {
	coordinator: Arc<RefreshCoordinator>,
	settled: bool,
}
impl RefreshLease {
	/// Drains every waiter with `outcome`, clears the flag, and returns the number of waiters
	/// notified.
	pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
		self.settled = true;

		self.coordinator.settle(outcome)
	}
}
impl Debug for RefreshLease {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshLease").field("settled", &self.settled).finish()
	}
}
impl Drop for RefreshLease {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.settle(Err(RefreshFailure::abandoned()));
		}
	}
}

/// Completion handle for a request queued behind the in-flight refresh.
#[derive(Debug)]
pub struct RefreshWaiter(oneshot::Receiver<RefreshOutcome>);
impl RefreshWaiter {
	/// Resolves once the in-flight refresh settles.
	pub async fn outcome(self) -> RefreshOutcome {
		self.0.await.unwrap_or_else(|_| Err(RefreshFailure::abandoned()))
	}
}
