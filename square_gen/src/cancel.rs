use std::{
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  time::{Duration, Instant},
};

/// How many search steps pass between deadline checks. Reading the clock on
/// every step costs more than the step itself.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

/// A stop request shared between a search and whoever is driving it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }
}

/// `None` when `limit` is too large to represent as an `Instant`, which is
/// treated as no deadline at all.
pub(crate) fn deadline_after(start: Instant, limit: Duration) -> Option<Instant> {
  start.checked_add(limit)
}

#[derive(Clone, Debug)]
pub(crate) struct Stopper {
  cancel: CancelToken,
  deadline: Option<Instant>,
  steps: u64,
}

impl Stopper {
  pub(crate) fn new(cancel: CancelToken, time_limit: Option<Duration>) -> Self {
    Self::with_deadline(cancel, time_limit.and_then(|limit| deadline_after(Instant::now(), limit)))
  }

  pub(crate) fn with_deadline(cancel: CancelToken, deadline: Option<Instant>) -> Self {
    Self { cancel, deadline, steps: 0 }
  }

  /// Called once per search step. The flag is read every time, the clock only
  /// at seed boundaries and every `DEADLINE_CHECK_INTERVAL` steps.
  pub(crate) fn should_stop(&mut self, seed_boundary: bool) -> bool {
    self.steps += 1;
    if self.cancel.is_cancelled() {
      return true;
    }

    match self.deadline {
      Some(deadline) if seed_boundary || self.steps.is_multiple_of(DEADLINE_CHECK_INTERVAL) => {
        Instant::now() >= deadline
      }
      _ => false,
    }
  }
}
