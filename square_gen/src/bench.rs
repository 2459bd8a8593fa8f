use std::{
  fmt::Display,
  time::{Duration, Instant},
};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use util::{
  error::{SquareError, SquareResult},
  time::time_fn,
};

use crate::{
  cancel::{deadline_after, CancelToken, Stopper},
  prefix_index::PrefixIndex,
  search::{Backtracker, SearchConfig},
};

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
  pub time_budget: Duration,
  pub max_attempts: Option<usize>,
  /// Seeds the shuffle of the start words, so runs are comparable.
  pub shuffle_seed: u64,
  pub top_n: Option<usize>,
  pub pruning: bool,
}

impl Default for BenchmarkConfig {
  fn default() -> Self {
    Self {
      time_budget: Duration::from_secs(10),
      max_attempts: None,
      shuffle_seed: 123,
      top_n: None,
      pruning: true,
    }
  }
}

impl BenchmarkConfig {
  pub fn validate(&self) -> SquareResult {
    if self.max_attempts == Some(0) {
      return Err(
        SquareError::InvalidConfiguration("max_attempts must be positive".to_owned()).into(),
      );
    }
    self.search_config().validate()
  }

  fn search_config(&self) -> SearchConfig {
    SearchConfig {
      top_n: self.top_n,
      pruning: self.pruning,
      ..SearchConfig::default()
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BenchmarkReport {
  pub attempts: usize,
  pub squares: usize,
  pub elapsed: Duration,
  /// Sum of the attempt times, excluding the runner's own bookkeeping.
  pub attempt_time: Duration,
  pub min_attempt: Option<Duration>,
  pub max_attempt: Option<Duration>,
}

impl BenchmarkReport {
  fn record(&mut self, time: Duration, squares: usize) {
    self.attempts += 1;
    self.squares += squares;
    self.attempt_time += time;
    self.min_attempt = Some(self.min_attempt.map_or(time, |min| min.min(time)));
    self.max_attempt = Some(self.max_attempt.map_or(time, |max| max.max(time)));
  }

  pub fn mean_attempt(&self) -> Option<Duration> {
    u32::try_from(self.attempts)
      .ok()
      .filter(|&attempts| attempts > 0)
      .map(|attempts| self.attempt_time / attempts)
  }

  pub fn squares_per_sec(&self) -> f64 {
    let secs = self.elapsed.as_secs_f64();
    if secs > 0. {
      self.squares as f64 / secs
    } else {
      0.
    }
  }
}

impl Display for BenchmarkReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "Ran {} attempts, {} squares in {:.1} sec, or {:.0} squares/sec",
      self.attempts,
      self.squares,
      self.elapsed.as_secs_f64(),
      self.squares_per_sec()
    )
  }
}

/// Times full searches from one start word at a time. Start words are drawn
/// from the seed pool in a fixed shuffled order and cycled until a budget
/// runs out.
pub struct BenchmarkRunner<'a> {
  index: &'a PrefixIndex<'a>,
  config: BenchmarkConfig,
}

impl<'a> BenchmarkRunner<'a> {
  pub fn new(index: &'a PrefixIndex<'a>, config: BenchmarkConfig) -> SquareResult<Self> {
    config.validate()?;
    Ok(Self { index, config })
  }

  pub(crate) fn shuffled_seeds(&self) -> Vec<u32> {
    let mut seeds = self.config.search_config().seed_pool(self.index.corpus());
    seeds.shuffle(&mut StdRng::seed_from_u64(self.config.shuffle_seed));
    seeds
  }

  fn attempt(&self, seed: u32, deadline: Option<Instant>) -> usize {
    Backtracker::new(
      self.index,
      vec![seed],
      0,
      self.config.pruning,
      false,
      Stopper::with_deadline(CancelToken::new(), deadline),
    )
    .count()
  }

  pub fn run(&self) -> BenchmarkReport {
    let seeds = self.shuffled_seeds();
    let start = Instant::now();
    let deadline = deadline_after(start, self.config.time_budget);
    let mut report = BenchmarkReport::default();

    log::info!(
      "Benchmarking {} start words for up to {:.1} sec",
      seeds.len(),
      self.config.time_budget.as_secs_f64()
    );

    for &seed in seeds.iter().cycle() {
      if self
        .config
        .max_attempts
        .is_some_and(|max_attempts| report.attempts >= max_attempts)
        || deadline.is_some_and(|deadline| Instant::now() >= deadline)
      {
        break;
      }

      let (time, squares) = time_fn(|| self.attempt(seed, deadline));
      report.record(time, squares);
    }

    report.elapsed = start.elapsed();
    log::info!(
      "Attempt times: mean {:?}, min {:?}, max {:?}",
      report.mean_attempt().unwrap_or_default(),
      report.min_attempt.unwrap_or_default(),
      report.max_attempt.unwrap_or_default()
    );
    report
  }
}
