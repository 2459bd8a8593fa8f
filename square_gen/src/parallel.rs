use std::time::Instant;

use rayon::{prelude::*, ThreadPoolBuilder};
use util::error::{SquareError, SquareResult};

use crate::{
  cancel::{deadline_after, CancelToken, Stopper},
  prefix_index::PrefixIndex,
  search::{Backtracker, Emitter, PlacedRows, SearchConfig, SearchResult, StopReason},
};

/// Seeds handed to each worker per batch. Batches are merged in seed order
/// before the next one starts, so the result cap is honored within a batch.
const SEEDS_PER_WORKER: usize = 4;

#[derive(Debug)]
pub struct ParallelOutcome {
  pub results: Vec<SearchResult>,
  pub stop_reason: StopReason,
}

fn search_seed(
  index: &PrefixIndex<'_>,
  config: &SearchConfig,
  seed: u32,
  seed_offset: usize,
  stopper: Stopper,
) -> (Vec<PlacedRows>, bool) {
  let mut backtracker = Backtracker::new(
    index,
    vec![seed],
    seed_offset,
    config.pruning,
    config.log_details,
    stopper,
  );
  let placed: Vec<_> = backtracker.by_ref().collect();
  (placed, backtracker.was_cancelled())
}

/// Runs the same search as `SquareSearch` with the seed words spread over
/// `threads` workers. Results, ordinals and de-duplication match a
/// sequential run with the same configuration.
pub fn search_parallel(
  index: &PrefixIndex<'_>,
  config: &SearchConfig,
  threads: usize,
  cancel: CancelToken,
) -> SquareResult<ParallelOutcome> {
  config.validate()?;
  if threads == 0 {
    return Err(SquareError::InvalidConfiguration("threads must be positive".to_owned()).into());
  }

  let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
  let seeds = config.seed_pool(index.corpus());
  let deadline = config.time_limit.and_then(|limit| deadline_after(Instant::now(), limit));
  let mut emitter = Emitter::new(index.corpus(), config, seeds.len());
  let mut results = Vec::new();

  log::info!(
    "Searching {0}x{0} squares from {1} start words on {threads} threads",
    index.word_len(),
    seeds.len()
  );

  let batch_size = threads * SEEDS_PER_WORKER;
  for (batch_num, batch) in seeds.chunks(batch_size).enumerate() {
    let offset = batch_num * batch_size;
    let searched: Vec<(Vec<PlacedRows>, bool)> = pool.install(|| {
      batch
        .par_iter()
        .enumerate()
        .map(|(i, &seed)| {
          search_seed(
            index,
            config,
            seed,
            offset + i,
            Stopper::with_deadline(cancel.clone(), deadline),
          )
        })
        .collect()
    });

    let cancelled = searched.iter().any(|(_, cancelled)| *cancelled);
    for placed in searched.into_iter().flat_map(|(placed, _)| placed) {
      if emitter.is_full() {
        break;
      }
      if let Some(result) = emitter.accept(placed) {
        results.push(result);
      }
    }

    if emitter.is_full() {
      return Ok(ParallelOutcome { results, stop_reason: StopReason::MaxResults });
    }
    if cancelled {
      log::info!("Search cancelled after {} squares", results.len());
      return Ok(ParallelOutcome { results, stop_reason: StopReason::Cancelled });
    }
  }

  Ok(ParallelOutcome { results, stop_reason: StopReason::Exhausted })
}
