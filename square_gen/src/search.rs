use std::time::Duration;

use itertools::Itertools;
use square_dict::WordCorpus;
use util::error::{SquareError, SquareResult};

use crate::{
  cancel::{CancelToken, Stopper},
  classify::{Classification, DedupMode, SquareClassifier},
  prefix_index::{NodeId, PrefixIndex},
  square::CompletedSquare,
};

#[derive(Clone, Debug)]
pub struct SearchConfig {
  /// Only the `top_n` most frequent words are tried as the first row.
  pub top_n: Option<usize>,
  /// Emit only double squares that use no word twice.
  pub double_squares_only: bool,
  pub max_results: Option<usize>,
  /// Trace rejected rows and dead ends at debug level.
  pub log_details: bool,
  pub dedup: DedupMode,
  /// Prune rows whose columns cannot be completed. Turning this off tries
  /// every word at every depth, which is only useful for checking the pruning.
  pub pruning: bool,
  pub time_limit: Option<Duration>,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      top_n: None,
      double_squares_only: false,
      max_results: None,
      log_details: false,
      dedup: DedupMode::default(),
      pruning: true,
      time_limit: None,
    }
  }
}

impl SearchConfig {
  pub fn validate(&self) -> SquareResult {
    if self.top_n == Some(0) {
      return Err(SquareError::InvalidConfiguration("top_n must be positive".to_owned()).into());
    }
    Ok(())
  }

  /// Ranks of the words tried as the first row, most frequent first.
  pub fn seed_pool(&self, corpus: &WordCorpus) -> Vec<u32> {
    let pool_size = self.top_n.unwrap_or(usize::MAX).min(corpus.size());
    (0..pool_size as u32).collect()
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
  /// Every seed word was searched.
  Exhausted,
  MaxResults,
  /// Stopped by a `CancelToken` or the time limit.
  Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
  /// 1-based count of emitted squares.
  pub ordinal: usize,
  /// 1-based position of the first-row word in the seed pool.
  pub seed_index: usize,
  pub seed_pool_size: usize,
  pub seed_rank: u32,
  pub square: CompletedSquare,
  pub classification: Classification,
}

pub(crate) struct PlacedRows {
  pub(crate) rows: Vec<u32>,
  pub(crate) seed_index: usize,
}

struct Frame {
  candidates: Vec<u32>,
  next: usize,
  /// One trie node per column, for the letters placed above this frame.
  columns: Vec<NodeId>,
}

/// Depth-first row placement over an explicit frame stack. Frame `d` holds
/// the candidates for row `d`; `rows` holds the words chosen in frames
/// `0..d`.
pub(crate) struct Backtracker<'a> {
  index: &'a PrefixIndex<'a>,
  pruning: bool,
  log_details: bool,
  stopper: Stopper,
  frames: Vec<Frame>,
  rows: Vec<u32>,
  seed_offset: usize,
  seed_index: usize,
  seeds_tried: usize,
  cancelled: bool,
}

impl<'a> Backtracker<'a> {
  pub(crate) fn new(
    index: &'a PrefixIndex<'a>,
    seeds: Vec<u32>,
    seed_offset: usize,
    pruning: bool,
    log_details: bool,
    stopper: Stopper,
  ) -> Self {
    let word_len = index.word_len();
    let frames = if seeds.is_empty() {
      vec![]
    } else {
      vec![Frame {
        candidates: seeds,
        next: 0,
        columns: vec![PrefixIndex::ROOT; word_len],
      }]
    };

    Self {
      index,
      pruning,
      log_details,
      stopper,
      frames,
      rows: Vec::with_capacity(word_len),
      seed_offset,
      seed_index: 0,
      seeds_tried: 0,
      cancelled: false,
    }
  }

  pub(crate) fn was_cancelled(&self) -> bool {
    self.cancelled
  }

  pub(crate) fn seeds_tried(&self) -> usize {
    self.seeds_tried
  }

  fn path(&self) -> String {
    let corpus = self.index.corpus();
    self
      .rows
      .iter()
      .filter_map(|&rank| corpus.word(rank))
      .map(|word| word.text())
      .join("/")
  }

  fn next_candidate(&mut self, depth: usize) -> Option<u32> {
    let frame = &mut self.frames[depth];
    let rank = *frame.candidates.get(frame.next)?;
    frame.next += 1;
    let position = frame.next;

    if depth == 0 {
      self.seed_index = self.seed_offset + position;
      self.seeds_tried += 1;
      if self.log_details {
        if let Some(word) = self.index.corpus().word(rank) {
          log::debug!("{}: --- start word ---", word.text());
        }
      }
    }
    Some(rank)
  }

  /// Advances each column cursor by the letter the new row puts in that
  /// column. Candidates come from `fitting_words`, so every column has a child
  /// for its letter.
  fn extend_columns(&self, columns: &[NodeId], letters: &[u8]) -> Vec<NodeId> {
    let extended: Vec<NodeId> = columns
      .iter()
      .zip(letters)
      .filter_map(|(&column, &letter)| self.index.child(column, letter))
      .collect();
    debug_assert_eq!(extended.len(), columns.len());
    extended
  }

  fn columns_are_words(&self) -> bool {
    let corpus = self.index.corpus();
    let rows: Vec<&[u8]> = self
      .rows
      .iter()
      .filter_map(|&rank| corpus.word(rank))
      .map(|word| word.letters())
      .collect();

    rows.len() == self.rows.len()
      && (0..corpus.word_len()).all(|x| {
        let column: String = rows
          .iter()
          .filter_map(|letters| letters.get(x))
          .map(|&letter| letter as char)
          .collect();
        corpus.contains(&column)
      })
  }

  fn candidates(&self, columns: &[NodeId]) -> Vec<u32> {
    if self.pruning {
      self.index.fitting_words(columns)
    } else {
      (0..self.index.corpus().size() as u32).collect()
    }
  }

  fn cancel(&mut self) {
    self.cancelled = true;
    self.frames.clear();
    self.rows.clear();
  }
}

impl Iterator for Backtracker<'_> {
  type Item = PlacedRows;

  fn next(&mut self) -> Option<PlacedRows> {
    let word_len = self.index.word_len();
    let corpus = self.index.corpus();

    while let Some(depth) = self.frames.len().checked_sub(1) {
      if self.stopper.should_stop(depth == 0) {
        self.cancel();
        return None;
      }

      let Some(rank) = self.next_candidate(depth) else {
        self.frames.pop();
        if depth > 0 {
          self.rows.pop();
        }
        continue;
      };
      let Some(word) = corpus.word(rank) else {
        continue;
      };

      let columns = if self.pruning {
        self.extend_columns(&self.frames[depth].columns, word.letters())
      } else {
        Vec::new()
      };

      self.rows.push(rank);
      if depth + 1 == word_len {
        let complete = self.columns_are_words();
        if !complete && self.log_details {
          log::debug!("{}: rejected, a column is not a word", self.path());
        }
        let rows = self.rows.clone();
        self.rows.pop();
        if complete {
          return Some(PlacedRows { rows, seed_index: self.seed_index });
        }
        continue;
      }

      let candidates = self.candidates(&columns);
      if candidates.is_empty() {
        if self.log_details {
          log::debug!("{}: dead end, no row fits every column", self.path());
        }
        self.rows.pop();
        continue;
      }
      self.frames.push(Frame { candidates, next: 0, columns });
    }

    None
  }
}

/// Turns placed rows into classified results, applying the filters and the
/// result cap for one run.
pub(crate) struct Emitter<'a> {
  corpus: &'a WordCorpus,
  classifier: SquareClassifier,
  double_squares_only: bool,
  max_results: Option<usize>,
  seed_pool_size: usize,
  emitted: usize,
}

impl<'a> Emitter<'a> {
  pub(crate) fn new(corpus: &'a WordCorpus, config: &SearchConfig, seed_pool_size: usize) -> Self {
    Self {
      corpus,
      classifier: SquareClassifier::new(config.dedup),
      double_squares_only: config.double_squares_only,
      max_results: config.max_results,
      seed_pool_size,
      emitted: 0,
    }
  }

  pub(crate) fn is_full(&self) -> bool {
    self
      .max_results
      .is_some_and(|max_results| self.emitted >= max_results)
  }

  pub(crate) fn emitted(&self) -> usize {
    self.emitted
  }

  pub(crate) fn accept(&mut self, placed: PlacedRows) -> Option<SearchResult> {
    let texts: Vec<&str> = placed
      .rows
      .iter()
      .filter_map(|&rank| self.corpus.word(rank))
      .map(|word| word.text())
      .collect();
    let square = match CompletedSquare::from_words(self.corpus, &texts) {
      Ok(square) => square,
      Err(err) => {
        log::warn!("Discarding grid {}: {err}", texts.join("/"));
        return None;
      }
    };

    let classification = self.classifier.classify(&square);
    if self.double_squares_only
      && (!classification.is_double || classification.has_duplicate_word)
    {
      return None;
    }
    if !classification.is_unique_so_far {
      return None;
    }

    self.emitted += 1;
    Some(SearchResult {
      ordinal: self.emitted,
      seed_index: placed.seed_index,
      seed_pool_size: self.seed_pool_size,
      seed_rank: placed.rows.first().cloned().unwrap_or_default(),
      square,
      classification,
    })
  }
}

/// One search run: a lazy sequence of classified squares, most natural first.
/// All state, the de-duplication set included, belongs to this value.
pub struct SquareSearch<'a> {
  backtracker: Backtracker<'a>,
  emitter: Emitter<'a>,
  stop_reason: Option<StopReason>,
}

impl<'a> SquareSearch<'a> {
  pub fn new(index: &'a PrefixIndex<'a>, config: SearchConfig) -> SquareResult<Self> {
    Self::with_cancel(index, config, CancelToken::new())
  }

  pub fn with_cancel(
    index: &'a PrefixIndex<'a>,
    config: SearchConfig,
    cancel: CancelToken,
  ) -> SquareResult<Self> {
    config.validate()?;

    let seeds = config.seed_pool(index.corpus());
    log::info!(
      "Searching {0}x{0} squares from {1} start words",
      index.word_len(),
      seeds.len()
    );
    let emitter = Emitter::new(index.corpus(), &config, seeds.len());
    let backtracker = Backtracker::new(
      index,
      seeds,
      0,
      config.pruning,
      config.log_details,
      Stopper::new(cancel, config.time_limit),
    );

    Ok(Self { backtracker, emitter, stop_reason: None })
  }

  /// Why the sequence ended, or `None` while it is still running.
  pub fn stop_reason(&self) -> Option<StopReason> {
    self.stop_reason
  }

  pub fn was_cancelled(&self) -> bool {
    self.stop_reason == Some(StopReason::Cancelled)
  }

  pub fn emitted(&self) -> usize {
    self.emitter.emitted()
  }

  pub fn seeds_tried(&self) -> usize {
    self.backtracker.seeds_tried()
  }

  fn finish(&mut self, reason: StopReason) {
    log::info!(
      "Search stopped ({reason:?}) after {} start words and {} squares",
      self.seeds_tried(),
      self.emitted()
    );
    self.stop_reason = Some(reason);
  }
}

impl Iterator for SquareSearch<'_> {
  type Item = SearchResult;

  fn next(&mut self) -> Option<SearchResult> {
    if self.stop_reason.is_some() {
      return None;
    }

    loop {
      if self.emitter.is_full() {
        self.finish(StopReason::MaxResults);
        return None;
      }

      let Some(placed) = self.backtracker.next() else {
        let reason = if self.backtracker.was_cancelled() {
          StopReason::Cancelled
        } else {
          StopReason::Exhausted
        };
        self.finish(reason);
        return None;
      };

      if let Some(result) = self.emitter.accept(placed) {
        return Some(result);
      }
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

  use std::{collections::BTreeSet, time::Duration};

  use googletest::prelude::*;
  use square_dict::WordCorpus;

  use crate::{
    cancel::{CancelToken, Stopper},
    classify::DedupMode,
    prefix_index::PrefixIndex,
  };

  use super::{Backtracker, SearchConfig, SearchResult, SquareSearch, StopReason};

  pub(crate) const FIVE_WORDS: [&str; 5] = ["bit", "ice", "ten", "bat", "ace"];

  pub(crate) const TWELVE_WORDS: [&str; 12] = [
    "bit", "ice", "ten", "tab", "are", "bat", "ace", "tea", "eat", "net", "cat", "ate",
  ];

  pub(crate) fn corpus(words: &[&str]) -> WordCorpus {
    WordCorpus::build(words[0].len(), words, words).unwrap()
  }

  pub(crate) fn rows_of(results: &[SearchResult]) -> Vec<Vec<String>> {
    results
      .iter()
      .map(|result| result.square.rows().to_vec())
      .collect()
  }

  fn search(index: &PrefixIndex, config: SearchConfig) -> Vec<SearchResult> {
    SquareSearch::new(index, config).unwrap().collect()
  }

  fn no_dedup() -> SearchConfig {
    SearchConfig { dedup: DedupMode::Off, ..SearchConfig::default() }
  }

  #[gtest]
  fn test_no_square_exists() {
    let corpus = corpus(&["bat", "bar", "art", "tar"]);
    let index = PrefixIndex::build(&corpus).unwrap();
    let mut search = SquareSearch::new(&index, SearchConfig::default()).unwrap();

    expect_true!(search.next().is_none());
    expect_that!(search.stop_reason(), some(eq(StopReason::Exhausted)));
    expect_false!(search.was_cancelled());
    expect_that!(search.seeds_tried(), eq(4));
  }

  #[gtest]
  fn test_raw_sequence() {
    let corpus = corpus(&FIVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let results = search(&index, no_dedup());

    assert_eq!(
      rows_of(&results),
      vec![
        vec!["bit", "ice", "ten"],
        vec!["bit", "ace", "ten"],
        vec!["bat", "ice", "ten"],
        vec!["bat", "ace", "ten"],
      ]
    );
    expect_that!(
      results.iter().map(|result| result.ordinal).collect::<Vec<_>>(),
      container_eq([1, 2, 3, 4])
    );
    expect_that!(
      results.iter().map(|result| result.seed_index).collect::<Vec<_>>(),
      container_eq([1, 1, 4, 4])
    );
    expect_that!(
      results.iter().map(|result| result.seed_rank).collect::<Vec<_>>(),
      container_eq([0, 0, 3, 3])
    );
    expect_true!(results.iter().all(|result| result.seed_pool_size == 5));
  }

  #[gtest]
  fn test_transpose_duplicates_suppressed() {
    let corpus = corpus(&FIVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let results = search(&index, SearchConfig::default());

    assert_eq!(
      rows_of(&results),
      vec![
        vec!["bit", "ice", "ten"],
        vec!["bit", "ace", "ten"],
        vec!["bat", "ace", "ten"],
      ]
    );
    expect_that!(
      results.iter().map(|result| result.ordinal).collect::<Vec<_>>(),
      container_eq([1, 2, 3])
    );
    expect_true!(results
      .iter()
      .all(|result| result.classification.is_unique_so_far));
  }

  #[gtest]
  fn test_classification_attached() {
    let corpus = corpus(&FIVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let results = search(&index, no_dedup());

    expect_that!(
      results
        .iter()
        .map(|result| result.classification.is_double)
        .collect::<Vec<_>>(),
      container_eq([true, false, false, true])
    );
    expect_that!(
      results
        .iter()
        .map(|result| result.classification.has_duplicate_word)
        .collect::<Vec<_>>(),
      container_eq([false, true, true, false])
    );
  }

  #[gtest]
  fn test_double_squares_only() {
    let corpus = corpus(&FIVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let results = search(
      &index,
      SearchConfig { double_squares_only: true, ..SearchConfig::default() },
    );

    assert_eq!(
      rows_of(&results),
      vec![vec!["bit", "ice", "ten"], vec!["bat", "ace", "ten"]]
    );
    expect_that!(
      results.iter().map(|result| result.ordinal).collect::<Vec<_>>(),
      container_eq([1, 2])
    );
  }

  #[gtest]
  fn test_max_results() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let mut search = SquareSearch::new(
      &index,
      SearchConfig { max_results: Some(1), ..SearchConfig::default() },
    )
    .unwrap();

    let first = search.next();
    assert_that!(first, some(anything()));
    expect_true!(search.next().is_none());
    expect_true!(search.next().is_none());
    expect_that!(search.emitted(), eq(1));
    expect_that!(search.stop_reason(), some(eq(StopReason::MaxResults)));
    expect_false!(search.was_cancelled());
  }

  #[gtest]
  fn test_top_n() {
    let corpus = corpus(&FIVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let results = search(&index, SearchConfig { top_n: Some(1), ..no_dedup() });

    assert_eq!(
      rows_of(&results),
      vec![vec!["bit", "ice", "ten"], vec!["bit", "ace", "ten"]]
    );
    expect_true!(results.iter().all(|result| result.seed_pool_size == 1));
  }

  #[gtest]
  fn test_invalid_top_n() {
    let corpus = corpus(&FIVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    expect_that!(
      SquareSearch::new(&index, SearchConfig { top_n: Some(0), ..SearchConfig::default() })
        .map(|_| ()),
      err(anything())
    );
  }

  #[gtest]
  fn test_every_reading_is_a_word() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let results = search(&index, no_dedup());

    expect_that!(results.len(), eq(26));
    for result in &results {
      for word in result.square.rows().iter().chain(result.square.columns()) {
        expect_true!(corpus.contains(word));
      }
    }
  }

  #[gtest]
  fn test_pruning_does_not_change_results() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();

    let pruned: BTreeSet<_> = rows_of(&search(&index, no_dedup())).into_iter().collect();
    let brute_force: BTreeSet<_> =
      rows_of(&search(&index, SearchConfig { pruning: false, ..no_dedup() }))
        .into_iter()
        .collect();

    expect_that!(pruned.len(), eq(26));
    assert_eq!(pruned, brute_force);
  }

  #[gtest]
  fn test_fitting_rows_extend_every_column() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let mut backtracker = Backtracker::new(
      &index,
      vec![],
      0,
      true,
      false,
      Stopper::new(CancelToken::new(), None),
    );

    let root = vec![PrefixIndex::ROOT; 3];
    expect_that!(index.fitting_words(&root).len(), eq(12));
    for first in index.fitting_words(&root) {
      let columns = backtracker.extend_columns(&root, corpus.word(first).unwrap().letters());
      expect_that!(columns.len(), eq(3));
      for second in index.fitting_words(&columns) {
        let letters = corpus.word(second).unwrap().letters();
        expect_that!(backtracker.extend_columns(&columns, letters).len(), eq(3));
      }
    }
    expect_true!(backtracker.next().is_none());
  }

  #[gtest]
  fn test_traced_search_matches_untraced() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();

    for pruning in [true, false] {
      let quiet = search(&index, SearchConfig { pruning, ..no_dedup() });
      let traced = search(&index, SearchConfig { pruning, log_details: true, ..no_dedup() });
      expect_that!(traced.len(), eq(26));
      assert_eq!(traced, quiet);
    }
  }

  #[gtest]
  fn test_search_is_repeatable() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let config = SearchConfig { log_details: true, ..SearchConfig::default() };

    let first = search(&index, config.clone());
    let second = search(&index, config);
    expect_false!(first.is_empty());
    assert_eq!(first, second);
  }

  #[gtest]
  fn test_two_by_two() {
    let corpus = corpus(&["ab", "ba"]);
    let index = PrefixIndex::build(&corpus).unwrap();

    let results = search(&index, SearchConfig::default());
    assert_eq!(rows_of(&results), vec![vec!["ab", "ba"], vec!["ba", "ab"]]);
    expect_true!(results.iter().all(|result| result.classification.is_double));

    let results = search(
      &index,
      SearchConfig { dedup: DedupMode::WordMultiset, ..SearchConfig::default() },
    );
    assert_eq!(rows_of(&results), vec![vec!["ab", "ba"]]);
  }

  #[gtest]
  fn test_single_letter_words() {
    let corpus = corpus(&["a", "i"]);
    let index = PrefixIndex::build(&corpus).unwrap();
    let results = search(&index, SearchConfig::default());
    assert_eq!(rows_of(&results), vec![vec!["a"], vec!["i"]]);
  }

  #[gtest]
  fn test_cancelled_before_start() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut search = SquareSearch::with_cancel(&index, SearchConfig::default(), cancel).unwrap();
    expect_true!(search.next().is_none());
    expect_true!(search.was_cancelled());
    expect_that!(search.stop_reason(), some(eq(StopReason::Cancelled)));
    expect_that!(search.seeds_tried(), eq(0));
  }

  #[gtest]
  fn test_cancelled_mid_search() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let cancel = CancelToken::new();
    let mut search =
      SquareSearch::with_cancel(&index, SearchConfig::default(), cancel.clone()).unwrap();

    assert_that!(search.next(), some(anything()));
    cancel.cancel();
    expect_true!(search.next().is_none());
    expect_true!(search.was_cancelled());
    expect_that!(search.emitted(), eq(1));
  }

  #[gtest]
  fn test_time_limit() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let mut search = SquareSearch::new(
      &index,
      SearchConfig { time_limit: Some(Duration::ZERO), ..SearchConfig::default() },
    )
    .unwrap();

    expect_true!(search.next().is_none());
    expect_that!(search.stop_reason(), some(eq(StopReason::Cancelled)));
  }

  #[gtest]
  fn test_unbounded_time_limit() {
    let corpus = corpus(&TWELVE_WORDS);
    let index = PrefixIndex::build(&corpus).unwrap();
    let mut search = SquareSearch::new(
      &index,
      SearchConfig {
        time_limit: Some(Duration::from_secs(u64::MAX)),
        dedup: DedupMode::Off,
        ..SearchConfig::default()
      },
    )
    .unwrap();

    expect_that!(search.by_ref().count(), eq(26));
    expect_that!(search.stop_reason(), some(eq(StopReason::Exhausted)));
  }
}
