use itertools::Itertools;
use square_dict::WordCorpus;
use square_gen::search::{SearchResult, StopReason};

const WORDS_TO_SHOW: usize = 10;

/// The most and least frequent words, at most `count` of each. The two lists
/// overlap when the corpus has fewer than `2 * count` words.
fn first_and_last(corpus: &WordCorpus, count: usize) -> (Vec<&str>, Vec<&str>) {
  let words = corpus.words_by_rank().map(|word| word.text());
  (
    words.clone().take(count).collect(),
    words.skip(corpus.size().saturating_sub(count)).collect(),
  )
}

pub fn log_working_words(corpus: &WordCorpus) {
  log::info!(
    "Working with {} words of length {}, {} of them ranked",
    corpus.size(),
    corpus.word_len(),
    corpus.ranked_count()
  );
  let (first, last) = first_and_last(corpus, WORDS_TO_SHOW);
  log::info!("First {WORDS_TO_SHOW}: {}", first.join(", "));
  log::info!("Last {WORDS_TO_SHOW}: {}", last.join(", "));
}

/// The header line followed by one indented line per row.
pub fn describe_result(result: &SearchResult) -> String {
  let classification = &result.classification;
  let header = format!(
    "WordSquare {} from word {}/{}: {}-word-square, {}",
    result.ordinal,
    result.seed_index,
    result.seed_pool_size,
    if classification.is_double { "double" } else { "single" },
    if classification.has_duplicate_word {
      "non-unique"
    } else {
      "unique"
    }
  );
  std::iter::once(header)
    .chain(result.square.rows().iter().map(|row| format!("  {row}")))
    .join("\n")
}

pub fn summary_line(count: usize, stop_reason: Option<StopReason>) -> String {
  match stop_reason {
    Some(StopReason::Cancelled) => format!("Made {count} squares (stopped early)"),
    Some(StopReason::MaxResults) => format!("Made {count} squares (result limit reached)"),
    Some(StopReason::Exhausted) | None => format!("Made {count} squares"),
  }
}
