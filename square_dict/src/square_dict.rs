use std::{
  collections::{HashMap, HashSet},
  fs::File,
  io::{BufRead, BufReader},
  path::Path,
};

use itertools::Itertools;
use once_cell::sync::OnceCell;
use regex::Regex;
use util::error::{SquareError, SquareResult};

static WORD_PATTERN: OnceCell<Regex> = OnceCell::new();

fn word_pattern() -> SquareResult<&'static Regex> {
  Ok(WORD_PATTERN.get_or_try_init(|| Regex::new(r"^[a-z]+$"))?)
}

fn canonicalize_word(word: &str) -> String {
  word.trim().to_lowercase()
}

/// Trims and lowercases a plain word list, one word per line.
pub fn parse_word_list<S>(lines: impl IntoIterator<Item = S>) -> Vec<String>
where
  S: AsRef<str>,
{
  lines
    .into_iter()
    .map(|line| canonicalize_word(line.as_ref()))
    .filter(|word| !word.is_empty())
    .collect()
}

/// Pulls the word column out of frequency CSV rows (`word,count`), keeping
/// the file's most-popular-first order. Header lines are the caller's concern.
pub fn parse_frequency_csv<S>(lines: impl IntoIterator<Item = S>) -> SquareResult<Vec<String>>
where
  S: AsRef<str>,
{
  lines
    .into_iter()
    .enumerate()
    .map(|(line_num, line)| -> SquareResult<Option<String>> {
      let line = line.as_ref();
      if line.trim().is_empty() {
        return Ok(None);
      }
      let word = line
        .split_once(',')
        .map(|(word, _)| word)
        .unwrap_or(line);
      let word = canonicalize_word(word);
      if word.is_empty() {
        return Err(
          SquareError::Parse(format!(
            "Missing word on frequency line {}: \"{line}\"",
            line_num + 1
          ))
          .into(),
        );
      }
      Ok(Some(word))
    })
    .filter_map(|word| word.transpose())
    .collect()
}

/// A dictionary word together with its frequency rank. Lower ranks are more
/// common words, and a word's rank is its index in the corpus.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Word {
  text: String,
  rank: u32,
}

impl Word {
  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn rank(&self) -> u32 {
    self.rank
  }

  pub fn letters(&self) -> &[u8] {
    self.text.as_bytes()
  }
}

#[derive(Clone, Debug, Default)]
pub struct CorpusOptions {
  /// Drop valid words that never appear in the frequency ranking.
  pub ranked_only: bool,
  /// Keep only this many of the most frequent words.
  pub max_words: Option<usize>,
}

/// The words of one fixed length that a search may use, in rank order.
#[derive(Clone, Debug)]
pub struct WordCorpus {
  word_len: usize,
  words: Vec<Word>,
  ranks: HashMap<String, u32>,
  ranked_count: usize,
}

impl WordCorpus {
  pub fn build<V, R>(
    word_len: usize,
    valid_words: impl IntoIterator<Item = V>,
    ranking: impl IntoIterator<Item = R>,
  ) -> SquareResult<Self>
  where
    V: AsRef<str>,
    R: AsRef<str>,
  {
    Self::build_with_options(word_len, valid_words, ranking, &CorpusOptions::default())
  }

  /// Builds the corpus from a word-validity list and a most-popular-first
  /// ranking. Ranked words come first in ranking order, followed by the
  /// unranked valid words in the order they were given.
  pub fn build_with_options<V, R>(
    word_len: usize,
    valid_words: impl IntoIterator<Item = V>,
    ranking: impl IntoIterator<Item = R>,
    options: &CorpusOptions,
  ) -> SquareResult<Self>
  where
    V: AsRef<str>,
    R: AsRef<str>,
  {
    if word_len == 0 {
      return Err(SquareError::InvalidConfiguration("word_len must be positive".to_owned()).into());
    }
    if options.max_words == Some(0) {
      return Err(SquareError::InvalidConfiguration("max_words must be positive".to_owned()).into());
    }

    let pattern = word_pattern()?;
    let usable = |word: &String| word.len() == word_len && pattern.is_match(word);

    let valid: Vec<String> = valid_words
      .into_iter()
      .map(|word| canonicalize_word(word.as_ref()))
      .filter(usable)
      .unique()
      .collect();
    let valid_set: HashSet<&str> = valid.iter().map(String::as_str).collect();

    let ranked: Vec<String> = ranking
      .into_iter()
      .map(|word| canonicalize_word(word.as_ref()))
      .filter(|word| valid_set.contains(word.as_str()))
      .unique()
      .collect();
    let ranked_count = ranked.len();
    let ranked_set: HashSet<&str> = ranked.iter().map(String::as_str).collect();

    let unranked = valid
      .iter()
      .filter(|word| !options.ranked_only && !ranked_set.contains(word.as_str()))
      .cloned();

    let words: Vec<Word> = ranked
      .iter()
      .cloned()
      .chain(unranked)
      .take(options.max_words.unwrap_or(usize::MAX))
      .enumerate()
      .map(|(rank, text)| Word { text, rank: rank as u32 })
      .collect();

    log::info!(
      "Found {} valid words of length {word_len}, {ranked_count} of them ranked; keeping {}",
      valid.len(),
      words.len()
    );

    if words.len() < word_len {
      return Err(SquareError::InvalidCorpus { word_len, found: words.len() }.into());
    }

    let ranks = words
      .iter()
      .map(|word| (word.text.clone(), word.rank))
      .collect();

    Ok(Self {
      word_len,
      words,
      ranks,
      ranked_count: ranked_count.min(options.max_words.unwrap_or(usize::MAX)),
    })
  }

  pub fn word_len(&self) -> usize {
    self.word_len
  }

  pub fn size(&self) -> usize {
    self.words.len()
  }

  /// Number of words whose rank came from the frequency ranking rather than
  /// being appended after it.
  pub fn ranked_count(&self) -> usize {
    self.ranked_count
  }

  pub fn contains(&self, text: &str) -> bool {
    self.ranks.contains_key(text)
  }

  pub fn rank_of(&self, text: &str) -> Option<u32> {
    self.ranks.get(text).cloned()
  }

  pub fn word(&self, rank: u32) -> Option<&Word> {
    self.words.get(rank as usize)
  }

  /// Every word, most frequent first. Each call starts a new pass from the
  /// most frequent word, and so does cloning an unstarted iterator.
  pub fn words_by_rank(&self) -> impl Iterator<Item = &Word> + Clone + '_ {
    self.words.iter()
  }
}

fn read_lines(path: &Path) -> SquareResult<Vec<String>> {
  Ok(
    BufReader::new(File::open(path)?)
      .lines()
      .collect::<Result<Vec<_>, _>>()?,
  )
}

/// Reads a corpus from a plain word list and a `word,count` frequency file
/// whose first line is a header.
pub fn load_corpus(
  word_len: usize,
  words_path: impl AsRef<Path>,
  freq_csv_path: impl AsRef<Path>,
  options: &CorpusOptions,
) -> SquareResult<WordCorpus> {
  let valid_words = parse_word_list(read_lines(words_path.as_ref())?);
  let ranking = parse_frequency_csv(read_lines(freq_csv_path.as_ref())?.into_iter().skip(1))?;
  log::info!(
    "Read {} words from {} and {} ranked words from {}",
    valid_words.len(),
    words_path.as_ref().display(),
    ranking.len(),
    freq_csv_path.as_ref().display()
  );
  WordCorpus::build_with_options(word_len, valid_words, ranking, options)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

  use googletest::prelude::*;
  use util::error::{as_square_error, SquareError};

  use super::{load_corpus, parse_frequency_csv, parse_word_list, CorpusOptions, WordCorpus};

  fn texts(corpus: &WordCorpus) -> Vec<String> {
    corpus
      .words_by_rank()
      .map(|word| word.text().to_owned())
      .collect()
  }

  #[gtest]
  fn test_parse_word_list() {
    expect_that!(
      parse_word_list(["  Bat", "", "ICE ", "ten"]),
      container_eq(["bat", "ice", "ten"])
    );
  }

  #[gtest]
  fn test_parse_frequency_csv() {
    let words = parse_frequency_csv(["The,23135851162", "of,13151942776", "", "AND"]);
    assert_that!(words, ok(anything()));
    expect_that!(words.unwrap(), container_eq(["the", "of", "and"]));
  }

  #[gtest]
  fn test_parse_frequency_csv_missing_word() {
    expect_that!(parse_frequency_csv(["the,1", " ,2"]), err(anything()));
  }

  #[gtest]
  fn test_rank_order() {
    let corpus = WordCorpus::build(
      3,
      ["ten", "bit", "ice", "ace", "bat"],
      ["the", "bit", "of", "ice", "ten", "bit"],
    )
    .unwrap();

    expect_that!(texts(&corpus), container_eq(["bit", "ice", "ten", "ace", "bat"]));
    expect_that!(corpus.ranked_count(), eq(3));
    expect_that!(corpus.rank_of("ten"), some(eq(2)));
    expect_that!(corpus.rank_of("bat"), some(eq(4)));
    expect_that!(corpus.word(3).map(|word| word.text()), some(eq("ace")));
  }

  #[gtest]
  fn test_filters_and_normalizes() {
    let corpus = WordCorpus::build(
      3,
      ["Bat", "bats", "b4t", "ice", "ICE", "ten", "éte"],
      Vec::<String>::new(),
    )
    .unwrap();

    expect_that!(texts(&corpus), container_eq(["bat", "ice", "ten"]));
    expect_true!(corpus.contains("bat"));
    expect_false!(corpus.contains("bats"));
    expect_false!(corpus.contains("Bat"));
    expect_that!(corpus.size(), eq(3));
    expect_that!(corpus.word_len(), eq(3));
  }

  #[gtest]
  fn test_ranked_only() {
    let corpus = WordCorpus::build_with_options(
      2,
      ["ab", "ba", "cd"],
      ["ba", "ab"],
      &CorpusOptions { ranked_only: true, max_words: None },
    )
    .unwrap();
    expect_that!(texts(&corpus), container_eq(["ba", "ab"]));
  }

  #[gtest]
  fn test_max_words() {
    let corpus = WordCorpus::build_with_options(
      2,
      ["ab", "ba", "cd", "dc"],
      ["dc"],
      &CorpusOptions { ranked_only: false, max_words: Some(3) },
    )
    .unwrap();
    expect_that!(texts(&corpus), container_eq(["dc", "ab", "ba"]));
  }

  #[gtest]
  fn test_words_by_rank_restartable() {
    let corpus = WordCorpus::build(2, ["ab", "ba"], ["ba"]).unwrap();
    let iter = corpus.words_by_rank();
    expect_that!(iter.clone().count(), eq(2));
    expect_that!(iter.map(|word| word.rank()).collect::<Vec<_>>(), container_eq([0, 1]));
  }

  #[gtest]
  fn test_too_few_words() {
    let err = WordCorpus::build(3, ["bat", "ice", "toolong"], ["bat"]).unwrap_err();
    assert_eq!(
      as_square_error(&*err),
      Some(&SquareError::InvalidCorpus { word_len: 3, found: 2 })
    );
  }

  #[gtest]
  fn test_zero_word_len() {
    let err = WordCorpus::build(0, ["a"], ["a"]).unwrap_err();
    expect_true!(matches!(
      as_square_error(&*err),
      Some(SquareError::InvalidConfiguration(_))
    ));
  }

  #[gtest]
  fn test_load_corpus() {
    let dir = std::env::temp_dir().join(format!("square_dict_load_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let words_path = dir.join("words.txt");
    let freq_path = dir.join("freq.csv");
    std::fs::write(&words_path, "BIT\nice\nten\nbat\nace\nword\n").unwrap();
    std::fs::write(&freq_path, "word,count\nthe,100\nten,50\nbit,10\n").unwrap();

    let corpus = load_corpus(3, &words_path, &freq_path, &CorpusOptions::default()).unwrap();
    expect_that!(texts(&corpus), container_eq(["ten", "bit", "ice", "bat", "ace"]));
    expect_that!(corpus.ranked_count(), eq(2));

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[gtest]
  fn test_load_corpus_missing_file() {
    let missing = std::env::temp_dir().join("square_dict_no_such_file.txt");
    expect_that!(
      load_corpus(3, &missing, &missing, &CorpusOptions::default()),
      err(anything())
    );
  }
}
