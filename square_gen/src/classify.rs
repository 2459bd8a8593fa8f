use std::collections::HashSet;

use clap::ValueEnum;
use itertools::Itertools;

use crate::square::CompletedSquare;

/// Which squares count as the same result.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DedupMode {
  /// Report every square.
  Off,
  /// A square and its transpose are the same result.
  #[default]
  Transpose,
  /// Any two squares built from the same multiset of row and column words are
  /// the same result. Implies transpose equivalence.
  WordMultiset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
  pub is_double: bool,
  pub has_duplicate_word: bool,
  pub is_unique_so_far: bool,
}

/// True when the row words and the column words are the same multiset.
pub fn is_double(square: &CompletedSquare) -> bool {
  square.rows().iter().sorted().eq(square.columns().iter().sorted())
}

/// True when some word is used twice. Rows always count; columns count too
/// unless the square is double, since there the columns repeat the rows.
pub fn has_duplicate_word(square: &CompletedSquare) -> bool {
  let columns = if is_double(square) {
    &[][..]
  } else {
    square.columns()
  };
  !square.rows().iter().chain(columns).all_unique()
}

pub fn canonical_form(square: &CompletedSquare, mode: DedupMode) -> Option<String> {
  match mode {
    DedupMode::Off => None,
    DedupMode::Transpose => {
      let by_rows = square.rows().concat();
      let by_columns = square.columns().concat();
      Some(by_rows.min(by_columns))
    }
    DedupMode::WordMultiset => Some(
      square
        .rows()
        .iter()
        .chain(square.columns())
        .sorted()
        .join(","),
    ),
  }
}

/// Tracks the canonical forms seen during one search run.
#[derive(Clone, Debug, Default)]
pub struct SquareClassifier {
  mode: DedupMode,
  seen: HashSet<String>,
}

impl SquareClassifier {
  pub fn new(mode: DedupMode) -> Self {
    Self { mode, seen: HashSet::new() }
  }

  #[cfg(test)]
  fn seen_count(&self) -> usize {
    self.seen.len()
  }

  /// Classifies `square`, recording its canonical form. A square whose form
  /// was already recorded is not unique.
  pub fn classify(&mut self, square: &CompletedSquare) -> Classification {
    let is_unique_so_far = match canonical_form(square, self.mode) {
      Some(form) => self.seen.insert(form),
      None => true,
    };

    Classification {
      is_double: is_double(square),
      has_duplicate_word: has_duplicate_word(square),
      is_unique_so_far,
    }
  }
}
