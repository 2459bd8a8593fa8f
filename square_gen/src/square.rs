use std::fmt::Display;

use square_dict::WordCorpus;
use util::{
  error::{SquareError, SquareResult},
  grid::{read_cols, read_rows, Grid, Gridlike},
};

/// An N×N grid whose rows and columns are all words of the corpus it was
/// checked against.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompletedSquare {
  grid: Grid<char>,
  rows: Vec<String>,
  columns: Vec<String>,
  row_ranks: Vec<u32>,
  column_ranks: Vec<u32>,
}

impl CompletedSquare {
  /// Checks every row and column against `corpus`. This is the final word on
  /// validity no matter how the rows were chosen.
  pub fn from_words<S: AsRef<str>>(corpus: &WordCorpus, rows: &[S]) -> SquareResult<Self> {
    let grid = Grid::from_rows(rows)?;
    if !grid.is_square() || grid.width() as usize != corpus.word_len() {
      return Err(
        SquareError::InvalidSquare(format!(
          "Expected a {0}x{0} grid, found {1}x{2}",
          corpus.word_len(),
          grid.width(),
          grid.height()
        ))
        .into(),
      );
    }

    let rows = read_rows(&grid);
    let columns = read_cols(&grid);
    let rank_all = |words: &[String]| -> SquareResult<Vec<u32>> {
      words
        .iter()
        .map(|word| {
          corpus.rank_of(word).ok_or_else(|| {
            SquareError::InvalidSquare(format!("\"{word}\" is not in the corpus")).into()
          })
        })
        .collect()
    };
    let row_ranks = rank_all(&rows)?;
    let column_ranks = rank_all(&columns)?;

    Ok(Self { grid, rows, columns, row_ranks, column_ranks })
  }

  pub fn size(&self) -> usize {
    self.rows.len()
  }

  pub fn rows(&self) -> &[String] {
    &self.rows
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  #[cfg(test)]
  fn row_ranks(&self) -> &[u32] {
    &self.row_ranks
  }

  #[cfg(test)]
  fn column_ranks(&self) -> &[u32] {
    &self.column_ranks
  }

  /// The same square read with rows and columns swapped.
  pub fn transpose(&self) -> Self {
    Self {
      grid: self.grid.transpose_owned(),
      rows: self.columns.clone(),
      columns: self.rows.clone(),
      row_ranks: self.column_ranks.clone(),
      column_ranks: self.row_ranks.clone(),
    }
  }
}

impl Display for CompletedSquare {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.grid)
  }
}
