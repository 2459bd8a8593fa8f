use core::fmt;
use std::{
  error::Error,
  fmt::{Display, Formatter},
};

#[derive(Debug, PartialEq, Eq)]
pub enum SquareError {
  /// Fewer usable words of the requested length than the square needs rows.
  InvalidCorpus { word_len: usize, found: usize },
  InvalidConfiguration(String),
  /// A grid whose rows or columns are not all corpus words.
  InvalidSquare(String),
  Internal(String),
  Parse(String),
}

impl Display for SquareError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      SquareError::InvalidCorpus { word_len, found } => write!(
        f,
        "Invalid corpus: need at least {word_len} words of length {word_len}, found {found}"
      ),
      SquareError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {msg}"),
      SquareError::InvalidSquare(msg) => write!(f, "Invalid square: {msg}"),
      SquareError::Internal(msg) => write!(f, "Internal error: {msg}"),
      SquareError::Parse(msg) => write!(f, "Parse error: {msg}"),
    }
  }
}

impl Error for SquareError {}

pub type SquareResult<T = ()> = Result<T, Box<dyn Error>>;

/// Returns the `SquareError` carried by a boxed error, if that is what it is.
pub fn as_square_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a SquareError> {
  err.downcast_ref::<SquareError>()
}
