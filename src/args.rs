use clap::{Parser, ValueEnum};
use square_gen::classify::DedupMode;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
  Search,
  Benchmark,
}

#[derive(Parser, Debug)]
#[command(version, about = "Generates word squares from a ranked dictionary", long_about = None)]
pub struct Args {
  /// CSV file whose first column is words, most popular first.
  #[arg(long, default_value = "unigram_freq.csv")]
  pub freq_csv_file: String,

  /// Text file of valid words, one per line.
  #[arg(long, default_value = "scrabble_words.txt")]
  pub words_file: String,

  /// Only the N most popular words start a square.
  #[arg(long, default_value_t = 5000)]
  pub top_n: usize,

  #[arg(long, default_value_t = 5)]
  pub word_len: usize,

  /// Print only double squares that use no word twice.
  #[arg(long)]
  pub double_squares_only: bool,

  #[arg(long)]
  pub max_results: Option<usize>,

  #[arg(long, value_enum, default_value_t = DedupMode::Transpose)]
  pub dedup: DedupMode,

  /// Drop valid words missing from the frequency file.
  #[arg(long)]
  pub ranked_only: bool,

  /// Stop the search, or bound the benchmark, after this many seconds.
  #[arg(long)]
  pub time_limit_secs: Option<u64>,

  #[arg(long, default_value_t = 1)]
  pub threads: usize,

  #[arg(long)]
  pub log_details: bool,

  #[arg(long, value_enum, default_value_t = RunMode::Search)]
  pub mode: RunMode,
}
