#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::{fs::File, time::Duration};

use clap::Parser;
use square_dict::{load_corpus, CorpusOptions};
use square_gen::{
  bench::{BenchmarkConfig, BenchmarkRunner},
  prefix_index::PrefixIndex,
};
use util::error::SquareResult;

const FLAMEGRAPH_PATH: &str = "flamegraph.svg";

/// Profiles the square search and writes a flamegraph.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  #[arg(long, default_value = "unigram_freq.csv")]
  freq_csv_file: String,

  #[arg(long, default_value = "scrabble_words.txt")]
  words_file: String,

  #[arg(long, default_value_t = 5)]
  word_len: usize,

  #[arg(long, default_value_t = 5000)]
  top_n: usize,

  #[arg(long, default_value_t = 10)]
  time_budget_secs: u64,

  #[arg(long, default_value_t = 1000)]
  sample_frequency: i32,
}

fn main() -> SquareResult {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let args = Args::parse();

  let corpus = load_corpus(
    args.word_len,
    &args.words_file,
    &args.freq_csv_file,
    &CorpusOptions::default(),
  )?;
  let index = PrefixIndex::build(&corpus)?;
  let runner = BenchmarkRunner::new(
    &index,
    BenchmarkConfig {
      time_budget: Duration::from_secs(args.time_budget_secs),
      top_n: Some(args.top_n),
      ..BenchmarkConfig::default()
    },
  )?;

  let guard = pprof::ProfilerGuardBuilder::default()
    .frequency(args.sample_frequency)
    .blocklist(&["libc", "libgcc", "pthread", "vdso"])
    .build()?;
  let report = runner.run();
  println!("{report}");

  let profile = guard.report().build()?;
  profile.flamegraph(File::create(FLAMEGRAPH_PATH)?)?;
  log::info!("Wrote {FLAMEGRAPH_PATH}");

  Ok(())
}
