#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod args;
mod logging;
mod report;

use std::time::Duration;

use args::{Args, RunMode};
use clap::Parser;
use square_dict::{load_corpus, CorpusOptions};
use square_gen::{
  bench::{BenchmarkConfig, BenchmarkRunner},
  cancel::CancelToken,
  parallel::search_parallel,
  prefix_index::PrefixIndex,
  search::{SearchConfig, SquareSearch},
};
use util::error::SquareResult;

fn search_config(args: &Args) -> SearchConfig {
  SearchConfig {
    top_n: Some(args.top_n),
    double_squares_only: args.double_squares_only,
    max_results: args.max_results,
    log_details: args.log_details,
    dedup: args.dedup,
    time_limit: args.time_limit_secs.map(Duration::from_secs),
    ..SearchConfig::default()
  }
}

fn run_search(args: &Args, index: &PrefixIndex) -> SquareResult {
  println!("Generating Squares..\n");
  let config = search_config(args);

  if args.threads > 1 {
    let outcome = search_parallel(index, &config, args.threads, CancelToken::new())?;
    for result in &outcome.results {
      println!("{}\n", report::describe_result(result));
    }
    println!(
      "{}",
      report::summary_line(outcome.results.len(), Some(outcome.stop_reason))
    );
  } else {
    let mut search = SquareSearch::new(index, config)?;
    for result in search.by_ref() {
      println!("{}\n", report::describe_result(&result));
    }
    println!(
      "{}",
      report::summary_line(search.emitted(), search.stop_reason())
    );
  }

  Ok(())
}

fn run_benchmark(args: &Args, index: &PrefixIndex) -> SquareResult {
  let mut config = BenchmarkConfig {
    top_n: Some(args.top_n),
    ..BenchmarkConfig::default()
  };
  if let Some(secs) = args.time_limit_secs {
    config.time_budget = Duration::from_secs(secs);
  }

  let report = BenchmarkRunner::new(index, config)?.run();
  println!("{report}");
  Ok(())
}

fn main() -> SquareResult {
  let args = Args::parse();
  logging::init_logger(args.log_details);

  let corpus = load_corpus(
    args.word_len,
    &args.words_file,
    &args.freq_csv_file,
    &CorpusOptions { ranked_only: args.ranked_only, max_words: None },
  )?;
  report::log_working_words(&corpus);
  let index = PrefixIndex::build(&corpus)?;
  log::debug!("Prefix index has {} nodes", index.node_count());

  match args.mode {
    RunMode::Search => run_search(&args, &index),
    RunMode::Benchmark => run_benchmark(&args, &index),
  }
}
