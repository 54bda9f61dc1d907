//! SparseKV Benchmark Binary
//!
//! Times the three stores over a word list and prints one report row each.

use std::path::PathBuf;

use clap::Parser;
use sparsekv::bench::{self, BenchReport};
use sparsekv::BenchConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// SparseKV benchmark
#[derive(Parser, Debug)]
#[command(name = "sparsekv-bench")]
#[command(about = "Compare array, linked list and skip list stores")]
#[command(version)]
struct Args {
    /// Word list, one word per line
    #[arg(short, long, default_value = "/usr/share/dict/words")]
    words: PathBuf,

    /// Maximum number of words to load
    #[arg(short, long, default_value = "10000")]
    limit: usize,

    /// Delete every N-th word
    #[arg(short, long, default_value = "8")]
    stride: usize,

    /// Range scan start (empty = first key)
    #[arg(long, default_value = "")]
    start: String,

    /// Range scan end (empty = no upper bound)
    #[arg(long, default_value = "")]
    end: String,

    /// Also flush each store to a table in this directory and scan it back
    #[arg(short, long)]
    table_dir: Option<PathBuf>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sparsekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("SparseKV bench v{}", sparsekv::VERSION);

    let mut builder = BenchConfig::builder()
        .words_path(&args.words)
        .word_limit(args.limit)
        .delete_stride(args.stride)
        .scan_range(args.start.into_bytes(), args.end.into_bytes());
    if let Some(dir) = &args.table_dir {
        builder = builder.table_dir(dir);
    }

    let config = match builder.build() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid arguments: {}", e);
            std::process::exit(2);
        }
    };

    let words = match bench::load_words(&config.words_path, config.word_limit) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!("Error loading words: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", bench::header());
    let reports = match bench::run_all(&words, &config) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Benchmark failed: {}", e);
            std::process::exit(1);
        }
    };
    for report in &reports {
        println!("{}", report);
    }

    print_table_reports(&reports);
}

fn print_table_reports(reports: &[BenchReport]) {
    if reports.iter().all(|r| r.table.is_none()) {
        return;
    }
    println!();
    println!(
        "{:<20}{:<20}{:<20}{:<20}{:<20}",
        "name", "flush", "open", "tablescan", "bytes/index"
    );
    for report in reports {
        if let Some(t) = &report.table {
            println!(
                "{:<20}{:<20}{:<20}{:<20}{:<20}",
                report.name,
                format!("{:?}", t.flush),
                format!("{:?}", t.open),
                format!("{:?}", t.scan),
                format!("{}/{}", t.bytes, t.index_entries)
            );
        }
    }
}
