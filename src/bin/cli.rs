//! SparseKV CLI
//!
//! Inspect a table file: dump its sparse index, look up a key, scan a range.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sparsekv::{Result, Table};
use tracing_subscriber::{fmt, EnvFilter};

/// SparseKV CLI
#[derive(Parser, Debug)]
#[command(name = "sparsekv-cli")]
#[command(about = "Inspect SparseKV table files")]
struct Args {
    /// Table file
    #[arg(short, long)]
    table: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the sparse index
    Index,

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Print records in [start, end)
    Scan {
        /// First key (empty = from the beginning)
        #[arg(long, default_value = "")]
        start: String,

        /// Upper bound (empty = to the end)
        #[arg(long, default_value = "")]
        end: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let table = Table::open_path(&args.table)?;

    match args.command {
        Commands::Index => {
            println!(
                "{} bytes, index at {}, {} entries",
                table.len_bytes(),
                table.index_offset(),
                table.index().len()
            );
            for entry in table.index() {
                println!("{:>10}  {}", entry.offset, String::from_utf8_lossy(&entry.key));
            }
        }
        Commands::Get { key } => match table.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => {
                println!("(not found)");
            }
        },
        Commands::Scan { start, end } => {
            let mut iter = table.range_scan(start.as_bytes(), end.as_bytes())?;
            while iter.is_valid() {
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(iter.key()),
                    String::from_utf8_lossy(iter.value())
                );
                iter.next()?;
            }
        }
    }

    Ok(())
}
