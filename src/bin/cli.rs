//! RosterDB CLI
//!
//! Batch maintenance commands against a flat-file store.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rosterdb::{
    open_store, Backend, Config, Criteria, Format, Record, RecordIterator, RecordStore, Snapshot,
};
use tracing_subscriber::{fmt, EnvFilter};

/// RosterDB CLI
#[derive(Parser, Debug)]
#[command(name = "rosterdb")]
#[command(about = "Maintenance commands for a RosterDB data file")]
#[command(version)]
struct Args {
    /// Data file
    #[arg(short, long, default_value = "./roster.db")]
    file: PathBuf,

    /// Time every store call
    #[arg(long)]
    timing: bool,

    /// Log every store call
    #[arg(long)]
    call_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show total, live and removed slot counts
    Stat,

    /// Print every live record
    List,

    /// Print records matching `field = value [and|or ...]`
    Find {
        criteria: String,
    },

    /// Delete records matching one `field = value` predicate
    Delete {
        predicate: String,
    },

    /// Drop deleted slots from the data file
    Purge,

    /// Write a snapshot of the live records
    Export {
        /// csv or xml
        format: Format,

        /// Destination path
        path: PathBuf,
    },

    /// Replace the store contents with a snapshot file
    Import {
        /// csv or xml
        format: Format,

        /// Source path
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rosterdb=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> rosterdb::Result<()> {
    let config = Config::builder()
        .backend(Backend::File)
        .data_file(&args.file)
        .timing(args.timing)
        .call_log(args.call_log)
        .build();

    let mut store = open_store(&config)?;

    match args.command {
        Commands::Stat => {
            let stat = store.stat()?;
            println!(
                "total={} live={} removed={}",
                stat.total,
                stat.live,
                stat.removed()
            );
        }
        Commands::List => {
            for record in store.iter()?.records() {
                print_record(&record?);
            }
        }
        Commands::Find { criteria } => {
            let criteria = Criteria::parse(&criteria)?;
            for record in store.find(&criteria)?.records() {
                print_record(&record?);
            }
        }
        Commands::Delete { predicate } => {
            let removed = store.delete(&predicate)?;
            println!("deleted {} record(s): {:?}", removed.len(), removed);
        }
        Commands::Purge => {
            let outcome = store.purge()?;
            println!(
                "purged {} of {} slot(s)",
                outcome.purged, outcome.total_before
            );
        }
        Commands::Export { format, path } => {
            let snapshot = store.snapshot()?;
            snapshot.export(&path, format)?;
            println!("exported {} record(s) to {}", snapshot.len(), path.display());
        }
        Commands::Import { format, path } => {
            let import = Snapshot::import_file(&path, format)?;
            for row in &import.skipped {
                println!("skipped line {}: {}", row.line, row.reason);
            }
            store.restore(&import.snapshot)?;
            println!("imported {} record(s)", import.snapshot.len());
        }
    }

    Ok(())
}

fn print_record(record: &Record) {
    let fields: Vec<String> = rosterdb::Field::ALL
        .iter()
        .map(|f| record.text(*f))
        .collect();
    println!("{}", fields.join("\t"));
}
