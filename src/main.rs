use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::error;

use censtab::config::{AggregateJob, ExportJob, IngestJob, Rollup};
use censtab::ingest::Source;
use censtab::schema::WARD_PREFIX_LEN;

#[derive(Parser, Debug)]
#[command(name = "censtab")]
#[command(about = "Census table store and geographic rollup tool")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a canonical per-table store from national extract CSVs
    Ingest {
        /// Catalogue table name, e.g. ks002
        #[arg(short, long)]
        table: String,

        /// Output store file
        #[arg(short, long)]
        store: PathBuf,

        /// Source extracts as <country>=<path>, in ingestion order
        #[arg(short = 'i', long = "input", value_parser = parse_source, required = true)]
        inputs: Vec<Source>,

        /// Id assigned to the first record
        #[arg(long, default_value_t = 0)]
        start_id: u64,

        /// Log progress every N records (0 disables)
        #[arg(long, default_value_t = 10_000)]
        progress_every: u64,
    },

    /// Roll a store up to a coarser geography
    Aggregate {
        /// Catalogue table name, e.g. ks002
        #[arg(short, long)]
        table: String,

        /// Input store file
        #[arg(short, long)]
        input: PathBuf,

        /// Output store file
        #[arg(short, long)]
        output: PathBuf,

        /// Prefix rollup: keep the first N zone-code characters
        /// (default: the 6-character ward prefix)
        #[arg(long, conflicts_with = "lookup")]
        prefix: Option<usize>,

        /// Lookup rollup: zone,parent CSV (e.g. OA to MSOA)
        #[arg(long)]
        lookup: Option<PathBuf>,

        /// First record id of the range
        #[arg(long, default_value_t = 0)]
        start: u64,

        /// One past the last record id (default: whole store)
        #[arg(long)]
        end: Option<u64>,

        /// Aggregate in parallel over chunks of N records
        #[arg(long)]
        chunk: Option<u64>,
    },

    /// Write a store out as CSV for inspection
    Export {
        /// Catalogue table name, e.g. ks002
        #[arg(short, long)]
        table: String,

        /// Store file to render
        #[arg(short, long)]
        store: PathBuf,

        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_source(value: &str) -> Result<Source, String> {
    let (country, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <country>=<path>, got {value:?}"))?;
    Ok(Source::new(path, country))
}

fn run(command: Command) -> censtab::Result<()> {
    match command {
        Command::Ingest {
            table,
            store,
            inputs,
            start_id,
            progress_every,
        } => {
            IngestJob {
                table,
                store,
                sources: inputs,
                start_id,
                progress_every,
            }
            .run()?;
        }
        Command::Aggregate {
            table,
            input,
            output,
            prefix,
            lookup,
            start,
            end,
            chunk,
        } => {
            let rollup = match (prefix, lookup) {
                (_, Some(path)) => Rollup::Lookup { path },
                (Some(len), None) => Rollup::Prefix { len },
                (None, None) => Rollup::Prefix {
                    len: WARD_PREFIX_LEN,
                },
            };
            AggregateJob {
                table,
                input,
                output,
                rollup,
                start,
                end,
                chunk,
            }
            .run()?;
        }
        Command::Export {
            table,
            store,
            output,
        } => {
            ExportJob {
                table,
                store,
                output,
            }
            .run()?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(args.command) {
        error!("{e}");
        process::exit(1);
    }
}
