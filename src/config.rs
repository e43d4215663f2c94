use std::io;
use std::path::PathBuf;

use log::info;

use crate::aggregate::{self, KeyResolver};
use crate::error::{Error, Result};
use crate::export;
use crate::ingest::{self, IngestReport, Source};
use crate::lookup::ZoneLookup;
use crate::store::{StoreReader, StoreWriter};
use crate::tables::{self, TableDef};

/// Rollup selection for one aggregation run.
#[derive(Debug, Clone)]
pub enum Rollup {
    /// Keep the first `len` zone-code characters (OA to Ward).
    Prefix { len: usize },
    /// Dictionary rollup through a zone,parent CSV (OA to MSOA).
    Lookup { path: PathBuf },
}

fn table(name: &str) -> Result<TableDef> {
    tables::builtin(name).ok_or_else(|| Error::UnknownTable(name.to_owned()))
}

/// Build one canonical per-table store from national extract CSVs.
#[derive(Debug, Clone)]
pub struct IngestJob {
    pub table: String,
    pub store: PathBuf,
    pub sources: Vec<Source>,
    pub start_id: u64,
    pub progress_every: u64,
}

impl IngestJob {
    pub fn run(&self) -> Result<IngestReport> {
        let table = table(&self.table)?;
        info!("ingesting {}", table.schema.describe());

        let parser = table.parser();
        let mut writer = StoreWriter::create(&self.store, &table.schema)?;
        let report = ingest::ingest(
            &self.sources,
            &parser,
            &mut writer,
            self.start_id,
            self.progress_every,
        )?;
        writer.finish()?;
        info!(
            "{}: {} records -> {}",
            self.table,
            report.total(),
            self.store.display()
        );
        Ok(report)
    }
}

/// Roll a record range of one store up to a coarser geography, producing a
/// new store under the same schema.
#[derive(Debug, Clone)]
pub struct AggregateJob {
    pub table: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub rollup: Rollup,
    pub start: u64,
    /// One past the last record id; the whole store when `None`.
    pub end: Option<u64>,
    /// Aggregate in parallel over chunks of this many records.
    pub chunk: Option<u64>,
}

impl AggregateJob {
    pub fn run(&self) -> Result<u64> {
        let table = table(&self.table)?;
        let mut reader = StoreReader::open(&self.input, &table.schema)?;
        let end = self.end.unwrap_or_else(|| reader.count());

        let lookup;
        let resolver = match &self.rollup {
            Rollup::Prefix { len } => KeyResolver::Prefix(*len),
            Rollup::Lookup { path } => {
                lookup = ZoneLookup::load(path)?;
                KeyResolver::Lookup(&lookup)
            }
        };

        let groups = match self.chunk {
            Some(chunk) => {
                aggregate::aggregate_chunked(&reader, self.start, end, resolver, chunk)?
            }
            None => aggregate::aggregate(&mut reader, self.start, end, resolver)?,
        };

        let mut writer = StoreWriter::create(&self.output, &table.schema)?;
        let written = aggregate::write_aggregated(groups, &mut writer)?;
        writer.finish()?;
        info!(
            "{}: records {}..{} -> {} zones in {}",
            self.table,
            self.start,
            end,
            written,
            self.output.display()
        );
        Ok(written)
    }
}

/// Render a store as CSV, to a file or stdout.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub table: String,
    pub store: PathBuf,
    pub output: Option<PathBuf>,
}

impl ExportJob {
    pub fn run(&self) -> Result<()> {
        let table = table(&self.table)?;
        let mut reader = StoreReader::open(&self.store, &table.schema)?;
        match &self.output {
            Some(path) => export::export_path(&mut reader, path),
            None => export::export(&mut reader, io::stdout().lock()),
        }
    }
}
