use std::collections::BTreeMap;

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::lookup::ZoneLookup;
use crate::record::Record;
use crate::store::{StoreReader, StoreWriter};

/// Computes the rollup key a zone code aggregates under.
#[derive(Clone, Copy)]
pub enum KeyResolver<'a> {
    /// Keep the first `n` characters of the zone code (OA to Ward).
    Prefix(usize),
    /// Dictionary rollup (OA to MSOA). A code missing from the lookup
    /// fails the run; dropping it would make the output totals smaller
    /// than the input totals.
    Lookup(&'a ZoneLookup),
}

impl KeyResolver<'_> {
    pub fn resolve(&self, zone_code: &str) -> Result<String> {
        match self {
            KeyResolver::Prefix(n) => Ok(zone_code.chars().take(*n).collect()),
            KeyResolver::Lookup(lookup) => lookup
                .get(zone_code)
                .map(str::to_owned)
                .ok_or_else(|| Error::UnknownZone {
                    code: zone_code.to_owned(),
                }),
        }
    }
}

/// Group records `start..end` by rollup key, merging same-key records by
/// field-wise addition. The accumulator is ordered by key, so iteration
/// order (and therefore output id assignment) is lexicographic and stable
/// across runs.
pub fn aggregate(
    reader: &mut StoreReader,
    start: u64,
    end: u64,
    resolver: KeyResolver<'_>,
) -> Result<BTreeMap<String, Record>> {
    let mut groups: BTreeMap<String, Record> = BTreeMap::new();
    for id in start..end {
        let record = reader.read_at(id)?;
        let key = resolver.resolve(&record.zone_code)?;
        groups
            .entry(key)
            .and_modify(|merged| merged.merge(&record))
            .or_insert(record);
    }
    debug!(
        "{} zones from {} records",
        groups.len(),
        end.saturating_sub(start)
    );
    Ok(groups)
}

/// Chunked variant of [`aggregate`]: non-overlapping id ranges are grouped
/// on rayon workers, each over its own reader handle, then the partial
/// maps are merged. Field addition is associative and commutative, so the
/// result is identical to the serial one.
pub fn aggregate_chunked(
    reader: &StoreReader,
    start: u64,
    end: u64,
    resolver: KeyResolver<'_>,
    chunk: u64,
) -> Result<BTreeMap<String, Record>> {
    if end.saturating_sub(start) == 0 {
        return Ok(BTreeMap::new());
    }
    let chunk = chunk.max(1);

    let mut ranges = Vec::new();
    let mut at = start;
    while at < end {
        ranges.push((at, (at + chunk).min(end)));
        at += chunk;
    }
    debug!("aggregating {} ranges of up to {} records", ranges.len(), chunk);

    let partials = ranges
        .into_par_iter()
        .map(|(a, b)| {
            let mut chunk_reader = reader.reopen()?;
            aggregate(&mut chunk_reader, a, b, resolver)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<String, Record> = BTreeMap::new();
    for partial in partials {
        for (key, record) in partial {
            groups
                .entry(key)
                .and_modify(|merged| merged.merge(&record))
                .or_insert(record);
        }
    }
    Ok(groups)
}

/// Write merged groups through `writer` in key order, assigning fresh
/// sequential ids from 0 and replacing each record's zone code with its
/// merge key. Returns the number of records written.
pub fn write_aggregated(
    groups: BTreeMap<String, Record>,
    writer: &mut StoreWriter,
) -> Result<u64> {
    let mut written = 0u64;
    for (key, mut record) in groups {
        record.id = written;
        record.zone_code = key;
        writer.append(&record)?;
        written += 1;
    }
    info!("wrote {} aggregated records", written);
    Ok(written)
}
