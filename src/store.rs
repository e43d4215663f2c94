use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::record::{self, Record};
use crate::schema::TableSchema;

/// Append half of a record store. One writer is bound to one schema and
/// one file; records land at the end in call order. There is no read
/// access on this handle, drop it and open a [`StoreReader`] instead.
pub struct StoreWriter {
    out: BufWriter<File>,
    schema: TableSchema,
    written: u64,
}

impl StoreWriter {
    /// Create or truncate the backing file.
    pub fn create<P: AsRef<Path>>(path: P, schema: &TableSchema) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        debug!(
            "store {} opened for append, {} bytes/record",
            path.as_ref().display(),
            schema.record_size()
        );
        Ok(Self {
            out: BufWriter::new(file),
            schema: schema.clone(),
            written: 0,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Encode and write one record at the current end of the store.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        let block = record::encode(record, &self.schema);
        self.out.write_all(&block)?;
        self.written += 1;
        Ok(())
    }

    /// Flush everything to disk and return the record count.
    pub fn finish(mut self) -> Result<u64> {
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Read-only random-access half of a record store. The record at index
/// `i` occupies bytes `[i * record_size, (i + 1) * record_size)`; the file
/// carries no header, so the byte length alone determines the count.
pub struct StoreReader {
    file: File,
    path: PathBuf,
    schema: TableSchema,
    count: u64,
}

impl StoreReader {
    /// Open an existing store for reading. A file whose length is not a
    /// whole number of records was written under some other schema and is
    /// rejected here, before any read can return garbage.
    pub fn open<P: AsRef<Path>>(path: P, schema: &TableSchema) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        let record_size = schema.record_size() as u64;
        if len % record_size != 0 {
            return Err(Error::MisalignedStore {
                path,
                len,
                record_size,
            });
        }
        Ok(Self {
            file,
            path,
            schema: schema.clone(),
            count: len / record_size,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records, from the byte length. No scan.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Seek to `index * record_size`, read exactly one block, decode.
    pub fn read_at(&mut self, index: u64) -> Result<Record> {
        if index >= self.count {
            return Err(Error::OutOfRange {
                index,
                count: self.count,
            });
        }
        let record_size = self.schema.record_size();
        self.file
            .seek(SeekFrom::Start(index * record_size as u64))?;
        let mut block = vec![0u8; record_size];
        self.file.read_exact(&mut block)?;
        Ok(record::decode(&block, &self.schema))
    }

    /// Independent handle on the same store, for range-partitioned reads.
    pub fn reopen(&self) -> Result<Self> {
        Self::open(&self.path, &self.schema)
    }
}
