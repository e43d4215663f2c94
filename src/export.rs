use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::store::StoreReader;

/// Render a finished store as CSV for inspection: a header of
/// `record_id, zone_code` plus the schema field names, then one row per
/// record in store order. No validation happens here.
pub fn export<W: Write>(reader: &mut StoreReader, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["record_id".to_owned(), "zone_code".to_owned()];
    header.extend(reader.schema().fields().iter().cloned());
    writer.write_record(&header)?;

    for id in 0..reader.count() {
        let record = reader.read_at(id)?;
        let mut row = vec![record.id.to_string(), record.zone_code];
        row.extend(record.values.iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn export_path<P: AsRef<Path>>(reader: &mut StoreReader, path: P) -> Result<()> {
    export(reader, File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::schema::TableSchema;
    use crate::store::StoreWriter;

    #[test]
    fn header_then_rows_in_store_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.bin");
        let schema = TableSchema::new("test", 4, &["total", "males", "females"]);

        let mut writer = StoreWriter::create(&path, &schema).unwrap();
        writer
            .append(&Record::new(0, "00AA", vec![10, 4, 6]))
            .unwrap();
        writer
            .append(&Record::new(1, "00AB", vec![3, 1, 2]))
            .unwrap();
        writer.finish().unwrap();

        let mut reader = StoreReader::open(&path, &schema).unwrap();
        let mut out = Vec::new();
        export(&mut reader, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "record_id,zone_code,total,males,females\n\
             0,00AA,10,4,6\n\
             1,00AB,3,1,2\n"
        );
    }
}
