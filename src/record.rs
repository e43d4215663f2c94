use byteorder::{BigEndian, ByteOrder};

use crate::schema::TableSchema;

/// One table row: sequential id, fixed-width zone code, one count per
/// schema field. Immutable once written to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u64,
    pub zone_code: String,
    pub values: Vec<i32>,
}

impl Record {
    pub fn new(id: u64, zone_code: impl Into<String>, values: Vec<i32>) -> Self {
        Self {
            id,
            zone_code: zone_code.into(),
            values,
        }
    }

    /// Field-wise sum of `other` into `self`. Totals wrap on i32 overflow;
    /// the format has no wider type to widen into.
    pub fn merge(&mut self, other: &Record) {
        debug_assert_eq!(self.values.len(), other.values.len());
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a = a.wrapping_add(*b);
        }
    }
}

/// Encode one record into its fixed-size block: big-endian u64 id, the
/// zone code as UTF-16 code units space-padded (or truncated) to the
/// schema width, then each field as a big-endian i32.
///
/// A record whose value count disagrees with the schema is a configuration
/// error and panics rather than writing a block that would corrupt every
/// later offset.
pub fn encode(record: &Record, schema: &TableSchema) -> Vec<u8> {
    assert_eq!(
        record.values.len(),
        schema.field_count(),
        "record has {} values but table {} has {} fields",
        record.values.len(),
        schema.name(),
        schema.field_count(),
    );

    let width = schema.zone_code_width();
    let mut buf = vec![0u8; schema.record_size()];
    BigEndian::write_u64(&mut buf[..8], record.id);

    let mut offset = 8;
    for unit in record
        .zone_code
        .encode_utf16()
        .chain(std::iter::repeat(b' ' as u16))
        .take(width)
    {
        BigEndian::write_u16(&mut buf[offset..offset + 2], unit);
        offset += 2;
    }

    for value in &record.values {
        BigEndian::write_i32(&mut buf[offset..offset + 4], *value);
        offset += 4;
    }

    buf
}

/// Decode a block previously produced by [`encode`] under the same schema.
/// Trailing zone-code padding is stripped. A block of the wrong length can
/// only come from a schema/store mismatch and panics.
pub fn decode(buf: &[u8], schema: &TableSchema) -> Record {
    assert_eq!(
        buf.len(),
        schema.record_size(),
        "block is {} bytes but table {} records are {} bytes",
        buf.len(),
        schema.name(),
        schema.record_size(),
    );

    let id = BigEndian::read_u64(&buf[..8]);

    let width = schema.zone_code_width();
    let mut units = Vec::with_capacity(width);
    for i in 0..width {
        units.push(BigEndian::read_u16(&buf[8 + 2 * i..]));
    }
    let zone_code = String::from_utf16_lossy(&units)
        .trim_end_matches(' ')
        .to_owned();

    let base = 8 + 2 * width;
    let values = (0..schema.field_count())
        .map(|i| BigEndian::read_i32(&buf[base + 4 * i..]))
        .collect();

    Record {
        id,
        zone_code,
        values,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn schema() -> TableSchema {
        TableSchema::new("test", 10, &["a", "b", "c"])
    }

    #[test]
    fn round_trip() {
        let record = Record::new(42, "00AAFA0001", vec![10, -2, 30]);
        let block = encode(&record, &schema());
        assert_eq!(block.len(), schema().record_size());
        assert_eq!(decode(&block, &schema()), record);
    }

    #[test]
    fn short_zone_code_is_padded_and_trimmed_back() {
        let record = Record::new(0, "00AA", vec![1, 2, 3]);
        let block = encode(&record, &schema());
        let mut expected = Vec::new();
        for ch in "00AA      ".chars() {
            expected.extend_from_slice(&(ch as u16).to_be_bytes());
        }
        assert_eq!(&block[8..28], expected.as_slice());
        assert_eq!(decode(&block, &schema()).zone_code, "00AA");
    }

    #[test]
    fn overlong_zone_code_is_truncated() {
        let record = Record::new(0, "00AAFA000199", vec![1, 2, 3]);
        let decoded = decode(&encode(&record, &schema()), &schema());
        assert_eq!(decoded.zone_code, "00AAFA0001");
    }

    #[test]
    fn merge_sums_field_wise() {
        let mut a = Record::new(0, "00AA", vec![10, 2, 8]);
        a.merge(&Record::new(1, "00AB", vec![5, 1, 4]));
        assert_eq!(a.values, vec![15, 3, 12]);
        assert_eq!(a.zone_code, "00AA");
    }

    #[test]
    fn merge_wraps_on_overflow() {
        let mut a = Record::new(0, "00AA", vec![i32::MAX, 0, 0]);
        a.merge(&Record::new(1, "00AB", vec![1, 0, 0]));
        assert_eq!(a.values[0], i32::MIN);
    }

    #[test]
    #[should_panic]
    fn wrong_value_count_panics() {
        encode(&Record::new(0, "00AA", vec![1]), &schema());
    }

    #[test]
    #[should_panic]
    fn wrong_block_length_panics() {
        decode(&[0u8; 7], &schema());
    }

    proptest! {
        #[test]
        fn round_trip_holds_for_all_valid_records(
            id in any::<u64>(),
            zone in "[0-9A-Z]{1,10}",
            values in prop::collection::vec(any::<i32>(), 3),
        ) {
            let record = Record::new(id, zone, values);
            let decoded = decode(&encode(&record, &schema()), &schema());
            prop_assert_eq!(decoded, record);
        }
    }
}
