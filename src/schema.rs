use itertools::Itertools;

/// Character width of an Output Area zone code in the census extracts.
pub const OA_ZONE_WIDTH: usize = 10;

/// Leading characters of an OA code that identify its ward.
pub const WARD_PREFIX_LEN: usize = 6;

/// Static description of one statistical table: the fixed zone-code width
/// and the ordered 32-bit count fields. Field order defines both the
/// on-disk layout and the CSV column order, so a schema is fixed for the
/// lifetime of any store written under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    zone_code_width: usize,
    fields: Vec<String>,
}

impl TableSchema {
    pub fn new(name: &str, zone_code_width: usize, fields: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            zone_code_width,
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone_code_width(&self) -> usize {
        self.zone_code_width
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Byte size of one encoded record: 8 (id) + 2 per zone-code character
    /// + 4 per field. All store offset arithmetic derives from this.
    pub fn record_size(&self) -> usize {
        8 + 2 * self.zone_code_width + 4 * self.fields.len()
    }

    /// One-line summary for logs.
    pub fn describe(&self) -> String {
        format!(
            "{} ({} fields, {} bytes/record: {})",
            self.name,
            self.fields.len(),
            self.record_size(),
            self.fields.iter().join(", ")
        )
    }
}
