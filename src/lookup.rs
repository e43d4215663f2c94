use std::collections::HashMap;
use std::path::Path;

use log::info;

use crate::error::Result;

/// Read-only zone-to-zone dictionary, e.g. Output Area to MSOA. Loaded
/// wholesale before an aggregation run and only queried afterwards.
#[derive(Debug, Default)]
pub struct ZoneLookup {
    map: HashMap<String, String>,
}

impl ZoneLookup {
    /// Load the whole table from a two-column CSV (zone, parent). The
    /// header row is skipped; rows with fewer than two columns are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path.as_ref())?;

        let mut map = HashMap::new();
        for result in rdr.records() {
            let row = result?;
            if let (Some(zone), Some(parent)) = (row.get(0), row.get(1)) {
                map.insert(zone.trim().to_owned(), parent.trim().to_owned());
            }
        }
        info!(
            "loaded {} zone mappings from {}",
            map.len(),
            path.as_ref().display()
        );
        Ok(Self { map })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            map: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, zone_code: &str) -> Option<&str> {
        self.map.get(zone_code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_two_column_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "oa,msoa").unwrap();
        writeln!(file, "00AAFA0001,00AAFA").unwrap();
        writeln!(file, "00AAFA0002,00AAFA").unwrap();
        writeln!(file, "00AAFB0001,00AAFB").unwrap();
        drop(file);

        let lookup = ZoneLookup::load(&path).unwrap();
        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup.get("00AAFA0002"), Some("00AAFA"));
        assert_eq!(lookup.get("99ZZZZ9999"), None);
    }
}
