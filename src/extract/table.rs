use crate::error::{EtlError, Result};
use crate::extract::discover::{get_files, FilePattern};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// An in-memory table of raw JSON records.
///
/// The column set is the union of every key seen across all rows, in
/// first-seen order. Rows that lack a column carry an explicit null for
/// it once the table is normalized.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover every matching file under `root` and load them all into
    /// one table, in discovery order.
    pub fn load_dir<P: AsRef<Path>>(root: P, pattern: &FilePattern) -> Result<Self> {
        let root = root.as_ref();
        let files = get_files(root, pattern)?;
        if files.is_empty() {
            return Err(EtlError::NoInputFiles {
                root: root.to_path_buf(),
            });
        }

        let tables = files
            .iter()
            .map(Self::read_ndjson)
            .collect::<Result<Vec<_>>>()?;
        let table = Self::concat(tables);

        info!(
            root = %root.display(),
            files = files.len(),
            rows = table.len(),
            columns = table.columns.len(),
            "Loaded records"
        );
        Ok(table)
    }

    /// Parse one newline-delimited JSON file
    pub fn read_ndjson<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EtlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(BufReader::new(file), path)?;
        debug!(path = %path.display(), rows = table.len(), "Parsed file");
        Ok(table)
    }

    /// Parse NDJSON from any reader; `path` is only used for error reports.
    ///
    /// Blank lines are skipped. Any other line that is not a JSON object
    /// fails the whole read.
    pub fn from_reader<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut table = RecordTable::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|source| EtlError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let mut bytes = line.into_bytes();
            let value: Value =
                simd_json::serde::from_slice(&mut bytes).map_err(|source| EtlError::Parse {
                    path: path.to_path_buf(),
                    line: line_no,
                    source,
                })?;

            match value {
                Value::Object(row) => table.push(row),
                _ => {
                    return Err(EtlError::NotAnObject {
                        path: path.to_path_buf(),
                        line: line_no,
                    })
                }
            }
        }

        table.normalize();
        Ok(table)
    }

    /// Concatenate tables, keeping every column of every input
    pub fn concat<I: IntoIterator<Item = RecordTable>>(tables: I) -> Self {
        let mut combined = RecordTable::new();
        for table in tables {
            for row in table.rows {
                combined.push(row);
            }
        }
        combined.normalize();
        combined
    }

    pub fn push(&mut self, row: Map<String, Value>) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Fill every missing column with null
    fn normalize(&mut self) {
        for row in self.rows.iter_mut() {
            for column in self.columns.iter() {
                if !row.contains_key(column) {
                    row.insert(column.clone(), Value::Null);
                }
            }
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose `column` holds exactly the string `value`, untouched
    /// otherwise. Lets callers drop rows before they are typed.
    pub fn filter_eq(&self, column: &str, value: &str) -> RecordTable {
        let rows = self
            .rows
            .iter()
            .filter(|row| row.get(column).and_then(Value::as_str) == Some(value))
            .cloned()
            .collect();

        RecordTable {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Convert every row into a typed record, in row order
    pub fn records<T: DeserializeOwned>(&self, entity: &'static str) -> Result<Vec<T>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                serde_json::from_value(Value::Object(row.clone())).map_err(|e| {
                    EtlError::InvalidRecord {
                        entity,
                        reason: format!("row {}: {}", idx, e),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SongRecord;
    use std::fs;
    use std::io::Cursor;

    fn parse(input: &str) -> Result<RecordTable> {
        RecordTable::from_reader(Cursor::new(input), Path::new("test.json"))
    }

    #[test]
    fn test_parse_lines() {
        let table = parse("{\"a\": 1}\n\n{\"a\": 2, \"b\": \"x\"}\n").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), ["a", "b"]);
        assert_eq!(table.rows()[0].get("b"), Some(&Value::Null));
        assert_eq!(table.rows()[1].get("b").unwrap(), "x");
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let err = parse("{\"a\": 1}\n{\"a\": \n").unwrap_err();
        assert!(matches!(err, EtlError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_non_object_line_is_fatal() {
        let err = parse("[1, 2, 3]\n").unwrap_err();
        assert!(matches!(err, EtlError::NotAnObject { line: 1, .. }));
    }

    #[test]
    fn test_concat_keeps_column_superset() {
        let first = parse("{\"a\": 1}\n").unwrap();
        let second = parse("{\"b\": 2}\n").unwrap();

        let combined = RecordTable::concat(vec![first, second]);

        assert_eq!(combined.len(), 2);
        assert_eq!(combined.columns(), ["a", "b"]);
        assert_eq!(combined.rows()[0].get("b"), Some(&Value::Null));
        assert_eq!(combined.rows()[1].get("a"), Some(&Value::Null));
    }

    #[test]
    fn test_load_dir_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = RecordTable::load_dir(dir.path(), &FilePattern::default()).unwrap_err();
        assert!(matches!(err, EtlError::NoInputFiles { .. }));
    }

    #[test]
    fn test_load_dir_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{\"n\": 1}\n{\"n\": 2}\n").unwrap();
        fs::write(dir.path().join("b.json"), "{\"n\": 3}\n").unwrap();

        let table = RecordTable::load_dir(dir.path(), &FilePattern::default()).unwrap();
        let order: Vec<_> = table.rows().iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_filter_eq_keeps_matching_rows() {
        let table = parse(
            "{\"page\": \"NextSong\", \"n\": 1}\n{\"page\": \"Home\", \"n\": \"x\"}\n{\"n\": 3}\n",
        )
        .unwrap();

        let filtered = table.filter_eq("page", "NextSong");

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows()[0]["n"], 1);
        assert_eq!(filtered.columns(), table.columns());
    }

    #[test]
    fn test_typed_records_report_bad_rows() {
        let table = parse("{\"title\": \"no id\", \"artist_id\": \"AR1\"}\n").unwrap();
        let err = table.records::<SongRecord>("song").unwrap_err();
        assert!(matches!(err, EtlError::InvalidRecord { entity: "song", .. }));
    }
}
