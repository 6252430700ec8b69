use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;
use uuid::Uuid;

/// Opaque token identifying a parsed table between the upload and the
/// point-conversion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableHandle(pub Uuid);

impl TableHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl Default for TableHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tabular upload with every cell kept as a string
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecordSet {
    pub source_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows dropped as malformed during parsing
    pub skipped_rows: usize,
}

impl TableRecordSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First `n` rows as ordered records
    pub fn preview(&self, n: usize) -> Vec<TableRecord<'_>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| TableRecord { columns: &self.columns, values: row })
            .collect()
    }
}

/// Borrowed row that serializes as a JSON object in column order
#[derive(Debug, Clone, Copy)]
pub struct TableRecord<'a> {
    pub columns: &'a [String],
    pub values: &'a [String],
}

impl TableRecord<'_> {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }
}

impl Serialize for TableRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values.iter()) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
