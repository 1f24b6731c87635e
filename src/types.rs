//! Core types for the receipts store.

use crate::error::{ReceiptError, Result};
use chrono::{Local, NaiveDateTime};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Default name of the timestamp column.
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "ts";

/// Render format for timestamps (`2024-01-01 00:00:00.000000`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A single row: field name to string value, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(field, value)` pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.insert(k, v);
        }
        record
    }

    /// Set a field. An existing field keeps its position and gets the new value.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((field, value));
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == field)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True if any value contains `needle` (case-sensitive).
    pub fn matches(&self, needle: &str) -> bool {
        self.values().any(|v| v.contains(needle))
    }

    /// Values laid out in `header` order; missing fields become empty strings.
    pub fn row_for(&self, header: &Header) -> Vec<String> {
        header
            .fields()
            .iter()
            .map(|f| self.get(f).unwrap_or_default().to_string())
            .collect()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Ordered, duplicate-free list of field names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Header(Vec<String>);

impl Header {
    /// Build a header, rejecting duplicate field names.
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut header = Header(Vec::new());
        for field in fields {
            let field = field.into();
            if header.contains(&field) {
                return Err(ReceiptError::DuplicateField(field));
            }
            header.0.push(field);
        }
        Ok(header)
    }

    /// Header made of a record's field names, in its insertion order.
    pub fn from_record(record: &Record) -> Self {
        // Record keys are unique by construction.
        Header(record.keys().map(str::to_string).collect())
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    /// Append `field` unless already present. Returns whether it was added.
    pub fn push_if_absent(&mut self, field: &str) -> bool {
        if self.contains(field) {
            false
        } else {
            self.0.push(field.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Local wall-clock time a record was stamped.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub NaiveDateTime);

impl Timestamp {
    /// Current local time.
    pub fn now() -> Self {
        Timestamp(Local::now().naive_local())
    }

    /// Parse a rendered timestamp. Fractional seconds are optional.
    pub fn parse(s: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")
            .map(Timestamp)
            .map_err(|e| ReceiptError::InvalidFormat(format!("bad timestamp {s:?}: {e}")))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self)
    }
}

/// Severity of a store narration message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Fatal,
    Warn,
    Info,
    Wait,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "FATAL",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::Wait => "WAIT",
            Severity::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `RecordStore::create`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The file was created (or truncated) and this header row written.
    Created { header: Header },

    /// The file already existed and overwrite was not requested.
    Skipped,
}

/// Result of a successful `RecordStore::append`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendSummary {
    /// File the rows were written to.
    pub path: PathBuf,

    /// Number of data rows written (header row excluded).
    pub written: usize,

    /// Header the rows were laid out against.
    pub header: Header,
}
