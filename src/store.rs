//! Record store over a single delimited-text file.

use crate::csv::{self, DEFAULT_DELIMITER};
use crate::error::{ReceiptError, Result};
use crate::logger::{Logger, TracingLogger};
use crate::schema::{HeaderResolution, Schema};
use crate::stamp::stamp;
use crate::types::{
    AppendSummary, CreateOutcome, Header, Record, Severity, DEFAULT_TIMESTAMP_COLUMN,
};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Store configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backing file.
    pub path: PathBuf,

    /// Field delimiter.
    pub delimiter: char,

    /// Name of the column holding creation timestamps.
    pub timestamp_column: String,

    /// Whether `create` makes missing parent directories.
    pub create_parent_dirs: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./receipts.csv"),
            delimiter: DEFAULT_DELIMITER,
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            create_parent_dirs: true,
        }
    }
}

impl StoreConfig {
    /// Default configuration for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = column.into();
        self
    }

    /// Load from JSON. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Options for [`RecordStore::create`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateOptions {
    /// Truncate an existing file instead of skipping.
    pub overwrite: bool,

    /// Add the timestamp column to the header.
    pub with_timestamp: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            with_timestamp: true,
        }
    }
}

/// Options for [`RecordStore::append`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppendOptions {
    /// Truncate the file and rewrite the header row before the records.
    pub overwrite: bool,

    /// Stamp every pending record before writing it.
    pub with_timestamp: bool,

    /// Log the whole schema on success instead of a row count.
    pub verbose: bool,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            with_timestamp: true,
            verbose: false,
        }
    }
}

/// Row selector for lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// Zero-based data row. Negative values count back from the last row.
    Index(isize),

    /// Case-sensitive substring of any field value.
    Contains(String),
}

impl From<isize> for Lookup {
    fn from(index: isize) -> Self {
        Lookup::Index(index)
    }
}

impl From<usize> for Lookup {
    fn from(index: usize) -> Self {
        Lookup::Index(isize::try_from(index).unwrap_or(isize::MAX))
    }
}

impl From<&str> for Lookup {
    fn from(needle: &str) -> Self {
        Lookup::Contains(needle.to_string())
    }
}

impl From<String> for Lookup {
    fn from(needle: String) -> Self {
        Lookup::Contains(needle)
    }
}

/// A read request against the backing file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Every record in the file.
    All,

    /// The record at a zero-based row, `-1` being the last.
    Index(isize),

    /// Records with at least one value containing the needle.
    Contains(String),
}

impl Query {
    /// Map a `(line, all)` argument pair onto a query.
    ///
    /// Both set is a conflict; neither set is invalid.
    pub fn from_args(line: Option<Lookup>, all: bool) -> Result<Self> {
        match (line, all) {
            (Some(_), true) => Err(ReceiptError::ArgumentConflict(
                "you have `line` and `all` set".into(),
            )),
            (None, true) => Ok(Query::All),
            (Some(Lookup::Index(i)), false) => Ok(Query::Index(i)),
            (Some(Lookup::Contains(s)), false) => Ok(Query::Contains(s)),
            (None, false) => Err(ReceiptError::InvalidArgument(
                "either `line` or `all` must be set".into(),
            )),
        }
    }
}

/// What a [`Query`] returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryResult {
    Row(Record),
    Rows(Vec<Record>),
}

impl QueryResult {
    /// Flatten into a list of records.
    pub fn into_rows(self) -> Vec<Record> {
        match self {
            QueryResult::Row(r) => vec![r],
            QueryResult::Rows(rs) => rs,
        }
    }
}

/// Whether a store may write pending data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// No pending buffer; reads only.
    ReadOnly,

    /// Pending records to be persisted by `append`.
    ReadWrite(Vec<Record>),
}

/// Builder for [`RecordStore`].
pub struct RecordStoreBuilder {
    config: StoreConfig,
    access: Option<Access>,
    header: Option<Header>,
    logger: Arc<dyn Logger>,
}

impl RecordStoreBuilder {
    pub fn data(mut self, records: Vec<Record>) -> Self {
        self.access = Some(Access::ReadWrite(records));
        self
    }

    pub fn read_only(mut self) -> Self {
        self.access = Some(Access::ReadOnly);
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn header(mut self, header: Header) -> Self {
        self.header = Some(header);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Build the store. Fails with `DataMissing` if neither `data` nor `read_only` was chosen.
    pub fn build(self) -> Result<RecordStore> {
        let data = match self.access {
            Some(Access::ReadWrite(records)) => Some(records),
            Some(Access::ReadOnly) => None,
            None => {
                let err = ReceiptError::DataMissing;
                self.logger.log(Severity::Fatal, &err.to_string());
                return Err(err);
            }
        };
        Ok(RecordStore::assemble(
            self.config,
            Schema::new(data, self.header),
            self.logger,
        ))
    }
}

/// A thin state machine over one delimited-text file.
///
/// Holds the file path, an in-memory buffer of pending records and the
/// header. Every file operation opens and closes its handle within the call.
pub struct RecordStore {
    /// Store configuration.
    config: StoreConfig,

    /// Pending records and the header they are written against.
    schema: Schema,

    /// Sink for narration messages.
    logger: Arc<dyn Logger>,
}

impl RecordStore {
    pub fn builder(config: StoreConfig) -> RecordStoreBuilder {
        RecordStoreBuilder {
            config,
            access: None,
            header: None,
            logger: Arc::new(TracingLogger),
        }
    }

    /// Write-capable store with `data` as its pending buffer.
    pub fn new(config: StoreConfig, data: Vec<Record>, header: Option<Header>) -> Self {
        Self::assemble(
            config,
            Schema::new(Some(data), header),
            Arc::new(TracingLogger),
        )
    }

    /// Read-only store. `create` needs `header` to be given.
    pub fn open_read_only(config: StoreConfig, header: Option<Header>) -> Self {
        Self::assemble(config, Schema::new(None, header), Arc::new(TracingLogger))
    }

    /// Nullable-data constructor. `None` data is rejected with `DataMissing`.
    pub fn from_parts(
        config: StoreConfig,
        data: Option<Vec<Record>>,
        header: Option<Header>,
    ) -> Result<Self> {
        let mut builder = Self::builder(config);
        if let Some(records) = data {
            builder = builder.access(Access::ReadWrite(records));
        }
        if let Some(header) = header {
            builder = builder.header(header);
        }
        builder.build()
    }

    fn assemble(config: StoreConfig, schema: Schema, logger: Arc<dyn Logger>) -> Self {
        let store = Self {
            config,
            schema,
            logger,
        };
        if !store.exists() {
            store.logger.log(Severity::Warn, "path not found");
        }
        store
    }

    // --- Accessors ---

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current header, if resolved or supplied.
    pub fn header(&self) -> Option<&Header> {
        self.schema.header()
    }

    /// Pending records, or `None` for a read-only store.
    pub fn pending(&self) -> Option<&[Record]> {
        self.schema.data.as_deref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_read_only(&self) -> bool {
        self.schema.data.is_none()
    }

    /// Whether the backing file exists.
    pub fn exists(&self) -> bool {
        self.config.path.exists()
    }

    /// Queue a record for the next `append`.
    pub fn push(&mut self, record: Record) -> Result<()> {
        self.extend(std::iter::once(record))
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) -> Result<()> {
        let result = match self.schema.data.as_mut() {
            Some(data) => {
                data.extend(records);
                Ok(())
            }
            None => Err(ReceiptError::DataMissing),
        };
        self.report(result)
    }

    /// Resolve the header from pending data if it is not set yet.
    pub fn resolve_header(&mut self) -> Result<HeaderResolution> {
        let result = self.schema.resolve_header(&*self.logger);
        self.report(result)
    }

    // --- Operations ---

    /// Initialize the backing file with a header row.
    ///
    /// Existing file without `overwrite` is left alone and `Skipped` is returned.
    pub fn create(&mut self, opts: CreateOptions) -> Result<CreateOutcome> {
        let result = self.create_inner(opts);
        self.report(result)
    }

    fn create_inner(&mut self, opts: CreateOptions) -> Result<CreateOutcome> {
        let path = self.config.path.clone();

        if self.exists() && !opts.overwrite {
            self.logger
                .log(Severity::Warn, &format!("{} exists", path.display()));
            return Ok(CreateOutcome::Skipped);
        }

        if self.schema.data.is_some() {
            self.schema.resolve_header(&*self.logger)?;
        }
        let header = self
            .schema
            .header
            .as_mut()
            .ok_or(ReceiptError::DataMissing)?;
        if opts.with_timestamp {
            header.push_if_absent(&self.config.timestamp_column);
        }
        let header = header.clone();

        if self.config.create_parent_dirs {
            ensure_parent(&path)?;
        }

        let mut out = BufWriter::new(File::create(&path)?);
        csv::write_row(&mut out, header.fields(), self.config.delimiter)?;
        out.flush()?;

        self.logger
            .log(Severity::Info, &format!("{} header used", header));
        self.logger
            .log(Severity::Info, &format!("created {}", path.display()));

        Ok(CreateOutcome::Created { header })
    }

    /// Run a query against the backing file.
    pub fn query(&mut self, query: Query) -> Result<QueryResult> {
        match query {
            Query::All => self.all().map(QueryResult::Rows),
            Query::Index(index) => self.get(index).map(QueryResult::Row),
            Query::Contains(needle) => self.search(&needle).map(QueryResult::Rows),
        }
    }

    /// Every record in the file, keyed by the file's header row. Pending data is ignored.
    pub fn all(&self) -> Result<Vec<Record>> {
        let result = self.read_file();
        self.report(result)
    }

    /// The record at zero-based data row `index`.
    ///
    /// A negative `index` counts from the end: `-1` is the last row.
    pub fn get(&mut self, index: isize) -> Result<Record> {
        let result = self.get_inner(index);
        self.report(result)
    }

    fn get_inner(&mut self, index: isize) -> Result<Record> {
        self.resolve_for_read()?;
        let records = self.read_file()?;
        let len = records.len();
        let pos = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs())
        };
        pos.and_then(|p| records.into_iter().nth(p))
            .ok_or(ReceiptError::IndexOutOfRange { index, len })
    }

    /// Records where at least one value contains `needle`. Logs once per record scanned.
    pub fn search(&mut self, needle: &str) -> Result<Vec<Record>> {
        let result = self.search_inner(needle);
        self.report(result)
    }

    fn search_inner(&mut self, needle: &str) -> Result<Vec<Record>> {
        self.resolve_for_read()?;
        let records = self.read_file()?;

        let mut found = Vec::new();
        for (row, record) in records.into_iter().enumerate() {
            let hit = record.matches(needle);
            self.logger.log(
                Severity::Info,
                &format!(
                    "row {}: {} {:?}",
                    row,
                    if hit { "found" } else { "no" },
                    needle
                ),
            );
            if hit {
                found.push(record);
            }
        }
        Ok(found)
    }

    /// Header resolution ahead of a filtered read.
    ///
    /// Reads are keyed by the file's own header row, so an unresolvable
    /// in-memory header is narrated and tolerated.
    fn resolve_for_read(&mut self) -> Result<()> {
        match self.schema.resolve_header(&*self.logger) {
            Ok(_) => Ok(()),
            Err(ReceiptError::DataMissing) | Err(ReceiptError::HeaderUnresolvable) => {
                self.logger
                    .log(Severity::Wait, "no header resolved - using the file's header row");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn read_file(&self) -> Result<Vec<Record>> {
        if !self.exists() {
            return Err(ReceiptError::PathMissing(self.config.path.clone()));
        }
        let text = fs::read_to_string(&self.config.path)?;
        let (_, records) = csv::read_records(&text, self.config.delimiter)?;
        Ok(records)
    }

    /// Persist the pending records.
    ///
    /// With `with_timestamp`, each pending record is stamped in place, so the
    /// buffer itself carries the timestamp afterwards. Rows are laid out in
    /// header order: missing fields are written empty and fields outside the
    /// header are dropped. The buffer is not cleared.
    pub fn append(&mut self, opts: AppendOptions) -> Result<AppendSummary> {
        let result = self.append_inner(opts);
        self.report(result)
    }

    fn append_inner(&mut self, opts: AppendOptions) -> Result<AppendSummary> {
        if self.schema.data.is_none() {
            return Err(ReceiptError::DataMissing);
        }

        self.schema.resolve_header(&*self.logger)?;
        let column = self.config.timestamp_column.clone();
        let header = self
            .schema
            .header
            .as_mut()
            .ok_or(ReceiptError::HeaderUnresolvable)?;
        if opts.with_timestamp {
            header.push_if_absent(&column);
        }
        let header = header.clone();

        let path = self.config.path.clone();
        if !self.exists() {
            return Err(ReceiptError::PathMissing(path));
        }

        let file = if opts.overwrite {
            File::create(&path)?
        } else {
            OpenOptions::new().append(true).open(&path)?
        };
        let mut out = BufWriter::new(file);
        let sep = self.config.delimiter;

        if opts.overwrite {
            csv::write_row(&mut out, header.fields(), sep)?;
        }

        let data = self
            .schema
            .data
            .as_mut()
            .ok_or(ReceiptError::DataMissing)?;
        let mut unknown: Vec<String> = Vec::new();
        for record in data.iter_mut() {
            if opts.with_timestamp {
                stamp(record, &column);
            }
            for field in record.keys() {
                if !header.contains(field) && !unknown.iter().any(|u| u == field) {
                    unknown.push(field.to_string());
                }
            }
            csv::write_row(&mut out, &record.row_for(&header), sep)?;
        }
        let written = data.len();
        out.flush()?;
        drop(out);

        if !unknown.is_empty() {
            self.logger.log(
                Severity::Warn,
                &format!("fields not in header dropped: [{}]", unknown.join(", ")),
            );
        }

        let message = if opts.verbose {
            serde_json::to_string(&self.schema)?
        } else {
            format!("{} written to {}", written, path.display())
        };
        self.logger.log(Severity::Success, &message);

        Ok(AppendSummary {
            path,
            written,
            header,
        })
    }

    /// Delete the backing file. `confirm` must equal the file's base name.
    pub fn destroy(&mut self, confirm: Option<&str>) -> Result<()> {
        let result = self.destroy_inner(confirm);
        self.report(result)
    }

    fn destroy_inner(&mut self, confirm: Option<&str>) -> Result<()> {
        let path = &self.config.path;
        let expected = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ReceiptError::InvalidArgument(format!("{} has no file name", path.display()))
            })?;

        if confirm != Some(expected.as_str()) {
            return Err(ReceiptError::ConfirmationMismatch {
                expected,
                got: confirm.map(str::to_string),
            });
        }
        if !path.exists() {
            return Err(ReceiptError::PathMissing(path.clone()));
        }

        fs::remove_file(path)?;
        self.logger.log(
            Severity::Warn,
            &format!("{} destroyed from {}", expected, path.display()),
        );
        Ok(())
    }

    /// Narrate a failure at `Fatal` before handing it back.
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.logger.log(Severity::Fatal, &e.to_string());
        }
        result
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
