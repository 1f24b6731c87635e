//! # Receipts
//!
//! Append-only "receipt" records kept in a single delimited-text file, plus a
//! few helpers for scraping downloadable links off HTML pages.
//!
//! ## Core Concepts
//!
//! - **Records**: ordered field-name to string-value rows
//! - **Header**: the ordered, unique field list; inferred from the first pending record when not given
//! - **Pending data**: the in-memory buffer `append` persists, stamping each record with a `ts` field
//! - **Confirmation guard**: `destroy` only deletes when handed the file's base name
//!
//! ## Example
//!
//! ```no_run
//! use receipts::{AppendOptions, CreateOptions, Query, Record, RecordStore, StoreConfig};
//!
//! let mut store = RecordStore::new(
//!     StoreConfig::new("out/r.csv"),
//!     vec![Record::from_pairs([("item", "apple"), ("qty", "3")])],
//!     None,
//! );
//!
//! // Header row: item,qty,ts
//! store.create(CreateOptions::default())?;
//!
//! // One stamped row
//! store.append(AppendOptions::default())?;
//!
//! let rows = store.query(Query::All)?.into_rows();
//! assert_eq!(rows[0].get("item"), Some("apple"));
//!
//! store.destroy(Some("r.csv"))?;
//! # Ok::<(), receipts::ReceiptError>(())
//! ```

pub mod csv;
pub mod error;
pub mod logger;
pub mod schema;
pub mod stamp;
pub mod store;
pub mod types;
pub mod util;

// Re-exports
pub use error::{ReceiptError, Result};
pub use logger::{Logger, MemoryLogger, TracingLogger};
pub use schema::{HeaderResolution, Schema};
pub use stamp::{stamp, stamp_at};
pub use store::{
    Access, AppendOptions, CreateOptions, Lookup, Query, QueryResult, RecordStore,
    RecordStoreBuilder, StoreConfig,
};
pub use types::*;
pub use util::{all_dir_sizes, bytes_to_gib, dir_size, extract_links, write_bytes};
