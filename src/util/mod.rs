//! Stateless helpers that sit beside the store.
//!
//! Link scraping pulls downloadable file URLs out of an HTML page; the
//! filesystem helpers write fetched bytes and measure directories.

mod fs;
mod links;

pub use fs::{all_dir_sizes, bytes_to_gib, dir_size, write_bytes};
pub use links::extract_links;
