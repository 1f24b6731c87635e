//! Pending data plus header, and header resolution.

use crate::error::{ReceiptError, Result};
use crate::logger::Logger;
use crate::types::{Header, Record, Severity};
use serde::Serialize;

/// How a header became available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderResolution {
    /// A header was already set; nothing changed.
    Existing,

    /// The header was just derived from the first pending record.
    Derived,
}

/// The `{data, header}` bundle a store works against.
///
/// `data` is `None` for read-only stores.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub data: Option<Vec<Record>>,
    pub header: Option<Header>,
}

impl Schema {
    pub fn new(data: Option<Vec<Record>>, header: Option<Header>) -> Self {
        Self { data, header }
    }

    /// Make sure a header is set, deriving it from the first pending record if needed.
    ///
    /// Calling this again after success is a no-op returning `Existing`.
    pub fn resolve_header(&mut self, logger: &dyn Logger) -> Result<HeaderResolution> {
        if self.header.is_some() {
            return Ok(HeaderResolution::Existing);
        }

        logger.log(Severity::Wait, "no header set - attempting record keys");

        let data = self.data.as_ref().ok_or(ReceiptError::DataMissing)?;
        let first = data.first().ok_or(ReceiptError::HeaderUnresolvable)?;
        let header = Header::from_record(first);

        logger.log(
            Severity::Success,
            &format!("headers detected as {} from record keys", header),
        );
        self.header = Some(header);
        Ok(HeaderResolution::Derived)
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;

    #[test]
    fn test_resolve_from_first_record() {
        let logger = MemoryLogger::new();
        let mut schema = Schema::new(
            Some(vec![
                Record::from_pairs([("item", "apple"), ("qty", "3")]),
                Record::from_pairs([("other", "x")]),
            ]),
            None,
        );

        let resolution = schema.resolve_header(&logger).unwrap();

        assert_eq!(resolution, HeaderResolution::Derived);
        assert_eq!(schema.header().unwrap().fields(), &["item", "qty"]);
        assert_eq!(logger.count(Severity::Wait), 1);
        assert_eq!(logger.count(Severity::Success), 1);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let logger = MemoryLogger::new();
        let mut schema = Schema::new(
            Some(vec![Record::from_pairs([("a", "1"), ("b", "2")])]),
            None,
        );

        schema.resolve_header(&logger).unwrap();
        let first = schema.header().cloned();
        let again = schema.resolve_header(&logger).unwrap();

        assert_eq!(again, HeaderResolution::Existing);
        assert_eq!(schema.header().cloned(), first);
    }

    #[test]
    fn test_existing_header_untouched() {
        let logger = MemoryLogger::new();
        let header = Header::new(["x", "y"]).unwrap();
        let mut schema = Schema::new(
            Some(vec![Record::from_pairs([("a", "1")])]),
            Some(header.clone()),
        );

        assert_eq!(
            schema.resolve_header(&logger).unwrap(),
            HeaderResolution::Existing
        );
        assert_eq!(schema.header(), Some(&header));
        assert!(logger.entries().is_empty());
    }

    #[test]
    fn test_empty_data_is_unresolvable() {
        let logger = MemoryLogger::new();
        let mut schema = Schema::new(Some(Vec::new()), None);

        let result = schema.resolve_header(&logger);
        assert!(matches!(result, Err(ReceiptError::HeaderUnresolvable)));
        assert!(schema.header().is_none());
    }

    #[test]
    fn test_read_only_without_header_is_data_missing() {
        let logger = MemoryLogger::new();
        let mut schema = Schema::new(None, None);

        let result = schema.resolve_header(&logger);
        assert!(matches!(result, Err(ReceiptError::DataMissing)));
    }
}
