//! Delimited-text codec.
//!
//! Minimal quoting: a field is wrapped in `"` only when it contains the
//! delimiter, a quote, CR or LF, and inner quotes are doubled. The parser
//! accepts LF, CRLF and bare CR line endings and skips blank lines.

use crate::error::Result;
use crate::types::{Header, Record};
use std::io::{self, Write};
use std::mem::take;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Split delimited text into rows of cells.
///
/// An unterminated quote swallows the rest of the input into the last field.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    // Anything seen on the current line; a line with nothing on it is blank.
    let mut touched = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => {
                in_quotes = true;
                touched = true;
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
                touched = true;
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if touched {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
                touched = false;
            }
            _ => {
                field.push(ch);
                touched = true;
            }
        }
    }

    if touched {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single row to any writer, terminated by `\n`.
///
/// A lone empty cell is written as `""` so the row does not read back as blank.
pub fn write_row<W, S>(mut w: W, row: &[S], sep: char) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    if let [only] = row {
        if only.as_ref().is_empty() {
            return writeln!(w, "\"\"");
        }
    }
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", sep)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    writeln!(w)
}

/// Parse text whose first row is a header into header-keyed records.
///
/// Short rows are padded with empty values; cells beyond the header are dropped.
/// Returns `None` for the header when the text holds no rows at all.
pub fn read_records(text: &str, sep: char) -> Result<(Option<Header>, Vec<Record>)> {
    let mut rows = parse_rows(text, sep).into_iter();
    let header = match rows.next() {
        Some(first) => Header::new(first)?,
        None => return Ok((None, Vec::new())),
    };

    let mut records = Vec::new();
    for (line, row) in rows.enumerate() {
        if row.len() > header.len() {
            tracing::debug!(
                row = line,
                cells = row.len(),
                columns = header.len(),
                "dropping cells beyond header"
            );
        }
        let mut cells = row.into_iter();
        let record = header
            .fields()
            .iter()
            .map(|f| (f.clone(), cells.next().unwrap_or_default()))
            .collect::<Record>();
        records.push(record);
    }

    Ok((Some(header), records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_string(row: &[&str], sep: char) -> String {
        let mut buf = Vec::new();
        write_row(&mut buf, row, sep).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_row_plain() {
        assert_eq!(row_string(&["a", "b", "c"], ','), "a,b,c\n");
    }

    #[test]
    fn test_write_row_quotes_when_needed() {
        assert_eq!(
            row_string(&["x,y", "say \"hi\"", "line\nbreak", "ok"], ','),
            "\"x,y\",\"say \"\"hi\"\"\",\"line\nbreak\",ok\n"
        );
    }

    #[test]
    fn test_write_row_tab_delimiter_leaves_commas() {
        assert_eq!(row_string(&["x,y", "z"], '\t'), "x,y\tz\n");
    }

    #[test]
    fn test_parse_rows_handles_quotes_and_crlf() {
        let text = "a,b\r\n\"x,y\",\"he said \"\"no\"\"\"\r\n";
        let rows = parse_rows(text, ',');
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["x,y".to_string(), "he said \"no\"".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_rows_skips_blank_lines() {
        let rows = parse_rows("a\n\n\nb\n", ',');
        assert_eq!(rows, vec![vec!["a".to_string()], vec!["b".to_string()]]);
    }

    #[test]
    fn test_lone_empty_cell_survives() {
        assert_eq!(row_string(&[""], ','), "\"\"\n");
        assert_eq!(parse_rows("a\n\"\"\n", ','), vec![vec!["a".to_string()], vec![String::new()]]);
    }

    #[test]
    fn test_parse_rows_embedded_newline() {
        let rows = parse_rows("\"one\ntwo\",3\n", ',');
        assert_eq!(rows, vec![vec!["one\ntwo".to_string(), "3".to_string()]]);
    }

    #[test]
    fn test_read_records_keys_by_header() {
        let (header, records) = read_records("item,qty\napple,3\npear\n", ',').unwrap();

        assert_eq!(header.unwrap().fields(), &["item", "qty"]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("qty"), Some("3"));
        assert_eq!(records[1].get("item"), Some("pear"));
        assert_eq!(records[1].get("qty"), Some(""));
    }

    #[test]
    fn test_read_records_drops_surplus_cells() {
        let (_, records) = read_records("a\n1,2,3\n", ',').unwrap();
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[0].get("a"), Some("1"));
    }

    #[test]
    fn test_read_records_empty_text() {
        let (header, records) = read_records("", ',').unwrap();
        assert!(header.is_none());
        assert!(records.is_empty());
    }
}
