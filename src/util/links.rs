//! Downloadable-link extraction from HTML.

use crate::error::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// `<a ... href=...>` with double-quoted, single-quoted or bare values.
///
/// Earlier attributes are skipped whole, quoted values included, and `href`
/// must follow whitespace so names like `data-href` do not match.
const HREF_PATTERN: &str =
    r#"(?is)<a\b(?:[^>"']|"[^"]*"|'[^']*')*?\shref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#;

fn href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HREF_PATTERN).unwrap())
}

/// Undo the entity escapes that commonly appear inside attribute values.
fn unescape_attr(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Absolute URLs of every anchor on the page whose path ends with one of `suffixes`.
///
/// Hrefs are resolved against `base`. Duplicates are dropped, first occurrence wins.
/// Hrefs that cannot be resolved are skipped.
pub fn extract_links<S: AsRef<str>>(html: &str, base: &str, suffixes: &[S]) -> Result<Vec<Url>> {
    let base = Url::parse(base)?;
    tracing::debug!(%base, "processing page");

    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for caps in href_regex().captures_iter(html) {
        let raw = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        let href = unescape_attr(raw.trim());
        if href.is_empty() {
            continue;
        }

        let url = match base.join(&href) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(href = %href, error = %e, "skipping unresolvable href");
                continue;
            }
        };

        if !suffixes.iter().any(|s| url.path().ends_with(s.as_ref())) {
            continue;
        }
        if seen.insert(url.as_str().to_string()) {
            tracing::info!(%url, "found");
            found.push(url);
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReceiptError;

    const PAGE: &str = r#"
        <html><body>
          <a href="/files/report.pdf">Report</a>
          <a class="dl" href='notes.docx'>Notes</a>
          <A HREF=data.csv>Data</A>
          <a href="https://cdn.example.org/x/archive.pdf?token=1&amp;v=2">Mirror</a>
          <a href="/files/report.pdf">Report again</a>
          <a href="/about.html">About</a>
          <a name="anchor">No href</a>
        </body></html>
    "#;

    #[test]
    fn test_extracts_matching_suffixes() {
        let links = extract_links(PAGE, "https://example.com/docs/index.html", &["pdf", "docx"]).unwrap();
        let urls: Vec<&str> = links.iter().map(Url::as_str).collect();

        assert_eq!(
            urls,
            vec![
                "https://example.com/files/report.pdf",
                "https://example.com/docs/notes.docx",
                "https://cdn.example.org/x/archive.pdf?token=1&v=2",
            ]
        );
    }

    #[test]
    fn test_bare_attribute_and_case() {
        let links = extract_links(PAGE, "https://example.com/", &[".csv"]).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.com/data.csv");
    }

    #[test]
    fn test_no_suffixes_no_links() {
        let links = extract_links(PAGE, "https://example.com/", &[] as &[&str]).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_ignores_attributes_ending_in_href() {
        let html = r#"<a data-href="/preview.pdf" href="/real.zip">x</a>"#;
        let links = extract_links(html, "https://e.com/", &["zip", "pdf"]).unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://e.com/real.zip");
    }

    #[test]
    fn test_angle_bracket_in_earlier_attribute() {
        let html = r#"<a title="a > b" href="/real.zip">x</a> <a title='c > d' href=/other.zip>y</a>"#;
        let links = extract_links(html, "https://e.com/", &["zip"]).unwrap();
        let urls: Vec<&str> = links.iter().map(Url::as_str).collect();

        assert_eq!(urls, vec!["https://e.com/real.zip", "https://e.com/other.zip"]);
    }

    #[test]
    fn test_href_inside_quoted_value_is_not_an_attribute() {
        let html = r#"<a title="see href=/fake.pdf" href="/real.pdf">x</a>"#;
        let links = extract_links(html, "https://e.com/", &["pdf"]).unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://e.com/real.pdf");
    }

    #[test]
    fn test_invalid_base() {
        let result = extract_links(PAGE, "not a url", &["pdf"]);
        assert!(matches!(result, Err(ReceiptError::InvalidUrl(_))));
    }
}
