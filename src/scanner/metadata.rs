//! Metadata parser for the bracketed block of an annotation.
//!
//! `sev:alta; area:auth` becomes `{sev: alta, area: auth}`. Segments are
//! separated by `;` or `,` and split on their first `:`. Segments without both
//! a key and a value are dropped rather than reported.

use crate::model::Metadata;

/// Parse a bracket-interior string into a key/value mapping.
///
/// `None` and blank input yield an empty mapping. Duplicate keys keep the
/// last value.
///
/// # Example
///
/// ```
/// use comment_to_issue::scanner::parse_metadata;
///
/// let meta = parse_metadata(Some("sev:alta; area:auth"));
/// assert_eq!(meta.get("sev").map(String::as_str), Some("alta"));
/// assert_eq!(meta.get("area").map(String::as_str), Some("auth"));
/// ```
pub fn parse_metadata(raw: Option<&str>) -> Metadata {
    let mut metadata = Metadata::new();
    let Some(raw) = raw else {
        return metadata;
    };

    for segment in raw.split([';', ',']).map(str::trim) {
        let Some((key, value)) = segment.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        metadata.insert(key.to_string(), value.to_string());
    }

    metadata
}
