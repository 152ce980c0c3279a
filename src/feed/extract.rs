//! Content extraction from feed elements.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::util::strip_markup;
use crate::xml::{Content, Node};

/// Returned for an element that is present but empty.
///
/// Distinguishes "required but empty" from "absent": an item whose name is
/// the sentinel still counts as named.
pub const EMPTY_SENTINEL: &str = " ";

/// Relaxed date-time layouts tried after RFC 3339 and RFC 2822, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Returns an element's content with any markup preserved.
///
/// - First non-blank child is an element: the element's serialized inner
///   content, all children included
/// - First non-blank child is text or CDATA: the concatenated character data
///   of the element's text and CDATA children
/// - Nothing but whitespace: [`EMPTY_SENTINEL`]
pub fn extract_markup(node: &Node) -> String {
    let children = node.children();
    let Some(first) = children.iter().find(|c| !c.is_blank()) else {
        return EMPTY_SENTINEL.to_string();
    };

    match first {
        Content::Element(_) => node.inner_xml().trim().to_string(),
        Content::Text(_) | Content::CData(_) => {
            let mut out = String::new();
            for content in children {
                if let Content::Text(text) | Content::CData(text) = content {
                    out.push_str(text);
                }
            }
            out.trim().to_string()
        }
    }
}

/// [`extract_markup`] with markup stripped.
pub fn extract_string(node: &Node) -> String {
    let markup = extract_markup(node);
    if let Cow::Owned(stripped) = strip_markup(&markup) {
        return stripped;
    }
    markup
}

/// Identifier text (`<id>`, `<guid>`), trimmed. Blank identifiers count as absent.
pub fn extract_id(node: &Node) -> Option<String> {
    let id = extract_string(node);
    let trimmed = id.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parses the element's text as a date. Returns epoch seconds, or 0 when the
/// text is empty or unparseable.
///
/// A genuine epoch-0 date is indistinguishable from "no date".
pub fn extract_date(node: &Node) -> i64 {
    parse_date(&extract_string(node)).unwrap_or(0)
}

/// Parses an RFC 3339 or RFC 2822 date, falling back to a few relaxed forms
/// seen in the wild (no zone, date only). Zone-less values are taken as UTC.
///
/// ```
/// use feedwalk::feed::parse_date;
///
/// assert_eq!(parse_date("2020-01-01T00:00:00Z"), Some(1_577_836_800));
/// assert_eq!(parse_date("Wed, 01 Jan 2020 00:00:00 GMT"), Some(1_577_836_800));
/// assert_eq!(parse_date("yesterday"), None);
/// ```
pub fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().timestamp());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_from_text() {
        let node = Node::new("title").with_text("  Hello world \n");
        assert_eq!(extract_markup(&node), "Hello world");
    }

    #[test]
    fn test_markup_from_cdata_with_surrounding_whitespace() {
        let node = Node::new("description")
            .with_text("\n    ")
            .with_cdata("<p>Body</p>")
            .with_text("\n  ");
        assert_eq!(extract_markup(&node), "<p>Body</p>");
    }

    #[test]
    fn test_markup_from_nested_elements() {
        let node = Node::new("summary")
            .with_text("\n ")
            .with_child(Node::new("p").with_text("one"))
            .with_child(Node::new("p").with_text("two"));
        assert_eq!(extract_markup(&node), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_markup_text_first_skips_elements() {
        let node = Node::new("title")
            .with_text("Hello ")
            .with_child(Node::new("b").with_text("bold"))
            .with_text(" tail");
        assert_eq!(extract_markup(&node), "Hello  tail");
    }

    #[test]
    fn test_empty_element_gives_sentinel() {
        assert_eq!(extract_markup(&Node::new("title")), EMPTY_SENTINEL);
        assert_eq!(
            extract_markup(&Node::new("title").with_text("   \n")),
            EMPTY_SENTINEL
        );
        assert_eq!(extract_string(&Node::new("title")), EMPTY_SENTINEL);
    }

    #[test]
    fn test_string_strips_markup() {
        let node = Node::new("title").with_cdata("<b>Rust</b> &amp; friends");
        assert_eq!(extract_string(&node), "Rust & friends");
    }

    #[test]
    fn test_id_blank_is_absent() {
        assert_eq!(extract_id(&Node::new("guid")), None);
        assert_eq!(
            extract_id(&Node::new("guid").with_text(" tag:x,2020:1 ")),
            Some("tag:x,2020:1".to_string())
        );
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(parse_date("2020-01-02T00:00:00Z"), Some(1_577_923_200));
        assert_eq!(parse_date("2020-01-02T02:00:00+02:00"), Some(1_577_923_200));
        assert_eq!(
            parse_date("Thu, 02 Jan 2020 00:00:00 +0000"),
            Some(1_577_923_200)
        );
        assert_eq!(parse_date("2020-01-02T00:00:00"), Some(1_577_923_200));
        assert_eq!(parse_date("2020-01-02 00:00:00"), Some(1_577_923_200));
        assert_eq!(parse_date("2020-01-02"), Some(1_577_923_200));
    }

    #[test]
    fn test_date_failures_are_zero() {
        assert_eq!(extract_date(&Node::new("updated")), 0);
        assert_eq!(extract_date(&Node::new("updated").with_text("soon")), 0);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_epoch_zero_date_reads_as_zero() {
        let node = Node::new("updated").with_text("1970-01-01T00:00:00Z");
        assert_eq!(extract_date(&node), 0);
    }
}
