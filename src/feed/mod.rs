//! Feed parsing and reconciliation.
//!
//! Raw Atom/RSS bytes are read into a [`Node`] tree, the first adapter whose
//! `validate` accepts the root drives a walk over it, and the entries found
//! are merged into a caller-owned [`Item`] collection:
//!
//! - [`extract`] - text, markup and date extraction from elements
//! - [`reconcile`] - entry tokens and append-or-promote merging
//! - [`walk`] - the adapter traits, the recursive walk and dispatch
//! - [`atom`] / [`rss`] - the two format adapters
//!
//! # Example
//!
//! ```
//! use feedwalk::feed::FeedParser;
//! use feedwalk::model::Item;
//!
//! let doc = br#"<feed><id>f1</id><title>T</title><updated>2020-01-01T00:00:00Z</updated>
//!   <entry><id>e1</id><title>E</title><updated>2020-01-02T00:00:00Z</updated>
//!   <link href="http://x/e1"/></entry></feed>"#;
//!
//! let mut feed = Item::new();
//! FeedParser::new().parse(doc, &mut feed)?;
//! assert_eq!(feed.token(), Some("f1"));
//! assert_eq!(feed.child_tokens(), vec!["e1"]);
//! # Ok::<(), feedwalk::ParseError>(())
//! ```

pub mod atom;
pub mod extract;
pub mod reconcile;
pub mod rss;
pub mod walk;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Config;
use crate::error::{ParseError, Result};
use crate::model::Item;
use crate::xml::{read_document, Node, DEFAULT_MAX_DEPTH};

pub use atom::AtomAdapter;
pub use extract::{extract_date, extract_markup, extract_string, parse_date, EMPTY_SENTINEL};
pub use reconcile::{find_existing, find_or_assign_token, reconcile, synthesize_token, Reconciled};
pub use rss::RssAdapter;
pub use walk::{dispatch, walk, FeedAdapter, ItemRules, Slot};

/// SEC-004: Default cap on document size (10 MB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// A feed format with a built-in adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    Atom,
    Rss,
}

impl FeedFormat {
    pub fn adapter(self) -> Box<dyn FeedAdapter> {
        match self {
            FeedFormat::Atom => Box::new(AtomAdapter),
            FeedFormat::Rss => Box::new(RssAdapter),
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedFormat::Atom => f.write_str("atom"),
            FeedFormat::Rss => f.write_str("rss"),
        }
    }
}

/// Atom first, then RSS.
pub fn default_adapters() -> Vec<Box<dyn FeedAdapter>> {
    vec![Box::new(AtomAdapter), Box::new(RssAdapter)]
}

/// Parses `bytes` with `adapters` (tried in order) and merges the result into
/// `collection`, using the default size and depth limits.
///
/// On error, entries reconciled before the failure stay in `collection`.
///
/// # Errors
///
/// See [`ParseError`]. A malformed entry is dropped, not reported.
pub fn parse(bytes: &[u8], adapters: &[Box<dyn FeedAdapter>], collection: &mut Item) -> Result<()> {
    let root = read_limited(bytes, DEFAULT_MAX_DOCUMENT_BYTES, DEFAULT_MAX_DEPTH)?;
    dispatch(&root, adapters, collection)
}

fn read_limited(bytes: &[u8], max_bytes: usize, max_depth: usize) -> Result<Node> {
    if max_bytes != 0 && bytes.len() > max_bytes {
        return Err(ParseError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    read_document(bytes, max_depth)
}

/// An adapter list plus reader limits, reusable across documents.
///
/// Holds no per-document state; concurrent parses into different
/// collections can share one parser.
pub struct FeedParser {
    adapters: Vec<Box<dyn FeedAdapter>>,
    max_document_bytes: usize,
    max_depth: usize,
}

impl Default for FeedParser {
    fn default() -> Self {
        Self {
            adapters: default_adapters(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for FeedParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formats: Vec<FeedFormat> = self.adapters.iter().map(|a| a.format()).collect();
        f.debug_struct("FeedParser")
            .field("adapters", &formats)
            .field("max_document_bytes", &self.max_document_bytes)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl FeedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser trying `adapters` in order, with default limits.
    pub fn with_adapters(adapters: Vec<Box<dyn FeedAdapter>>) -> Self {
        Self {
            adapters,
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            adapters: config.formats().into_iter().map(FeedFormat::adapter).collect(),
            max_document_bytes: config.max_document_bytes,
            max_depth: config.max_depth,
        }
    }

    pub fn adapters(&self) -> &[Box<dyn FeedAdapter>] {
        &self.adapters
    }

    /// See [`parse`]; limits come from this parser.
    pub fn parse(&self, bytes: &[u8], collection: &mut Item) -> Result<()> {
        let root = read_limited(bytes, self.max_document_bytes, self.max_depth)?;
        dispatch(&root, &self.adapters, collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_adapter_order() {
        let parser = FeedParser::new();
        let formats: Vec<FeedFormat> = parser.adapters().iter().map(|a| a.format()).collect();
        assert_eq!(formats, vec![FeedFormat::Atom, FeedFormat::Rss]);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(FeedFormat::Atom.to_string(), "atom");
        assert_eq!(FeedFormat::Rss.to_string(), "rss");
    }

    #[test]
    fn test_too_large_rejected_before_reading() {
        let result = read_limited(b"<feed/>", 3, DEFAULT_MAX_DEPTH);
        assert_eq!(result, Err(ParseError::TooLarge { size: 7, limit: 3 }));
    }

    #[test]
    fn test_zero_size_limit_disables_check() {
        assert!(read_limited(b"<feed/>", 0, DEFAULT_MAX_DEPTH).is_ok());
    }

    #[test]
    fn test_debug_lists_formats() {
        let debug = format!("{:?}", FeedParser::new());
        assert!(debug.contains("Atom"), "{}", debug);
        assert!(debug.contains("Rss"), "{}", debug);
    }
}
