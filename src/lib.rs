//! Atom and RSS parsing into reconciled item trees.
//!
//! A document is read into an [`xml::Node`] tree, handed to the first
//! [`feed::FeedAdapter`] that recognizes its root, and merged into a
//! caller-owned [`Item`] collection. Entries already present are moved to
//! the front instead of duplicated.

pub mod config;
pub mod error;
pub mod feed;
pub mod model;
pub mod util;
pub mod xml;

pub use config::{Config, ConfigError};
pub use error::{ParseError, Result};
pub use feed::{parse, FeedFormat, FeedParser};
pub use model::Item;
