//! Parsed XML tree consumed by the feed adapters.
//!
//! - [`Node`] - an element with its attributes and ordered content
//! - [`read_document`] - bytes to root [`Node`] via quick-xml's namespace-aware reader

mod node;
mod reader;

pub use node::{Content, Node};
pub use reader::{read_document, DEFAULT_MAX_DEPTH};
