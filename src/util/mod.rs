//! Text utilities shared by the feed adapters and the CLI.
//!
//! - **Markup**: tolerant HTML-to-text for descriptions and titles
//! - **Terminal**: control-character stripping and width-aware truncation
//!
//! # Examples
//!
//! ```
//! use feedwalk::util::{strip_control_chars, strip_markup, truncate_to_width};
//!
//! let text = strip_markup("<p>Breaking &amp; entering</p>");
//! assert_eq!(text, "Breaking & entering");
//!
//! let safe = strip_control_chars("\x1b[31mred\x1b[0m");
//! assert_eq!(safe, "red");
//!
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! ```

mod markup;
mod terminal;

pub use markup::strip_markup;
pub use terminal::{display_width, strip_control_chars, truncate_to_width};
