//! RSS 2.0 / 0.92 rules.

use crate::error::{ParseError, Result};
use crate::model::Item;
use crate::util::strip_markup;
use crate::xml::Node;

use super::extract::{extract_date, extract_id, extract_markup, extract_string};
use super::walk::{walk_entry, FeedAdapter, ItemRules, Slot};
use super::FeedFormat;

/// `version` values on `<rss>` that this adapter reads.
pub const SUPPORTED_VERSIONS: &[&str] = &["2.0", "0.92"];

/// Adapter for `<rss>` documents. The walk starts at `<channel>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RssAdapter;

/// Rules for one `<item>`.
#[derive(Debug, Default, Clone, Copy)]
struct RssItem;

impl FeedAdapter for RssAdapter {
    fn format(&self) -> FeedFormat {
        FeedFormat::Rss
    }

    fn validate<'n>(&self, root: &'n Node) -> Result<Option<&'n Node>> {
        if root.name() != "rss" || root.namespace().is_some() {
            return Ok(None);
        }

        let version = root.attribute("version").unwrap_or("");
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ParseError::InvalidVersion(version.to_string()));
        }

        root.child("channel")
            .map(Some)
            .ok_or(ParseError::MissingElement {
                element: "channel",
                parent: "rss",
            })
    }

    /// Stale when the stored `added` differs from `<lastBuildDate>`, and
    /// always when nothing has been stored yet.
    fn needs_update(&self, collection: &Item, channel: &Node) -> Option<bool> {
        if collection.added == 0 {
            return Some(true);
        }
        let built = channel.child("lastBuildDate").map_or(0, extract_date);
        Some(collection.added != built)
    }
}

impl ItemRules for RssAdapter {
    fn visit(&self, slot: &mut Slot<'_>, node: &Node, parent: &Node) -> Result<()> {
        if !parent.same_namespace(node) {
            return Ok(());
        }
        if node.name() == "item" {
            return walk_entry(&RssItem, node, slot);
        }
        let Some(channel) = slot.item_mut() else {
            return Ok(());
        };
        match node.name() {
            "title" => channel.name = Some(extract_string(node)),
            "description" => channel.text = Some(extract_markup(node)),
            "lastBuildDate" => channel.added = extract_date(node),
            "link" => channel.uri = Some(extract_string(node)),
            _ => {}
        }
        Ok(())
    }

    fn post(&self, slot: &mut Slot<'_>) -> Result<()> {
        let Some(channel) = slot.item() else {
            return Ok(());
        };

        let missing = if channel.name.is_none() {
            Some("title")
        } else if channel.text.is_none() {
            Some("description")
        } else if channel.uri.is_none() {
            Some("link")
        } else {
            None
        };

        match missing {
            Some(element) => Err(ParseError::MissingElement {
                element,
                parent: "channel",
            }),
            None => Ok(()),
        }
    }
}

impl ItemRules for RssItem {
    fn pre(&self, slot: &mut Slot<'_>) {
        slot.begin(Item::new());
    }

    fn visit(&self, slot: &mut Slot<'_>, node: &Node, parent: &Node) -> Result<()> {
        if !parent.same_namespace(node) {
            return Ok(());
        }
        let Some(item) = slot.item_mut() else {
            return Ok(());
        };
        match node.name() {
            "guid" => {
                if let Some(guid) = extract_id(node) {
                    item.token = Some(guid);
                }
            }
            "title" => item.name = Some(extract_string(node)),
            "description" => item.text = Some(extract_markup(node)),
            "pubDate" => item.added = extract_date(node),
            "link" => item.uri = Some(extract_string(node)),
            _ => {}
        }
        Ok(())
    }

    /// Items need something to show: the title, else the description as
    /// plain text, else the link. Items with none of them are dropped.
    ///
    /// A present description always names the item, even when stripping its
    /// markup leaves nothing.
    fn post(&self, slot: &mut Slot<'_>) -> Result<()> {
        let Some(item) = slot.item_mut() else {
            return Ok(());
        };

        if item.name.is_none() {
            item.name = item
                .text
                .as_deref()
                .map(|text| strip_markup(text).into_owned());
        }
        if item.name.is_none() {
            item.name = item.uri.clone();
        }

        if item.name.is_none() {
            tracing::debug!(
                guid = item.token.as_deref().unwrap_or(""),
                "Discarding RSS item without title, description or link"
            );
            slot.discard();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::walk::walk;
    use pretty_assertions::assert_eq;

    fn text(name: &str, value: &str) -> Node {
        Node::new(name).with_text(value)
    }

    fn item(children: Vec<Node>) -> Node {
        children
            .into_iter()
            .fold(Node::new("item"), |node, child| node.with_child(child))
    }

    fn parse_item(node: &Node) -> Option<Item> {
        let mut slot = Slot::empty();
        walk(&RssItem, node, &mut slot).unwrap();
        slot.into_item()
    }

    fn rss(version: Option<&str>, channel: Option<Node>) -> Node {
        let mut root = Node::new("rss");
        if let Some(version) = version {
            root = root.with_attribute("version", version);
        }
        if let Some(channel) = channel {
            root = root.with_child(channel);
        }
        root
    }

    #[test]
    fn test_item_fields() {
        let node = item(vec![
            text("guid", "g1"),
            text("title", "Title"),
            Node::new("description").with_cdata("<p>Body</p>"),
            text("pubDate", "Thu, 02 Jan 2020 00:00:00 GMT"),
            text("link", "http://x/1"),
        ]);
        let parsed = parse_item(&node).unwrap();
        assert_eq!(parsed.token(), Some("g1"));
        assert_eq!(parsed.name(), Some("Title"));
        assert_eq!(parsed.text(), Some("<p>Body</p>"));
        assert_eq!(parsed.uri(), Some("http://x/1"));
        assert_eq!(parsed.added, 1_577_923_200);
    }

    #[test]
    fn test_name_falls_back_to_stripped_description() {
        let node = item(vec![Node::new("description").with_cdata("<b>Just</b> text")]);
        assert_eq!(parse_item(&node).unwrap().name(), Some("Just text"));
    }

    #[test]
    fn test_name_falls_back_to_link() {
        let node = item(vec![text("link", "http://x/only")]);
        assert_eq!(parse_item(&node).unwrap().name(), Some("http://x/only"));
    }

    #[test]
    fn test_empty_description_still_names_item() {
        let node = item(vec![Node::new("description")]);
        assert_eq!(parse_item(&node).unwrap().name(), Some(" "));
    }

    #[test]
    fn test_markup_only_description_names_item_empty() {
        let node = item(vec![
            Node::new("description").with_cdata("<img src=\"x.png\"/>"),
            text("link", "http://x/img"),
        ]);
        let parsed = parse_item(&node).unwrap();
        assert_eq!(parsed.name(), Some(""));
        assert_eq!(parsed.uri(), Some("http://x/img"));
    }

    #[test]
    fn test_markup_only_description_without_link_kept() {
        let node = item(vec![
            text("guid", "img"),
            Node::new("description").with_cdata("<img src=\"x.png\"/>"),
        ]);
        let parsed = parse_item(&node).unwrap();
        assert_eq!(parsed.token(), Some("img"));
        assert_eq!(parsed.name(), Some(""));
    }

    #[test]
    fn test_item_without_any_display_field_discarded() {
        let node = item(vec![text("guid", "g1"), text("pubDate", "2020-01-01")]);
        assert!(parse_item(&node).is_none());
    }

    #[test]
    fn test_first_link_in_document_wins() {
        let node = item(vec![text("link", "http://x/a"), text("link", "http://x/b")]);
        assert_eq!(parse_item(&node).unwrap().uri(), Some("http://x/a"));
    }

    #[test]
    fn test_validate_versions() {
        let channel = || Some(Node::new("channel"));
        let adapter = RssAdapter;

        for version in SUPPORTED_VERSIONS {
            let root = rss(Some(*version), channel());
            assert_eq!(adapter.validate(&root).unwrap().map(Node::name), Some("channel"));
        }

        assert_eq!(
            adapter.validate(&rss(Some("1.0"), channel())),
            Err(ParseError::InvalidVersion("1.0".to_string()))
        );
        assert_eq!(
            adapter.validate(&rss(None, channel())),
            Err(ParseError::InvalidVersion(String::new()))
        );
    }

    #[test]
    fn test_validate_missing_channel() {
        assert_eq!(
            RssAdapter.validate(&rss(Some("2.0"), None)),
            Err(ParseError::MissingElement {
                element: "channel",
                parent: "rss"
            })
        );
    }

    #[test]
    fn test_validate_other_roots() {
        assert_eq!(RssAdapter.validate(&Node::new("feed")), Ok(None));
        assert_eq!(RssAdapter.validate(&Node::new("RDF")), Ok(None));
    }

    #[test]
    fn test_needs_update() {
        let adapter = RssAdapter;
        let channel = Node::new("channel").with_child(text("lastBuildDate", "2020-01-01"));

        let mut collection = Item::new();
        assert_eq!(adapter.needs_update(&collection, &channel), Some(true));

        collection.added = 1_577_836_800;
        assert_eq!(adapter.needs_update(&collection, &channel), Some(false));

        collection.added = 1;
        assert_eq!(adapter.needs_update(&collection, &channel), Some(true));
    }

    #[test]
    fn test_needs_update_unknown_prior_always_stale() {
        let channel = Node::new("channel");
        assert_eq!(RssAdapter.needs_update(&Item::new(), &channel), Some(true));
    }

    #[test]
    fn test_channel_missing_elements_are_errors() {
        let cases = [
            (vec![text("description", "d"), text("link", "l")], "title"),
            (vec![text("title", "t"), text("link", "l")], "description"),
            (vec![text("title", "t"), text("description", "d")], "link"),
        ];

        for (children, element) in cases {
            let channel = children
                .into_iter()
                .fold(Node::new("channel"), |n, c| n.with_child(c));
            let mut collection = Item::new();
            let result = walk(&RssAdapter, &channel, &mut Slot::target(&mut collection));
            assert_eq!(
                result,
                Err(ParseError::MissingElement {
                    element,
                    parent: "channel"
                })
            );
        }
    }

    #[test]
    fn test_foreign_link_in_channel_ignored() {
        let channel = Node::new("channel")
            .with_child(text("title", "t"))
            .with_child(text("description", "d"))
            .with_child(text("link", "http://site/"))
            .with_child(
                Node::qualified("atom:link")
                    .with_namespace("http://www.w3.org/2005/Atom")
                    .with_attribute("href", "http://site/feed.xml"),
            );

        let mut collection = Item::new();
        walk(&RssAdapter, &channel, &mut Slot::target(&mut collection)).unwrap();
        assert_eq!(collection.uri(), Some("http://site/"));
    }
}
