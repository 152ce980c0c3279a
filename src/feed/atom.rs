//! Atom (RFC 4287) rules.

use crate::error::{ParseError, Result};
use crate::model::Item;
use crate::xml::Node;

use super::extract::{extract_date, extract_id, extract_markup, extract_string};
use super::walk::{walk_entry, FeedAdapter, ItemRules, Slot};
use super::FeedFormat;

pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
/// Pre-standard Atom 0.3.
pub const ATOM_03_NAMESPACE: &str = "http://purl.org/atom/ns#";

/// Type and relation of the link currently held in `uri`. Parse-time only.
const META_LINK_TYPE: &str = "feedwalk:link-type";
const META_LINK_REL: &str = "feedwalk:link-rel";

/// Adapter for `<feed>` documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomAdapter;

/// Rules for one `<entry>`.
#[derive(Debug, Default, Clone, Copy)]
struct AtomEntry;

impl FeedAdapter for AtomAdapter {
    fn format(&self) -> FeedFormat {
        FeedFormat::Atom
    }

    fn validate<'n>(&self, root: &'n Node) -> Result<Option<&'n Node>> {
        let is_atom = root.name() == "feed"
            && matches!(
                root.namespace(),
                None | Some(ATOM_NAMESPACE) | Some(ATOM_03_NAMESPACE)
            );
        Ok(is_atom.then_some(root))
    }

    /// Stale when the stored `added` differs from the document's `<updated>`.
    ///
    /// An absent `<updated>` reads as 0, so an empty collection facing a
    /// feed without one is considered current.
    fn needs_update(&self, collection: &Item, root: &Node) -> Option<bool> {
        let updated = root.child("updated").map_or(0, extract_date);
        Some(collection.added != updated)
    }
}

impl ItemRules for AtomAdapter {
    fn visit(&self, slot: &mut Slot<'_>, node: &Node, parent: &Node) -> Result<()> {
        if !parent.same_namespace(node) {
            return Ok(());
        }
        if node.name() == "entry" {
            return walk_entry(&AtomEntry, node, slot);
        }
        if let Some(feed) = slot.item_mut() {
            apply_common(feed, node);
        }
        Ok(())
    }

    fn post(&self, slot: &mut Slot<'_>) -> Result<()> {
        let Some(feed) = slot.item_mut() else {
            return Ok(());
        };
        clear_link_state(feed);

        let missing = if feed.token.is_none() {
            Some("id")
        } else if feed.name.is_none() {
            Some("title")
        } else if feed.added == 0 {
            Some("updated")
        } else {
            None
        };

        match missing {
            Some(element) => Err(ParseError::MissingElement {
                element,
                parent: "feed",
            }),
            None => Ok(()),
        }
    }
}

impl ItemRules for AtomEntry {
    fn pre(&self, slot: &mut Slot<'_>) {
        slot.begin(Item::new());
    }

    fn visit(&self, slot: &mut Slot<'_>, node: &Node, parent: &Node) -> Result<()> {
        if !parent.same_namespace(node) {
            return Ok(());
        }
        let Some(entry) = slot.item_mut() else {
            return Ok(());
        };
        match node.name() {
            // Full content only stands in for a missing summary
            "content" => {
                if entry.text.is_none() {
                    entry.text = Some(extract_markup(node));
                }
            }
            _ => apply_common(entry, node),
        }
        Ok(())
    }

    fn post(&self, slot: &mut Slot<'_>) -> Result<()> {
        let Some(entry) = slot.item_mut() else {
            return Ok(());
        };
        clear_link_state(entry);

        let missing = if entry.token.is_none() {
            Some("id")
        } else if entry.name.is_none() {
            Some("title")
        } else if entry.uri.is_none() {
            Some("link")
        } else if entry.added == 0 {
            Some("updated")
        } else {
            None
        };

        if let Some(element) = missing {
            tracing::debug!(
                element,
                token = entry.token.as_deref().unwrap_or(""),
                "Discarding Atom entry without required element"
            );
            slot.discard();
        }
        Ok(())
    }
}

/// Elements shared by `<feed>` and `<entry>`.
fn apply_common(item: &mut Item, node: &Node) {
    match node.name() {
        "id" => {
            if let Some(id) = extract_id(node) {
                item.token = Some(id);
            }
        }
        "title" => item.name = Some(extract_string(node)),
        "summary" | "subtitle" => item.text = Some(extract_markup(node)),
        "updated" => item.added = extract_date(node),
        "icon" => item.icon = Some(extract_string(node)),
        "link" => apply_link(item, node),
        _ => {}
    }
}

/// Offers a `<link>` as the item's `uri`.
///
/// An HTML link beats a non-HTML one whatever their relations; otherwise the
/// higher relation priority wins and ties keep the current link. The winner's
/// type and relation are remembered in metadata for the next comparison.
fn apply_link(item: &mut Item, node: &Node) {
    let Some(href) = node.attribute("href") else {
        return;
    };
    let new_type = node.attribute("type").unwrap_or("");
    let new_rel = node.attribute("rel").unwrap_or("alternate");

    let replace = match item.meta(META_LINK_REL) {
        None => true,
        Some(old_rel) => {
            let old_type = item.meta(META_LINK_TYPE).unwrap_or("");
            prefers(new_type, new_rel, old_type, old_rel)
        }
    };

    if replace {
        item.uri = Some(href.to_string());
        item.set_meta(META_LINK_TYPE, new_type);
        item.set_meta(META_LINK_REL, new_rel);
    }
}

fn prefers(new_type: &str, new_rel: &str, old_type: &str, old_rel: &str) -> bool {
    let (new_html, old_html) = (is_html(new_type), is_html(old_type));
    if new_html != old_html {
        return new_html;
    }
    rel_priority(new_rel) > rel_priority(old_rel)
}

fn is_html(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case("text/html"))
}

/// Higher is preferred. Unknown relations rank below every known one.
fn rel_priority(rel: &str) -> u8 {
    match rel {
        "enclosure" => 1,
        "via" => 2,
        "related" => 3,
        "alternate" => 4,
        "self" => 5,
        _ => 0,
    }
}

fn clear_link_state(item: &mut Item) {
    item.remove_meta(META_LINK_TYPE);
    item.remove_meta(META_LINK_REL);
}
