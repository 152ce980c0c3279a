//! Format-independent tree walk and adapter dispatch.
//!
//! An adapter is a [`FeedAdapter`]: `validate` and `needs_update` decide
//! whether and how a document is handled, and its [`ItemRules`] hooks
//! (`pre`, `visit`, `post`) fill in the feed-level item. Entry-level rules
//! are a second [`ItemRules`] driven through [`walk_entry`].

use crate::error::{ParseError, Result};
use crate::model::Item;
use crate::xml::Node;

use super::reconcile::{reconcile, Reconciled};
use super::FeedFormat;

/// The item one level of the walk is filling in.
///
/// At feed level the slot borrows the caller's collection; at entry level
/// it owns a fresh item created by the `pre` hook. A `post` hook that rejects
/// the item empties the slot.
pub struct Slot<'c> {
    item: SlotItem<'c>,
}

enum SlotItem<'c> {
    Empty,
    Owned(Item),
    Borrowed(&'c mut Item),
}

impl<'c> Slot<'c> {
    pub fn empty() -> Self {
        Self {
            item: SlotItem::Empty,
        }
    }

    /// A slot filling in an existing item.
    pub fn target(item: &'c mut Item) -> Self {
        Self {
            item: SlotItem::Borrowed(item),
        }
    }

    /// Replaces the slot's content with a fresh item.
    pub fn begin(&mut self, item: Item) {
        self.item = SlotItem::Owned(item);
    }

    pub fn item(&self) -> Option<&Item> {
        match &self.item {
            SlotItem::Empty => None,
            SlotItem::Owned(item) => Some(item),
            SlotItem::Borrowed(item) => Some(&**item),
        }
    }

    pub fn item_mut(&mut self) -> Option<&mut Item> {
        match &mut self.item {
            SlotItem::Empty => None,
            SlotItem::Owned(item) => Some(item),
            SlotItem::Borrowed(item) => Some(&mut **item),
        }
    }

    /// Drops the slot's item. A borrowed target is left as it is.
    pub fn discard(&mut self) {
        self.item = SlotItem::Empty;
    }

    /// The owned item, if the slot holds one.
    pub fn into_item(self) -> Option<Item> {
        match self.item {
            SlotItem::Owned(item) => Some(item),
            SlotItem::Empty | SlotItem::Borrowed(_) => None,
        }
    }
}

/// Per-level hooks driven by [`walk`].
///
/// Each default is a no-op, which is how a level without that hook behaves.
pub trait ItemRules {
    /// Runs before any child is visited; entry rules start a fresh item here.
    fn pre(&self, _slot: &mut Slot<'_>) {}

    /// Handles one element child of `parent`. Children arrive last first.
    fn visit(&self, _slot: &mut Slot<'_>, _node: &Node, _parent: &Node) -> Result<()> {
        Ok(())
    }

    /// Runs after the children. Feed rules report missing required elements
    /// as errors; entry rules discard the item instead.
    fn post(&self, _slot: &mut Slot<'_>) -> Result<()> {
        Ok(())
    }
}

/// A per-format rule set.
pub trait FeedAdapter: ItemRules + Send + Sync {
    fn format(&self) -> FeedFormat;

    /// Decides whether `root` is this adapter's format.
    ///
    /// Returns the element the walk should start from (`Some`), `None` for
    /// "not this format", or an error when the root is this format but
    /// structurally unusable. An error stops dispatch outright.
    fn validate<'n>(&self, root: &'n Node) -> Result<Option<&'n Node>>;

    /// Whether `collection` is stale relative to `root`. `None` when the
    /// adapter has no opinion, which always walks.
    fn needs_update(&self, _collection: &Item, _root: &Node) -> Option<bool> {
        None
    }
}

/// Drives `rules` over `node`: `pre`, then `visit` for each element child in
/// reverse document order, then `post`.
///
/// The first `visit` error stops the child loop; `post` still runs and the
/// visit error wins over any `post` error.
///
/// Reverse order together with append-or-promote reconciliation fixes the
/// order entries end up in; collections persisted by earlier runs depend on it.
pub fn walk<R: ItemRules + ?Sized>(rules: &R, node: &Node, slot: &mut Slot<'_>) -> Result<()> {
    rules.pre(slot);

    let mut outcome = Ok(());
    for child in node.elements().rev() {
        if let Err(e) = rules.visit(slot, child, node) {
            outcome = Err(e);
            break;
        }
    }

    let post = rules.post(slot);
    outcome.and(post)
}

/// Walks an entry element with `rules` in a fresh slot and reconciles the
/// surviving item into the collection held by `slot`.
pub fn walk_entry<R: ItemRules + ?Sized>(rules: &R, node: &Node, slot: &mut Slot<'_>) -> Result<()> {
    let mut entry = Slot::empty();
    walk(rules, node, &mut entry)?;

    if let (Some(item), Some(collection)) = (entry.into_item(), slot.item_mut()) {
        match reconcile(collection, item) {
            Reconciled::Appended => {
                tracing::trace!(children = collection.len(), "Appended new entry");
            }
            Reconciled::Promoted { from } => {
                tracing::trace!(from, "Known entry moved to front");
            }
        }
    }
    Ok(())
}

/// Hands `root` to the first adapter that accepts it.
///
/// An adapter whose `needs_update` says the collection is current makes
/// this a successful no-op.
///
/// # Errors
///
/// - [`ParseError::UnsupportedFormat`] when no adapter accepts the root
/// - any error from the accepting adapter's `validate` or walk
pub fn dispatch(
    root: &Node,
    adapters: &[Box<dyn FeedAdapter>],
    collection: &mut Item,
) -> Result<()> {
    for adapter in adapters {
        let Some(start) = adapter.validate(root)? else {
            continue;
        };

        let format = adapter.format();
        if adapter.needs_update(collection, start) == Some(false) {
            tracing::debug!(%format, added = collection.added, "Feed unchanged, skipping walk");
            return Ok(());
        }

        tracing::debug!(%format, existing = collection.len(), "Walking feed");
        return walk(adapter.as_ref(), start, &mut Slot::target(collection));
    }

    tracing::debug!(root = %root.qualified_name(), "No adapter accepted document");
    Err(ParseError::UnsupportedFormat)
}
