//! Entry identity and merging across repeated parses.

use sha2::{Digest, Sha256};

use crate::model::Item;

/// What [`reconcile`] did with a parsed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// No child had the token; the item was appended.
    Appended,
    /// A child at `from` had the token; the parsed item was dropped and that
    /// child moved to the front.
    Promoted { from: usize },
}

/// Computes a stable token from an item's name, URI and text.
///
/// Each field is hashed with a length prefix so that shifting characters
/// between fields changes the result. Missing fields hash as empty. The
/// first eight bytes of the SHA-256 digest are rendered as a decimal `u64`.
pub fn synthesize_token(name: Option<&str>, uri: Option<&str>, text: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    for field in [name, uri, text] {
        let value = field.unwrap_or("");
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    }
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix).to_string()
}

/// Returns the item's token, synthesizing and storing one if it has none.
pub fn find_or_assign_token(item: &mut Item) -> &str {
    let Item {
        token,
        name,
        uri,
        text,
        ..
    } = item;
    token.get_or_insert_with(|| synthesize_token(name.as_deref(), uri.as_deref(), text.as_deref()))
}

/// Position of the child of `collection` whose token is `token`.
///
/// Children without a token get one assigned on the way.
pub fn find_existing(collection: &mut Item, token: &str) -> Option<usize> {
    collection
        .children_mut()
        .iter_mut()
        .position(|child| find_or_assign_token(child) == token)
}

/// Merges a freshly parsed `item` into `collection`.
///
/// New tokens are appended at the end. A known token keeps the existing child,
/// moves it to the front and drops `item`; the existing child's fields are
/// not refreshed.
pub fn reconcile(collection: &mut Item, mut item: Item) -> Reconciled {
    let token = find_or_assign_token(&mut item).to_string();
    match find_existing(collection, &token) {
        Some(index) => {
            collection.move_child_to_front(index);
            Reconciled::Promoted { from: index }
        }
        None => {
            collection.push_child(item);
            Reconciled::Appended
        }
    }
}
