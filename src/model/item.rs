use serde::Serialize;
use std::collections::BTreeMap;

/// A feed, folder or entry.
///
/// Any item can act as a collection by holding children; the parse result
/// is a tree of root collection, feed collections and entries. `token` is
/// the identity used to deduplicate entries across repeated parses and is
/// unique among one collection's direct children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Item {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Description. Kept with its markup; use [`strip_markup`](crate::util::strip_markup) for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Epoch seconds. 0 means unknown.
    pub added: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Item>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection named `name`.
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn remove_meta(&mut self, key: &str) -> Option<String> {
        self.metadata.remove(key)
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    pub fn children(&self) -> &[Item] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn find_child(&self, token: &str) -> Option<&Item> {
        self.children.iter().find(|c| c.token() == Some(token))
    }

    /// Detaches and returns the child carrying `token`.
    pub fn remove_child(&mut self, token: &str) -> Option<Item> {
        let index = self.children.iter().position(|c| c.token() == Some(token))?;
        Some(self.children.remove(index))
    }

    /// Tokens of the direct children, in order. Untokened children are skipped.
    pub fn child_tokens(&self) -> Vec<&str> {
        self.children.iter().filter_map(Item::token).collect()
    }

    /// Appends without a uniqueness check; merging goes through
    /// [`reconcile`](crate::feed::reconcile).
    pub(crate) fn push_child(&mut self, item: Item) {
        self.children.push(item);
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Item] {
        &mut self.children
    }

    /// Moves the child at `index` to position 0, keeping the others in order.
    pub(crate) fn move_child_to_front(&mut self, index: usize) {
        if index < self.children.len() {
            self.children[..=index].rotate_right(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection_of(tokens: &[&str]) -> Item {
        let mut feed = Item::collection("feed");
        for token in tokens {
            feed.push_child(Item::new().with_token(*token));
        }
        feed
    }

    #[test]
    fn test_move_child_to_front() {
        let mut feed = collection_of(&["a", "b", "c", "d"]);
        feed.move_child_to_front(2);
        assert_eq!(feed.child_tokens(), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_move_first_child_is_noop() {
        let mut feed = collection_of(&["a", "b"]);
        feed.move_child_to_front(0);
        assert_eq!(feed.child_tokens(), vec!["a", "b"]);
    }

    #[test]
    fn test_move_out_of_range_ignored() {
        let mut feed = collection_of(&["a"]);
        feed.move_child_to_front(5);
        assert_eq!(feed.child_tokens(), vec!["a"]);
    }

    #[test]
    fn test_find_and_remove_child() {
        let mut feed = collection_of(&["a", "b"]);
        assert!(feed.find_child("b").is_some());
        assert!(feed.find_child("z").is_none());

        let removed = feed.remove_child("a").unwrap();
        assert_eq!(removed.token(), Some("a"));
        assert_eq!(feed.len(), 1);
        assert!(feed.remove_child("a").is_none());
    }

    #[test]
    fn test_metadata_roundtrip() {
        let mut item = Item::new();
        item.set_meta("scratch", "1");
        assert_eq!(item.meta("scratch"), Some("1"));
        assert_eq!(item.remove_meta("scratch"), Some("1".to_string()));
        assert!(item.metadata().is_empty());
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let item = Item::new().with_token("e1").with_name("Entry");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "token": "e1", "name": "Entry", "added": 0 })
        );
    }
}
