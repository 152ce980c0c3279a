use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use super::node::{Content, Node};
use crate::error::{ParseError, Result};

/// SEC-003: Default maximum element nesting depth.
/// Prevents unbounded stack growth from maliciously nested documents.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parses a complete document into its root [`Node`].
///
/// `max_depth` bounds element nesting (0 disables the check). Comments,
/// processing instructions and the doctype are skipped.
///
/// # Errors
///
/// - [`ParseError::ParseFailure`] when quick-xml rejects the bytes, an element
///   is left unclosed, a second root appears, or nesting exceeds `max_depth`
/// - [`ParseError::MissingRoot`] when the bytes hold no element at all
///
/// # Security
///
/// SEC-002: quick-xml (0.37) never parses `<!ENTITY>` declarations, so
/// external entities cannot be expanded. Unknown entity references in text
/// are kept verbatim rather than failing the document.
pub fn read_document(bytes: &[u8], max_depth: usize) -> Result<Node> {
    let mut reader = NsReader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let (namespace, event) = match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, event)) => (namespace_uri(&ns), event),
            Err(e) => return Err(ParseError::ParseFailure(e.to_string())),
        };

        match event {
            Event::Start(e) => {
                check_depth(stack.len(), max_depth)?;
                stack.push(start_node(&reader, &e, namespace));
            }
            Event::Empty(e) => {
                check_depth(stack.len(), max_depth)?;
                let node = start_node(&reader, &e, namespace);
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node)?;
                }
            }
            Event::Text(t) => {
                if let Some(parent) = stack.last_mut() {
                    // Feeds routinely use HTML entities XML does not define;
                    // keep the raw text so markup stripping can decode them.
                    let text = t
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    parent.push_content(Content::Text(text));
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    let data = String::from_utf8_lossy(&c).into_owned();
                    parent.push_content(Content::CData(data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::ParseFailure(format!(
            "unexpected end of document: <{}> is not closed",
            open.qualified_name()
        )));
    }

    root.ok_or(ParseError::MissingRoot)
}

fn check_depth(current: usize, max_depth: usize) -> Result<()> {
    if max_depth != 0 && current >= max_depth {
        return Err(ParseError::ParseFailure(format!(
            "element nesting exceeds maximum depth of {}",
            max_depth
        )));
    }
    Ok(())
}

fn namespace_uri(ns: &ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(uri) => Some(String::from_utf8_lossy(uri.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn start_node(reader: &NsReader<&[u8]>, e: &BytesStart<'_>, namespace: Option<String>) -> Node {
    let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut node = Node::qualified(&qname);
    node.set_namespace(namespace);

    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(element = %qname, error = %e, "Skipping malformed attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map(Cow::into_owned)
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        node.push_attribute(key, value);
    }

    node
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_content(Content::Element(node));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(ParseError::ParseFailure(format!(
            "unexpected second root element <{}>",
            node.qualified_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_nested_elements() {
        let doc = br#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Hi</title><item><title>A</title></item></channel></rss>"#;

        let root = read_document(doc, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(root.name(), "rss");
        assert_eq!(root.attribute("version"), Some("2.0"));

        let channel = root.child("channel").unwrap();
        let names: Vec<&str> = channel.elements().map(Node::name).collect();
        assert_eq!(names, vec!["title", "item"]);
    }

    #[test]
    fn test_resolves_default_namespace() {
        let doc = br#"<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title></feed>"#;
        let root = read_document(doc, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(root.namespace(), Some("http://www.w3.org/2005/Atom"));
        assert_eq!(
            root.child("title").unwrap().namespace(),
            Some("http://www.w3.org/2005/Atom")
        );
    }

    #[test]
    fn test_prefixed_element_keeps_prefix() {
        let doc = br#"<rss xmlns:atom="http://www.w3.org/2005/Atom"><atom:link href="x"/></rss>"#;
        let root = read_document(doc, DEFAULT_MAX_DEPTH).unwrap();
        let link = root.elements().next().unwrap();
        assert_eq!(link.name(), "link");
        assert_eq!(link.prefix(), Some("atom"));
        assert_eq!(link.namespace(), Some("http://www.w3.org/2005/Atom"));
        assert!(root.child("link").is_none());
    }

    #[test]
    fn test_text_and_cdata_preserved() {
        let doc = b"<d>Fish &amp; <![CDATA[<b>chips</b>]]></d>";
        let root = read_document(doc, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(
            root.children(),
            &[
                Content::Text("Fish & ".to_string()),
                Content::CData("<b>chips</b>".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_entity_kept_verbatim() {
        let doc = b"<title>a&nbsp;b</title>";
        let root = read_document(doc, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(root.text_content(), "a&nbsp;b");
    }

    #[test]
    fn test_empty_input_is_missing_root() {
        assert_eq!(read_document(b"", DEFAULT_MAX_DEPTH), Err(ParseError::MissingRoot));
        assert_eq!(
            read_document(b"<?xml version=\"1.0\"?>\n", DEFAULT_MAX_DEPTH),
            Err(ParseError::MissingRoot)
        );
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let result = read_document(b"<feed><title>x</feed>", DEFAULT_MAX_DEPTH);
        assert!(matches!(result, Err(ParseError::ParseFailure(_))));
    }

    #[test]
    fn test_unclosed_root_fails() {
        let result = read_document(b"<feed><title>x</title>", DEFAULT_MAX_DEPTH);
        assert!(matches!(result, Err(ParseError::ParseFailure(_))));
    }

    #[test]
    fn test_second_root_fails() {
        let result = read_document(b"<a/><b/>", DEFAULT_MAX_DEPTH);
        assert!(matches!(result, Err(ParseError::ParseFailure(_))));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let mut doc = String::new();
        for _ in 0..100 {
            doc.push_str("<x>");
        }
        for _ in 0..100 {
            doc.push_str("</x>");
        }

        let err = read_document(doc.as_bytes(), 50).unwrap_err();
        assert!(err.to_string().contains("50"), "unexpected error: {}", err);
    }

    #[test]
    fn test_nesting_at_limit_allowed() {
        let mut doc = String::new();
        for _ in 0..50 {
            doc.push_str("<x>");
        }
        for _ in 0..50 {
            doc.push_str("</x>");
        }
        assert!(read_document(doc.as_bytes(), 50).is_ok());
    }

    #[test]
    fn test_zero_depth_disables_limit() {
        let mut doc = String::new();
        for _ in 0..200 {
            doc.push_str("<x>");
        }
        for _ in 0..200 {
            doc.push_str("</x>");
        }
        assert!(read_document(doc.as_bytes(), 0).is_ok());
    }
}
