use quick_xml::escape::escape;

/// One piece of an element's content, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Element(Node),
    /// Character data with XML escapes already resolved.
    Text(String),
    /// Raw `<![CDATA[...]]>` section body.
    CData(String),
}

impl Content {
    /// Whitespace-only text counts as blank. Elements and CDATA never do.
    pub fn is_blank(&self) -> bool {
        match self {
            Content::Text(text) => text.trim().is_empty(),
            Content::Element(_) | Content::CData(_) => false,
        }
    }

    pub fn as_element(&self) -> Option<&Node> {
        match self {
            Content::Element(node) => Some(node),
            _ => None,
        }
    }

    fn write_xml(&self, out: &mut String) {
        match self {
            Content::Element(node) => node.write_xml(out),
            Content::Text(text) => out.push_str(&escape(text.as_str())),
            Content::CData(data) => {
                out.push_str("<![CDATA[");
                out.push_str(data);
                out.push_str("]]>");
            }
        }
    }
}

/// Read-only view of a parsed XML element.
///
/// Names are stored split: `name` is the local part and `prefix` the optional
/// namespace prefix it was written with. `namespace` is the resolved URI.
/// Attribute keys are kept exactly as written, prefix included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    name: String,
    prefix: Option<String>,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Content>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Splits a qualified name such as `atom:link` into prefix and local name.
    pub fn qualified(qname: &str) -> Self {
        match qname.split_once(':') {
            Some((prefix, local)) => Self {
                name: local.to_string(),
                prefix: Some(prefix.to_string()),
                ..Self::default()
            },
            None => Self::new(qname),
        }
    }

    pub fn with_namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Content::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Content::Text(text.into()));
        self
    }

    pub fn with_cdata(mut self, data: impl Into<String>) -> Self {
        self.children.push(Content::CData(data.into()));
        self
    }

    pub(crate) fn set_namespace(&mut self, uri: Option<String>) {
        self.namespace = uri;
    }

    pub(crate) fn push_attribute(&mut self, key: String, value: String) {
        self.attributes.push((key, value));
    }

    /// Appends content, merging adjacent text runs the reader may split.
    pub(crate) fn push_content(&mut self, content: Content) {
        if let (Content::Text(more), Some(Content::Text(last))) =
            (&content, self.children.last_mut())
        {
            last.push_str(more);
            return;
        }
        self.children.push(content);
    }

    /// Local name, without any prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// True when `other` lives in the same namespace as this element.
    pub fn same_namespace(&self, other: &Node) -> bool {
        self.namespace == other.namespace
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Looks up an attribute by its key as written (e.g. `href`, `xml:base`).
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[Content] {
        &self.children
    }

    /// Element children in document order. Reversible.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.children.iter().filter_map(Content::as_element)
    }

    /// First element child called `name` in this element's own namespace.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.elements()
            .find(|child| child.name == name && self.same_namespace(child))
    }

    /// Concatenated character data of this element and all descendants.
    #[cfg(test)]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    #[cfg(test)]
    fn collect_text(&self, out: &mut String) {
        for content in &self.children {
            match content {
                Content::Element(node) => node.collect_text(out),
                Content::Text(text) | Content::CData(text) => out.push_str(text),
            }
        }
    }

    /// Serializes everything between this element's start and end tags.
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for content in &self.children {
            content.write_xml(&mut out);
        }
        out
    }

    fn write_xml(&self, out: &mut String) {
        let qname = self.qualified_name();
        out.push('<');
        out.push_str(&qname);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for content in &self.children {
            content.write_xml(out);
        }
        out.push_str("</");
        out.push_str(&qname);
        out.push('>');
    }
}
