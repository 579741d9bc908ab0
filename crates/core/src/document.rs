//! Document model the mention filter walks and rewrites.
//!
//! The filter only needs four things from a document: its text nodes in
//! document order, the element ancestry of a node, a node's serialized
//! text, and a way to swap a text node for new markup. [`Document`] captures
//! exactly that; [`HtmlDocument`] implements it over a `scraper` tree.

use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{Html, Node};
use tracing::trace;

use crate::errors::DocumentError;

/// Elements whose content the parser keeps as plain characters. Markup
/// grafted under them would serialize as literal text.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "noscript", "iframe", "noembed", "noframes",
    "plaintext",
];

/// An element seen while walking up from a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementView<'a> {
    /// Lowercase local tag name.
    pub name: &'a str,
    pub classes: Vec<&'a str>,
}

impl ElementView<'_> {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| *c == class)
    }
}

/// Minimal document capability required by the mention filter.
pub trait Document {
    /// Handle to a node. Handles stay valid for nodes that are not replaced.
    type NodeId: Copy + std::fmt::Debug;

    /// Every text node that may hold markup, in document order.
    fn text_nodes(&self) -> Vec<Self::NodeId>;

    /// Element ancestors of `node`, nearest first, up to the document root.
    fn ancestors(&self, node: Self::NodeId) -> Result<Vec<ElementView<'_>>, DocumentError>;

    /// The node's text serialized as HTML (`&`, `<` and `>` escaped).
    fn text_html(&self, node: Self::NodeId) -> Result<String, DocumentError>;

    /// Replace the text node with the nodes parsed from `html`.
    fn replace_with_html(&mut self, node: Self::NodeId, html: &str) -> Result<(), DocumentError>;
}

/// A parsed HTML document or fragment.
pub struct HtmlDocument {
    html: Html,
    fragment: bool,
}

impl HtmlDocument {
    /// Parse a complete HTML document.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            fragment: false,
        }
    }

    /// Parse an HTML fragment, as found in a comment or issue body.
    pub fn parse_fragment(source: &str) -> Self {
        Self {
            html: Html::parse_fragment(source),
            fragment: true,
        }
    }

    /// Serialize back to HTML. Fragments serialize without the wrapping
    /// `<html>` element the parser adds.
    pub fn to_html(&self) -> String {
        if self.fragment {
            self.html.root_element().inner_html()
        } else {
            self.html.html()
        }
    }

    fn node(&self, id: NodeId) -> Result<NodeRef<'_, Node>, DocumentError> {
        self.html
            .tree
            .get(id)
            .ok_or_else(|| DocumentError::NodeMissing(format!("{:?}", id)))
    }
}

impl Document for HtmlDocument {
    type NodeId = NodeId;

    fn text_nodes(&self) -> Vec<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter(|node| node.value().is_text())
            .filter(|node| !in_raw_text_element(node))
            .map(|node| node.id())
            .collect()
    }

    fn ancestors(&self, node: NodeId) -> Result<Vec<ElementView<'_>>, DocumentError> {
        Ok(self
            .node(node)?
            .ancestors()
            .filter_map(|ancestor| ancestor.value().as_element())
            .map(|element| ElementView {
                name: element.name(),
                classes: element.classes().collect(),
            })
            .collect())
    }

    fn text_html(&self, node: NodeId) -> Result<String, DocumentError> {
        let text = self
            .node(node)?
            .value()
            .as_text()
            .ok_or_else(|| DocumentError::NotText(format!("{:?}", node)))?;
        Ok(html_escape::encode_text(&**text).into_owned())
    }

    fn replace_with_html(&mut self, node: NodeId, html: &str) -> Result<(), DocumentError> {
        if self.node(node)?.parent().is_none() {
            return Err(DocumentError::Detached(format!("{:?}", node)));
        }

        let replacement = Html::parse_fragment(html);
        for child in replacement.root_element().children() {
            graft_before(&mut self.html.tree, node, child)?;
        }

        if let Some(mut old) = self.html.tree.get_mut(node) {
            old.detach();
        }
        trace!(node = ?node, "replaced text node");
        Ok(())
    }
}

fn in_raw_text_element(node: &NodeRef<'_, Node>) -> bool {
    node.parent()
        .and_then(|parent| parent.value().as_element().map(|e| e.name()))
        .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name))
}

/// Deep-copy `source` from another tree into `tree`, just before `anchor`.
fn graft_before(
    tree: &mut Tree<Node>,
    anchor: NodeId,
    source: NodeRef<'_, Node>,
) -> Result<(), DocumentError> {
    let mut anchor_node = tree
        .get_mut(anchor)
        .ok_or_else(|| DocumentError::NodeMissing(format!("{:?}", anchor)))?;
    let copied = anchor_node.insert_before(source.value().clone()).id();
    append_copies(tree, copied, source)
}

fn append_copies(
    tree: &mut Tree<Node>,
    parent: NodeId,
    source: NodeRef<'_, Node>,
) -> Result<(), DocumentError> {
    for child in source.children() {
        let mut parent_node = tree
            .get_mut(parent)
            .ok_or_else(|| DocumentError::NodeMissing(format!("{:?}", parent)))?;
        let copied = parent_node.append(child.value().clone()).id();
        append_copies(tree, copied, child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_text_containing(doc: &HtmlDocument, needle: &str) -> NodeId {
        doc.text_nodes()
            .into_iter()
            .find(|&id| doc.text_html(id).unwrap().contains(needle))
            .expect("text node not found")
    }

    #[test]
    fn test_text_nodes_in_document_order() {
        let doc = HtmlDocument::parse_fragment("<p>one <b>two</b> three</p><p>four</p>");
        let texts: Vec<String> = doc
            .text_nodes()
            .into_iter()
            .map(|id| doc.text_html(id).unwrap())
            .collect();
        assert_eq!(texts, vec!["one ", "two", " three", "four"]);
    }

    #[test]
    fn test_text_html_escapes_markup_characters() {
        let doc = HtmlDocument::parse_fragment("<p>a &lt;b&gt; &amp; c</p>");
        let id = first_text_containing(&doc, "a ");
        assert_eq!(doc.text_html(id).unwrap(), "a &lt;b&gt; &amp; c");
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let doc = HtmlDocument::parse_fragment("<div class='x y'><pre><code>hi</code></pre></div>");
        let id = first_text_containing(&doc, "hi");
        let ancestors = doc.ancestors(id).unwrap();
        let names: Vec<&str> = ancestors.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["code", "pre", "div", "html"]);
        assert!(ancestors[2].has_class("y"));
        assert!(!ancestors[2].has_class("z"));
    }

    #[test]
    fn test_replace_with_html() {
        let mut doc = HtmlDocument::parse_fragment("<p>hello world</p>");
        let id = first_text_containing(&doc, "hello");
        doc.replace_with_html(id, "hello <span class='m'>big</span> world")
            .unwrap();
        assert_eq!(
            doc.to_html(),
            r#"<p>hello <span class="m">big</span> world</p>"#
        );
    }

    #[test]
    fn test_replaced_node_leaves_tree() {
        let mut doc = HtmlDocument::parse_fragment("<p>x</p>");
        let id = first_text_containing(&doc, "x");
        doc.replace_with_html(id, "y").unwrap();
        assert_eq!(doc.to_html(), "<p>y</p>");
        assert_eq!(doc.text_nodes().len(), 1);
    }

    #[test]
    fn test_raw_text_elements_have_no_text_nodes() {
        let doc = HtmlDocument::parse(
            "<html><head><title>@a/b</title><style>p{}</style></head>\
             <body><textarea>@a/b</textarea><script>x()</script><p>kept</p></body></html>",
        );
        let texts: Vec<String> = doc
            .text_nodes()
            .into_iter()
            .map(|id| doc.text_html(id).unwrap())
            .collect();
        assert_eq!(texts, vec!["kept"]);
    }

    #[test]
    fn test_full_document_round_trip() {
        let doc = HtmlDocument::parse("<html><head></head><body><p>hi</p></body></html>");
        assert_eq!(
            doc.to_html(),
            "<html><head></head><body><p>hi</p></body></html>"
        );
    }
}
