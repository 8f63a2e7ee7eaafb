use html5ever::{LocalName, Namespace, QualName};
use kuchikiki::traits::*;
use kuchikiki::{Attribute, ExpandedName, NodeData, NodeRef};
use url::Url;

use crate::error::DomError;

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// A parsed page plus the node factory that transforms build cells with.
///
/// Synthesized nodes are free-standing until inserted, so one `Document`
/// can create nodes for any fragment of the tree it owns.
pub struct Document {
    root: NodeRef,
    base_url: Option<Url>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            root: kuchikiki::parse_html().one(html),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: Option<Url>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn create_element(&self, tag: &str) -> NodeRef {
        NodeRef::new_element(html_name(tag), std::iter::empty())
    }

    pub fn create_text(&self, text: &str) -> NodeRef {
        NodeRef::new_text(text)
    }

    /// Parse `markup` as the content of a `<context>` element and return the
    /// resulting top-level nodes, detached and ready to append.
    pub fn parse_fragment(&self, context: &str, markup: &str) -> Vec<NodeRef> {
        let parsed = kuchikiki::parse_fragment(html_name(context), Vec::new()).one(markup);
        // html5ever wraps fragment output in a synthetic <html> element.
        let container = parsed
            .first_child()
            .filter(|node| is_element_named(node, "html"))
            .unwrap_or(parsed);
        let nodes: Vec<NodeRef> = container.children().collect();
        for node in &nodes {
            node.detach();
        }
        nodes
    }

    /// Resolve a URL attribute the way a browser's `href`/`src` property does.
    /// Empty values stay empty; unparsable values are returned unchanged.
    pub fn resolve_url(&self, raw: &str) -> String {
        match &self.base_url {
            Some(base) if !raw.is_empty() => base
                .join(raw)
                .map(String::from)
                .unwrap_or_else(|_| raw.to_string()),
            _ => raw.to_string(),
        }
    }

    /// Whether `node` is still reachable from this document's root.
    pub fn contains(&self, node: &NodeRef) -> bool {
        node.inclusive_ancestors().any(|ancestor| ancestor == self.root)
    }

    pub fn to_html(&self) -> String {
        self.root.to_string()
    }
}

pub fn html_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NS), LocalName::from(tag))
}

pub fn is_element_named(node: &NodeRef, tag: &str) -> bool {
    node.as_element()
        .is_some_and(|element| &*element.name.local == tag)
}

// ── Queries ──

/// All descendants of `scope` matching `selector`, in document order.
/// `scope` itself is never matched.
pub fn query_all(scope: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, DomError> {
    let matches = scope
        .descendants()
        .select(selector)
        .map_err(|()| DomError::Selector(selector.to_string()))?;
    Ok(matches.map(|element| element.as_node().clone()).collect())
}

/// First descendant of `scope` matching `selector`.
pub fn query_first(scope: &NodeRef, selector: &str) -> Result<Option<NodeRef>, DomError> {
    let mut matches = scope
        .descendants()
        .select(selector)
        .map_err(|()| DomError::Selector(selector.to_string()))?;
    Ok(matches.next().map(|element| element.as_node().clone()))
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    let element = node.as_element()?;
    let attributes = element.attributes.borrow();
    attributes.get(name).map(str::to_string)
}

/// Trim the way `String.prototype.trim` does: Unicode white space and the
/// BOM, but not NEL (U+0085).
pub fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}')
}

/// Flattened text content of `node`, trimmed.
pub fn text_of(node: &NodeRef) -> String {
    trim_text(&node.text_contents()).to_string()
}

pub fn inner_html(node: &NodeRef) -> String {
    node.children().map(|child| child.to_string()).collect()
}

// ── Ownership ──

/// Deep copy of `node` sharing nothing with the source tree.
pub fn clone_detached(node: &NodeRef) -> NodeRef {
    let copy = match node.data() {
        NodeData::Element(element) => {
            let attributes = element.attributes.borrow().map.clone();
            let copy = NodeRef::new_element(element.name.clone(), attributes);
            if let (Some(source), Some(target)) = (
                element.template_contents.as_ref(),
                copy.as_element().and_then(|e| e.template_contents.clone()),
            ) {
                for child in source.children() {
                    target.append(clone_detached(&child));
                }
            }
            copy
        }
        NodeData::Text(text) => NodeRef::new_text(text.borrow().clone()),
        NodeData::Comment(text) => NodeRef::new_comment(text.borrow().clone()),
        NodeData::ProcessingInstruction(contents) => {
            let (target, data) = contents.borrow().clone();
            NodeRef::new_processing_instruction(target, data)
        }
        NodeData::Doctype(doctype) => NodeRef::new_doctype(
            doctype.name.clone(),
            doctype.public_id.clone(),
            doctype.system_id.clone(),
        ),
        NodeData::Document(_) => NodeRef::new_document(),
        NodeData::DocumentFragment => NodeRef::new(NodeData::DocumentFragment),
    };
    for child in node.children() {
        copy.append(clone_detached(&child));
    }
    copy
}

/// Fresh element carrying only `attrs` and, when non-empty, one text child.
pub fn synthesize(doc: &Document, tag: &str, attrs: &[(&str, &str)], text: &str) -> NodeRef {
    let attributes = attrs.iter().map(|(name, value)| {
        (
            ExpandedName::new("", *name),
            Attribute {
                prefix: None,
                value: (*value).to_string(),
            },
        )
    });
    let node = NodeRef::new_element(html_name(tag), attributes);
    if !text.is_empty() {
        node.append(doc.create_text(text));
    }
    node
}

/// Hand over `node` itself rather than a copy. It stays in its current tree
/// until inserted elsewhere, at which point it moves.
pub fn move_reference(node: &NodeRef) -> NodeRef {
    node.clone()
}

/// Put `replacement` where `target` is and detach `target`.
pub fn replace_with(target: &NodeRef, replacement: &NodeRef) {
    target.insert_before(replacement.clone());
    target.detach();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(doc: &Document) -> NodeRef {
        query_first(doc.root(), "body").unwrap().unwrap()
    }

    #[test]
    fn query_excludes_scope() {
        let doc = Document::parse(r#"<div class="x"><p class="x">a</p></div>"#);
        let div = query_first(doc.root(), "div").unwrap().unwrap();
        let found = query_all(&div, ".x").unwrap();
        assert_eq!(found.len(), 1);
        assert!(is_element_named(&found[0], "p"));
    }

    #[test]
    fn selector_list_keeps_document_order() {
        let doc = Document::parse(
            r#"<div class="b">1</div><div class="a">2</div><div class="b">3</div>"#,
        );
        let found = query_all(doc.root(), ".a, .b").unwrap();
        let texts: Vec<String> = found.iter().map(text_of).collect();
        assert_eq!(texts, ["1", "2", "3"]);
    }

    #[test]
    fn invalid_selector() {
        let doc = Document::parse("<p>a</p>");
        let err = query_first(doc.root(), "p[").unwrap_err();
        assert!(matches!(err, DomError::Selector(s) if s == "p["));
    }

    #[test]
    fn clone_is_independent() {
        let doc = Document::parse(r#"<span class="fa-stack"><i class="fa">x</i></span>"#);
        let span = query_first(doc.root(), "span").unwrap().unwrap();
        let copy = clone_detached(&span);
        span.detach();
        query_first(&span, "i").unwrap().unwrap().detach();

        assert!(copy.parent().is_none());
        assert_eq!(copy.to_string(), r#"<span class="fa-stack"><i class="fa">x</i></span>"#);
        assert_ne!(copy, span);
    }

    #[test]
    fn synthesize_only_given_attributes() {
        let doc = Document::parse("");
        let link = synthesize(&doc, "a", &[("href", "/x")], "Go");
        assert_eq!(link.to_string(), r#"<a href="/x">Go</a>"#);
        let empty = synthesize(&doc, "h1", &[], "");
        assert_eq!(empty.to_string(), "<h1></h1>");
    }

    #[test]
    fn move_reference_is_same_node() {
        let doc = Document::parse("<form id=f></form>");
        let form = query_first(doc.root(), "form").unwrap().unwrap();
        let moved = move_reference(&form);
        assert_eq!(moved, form);
        assert!(moved.parent().is_some());
    }

    #[test]
    fn replace_in_place() {
        let doc = Document::parse("<p>a</p><div id=t>b</div><p>c</p>");
        let target = query_first(doc.root(), "#t").unwrap().unwrap();
        let table = doc.create_element("table");
        replace_with(&target, &table);

        assert!(target.parent().is_none());
        assert!(!doc.contains(&target));
        let tags: Vec<String> = body(&doc)
            .children()
            .filter_map(|n| n.as_element().map(|e| e.name.local.to_string()))
            .collect();
        assert_eq!(tags, ["p", "table", "p"]);
    }

    #[test]
    fn fragment_parsing_unwraps() {
        let doc = Document::parse("");
        let nodes = doc.parse_fragment("td", "Need help? <b>Call</b>");
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.parent().is_none()));
        assert_eq!(nodes[1].to_string(), "<b>Call</b>");
    }

    #[test]
    fn resolve_against_base() {
        let base = Url::parse("https://example.com/about/").unwrap();
        let doc = Document::parse("").with_base_url(Some(base));
        assert_eq!(doc.resolve_url("img/hero.jpg"), "https://example.com/about/img/hero.jpg");
        assert_eq!(doc.resolve_url("#team"), "https://example.com/about/#team");
        assert_eq!(doc.resolve_url(""), "");

        let plain = Document::parse("");
        assert_eq!(plain.resolve_url("img/hero.jpg"), "img/hero.jpg");
    }

    #[test]
    fn trims_like_javascript() {
        assert_eq!(trim_text("\u{feff}  Hello\u{a0}\n"), "Hello");
        assert_eq!(trim_text("\u{85}Hello\u{85}"), "\u{85}Hello\u{85}");
        assert_eq!(trim_text("\u{2028} Hello\u{3000}"), "Hello");
        let doc = Document::parse("<h4> Web   Security \n</h4>");
        let h4 = query_first(doc.root(), "h4").unwrap().unwrap();
        assert_eq!(text_of(&h4), "Web   Security");
    }
}
