//! An in-memory XML tree for SVG documents.
//!
//! This is the host document used outside of a browser: an SVG file is parsed
//! into a [`MemDocument`], fonts are injected through the [`DomElement`]
//! operations, and the document is serialized back with
//! [`MemDocument::to_xml`]. Comments, processing instructions and the text
//! inside the root element are kept, so untouched parts of a file round-trip
//! unchanged. Whitespace outside the root element is not preserved.

use std::cell::RefCell;
use std::fmt::{self, Write};
use std::rc::{Rc, Weak};

use ecow::EcoString;
use xmlparser::{ElementEnd, Token, Tokenizer};

use super::{DomDocument, DomElement};
use crate::error::prelude::*;

#[derive(Debug, Default)]
struct DocData {
    /// Declarations, doctype and comments around the root element, in order.
    /// The root element itself is recorded as a [`MemNode::Element`].
    nodes: Vec<MemNode>,
}

/// A document owning a tree of [`MemElement`]s.
#[derive(Clone, Default)]
pub struct MemDocument(Rc<RefCell<DocData>>);

#[derive(Debug)]
struct ElementData {
    namespace: Option<EcoString>,
    name: EcoString,
    attributes: Vec<(EcoString, EcoString)>,
    children: Vec<MemNode>,
    owner: Weak<RefCell<DocData>>,
    parent: Weak<RefCell<ElementData>>,
}

/// An element of a [`MemDocument`]. Clones refer to the same element.
#[derive(Clone)]
pub struct MemElement(Rc<RefCell<ElementData>>);

#[derive(Debug, Clone)]
pub enum MemNode {
    Element(MemElement),
    Text(EcoString),
    Comment(EcoString),
    Cdata(EcoString),
    /// Markup kept verbatim: XML declarations, processing instructions and
    /// doctype declarations.
    Raw(EcoString),
}

impl MemDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an XML document.
    pub fn parse(text: &str) -> ZResult<Self> {
        Parser::new(text).parse()
    }

    /// Creates a document whose root is a new element.
    pub fn with_root(namespace: &str, name: &str) -> Self {
        let doc = Self::new();
        let root = doc.new_element(Some(namespace.into()), name.into(), vec![]);
        doc.0.borrow_mut().nodes.push(MemNode::Element(root));
        doc
    }

    pub fn root_element(&self) -> Option<MemElement> {
        self.0.borrow().nodes.iter().find_map(|node| match node {
            MemNode::Element(el) => Some(el.clone()),
            _ => None,
        })
    }

    /// Serializes the document.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.0.borrow().nodes {
            write_node(&mut out, node, None);
        }
        out
    }

    fn new_element(
        &self,
        namespace: Option<EcoString>,
        name: EcoString,
        attributes: Vec<(EcoString, EcoString)>,
    ) -> MemElement {
        MemElement(Rc::new(RefCell::new(ElementData {
            namespace,
            name,
            attributes,
            children: vec![],
            owner: Rc::downgrade(&self.0),
            parent: Weak::new(),
        })))
    }
}

impl fmt::Debug for MemDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MemDocument").field(&self.to_xml()).finish()
    }
}

impl DomDocument for MemDocument {
    type Element = MemElement;

    fn create_element_ns(&self, namespace: &str, name: &str) -> ZResult<MemElement> {
        if name.is_empty() {
            return Err(error_once!("dom.create_element.empty_name", namespace: namespace));
        }
        Ok(self.new_element(Some(namespace.into()), name.into(), vec![]))
    }
}

impl MemElement {
    /// The qualified name, e.g. `svg` or `xlink:href`.
    pub fn name(&self) -> EcoString {
        self.0.borrow().name.clone()
    }

    pub fn namespace(&self) -> Option<EcoString> {
        self.0.borrow().namespace.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<EcoString> {
        let data = self.0.borrow();
        let (_, value) = data.attributes.iter().find(|(k, _)| k == name)?;
        Some(value.clone())
    }

    pub fn child_elements(&self) -> Vec<MemElement> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|node| match node {
                MemNode::Element(el) => Some(el.clone()),
                _ => None,
            })
            .collect()
    }

    /// All descendant elements named `name`, in document order.
    pub fn descendants_named(&self, name: &str) -> Vec<MemElement> {
        let mut found = vec![];
        for child in self.child_elements() {
            if child.name() == name {
                found.push(child.clone());
            }
            found.extend(child.descendants_named(name));
        }
        found
    }

    pub fn parent(&self) -> Option<MemElement> {
        self.0.borrow().parent.upgrade().map(MemElement)
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for node in &self.0.borrow().children {
            match node {
                MemNode::Text(t) | MemNode::Cdata(t) => text.push_str(t),
                MemNode::Element(el) => text.push_str(&el.text_content()),
                MemNode::Comment(..) | MemNode::Raw(..) => {}
            }
        }
        text
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn is_inclusive_ancestor_of(&self, other: &Self) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(el) = cursor {
            if el.ptr_eq(self) {
                return true;
            }
            cursor = el.parent();
        }
        false
    }

    fn detach(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent
            .0
            .borrow_mut()
            .children
            .retain(|node| !matches!(node, MemNode::Element(el) if el.ptr_eq(self)));
        self.0.borrow_mut().parent = Weak::new();
    }

    fn push_node(&self, node: MemNode) {
        self.0.borrow_mut().children.push(node);
    }
}

impl PartialEq for MemElement {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for MemElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_element(&mut out, self, None);
        f.debug_tuple("MemElement").field(&out).finish()
    }
}

impl DomElement for MemElement {
    type Document = MemDocument;

    fn owner_document(&self) -> ZResult<MemDocument> {
        let owner = self.0.borrow().owner.upgrade();
        owner
            .map(MemDocument)
            .ok_or_else(|| error_once!("dom.owner_document.dropped", element: self.name()))
    }

    fn append_child(&self, child: &Self) -> ZResult<()> {
        if child.is_inclusive_ancestor_of(self) {
            return Err(error_once!("dom.append_child.cycle", parent: self.name(), child: child.name()));
        }

        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.push_node(MemNode::Element(child.clone()));
        Ok(())
    }

    fn set_text_content(&self, text: &str) {
        let mut data = self.0.borrow_mut();
        for node in data.children.drain(..) {
            if let MemNode::Element(el) = node {
                el.0.borrow_mut().parent = Weak::new();
            }
        }
        if !text.is_empty() {
            data.children.push(MemNode::Text(text.into()));
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    doc: MemDocument,
    /// Open elements, innermost last.
    stack: Vec<MemElement>,
    /// The element whose start tag is being read.
    pending: Option<(EcoString, Vec<(EcoString, EcoString)>)>,
    dtd_start: Option<usize>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            doc: MemDocument::new(),
            stack: vec![],
            pending: None,
            dtd_start: None,
        }
    }

    fn parse(mut self) -> ZResult<MemDocument> {
        for token in Tokenizer::from(self.text) {
            let token = token.context("xml.parse")?;
            self.token(token)?;
        }

        if let Some(open) = self.stack.last() {
            return Err(error_once!("xml.parse.unclosed", element: open.name()));
        }
        if self.doc.root_element().is_none() {
            return Err(error_once!("xml.parse.no_root"));
        }
        Ok(self.doc)
    }

    fn token(&mut self, token: Token<'a>) -> ZResult<()> {
        match token {
            Token::Declaration { span, .. }
            | Token::ProcessingInstruction { span, .. }
            | Token::EmptyDtd { span, .. } => self.push(MemNode::Raw(span.as_str().into())),
            Token::DtdStart { span, .. } => self.dtd_start = Some(span.start()),
            Token::EntityDeclaration { .. } => {}
            Token::DtdEnd { span } => {
                let start = self.dtd_start.take().unwrap_or(span.start());
                self.push(MemNode::Raw(self.text[start..span.end()].into()));
            }
            Token::Comment { text, .. } => self.push(MemNode::Comment(text.as_str().into())),
            Token::Cdata { text, .. } => self.push(MemNode::Cdata(text.as_str().into())),
            Token::Text { text } => {
                if !self.stack.is_empty() {
                    self.push(MemNode::Text(unescape(text.as_str())));
                }
            }
            Token::ElementStart { prefix, local, .. } => {
                self.pending = Some((qualified(prefix.as_str(), local.as_str()), vec![]));
            }
            Token::Attribute {
                prefix,
                local,
                value,
                ..
            } => {
                let Some((_, attributes)) = &mut self.pending else {
                    return Err(error_once!("xml.parse.stray_attribute", name: local.as_str()));
                };
                attributes.push((
                    qualified(prefix.as_str(), local.as_str()),
                    unescape(value.as_str()),
                ));
            }
            Token::ElementEnd { end, .. } => match end {
                ElementEnd::Open => {
                    let el = self.open_element()?;
                    self.stack.push(el);
                }
                ElementEnd::Empty => {
                    self.open_element()?;
                }
                ElementEnd::Close(prefix, local) => {
                    let name = qualified(prefix.as_str(), local.as_str());
                    let Some(open) = self.stack.pop() else {
                        return Err(error_once!("xml.parse.unexpected_close", element: name));
                    };
                    if open.name() != name {
                        return Err(error_once!(
                            "xml.parse.mismatched_close",
                            expected: open.name(),
                            found: name
                        ));
                    }
                }
            },
        }
        Ok(())
    }

    /// Finishes the pending start tag and attaches the element.
    fn open_element(&mut self) -> ZResult<MemElement> {
        let Some((name, attributes)) = self.pending.take() else {
            return Err(error_once!("xml.parse.stray_element_end"));
        };

        let namespace = self.resolve_namespace(&name, &attributes);
        let el = self.doc.new_element(namespace, name, attributes);
        match self.stack.last() {
            Some(parent) => parent.append_child(&el)?,
            None => {
                if self.doc.root_element().is_some() {
                    return Err(error_once!("xml.parse.multiple_roots", element: el.name()));
                }
                self.doc.0.borrow_mut().nodes.push(MemNode::Element(el.clone()));
            }
        }
        Ok(el)
    }

    fn resolve_namespace(
        &self,
        name: &str,
        attributes: &[(EcoString, EcoString)],
    ) -> Option<EcoString> {
        let key = match name.split_once(':') {
            Some((prefix, _)) => EcoString::from(format!("xmlns:{prefix}")),
            None => EcoString::from("xmlns"),
        };

        let own = attributes.iter().find(|(k, _)| *k == key);
        if let Some((_, uri)) = own {
            return Some(uri.clone());
        }
        self.stack.iter().rev().find_map(|el| el.attribute(&key))
    }

    fn push(&mut self, node: MemNode) {
        match self.stack.last() {
            Some(parent) => parent.push_node(node),
            None => self.doc.0.borrow_mut().nodes.push(node),
        }
    }
}

fn qualified(prefix: &str, local: &str) -> EcoString {
    if prefix.is_empty() {
        local.into()
    } else {
        EcoString::from(format!("{prefix}:{local}"))
    }
}

/// Resolves the predefined and numeric character references. Unknown
/// references are kept as written.
fn unescape(text: &str) -> EcoString {
    if !text.contains('&') {
        return text.into();
    }

    let mut out = EcoString::new();
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| {
            let c = match &rest[1..semi] {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "apos" => '\'',
                num => {
                    let code = match num.strip_prefix("#x").or_else(|| num.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                        None => num.strip_prefix('#')?.parse().ok()?,
                    };
                    char::from_u32(code)?
                }
            };
            Some((c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

fn write_node(out: &mut String, node: &MemNode, parent_ns: Option<&str>) {
    match node {
        MemNode::Element(el) => write_element(out, el, parent_ns),
        MemNode::Text(text) => escape_into(out, text, false),
        MemNode::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
        MemNode::Cdata(text) => {
            let _ = write!(out, "<![CDATA[{text}]]>");
        }
        MemNode::Raw(text) => out.push_str(text),
    }
}

fn write_element(out: &mut String, el: &MemElement, parent_ns: Option<&str>) {
    let data = el.0.borrow();
    out.push('<');
    out.push_str(&data.name);

    // elements created through the DOM carry a namespace but no xmlns
    // attribute; declare it where it changes
    let declares_ns = data.attributes.iter().any(|(k, _)| k == "xmlns");
    let is_prefixed = data.name.contains(':');
    if let Some(ns) = data.namespace.as_deref() {
        if !declares_ns && !is_prefixed && Some(ns) != parent_ns {
            out.push_str(" xmlns=\"");
            escape_into(out, ns, true);
            out.push('"');
        }
    }

    for (key, value) in &data.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_into(out, value, true);
        out.push('"');
    }

    if data.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    let ns = if is_prefixed {
        parent_ns
    } else {
        data.namespace.as_deref()
    };
    for child in &data.children {
        write_node(out, child, ns);
    }
    out.push_str("</");
    out.push_str(&data.name);
    out.push('>');
}
