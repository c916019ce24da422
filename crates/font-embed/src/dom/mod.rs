//! The document model fonts are injected into.
//!
//! Style injection only needs a handful of operations from a host document:
//! creating namespaced elements, attaching children and setting text. They
//! are expressed by [`DomDocument`] and [`DomElement`] so that the same code
//! drives the in-memory tree in [`memory`] and, with the `web` feature, a
//! browser DOM.

pub mod memory;
#[cfg(feature = "web")]
pub mod web;

pub use memory::{MemDocument, MemElement};

use crate::error::prelude::ZResult;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub trait DomDocument {
    type Element: DomElement<Document = Self>;

    /// Creates a detached element named `name` in `namespace`.
    fn create_element_ns(&self, namespace: &str, name: &str) -> ZResult<Self::Element>;
}

pub trait DomElement: Sized {
    type Document: DomDocument<Element = Self>;

    /// The document this element belongs to.
    fn owner_document(&self) -> ZResult<Self::Document>;

    /// Appends `child` as the last child of this element.
    fn append_child(&self, child: &Self) -> ZResult<()>;

    /// Replaces all children of this element with a single text node.
    fn set_text_content(&self, text: &str);
}
