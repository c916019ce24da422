//! Browser DOM support.

use super::{DomDocument, DomElement};
use crate::error::prelude::*;

impl DomDocument for web_sys::Document {
    type Element = web_sys::Element;

    fn create_element_ns(&self, namespace: &str, name: &str) -> ZResult<web_sys::Element> {
        web_sys::Document::create_element_ns(self, Some(namespace), name)
            .map_err(error_once_map!("web.create_element_ns", name: name))
    }
}

impl DomElement for web_sys::Element {
    type Document = web_sys::Document;

    fn owner_document(&self) -> ZResult<web_sys::Document> {
        web_sys::Node::owner_document(self)
            .ok_or_else(|| error_once!("web.owner_document.none", element: self.tag_name()))
    }

    fn append_child(&self, child: &Self) -> ZResult<()> {
        web_sys::Node::append_child(self, child)
            .map(|_| ())
            .map_err(error_once_map!("web.append_child", element: self.tag_name()))
    }

    fn set_text_content(&self, text: &str) {
        web_sys::Node::set_text_content(self, Some(text));
    }
}
