//! Embedding of fonts into vector documents.
//!
//! Fonts are retrieved once per family into a [`FontCache`], encoded into a
//! self-contained form, and injected into SVG documents as `@font-face`
//! rules so that the documents render without further retrieval.

pub mod error;
pub use error::{ErrKind, Error};

pub mod bridge;
pub use bridge::{load_web_font, FontObserver, FontdbObserver, ObserveOpts};

pub mod cache;
pub use cache::{FontCache, FontLoadOutcome};

pub mod config;
pub use config::EmbedOpts;

pub mod dom;
pub use dom::{DomDocument, DomElement, MemDocument, MemElement, SVG_NS};

pub mod encode;
pub use encode::{DataUrlEncoder, FontEncoder, FontFormat};

pub mod fetch;
pub use fetch::{FetchOpts, FsFetcher, MemoryFetcher, ResourceFetcher};

pub mod preset;

pub mod style;
pub use style::{add_font_rules, font_face_rule, font_rules};
