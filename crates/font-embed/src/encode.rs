//! Conversion of font bytes into a self-contained textual form.

use base64::Engine;
use ecow::{eco_format, EcoString};

use crate::error::prelude::*;

pub trait FontEncoder: Send + Sync {
    /// Encodes the retrieved bytes of `src` so that they can be embedded in
    /// a style rule without further retrieval.
    fn encode(&self, data: &[u8], src: &str) -> ZResult<EcoString>;
}

/// The container format of a font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFormat {
    Woff,
    Woff2,
    TrueType,
    OpenType,
    Collection,
}

impl FontFormat {
    /// Detects the format from the leading signature of the file.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        match data.get(..4)? {
            b"wOFF" => Some(Self::Woff),
            b"wOF2" => Some(Self::Woff2),
            b"OTTO" => Some(Self::OpenType),
            b"true" | b"\0\x01\0\0" => Some(Self::TrueType),
            b"ttcf" => Some(Self::Collection),
            _ => None,
        }
    }

    /// Guesses the format from the file extension of a source location.
    pub fn from_extension(src: &str) -> Option<Self> {
        let name = src.rsplit(['/', '\\']).next()?;
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "woff" => Some(Self::Woff),
            "woff2" => Some(Self::Woff2),
            "ttf" => Some(Self::TrueType),
            "otf" => Some(Self::OpenType),
            "ttc" | "otc" => Some(Self::Collection),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Woff => "font/woff",
            Self::Woff2 => "font/woff2",
            Self::TrueType => "font/ttf",
            Self::OpenType => "font/otf",
            Self::Collection => "font/collection",
        }
    }
}

/// Encodes fonts as base64 `data:` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlEncoder {
    /// Refuse data without a known font signature.
    pub strict: bool,
}

impl DataUrlEncoder {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl FontEncoder for DataUrlEncoder {
    fn encode(&self, data: &[u8], src: &str) -> ZResult<EcoString> {
        if data.is_empty() {
            return Err(error_once!("font.encode.empty", src: src));
        }

        let mime = match FontFormat::sniff(data) {
            Some(format) => format.mime_type(),
            None if self.strict => {
                return Err(error_once!("font.encode.signature", src: src, len: data.len()));
            }
            None => FontFormat::from_extension(src)
                .map(FontFormat::mime_type)
                .unwrap_or("application/octet-stream"),
        };

        let e = base64::engine::general_purpose::STANDARD;
        Ok(eco_format!("data:{mime};base64,{}", e.encode(data)))
    }
}
