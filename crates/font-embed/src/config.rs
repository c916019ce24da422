use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::prelude::*;
use crate::preset::preset_font_set;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbedOpts {
    /// The directory font sources are resolved against.
    #[serde(rename = "rootDir", default)]
    pub root_dir: PathBuf,

    /// Fonts to embed, from family name to source location.
    #[serde(default)]
    pub fonts: IndexMap<String, String>,

    /// A bundled font set loaded before `fonts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// Reject font data without a known signature
    #[serde(rename = "strictEncoding", default)]
    pub strict_encoding: bool,
}

impl EmbedOpts {
    /// Reads options from a `.toml` or `.json` file.
    pub fn load_from_path(path: &Path) -> ZResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(error_once_map!("config.read", path: path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&text),
            Some("json") => Self::from_json(&text),
            ext => Err(error_once!(
                "config.unknown_format",
                path: path.display(),
                extension: ext.unwrap_or_default()
            )),
        }
    }

    pub fn from_toml(text: &str) -> ZResult<Self> {
        toml::from_str(text).context("config.toml")
    }

    pub fn from_json(text: &str) -> ZResult<Self> {
        serde_json::from_str(text).context("config.json")
    }

    /// The fonts to load: the preset followed by the explicit fonts. An
    /// explicit font replaces the source of a preset family in place.
    pub fn font_set(&self) -> ZResult<IndexMap<String, String>> {
        let mut fonts = match &self.preset {
            Some(name) => preset_font_set(name)
                .ok_or_else(|| error_once!("config.unknown_preset", preset: name))?,
            None => IndexMap::new(),
        };
        for (family, src) in &self.fonts {
            fonts.insert(family.clone(), src.clone());
        }
        Ok(fonts)
    }
}
