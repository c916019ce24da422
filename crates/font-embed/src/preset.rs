//! Font sets bundled with known hosts.

use indexmap::IndexMap;

/// The fonts of the Scratch 3 editor, by family name.
pub const SCRATCH3: &[(&str, &str)] = &[
    ("Marker", "/fonts/Knewave-Regular.woff"),
    ("Handwriting", "/fonts/Handlee-Regular.woff"),
    ("Pixel", "/fonts/Grand9K-Pixel.ttf"),
    ("Curly", "/fonts/Griffy-Regular.woff"),
    ("Serif", "/fonts/SourceSerifPro-Regular.woff"),
    ("Sans Serif", "/fonts/NotoSans-Regular.woff"),
    ("Scratch", "/fonts/Scratch.ttf"),
];

pub const PRESETS: &[(&str, &[(&str, &str)])] = &[("scratch3", SCRATCH3)];

/// Looks up a preset by name.
pub fn preset(name: &str) -> Option<&'static [(&'static str, &'static str)]> {
    PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, fonts)| *fonts)
}

/// Collects a preset into a family to source map.
pub fn preset_font_set(name: &str) -> Option<IndexMap<String, String>> {
    let fonts = preset(name)?;
    Some(
        fonts
            .iter()
            .map(|(family, src)| (family.to_string(), src.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch3() {
        let fonts = preset_font_set("scratch3").unwrap();
        assert_eq!(fonts.len(), 7);
        assert_eq!(fonts["Serif"], "/fonts/SourceSerifPro-Regular.woff");
        assert_eq!(fonts.get_index(0).unwrap().0, "Marker");
        assert!(preset("scratch2").is_none());
    }
}
