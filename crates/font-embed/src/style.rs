//! Injection of cached fonts into SVG documents as `@font-face` rules.

use std::fmt::Write;

use crate::dom::{DomDocument, DomElement, SVG_NS};
use crate::error::prelude::*;
use crate::FontCache;

/// Renders a `@font-face` rule binding `family` to the font at `src`.
pub fn font_face_rule(family: &str, src: &str) -> String {
    let mut rule = String::with_capacity(family.len() + src.len() + 48);
    rule.push_str("@font-face { font-family: \"");
    escape_css_string(&mut rule, family);
    rule.push_str("\"; src: url(\"");
    escape_css_string(&mut rule, src);
    rule.push_str("\"); }");
    rule
}

/// Writes `text` escaped for use inside a double-quoted CSS string.
fn escape_css_string(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            // newlines cannot appear in CSS strings unescaped
            '\n' | '\r' | '\x0c' => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c => out.push(c),
        }
    }
}

/// Renders one rule per family with a loaded font, in the order given.
/// Families which are not loaded are skipped.
pub fn font_rules<S: AsRef<str>>(cache: &FontCache, families: &[S]) -> Vec<String> {
    families
        .iter()
        .filter_map(|family| {
            let family = family.as_ref();
            let data = cache.get_font(family)?;
            Some(font_face_rule(family, &data))
        })
        .collect()
}

/// Adds an inline `<style>` element to `svg` containing the fonts in
/// `families` that are loaded in `cache`.
///
/// Only a new `<defs>` element is appended to `svg`; the style element is
/// nested inside it (`svg > defs > style`) rather than attached to `svg`
/// directly. Both are created by the document owning `svg`. Families which are not
/// loaded are skipped, so the style may be empty. Each call adds another
/// `<defs>`; callers should inject at most once per element.
///
/// Returns the created style element. Errors only come from the document.
pub fn add_font_rules<E, S>(cache: &FontCache, svg: &E, families: &[S]) -> ZResult<E>
where
    E: DomElement,
    S: AsRef<str>,
{
    let rules = font_rules(cache, families);
    log::debug!(
        "add_font_rules: {} of {} families loaded",
        rules.len(),
        families.len()
    );

    let doc = svg.owner_document()?;
    let defs = doc.create_element_ns(SVG_NS, "defs")?;
    let style = doc.create_element_ns(SVG_NS, "style")?;
    style.set_text_content(&rules.join("\n"));
    defs.append_child(&style)?;
    svg.append_child(&defs)?;

    Ok(style)
}
