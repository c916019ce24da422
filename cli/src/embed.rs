use std::io::{Read, Write};
use std::path::Path;

use reflexo_font_embed::error::prelude::*;
use reflexo_font_embed::{
    add_font_rules, DataUrlEncoder, EmbedOpts, FontCache, FsFetcher, MemDocument,
};

use crate::EmbedArgs;

/// Merges the config file named in `args` with the command line flags.
/// Flags win over the config file.
pub fn resolve_opts(args: &EmbedArgs) -> ZResult<EmbedOpts> {
    let mut opts = match &args.config {
        Some(path) => {
            let mut opts = EmbedOpts::load_from_path(path)?;
            // relative roots are relative to the config file
            if opts.root_dir.is_relative() {
                if let Some(dir) = path.parent() {
                    opts.root_dir = dir.join(&opts.root_dir);
                }
            }
            opts
        }
        None => EmbedOpts::default(),
    };

    if let Some(root) = &args.root {
        opts.root_dir = root.clone();
    }
    if args.preset.is_some() {
        opts.preset = args.preset.clone();
    }
    for font in &args.fonts {
        opts.fonts.insert(font.family.clone(), font.src.clone());
    }
    opts.strict_encoding |= args.strict;

    Ok(opts)
}

/// Loads the fonts of `opts` and injects `families` into the SVG document
/// `svg`. All loaded families are injected when `families` is empty.
///
/// Fonts which fail to load are skipped. Errors come from parsing `svg` and
/// from `opts` itself.
pub async fn embed_svg(opts: &EmbedOpts, families: &[String], svg: &str) -> ZResult<String> {
    let fonts = opts.font_set()?;
    let doc = MemDocument::parse(svg).map_err(wrap_err("embed.parse_input"))?;
    let root = doc
        .root_element()
        .ok_or_else(|| error_once!("embed.parse_input.no_root"))?;

    let cache = FontCache::with_encoder(
        FsFetcher::new(&opts.root_dir),
        DataUrlEncoder {
            strict: opts.strict_encoding,
        },
    );
    cache.load_font_set(&fonts).await;

    let families = if families.is_empty() {
        fonts.keys().cloned().collect()
    } else {
        families.to_vec()
    };
    log::info!(
        "embedding {} of {} requested families",
        families.iter().filter(|f| cache.contains(f)).count(),
        families.len()
    );
    add_font_rules(&cache, &root, &families)?;

    Ok(doc.to_xml())
}

/// Runs the `embed` command.
pub async fn embed(args: EmbedArgs) -> ZResult<()> {
    let opts = resolve_opts(&args)?;
    let input = read_input(args.input.as_deref())?;
    let output = embed_svg(&opts, &args.families, &input).await?;
    write_output(args.output.as_deref(), &output)
}

fn read_input(path: Option<&Path>) -> ZResult<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(error_once_map!("embed.read_input", path: path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .map_err(error_once_map!("embed.read_input.stdin"))?;
            Ok(input)
        }
    }
}

fn write_output(path: Option<&Path>, output: &str) -> ZResult<()> {
    match path {
        Some(path) => std::fs::write(path, output)
            .map_err(error_once_map!("embed.write_output", path: path.display())),
        None => std::io::stdout()
            .lock()
            .write_all(output.as_bytes())
            .context("embed.write_output.stdout"),
    }
}
