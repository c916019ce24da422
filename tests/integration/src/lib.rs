use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reflexo_font_embed::error::prelude::ZResult;
use reflexo_font_embed::fetch::Bytes;
use reflexo_font_embed::{FetchOpts, ResourceFetcher};

pub const SERIF_WOFF: &[u8] = b"wOFF\0\x01\0\0serif";
pub const SANS_WOFF: &[u8] = b"wOFF\0\x01\0\0sans";
pub const PIXEL_TTF: &[u8] = b"\0\x01\0\0pixel";

/// A real font shipped with the tests, family `DejaVu Sans Mono`.
pub fn dejavu_sans_mono() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../fonts/DejaVuSansMono.ttf")
}

/// Creates an empty directory `name` under `base` and lays out fonts at
/// the locations used by the `scratch3` preset. Only three of the seven
/// preset fonts are present.
pub fn font_root(base: &Path, name: &str) -> PathBuf {
    let root = base.join(name);
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(root.join("fonts")).unwrap();

    for (file, data) in [
        ("SourceSerifPro-Regular.woff", SERIF_WOFF),
        ("NotoSans-Regular.woff", SANS_WOFF),
        ("Grand9K-Pixel.ttf", PIXEL_TTF),
    ] {
        std::fs::write(root.join("fonts").join(file), data).unwrap();
    }
    root
}

/// Wraps a fetcher and counts retrievals.
pub struct CountingFetcher<F> {
    pub inner: F,
    calls: AtomicUsize,
}

impl<F> CountingFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F: ResourceFetcher> ResourceFetcher for CountingFetcher<F> {
    async fn fetch(&self, src: &str, opts: FetchOpts) -> ZResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(opts.local_only);
        // let concurrent requests pile up while this one is in flight
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.inner.fetch(src, opts).await
    }
}
