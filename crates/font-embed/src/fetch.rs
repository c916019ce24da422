//! Resource retrieval for font sources.
//!
//! The cache never reads files itself; it asks a [`ResourceFetcher`] for the
//! raw bytes of a source location and always requests local-only retrieval.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ecow::EcoString;
use fxhash::FxHashMap;
use parking_lot::RwLock;

use crate::error::prelude::*;
use crate::{ErrKind, Error};

/// Raw bytes of a retrieved resource.
pub type Bytes = Arc<[u8]>;

/// Options for a single retrieval.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchOpts {
    /// Restrict retrieval to local or bundled resources.
    pub local_only: bool,
}

impl FetchOpts {
    pub fn local() -> Self {
        Self { local_only: true }
    }
}

#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Retrieves the resource at `src`.
    async fn fetch(&self, src: &str, opts: FetchOpts) -> ZResult<Bytes>;
}

/// Splits a URL scheme off `src`, if any.
///
/// Single letters are not treated as schemes so that `C:\fonts` stays a path.
fn url_scheme(src: &str) -> Option<&str> {
    let (scheme, _) = src.split_once(':')?;
    let valid = scheme.len() > 1
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// Reads font sources from a directory on the local file system.
///
/// A source location such as `/fonts/Knewave-Regular.woff` is resolved
/// against the root directory, the way a web server would serve it.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a source location to a path under the root directory.
    pub fn resolve(&self, src: &str, opts: FetchOpts) -> ZResult<PathBuf> {
        let path = match url_scheme(src) {
            Some("file") => src.trim_start_matches("file:").trim_start_matches("//"),
            Some(scheme) => {
                return Err(error_once!("fs.resolve.scheme", src: src, scheme: scheme));
            }
            None => src,
        };

        let relative = Path::new(path.trim_start_matches(['/', '\\']));
        if opts.local_only
            && relative
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(error_once!("fs.resolve.outside_root", src: src));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResourceFetcher for FsFetcher {
    async fn fetch(&self, src: &str, opts: FetchOpts) -> ZResult<Bytes> {
        let path = self.resolve(src, opts)?;
        log::debug!("FsFetcher: reading {}", path.display());

        let data = tokio::fs::read(&path)
            .await
            .map_err(error_once_map!("fs.read", path: path.display()))?;
        Ok(data.into())
    }
}

/// Serves font sources from memory, e.g. fonts bundled with `include_bytes!`.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: RwLock<FxHashMap<EcoString, Bytes>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `data` under the source location `src`.
    pub fn insert(&self, src: impl Into<EcoString>, data: impl Into<Bytes>) {
        self.entries.write().insert(src.into(), data.into());
    }

    pub fn with(self, src: impl Into<EcoString>, data: impl Into<Bytes>) -> Self {
        self.insert(src, data);
        self
    }

    pub fn contains(&self, src: &str) -> bool {
        self.entries.read().contains_key(src)
    }
}

#[async_trait]
impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, src: &str, _opts: FetchOpts) -> ZResult<Bytes> {
        self.entries.read().get(src).cloned().ok_or_else(|| {
            Error::new(
                "memory.fetch",
                ErrKind::Msg("resource not found".to_owned()),
                Box::new([("src", src.to_owned())]),
            )
        })
    }
}
