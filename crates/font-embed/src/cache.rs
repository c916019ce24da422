//! Font cache and loader.
//!
//! A [`FontCache`] maps font family names to embeddable font data (see
//! [`crate::encode`]). Entries are created the first time a family is loaded
//! and live as long as the cache. Loading is single-flight: while a family is
//! being retrieved, the cache holds a pending marker for it and every other
//! request for that family awaits the same retrieval.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use ecow::EcoString;
use futures_util::future::{join_all, BoxFuture, FutureExt, Shared};
use fxhash::FxHashMap;
use parking_lot::Mutex;

use crate::encode::{DataUrlEncoder, FontEncoder};
use crate::error::prelude::*;
use crate::fetch::{FetchOpts, ResourceFetcher};
use crate::{ErrKind, Error};

/// A pending retrieval, shared by every request for the same family.
type FontFuture = Shared<BoxFuture<'static, ZResult<EcoString>>>;

enum FontEntry {
    Loading(FontFuture),
    Loaded(EcoString),
}

type FontEntries = Arc<Mutex<FxHashMap<EcoString, FontEntry>>>;

/// The settled result of loading one member of a font set.
#[derive(Debug, Clone)]
pub struct FontLoadOutcome {
    pub family: EcoString,
    pub result: ZResult<EcoString>,
}

impl FontLoadOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Cache of embeddable font data, keyed by family name.
pub struct FontCache {
    fetcher: Arc<dyn ResourceFetcher>,
    encoder: Arc<dyn FontEncoder>,
    entries: FontEntries,
}

impl FontCache {
    /// Creates an empty cache which encodes fonts as `data:` URLs.
    pub fn new(fetcher: impl ResourceFetcher + 'static) -> Self {
        Self::with_encoder(fetcher, DataUrlEncoder::default())
    }

    pub fn with_encoder(
        fetcher: impl ResourceFetcher + 'static,
        encoder: impl FontEncoder + 'static,
    ) -> Self {
        Self::from_parts(Arc::new(fetcher), Arc::new(encoder))
    }

    pub fn from_parts(fetcher: Arc<dyn ResourceFetcher>, encoder: Arc<dyn FontEncoder>) -> Self {
        Self {
            fetcher,
            encoder,
            entries: Default::default(),
        }
    }

    /// Loads the font at `src` and caches it under `family`.
    ///
    /// Returns the cached data without any retrieval if `family` is already
    /// loaded. If a retrieval for `family` is in flight, waits for that one
    /// instead of starting another, even when `src` differs.
    ///
    /// On failure nothing is cached, and a later call retries.
    pub async fn load_font(&self, family: &str, src: &str) -> ZResult<EcoString> {
        if family.is_empty() {
            return Err(error_once!("font.family.empty", src: src));
        }

        let pending = {
            let mut entries = self.entries.lock();
            match entries.get(family) {
                Some(FontEntry::Loaded(data)) => {
                    log::debug!("FontCache: hit {family:?}");
                    return Ok(data.clone());
                }
                Some(FontEntry::Loading(pending)) => pending.clone(),
                None => {
                    let family = EcoString::from(family);
                    let pending = self.retrieve(family.clone(), src.into()).boxed().shared();
                    entries.insert(family, FontEntry::Loading(pending.clone()));
                    pending
                }
            }
        };

        pending.await
    }

    /// Starts a retrieval; the returned future publishes its own result.
    fn retrieve(
        &self,
        family: EcoString,
        src: EcoString,
    ) -> impl Future<Output = ZResult<EcoString>> + Send + 'static {
        let fetcher = self.fetcher.clone();
        let encoder = self.encoder.clone();
        let entries = self.entries.clone();

        async move {
            log::debug!("FontCache: loading {family:?} from {src}");
            let args = || {
                Box::new([("family", family.to_string()), ("src", src.to_string())])
                    as Box<[(&'static str, String)]>
            };

            let load = async {
                match fetcher.fetch(&src, FetchOpts::local()).await {
                    Ok(data) => encoder
                        .encode(&data, &src)
                        .map_err(|e| Error::new("font.encode", ErrKind::Encoding(e), args())),
                    Err(e) => Err(Error::new("font.retrieve", ErrKind::Retrieval(e), args())),
                }
            };

            // a panicking collaborator must not leave the pending marker behind
            let result = AssertUnwindSafe(load)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    let cause = Error::new("font.retrieve.panic", panic_message(payload), args());
                    Err(Error::new("font.retrieve", ErrKind::Retrieval(cause), args()))
                });

            let mut entries = entries.lock();
            match &result {
                Ok(data) => {
                    log::info!("FontCache: cached {family:?} ({} bytes encoded)", data.len());
                    entries.insert(family, FontEntry::Loaded(data.clone()));
                }
                Err(..) => {
                    entries.remove(&family);
                }
            }

            result
        }
    }

    /// Loads every font of a set, ignoring individual failures.
    ///
    /// Completes once each retrieval has settled. Failures are logged and
    /// the failing families stay uncached.
    pub async fn load_font_set<I, K, V>(&self, fonts: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.load_font_set_settled(fonts).await;
    }

    /// Like [`FontCache::load_font_set`], but reports how each font settled,
    /// in the order of `fonts`.
    pub async fn load_font_set_settled<I, K, V>(&self, fonts: I) -> Vec<FontLoadOutcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let loads = fonts.into_iter().map(|(family, src)| {
            let family = EcoString::from(family.as_ref());
            let src = EcoString::from(src.as_ref());
            settled(family.clone(), async move {
                self.load_font(&family, &src).await
            })
        });

        let outcomes = join_all(loads).await;
        for outcome in &outcomes {
            if let Err(err) = &outcome.result {
                log::warn!("FontCache: failed to load {:?}: {err}", outcome.family);
            }
        }
        outcomes
    }

    /// Gets an already loaded font.
    ///
    /// Returns `None` if no retrieval of `family` has succeeded yet. This
    /// method never blocks and never starts a retrieval.
    pub fn get_font(&self, family: &str) -> Option<EcoString> {
        match self.entries.lock().get(family)? {
            FontEntry::Loaded(data) => Some(data.clone()),
            FontEntry::Loading(..) => None,
        }
    }

    /// Whether `family` is loaded.
    pub fn contains(&self, family: &str) -> bool {
        matches!(self.entries.lock().get(family), Some(FontEntry::Loaded(..)))
    }

    /// Whether a retrieval of `family` is in flight.
    pub fn is_loading(&self, family: &str) -> bool {
        matches!(self.entries.lock().get(family), Some(FontEntry::Loading(..)))
    }

    /// Number of loaded fonts.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|e| matches!(e, FontEntry::Loaded(..)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the loaded families, sorted.
    pub fn families(&self) -> Vec<EcoString> {
        let mut families: Vec<_> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, e)| matches!(e, FontEntry::Loaded(..)))
            .map(|(k, _)| k.clone())
            .collect();
        families.sort();
        families
    }
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("families", &self.families())
            .finish_non_exhaustive()
    }
}

/// Waits for `fut` and records its result instead of propagating it.
async fn settled(
    family: EcoString,
    fut: impl Future<Output = ZResult<EcoString>>,
) -> FontLoadOutcome {
    FontLoadOutcome {
        family,
        result: fut.await,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> ErrKind {
    match payload.downcast::<String>() {
        Ok(msg) => ErrKind::Msg(*msg),
        Err(payload) => match payload.downcast_ref::<&str>() {
            Some(msg) => ErrKind::Msg(msg.to_string()),
            None => ErrKind::None,
        },
    }
}
