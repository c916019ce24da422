//! Waiting for fonts that are registered outside of a [`crate::FontCache`].
//!
//! A host may declare fonts by other means, e.g. a style sheet in a browser
//! or font files installed on the system. Such fonts are not embedded; the
//! caller only needs to know when they can be rendered. That readiness check
//! is delegated to a [`FontObserver`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ecow::EcoString;
use parking_lot::RwLock;

use crate::error::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct ObserveOpts {
    /// Sample text the font must be able to render.
    pub text: Option<EcoString>,
    /// Overrides the observer's own timeout.
    pub timeout: Option<Duration>,
}

/// A facility reporting when a font family becomes renderable.
#[async_trait]
pub trait FontObserver: Send + Sync {
    /// Resolves once `family` is ready, or fails after a timeout.
    async fn load(&self, family: &str, opts: ObserveOpts) -> ZResult<()>;
}

/// Waits until `family`, registered outside of the cache, is renderable.
///
/// Observer failures are returned unchanged.
pub async fn load_web_font(observer: &dyn FontObserver, family: &str) -> ZResult<()> {
    load_web_font_with(observer, family, ObserveOpts::default()).await
}

/// Like [`load_web_font`], with sample text or a timeout for the observer.
pub async fn load_web_font_with(
    observer: &dyn FontObserver,
    family: &str,
    opts: ObserveOpts,
) -> ZResult<()> {
    log::debug!("load_web_font: waiting for {family:?}");
    observer.load(family, opts).await
}

/// Observes a [`fontdb::Database`] shared with the renderer.
///
/// A family is ready when a face in the database declares it and, if sample
/// text is given, covers every non-whitespace character of the text.
pub struct FontdbObserver {
    db: Arc<RwLock<fontdb::Database>>,
    timeout: Duration,
    poll_interval: Duration,
}

impl FontdbObserver {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn new(db: fontdb::Database) -> Self {
        Self::shared(Arc::new(RwLock::new(db)))
    }

    pub fn shared(db: Arc<RwLock<fontdb::Database>>) -> Self {
        Self {
            db,
            timeout: Self::DEFAULT_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Checks readiness once, without waiting.
    pub fn is_ready(&self, family: &str, text: Option<&str>) -> bool {
        let db = self.db.read();
        let mut faces = db.faces().filter(|face| {
            face.families
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(family))
        });

        match text.filter(|text| !text.trim().is_empty()) {
            None => faces.next().is_some(),
            Some(text) => faces.any(|face| {
                db.with_face_data(face.id, |data, index| covers(data, index, text))
                    .unwrap_or(false)
            }),
        }
    }
}

impl std::fmt::Debug for FontdbObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdbObserver")
            .field("faces", &self.db.read().len())
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[async_trait]
impl FontObserver for FontdbObserver {
    async fn load(&self, family: &str, opts: ObserveOpts) -> ZResult<()> {
        let timeout = opts.timeout.unwrap_or(self.timeout);
        let text = opts.text.as_deref();

        let poll = async {
            let mut polls = 0usize;
            while !self.is_ready(family, text) {
                polls += 1;
                log::debug!("FontdbObserver: {family:?} not ready, poll {polls}");
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            error_once!("font.observe.timeout", family: family, timeout_ms: timeout.as_millis())
        })
    }
}

fn covers(data: &[u8], index: u32, text: &str) -> bool {
    let Ok(face) = ttf_parser::Face::parse(data, index) else {
        return false;
    };
    text.chars()
        .filter(|c| !c.is_whitespace())
        .all(|c| face.glyph_index(c).is_some())
}
