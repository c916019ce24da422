use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reflexo_font_embed::bridge::load_web_font_with;
use reflexo_font_embed::error::prelude::*;
use reflexo_font_embed::{FontdbObserver, ObserveOpts};

use crate::WaitArgs;

/// Registers the fonts of each source into `db`, one source at a time, so
/// that an observer polling `db` sees them as soon as their source is read.
pub fn scan_fonts(db: &RwLock<fontdb::Database>, font_paths: &[PathBuf], system_fonts: bool) {
    let sources = font_paths.iter().map(Some);
    let sources = system_fonts.then_some(None).into_iter().chain(sources);

    for source in sources {
        let mut scanned = fontdb::Database::new();
        match source {
            Some(dir) => scanned.load_fonts_dir(dir),
            None => scanned.load_system_fonts(),
        }

        let mut db = db.write();
        for face in scanned.faces() {
            db.push_face_info(face.clone());
        }
        log::info!("registered {} font faces, {} in total", scanned.len(), db.len());
    }
}

/// Runs the `wait` command.
///
/// Font sources are scanned in the background while the observer polls, so
/// the command finishes as soon as the family turns up and gives up after
/// the timeout even if scanning is still running.
pub async fn wait(args: WaitArgs) -> ZResult<()> {
    let db = Arc::new(RwLock::new(fontdb::Database::new()));
    let observer = FontdbObserver::shared(db.clone());
    let opts = ObserveOpts {
        text: args.text.as_deref().map(Into::into),
        timeout: Some(Duration::from_millis(args.timeout_ms)),
    };

    let font_paths = args.font_paths.clone();
    let system_fonts = args.system_fonts;
    tokio::task::spawn_blocking(move || scan_fonts(&db, &font_paths, system_fonts));

    load_web_font_with(&observer, &args.family, opts).await?;
    log::info!("font family {:?} is ready", args.family);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_fonts() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../tests/fonts")
    }

    fn wait_args(family: &str, timeout_ms: u64) -> WaitArgs {
        WaitArgs {
            font_paths: vec![test_fonts()],
            system_fonts: false,
            family: family.to_owned(),
            text: Some("Hello".to_owned()),
            timeout_ms,
        }
    }

    #[test]
    fn test_scan_fonts() {
        let db = RwLock::new(fontdb::Database::new());
        scan_fonts(&db, &[test_fonts()], false);

        let db = db.read();
        assert!(db.len() >= 1);
        assert!(db
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name == "DejaVu Sans Mono")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wait_sees_background_scan() {
        wait(wait_args("DejaVu Sans Mono", 5000)).await.unwrap();

        let err = wait(wait_args("Missing Family", 100)).await.unwrap_err();
        assert_eq!(err.loc(), "font.observe.timeout");
    }
}
