mod tests {

    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use base64::Engine;
    use font_embed_cli::{embed, EmbedArgs, FontArg};
    use font_embed_integration_test::{
        dejavu_sans_mono, font_root, CountingFetcher, PIXEL_TTF, SERIF_WOFF,
    };
    use reflexo_font_embed::{
        add_font_rules, load_web_font, DataUrlEncoder, FontCache, FontObserver, FontdbObserver,
        FsFetcher, MemDocument, ObserveOpts,
    };

    fn tmp_dir() -> &'static Path {
        Path::new(env!("CARGO_TARGET_TMPDIR"))
    }

    fn data_url(mime: &str, data: &[u8]) -> String {
        let e = base64::engine::general_purpose::STANDARD;
        format!("data:{mime};base64,{}", e.encode(data))
    }

    #[tokio::test]
    async fn test_serif_scenario() {
        let root = font_root(tmp_dir(), "serif-scenario");
        let cache = FontCache::new(FsFetcher::new(&root));

        assert_eq!(cache.get_font("Serif"), None);
        cache
            .load_font_set([("Serif", "/fonts/SourceSerifPro-Regular.woff")])
            .await;

        let serif = cache.get_font("Serif").unwrap();
        assert_eq!(serif.as_str(), data_url("font/woff", SERIF_WOFF));

        let doc = MemDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><text font-family="Serif">Hi</text></svg>"#,
        )
        .unwrap();
        let svg = doc.root_element().unwrap();
        let style = add_font_rules(&cache, &svg, &["Serif"]).unwrap();
        assert_eq!(style.text_content().matches("@font-face").count(), 1);

        insta::assert_snapshot!(doc.to_xml(), @r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><text font-family="Serif">Hi</text><defs><style>@font-face { font-family: "Serif"; src: url("data:font/woff;base64,d09GRgABAABzZXJpZg=="); }</style></defs></svg>"#);
    }

    #[tokio::test]
    async fn test_batch_with_failures() {
        let root = font_root(tmp_dir(), "batch");
        let cache = FontCache::new(FsFetcher::new(&root));

        let outcomes = cache
            .load_font_set_settled(reflexo_font_embed::preset::SCRATCH3.iter().copied())
            .await;
        assert_eq!(outcomes.len(), 7);

        let loaded: Vec<_> = outcomes
            .iter()
            .filter(|o| o.is_ok())
            .map(|o| o.family.as_str())
            .collect();
        assert_eq!(loaded, vec!["Pixel", "Serif", "Sans Serif"]);
        assert_eq!(cache.len(), 3);

        let marker = outcomes.iter().find(|o| o.family.as_str() == "Marker").unwrap();
        let err = marker.result.as_ref().unwrap_err();
        assert!(err.is_retrieval());
        assert_eq!(err.argument("src"), Some("/fonts/Knewave-Regular.woff"));
        assert!(!cache.contains("Marker"));

        let pixel = cache.get_font("Pixel").unwrap();
        assert_eq!(pixel.as_str(), data_url("font/ttf", PIXEL_TTF));
    }

    #[tokio::test]
    async fn test_sources_outside_root() {
        let root = font_root(tmp_dir(), "outside-root");
        let cache = FontCache::new(FsFetcher::new(root.join("fonts")));

        let err = cache
            .load_font("Serif", "/../fonts/SourceSerifPro-Regular.woff")
            .await
            .unwrap_err();
        assert!(err.is_retrieval());

        let err = cache
            .load_font("Serif", "https://example.com/serif.woff")
            .await
            .unwrap_err();
        assert!(err.is_retrieval());
        assert!(cache.is_empty());

        cache
            .load_font("Serif", "/SourceSerifPro-Regular.woff")
            .await
            .unwrap();
        assert!(cache.contains("Serif"));
    }

    #[tokio::test]
    async fn test_strict_encoding() {
        let root = font_root(tmp_dir(), "strict");
        std::fs::write(root.join("fonts/fake.woff"), b"GIF89a").unwrap();
        let cache = FontCache::with_encoder(FsFetcher::new(&root), DataUrlEncoder::strict());

        let err = cache.load_font("Fake", "/fonts/fake.woff").await.unwrap_err();
        assert!(err.is_encoding());
        assert!(!cache.contains("Fake"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_fetch_once() {
        let root = font_root(tmp_dir(), "concurrent");
        let fetcher = Arc::new(CountingFetcher::new(FsFetcher::new(&root)));
        let cache = Arc::new(FontCache::from_parts(
            fetcher.clone(),
            Arc::new(DataUrlEncoder::default()),
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache
                        .load_font("Serif", "/fonts/SourceSerifPro-Regular.woff")
                        .await
                })
            })
            .collect();

        let mut results = vec![];
        for task in tasks {
            results.push(task.await.unwrap().unwrap());
        }
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(fetcher.calls(), 1);

        // cached: no further retrieval
        cache
            .load_font("Serif", "/fonts/SourceSerifPro-Regular.woff")
            .await
            .unwrap();
        assert_eq!(fetcher.calls(), 1);
    }

    fn embed_args(root: &Path, input: PathBuf, output: PathBuf) -> EmbedArgs {
        let config = root.join("embed.toml");
        std::fs::write(
            &config,
            "preset = \"scratch3\"\n\n[fonts]\nExtra = \"/fonts/missing.woff\"\n",
        )
        .unwrap();

        EmbedArgs {
            config: Some(config),
            fonts: vec!["Pixel=/fonts/Grand9K-Pixel.ttf".parse::<FontArg>().unwrap()],
            families: vec!["Serif".into(), "Pixel".into(), "Marker".into()],
            input: Some(input),
            output: Some(output),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cli_embed() {
        let root = font_root(tmp_dir(), "cli-embed");
        let input = root.join("in.svg");
        let output = root.join("out.svg");
        std::fs::write(
            &input,
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text font-family="Pixel">1</text></svg>"#,
        )
        .unwrap();

        embed::embed(embed_args(&root, input, output.clone()))
            .await
            .unwrap();

        let output = std::fs::read_to_string(output).unwrap();
        insta::assert_snapshot!(output, @r#"
<svg xmlns="http://www.w3.org/2000/svg"><text font-family="Pixel">1</text><defs><style>@font-face { font-family: "Serif"; src: url("data:font/woff;base64,d09GRgABAABzZXJpZg=="); }
@font-face { font-family: "Pixel"; src: url("data:font/ttf;base64,AAEAAHBpeGVs"); }</style></defs></svg>
"#);
    }

    #[tokio::test]
    async fn test_cli_embed_bad_input() {
        let root = font_root(tmp_dir(), "cli-bad-input");
        let input = root.join("in.svg");
        let output = root.join("out.svg");

        let err = embed::embed(embed_args(&root, input.clone(), output.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.loc(), "embed.read_input");

        std::fs::write(&input, "<svg><g></svg>").unwrap();
        let err = embed::embed(embed_args(&root, input, output.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.loc(), "embed.parse_input");
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_observer_waits_for_registration() {
        let db = Arc::new(parking_lot::RwLock::new(fontdb::Database::new()));
        let observer = FontdbObserver::shared(db.clone())
            .with_poll_interval(Duration::from_millis(5))
            .with_timeout(Duration::from_secs(5));

        let data = std::fs::read(dejavu_sans_mono()).unwrap();
        let register = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            db.write().load_font_data(data);
        });

        assert!(!observer.is_ready("DejaVu Sans Mono", None));
        load_web_font(&observer, "DejaVu Sans Mono").await.unwrap();
        register.await.unwrap();
        assert!(observer.is_ready("dejavu sans mono", Some("abc")));
    }

    #[tokio::test]
    async fn test_observer_text_coverage() {
        let mut db = fontdb::Database::new();
        db.load_font_file(dejavu_sans_mono()).unwrap();
        let observer = FontdbObserver::new(db).with_poll_interval(Duration::from_millis(5));

        let covered = ObserveOpts {
            text: Some("Hello".into()),
            timeout: Some(Duration::from_millis(100)),
        };
        observer.load("DejaVu Sans Mono", covered).await.unwrap();

        let uncovered = ObserveOpts {
            text: Some("\u{4e00}".into()),
            timeout: Some(Duration::from_millis(30)),
        };
        let err = observer
            .load("DejaVu Sans Mono", uncovered)
            .await
            .unwrap_err();
        assert_eq!(err.loc(), "font.observe.timeout");
        assert_eq!(err.argument("family"), Some("DejaVu Sans Mono"));
    }
}
