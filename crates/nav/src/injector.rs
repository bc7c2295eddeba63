//! Navigation injector - the pipeline entry point
//!
//! ```text
//! guard ──skip──▶ Skipped
//!   │
//! fetch ──none──▶ NoFragment
//!   │
//! parse → extract → rewrite → insert ──▶ Inserted
//! ```
//!
//! The run either completes or stops at the first unmet precondition.
//! Structural failures come back as errors and leave the page document
//! as it was.

use std::sync::Arc;

use dom::utils::{cap_text_length, get_text_content};
use dom::NodeId;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::NavConfig;
use crate::error::Result;
use crate::events::{EventBus, NavEvent};
use crate::extract::{extract_nav, parse_fragment, rewrite_links};
use crate::fetch::FragmentSource;
use crate::location::{Location, Origin};
use crate::page::Page;

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The page is the fragment; nothing fetched, nothing changed
    Skipped,
    /// No fragment available; nothing changed
    NoFragment,
    /// `nav` is now the header's first child
    Inserted { nav: NodeId, rewritten: usize },
}

/// False when the page *is* the fragment, which would include itself
pub fn should_inject(location: &Location, config: &NavConfig) -> bool {
    location.pathname() != config.fragment_path
}

pub struct NavInjector {
    config: NavConfig,
    source: Arc<dyn FragmentSource>,
    event_bus: EventBus,
}

impl NavInjector {
    pub fn new(config: NavConfig, source: Arc<dyn FragmentSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            event_bus: EventBus::new(),
        })
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Run the pipeline once against `page`
    pub async fn run(&self, page: &mut Page) -> Result<Outcome> {
        let run_id = Uuid::now_v7();
        let span = tracing::info_span!(
            "nav_inject",
            %run_id,
            url = %page.location(),
            source = self.source.name()
        );
        self.run_inner(run_id, page).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, page: &mut Page) -> Result<Outcome> {
        let location = page.location().clone();
        if !should_inject(&location, &self.config) {
            tracing::debug!("page is the fragment itself, skipping");
            self.event_bus.publish(NavEvent::Skipped {
                run_id,
                path: location.pathname().to_string(),
            });
            return Ok(Outcome::Skipped);
        }

        let origin = location.origin();
        let fragment_url = match location.resolve_path(&self.config.fragment_path) {
            Ok(url) => url,
            Err(err) => {
                self.event_bus.publish(NavEvent::Failed {
                    run_id,
                    error: err.to_string(),
                });
                return Err(err);
            }
        };

        let html = match self.source.fetch(&fragment_url).await {
            Ok(Some(html)) => html,
            Ok(None) => {
                tracing::debug!(url = %fragment_url, "no fragment to inject");
                self.event_bus.publish(NavEvent::FragmentMissing {
                    run_id,
                    url: fragment_url.to_string(),
                });
                return Ok(Outcome::NoFragment);
            }
            Err(err) => {
                tracing::warn!(url = %fragment_url, error = %err, "fragment fetch failed");
                self.event_bus.publish(NavEvent::FetchFailed {
                    run_id,
                    url: fragment_url.to_string(),
                    error: err.to_string(),
                });
                return Ok(Outcome::NoFragment);
            }
        };

        match self.build_and_insert(page, &html, &origin) {
            Ok((nav, rewritten)) => {
                let text = get_text_content(page.document(), nav)
                    .map(|t| cap_text_length(&t, 80))
                    .unwrap_or_default();
                tracing::info!(rewritten, nav = %text, "navigation inserted");
                self.event_bus
                    .publish(NavEvent::Inserted { run_id, rewritten });
                Ok(Outcome::Inserted { nav, rewritten })
            }
            Err(err) => {
                self.event_bus.publish(NavEvent::Failed {
                    run_id,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn build_and_insert(
        &self,
        page: &mut Page,
        html: &str,
        origin: &Origin,
    ) -> Result<(NodeId, usize)> {
        // Nothing is allocated in the page until both lookups have succeeded
        page.require_header()?;
        let fragment = parse_fragment(html);
        let nav = extract_nav(&fragment, page.document_mut())?;
        let rewritten = rewrite_links(
            page.document_mut(),
            nav,
            &self.config.placeholder_origin,
            origin,
        )?;
        page.insert_nav(nav)?;
        Ok((nav, rewritten))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use url::Url;

    /// In-memory source that records every URL it is asked for
    struct StaticSource {
        body: Option<String>,
        fail: bool,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl StaticSource {
        fn with_body(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: Some(body.to_string()),
                fail: false,
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn absent() -> Arc<Self> {
            Arc::new(Self {
                body: None,
                fail: false,
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                body: None,
                fail: true,
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FragmentSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self, url: &Url) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(NavError::Fetch {
                    url: url.to_string(),
                    source: "connection reset".into(),
                });
            }
            Ok(self.body.clone())
        }
    }

    const FRAGMENT: &str =
        r#"<html><body><main><div><a href="https://local.page/home">Home</a></div></main></body></html>"#;

    fn page(url: &str, html: &str) -> Page {
        Page::parse(Location::parse(url).unwrap(), html)
    }

    fn injector(source: Arc<StaticSource>) -> NavInjector {
        NavInjector::new(NavConfig::default(), source).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let source = StaticSource::with_body(FRAGMENT);
        let injector = injector(source.clone());
        let mut page = page(
            "https://site.example/products",
            "<html><body><header><h1>Shop</h1></header><main>Products</main></body></html>",
        );

        let outcome = injector.run(&mut page).await.unwrap();

        let Outcome::Inserted { nav, rewritten } = outcome else {
            panic!("expected Inserted, got {outcome:?}");
        };
        assert_eq!(rewritten, 1);
        assert_eq!(
            source.urls.lock().unwrap().as_slice(),
            ["https://site.example/nav.html"]
        );

        let header = page.header().unwrap().unwrap();
        assert_eq!(page.document().first_child(header).unwrap(), Some(nav));
        assert_eq!(
            page.document().outer_html(header).unwrap(),
            r#"<header><nav><a href="https://site.example/home">Home</a></nav><h1>Shop</h1></header>"#
        );
    }

    #[tokio::test]
    async fn test_self_reference_skips_everything() {
        let source = StaticSource::with_body(FRAGMENT);
        let injector = injector(source.clone());
        let mut page = page("https://site.example/nav.html", "<header></header>");
        let before = page.to_html().unwrap();
        let nodes_before = page.document().len();

        let outcome = injector.run(&mut page).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(source.calls(), 0);
        assert_eq!(page.document().len(), nodes_before);
        assert_eq!(page.to_html().unwrap(), before);
    }

    #[tokio::test]
    async fn test_absent_fragment_changes_nothing() {
        let source = StaticSource::absent();
        let injector = injector(source.clone());
        let mut page = page("https://site.example/", "<header><h1>x</h1></header>");
        let nodes_before = page.document().len();

        let outcome = injector.run(&mut page).await.unwrap();

        assert_eq!(outcome, Outcome::NoFragment);
        assert_eq!(source.calls(), 1);
        assert_eq!(page.document().len(), nodes_before);
    }

    #[tokio::test]
    async fn test_transport_failure_is_absence() {
        let injector = injector(StaticSource::failing());
        let mut rx = injector.event_bus().subscribe();
        let mut page = page("https://site.example/", "<header></header>");

        let outcome = injector.run(&mut page).await.unwrap();

        assert_eq!(outcome, Outcome::NoFragment);
        assert!(matches!(rx.recv().await, Ok(NavEvent::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_fragment_without_main_div() {
        let injector = injector(StaticSource::with_body("<main><p>oops</p></main>"));
        let mut rx = injector.event_bus().subscribe();
        let mut page = page("https://site.example/", "<header><h1>x</h1></header>");
        let before = page.to_html().unwrap();
        let nodes_before = page.document().len();

        let err = injector.run(&mut page).await.unwrap_err();

        assert!(matches!(err, NavError::FragmentShape { .. }));
        assert!(err.is_structural());
        assert_eq!(page.document().len(), nodes_before);
        assert_eq!(page.to_html().unwrap(), before);
        assert!(matches!(rx.recv().await, Ok(NavEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn test_page_without_header() {
        let injector = injector(StaticSource::with_body(FRAGMENT));
        let mut page = page("https://site.example/", "<main>no header</main>");
        let before = page.to_html().unwrap();
        let nodes_before = page.document().len();

        let err = injector.run(&mut page).await.unwrap_err();

        assert!(matches!(err, NavError::MissingHeader { .. }));
        assert_eq!(page.document().len(), nodes_before);
        assert_eq!(page.to_html().unwrap(), before);
    }

    #[tokio::test]
    async fn test_character_references_survive_injection() {
        let injector = injector(StaticSource::with_body(
            r#"<main><div><a href="https://local.page/cafe">Caf&eacute; &rsquo;s</a></div></main>"#,
        ));
        let mut page = page(
            "https://site.example/",
            "<header></header><p>It&rsquo;s &hellip; &eacute;t&eacute;</p>",
        );

        injector.run(&mut page).await.unwrap();

        let html = page.to_html().unwrap();
        assert!(html.contains(r#"<nav><a href="https://site.example/cafe">Café ’s</a></nav>"#));
        assert!(html.contains("<p>It’s … été</p>"));
    }

    #[test]
    fn test_port_is_kept_in_fetch_and_rewrite() {
        let source = StaticSource::with_body(FRAGMENT);
        let injector = injector(source.clone());
        let mut page = page("http://localhost:3000/docs/", "<header></header>");

        let outcome = tokio_test::block_on(injector.run(&mut page)).unwrap();

        assert!(matches!(outcome, Outcome::Inserted { rewritten: 1, .. }));
        assert_eq!(
            source.urls.lock().unwrap().as_slice(),
            ["http://localhost:3000/nav.html"]
        );
        let header = page.header().unwrap().unwrap();
        assert_eq!(
            page.document().inner_html(header).unwrap(),
            r#"<nav><a href="http://localhost:3000/home">Home</a></nav>"#
        );
    }

    #[test]
    fn test_guard_uses_configured_path() {
        let config = NavConfig {
            fragment_path: "/partials/nav.html".to_string(),
            ..NavConfig::default()
        };
        let nav_page = Location::parse("https://a.test/partials/nav.html").unwrap();
        let other = Location::parse("https://a.test/nav.html").unwrap();

        assert!(!should_inject(&nav_page, &config));
        assert!(should_inject(&other, &config));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = NavConfig {
            fragment_path: "nav.html".to_string(),
            ..NavConfig::default()
        };
        assert!(NavInjector::new(config, StaticSource::absent()).is_err());
    }
}
