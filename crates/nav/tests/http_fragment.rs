//! Integration test: fetch the navigation fragment over real HTTP.
//!
//! Starts a local server, points a page at it, and checks what ends up
//! in the page's header.

mod common;

use std::sync::Arc;

use nav::{HttpFragmentSource, Location, NavConfig, NavInjector, Outcome, Page};

const FRAGMENT: &str = r#"<!doctype html>
<html>
  <body>
    <main>
      <div><a href="https://local.page/">Home</a> <a href="https://local.page/docs/">Docs</a> <a href="https://elsewhere.test/">Out</a></div>
    </main>
  </body>
</html>"#;

const PAGE: &str = "<html><body><header><h1>Site</h1></header><main>Hello</main></body></html>";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn injector() -> NavInjector {
    let source = HttpFragmentSource::new().unwrap();
    NavInjector::new(NavConfig::default(), Arc::new(source)).unwrap()
}

#[tokio::test]
async fn nav_is_fetched_rewritten_and_inserted() {
    init_tracing();
    let server = common::fragment_server::start(&[("/nav.html", 200, FRAGMENT)]);
    let base = server.base_url();
    let location = Location::parse(&format!("{}/guide/intro.html", base)).unwrap();
    let mut page = Page::parse(location, PAGE);

    let outcome = injector().run(&mut page).await.unwrap();

    assert!(matches!(outcome, Outcome::Inserted { rewritten: 2, .. }));
    assert_eq!(server.hits(), 1);

    let header = page.header().unwrap().unwrap();
    let expected = format!(
        r#"<nav><a href="{base}/">Home</a> <a href="{base}/docs/">Docs</a> <a href="https://elsewhere.test/">Out</a></nav><h1>Site</h1>"#
    );
    assert_eq!(page.document().inner_html(header).unwrap(), expected);
}

#[tokio::test]
async fn missing_fragment_leaves_page_alone() {
    init_tracing();
    let server = common::fragment_server::start(&[]);
    let location = Location::parse(&format!("{}/", server.base_url())).unwrap();
    let mut page = Page::parse(location, PAGE);
    let before = page.to_html().unwrap();

    let outcome = injector().run(&mut page).await.unwrap();

    assert_eq!(outcome, Outcome::NoFragment);
    assert_eq!(server.hits(), 1);
    assert_eq!(page.to_html().unwrap(), before);
}

#[tokio::test]
async fn server_error_counts_as_missing() {
    init_tracing();
    let server = common::fragment_server::start(&[("/nav.html", 500, FRAGMENT)]);
    let location = Location::parse(&format!("{}/a/b", server.base_url())).unwrap();
    let mut page = Page::parse(location, PAGE);

    let outcome = injector().run(&mut page).await.unwrap();

    assert_eq!(outcome, Outcome::NoFragment);
}

#[tokio::test]
async fn fragment_page_never_requests_itself() {
    init_tracing();
    let server = common::fragment_server::start(&[("/nav.html", 200, FRAGMENT)]);
    let location = Location::parse(&format!("{}/nav.html", server.base_url())).unwrap();
    let mut page = Page::parse(location, FRAGMENT);

    let outcome = injector().run(&mut page).await.unwrap();

    assert_eq!(outcome, Outcome::Skipped);
    assert_eq!(server.hits(), 0);
}
