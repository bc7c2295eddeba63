//! CLI for injecting the shared navigation into a page.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nav::{
    FileFragmentSource, FragmentSource, HttpFragmentSource, Location, NavConfig, NavInjector,
    Outcome, Page,
};

/// Inject the shared `<nav>` fragment into a page's `<header>`.
#[derive(Debug, Parser)]
#[command(name = "nav-inject")]
#[command(about = "Fetch the site navigation fragment and insert it into a page", long_about = None)]
pub struct Args {
    /// URL the page is served at; its origin locates the fragment.
    #[arg(long)]
    pub url: String,

    /// Page HTML to read (stdin when omitted).
    #[arg(long, value_name = "FILE")]
    pub page: Option<PathBuf>,

    /// Where to write the resulting HTML (stdout when omitted).
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// TOML file overriding `placeholder_origin` and `fragment_path`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read the fragment from a local file instead of fetching it over HTTP.
    #[arg(long, value_name = "FILE")]
    pub fragment: Option<PathBuf>,
}

pub fn load_config(args: &Args) -> Result<NavConfig> {
    match &args.config {
        Some(path) => NavConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(NavConfig::default()),
    }
}

fn fragment_source(args: &Args) -> Result<Arc<dyn FragmentSource>> {
    Ok(match &args.fragment {
        Some(path) => Arc::new(FileFragmentSource::new(path)),
        None => Arc::new(HttpFragmentSource::new().context("building HTTP client")?),
    })
}

/// Run the injector over `html` and return the HTML to emit.
///
/// Anything other than an insertion hands back the input unchanged.
pub async fn inject(args: &Args, html: String) -> Result<String> {
    let location = Location::parse(&args.url).context("invalid --url")?;
    let injector = NavInjector::new(load_config(args)?, fragment_source(args)?)?;
    let mut page = Page::parse(location, &html);

    match injector.run(&mut page).await {
        Ok(Outcome::Inserted { rewritten, .. }) => {
            tracing::debug!(rewritten, "serializing page");
            Ok(page.to_html()?)
        }
        Ok(outcome) => {
            tracing::info!(?outcome, "page left unchanged");
            Ok(html)
        }
        Err(err) if err.is_structural() => {
            tracing::warn!(error = %err, "navigation not injected");
            Ok(html)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn run(args: Args) -> Result<()> {
    let html = match &args.page {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading page {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading page from stdin")?;
            buf
        }
    };

    let output = inject(&args, html).await?;

    match &args.output {
        Some(path) => tokio::fs::write(path, output)
            .await
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FRAGMENT: &str =
        r#"<main><div><a href="https://local.page/about">About</a></div></main>"#;
    const PAGE: &str = "<html><head></head><body><header><h1>T</h1></header></body></html>";

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_url_is_required() {
        assert!(Args::try_parse_from(["nav-inject"]).is_err());
    }

    #[test]
    fn test_parse_all_flags() {
        let args = parse(&[
            "nav-inject",
            "--url",
            "https://a.test/",
            "--page",
            "in.html",
            "--output",
            "out.html",
            "--config",
            "nav.toml",
            "--fragment",
            "nav.html",
        ]);
        assert_eq!(args.url, "https://a.test/");
        assert_eq!(args.page, Some(PathBuf::from("in.html")));
        assert_eq!(args.output, Some(PathBuf::from("out.html")));
        assert_eq!(args.config, Some(PathBuf::from("nav.toml")));
        assert_eq!(args.fragment, Some(PathBuf::from("nav.html")));
    }

    #[tokio::test]
    async fn test_inject_from_local_fragment() {
        let dir = tempdir().unwrap();
        let fragment = dir.path().join("nav.html");
        std::fs::write(&fragment, FRAGMENT).unwrap();

        let args = parse(&[
            "nav-inject",
            "--url",
            "https://docs.test:8443/start",
            "--fragment",
            fragment.to_str().unwrap(),
        ]);
        let output = inject(&args, PAGE.to_string()).await.unwrap();

        assert_eq!(
            output,
            r#"<html><head></head><body><header><nav><a href="https://docs.test:8443/about">About</a></nav><h1>T</h1></header></body></html>"#
        );
    }

    #[tokio::test]
    async fn test_missing_fragment_file_returns_input() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.html");
        let args = parse(&[
            "nav-inject",
            "--url",
            "https://a.test/",
            "--fragment",
            missing.to_str().unwrap(),
        ]);
        let input = "<header>as written</header>".to_string();

        assert_eq!(inject(&args, input.clone()).await.unwrap(), input);
    }

    #[tokio::test]
    async fn test_structural_error_returns_input() {
        let dir = tempdir().unwrap();
        let fragment = dir.path().join("nav.html");
        std::fs::write(&fragment, FRAGMENT).unwrap();
        let args = parse(&[
            "nav-inject",
            "--url",
            "https://a.test/",
            "--fragment",
            fragment.to_str().unwrap(),
        ]);
        let input = "<p>no header on this page</p>".to_string();

        assert_eq!(inject(&args, input.clone()).await.unwrap(), input);
    }

    #[tokio::test]
    async fn test_config_file_overrides_placeholder() {
        let dir = tempdir().unwrap();
        let fragment = dir.path().join("nav.html");
        std::fs::write(
            &fragment,
            r#"<main><div><a href="http://localhost:8080/x">X</a></div></main>"#,
        )
        .unwrap();
        let config = dir.path().join("nav.toml");
        std::fs::write(&config, "placeholder_origin = \"http://localhost:8080\"\n").unwrap();

        let args = parse(&[
            "nav-inject",
            "--url",
            "https://prod.test/",
            "--config",
            config.to_str().unwrap(),
            "--fragment",
            fragment.to_str().unwrap(),
        ]);
        let output = inject(&args, "<header></header>".to_string()).await.unwrap();

        assert!(output.contains(r#"<nav><a href="https://prod.test/x">X</a></nav>"#));
    }

    #[tokio::test]
    async fn test_bad_url_is_an_error() {
        let args = parse(&["nav-inject", "--url", "not a url"]);
        assert!(inject(&args, PAGE.to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_run_reads_and_writes_files() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("page.html");
        let out = dir.path().join("out.html");
        std::fs::write(&page, "<header></header>").unwrap();

        let args = parse(&[
            "nav-inject",
            "--url",
            "https://a.test/nav.html",
            "--page",
            page.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ]);
        run(args).await.unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<header></header>");
    }
}
