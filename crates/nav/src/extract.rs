//! Fragment parsing, navigation extraction and link rewriting

use dom::{parse_document, DomArena, NodeId, Selector};

use crate::error::{NavError, Result};
use crate::location::Origin;

/// Where the navigation markup lives inside the fragment document
pub const FRAGMENT_SELECTOR: &str = "main > div";

/// Parse the raw fragment. Never fails; malformed markup yields some tree.
pub fn parse_fragment(html: &str) -> DomArena {
    parse_document(html)
}

/// Build a detached `<nav>` in `page` holding the fragment's navigation markup
///
/// The inner markup of the first `main > div` is serialized and re-parsed
/// into the new element, so the page arena never shares nodes with the
/// fragment arena.
pub fn extract_nav(fragment: &DomArena, page: &mut DomArena) -> Result<NodeId> {
    let selector = Selector::parse(FRAGMENT_SELECTOR)?;
    let container = match fragment.root_id() {
        Some(root) => fragment.select_first(root, &selector)?,
        None => None,
    }
    .ok_or(NavError::FragmentShape {
        selector: FRAGMENT_SELECTOR,
    })?;

    let content = fragment.inner_html(container)?;
    let nav = page.create_element("nav");
    page.set_inner_html(nav, &content)?;
    Ok(nav)
}

/// Point placeholder-origin links at the real origin
///
/// Every `<a>` under `nav` whose `href` contains `placeholder` gets the
/// first occurrence replaced with `origin`. Anything else, relative hrefs
/// included, is left alone. Returns the number of rewritten anchors.
pub fn rewrite_links(
    arena: &mut DomArena,
    nav: NodeId,
    placeholder: &str,
    origin: &Origin,
) -> Result<usize> {
    if placeholder.is_empty() {
        return Ok(0);
    }

    let origin = origin.to_string();
    let mut rewritten = 0;
    for anchor in arena.elements_by_tag(nav, "a")? {
        let node = arena.get_mut(anchor)?;
        let Some(href) = node.attr("href") else {
            continue;
        };
        if !href.contains(placeholder) {
            continue;
        }

        let updated = href.replacen(placeholder, &origin, 1);
        tracing::trace!(from = href, to = %updated, "rewrote link");
        node.set_attr("href", updated);
        rewritten += 1;
    }

    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hrefs(arena: &DomArena, nav: NodeId) -> Vec<String> {
        arena
            .elements_by_tag(nav, "a")
            .unwrap()
            .into_iter()
            .map(|id| arena.get(id).unwrap().attr("href").unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_extract_first_main_div() {
        let fragment = parse_fragment(
            "<html><body><main><div><a href=\"/a\">A</a></div><div>second</div></main></body></html>",
        );
        let mut page = DomArena::new_document();

        let nav = extract_nav(&fragment, &mut page).unwrap();

        assert_eq!(
            page.outer_html(nav).unwrap(),
            "<nav><a href=\"/a\">A</a></nav>"
        );
        assert!(!page.is_connected(nav).unwrap());
    }

    #[test]
    fn test_extract_requires_direct_child() {
        let fragment = parse_fragment("<main><section><div>nested</div></section></main>");
        let mut page = DomArena::new_document();
        let before = page.len();

        let err = extract_nav(&fragment, &mut page).unwrap_err();

        assert!(matches!(err, NavError::FragmentShape { .. }));
        assert_eq!(page.len(), before);
    }

    #[test]
    fn test_extract_from_garbage() {
        let fragment = parse_fragment("<<not html at all");
        let mut page = DomArena::new_document();
        assert!(extract_nav(&fragment, &mut page).is_err());
    }

    #[test]
    fn test_rewrite_scope() {
        let fragment = parse_fragment(
            r#"<main><div>
                <a href="https://local.page/about">About</a>
                <a href="https://example.com/x">X</a>
                <a href="/relative">Rel</a>
                <a name="anchor-without-href">none</a>
            </div></main>"#,
        );
        let mut page = DomArena::new_document();
        let nav = extract_nav(&fragment, &mut page).unwrap();
        let origin = Origin::new("https", "shop.test", None);

        let count = rewrite_links(&mut page, nav, "https://local.page", &origin).unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            hrefs(&page, nav),
            vec![
                "https://shop.test/about",
                "https://example.com/x",
                "/relative",
                ""
            ]
        );
    }

    #[test]
    fn test_rewrite_nested_anchors_and_first_occurrence_only() {
        let mut page = DomArena::new_document();
        let nav = page.create_element("nav");
        page.set_inner_html(
            nav,
            r#"<ul><li><a href="https://local.page/r?next=https://local.page/x">R</a></li></ul>"#,
        )
        .unwrap();
        let origin = Origin::new("http", "localhost", Some(3000));

        rewrite_links(&mut page, nav, "https://local.page", &origin).unwrap();

        assert_eq!(
            hrefs(&page, nav),
            vec!["http://localhost:3000/r?next=https://local.page/x"]
        );
    }

    #[test]
    fn test_empty_placeholder_rewrites_nothing() {
        let mut page = DomArena::new_document();
        let nav = page.create_element("nav");
        page.set_inner_html(nav, "<a href=\"/x\">x</a>").unwrap();
        let origin = Origin::new("https", "a.test", None);

        assert_eq!(rewrite_links(&mut page, nav, "", &origin).unwrap(), 0);
        assert_eq!(hrefs(&page, nav), vec!["/x"]);
    }

    #[test]
    fn test_rewrite_matches_href_text_as_written() {
        let mut page = DomArena::new_document();
        let nav = page.create_element("nav");
        page.set_inner_html(
            nav,
            r#"<a href="//local.page/x">a</a><a href="HTTPS://LOCAL.PAGE/y">b</a><a href="https://local.page/z">c</a>"#,
        )
        .unwrap();
        let origin = Origin::new("https", "shop.test", None);

        let rewritten = rewrite_links(&mut page, nav, "https://local.page", &origin).unwrap();

        assert_eq!(rewritten, 1);
        assert_eq!(
            hrefs(&page, nav),
            vec!["//local.page/x", "HTTPS://LOCAL.PAGE/y", "https://shop.test/z"]
        );
    }
}
