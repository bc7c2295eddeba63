//! A page: its location plus its document
//!
//! This is the browsing context the pipeline runs against. The injector
//! borrows it mutably for the whole run, so there is exactly one writer.

use dom::{parse_document, DomArena, NodeId};

use crate::error::{NavError, Result};
use crate::location::Location;

/// The element that receives the navigation
pub const HEADER_SELECTOR: &str = "header";

#[derive(Debug, Clone)]
pub struct Page {
    location: Location,
    document: DomArena,
}

impl Page {
    pub fn new(location: Location, document: DomArena) -> Self {
        Self { location, document }
    }

    /// Parse `html` as the document served at `location`
    pub fn parse(location: Location, html: &str) -> Self {
        Self::new(location, parse_document(html))
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn document(&self) -> &DomArena {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut DomArena {
        &mut self.document
    }

    /// First header element in document order
    pub fn header(&self) -> Result<Option<NodeId>> {
        Ok(self.document.query_selector(HEADER_SELECTOR)?)
    }

    /// Insert `nav` as the first child of the header
    ///
    /// Existing header children shift right. Without a header the page is
    /// left untouched and `MissingHeader` is returned.
    pub fn insert_nav(&mut self, nav: NodeId) -> Result<()> {
        let header = self.require_header()?;
        self.document.prepend(header, nav)?;
        Ok(())
    }

    /// Like [`header`](Self::header), but a missing header is `MissingHeader`
    pub fn require_header(&self) -> Result<NodeId> {
        self.header()?.ok_or(NavError::MissingHeader {
            selector: HEADER_SELECTOR,
        })
    }

    pub fn to_html(&self) -> Result<String> {
        Ok(self.document.to_html()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> Page {
        Page::parse(Location::parse("https://site.example/").unwrap(), html)
    }

    #[test]
    fn test_insert_before_existing_children() {
        let mut page = page("<header><h1>Logo</h1><p>tag</p></header><main></main>");
        let nav = page.document_mut().create_element("nav");

        page.insert_nav(nav).unwrap();

        let header = page.header().unwrap().unwrap();
        let children = page.document().get(header).unwrap().children_ids.to_vec();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], nav);
        assert_eq!(
            page.document().outer_html(header).unwrap(),
            "<header><nav></nav><h1>Logo</h1><p>tag</p></header>"
        );
    }

    #[test]
    fn test_insert_into_empty_header() {
        let mut page = page("<header></header>");
        let nav = page.document_mut().create_element("nav");

        page.insert_nav(nav).unwrap();

        let header = page.header().unwrap().unwrap();
        assert_eq!(page.document().first_child(header).unwrap(), Some(nav));
    }

    #[test]
    fn test_first_header_wins() {
        let mut page = page("<header id=top></header><article><header id=inner></header></article>");
        let nav = page.document_mut().create_element("nav");

        page.insert_nav(nav).unwrap();

        let parent = page.document().get(nav).unwrap().parent_id.unwrap();
        assert_eq!(page.document().get(parent).unwrap().attr("id"), Some("top"));
    }

    #[test]
    fn test_missing_header() {
        let mut page = page("<main>no header</main>");
        let before = page.to_html().unwrap();
        let nav = page.document_mut().create_element("nav");

        let err = page.insert_nav(nav).unwrap_err();

        assert!(matches!(err, NavError::MissingHeader { .. }));
        assert_eq!(page.to_html().unwrap(), before);
    }
}
