//! HTML document model
//!
//! Arena-backed DOM with a tolerant parser, an HTML serializer and a small
//! selector engine. Enough of a browser document to load a page, query it,
//! mutate it, and write it back out.
//!
//! ## Core Design
//!
//! ```text
//! markup → Tokenizer → TreeBuilder → DomArena (owned) → Serializer → markup
//!                                        ↓
//!                                  NodeId (u32)
//! ```

pub mod arena;
mod entities;
pub mod error;
pub mod parser;
pub mod selector;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use parser::{parse_document, parse_fragment_into};
pub use selector::Selector;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_mutate_serialize() {
        let mut doc = parse_document("<header><h1>Site</h1></header><main>body</main>");
        let header = doc.query_selector("header").unwrap().unwrap();

        let nav = doc.create_element("nav");
        doc.set_inner_html(nav, "<a href=\"/\">Home</a>").unwrap();
        doc.prepend(header, nav).unwrap();

        assert_eq!(
            doc.outer_html(header).unwrap(),
            "<header><nav><a href=\"/\">Home</a></nav><h1>Site</h1></header>"
        );
    }
}
