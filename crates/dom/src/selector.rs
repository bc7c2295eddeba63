//! Minimal CSS selector engine
//!
//! Supports what structural lookups on partial documents need:
//! type selectors (`div`, `*`), `#id`, `.class`, compounds of those
//! (`div.nav#top`) and the child (`>`) and descendant (whitespace)
//! combinators. Selector lists, attribute selectors and pseudo-classes
//! are rejected with [`DomError::InvalidSelector`].
//!
//! Matching runs right-to-left, like browsers do.

use std::str::FromStr;

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId};

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Child,
    Descendant,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// `None` means universal
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, node: &DomNode) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !node.node_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        let class_attr = node.attr("class").unwrap_or("");
        self.classes
            .iter()
            .all(|wanted| class_attr.split_ascii_whitespace().any(|c| c == wanted))
    }
}

/// A parsed selector, reusable across queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: &str| DomError::InvalidSelector {
            selector: source.to_string(),
            reason: reason.to_string(),
        };

        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut pending: Option<Combinator> = None;
        let mut chars = source.trim().chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_ascii_whitespace() {
                chars.next();
                if pending.is_none() {
                    pending = Some(Combinator::Descendant);
                }
                continue;
            }
            if c == '>' {
                chars.next();
                if compounds.is_empty() || pending == Some(Combinator::Child) {
                    return Err(invalid("unexpected '>'"));
                }
                pending = Some(Combinator::Child);
                continue;
            }

            let compound = parse_compound(&mut chars).map_err(|r| invalid(r.as_str()))?;
            if !compounds.is_empty() {
                combinators.push(pending.take().ok_or_else(|| invalid("missing combinator"))?);
            }
            pending = None;
            compounds.push(compound);
        }

        if compounds.is_empty() {
            return Err(invalid("empty selector"));
        }
        if pending == Some(Combinator::Child) {
            return Err(invalid("dangling '>'"));
        }

        Ok(Self {
            source: source.to_string(),
            compounds,
            combinators,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Does `node_id` match this selector?
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> Result<bool> {
        self.match_at(arena, self.compounds.len() - 1, node_id)
    }

    fn match_at(&self, arena: &DomArena, index: usize, node_id: NodeId) -> Result<bool> {
        let node = arena.get(node_id)?;
        if !self.compounds[index].matches(node) {
            return Ok(false);
        }
        if index == 0 {
            return Ok(true);
        }

        match self.combinators[index - 1] {
            Combinator::Child => match node.parent_id {
                Some(parent) => self.match_at(arena, index - 1, parent),
                None => Ok(false),
            },
            Combinator::Descendant => {
                let mut ancestor = node.parent_id;
                while let Some(id) = ancestor {
                    if self.match_at(arena, index - 1, id)? {
                        return Ok(true);
                    }
                    ancestor = arena.get(id)?.parent_id;
                }
                Ok(false)
            }
        }
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_compound(chars: &mut Chars<'_>) -> std::result::Result<Compound, String> {
    let mut compound = Compound::default();
    let mut saw_any = false;

    if chars.peek() == Some(&'*') {
        chars.next();
        saw_any = true;
    } else {
        let tag = take_ident(chars);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
            saw_any = true;
        }
    }

    while let Some(&c) = chars.peek() {
        match c {
            '#' | '.' => {
                chars.next();
                let ident = take_ident(chars);
                if ident.is_empty() {
                    return Err(format!("expected name after '{c}'"));
                }
                if c == '#' {
                    compound.id = Some(ident);
                } else {
                    compound.classes.push(ident);
                }
                saw_any = true;
            }
            c if c.is_ascii_whitespace() || c == '>' => break,
            c => return Err(format!("unsupported character '{c}'")),
        }
    }

    if saw_any {
        Ok(compound)
    } else {
        Err("expected a simple selector".to_string())
    }
}

fn take_ident(chars: &mut Chars<'_>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

impl DomArena {
    /// First descendant of `scope` (tree order) matching `selector`
    ///
    /// Like `element.querySelector`, the scope itself is never returned,
    /// but ancestors of the scope may satisfy the left side of the selector.
    pub fn select_first(&self, scope: NodeId, selector: &Selector) -> Result<Option<NodeId>> {
        for id in self.descendants(scope)? {
            if selector.matches(self, id)? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// `document.querySelector` over the arena root
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        match self.root_id() {
            Some(root) => self.select_first(root, &selector),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn test_child_combinator() {
        let arena = parse_document(
            "<main><section><div id=nested></div></section><div id=direct></div></main>",
        );
        let found = arena.query_selector("main > div").unwrap().unwrap();
        assert_eq!(arena.get(found).unwrap().attr("id"), Some("direct"));
    }

    #[test]
    fn test_descendant_combinator_tree_order() {
        let arena = parse_document(
            "<main><section><div id=nested></div></section><div id=direct></div></main>",
        );
        let found = arena.query_selector("main div").unwrap().unwrap();
        assert_eq!(arena.get(found).unwrap().attr("id"), Some("nested"));
    }

    #[test]
    fn test_compound_selectors() {
        let arena = parse_document(
            r#"<nav><a class="item active" id=home>H</a><a class=item>X</a></nav>"#,
        );
        let root = arena.root_id().unwrap();
        let items: Selector = "nav > a.item".parse().unwrap();
        let home = arena.select_first(root, &items).unwrap().unwrap();
        assert_eq!(arena.get(home).unwrap().attr("id"), Some("home"));

        let active = arena.query_selector("a.item.active#home").unwrap();
        assert_eq!(active, Some(home));
        assert_eq!(arena.query_selector("*#home").unwrap(), Some(home));
        assert_eq!(arena.query_selector("a.item.missing").unwrap(), None);
    }

    #[test]
    fn test_no_match() {
        let arena = parse_document("<main><p>no div here</p></main>");
        assert_eq!(arena.query_selector("main > div").unwrap(), None);
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in [
            "", "   ", "> div", "main >", "main > > div", "a[href]", "a:hover", "a, b", "div.",
        ] {
            assert!(
                matches!(Selector::parse(bad), Err(DomError::InvalidSelector { .. })),
                "selector should be rejected: {bad:?}"
            );
        }
    }

    #[test]
    fn test_whitespace_around_child_combinator() {
        let a = Selector::parse("main>div").unwrap();
        let b = Selector::parse("  main  >  div ").unwrap();
        assert_eq!(a.compounds, b.compounds);
        assert_eq!(a.combinators, b.combinators);
        assert_eq!(a.combinators, vec![Combinator::Child]);
    }
}
