//! Tolerant HTML parser
//!
//! A tokenizer and tree builder pair that turns markup into a [`DomArena`].
//! It follows the shape of the HTML parsing algorithm closely enough for
//! real-world pages and partials:
//!
//! - `html` / `head` / `body` are synthesised when missing
//! - void elements never take children
//! - `<p>`, `<li>`, `<dt>`/`<dd>`, `<option>` and headings close implicitly
//! - `script` / `style` / `textarea` / `title` contents are raw text
//! - unmatched end tags are ignored
//!
//! Parsing never fails. Garbage in produces *some* tree.
//! Tables (foster parenting) and the adoption agency algorithm are out of
//! scope; misnested formatting elements simply close at their end tag.

use std::borrow::Cow;

use crate::arena::DomArena;
use crate::entities;
use crate::error::Result;
use crate::types::{
    is_raw_text, is_void, Attribute, DomNode, NodeId, NodeType, CLOSES_P,
    ESCAPABLE_RAW_TEXT_ELEMENTS, HEAD_ELEMENTS,
};

/// Parse a complete document
///
/// The returned arena's root is the `#document` node, which always holds
/// an `html` element with `head` and `body` children.
pub fn parse_document(html: &str) -> DomArena {
    let mut arena = DomArena::new_document();
    let document = arena.root_id().unwrap_or(0);
    let mut builder = TreeBuilder::for_document(&mut arena, document);
    let mut tokenizer = Tokenizer::new(html);
    while let Some(token) = tokenizer.next_token() {
        builder.process(token);
    }
    builder.finish();
    arena
}

/// Parse markup as the children of `context` (innerHTML-style)
///
/// Returns the ids of the new top-level nodes appended to `context`.
/// Existing children are kept; callers wanting replace semantics use
/// [`DomArena::set_inner_html`].
pub fn parse_fragment_into(
    arena: &mut DomArena,
    context: NodeId,
    html: &str,
) -> Result<Vec<NodeId>> {
    let existing = arena.get(context)?.children_ids.len();
    let mut builder = TreeBuilder::for_fragment(arena, context);
    let mut tokenizer = Tokenizer::new(html);
    while let Some(token) = tokenizer.next_token() {
        builder.process(token);
    }
    Ok(arena.get(context)?.children_ids[existing..].to_vec())
}

impl DomArena {
    /// Replace the children of `node` with freshly parsed `html`
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<()> {
        self.remove_children(node)?;
        parse_fragment_into(self, node, html)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Doctype { name: String, rest: String },
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
    Comment(String),
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Set after a raw text start tag: (tag name, decode entities)
    raw_until: Option<(String, bool)>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_until: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn next_token(&mut self) -> Option<Token> {
        if let Some((tag, decode)) = self.raw_until.take() {
            let end = find_end_tag(self.rest(), &tag).unwrap_or(self.rest().len());
            let text = &self.rest()[..end];
            self.pos += end;
            if !text.is_empty() {
                let text = if decode {
                    decode_entities(text).into_owned()
                } else {
                    text.to_string()
                };
                return Some(Token::Text(text));
            }
        }

        if self.pos >= self.input.len() {
            return None;
        }

        let rest = self.rest();
        if !rest.starts_with('<') {
            let end = rest.find('<').unwrap_or(rest.len());
            self.pos += end;
            return Some(Token::Text(decode_entities(&rest[..end]).into_owned()));
        }

        if rest.starts_with("<!--") {
            let body = &rest[4..];
            let (comment, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], 4 + end + 3),
                None => (body, rest.len()),
            };
            self.pos += consumed;
            return Some(Token::Comment(comment.to_string()));
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            // `<?` keeps its `?` in the comment data, `<!` does not
            let skip = if rest.starts_with("<?") { 1 } else { 2 };
            let inner = rest[skip..end].trim_end_matches('>');
            self.pos += end;
            if skip == 2
                && inner
                    .get(..7)
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case("doctype"))
            {
                let body = inner[7..].trim();
                let (name, rest) = body
                    .split_once(|c: char| c.is_ascii_whitespace())
                    .unwrap_or((body, ""));
                return Some(Token::Doctype {
                    name: name.to_ascii_lowercase(),
                    rest: rest.trim().to_string(),
                });
            }
            return Some(Token::Comment(inner.to_string()));
        }

        if rest.starts_with("</") {
            return match self.peek_byte(2) {
                Some(b) if b.is_ascii_alphabetic() => self.end_tag(),
                Some(b'>') => {
                    self.pos += 3;
                    self.next_token()
                }
                None => {
                    // Lone "</" at EOF is literal text
                    self.pos += 2;
                    Some(Token::Text("</".to_string()))
                }
                Some(_) => {
                    let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                    let inner = rest[2..end].trim_end_matches('>');
                    self.pos += end;
                    Some(Token::Comment(inner.to_string()))
                }
            };
        }

        match self.peek_byte(1) {
            Some(b) if b.is_ascii_alphabetic() => self.start_tag(),
            _ => {
                self.pos += 1;
                Some(Token::Text("<".to_string()))
            }
        }
    }

    fn end_tag(&mut self) -> Option<Token> {
        self.pos += 2;
        let name = self.read_name();
        match self.rest().find('>') {
            Some(i) => {
                self.pos += i + 1;
                Some(Token::EndTag(name))
            }
            None => {
                // EOF inside a tag: the tag is dropped
                self.pos = self.input.len();
                None
            }
        }
    }

    fn start_tag(&mut self) -> Option<Token> {
        self.pos += 1;
        let name = self.read_name();
        let mut attrs: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek_byte(0) {
                None => {
                    self.pos = self.input.len();
                    return None;
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.peek_byte(0) == Some(b'>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    let attr = self.read_attribute();
                    // First occurrence wins for duplicated attribute names
                    if !attr.name.is_empty() && !attrs.iter().any(|a| a.name == attr.name) {
                        attrs.push(attr);
                    }
                }
            }
        }

        if !is_void(&name) {
            if is_raw_text(&name) {
                self.raw_until = Some((name.clone(), false));
            } else if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                self.raw_until = Some((name.clone(), true));
            }
        }

        Some(Token::StartTag {
            name,
            attrs,
            self_closing,
        })
    }

    fn read_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_ascii_lowercase()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        self.pos += rest.len() - trimmed.len();
    }

    fn read_attribute(&mut self) -> Attribute {
        let rest = self.rest();
        // A leading '=' is part of the name, as in the HTML tokenizer
        let name_end = rest
            .char_indices()
            .find(|&(i, c)| {
                c.is_ascii_whitespace() || c == '/' || c == '>' || (c == '=' && i > 0)
            })
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        self.pos += name_end;

        self.skip_whitespace();
        if self.peek_byte(0) != Some(b'=') {
            return Attribute::new(name, "");
        }
        self.pos += 1;
        self.skip_whitespace();

        let rest = self.rest();
        let value = match rest.as_bytes().first().copied() {
            Some(quote) if quote == b'"' || quote == b'\'' => {
                let body = &rest[1..];
                match body.find(char::from(quote)) {
                    Some(end) => {
                        self.pos += end + 2;
                        &body[..end]
                    }
                    None => {
                        self.pos = self.input.len();
                        body
                    }
                }
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                &rest[..end]
            }
        };

        Attribute::new(name, decode_attribute(value).into_owned())
    }
}

/// Byte offset of `</tag` (ASCII case-insensitive) followed by a delimiter
fn find_end_tag(haystack: &str, tag: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let tag = tag.as_bytes();
    let mut from = 0;
    while let Some(i) = haystack[from..].find("</") {
        let start = from + i;
        let name_start = start + 2;
        let name_end = name_start + tag.len();
        if name_end <= bytes.len()
            && bytes[name_start..name_end].eq_ignore_ascii_case(tag)
            && matches!(
                bytes.get(name_end),
                None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
            )
        {
            return Some(start);
        }
        from = name_start;
    }
    None
}

/// Decode character references in text content
///
/// Named references come from the full HTML table. Legacy names such as
/// `&amp` and `&eacute` are accepted without the trailing `;`. Unknown
/// references stay literal.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    decode(input, false)
}

/// Decode character references in an attribute value
///
/// Same as [`decode_entities`], except a legacy name followed by `=` or an
/// alphanumeric stays literal, so query strings like `?a=1&copy=2` survive.
pub fn decode_attribute(input: &str) -> Cow<'_, str> {
    decode(input, true)
}

fn decode(input: &str, in_attribute: bool) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_one(rest, in_attribute, &mut out) {
            Some(consumed) => rest = &rest[consumed..],
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode a single reference at the start of `s` (which begins with '&')
///
/// Pushes the replacement onto `out` and returns the bytes consumed.
fn decode_one(s: &str, in_attribute: bool, out: &mut String) -> Option<usize> {
    let bytes = s.as_bytes();

    if bytes.get(1) == Some(&b'#') {
        let (start, radix) = match bytes.get(2) {
            Some(b'x' | b'X') => (3, 16),
            _ => (2, 10),
        };
        let digits = bytes[start..]
            .iter()
            .take_while(|b| char::from(**b).is_digit(radix))
            .count();
        if digits == 0 {
            return None;
        }
        let code = u32::from_str_radix(&s[start..start + digits], radix).unwrap_or(u32::MAX);
        out.push(numeric_char(code));
        let mut consumed = start + digits;
        if bytes.get(consumed) == Some(&b';') {
            consumed += 1;
        }
        return Some(consumed);
    }

    let run = bytes[1..]
        .iter()
        .take(entities::MAX_NAME_LEN)
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if run == 0 {
        return None;
    }

    if bytes.get(1 + run) == Some(&b';') {
        if let Some(replacement) = entities::lookup(&s[1..run + 2]) {
            out.push_str(replacement);
            return Some(run + 2);
        }
    }

    // Longest legacy name without a semicolon
    for len in (1..=run).rev() {
        let Some(replacement) = entities::lookup(&s[1..1 + len]) else {
            continue;
        };
        let next = bytes.get(1 + len);
        if in_attribute && next.is_some_and(|b| *b == b'=' || b.is_ascii_alphanumeric()) {
            return None;
        }
        out.push_str(replacement);
        return Some(1 + len);
    }
    None
}

/// Code point for a numeric reference, with the windows-1252 remapping
/// browsers apply to the C1 range
fn numeric_char(code: u32) -> char {
    match code {
        0x80 => '€',
        0x82 => '‚',
        0x83 => 'ƒ',
        0x84 => '„',
        0x85 => '…',
        0x86 => '†',
        0x87 => '‡',
        0x88 => 'ˆ',
        0x89 => '‰',
        0x8A => 'Š',
        0x8B => '‹',
        0x8C => 'Œ',
        0x8E => 'Ž',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x98 => '˜',
        0x99 => '™',
        0x9A => 'š',
        0x9B => '›',
        0x9C => 'œ',
        0x9E => 'ž',
        0x9F => 'Ÿ',
        0 => '\u{FFFD}',
        c => char::from_u32(c).unwrap_or('\u{FFFD}'),
    }
}

/// Elements that bound "has an element in scope" lookups
const SCOPE_BOUNDARIES: &[&str] = &[
    "html", "table", "td", "th", "caption", "marquee", "object", "applet", "template",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

struct TreeBuilder<'a> {
    arena: &'a mut DomArena,
    document: NodeId,
    html: Option<NodeId>,
    head: Option<NodeId>,
    body: Option<NodeId>,
    /// Stack of open elements; the top is the insertion point
    stack: Vec<NodeId>,
    in_body: bool,
    /// Fragment mode never pops below the context element
    fragment: bool,
}

impl<'a> TreeBuilder<'a> {
    fn for_document(arena: &'a mut DomArena, document: NodeId) -> Self {
        Self {
            arena,
            document,
            html: None,
            head: None,
            body: None,
            stack: Vec::new(),
            in_body: false,
            fragment: false,
        }
    }

    fn for_fragment(arena: &'a mut DomArena, context: NodeId) -> Self {
        Self {
            arena,
            document: context,
            html: None,
            head: None,
            body: None,
            stack: vec![context],
            in_body: true,
            fragment: true,
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.document)
    }

    fn tag_of(&self, id: NodeId) -> &str {
        &self.arena.node(id).node_name
    }

    fn process(&mut self, token: Token) {
        match token {
            Token::Doctype { name, rest } => {
                if !self.fragment && self.html.is_none() {
                    // Public and system identifiers keep their case
                    let mut doctype = DomNode::new(0, NodeType::DocumentType, name);
                    doctype.node_value = rest;
                    let node = self.arena.add_node(doctype);
                    self.arena.push_child(self.document, node);
                }
            }
            Token::Comment(text) => {
                let node = self.arena.create_comment(text);
                let parent = self.current();
                self.arena.push_child(parent, node);
            }
            Token::Text(text) => self.text(text),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                if self.in_body {
                    self.start_tag_in_body(name, attrs, self_closing);
                } else {
                    self.start_tag_before_body(name, attrs, self_closing);
                }
            }
            Token::EndTag(name) => self.end_tag(&name),
        }
    }

    fn finish(mut self) {
        if !self.fragment {
            self.ensure_body();
        }
    }

    fn ensure_html(&mut self) -> NodeId {
        if let Some(html) = self.html {
            return html;
        }
        let html = self.arena.create_element("html");
        self.arena.push_child(self.document, html);
        self.html = Some(html);
        self.stack = vec![html];
        html
    }

    fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head {
            return head;
        }
        let html = self.ensure_html();
        let head = self.arena.create_element("head");
        self.arena.push_child(html, head);
        self.head = Some(head);
        self.stack = vec![html, head];
        head
    }

    fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        self.ensure_head();
        let html = self.ensure_html();
        let body = self.arena.create_element("body");
        self.arena.push_child(html, body);
        self.body = Some(body);
        self.stack = vec![html, body];
        self.in_body = true;
        body
    }

    /// Copy attributes the target does not already have (html/body merging)
    fn merge_attrs(&mut self, target: NodeId, attrs: Vec<Attribute>) {
        let node = self.arena.node_mut(target);
        for attr in attrs {
            if node.attr(&attr.name).is_none() {
                node.attributes.push(attr);
            }
        }
    }

    fn text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        if !self.in_body {
            let current = self.current();
            let inside_head_child = Some(current) != self.head && Some(current) != self.html;
            if !inside_head_child || self.html.is_none() {
                if text.trim_matches(|c: char| c.is_ascii_whitespace()).is_empty() {
                    return;
                }
                self.ensure_body();
            }
        }
        self.insert_text(text);
    }

    fn insert_text(&mut self, text: String) {
        let parent = self.current();
        if let Some(&last) = self.arena.node(parent).children_ids.last() {
            let last = self.arena.node_mut(last);
            if last.node_type == NodeType::Text {
                last.node_value.push_str(&text);
                return;
            }
        }
        let node = self.arena.create_text(text);
        self.arena.push_child(parent, node);
    }

    fn start_tag_before_body(&mut self, name: String, attrs: Vec<Attribute>, self_closing: bool) {
        match name.as_str() {
            "html" => {
                let html = self.ensure_html();
                self.merge_attrs(html, attrs);
            }
            "head" => {
                let head = self.ensure_head();
                self.merge_attrs(head, attrs);
            }
            "body" => {
                let body = self.ensure_body();
                self.merge_attrs(body, attrs);
            }
            tag if HEAD_ELEMENTS.contains(&tag) => {
                self.ensure_head();
                self.insert_element(name, attrs, self_closing);
            }
            _ => {
                self.ensure_body();
                self.start_tag_in_body(name, attrs, self_closing);
            }
        }
    }

    fn start_tag_in_body(&mut self, name: String, attrs: Vec<Attribute>, self_closing: bool) {
        match name.as_str() {
            "html" | "body" | "head" if self.fragment => return,
            "html" => {
                if let Some(html) = self.html {
                    self.merge_attrs(html, attrs);
                }
                return;
            }
            "body" => {
                if let Some(body) = self.body {
                    self.merge_attrs(body, attrs);
                }
                return;
            }
            "head" => return,
            _ => {}
        }

        let tag = name.as_str();
        if CLOSES_P.contains(&tag) && self.in_scope("p", &[]) {
            self.close_element("p");
        }
        match tag {
            "li" => {
                if self.in_scope("li", &["ol", "ul"]) {
                    self.close_element("li");
                }
            }
            "dd" | "dt" => {
                for open in ["dd", "dt"] {
                    if self.in_scope(open, &["dl"]) {
                        self.close_element(open);
                    }
                }
            }
            "option" => {
                if self.tag_of(self.current()) == "option" {
                    self.pop();
                }
            }
            "a" => {
                if self.in_scope("a", &[]) {
                    self.close_element("a");
                }
            }
            h if HEADINGS.contains(&h) => {
                if HEADINGS.contains(&self.tag_of(self.current())) {
                    self.pop();
                }
            }
            _ => {}
        }

        self.insert_element(name, attrs, self_closing);
    }

    fn insert_element(&mut self, name: String, attrs: Vec<Attribute>, self_closing: bool) {
        let foreign = name == "svg"
            || name == "math"
            || self
                .stack
                .iter()
                .any(|&id| matches!(self.tag_of(id), "svg" | "math"));
        let leaf = is_void(&name) || (self_closing && foreign);

        let parent = self.current();
        let node = self.arena.create_element_with_attrs(&name, attrs);
        self.arena.push_child(parent, node);
        if !leaf {
            self.stack.push(node);
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "html" | "body" | "head" if !self.fragment => {
                // Content after </body> still lands in body, as in browsers
            }
            "p" if !self.in_scope("p", &[]) => {
                // A stray </p> produces an empty paragraph
                if !self.in_body {
                    self.ensure_body();
                }
                self.insert_element("p".to_string(), Vec::new(), false);
                self.pop();
            }
            "br" => {
                if !self.in_body {
                    self.ensure_body();
                }
                self.insert_element("br".to_string(), Vec::new(), false);
            }
            _ => {
                let boundaries: &[&str] = match name {
                    "li" => &["ol", "ul"],
                    "dd" | "dt" => &["dl"],
                    _ => &[],
                };
                if self.in_scope(name, boundaries) {
                    self.close_element(name);
                }
            }
        }
    }

    /// Is an element named `tag` open, without crossing a scope boundary?
    fn in_scope(&self, tag: &str, extra_boundaries: &[&str]) -> bool {
        let floor = usize::from(self.fragment);
        for &id in self.stack[floor..].iter().rev() {
            let open = self.tag_of(id);
            if open == tag {
                return true;
            }
            if SCOPE_BOUNDARIES.contains(&open) || extra_boundaries.contains(&open) {
                return false;
            }
        }
        false
    }

    /// Pop elements until one named `tag` has been popped
    fn close_element(&mut self, tag: &str) {
        while let Some(&top) = self.stack.last() {
            if !self.pop() {
                return;
            }
            if self.tag_of(top) == tag {
                return;
            }
        }
    }

    /// Pop the current element. Never pops html/body or the fragment context.
    fn pop(&mut self) -> bool {
        let protected = if self.fragment {
            1
        } else if self.in_body {
            2
        } else {
            1
        };
        if self.stack.len() <= protected {
            return false;
        }
        self.stack.pop();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(arena: &DomArena, parent: NodeId) -> Vec<String> {
        arena
            .element_children(parent)
            .unwrap()
            .into_iter()
            .map(|id| arena.get(id).unwrap().node_name.clone())
            .collect()
    }

    #[test]
    fn test_document_skeleton_synthesised() {
        let arena = parse_document("<p>hello");
        let html = arena.find_by_tag("html");
        assert_eq!(html.len(), 1);
        assert_eq!(tags(&arena, html[0]), vec!["head", "body"]);

        let body = arena.find_by_tag("body")[0];
        assert_eq!(tags(&arena, body), vec!["p"]);
    }

    #[test]
    fn test_empty_input_still_has_body() {
        let arena = parse_document("");
        assert_eq!(arena.find_by_tag("body").len(), 1);
        assert_eq!(arena.find_by_tag("head").len(), 1);
    }

    #[test]
    fn test_head_elements_go_to_head() {
        let arena = parse_document(
            "<!DOCTYPE html><title>Nav &amp; more</title><meta charset=utf-8><main></main>",
        );
        let head = arena.find_by_tag("head")[0];
        assert_eq!(tags(&arena, head), vec!["title", "meta"]);

        let title = arena.find_by_tag("title")[0];
        let text = arena.get(title).unwrap().children_ids[0];
        assert_eq!(arena.get(text).unwrap().node_value, "Nav & more");

        let root = arena.root_id().unwrap();
        let first = arena.get(root).unwrap().children_ids[0];
        assert_eq!(arena.get(first).unwrap().node_type, NodeType::DocumentType);
    }

    #[test]
    fn test_attributes_quoted_unquoted_and_bare() {
        let arena = parse_document(
            r#"<a href="https://x.test/?a=1&amp;b=2" data-x='single' id=plain hidden>t</a>"#,
        );
        let a = arena.get(arena.find_by_tag("a")[0]).unwrap();
        assert_eq!(a.attr("href"), Some("https://x.test/?a=1&b=2"));
        assert_eq!(a.attr("data-x"), Some("single"));
        assert_eq!(a.attr("id"), Some("plain"));
        assert_eq!(a.attr("hidden"), Some(""));
    }

    #[test]
    fn test_implicit_paragraph_and_list_item_closing() {
        let arena = parse_document("<p>one<div>two</div><ul><li>a<li>b</ul>");
        let body = arena.find_by_tag("body")[0];
        assert_eq!(tags(&arena, body), vec!["p", "div", "ul"]);

        let ul = arena.find_by_tag("ul")[0];
        assert_eq!(tags(&arena, ul), vec!["li", "li"]);
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let arena = parse_document("<div><br><img src=x.png>text</div>");
        let div = arena.find_by_tag("div")[0];
        assert_eq!(tags(&arena, div), vec!["br", "img"]);
        assert_eq!(arena.get(div).unwrap().children_ids.len(), 3);
    }

    #[test]
    fn test_script_content_is_raw() {
        let arena = parse_document("<script>if (a < b) { x = '</div>'; }</script><p>after</p>");
        let script = arena.find_by_tag("script")[0];
        let text = arena.get(script).unwrap().children_ids[0];
        assert_eq!(
            arena.get(text).unwrap().node_value,
            "if (a < b) { x = '</div>'; }"
        );
        assert_eq!(arena.find_by_tag("p").len(), 1);
    }

    #[test]
    fn test_stray_end_tags_ignored() {
        let arena = parse_document("<main></span><div>x</div></section></main>");
        let main = arena.find_by_tag("main")[0];
        assert_eq!(tags(&arena, main), vec!["div"]);
    }

    #[test]
    fn test_malformed_input_does_not_panic() {
        for input in [
            "<",
            "</",
            "<div",
            "<a href=\"unterminated",
            "&#xZZ; &unknown; &#0;",
            "<!-- open comment",
            "</>",
            "<<<>>>",
            "<p></p></p></body></html><p>late",
        ] {
            let arena = parse_document(input);
            assert_eq!(arena.find_by_tag("body").len(), 1, "input: {input}");
        }
    }

    #[test]
    fn test_entity_decoding() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42;"), "a <b> AB");
        assert_eq!(decode_entities("AT&T &nope;"), "AT&T &nope;");
        assert_eq!(decode_entities("&#0;"), "\u{FFFD}");
    }

    #[test]
    fn test_full_named_reference_table() {
        assert_eq!(
            decode_entities("Caf&eacute; &rsquo;s &hellip; &CounterClockwiseContourIntegral;"),
            "Café ’s … ∳"
        );
        // Two code points
        assert_eq!(decode_entities("&NotEqualTilde;"), "\u{2242}\u{338}");
    }

    #[test]
    fn test_legacy_references_without_semicolon() {
        assert_eq!(decode_entities("fish &amp chips"), "fish & chips");
        assert_eq!(decode_entities("&eacutet&eacute"), "été");
        assert_eq!(decode_entities("&notit;"), "¬it;");
        // Names outside the legacy set need the semicolon
        assert_eq!(decode_entities("&rsquo s"), "&rsquo s");
    }

    #[test]
    fn test_attribute_legacy_reference_rules() {
        assert_eq!(decode_attribute("?a=1&copy=2"), "?a=1&copy=2");
        assert_eq!(decode_attribute("?a=1&copyx"), "?a=1&copyx");
        assert_eq!(decode_attribute("&copy 2024"), "© 2024");
        assert_eq!(decode_attribute("&copy;=2"), "©=2");
        assert_eq!(decode_entities("&copy=2"), "©=2");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_entities("&#233&#xE9;"), "éé");
        assert_eq!(decode_entities("&#x80;&#150;"), "€–");
        assert_eq!(decode_entities("&#xD800;&#x110000;&#99999999999;"), "\u{FFFD}\u{FFFD}\u{FFFD}");
        assert_eq!(decode_entities("&#;&#x;"), "&#;&#x;");
    }

    #[test]
    fn test_entities_round_trip_through_serializer() {
        let arena = parse_document(
            r#"<body><p title="It&rsquo;s">It&rsquo;s &hellip; &eacute;t&eacute; &amp; co</p></body>"#,
        );
        let body = arena.find_by_tag("body")[0];
        assert_eq!(
            arena.inner_html(body).unwrap(),
            r#"<p title="It’s">It’s … été &amp; co</p>"#
        );
    }

    #[test]
    fn test_doctype_identifiers_keep_case() {
        let arena = parse_document(
            r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd"><p>x</p>"#,
        );
        let root = arena.root_id().unwrap();
        let doctype = arena.get(root).unwrap().children_ids[0];
        let node = arena.get(doctype).unwrap();
        assert_eq!(node.node_name, "html");
        assert_eq!(
            node.node_value,
            r#"PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd""#
        );
    }

    #[test]
    fn test_processing_instruction_becomes_comment() {
        let arena = parse_document(r#"<?xml version="1.0"?><p>x</p>"#);
        let root = arena.root_id().unwrap();
        let first = arena.get(root).unwrap().children_ids[0];
        let node = arena.get(first).unwrap();
        assert_eq!(node.node_type, NodeType::Comment);
        assert_eq!(node.node_value, r#"?xml version="1.0"?"#);
    }

    #[test]
    fn test_fragment_parse_into_context() {
        let mut arena = DomArena::new();
        let nav = arena.create_element("nav");
        let added =
            parse_fragment_into(&mut arena, nav, "<ul><li><a href=/x>X</a></ul><body>").unwrap();

        assert_eq!(added.len(), 1);
        assert_eq!(tags(&arena, nav), vec!["ul"]);
        assert!(arena.find_by_tag("body").is_empty());
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let mut arena = DomArena::new();
        let nav = arena.create_element("nav");
        arena.set_inner_html(nav, "<p>old</p>").unwrap();
        arena.set_inner_html(nav, "<span>new</span>").unwrap();

        assert_eq!(tags(&arena, nav), vec!["span"]);
    }
}
