//! DOM Serializer - Convert DOM tree back to HTML
//!
//! This module handles:
//! - `outerHTML` / `innerHTML` style serialization
//! - Text and attribute escaping
//! - Raw text elements (`script`, `style`) emitted verbatim

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;

fn serialize_children(arena: &DomArena, node_id: NodeId, output: &mut String) -> Result<()> {
    let node = arena.get(node_id)?;
    let raw = node.tag_name().is_some_and(is_raw_text);
    for &child_id in &node.children_ids {
        if raw {
            let child = arena.get(child_id)?;
            if child.is_text() {
                output.push_str(&child.node_value);
                continue;
            }
        }
        serialize_node(arena, child_id, output)?;
    }
    Ok(())
}

/// Serialize a single node recursively
fn serialize_node(arena: &DomArena, node_id: NodeId, output: &mut String) -> Result<()> {
    let node = arena.get(node_id)?;

    match node.node_type {
        NodeType::Element => {
            output.push('<');
            output.push_str(&node.node_name);
            for attr in &node.attributes {
                output.push(' ');
                output.push_str(&attr.name);
                output.push_str("=\"");
                escape_into(&attr.value, true, output);
                output.push('"');
            }
            output.push('>');

            if is_void(&node.node_name) {
                return Ok(());
            }

            serialize_children(arena, node_id, output)?;
            output.push_str("</");
            output.push_str(&node.node_name);
            output.push('>');
        }
        NodeType::Text => escape_into(&node.node_value, false, output),
        NodeType::Comment => {
            output.push_str("<!--");
            output.push_str(&node.node_value);
            output.push_str("-->");
        }
        NodeType::DocumentType => {
            output.push_str("<!DOCTYPE ");
            output.push_str(if node.node_name.is_empty() {
                "html"
            } else {
                &node.node_name
            });
            // PUBLIC / SYSTEM identifiers, as written
            if !node.node_value.is_empty() {
                output.push(' ');
                output.push_str(&node.node_value);
            }
            output.push('>');
        }
        NodeType::Document => serialize_children(arena, node_id, output)?,
    }

    Ok(())
}

/// Escape text per the HTML fragment serialization algorithm
fn escape_into(text: &str, attribute_mode: bool, output: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '\u{A0}' => output.push_str("&nbsp;"),
            '"' if attribute_mode => output.push_str("&quot;"),
            '<' if !attribute_mode => output.push_str("&lt;"),
            '>' if !attribute_mode => output.push_str("&gt;"),
            c => output.push(c),
        }
    }
}

impl DomArena {
    /// Serialize a node's children to markup (`element.innerHTML`)
    pub fn inner_html(&self, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        serialize_children(self, node_id, &mut output)?;
        Ok(output)
    }

    /// Serialize a node with its own tag (`element.outerHTML`)
    pub fn outer_html(&self, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        serialize_node(self, node_id, &mut output)?;
        Ok(output)
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> Result<String> {
        let mut output = String::with_capacity(4096);
        if let Some(root_id) = self.root_id() {
            serialize_node(self, root_id, &mut output)?;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn test_serialize_document() {
        let arena = parse_document(
            "<!doctype html><html lang=en><head><title>T</title></head><body><p>Hello</p></body></html>",
        );
        let html = arena.to_html().unwrap();
        assert_eq!(
            html,
            "<!DOCTYPE html><html lang=\"en\"><head><title>T</title></head><body><p>Hello</p></body></html>"
        );
    }

    #[test]
    fn test_inner_html_keeps_attribute_order() {
        let arena = parse_document(
            r#"<main><div><a href="/a" class="x" title='say "hi"'>A &amp; B</a><br></div></main>"#,
        );
        let div = arena.find_by_tag("div")[0];
        assert_eq!(
            arena.inner_html(div).unwrap(),
            r#"<a href="/a" class="x" title="say &quot;hi&quot;">A &amp; B</a><br>"#
        );
    }

    #[test]
    fn test_text_escaping() {
        let mut arena = DomArena::new();
        let p = arena.create_element("p");
        let text = arena.create_text("1 < 2 > 0 & \u{A0}");
        arena.append_child(p, text).unwrap();

        assert_eq!(
            arena.outer_html(p).unwrap(),
            "<p>1 &lt; 2 &gt; 0 &amp; &nbsp;</p>"
        );
    }

    #[test]
    fn test_raw_text_not_escaped() {
        let arena = parse_document("<body><script>a < b && c</script></body>");
        let body = arena.find_by_tag("body")[0];
        assert_eq!(
            arena.inner_html(body).unwrap(),
            "<script>a < b && c</script>"
        );
    }

    #[test]
    fn test_doctype_with_identifiers() {
        let arena = parse_document(
            r#"<!doctype html SYSTEM "about:legacy-compat"><p>x</p>"#,
        );
        assert!(arena
            .to_html()
            .unwrap()
            .starts_with(r#"<!DOCTYPE html SYSTEM "about:legacy-compat"><html>"#));
    }

    #[test]
    fn test_processing_instruction_round_trip() {
        let arena = parse_document(r#"<?xml version="1.0"?><p>x</p>"#);
        assert!(arena
            .to_html()
            .unwrap()
            .starts_with(r#"<!--?xml version="1.0"?--><html>"#));
    }
}
