//! Serialization of a document subtree: an HTML string for assertions
//! and display, plus a deterministic JSON snapshot for test comparisons.

use crate::{Document, NodeId, NodeKind};
use serde_json::{Map, Value, json};

/// Escape text content: `&`, `<`, `>`.
fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(character),
        }
    }
    out
}

/// Escape attribute values: text escapes plus `"`.
fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(character),
        }
    }
    out
}

impl Document {
    /// Serialize the subtree under `node` (inclusive) to an HTML string.
    ///
    /// Tags are written lower-case, attributes in insertion order, every
    /// element with an explicit open and close tag. Unknown ids produce
    /// an empty string.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(payload) = self.node(node) else {
            return;
        };
        match &payload.kind {
            NodeKind::Text { text } => out.push_str(&escape_text(text)),
            NodeKind::Element { tag } => {
                let tag = tag.to_lowercase();
                out.push('<');
                out.push_str(&tag);
                for (name, value) in self.attributes(node) {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                for child in self.children(node) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
        }
    }

    /// Build a deterministic JSON representation of the subtree.
    /// Schema:
    /// - Element: { "type":"element", "tag":"div", "attrs":{..}, "children":[..] }
    /// - Text: { "type":"text", "text":"..." }
    ///
    /// Attributes are sorted by key so snapshots compare stably.
    pub fn to_json_value(&self, node: NodeId) -> Value {
        let Some(payload) = self.node(node) else {
            return Value::Null;
        };
        match &payload.kind {
            NodeKind::Text { text } => json!({ "type": "text", "text": text }),
            NodeKind::Element { tag } => {
                let mut pairs: Vec<(String, String)> = self
                    .attributes(node)
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .collect();
                pairs.sort_by(|left, right| left.0.cmp(&right.0));
                let mut attrs = Map::new();
                for (name, value) in pairs {
                    attrs.insert(name, Value::String(value));
                }
                let children: Vec<Value> = self
                    .children(node)
                    .map(|child| self.to_json_value(child))
                    .collect();
                json!({
                    "type": "element",
                    "tag": tag.to_lowercase(),
                    "attrs": Value::Object(attrs),
                    "children": children,
                })
            }
        }
    }

    /// Pretty JSON string for snapshots and test comparisons.
    pub fn to_json_string(&self, node: NodeId) -> String {
        serde_json::to_string_pretty(&self.to_json_value(node))
            .unwrap_or_else(|_| String::from("null"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Assertions in tests are expected")]

    use crate::Document;

    #[test]
    fn html_round_trips_structure_and_attributes() {
        let mut doc = Document::new();
        let div = doc.create_element("DIV");
        doc.set_attribute(div, "id", "p1").unwrap();
        doc.set_attribute(div, "class", "fred").unwrap();
        let paragraph = doc.create_element("p");
        doc.append_child(div, paragraph).unwrap();
        let text = doc.create_text("Hi");
        doc.append_child(paragraph, text).unwrap();
        assert_eq!(
            doc.to_html(div),
            "<div id=\"p1\" class=\"fred\"><p>Hi</p></div>"
        );
    }

    #[test]
    fn html_escapes_text_and_attribute_values() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        doc.set_attribute(span, "title", "say \"hi\" & <go>").unwrap();
        let text = doc.create_text("1 < 2 & 3 > 2");
        doc.append_child(span, text).unwrap();
        assert_eq!(
            doc.to_html(span),
            "<span title=\"say &quot;hi&quot; &amp; &lt;go&gt;\">1 &lt; 2 &amp; 3 &gt; 2</span>"
        );
    }

    #[test]
    fn json_snapshot_sorts_attributes() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "zeta", "1").unwrap();
        doc.set_attribute(div, "alpha", "2").unwrap();
        let value = doc.to_json_value(div);
        let attrs = value.get("attrs").unwrap().as_object().unwrap();
        let keys: Vec<&String> = attrs.keys().collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[test]
    fn json_snapshot_nests_children() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text("Hi");
        doc.append_child(div, text).unwrap();
        let value = doc.to_json_value(div);
        assert_eq!(value.get("type").unwrap(), "element");
        let children = value.get("children").unwrap().as_array().unwrap();
        assert_eq!(children[0].get("text").unwrap(), "Hi");
    }
}
