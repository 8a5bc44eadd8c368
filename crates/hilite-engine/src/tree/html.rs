use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{ContentTree, Node};

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input"];

impl ContentTree {
    /// Serializes the tree as HTML, wrapper fragments included.
    ///
    /// Fragments become `span.marker` elements with `marker-start` /
    /// `marker-end` classes, `data-marker-id`, `data-tag-id` and the tag's
    /// inline style.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_nodes(self.nodes(), &mut out);
        out
    }
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&encode_text(text)),
            Node::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (name, value) in &element.attributes {
                    out.push_str(&format!(
                        " {name}=\"{}\"",
                        encode_double_quoted_attribute(value)
                    ));
                }
                if VOID_ELEMENTS.contains(&element.name.as_str()) {
                    out.push_str(" />");
                    continue;
                }
                out.push('>');
                write_nodes(&element.children, out);
                out.push_str(&format!("</{}>", element.name));
            }
            Node::Marker(fragment) => {
                out.push_str("<span class=\"marker");
                if fragment.is_start {
                    out.push_str(" marker-start");
                }
                if fragment.is_end {
                    out.push_str(" marker-end");
                }
                out.push_str(&format!(
                    "\" data-marker-id=\"{}\" data-tag-id=\"{}\" style=\"{}\">",
                    encode_double_quoted_attribute(fragment.marker_id.as_str()),
                    encode_double_quoted_attribute(&fragment.tag_id),
                    encode_double_quoted_attribute(&fragment.style.to_css()),
                ));
                write_nodes(&fragment.children, out);
                out.push_str("</span>");
            }
        }
    }
}
