//! Markdown rendering.
//!
//! The renderer is a black box to the rest of the engine: the position
//! mapper only sees it through [`Projector`], and annotation works on the
//! [`ContentTree`] it produces.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::tree::{ContentTree, Element, Node};

/// Produces the plain-text projection of a markdown source.
pub trait Projector {
    fn project(&self, source: &str) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS,
        }
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    pub fn to_html(&self, source: &str) -> String {
        let mut out = String::new();
        html::push_html(&mut out, Parser::new_ext(source, self.options));
        out
    }

    /// Builds the content tree annotations are materialized into.
    ///
    /// Block-level elements are followed by a `"\n"` text run, matching the
    /// line breaks of the HTML serialization, so the tree's flattened text
    /// reads like the rendered page.
    pub fn to_tree(&self, source: &str) -> ContentTree {
        let mut builder = TreeBuilder::default();
        for event in Parser::new_ext(source, self.options) {
            builder.process_event(event);
        }
        builder.finish()
    }
}

impl Projector for MarkdownRenderer {
    fn project(&self, source: &str) -> String {
        self.to_tree(source).text()
    }
}

struct OpenElement {
    element: Element,
    is_block: bool,
}

/// Turns the parser's event stream into nested nodes.
#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<OpenElement>,
    /// Inside an image, whose alt text is not part of the rendered text.
    image_depth: usize,
}

impl TreeBuilder {
    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(_) => self.close(),
            Event::Text(_) if self.image_depth > 0 => {}
            Event::Text(text) => self.push_text(text),
            Event::Code(code) => {
                self.push(Node::element("code", vec![Node::text(code.to_string())]));
            }
            Event::SoftBreak => self.push(Node::text("\n")),
            Event::HardBreak => {
                self.push(Node::element("br", Vec::new()));
                self.push(Node::text("\n"));
            }
            Event::Rule => {
                self.push(Node::element("hr", Vec::new()));
                self.push(Node::text("\n"));
            }
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input", Vec::new()).with_attribute("type", "checkbox");
                if checked {
                    input = input.with_attribute("checked", "");
                }
                self.push(Node::Element(input));
            }
            // Raw HTML, footnotes and math carry no annotatable text here.
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let opens_line = matches!(tag, Tag::List(_) | Tag::BlockQuote(_));
        let (element, is_block) = match tag {
            Tag::Paragraph => (Element::new("p", Vec::new()), true),
            Tag::Heading { level, .. } => (Element::new(format!("h{}", level as usize), Vec::new()), true),
            Tag::BlockQuote(_) => (Element::new("blockquote", Vec::new()), true),
            Tag::CodeBlock(_) => (Element::new("pre", Vec::new()), true),
            Tag::List(Some(start)) if start != 1 => (
                Element::new("ol", Vec::new()).with_attribute("start", start.to_string()),
                true,
            ),
            Tag::List(Some(_)) => (Element::new("ol", Vec::new()), true),
            Tag::List(None) => (Element::new("ul", Vec::new()), true),
            Tag::Item => (Element::new("li", Vec::new()), true),
            Tag::Table(_) => (Element::new("table", Vec::new()), true),
            Tag::TableHead => (Element::new("thead", Vec::new()), true),
            Tag::TableRow => (Element::new("tr", Vec::new()), true),
            Tag::TableCell => (Element::new("td", Vec::new()), false),
            Tag::Emphasis => (Element::new("em", Vec::new()), false),
            Tag::Strong => (Element::new("strong", Vec::new()), false),
            Tag::Strikethrough => (Element::new("del", Vec::new()), false),
            Tag::Link { dest_url, .. } => (
                Element::new("a", Vec::new()).with_attribute("href", dest_url.to_string()),
                false,
            ),
            Tag::Image { dest_url, .. } => {
                self.image_depth += 1;
                (
                    Element::new("img", Vec::new()).with_attribute("src", dest_url.to_string()),
                    false,
                )
            }
            _ => (Element::new("span", Vec::new()), false),
        };
        self.stack.push(OpenElement { element, is_block });
        if opens_line {
            self.push(Node::text("\n"));
        }
    }

    fn close(&mut self) {
        let Some(OpenElement { element, is_block }) = self.stack.pop() else {
            return;
        };
        if element.name == "img" {
            self.image_depth = self.image_depth.saturating_sub(1);
        }
        self.push(Node::Element(element));
        if is_block {
            self.push(Node::text("\n"));
        }
    }

    fn push_text(&mut self, text: CowStr<'_>) {
        self.push(Node::text(text.to_string()));
    }

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(open) => open.element.children.push(node),
            None => self.root.push(node),
        }
    }

    fn finish(mut self) -> ContentTree {
        while !self.stack.is_empty() {
            self.close();
        }
        let mut tree = ContentTree::new(self.root);
        tree.normalize();
        tree
    }
}
