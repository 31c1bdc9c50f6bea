//! A small mutable element tree on top of `quick-xml` events.
//!
//! Only what identifier embedding needs: navigation by element name,
//! attribute and text access, node insertion and reserialization. Text and
//! attribute values are stored exactly as they appear in the source (still
//! escaped), so untouched content is written back byte-for-byte.

use std::borrow::Cow;

use exn::{OptionExt, ResultExt};
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};

use crate::error::{ErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Escaped character data.
    Text(String),
    CData(String),
    Comment(String),
    /// Processing instruction content (target and data), without `<?`/`?>`.
    ProcessingInstruction(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attribute names and their escaped values, in document order.
    attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

fn utf8(bytes: Cow<'_, [u8]>) -> Result<String> {
    String::from_utf8(bytes.into_owned()).or_raise(|| ErrorKind::Parse("invalid UTF-8".to_string()))
}

fn unescaped(raw: &str) -> String {
    // Entities declared in a DTD (`&nbsp;` and friends) are not known to the
    // unescaper; keep them verbatim rather than failing.
    unescape(raw).map(Cow::into_owned).unwrap_or_else(|_| raw.to_string())
}

/// Collapses whitespace runs into single spaces and trims both ends.
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attributes: Vec::new(), children: Vec::new() }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// Parses a single document element (no preamble) into a tree.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        loop {
            let event = reader
                .read_event()
                .or_raise(|| ErrorKind::Parse(format!("error at position {}", reader.buffer_position())))?;
            match event {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => Self::attach(&mut stack, &mut root, Self::from_start(&start)?)?,
                Event::End(_) => {
                    let element = stack.pop().ok_or_raise(|| ErrorKind::Parse("unexpected closing tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, element)?;
                },
                Event::Text(text) => {
                    let text = utf8(text.into_inner())?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Text(text)),
                        None if text.trim().is_empty() => {},
                        None => exn::bail!(ErrorKind::Parse("text outside of the root element".to_string())),
                    }
                },
                Event::CData(data) => {
                    let data = utf8(data.into_inner())?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::CData(data)),
                        None => exn::bail!(ErrorKind::Parse("CDATA outside of the root element".to_string())),
                    }
                },
                // Comments and processing instructions outside the root element
                // belong to the preamble, which is handled separately.
                Event::Comment(comment) => {
                    let comment = utf8(comment.into_inner())?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Comment(comment));
                    }
                },
                Event::PI(instruction) => {
                    let instruction = utf8(instruction.into_inner())?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::ProcessingInstruction(instruction));
                    }
                },
                Event::Decl(_) | Event::DocType(_) => {},
                Event::Eof => break,
            }
        }
        if let Some(unclosed) = stack.last() {
            exn::bail!(ErrorKind::Parse(format!("unclosed element <{}>", unclosed.name)));
        }
        root.ok_or_raise(|| ErrorKind::Parse("no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self::new(utf8(Cow::Borrowed(start.name().as_ref()))?);
        for attribute in start.attributes() {
            let attribute = attribute.or_raise(|| ErrorKind::Parse(format!("bad attribute on <{}>", element.name)))?;
            let key = utf8(Cow::Borrowed(attribute.key.as_ref()))?;
            element.attributes.push((key, utf8(attribute.value)?));
        }
        Ok(element)
    }

    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None if root.is_none() => *root = Some(element),
            None => exn::bail!(ErrorKind::Parse("multiple root elements".to_string())),
        }
        Ok(())
    }

    /// Returns the unescaped value of an attribute.
    pub fn attr(&self, key: &str) -> Option<String> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| unescaped(v))
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: &str) {
        let key = key.into();
        let value = escape(value).into_owned();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.elements().filter(move |element| element.name == name)
    }

    /// Follows a `/`-separated path of child element names, taking the first
    /// match at each step.
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/').try_fold(self, |element, step| element.elements_named(step).next())
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Element> {
        path.split('/').try_fold(self, |element, step| element.elements_mut().find(|child| child.name == step))
    }

    /// Every element matching a `/`-separated path of child element names.
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a Element> {
        path.split('/').fold(vec![self], |found, step| {
            found.into_iter().flat_map(|element| element.elements_named(step)).collect()
        })
    }

    /// Every descendant element (depth-first, document order) with the given name.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        for child in self.elements() {
            if child.name == name {
                found.push(child);
            }
            found.extend(child.descendants_named(name));
        }
        found
    }

    /// All character data inside this element, unescaped and concatenated.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, text: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(raw) => text.push_str(&unescaped(raw)),
                Node::CData(data) => text.push_str(data),
                Node::Element(element) => element.collect_text(text),
                Node::Comment(_) | Node::ProcessingInstruction(_) => {},
            }
        }
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(escape(text).into_owned())];
    }

    pub fn insert(&mut self, index: usize, element: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(element));
    }

    /// Serializes the element (and its descendants) back to XML text.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        self.write(&mut xml);
        xml
    }

    fn write(&self, xml: &mut String) {
        xml.push('<');
        xml.push_str(&self.name);
        for (key, value) in &self.attributes {
            xml.push(' ');
            xml.push_str(key);
            xml.push_str("=\"");
            // Values read from single-quoted attributes may contain bare double quotes.
            xml.push_str(&value.replace('"', "&quot;"));
            xml.push('"');
        }
        if self.children.is_empty() {
            xml.push_str("/>");
            return;
        }
        xml.push('>');
        for node in &self.children {
            match node {
                Node::Element(element) => element.write(xml),
                Node::Text(raw) => xml.push_str(raw),
                Node::CData(data) => {
                    xml.push_str("<![CDATA[");
                    xml.push_str(data);
                    xml.push_str("]]>");
                },
                Node::Comment(comment) => {
                    xml.push_str("<!--");
                    xml.push_str(comment);
                    xml.push_str("-->");
                },
                Node::ProcessingInstruction(instruction) => {
                    xml.push_str("<?");
                    xml.push_str(instruction);
                    xml.push_str("?>");
                },
            }
        }
        xml.push_str("</");
        xml.push_str(&self.name);
        xml.push('>');
    }
}
