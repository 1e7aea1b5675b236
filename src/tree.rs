//! Document tree adapter.
//!
//! Converts markup text to an ordered tree of [`XmlNode`]s and back, with no
//! knowledge of the FEBio vocabulary. Element order, attribute order and
//! text content are preserved; comments and processing instructions are not.
//!
//! ```text
//! <Nodes name="AllNodes">              XmlNode { name: "Nodes",
//!   <node id="1">0,0,0</node>    ─►      attributes: [("name", "AllNodes")],
//! </Nodes>                               children: [XmlNode { name: "node", .. }] }
//! ```

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::FebError;
use crate::options::RenderOptions;

/// A parsed markup document: the declaration's encoding label and one root.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub encoding: Option<String>,
    pub root: XmlNode,
}

impl Document {
    pub fn new(root: XmlNode) -> Self {
        Self {
            encoding: None,
            root,
        }
    }
}

/// One element of the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn required_attr(&self, key: &str) -> Result<&str, FebError> {
        self.attr(key)
            .ok_or_else(|| FebError::missing_attribute(format!("{}@{}", self.name, key)))
    }

    /// Text content, or the empty string for elements without text.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Attributes other than the listed ones, in document order.
    pub fn attributes_except(&self, known: &[&str]) -> Vec<(String, String)> {
        self.attributes
            .iter()
            .filter(|(k, _)| !known.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    /// True for an element holding nothing but (possibly empty) text.
    pub fn is_leaf(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }
}

// ============================================================================
// PARSE
// ============================================================================

/// Parse markup text into a [`Document`].
pub fn parse(text: &str) -> Result<Document, FebError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut encoding = None;
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            FebError::malformed(format!("parse error at position {}: {e}", reader.error_position()))
        })?;

        match event {
            Event::Decl(decl) => {
                if let Some(label) = decl.encoding() {
                    let label = label.map_err(|e| FebError::malformed(format!("declaration: {e}")))?;
                    encoding = Some(String::from_utf8_lossy(&label).into_owned());
                }
            }
            Event::Start(start) => {
                stack.push(open_node(&start)?);
            }
            Event::Empty(start) => {
                let node = open_node(&start)?;
                attach(node, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| FebError::malformed("closing tag without an open element"))?;
                attach(node, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                let content = t
                    .unescape()
                    .map_err(|e| FebError::malformed(format!("text: {e}")))?;
                push_text(&content, &mut stack)?;
            }
            Event::CData(c) => {
                let content = std::str::from_utf8(&c)
                    .map_err(|e| FebError::malformed(format!("CDATA: {e}")))?
                    .to_string();
                push_text(&content, &mut stack)?;
            }
            Event::Eof => break,
            // Comments, processing instructions and doctypes carry no model data.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FebError::malformed(format!("unclosed element <{}>", open.name)));
    }
    let root = root.ok_or_else(|| FebError::malformed("document has no root element"))?;

    Ok(Document { encoding, root })
}

fn open_node(start: &BytesStart<'_>) -> Result<XmlNode, FebError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| FebError::malformed(format!("invalid tag name: {e}")))?
        .to_string();
    let mut node = XmlNode::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| FebError::malformed(format!("attribute error: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| FebError::malformed(format!("attribute key error: {e}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| FebError::malformed(format!("attribute value error: {e}")))?
            .into_owned();
        node.attributes.push((key, value));
    }

    Ok(node)
}

fn attach(
    node: XmlNode,
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
) -> Result<(), FebError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(FebError::malformed(format!(
            "second root element <{}>",
            node.name
        ))),
    }
}

fn push_text(content: &str, stack: &mut [XmlNode]) -> Result<(), FebError> {
    match stack.last_mut() {
        Some(node) => {
            node.text.get_or_insert_with(String::new).push_str(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(FebError::malformed("text outside the root element")),
    }
}

// ============================================================================
// RENDER
// ============================================================================

/// Render a [`Document`] to text.
pub fn render(document: &Document, options: &RenderOptions) -> Result<String, FebError> {
    let mut writer = Writer::new_with_indent(
        Cursor::new(Vec::new()),
        options.indent_char(),
        options.indent_width,
    );

    let encoding = document.encoding.as_deref().unwrap_or(&options.encoding);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some(encoding), None)))
        .map_err(write_error)?;

    write_node(&mut writer, &document.root)?;

    let mut output = writer.into_inner().into_inner();
    output.push(b'\n');
    String::from_utf8(output).map_err(|e| FebError::malformed(format!("rendered text: {e}")))
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<(), FebError> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = node.text.as_deref().filter(|t| !t.is_empty());
    if text.is_none() && node.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_error)?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(write_error)
}

fn write_error(e: impl std::fmt::Display) -> FebError {
    FebError::malformed(format!("write error: {e}"))
}
