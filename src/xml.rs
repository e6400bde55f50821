// MIT License - Copyright (c) 2026 Peter Wright
// Minimal XML element tree for SOAP replies

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, TotalConnectError};

/// An XML element with its namespace prefix stripped.
///
/// Attributes are dropped; SOAP replies from TC2 carry all data in
/// element text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a document and return its root element.
    pub fn parse(input: &str) -> Result<Self> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        // Sentinel holding the document's top-level elements
        let mut stack = vec![XmlNode::new("")];

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(XmlNode::new(local_name(&e))),
                Ok(Event::Empty(e)) => attach(&mut stack, XmlNode::new(local_name(&e)))?,
                Ok(Event::End(_)) => {
                    let node = stack.pop().ok_or_else(|| malformed("unbalanced end tag"))?;
                    attach(&mut stack, node)?;
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| malformed(&e.to_string()))?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(malformed(&format!(
                        "{e} at position {}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        if stack.len() != 1 {
            return Err(malformed("unclosed element"));
        }
        stack
            .pop()
            .and_then(|doc| doc.children.into_iter().next())
            .ok_or_else(|| malformed("empty document"))
    }

    /// Direct children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First descendant (depth-first, self excluded) with the given local name.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Text of the first descendant with the given name.
    pub fn find_text(&self, name: &str) -> Option<&str> {
        self.find(name).map(|n| n.text.as_str())
    }

    /// Text of a required direct child, parsed as an integer.
    pub fn child_i64(&self, name: &str) -> Result<i64> {
        let text = self
            .child(name)
            .map(|n| n.text.trim())
            .ok_or_else(|| missing(name, &self.name))?;
        text.parse().map_err(|_| TotalConnectError::InvalidResponse {
            details: format!("{name} is not an integer: {text:?}"),
        })
    }

    /// Text of a required direct child.
    pub fn child_text(&self, name: &str) -> Result<&str> {
        self.child(name)
            .map(|n| n.text.as_str())
            .ok_or_else(|| missing(name, &self.name))
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attach(stack: &mut [XmlNode], node: XmlNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None => Err(malformed("element outside document")),
    }
}

fn malformed(details: &str) -> TotalConnectError {
    TotalConnectError::InvalidResponse {
        details: format!("malformed XML: {details}"),
    }
}

fn missing(name: &str, parent: &str) -> TotalConnectError {
    TotalConnectError::InvalidResponse {
        details: format!("missing <{name}> in <{parent}>"),
    }
}
