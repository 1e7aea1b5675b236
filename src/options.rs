//! Build and render options

use serde::{Deserialize, Serialize};

use crate::error::FebError;

/// Options for the collect/resolve pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Require node ids and element ids to be unique across all groups,
    /// not only within their owning group.
    pub strict_global_ids: bool,
    /// Check that every node id used by elements, faces and node sets is
    /// defined by some Nodes group.
    pub check_node_references: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strict_global_ids: false,
            check_node_references: true,
        }
    }
}

/// Indentation character for rendered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indent {
    Tab,
    Space,
}

/// Options for rendering a document tree to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub indent: Indent,
    /// Number of indent characters per nesting level
    pub indent_width: usize,
    /// Encoding label written in the XML declaration when the document
    /// does not carry its own.
    pub encoding: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: Indent::Tab,
            indent_width: 1,
            encoding: "ISO-8859-1".to_string(),
        }
    }
}

impl RenderOptions {
    pub fn indent_char(&self) -> u8 {
        match self.indent {
            Indent::Tab => b'\t',
            Indent::Space => b' ',
        }
    }
}

/// All options of a [`Feb`](crate::Feb) format handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub build: BuildOptions,
    pub render: RenderOptions,
}

impl Options {
    /// Load options from JSON. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, FebError> {
        serde_json::from_str(text).map_err(|e| FebError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, FebError> {
        serde_json::to_string_pretty(self).map_err(|e| FebError::Config(e.to_string()))
    }
}
