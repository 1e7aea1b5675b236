//! Byte-level format handle.
//!
//! [`Feb`] ties the tree adapter, builder and emitter together behind the
//! [`ModelFormat`] seam. It borrows a [`TypeRegistry`] so many handles (and
//! many threads) can share one registry.

use rayon::prelude::*;
use tracing::debug;

use crate::builder::build;
use crate::emit::emit;
use crate::error::{AtLocator, BuildError, FebError, Locator};
use crate::model::Model;
use crate::options::Options;
use crate::registry::TypeRegistry;
use crate::tree::{self, Document};

/// Trait for model interchange formats.
pub trait ModelFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format.
    fn extensions(&self) -> &'static [&'static str];

    /// Read a model from bytes.
    fn read(&self, input: &[u8]) -> Result<Model, BuildError>;

    /// Write a model to bytes.
    fn write(&self, model: &Model) -> Result<Vec<u8>, BuildError>;

    /// Check that the input is well-formed for this format without building
    /// a model.
    fn validate(&self, input: &[u8]) -> Result<(), BuildError> {
        let _ = input;
        Ok(())
    }
}

/// The FEBio `.feb` format.
#[derive(Debug, Clone)]
pub struct Feb<'r> {
    registry: &'r TypeRegistry,
    options: Options,
}

impl<'r> Feb<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_options(registry, Options::default())
    }

    pub fn with_options(registry: &'r TypeRegistry, options: Options) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Parse and build a model from text.
    pub fn read_str(&self, text: &str) -> Result<Model, BuildError> {
        let document = tree::parse(text).at(&Locator::document())?;
        let model = build(&document, self.registry, &self.options.build)?;
        debug!(
            materials = model.materials.len(),
            sections = model.layout.len(),
            "built model"
        );
        Ok(model)
    }

    /// Emit and render a model to text.
    pub fn write_string(&self, model: &Model) -> Result<String, BuildError> {
        let document = emit(model, self.registry)?;
        self.render(&document)
    }

    pub fn render(&self, document: &Document) -> Result<String, BuildError> {
        tree::render(document, &self.options.render).at(&Locator::document())
    }

    /// Build independent documents in parallel; results keep input order.
    pub fn read_many<I>(&self, inputs: &[I]) -> Vec<Result<Model, BuildError>>
    where
        I: AsRef<[u8]> + Sync,
    {
        debug!(documents = inputs.len(), "building documents in parallel");
        inputs
            .par_iter()
            .map(|input| self.read(input.as_ref()))
            .collect()
    }

    fn encoding(&self) -> &str {
        &self.options.render.encoding
    }
}

impl ModelFormat for Feb<'_> {
    fn name(&self) -> &'static str {
        "FEBio"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["feb"]
    }

    fn read(&self, input: &[u8]) -> Result<Model, BuildError> {
        self.read_str(&decode_text(input))
    }

    fn write(&self, model: &Model) -> Result<Vec<u8>, BuildError> {
        let text = self.write_string(model)?;
        encode_text(&text, self.encoding()).at(&Locator::document())
    }

    fn validate(&self, input: &[u8]) -> Result<(), BuildError> {
        let document = tree::parse(&decode_text(input)).at(&Locator::document())?;
        if document.root.name != "febio_spec" {
            return Err(FebError::missing_element("febio_spec"))
                .at(&Locator::document().child(&document.root.name));
        }
        document
            .root
            .required_attr("version")
            .map(|_| ())
            .at(&Locator::root())
    }
}

fn is_latin1(label: &str) -> bool {
    ["ISO-8859-1", "ISO8859-1", "latin1", "latin-1"]
        .iter()
        .any(|l| l.eq_ignore_ascii_case(label))
}

/// UTF-8 when valid, otherwise each byte is taken as a Latin-1 character.
fn decode_text(input: &[u8]) -> std::borrow::Cow<'_, str> {
    match std::str::from_utf8(input) {
        Ok(text) => std::borrow::Cow::Borrowed(text),
        Err(_) => {
            debug!("input is not UTF-8, decoding as ISO-8859-1");
            std::borrow::Cow::Owned(input.iter().map(|&b| char::from(b)).collect())
        }
    }
}

fn encode_text(text: &str, label: &str) -> Result<Vec<u8>, FebError> {
    if !is_latin1(label) {
        return Ok(text.as_bytes().to_vec());
    }
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                FebError::invalid(
                    "encoding",
                    c.to_string(),
                    format!("character not representable in {label}"),
                )
            })
        })
        .collect()
}
