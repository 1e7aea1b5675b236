//! Error types for document parsing, reference resolution and emission.
//!
//! [`FebError`] names the individual fault. [`BuildError`] wraps the first
//! fault of a build or emit together with a [`Locator`] pointing at the
//! section and entity where it happened.

use std::fmt;

use thiserror::Error;

/// Entity categories that own names or ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    NodesGroup,
    Node,
    ElementsGroup,
    Element,
    NodeSet,
    Surface,
    Material,
    DomainAssignment,
    BoundaryCondition,
    SurfaceLoad,
    LoadController,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NodesGroup => "nodes group",
            Category::Node => "node",
            Category::ElementsGroup => "elements group",
            Category::Element => "element",
            Category::NodeSet => "node set",
            Category::Surface => "surface",
            Category::Material => "material",
            Category::DomainAssignment => "domain assignment",
            Category::BoundaryCondition => "boundary condition",
            Category::SurfaceLoad => "surface load",
            Category::LoadController => "load controller",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while translating between documents and models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FebError {
    /// The text is not well-formed markup.
    #[error("malformed markup: {0}")]
    MalformedMarkup(String),

    /// A leaf value failed its codec.
    #[error("invalid value {value:?} for '{field}': {message}")]
    InvalidPrimitive {
        field: String,
        value: String,
        message: String,
    },

    /// A token outside the allowed set of an enumeration.
    #[error("unknown value {token:?} for '{field}'")]
    UnknownEnumValue { field: String, token: String },

    /// Missing required element, attribute or field.
    #[error("missing required {kind}: {name}")]
    Missing { kind: &'static str, name: String },

    /// Two entities of one category share a name or id.
    #[error("duplicate {category} '{name}'")]
    DuplicateName { category: Category, name: String },

    /// A name or id reference that no collected entity answers to.
    #[error("unresolved {category} reference '{name}'")]
    DanglingReference { category: Category, name: String },

    /// Configuration text could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FebError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMarkup(message.into())
    }

    pub fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidPrimitive {
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn unknown_token(field: impl Into<String>, token: impl Into<String>) -> Self {
        Self::UnknownEnumValue {
            field: field.into(),
            token: token.into(),
        }
    }

    pub fn missing_attribute(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "attribute",
            name: name.into(),
        }
    }

    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "field",
            name: name.into(),
        }
    }

    pub fn missing_element(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "element",
            name: name.into(),
        }
    }

    pub fn duplicate(category: Category, name: impl ToString) -> Self {
        Self::DuplicateName {
            category,
            name: name.to_string(),
        }
    }

    pub fn dangling(category: Category, name: impl ToString) -> Self {
        Self::DanglingReference {
            category,
            name: name.to_string(),
        }
    }
}

/// Path-like position of a fault inside a document,
/// e.g. `febio_spec/Mesh/Elements[name=Part1]/elem[id=3]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator(Vec<String>);

impl Locator {
    /// The whole document, before any element is known.
    pub fn document() -> Self {
        Self::default()
    }

    pub fn root() -> Self {
        Self(vec!["febio_spec".to_string()])
    }

    /// Extend with a plain section or tag name.
    pub fn child(&self, segment: &str) -> Self {
        let mut path = self.0.clone();
        path.push(segment.to_string());
        Self(path)
    }

    /// Extend with a tag qualified by its identifying attribute.
    pub fn entity(&self, tag: &str, key: &str, value: impl fmt::Display) -> Self {
        self.child(&format!("{tag}[{key}={value}]"))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("document");
        }
        f.write_str(&self.0.join("/"))
    }
}

/// The first fault of a build or emit, with its location.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{locator}: {cause}")]
pub struct BuildError {
    pub locator: Locator,
    #[source]
    pub cause: FebError,
}

impl BuildError {
    pub fn new(locator: Locator, cause: FebError) -> Self {
        Self { locator, cause }
    }

    pub fn cause(&self) -> &FebError {
        &self.cause
    }
}

/// Attach a locator to a bare [`FebError`] result.
pub(crate) trait AtLocator<T> {
    fn at(self, locator: &Locator) -> Result<T, BuildError>;
}

impl<T> AtLocator<T> for Result<T, FebError> {
    fn at(self, locator: &Locator) -> Result<T, BuildError> {
        self.map_err(|cause| BuildError::new(locator.clone(), cause))
    }
}
