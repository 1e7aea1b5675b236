//! # feb-base
//!
//! Typed model, reference resolution and lossless serialization for FEBio
//! `.feb` documents (`febio_spec` version 3.0).
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! format    → ModelFormat seam, Feb handle, parallel batch reads
//!   ↓
//! builder   → tree → Draft (collect)      emit → Model → tree
//!   ↓                                       ↑
//! resolver  → symbol tables, Draft → Model (resolve)
//!   ↓
//! registry  → discriminant → field schema, opaque passthrough
//!   ↓
//! model     → Model, Handle<T>, entities
//!   ↓
//! codec     → leaf codecs and closed enumerations
//!   ↓
//! tree      → text ⇄ ordered XmlNode tree
//!   ↓
//! error, options
//! ```
//!
//! ```no_run
//! use feb::{Feb, ModelFormat, TypeRegistry};
//!
//! let registry = TypeRegistry::febio();
//! let feb = Feb::new(&registry);
//! let bytes = std::fs::read("model.feb").unwrap();
//! let model = feb.read(&bytes).unwrap();
//! let out = feb.write(&model).unwrap();
//! # let _ = out;
//! ```

// ============================================================================
// MODULES (dependency order: error → tree → codec → model → registry → ...)
// ============================================================================

/// Error kinds, categories and locators
pub mod error;

/// Build and render options
pub mod options;

/// Document tree adapter over quick-xml
pub mod tree;

/// Primitive codecs and closed enumerations
pub mod codec;

/// Typed model: handles, mesh, entities, control
pub mod model;

/// Polymorphic type registry
pub mod registry;

/// Collect phase: document tree to draft
pub mod builder;

/// Symbol tables and resolve phase
pub mod resolver;

/// Model to document tree
pub mod emit;

/// Format handle and batch reads
pub mod format;

pub use builder::{Draft, build, read_document};
pub use emit::emit;
pub use error::{BuildError, Category, FebError, Locator};
pub use format::{Feb, ModelFormat};
pub use model::{Handle, Model, Section};
pub use options::{BuildOptions, Options, RenderOptions};
pub use registry::{FieldCodec, FieldSpec, FieldValue, Params, Scaled, Schema, TypeRegistry};
pub use resolver::{SymbolTables, resolve};
pub use tree::{Document, XmlNode};
