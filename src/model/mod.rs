//! Typed simulation model.
//!
//! A [`Model`] owns every entity of one document in flat arenas (`Vec`s).
//! Cross-entity relationships are [`Handle`]s into those arenas, bound by the
//! resolver after all named entities have been collected:
//!
//! ```text
//! Model
//! ├── materials: Vec<Material>            ◄── DomainAssignment.material
//! ├── mesh
//! │   ├── elements: Vec<ElementsGroup>    ◄── DomainAssignment.elements
//! │   ├── node_sets: Vec<NodeSet>         ◄── BoundaryCondition.target
//! │   └── surfaces: Vec<Surface>          ◄── SurfaceLoad.surface, "@surface:" targets
//! ├── load_controllers: Vec<LoadController> ◄── Scaled.controller
//! └── layout: Vec<Section>                (document order of sections)
//! ```

mod assemble;
mod control;
mod entities;
mod mesh;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use assemble::{TetMesh, group_elements_by_material};
pub(crate) use control::arrange;
pub use control::{
    Constant, Constants, Control, Globals, LogFile, LogKind, LogRequest, Module, Output,
    OutputEntry, Slot, SolverSettings, TimeStepper,
};
pub use entities::{
    BcType, BoundaryCondition, ControllerType, DomainAssignment, DomainKind, LoadController,
    Material, MaterialType, NodeTarget, SURFACE_PREFIX, SurfaceLoad, SurfaceLoadType,
};
pub use mesh::{Element, ElementsGroup, Face, Mesh, MeshPart, Node, NodeSet, NodesGroup, Surface};

use crate::tree::XmlNode;

// ============================================================================
// HANDLES
// ============================================================================

/// Typed index of an entity inside its owning arena.
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

/// A top-level section of the document, in the order it appeared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Module,
    Control,
    Globals,
    Material,
    Mesh,
    MeshDomains,
    Boundary,
    Loads,
    LoadData,
    Output,
    /// Index into [`Model::extra_sections`].
    Opaque(usize),
}

impl Section {
    /// Typed sections in FEBio's conventional order.
    pub const CANONICAL: [Section; 10] = [
        Section::Module,
        Section::Control,
        Section::Globals,
        Section::Material,
        Section::Mesh,
        Section::MeshDomains,
        Section::Boundary,
        Section::Loads,
        Section::LoadData,
        Section::Output,
    ];

    /// Tag name of a typed section; `None` for opaque sections.
    pub fn tag(&self) -> Option<&'static str> {
        Some(match self {
            Section::Module => "Module",
            Section::Control => "Control",
            Section::Globals => "Globals",
            Section::Material => "Material",
            Section::Mesh => "Mesh",
            Section::MeshDomains => "MeshDomains",
            Section::Boundary => "Boundary",
            Section::Loads => "Loads",
            Section::LoadData => "LoadData",
            Section::Output => "Output",
            Section::Opaque(_) => return None,
        })
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::CANONICAL.into_iter().find(|s| s.tag() == Some(tag))
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// Root aggregate of one simulation document.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// `febio_spec` version attribute.
    pub version: String,
    /// Root attributes other than `version`.
    pub attributes: Vec<(String, String)>,
    pub module: Option<Module>,
    pub control: Option<Control>,
    pub globals: Option<Globals>,
    pub materials: Vec<Material>,
    pub mesh: Mesh,
    pub domains: Vec<DomainAssignment>,
    pub boundary_conditions: Vec<BoundaryCondition>,
    pub surface_loads: Vec<SurfaceLoad>,
    /// Non-surface loads (`nodal_load`, `body_load`, ...), kept verbatim.
    pub extra_loads: Vec<XmlNode>,
    pub load_controllers: Vec<LoadController>,
    pub output: Option<Output>,
    /// Sections without a typed home, kept verbatim.
    pub extra_sections: Vec<XmlNode>,
    pub layout: Vec<Section>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            version: "3.0".to_string(),
            attributes: Vec::new(),
            module: None,
            control: None,
            globals: None,
            materials: Vec::new(),
            mesh: Mesh::default(),
            domains: Vec::new(),
            boundary_conditions: Vec::new(),
            surface_loads: Vec::new(),
            extra_loads: Vec::new(),
            load_controllers: Vec::new(),
            output: None,
            extra_sections: Vec::new(),
            layout: Vec::new(),
        }
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_material(&mut self, material: Material) -> Handle<Material> {
        self.materials.push(material);
        Handle::new(self.materials.len() - 1)
    }

    pub fn add_load_controller(&mut self, controller: LoadController) -> Handle<LoadController> {
        self.load_controllers.push(controller);
        Handle::new(self.load_controllers.len() - 1)
    }

    pub fn material(&self, handle: Handle<Material>) -> Option<&Material> {
        self.materials.get(handle.index())
    }

    pub fn material_named(&self, name: &str) -> Option<Handle<Material>> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(Handle::new)
    }

    pub fn load_controller(&self, handle: Handle<LoadController>) -> Option<&LoadController> {
        self.load_controllers.get(handle.index())
    }

    pub fn load_controller_with_id(&self, id: u32) -> Option<Handle<LoadController>> {
        self.load_controllers
            .iter()
            .position(|lc| lc.id == id)
            .map(Handle::new)
    }

    pub fn elements_group(&self, handle: Handle<ElementsGroup>) -> Option<&ElementsGroup> {
        self.mesh.elements.get(handle.index())
    }

    pub fn node_set(&self, handle: Handle<NodeSet>) -> Option<&NodeSet> {
        self.mesh.node_sets.get(handle.index())
    }

    pub fn surface(&self, handle: Handle<Surface>) -> Option<&Surface> {
        self.mesh.surfaces.get(handle.index())
    }

    fn has_section(&self, section: Section) -> bool {
        match section {
            Section::Module => self.module.is_some(),
            Section::Control => self.control.is_some(),
            Section::Globals => self.globals.is_some(),
            Section::Material => !self.materials.is_empty(),
            Section::Mesh => !self.mesh.is_empty(),
            Section::MeshDomains => !self.domains.is_empty(),
            Section::Boundary => !self.boundary_conditions.is_empty(),
            Section::Loads => !self.surface_loads.is_empty() || !self.extra_loads.is_empty(),
            Section::LoadData => !self.load_controllers.is_empty(),
            Section::Output => self.output.is_some(),
            Section::Opaque(index) => index < self.extra_sections.len(),
        }
    }

    /// Sections to write, in order: the recorded layout first, then any
    /// populated section the layout does not mention.
    ///
    /// Recorded collection sections are kept even when empty; recorded
    /// single-record sections are dropped once the record is gone.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = self
            .layout
            .iter()
            .copied()
            .filter(|s| match s {
                Section::Module | Section::Control | Section::Globals | Section::Output => {
                    self.has_section(*s)
                }
                Section::Opaque(index) => *index < self.extra_sections.len(),
                _ => true,
            })
            .collect();
        let missing: Vec<Section> = Section::CANONICAL
            .into_iter()
            .chain((0..self.extra_sections.len()).map(Section::Opaque))
            .filter(|s| self.has_section(*s) && !sections.contains(s))
            .collect();
        sections.extend(missing);
        sections
    }
}
