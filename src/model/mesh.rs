//! Mesh geometry: nodes, elements, node sets and surfaces.

use rustc_hash::FxHashSet;

use super::Handle;
use crate::codec::{ElementShape, FaceShape};
use crate::tree::XmlNode;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: u32,
    pub position: [f64; 3],
}

/// Named `<Nodes>` block. Node ids are unique within the group.
#[derive(Debug, Clone, PartialEq)]
pub struct NodesGroup {
    pub name: String,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: u32,
    /// Node ids; length fixed by the group's shape.
    pub nodes: Vec<u32>,
}

/// Named `<Elements>` block of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementsGroup {
    pub name: String,
    pub shape: ElementShape,
    pub elements: Vec<Element>,
    /// Attributes other than `type` and `name`.
    pub attributes: Vec<(String, String)>,
}

impl ElementsGroup {
    pub fn new(name: impl Into<String>, shape: ElementShape) -> Self {
        Self {
            name: name.into(),
            shape,
            elements: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSet {
    pub name: String,
    pub nodes: Vec<u32>,
}

/// One surface facet; the shape is also its tag (`<tri3 id="1">`).
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub shape: FaceShape,
    pub id: u32,
    pub nodes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub name: String,
    pub faces: Vec<Face>,
}

impl Surface {
    /// Node ids spanned by the faces, first appearance first.
    pub fn unique_nodes(&self) -> Vec<u32> {
        let mut seen = FxHashSet::default();
        self.faces
            .iter()
            .flat_map(|face| face.nodes.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// A child of `<Mesh>`, in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshPart {
    Nodes(usize),
    Elements(usize),
    NodeSet(usize),
    Surface(usize),
    /// Index into [`Mesh::extras`].
    Opaque(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub nodes: Vec<NodesGroup>,
    pub elements: Vec<ElementsGroup>,
    pub node_sets: Vec<NodeSet>,
    pub surfaces: Vec<Surface>,
    /// Mesh children without a typed home (`Edge`, `ElementSet`, ...).
    pub extras: Vec<XmlNode>,
    pub layout: Vec<MeshPart>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.elements.is_empty()
            && self.node_sets.is_empty()
            && self.surfaces.is_empty()
            && self.extras.is_empty()
    }

    pub fn add_nodes(&mut self, group: NodesGroup) -> Handle<NodesGroup> {
        self.nodes.push(group);
        Handle::new(self.nodes.len() - 1)
    }

    pub fn add_elements(&mut self, group: ElementsGroup) -> Handle<ElementsGroup> {
        self.elements.push(group);
        Handle::new(self.elements.len() - 1)
    }

    pub fn add_node_set(&mut self, set: NodeSet) -> Handle<NodeSet> {
        self.node_sets.push(set);
        Handle::new(self.node_sets.len() - 1)
    }

    pub fn add_surface(&mut self, surface: Surface) -> Handle<Surface> {
        self.surfaces.push(surface);
        Handle::new(self.surfaces.len() - 1)
    }

    pub fn surface(&self, handle: Handle<Surface>) -> Option<&Surface> {
        self.surfaces.get(handle.index())
    }

    /// Parts to write: recorded layout first, then unrecorded parts in
    /// nodes, elements, node sets, surfaces, extras order.
    pub fn parts(&self) -> Vec<MeshPart> {
        let mut parts: Vec<MeshPart> = self
            .layout
            .iter()
            .copied()
            .filter(|p| self.contains(*p))
            .collect();
        let all = (0..self.nodes.len())
            .map(MeshPart::Nodes)
            .chain((0..self.elements.len()).map(MeshPart::Elements))
            .chain((0..self.node_sets.len()).map(MeshPart::NodeSet))
            .chain((0..self.surfaces.len()).map(MeshPart::Surface))
            .chain((0..self.extras.len()).map(MeshPart::Opaque));
        let recorded: FxHashSet<MeshPart> = parts.iter().copied().collect();
        parts.extend(all.filter(|p| !recorded.contains(p)));
        parts
    }

    fn contains(&self, part: MeshPart) -> bool {
        match part {
            MeshPart::Nodes(i) => i < self.nodes.len(),
            MeshPart::Elements(i) => i < self.elements.len(),
            MeshPart::NodeSet(i) => i < self.node_sets.len(),
            MeshPart::Surface(i) => i < self.surfaces.len(),
            MeshPart::Opaque(i) => i < self.extras.len(),
        }
    }
}
