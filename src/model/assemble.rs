//! Assembling a model from a mesher's linear tetrahedral output.
//!
//! A [`TetMesh`] carries 0-based vertex indices and one material id per
//! element. [`Model::add_tet_mesh`] turns it into a nodes group, one `tet4`
//! elements group per material in ascending id order, the materials the mesh
//! uses and a `SolidDomain` for each group.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{DomainAssignment, DomainKind, ElementsGroup, Handle, Material, Model, NodesGroup};
use crate::codec::ElementShape;
use crate::error::{Category, FebError};
use crate::model::{Element, Node};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TetMesh {
    pub vertices: Vec<[f64; 3]>,
    /// Vertex indices into `vertices`, from 0.
    pub elements: Vec<[usize; 4]>,
    /// Material id of each element.
    pub element_materials: Vec<u32>,
}

/// Split the mesh into one `tet4` group per material id used, in ascending
/// id order. Groups are named `Elements_<material name>`.
///
/// Node ids start at `first_node` and element ids at `first_element`, both
/// following vertex and element order.
pub fn group_elements_by_material(
    mesh: &TetMesh,
    materials: &[Material],
    first_node: u32,
    first_element: u32,
) -> Result<Vec<(u32, ElementsGroup)>, FebError> {
    if mesh.element_materials.len() != mesh.elements.len() {
        return Err(FebError::invalid(
            "element_materials",
            mesh.element_materials.len().to_string(),
            format!("expected one material id per element ({})", mesh.elements.len()),
        ));
    }

    let mut by_id = FxHashMap::default();
    for material in materials {
        if by_id.insert(material.id, material).is_some() {
            return Err(FebError::duplicate(Category::Material, material.id));
        }
    }

    let mut grouped: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, material) in mesh.element_materials.iter().enumerate() {
        grouped.entry(*material).or_default().push(index);
    }

    let mut next_element = first_element;
    let mut groups = Vec::with_capacity(grouped.len());
    for (material_id, members) in grouped {
        let material = by_id
            .get(&material_id)
            .ok_or_else(|| FebError::dangling(Category::Material, material_id))?;
        let name = format!("Elements_{}", material.name);
        let mut group = ElementsGroup::new(name, ElementShape::Tet4);
        for index in members {
            let nodes = mesh.elements[index]
                .iter()
                .map(|vertex| node_id(mesh, *vertex, first_node))
                .collect::<Result<Vec<_>, _>>()?;
            group.elements.push(Element {
                id: next_element,
                nodes,
            });
            next_element += 1;
        }
        groups.push((material_id, group));
    }
    Ok(groups)
}

fn node_id(mesh: &TetMesh, vertex: usize, first_node: u32) -> Result<u32, FebError> {
    if vertex >= mesh.vertices.len() {
        return Err(FebError::dangling(Category::Node, vertex));
    }
    u32::try_from(vertex)
        .ok()
        .and_then(|v| v.checked_add(first_node))
        .ok_or_else(|| {
            FebError::invalid("elements", vertex.to_string(), "vertex index overflows a node id")
        })
}

impl Model {
    /// Add a tetrahedral mesh together with the materials it uses.
    ///
    /// Materials no element refers to are left out. Node and element ids
    /// continue after the largest ids already in the model.
    pub fn add_tet_mesh(
        &mut self,
        mesh: &TetMesh,
        materials: Vec<Material>,
    ) -> Result<(), FebError> {
        let nodes = self.mesh.nodes.iter().flat_map(|g| &g.nodes);
        let first_node = nodes.map(|n| n.id).max().unwrap_or(0) + 1;
        let elements = self.mesh.elements.iter().flat_map(|g| &g.elements);
        let first_element = elements.map(|e| e.id).max().unwrap_or(0) + 1;
        let groups = group_elements_by_material(mesh, &materials, first_node, first_element)?;

        let mut used: Vec<Material> = materials
            .into_iter()
            .filter(|m| groups.iter().any(|(id, _)| *id == m.id))
            .collect();
        used.sort_by_key(|m| m.id);
        let handles: FxHashMap<u32, Handle<Material>> = used
            .into_iter()
            .map(|material| (material.id, self.add_material(material)))
            .collect();

        self.mesh.add_nodes(NodesGroup {
            name: "AllNodes".to_string(),
            nodes: mesh
                .vertices
                .iter()
                .zip(first_node..)
                .map(|(position, id)| Node {
                    id,
                    position: *position,
                })
                .collect(),
        });
        for (material_id, group) in groups {
            let material = handles
                .get(&material_id)
                .copied()
                .ok_or_else(|| FebError::dangling(Category::Material, material_id))?;
            let elements = self.mesh.add_elements(group);
            self.domains.push(DomainAssignment {
                kind: DomainKind::Solid,
                elements,
                material,
                attributes: Vec::new(),
                children: Vec::new(),
            });
        }
        debug!(
            nodes = mesh.vertices.len(),
            elements = mesh.elements.len(),
            domains = handles.len(),
            "added tet mesh"
        );
        Ok(())
    }
}
