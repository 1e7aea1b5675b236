//! Reference resolution.
//!
//! [`SymbolTables::collect`] indexes every named or numbered entity of a
//! [`Draft`] and rejects same-category collisions. [`resolve`] then binds
//! each reference site to a [`Handle`] and moves the draft's entities into a
//! [`Model`] without creating any.
//!
//! | Reference site                     | Table              |
//! |------------------------------------|--------------------|
//! | domain `name`                      | elements groups    |
//! | domain `mat`                       | materials by name  |
//! | bc `node_set`                      | node sets          |
//! | bc `node_set="@surface:NAME"`      | surfaces           |
//! | surface load `surface`             | surfaces           |
//! | any scaled field `lc`, `dtmax lc`  | load controllers   |

use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::builder::Draft;
use crate::codec::FebEnum;
use crate::error::{AtLocator, BuildError, Category, FebError, Locator};
use crate::model::{
    BoundaryCondition, DomainAssignment, ElementsGroup, Handle, LoadController, Material, Mesh,
    Model, NodeSet, NodeTarget, NodesGroup, SURFACE_PREFIX, Surface, SurfaceLoad,
};
use crate::options::BuildOptions;
use crate::registry::{ControllerRef, Params};

/// Per-category lookup tables built from a [`Draft`].
#[derive(Debug, Default)]
pub struct SymbolTables {
    nodes_groups: FxHashMap<String, Handle<NodesGroup>>,
    elements_groups: FxHashMap<String, Handle<ElementsGroup>>,
    node_sets: FxHashMap<String, Handle<NodeSet>>,
    surfaces: FxHashMap<String, Handle<Surface>>,
    materials: FxHashMap<String, Handle<Material>>,
    material_ids: FxHashMap<u32, Handle<Material>>,
    load_controllers: FxHashMap<u32, Handle<LoadController>>,
    node_ids: FxHashSet<u32>,
}

fn declare<K, T>(
    table: &mut FxHashMap<K, Handle<T>>,
    key: K,
    index: usize,
    category: Category,
    locator: &Locator,
) -> Result<(), BuildError>
where
    K: Hash + Eq + Display,
{
    match table.entry(key) {
        Entry::Occupied(entry) => Err(BuildError::new(
            locator.clone(),
            FebError::duplicate(category, entry.key()),
        )),
        Entry::Vacant(entry) => {
            entry.insert(Handle::new(index));
            Ok(())
        }
    }
}

impl SymbolTables {
    /// Index every named entity of the draft.
    pub fn collect(draft: &Draft, options: &BuildOptions) -> Result<Self, BuildError> {
        let mut tables = Self::default();
        let mesh = Locator::root().child("Mesh");

        for (index, group) in draft.mesh.nodes.iter().enumerate() {
            let at = mesh.entity("Nodes", "name", &group.name);
            declare(&mut tables.nodes_groups, group.name.clone(), index, Category::NodesGroup, &at)?;

            let mut local = FxHashSet::default();
            for node in &group.nodes {
                let fresh_local = local.insert(node.id);
                let fresh_global = tables.node_ids.insert(node.id);
                if !fresh_local || (options.strict_global_ids && !fresh_global) {
                    return Err(BuildError::new(
                        at.entity("node", "id", node.id),
                        FebError::duplicate(Category::Node, node.id),
                    ));
                }
            }
        }

        let mut element_ids = FxHashSet::default();
        for (index, group) in draft.mesh.elements.iter().enumerate() {
            let at = mesh.entity("Elements", "name", &group.name);
            declare(
                &mut tables.elements_groups,
                group.name.clone(),
                index,
                Category::ElementsGroup,
                &at,
            )?;

            let mut local = FxHashSet::default();
            for element in &group.elements {
                let fresh_local = local.insert(element.id);
                let fresh_global = element_ids.insert(element.id);
                if !fresh_local || (options.strict_global_ids && !fresh_global) {
                    return Err(BuildError::new(
                        at.entity("elem", "id", element.id),
                        FebError::duplicate(Category::Element, element.id),
                    ));
                }
            }
        }

        for (index, set) in draft.mesh.node_sets.iter().enumerate() {
            let at = mesh.entity("NodeSet", "name", &set.name);
            declare(&mut tables.node_sets, set.name.clone(), index, Category::NodeSet, &at)?;
        }

        for (index, surface) in draft.mesh.surfaces.iter().enumerate() {
            let at = mesh.entity("Surface", "name", &surface.name);
            declare(&mut tables.surfaces, surface.name.clone(), index, Category::Surface, &at)?;
        }

        for (index, pending) in draft.materials.iter().enumerate() {
            let material = &pending.entity;
            declare(
                &mut tables.materials,
                material.name.clone(),
                index,
                Category::Material,
                &pending.locator,
            )?;
            declare(
                &mut tables.material_ids,
                material.id,
                index,
                Category::Material,
                &pending.locator,
            )?;
        }

        for (index, pending) in draft.load_controllers.iter().enumerate() {
            declare(
                &mut tables.load_controllers,
                pending.entity.id,
                index,
                Category::LoadController,
                &pending.locator,
            )?;
        }

        debug!(
            nodes = tables.node_ids.len(),
            elements_groups = tables.elements_groups.len(),
            surfaces = tables.surfaces.len(),
            materials = tables.materials.len(),
            load_controllers = tables.load_controllers.len(),
            "collected symbol tables"
        );
        Ok(tables)
    }

    pub fn nodes_group(&self, name: &str) -> Result<Handle<NodesGroup>, FebError> {
        lookup(&self.nodes_groups, name, Category::NodesGroup)
    }

    pub fn elements_group(&self, name: &str) -> Result<Handle<ElementsGroup>, FebError> {
        lookup(&self.elements_groups, name, Category::ElementsGroup)
    }

    pub fn node_set(&self, name: &str) -> Result<Handle<NodeSet>, FebError> {
        lookup(&self.node_sets, name, Category::NodeSet)
    }

    pub fn surface(&self, name: &str) -> Result<Handle<Surface>, FebError> {
        lookup(&self.surfaces, name, Category::Surface)
    }

    pub fn material(&self, name: &str) -> Result<Handle<Material>, FebError> {
        lookup(&self.materials, name, Category::Material)
    }

    pub fn material_with_id(&self, id: u32) -> Result<Handle<Material>, FebError> {
        lookup(&self.material_ids, &id, Category::Material)
    }

    pub fn load_controller(&self, id: u32) -> Result<Handle<LoadController>, FebError> {
        lookup(&self.load_controllers, &id, Category::LoadController)
    }

    pub fn has_node(&self, id: u32) -> bool {
        self.node_ids.contains(&id)
    }
}

fn lookup<K, Q, T>(
    table: &FxHashMap<K, Handle<T>>,
    key: &Q,
    category: Category,
) -> Result<Handle<T>, FebError>
where
    K: Hash + Eq + std::borrow::Borrow<Q>,
    Q: Hash + Eq + Display + ?Sized,
{
    table
        .get(key)
        .copied()
        .ok_or_else(|| FebError::dangling(category, key))
}

/// Bind every reference of the draft and move its entities into a [`Model`].
pub fn resolve(
    draft: Draft,
    tables: &SymbolTables,
    options: &BuildOptions,
) -> Result<Model, BuildError> {
    if options.check_node_references {
        check_node_references(&draft.mesh, tables)?;
    }

    let Draft {
        version,
        attributes,
        module,
        mut control,
        dtmax_controller,
        globals,
        materials,
        mesh,
        domains,
        boundary_conditions,
        surface_loads,
        extra_loads,
        opaque_controller_refs,
        load_controllers,
        output,
        extra_sections,
        layout,
    } = draft;

    let materials = materials
        .into_iter()
        .map(|mut pending| {
            bind_controllers(
                &mut pending.entity.params,
                &pending.controller_refs,
                tables,
                &pending.locator,
            )?;
            Ok(pending.entity)
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let load_controllers = load_controllers
        .into_iter()
        .map(|mut pending| {
            bind_controllers(
                &mut pending.entity.params,
                &pending.controller_refs,
                tables,
                &pending.locator,
            )?;
            Ok(pending.entity)
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let mut assigned = FxHashSet::default();
    let mut bound_domains = Vec::with_capacity(domains.len());
    for domain in domains {
        let elements = tables.elements_group(&domain.elements).at(&domain.locator)?;
        if !assigned.insert(elements) {
            return Err(BuildError::new(
                domain.locator,
                FebError::duplicate(Category::DomainAssignment, &domain.elements),
            ));
        }
        let material = tables.material(&domain.material).at(&domain.locator)?;
        trace!(elements = %domain.elements, material = %domain.material, "bound domain");
        bound_domains.push(DomainAssignment {
            kind: domain.kind,
            elements,
            material,
            attributes: domain.attributes,
            children: domain.children,
        });
    }

    let mut bound_conditions = Vec::with_capacity(boundary_conditions.len());
    for mut bc in boundary_conditions {
        let target = bc
            .node_set
            .as_deref()
            .map(|raw| resolve_target(raw, tables, &mesh))
            .transpose()
            .at(&bc.locator)?;
        bind_controllers(
            &mut bc.decoded.params,
            &bc.decoded.controller_refs,
            tables,
            &bc.locator,
        )?;
        bound_conditions.push(BoundaryCondition {
            name: bc.name,
            kind: bc.kind,
            target,
            params: bc.decoded.params,
            attributes: bc.attributes,
        });
    }

    let mut bound_loads = Vec::with_capacity(surface_loads.len());
    for mut load in surface_loads {
        let surface = tables.surface(&load.surface).at(&load.locator)?;
        trace!(surface = %load.surface, "bound surface load");
        bind_controllers(
            &mut load.decoded.params,
            &load.decoded.controller_refs,
            tables,
            &load.locator,
        )?;
        bound_loads.push(SurfaceLoad {
            name: load.name,
            kind: load.kind,
            surface,
            params: load.decoded.params,
            attributes: load.attributes,
        });
    }

    for (id, locator) in &opaque_controller_refs {
        tables.load_controller(*id).at(locator)?;
    }

    if let Some((id, locator)) = dtmax_controller {
        let handle = tables.load_controller(id).at(&locator)?;
        if let Some(dtmax) = control
            .as_mut()
            .and_then(|c| c.time_stepper.as_mut())
            .and_then(|t| t.dtmax.as_mut())
        {
            dtmax.controller = Some(handle);
        }
    }

    debug!(
        domains = bound_domains.len(),
        boundary_conditions = bound_conditions.len(),
        surface_loads = bound_loads.len(),
        "resolved references"
    );

    Ok(Model {
        version,
        attributes,
        module,
        control,
        globals,
        materials,
        mesh,
        domains: bound_domains,
        boundary_conditions: bound_conditions,
        surface_loads: bound_loads,
        extra_loads,
        load_controllers,
        output,
        extra_sections,
        layout,
    })
}

/// Resolve a `node_set` attribute: a bare node-set name or `@surface:NAME`.
pub fn resolve_target(
    raw: &str,
    tables: &SymbolTables,
    mesh: &Mesh,
) -> Result<NodeTarget, FebError> {
    match raw.strip_prefix(SURFACE_PREFIX) {
        Some(name) => {
            let surface = tables.surface(name)?;
            trace!(surface = name, "bound surface node target");
            NodeTarget::surface(mesh, surface)
        }
        None => {
            let set = tables.node_set(raw)?;
            trace!(node_set = raw, "bound node set target");
            Ok(NodeTarget::NodeSet(set))
        }
    }
}

fn bind_controllers(
    params: &mut Params,
    refs: &[ControllerRef],
    tables: &SymbolTables,
    locator: &Locator,
) -> Result<(), BuildError> {
    for reference in refs {
        let handle = tables.load_controller(reference.id).at(locator)?;
        if let Some(scaled) = params.scaled_at_mut(reference.param) {
            scaled.controller = Some(handle);
            trace!(%locator, id = reference.id, "bound load controller");
        }
    }
    Ok(())
}

fn check_node_references(mesh: &Mesh, tables: &SymbolTables) -> Result<(), BuildError> {
    let locator = Locator::root().child("Mesh");
    let missing = |ids: &[u32]| ids.iter().copied().find(|id| !tables.has_node(*id));

    for group in &mesh.elements {
        for element in &group.elements {
            if let Some(id) = missing(&element.nodes) {
                return Err(BuildError::new(
                    locator
                        .entity("Elements", "name", &group.name)
                        .entity("elem", "id", element.id),
                    FebError::dangling(Category::Node, id),
                ));
            }
        }
    }
    for set in &mesh.node_sets {
        if let Some(id) = missing(&set.nodes) {
            return Err(BuildError::new(
                locator.entity("NodeSet", "name", &set.name),
                FebError::dangling(Category::Node, id),
            ));
        }
    }
    for surface in &mesh.surfaces {
        for face in &surface.faces {
            if let Some(id) = missing(&face.nodes) {
                return Err(BuildError::new(
                    locator
                        .entity("Surface", "name", &surface.name)
                        .entity(face.shape.as_str(), "id", face.id),
                    FebError::dangling(Category::Node, id),
                ));
            }
        }
    }
    Ok(())
}
