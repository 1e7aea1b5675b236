//! Model to document tree.
//!
//! Every reference string is rebuilt from handles (`mat="..."`,
//! `node_set="@surface:..."`, `lc="..."`), so models assembled in code emit
//! the same way as parsed ones.

use crate::codec::{
    Channels, Codec, Enum, FebEnum, Id, IdList, Integer, OutputLevel, QnMethod, Real, Triple,
};
use crate::error::{AtLocator, BuildError, Category, FebError, Locator};
use crate::model::{
    BoundaryCondition, Constant, Control, DomainAssignment, ElementsGroup, Globals, Handle,
    LoadController, LogFile, LogRequest, Material, MeshPart, Model, NodeSet, NodeTarget,
    NodesGroup, Output, OutputEntry, SURFACE_PREFIX, Section, SolverSettings, Surface, SurfaceLoad,
    TimeStepper, arrange,
};
use crate::registry::{FieldCodec, FieldValue, Params, TypeRegistry};
use crate::tree::{Document, XmlNode};

/// Rebuild a document tree from a model.
pub fn emit(model: &Model, registry: &TypeRegistry) -> Result<Document, BuildError> {
    let emitter = Emitter { model, registry };
    let mut root = XmlNode::new("febio_spec").with_attr("version", model.version.as_str());
    root.attributes.extend(model.attributes.iter().cloned());

    for section in model.sections() {
        let node = emitter.section(section)?;
        root.children.push(node);
    }
    Ok(Document::new(root))
}

struct Emitter<'a> {
    model: &'a Model,
    registry: &'a TypeRegistry,
}

fn with_attrs(mut node: XmlNode, extra: &[(String, String)]) -> XmlNode {
    node.attributes.extend(extra.iter().cloned());
    node
}

fn text_leaf(name: &str, text: String) -> XmlNode {
    XmlNode::new(name).with_text(text)
}

impl Emitter<'_> {
    fn section(&self, section: Section) -> Result<XmlNode, BuildError> {
        let model = self.model;
        let tag = match section {
            Section::Opaque(index) => {
                return model
                    .extra_sections
                    .get(index)
                    .cloned()
                    .ok_or_else(|| FebError::missing_element(format!("section #{index}")))
                    .at(&Locator::root());
            }
            typed => typed.tag().unwrap_or_default(),
        };
        let locator = Locator::root().child(tag);
        let mut node = XmlNode::new(tag);

        match section {
            Section::Module => {
                if let Some(module) = &model.module {
                    node = with_attrs(node.with_attr("type", module.kind.as_str()), &module.attributes);
                }
            }
            Section::Control => {
                if let Some(control) = &model.control {
                    node.children = self.control(control, &locator)?;
                }
            }
            Section::Globals => {
                if let Some(globals) = &model.globals {
                    node.children = globals_children(globals);
                }
            }
            Section::Material => {
                for material in &model.materials {
                    node.children.push(self.material(material, &locator)?);
                }
            }
            Section::Mesh => node.children = self.mesh(&locator)?,
            Section::MeshDomains => {
                for domain in &model.domains {
                    node.children.push(self.domain(domain).at(&locator)?);
                }
            }
            Section::Boundary => {
                for bc in &model.boundary_conditions {
                    node.children.push(self.boundary(bc, &locator)?);
                }
            }
            Section::Loads => {
                for load in &model.surface_loads {
                    node.children.push(self.surface_load(load, &locator)?);
                }
                node.children.extend(model.extra_loads.iter().cloned());
            }
            Section::LoadData => {
                for controller in &model.load_controllers {
                    node.children.push(self.load_controller(controller, &locator)?);
                }
            }
            Section::Output => {
                if let Some(output) = &model.output {
                    node.children = output_children(output);
                }
            }
            Section::Opaque(_) => {}
        }
        Ok(node)
    }

    fn controller_id(&self, handle: Handle<LoadController>) -> Result<u32, FebError> {
        self.model
            .load_controller(handle)
            .map(|lc| lc.id)
            .ok_or_else(|| FebError::dangling(Category::LoadController, handle))
    }

    fn surface_name(&self, handle: Handle<Surface>) -> Result<&str, FebError> {
        self.model
            .surface(handle)
            .map(|s| s.name.as_str())
            .ok_or_else(|| FebError::dangling(Category::Surface, handle))
    }

    fn params(
        &self,
        category: Category,
        discriminant: &str,
        params: &Params,
    ) -> Result<Vec<XmlNode>, FebError> {
        self.registry
            .encode(category, discriminant, params, |h| self.controller_id(h))
    }

    fn material(&self, material: &Material, parent: &Locator) -> Result<XmlNode, BuildError> {
        let at = parent.entity("material", "id", material.id);
        let node = XmlNode::new("material")
            .with_attr("id", Id.encode(&material.id))
            .with_attr("name", material.name.as_str())
            .with_attr("type", material.kind.discriminant());
        let mut node = with_attrs(node, &material.attributes);
        node.children = self
            .params(Category::Material, material.kind.discriminant(), &material.params)
            .at(&at)?;
        Ok(node)
    }

    fn domain(&self, domain: &DomainAssignment) -> Result<XmlNode, FebError> {
        let elements = self
            .model
            .elements_group(domain.elements)
            .ok_or_else(|| FebError::dangling(Category::ElementsGroup, domain.elements))?;
        let material = self
            .model
            .material(domain.material)
            .ok_or_else(|| FebError::dangling(Category::Material, domain.material))?;

        let node = XmlNode::new(domain.kind.discriminant())
            .with_attr("name", elements.name.as_str())
            .with_attr("mat", material.name.as_str());
        let mut node = with_attrs(node, &domain.attributes);
        node.children = domain.children.clone();
        Ok(node)
    }

    fn target(&self, target: &NodeTarget) -> Result<String, FebError> {
        match target {
            NodeTarget::NodeSet(handle) => self
                .model
                .node_set(*handle)
                .map(|set| set.name.clone())
                .ok_or_else(|| FebError::dangling(Category::NodeSet, handle)),
            NodeTarget::Surface { surface, .. } => {
                Ok(format!("{SURFACE_PREFIX}{}", self.surface_name(*surface)?))
            }
        }
    }

    fn boundary(&self, bc: &BoundaryCondition, parent: &Locator) -> Result<XmlNode, BuildError> {
        let at = match &bc.name {
            Some(name) => parent.entity("bc", "name", name),
            None => parent.child("bc"),
        };
        let mut node = XmlNode::new("bc");
        if let Some(name) = &bc.name {
            node = node.with_attr("name", name.as_str());
        }
        node = node.with_attr("type", bc.kind.discriminant());
        if let Some(target) = &bc.target {
            node = node.with_attr("node_set", self.target(target).at(&at)?);
        }
        let mut node = with_attrs(node, &bc.attributes);
        node.children = self
            .params(Category::BoundaryCondition, bc.kind.discriminant(), &bc.params)
            .at(&at)?;
        Ok(node)
    }

    fn surface_load(&self, load: &SurfaceLoad, parent: &Locator) -> Result<XmlNode, BuildError> {
        let at = match &load.name {
            Some(name) => parent.entity("surface_load", "name", name),
            None => parent.child("surface_load"),
        };
        let mut node = XmlNode::new("surface_load");
        if let Some(name) = &load.name {
            node = node.with_attr("name", name.as_str());
        }
        node = node
            .with_attr("type", load.kind.discriminant())
            .with_attr("surface", self.surface_name(load.surface).at(&at)?);
        let mut node = with_attrs(node, &load.attributes);
        node.children = self
            .params(Category::SurfaceLoad, load.kind.discriminant(), &load.params)
            .at(&at)?;
        Ok(node)
    }

    fn load_controller(
        &self,
        controller: &LoadController,
        parent: &Locator,
    ) -> Result<XmlNode, BuildError> {
        let at = parent.entity("load_controller", "id", controller.id);
        let node = XmlNode::new("load_controller")
            .with_attr("id", Id.encode(&controller.id))
            .with_attr("type", controller.kind.discriminant());
        let mut node = with_attrs(node, &controller.attributes);
        node.children = self
            .params(Category::LoadController, controller.kind.discriminant(), &controller.params)
            .at(&at)?;
        Ok(node)
    }

    fn control(&self, control: &Control, locator: &Locator) -> Result<Vec<XmlNode>, BuildError> {
        let mut fields = vec![
            ("analysis", text_leaf("analysis", control.analysis.as_str().to_string())),
            ("time_steps", text_leaf("time_steps", Integer.encode(&control.time_steps))),
            ("step_size", text_leaf("step_size", Real.encode(&control.step_size))),
        ];
        if let Some(level) = control.output_level {
            let text = Enum::<OutputLevel>::new().encode(&level);
            fields.push(("output_level", text_leaf("output_level", text)));
        }
        if let Some(solver) = &control.solver {
            fields.push(("solver", solver_node(solver)));
        }
        if let Some(stepper) = &control.time_stepper {
            let at = locator.child("time_stepper");
            fields.push(("time_stepper", self.time_stepper(stepper).at(&at)?));
        }
        Ok(arrange(&control.layout, fields, &control.extras))
    }

    fn time_stepper(&self, stepper: &TimeStepper) -> Result<XmlNode, FebError> {
        let mut fields = Vec::new();
        if let Some(dtmin) = stepper.dtmin {
            fields.push(("dtmin", text_leaf("dtmin", Real.encode(&dtmin))));
        }
        if let Some(dtmax) = &stepper.dtmax {
            let lc = dtmax.controller.map(|h| self.controller_id(h)).transpose()?;
            let value = FieldValue::Scaled(dtmax.clone());
            fields.push(("dtmax", FieldCodec::Scaled.encode("dtmax", &value, lc)?));
        }
        if let Some(retries) = stepper.max_retries {
            fields.push(("max_retries", text_leaf("max_retries", Integer.encode(&retries))));
        }
        if let Some(opt_iter) = stepper.opt_iter {
            fields.push(("opt_iter", text_leaf("opt_iter", Integer.encode(&opt_iter))));
        }
        let mut node = with_attrs(XmlNode::new("time_stepper"), &stepper.attributes);
        node.children = arrange(&stepper.layout, fields, &stepper.extras);
        Ok(node)
    }

    // ------------------------------------------------------------------------
    // Mesh
    // ------------------------------------------------------------------------

    fn mesh(&self, locator: &Locator) -> Result<Vec<XmlNode>, BuildError> {
        let mesh = &self.model.mesh;
        mesh.parts()
            .into_iter()
            .map(|part| match part {
                MeshPart::Nodes(i) => Ok(nodes_node(&mesh.nodes[i])),
                MeshPart::Elements(i) => elements_node(&mesh.elements[i], locator),
                MeshPart::NodeSet(i) => Ok(node_set_node(&mesh.node_sets[i])),
                MeshPart::Surface(i) => surface_node(&mesh.surfaces[i], locator),
                MeshPart::Opaque(i) => Ok(mesh.extras[i].clone()),
            })
            .collect()
    }
}

fn nodes_node(group: &NodesGroup) -> XmlNode {
    let mut node = XmlNode::new("Nodes").with_attr("name", group.name.as_str());
    node.children = group
        .nodes
        .iter()
        .map(|n| {
            XmlNode::new("node")
                .with_attr("id", Id.encode(&n.id))
                .with_text(Triple.encode(&n.position))
        })
        .collect();
    node
}

fn connectivity(ids: &[u32], expected: usize, field: &str) -> Result<String, FebError> {
    let text = IdList::default().encode(&ids.to_vec());
    if ids.len() != expected {
        return Err(FebError::invalid(
            field,
            text,
            format!("expected {expected} ids, got {}", ids.len()),
        ));
    }
    Ok(text)
}

fn elements_node(group: &ElementsGroup, parent: &Locator) -> Result<XmlNode, BuildError> {
    let at = parent.entity("Elements", "name", &group.name);
    let node = XmlNode::new("Elements")
        .with_attr("type", group.shape.as_str())
        .with_attr("name", group.name.as_str());
    let mut node = with_attrs(node, &group.attributes);
    for element in &group.elements {
        let text = connectivity(&element.nodes, group.shape.node_count(), "elem")
            .at(&at.entity("elem", "id", element.id))?;
        node.children.push(
            XmlNode::new("elem")
                .with_attr("id", Id.encode(&element.id))
                .with_text(text),
        );
    }
    Ok(node)
}

fn node_set_node(set: &NodeSet) -> XmlNode {
    let mut node = XmlNode::new("NodeSet").with_attr("name", set.name.as_str());
    node.children = set
        .nodes
        .iter()
        .map(|id| XmlNode::new("node").with_attr("id", Id.encode(id)))
        .collect();
    node
}

fn surface_node(surface: &Surface, parent: &Locator) -> Result<XmlNode, BuildError> {
    let at = parent.entity("Surface", "name", &surface.name);
    let mut node = XmlNode::new("Surface").with_attr("name", surface.name.as_str());
    for face in &surface.faces {
        let tag = face.shape.as_str();
        let text = connectivity(&face.nodes, face.shape.node_count(), tag)
            .at(&at.entity(tag, "id", face.id))?;
        node.children.push(
            XmlNode::new(tag)
                .with_attr("id", Id.encode(&face.id))
                .with_text(text),
        );
    }
    Ok(node)
}

// ----------------------------------------------------------------------------
// Flat records
// ----------------------------------------------------------------------------

fn solver_node(solver: &SolverSettings) -> XmlNode {
    let reals = [
        ("etol", solver.etol),
        ("rtol", solver.rtol),
        ("lstol", solver.lstol),
        ("dtol", solver.dtol),
        ("min_residual", solver.min_residual),
        ("rhoi", solver.rhoi),
    ];
    let integers = [
        ("max_refs", solver.max_refs),
        ("max_ups", solver.max_ups),
        ("diverge_reform", solver.diverge_reform),
        ("reform_each_time_step", solver.reform_each_time_step),
    ];
    let mut fields: Vec<(&'static str, XmlNode)> = reals
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, text_leaf(name, Real.encode(&v)))))
        .chain(
            integers
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, text_leaf(name, Integer.encode(&v))))),
        )
        .collect();
    if let Some(method) = solver.qnmethod {
        let text = Enum::<QnMethod>::new().encode(&method);
        fields.push(("qnmethod", text_leaf("qnmethod", text)));
    }
    if let Some(symmetric) = solver.symmetric_stiffness {
        let text = Integer.encode(&symmetric);
        fields.push(("symmetric_stiffness", text_leaf("symmetric_stiffness", text)));
    }
    let mut node = with_attrs(XmlNode::new("solver"), &solver.attributes);
    node.children = arrange(&solver.layout, fields, &solver.extras);
    node
}

fn globals_children(globals: &Globals) -> Vec<XmlNode> {
    let mut fields = Vec::new();
    if let Some(constants) = &globals.constants {
        let mut node = with_attrs(XmlNode::new("Constants"), &constants.attributes);
        node.children = constants
            .entries
            .iter()
            .map(|entry| match entry {
                Constant::Value { name, value } => text_leaf(name, Real.encode(value)),
                Constant::Opaque(node) => node.clone(),
            })
            .collect();
        fields.push(("Constants", node));
    }
    arrange(&globals.layout, fields, &globals.extras)
}

fn output_children(output: &Output) -> Vec<XmlNode> {
    output
        .entries
        .iter()
        .map(|entry| match entry {
            OutputEntry::LogFile(log) => logfile_node(log),
            OutputEntry::Opaque(node) => node.clone(),
        })
        .collect()
}

fn logfile_node(log: &LogFile) -> XmlNode {
    let mut node = XmlNode::new("logfile");
    if let Some(file) = &log.file {
        node = node.with_attr("file", file.as_str());
    }
    let mut node = with_attrs(node, &log.attributes);
    node.children = log.requests.iter().map(log_request_node).collect();
    node
}

fn log_request_node(request: &LogRequest) -> XmlNode {
    let mut node = XmlNode::new(request.kind.tag()).with_attr("data", Channels.encode(&request.data));
    let optional = [
        ("name", &request.name),
        ("file", &request.file),
        ("delim", &request.delim),
        ("format", &request.format),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            node = node.with_attr(key, value.as_str());
        }
    }
    let mut node = with_attrs(node, &request.attributes);
    if !request.items.is_empty() {
        node.text = Some(IdList::default().encode(&request.items));
    }
    node
}
