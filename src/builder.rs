//! Collect phase: document tree to [`Draft`].
//!
//! Every section is read into typed entities. References between entities
//! stay as the raw strings and ids found in the document; the resolver binds
//! them once all named entities are known, so forward references are fine.

use tracing::debug;

use crate::codec::{
    AnalysisKind, Channels, Codec, ElementShape, Enum, FaceShape, Id, IdList, Integer, ModuleKind,
    OutputLevel, QnMethod, Real, Triple,
};
use crate::error::{AtLocator, BuildError, Category, FebError, Locator};
use crate::model::{
    BcType, Constant, Constants, Control, ControllerType, DomainKind, Element, ElementsGroup, Face,
    Globals, LoadController, LogFile, LogKind, LogRequest, Material, MaterialType, Mesh, MeshPart,
    Model, Module, Node, NodeSet, NodesGroup, Output, OutputEntry, Section, Slot, SolverSettings,
    Surface, SurfaceLoadType, TimeStepper,
};
use crate::options::BuildOptions;
use crate::registry::{ControllerRef, DecodedParams, FieldCodec, FieldValue, TypeRegistry};
use crate::resolver::{SymbolTables, resolve};
use crate::tree::{Document, XmlNode};

/// An entity whose own fields are final but whose load-controller ids are
/// still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending<T> {
    pub entity: T,
    pub controller_refs: Vec<ControllerRef>,
    pub locator: Locator,
}

/// `<SolidDomain name="Part1" mat="Material1"/>` before binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainDraft {
    pub kind: DomainKind,
    pub elements: String,
    pub material: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub locator: Locator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryDraft {
    pub name: Option<String>,
    pub kind: BcType,
    /// Raw `node_set` attribute: a node set name or `@surface:NAME`.
    pub node_set: Option<String>,
    pub decoded: DecodedParams,
    pub attributes: Vec<(String, String)>,
    pub locator: Locator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLoadDraft {
    pub name: Option<String>,
    pub kind: SurfaceLoadType,
    pub surface: String,
    pub decoded: DecodedParams,
    pub attributes: Vec<(String, String)>,
    pub locator: Locator,
}

/// Output of the collect phase.
///
/// Mesh, control, globals and output are final. Materials and load
/// controllers are final apart from controller ids in their scaled fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    pub version: String,
    pub attributes: Vec<(String, String)>,
    pub module: Option<Module>,
    pub control: Option<Control>,
    /// Raw `lc` of the time stepper's `dtmax`.
    pub dtmax_controller: Option<(u32, Locator)>,
    pub globals: Option<Globals>,
    pub materials: Vec<Pending<Material>>,
    pub mesh: Mesh,
    pub domains: Vec<DomainDraft>,
    pub boundary_conditions: Vec<BoundaryDraft>,
    pub surface_loads: Vec<SurfaceLoadDraft>,
    pub extra_loads: Vec<XmlNode>,
    /// `lc` ids found inside `extra_loads`; checked but never bound.
    pub opaque_controller_refs: Vec<(u32, Locator)>,
    pub load_controllers: Vec<Pending<LoadController>>,
    pub output: Option<Output>,
    pub extra_sections: Vec<XmlNode>,
    pub layout: Vec<Section>,
}

/// Build a fully resolved [`Model`] from a parsed document.
///
/// Fails on the first structural or reference fault.
pub fn build(
    document: &Document,
    registry: &TypeRegistry,
    options: &BuildOptions,
) -> Result<Model, BuildError> {
    let draft = read_document(document, registry)?;
    let tables = SymbolTables::collect(&draft, options)?;
    resolve(draft, &tables, options)
}

/// Read every section of the document into a [`Draft`].
pub fn read_document(document: &Document, registry: &TypeRegistry) -> Result<Draft, BuildError> {
    let root = &document.root;
    if root.name != "febio_spec" {
        return Err(BuildError::new(
            Locator::document().child(&root.name),
            FebError::missing_element("febio_spec"),
        ));
    }
    let locator = Locator::root();

    let mut reader = DraftReader {
        registry,
        draft: Draft {
            version: root.required_attr("version").at(&locator)?.to_string(),
            attributes: root.attributes_except(&["version"]),
            ..Draft::default()
        },
    };
    for section in &root.children {
        reader.section(section, &locator)?;
    }
    Ok(reader.draft)
}

struct DraftReader<'r> {
    registry: &'r TypeRegistry,
    draft: Draft,
}

impl DraftReader<'_> {
    fn section(&mut self, node: &XmlNode, parent: &Locator) -> Result<(), BuildError> {
        let locator = parent.child(&node.name);

        let Some(section) = Section::from_tag(&node.name) else {
            debug!(section = %node.name, "keeping unknown section opaque");
            self.draft
                .layout
                .push(Section::Opaque(self.draft.extra_sections.len()));
            self.draft.extra_sections.push(node.clone());
            return Ok(());
        };
        debug!(section = %node.name, "reading section");

        let repeated = self.draft.layout.contains(&section);
        if repeated && is_singleton(section) {
            return Err(BuildError::new(
                locator,
                FebError::malformed(format!("repeated <{}> section", node.name)),
            ));
        }
        if !repeated {
            self.draft.layout.push(section);
        }

        match section {
            Section::Module => self.draft.module = Some(read_module(node, &locator)?),
            Section::Control => {
                let (control, dtmax) = read_control(node, &locator)?;
                self.draft.control = Some(control);
                self.draft.dtmax_controller = dtmax;
            }
            Section::Globals => self.draft.globals = Some(read_globals(node, &locator)?),
            Section::Material => self.materials(node, &locator)?,
            Section::Mesh => read_mesh(node, &locator, &mut self.draft.mesh)?,
            Section::MeshDomains => self.domains(node, &locator)?,
            Section::Boundary => self.boundary(node, &locator)?,
            Section::Loads => self.loads(node, &locator)?,
            Section::LoadData => self.load_data(node, &locator)?,
            Section::Output => self.draft.output = Some(read_output(node, &locator)?),
            Section::Opaque(_) => {}
        }
        Ok(())
    }

    fn materials(&mut self, node: &XmlNode, locator: &Locator) -> Result<(), BuildError> {
        for (position, child) in node.children.iter().enumerate() {
            let at = entity_locator(locator, child, "id", position);
            expect_tag(child, "material", &node.name).at(&at)?;

            let id = Id.decode(child.required_attr("id").at(&at)?, "material@id").at(&at)?;
            let name = child.required_attr("name").at(&at)?.to_string();
            let kind = child.required_attr("type").at(&at)?;
            let decoded = self
                .registry
                .decode(Category::Material, kind, &child.children)
                .at(&at)?;

            let material = Material {
                id,
                name,
                kind: MaterialType::from_discriminant(kind),
                params: decoded.params,
                attributes: child.attributes_except(&["id", "name", "type"]),
            };
            self.draft.materials.push(Pending {
                entity: material,
                controller_refs: decoded.controller_refs,
                locator: at,
            });
        }
        debug!(count = self.draft.materials.len(), "read materials");
        Ok(())
    }

    fn domains(&mut self, node: &XmlNode, locator: &Locator) -> Result<(), BuildError> {
        for (position, child) in node.children.iter().enumerate() {
            let at = entity_locator(locator, child, "name", position);
            self.draft.domains.push(DomainDraft {
                kind: DomainKind::from_discriminant(&child.name),
                elements: child.required_attr("name").at(&at)?.to_string(),
                material: child.required_attr("mat").at(&at)?.to_string(),
                attributes: child.attributes_except(&["name", "mat"]),
                children: child.children.clone(),
                locator: at,
            });
        }
        Ok(())
    }

    fn boundary(&mut self, node: &XmlNode, locator: &Locator) -> Result<(), BuildError> {
        for (position, child) in node.children.iter().enumerate() {
            let at = entity_locator(locator, child, "name", position);
            expect_tag(child, "bc", &node.name).at(&at)?;

            let kind = child.required_attr("type").at(&at)?;
            let decoded = self
                .registry
                .decode(Category::BoundaryCondition, kind, &child.children)
                .at(&at)?;
            self.draft.boundary_conditions.push(BoundaryDraft {
                name: child.attr("name").map(str::to_string),
                kind: BcType::from_discriminant(kind),
                node_set: child.attr("node_set").map(str::to_string),
                decoded,
                attributes: child.attributes_except(&["name", "type", "node_set"]),
                locator: at,
            });
        }
        Ok(())
    }

    fn loads(&mut self, node: &XmlNode, locator: &Locator) -> Result<(), BuildError> {
        for (position, child) in node.children.iter().enumerate() {
            let at = entity_locator(locator, child, "name", position);
            if child.name != "surface_load" {
                debug!(load = %child.name, "keeping non-surface load opaque");
                collect_controller_ids(child, &at, &mut self.draft.opaque_controller_refs)?;
                self.draft.extra_loads.push(child.clone());
                continue;
            }

            let kind = child.required_attr("type").at(&at)?;
            let decoded = self
                .registry
                .decode(Category::SurfaceLoad, kind, &child.children)
                .at(&at)?;
            self.draft.surface_loads.push(SurfaceLoadDraft {
                name: child.attr("name").map(str::to_string),
                kind: SurfaceLoadType::from_discriminant(kind),
                surface: child.required_attr("surface").at(&at)?.to_string(),
                decoded,
                attributes: child.attributes_except(&["name", "type", "surface"]),
                locator: at,
            });
        }
        Ok(())
    }

    fn load_data(&mut self, node: &XmlNode, locator: &Locator) -> Result<(), BuildError> {
        for (position, child) in node.children.iter().enumerate() {
            let at = entity_locator(locator, child, "id", position);
            expect_tag(child, "load_controller", &node.name).at(&at)?;

            let id = Id
                .decode(child.required_attr("id").at(&at)?, "load_controller@id")
                .at(&at)?;
            let kind = child.required_attr("type").at(&at)?;
            let decoded = self
                .registry
                .decode(Category::LoadController, kind, &child.children)
                .at(&at)?;

            let controller = LoadController {
                id,
                kind: ControllerType::from_discriminant(kind),
                params: decoded.params,
                attributes: child.attributes_except(&["id", "type"]),
            };
            self.draft.load_controllers.push(Pending {
                entity: controller,
                controller_refs: decoded.controller_refs,
                locator: at,
            });
        }
        debug!(count = self.draft.load_controllers.len(), "read load controllers");
        Ok(())
    }
}

fn is_singleton(section: Section) -> bool {
    matches!(
        section,
        Section::Module | Section::Control | Section::Globals | Section::Output
    )
}

/// `tag[key=value]` when the attribute is present, `tag[n]` otherwise.
fn entity_locator(parent: &Locator, node: &XmlNode, key: &str, position: usize) -> Locator {
    match node.attr(key) {
        Some(value) => parent.entity(&node.name, key, value),
        None => parent.child(&format!("{}[{}]", node.name, position + 1)),
    }
}

/// Every `lc` attribute inside an element kept verbatim.
fn collect_controller_ids(
    node: &XmlNode,
    at: &Locator,
    found: &mut Vec<(u32, Locator)>,
) -> Result<(), BuildError> {
    if let Some(raw) = node.attr("lc") {
        found.push((Id.decode(raw, "lc").at(at)?, at.clone()));
    }
    for child in &node.children {
        collect_controller_ids(child, &at.child(&child.name), found)?;
    }
    Ok(())
}

fn expect_tag(node: &XmlNode, tag: &str, section: &str) -> Result<(), FebError> {
    if node.name == tag {
        Ok(())
    } else {
        Err(FebError::malformed(format!(
            "unexpected <{}> in <{section}>, expected <{tag}>",
            node.name
        )))
    }
}

fn leaf<C: Codec>(codec: C, node: &XmlNode, parent: &Locator) -> Result<C::Value, BuildError> {
    codec
        .decode(node.text(), &node.name)
        .at(&parent.child(&node.name))
}

// ============================================================================
// MODULE, CONTROL, GLOBALS
// ============================================================================

fn read_module(node: &XmlNode, locator: &Locator) -> Result<Module, BuildError> {
    let raw = node.required_attr("type").at(locator)?;
    Ok(Module {
        kind: Enum::<ModuleKind>::new().decode(raw, "Module@type").at(locator)?,
        attributes: node.attributes_except(&["type"]),
    })
}

fn read_control(
    node: &XmlNode,
    locator: &Locator,
) -> Result<(Control, Option<(u32, Locator)>), BuildError> {
    let mut analysis = None;
    let mut time_steps = None;
    let mut step_size = None;
    let mut output_level = None;
    let mut solver = None;
    let mut time_stepper = None;
    let mut dtmax_controller = None;
    let mut fields = Fields::default();

    for child in &node.children {
        let Some(tag) = fields.typed(child, CONTROL_FIELDS) else {
            continue;
        };
        match tag {
            "solver" => solver = Some(read_solver(child, &locator.child("solver"))?),
            "time_stepper" => {
                let at = locator.child("time_stepper");
                let (stepper, lc) = read_time_stepper(child, &at)?;
                time_stepper = Some(stepper);
                dtmax_controller = lc.map(|id| (id, at.child("dtmax")));
            }
            "analysis" => analysis = Some(leaf(Enum::<AnalysisKind>::new(), child, locator)?),
            "time_steps" => time_steps = Some(leaf(Integer, child, locator)?),
            "step_size" => step_size = Some(leaf(Real, child, locator)?),
            _ => output_level = Some(leaf(Enum::<OutputLevel>::new(), child, locator)?),
        }
    }

    let control = Control {
        analysis: analysis
            .ok_or_else(|| FebError::missing_element("analysis"))
            .at(locator)?,
        time_steps: time_steps
            .ok_or_else(|| FebError::missing_element("time_steps"))
            .at(locator)?,
        step_size: step_size
            .ok_or_else(|| FebError::missing_element("step_size"))
            .at(locator)?,
        output_level,
        solver,
        time_stepper,
        extras: fields.extras,
        layout: fields.layout,
    };
    Ok((control, dtmax_controller))
}

const CONTROL_FIELDS: &[&str] = &[
    "analysis",
    "time_steps",
    "step_size",
    "output_level",
    "solver",
    "time_stepper",
];

const SOLVER_FIELDS: &[&str] = &[
    "etol",
    "rtol",
    "lstol",
    "dtol",
    "min_residual",
    "rhoi",
    "max_refs",
    "max_ups",
    "diverge_reform",
    "reform_each_time_step",
    "qnmethod",
    "symmetric_stiffness",
];

/// `dtmax` is read separately as a scaled value.
const TIME_STEPPER_FIELDS: &[&str] = &["dtmin", "max_retries", "opt_iter"];

/// Child layout of a record being read.
#[derive(Default)]
struct Fields {
    extras: Vec<XmlNode>,
    layout: Vec<Slot>,
}

impl Fields {
    /// Record `child` and return its typed tag, or keep it as an extra.
    ///
    /// Only the first plain occurrence of a known tag is typed; nested
    /// `solver` and `time_stepper` are the records that take children.
    fn typed(&mut self, child: &XmlNode, known: &[&'static str]) -> Option<&'static str> {
        let nested = matches!(child.name.as_str(), "solver" | "time_stepper");
        let tag = known
            .iter()
            .copied()
            .find(|tag| *tag == child.name)
            .filter(|tag| nested || child.is_leaf())
            .filter(|tag| !self.layout.contains(&Slot::Field(*tag)));
        match tag {
            Some(tag) => self.layout.push(Slot::Field(tag)),
            None => self.extra(child),
        }
        tag
    }

    fn extra(&mut self, child: &XmlNode) {
        self.layout.push(Slot::Extra(self.extras.len()));
        self.extras.push(child.clone());
    }
}

fn read_solver(node: &XmlNode, locator: &Locator) -> Result<SolverSettings, BuildError> {
    let mut solver = SolverSettings {
        attributes: node.attributes.clone(),
        ..SolverSettings::default()
    };
    let mut fields = Fields::default();
    for child in &node.children {
        let Some(tag) = fields.typed(child, SOLVER_FIELDS) else {
            continue;
        };
        match tag {
            "etol" => solver.etol = Some(leaf(Real, child, locator)?),
            "rtol" => solver.rtol = Some(leaf(Real, child, locator)?),
            "lstol" => solver.lstol = Some(leaf(Real, child, locator)?),
            "dtol" => solver.dtol = Some(leaf(Real, child, locator)?),
            "min_residual" => solver.min_residual = Some(leaf(Real, child, locator)?),
            "rhoi" => solver.rhoi = Some(leaf(Real, child, locator)?),
            "max_refs" => solver.max_refs = Some(leaf(Integer, child, locator)?),
            "max_ups" => solver.max_ups = Some(leaf(Integer, child, locator)?),
            "diverge_reform" => solver.diverge_reform = Some(leaf(Integer, child, locator)?),
            "reform_each_time_step" => {
                solver.reform_each_time_step = Some(leaf(Integer, child, locator)?)
            }
            "qnmethod" => solver.qnmethod = Some(leaf(Enum::<QnMethod>::new(), child, locator)?),
            _ => solver.symmetric_stiffness = Some(leaf(Integer, child, locator)?),
        }
    }
    solver.extras = fields.extras;
    solver.layout = fields.layout;
    Ok(solver)
}

fn read_time_stepper(
    node: &XmlNode,
    locator: &Locator,
) -> Result<(TimeStepper, Option<u32>), BuildError> {
    let mut stepper = TimeStepper {
        attributes: node.attributes.clone(),
        ..TimeStepper::default()
    };
    let mut controller = None;
    let mut fields = Fields::default();
    for child in &node.children {
        if child.name == "dtmax" && !fields.layout.contains(&Slot::Field("dtmax")) {
            if let Some((FieldValue::Scaled(scaled), lc)) =
                FieldCodec::Scaled.decode(child).at(&locator.child("dtmax"))?
            {
                fields.layout.push(Slot::Field("dtmax"));
                stepper.dtmax = Some(scaled);
                controller = lc;
                continue;
            }
        }
        let Some(tag) = fields.typed(child, TIME_STEPPER_FIELDS) else {
            continue;
        };
        match tag {
            "dtmin" => stepper.dtmin = Some(leaf(Real, child, locator)?),
            "max_retries" => stepper.max_retries = Some(leaf(Integer, child, locator)?),
            _ => stepper.opt_iter = Some(leaf(Integer, child, locator)?),
        }
    }
    stepper.extras = fields.extras;
    stepper.layout = fields.layout;
    Ok((stepper, controller))
}

fn read_globals(node: &XmlNode, locator: &Locator) -> Result<Globals, BuildError> {
    let mut globals = Globals::default();
    let mut fields = Fields::default();
    for child in &node.children {
        if child.name != "Constants" || globals.constants.is_some() {
            fields.extra(child);
            continue;
        }
        fields.layout.push(Slot::Field("Constants"));
        globals.constants = Some(read_constants(child, &locator.child("Constants"))?);
    }
    globals.extras = fields.extras;
    globals.layout = fields.layout;
    Ok(globals)
}

/// Plain `<T>298</T>` entries are typed; anything carrying attributes or
/// children, or repeating an earlier name, is kept verbatim in place.
fn read_constants(node: &XmlNode, locator: &Locator) -> Result<Constants, BuildError> {
    let mut constants = Constants {
        entries: Vec::with_capacity(node.children.len()),
        attributes: node.attributes.clone(),
    };
    for child in &node.children {
        let plain = child.is_leaf();
        let repeated = constants.entries.iter().any(|entry| entry.name() == child.name);
        let entry = if plain && !repeated {
            Constant::Value {
                name: child.name.clone(),
                value: leaf(Real, child, locator)?,
            }
        } else {
            debug!(constant = %child.name, "keeping constant opaque");
            Constant::Opaque(child.clone())
        };
        constants.entries.push(entry);
    }
    Ok(constants)
}

// ============================================================================
// MESH
// ============================================================================

fn read_mesh(node: &XmlNode, locator: &Locator, mesh: &mut Mesh) -> Result<(), BuildError> {
    for child in &node.children {
        let part = match child.name.as_str() {
            "Nodes" => {
                mesh.nodes.push(read_nodes(child, locator)?);
                MeshPart::Nodes(mesh.nodes.len() - 1)
            }
            "Elements" => {
                mesh.elements.push(read_elements(child, locator)?);
                MeshPart::Elements(mesh.elements.len() - 1)
            }
            "NodeSet" => {
                mesh.node_sets.push(read_node_set(child, locator)?);
                MeshPart::NodeSet(mesh.node_sets.len() - 1)
            }
            "Surface" => {
                mesh.surfaces.push(read_surface(child, locator)?);
                MeshPart::Surface(mesh.surfaces.len() - 1)
            }
            _ => {
                debug!(part = %child.name, "keeping mesh part opaque");
                mesh.extras.push(child.clone());
                MeshPart::Opaque(mesh.extras.len() - 1)
            }
        };
        mesh.layout.push(part);
    }
    debug!(
        nodes = mesh.nodes.len(),
        elements = mesh.elements.len(),
        node_sets = mesh.node_sets.len(),
        surfaces = mesh.surfaces.len(),
        "read mesh"
    );
    Ok(())
}

fn read_nodes(node: &XmlNode, parent: &Locator) -> Result<NodesGroup, BuildError> {
    let name = node.required_attr("name").at(&parent.child("Nodes"))?;
    let locator = parent.entity("Nodes", "name", name);

    let nodes = node
        .children
        .iter()
        .enumerate()
        .map(|(position, child)| -> Result<Node, BuildError> {
            let at = entity_locator(&locator, child, "id", position);
            expect_tag(child, "node", "Nodes").at(&at)?;
            Ok(Node {
                id: Id.decode(child.required_attr("id").at(&at)?, "node@id").at(&at)?,
                position: Triple.decode(child.text(), "node").at(&at)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NodesGroup {
        name: name.to_string(),
        nodes,
    })
}

fn read_elements(node: &XmlNode, parent: &Locator) -> Result<ElementsGroup, BuildError> {
    let name = node.required_attr("name").at(&parent.child("Elements"))?;
    let locator = parent.entity("Elements", "name", name);
    let shape = Enum::<ElementShape>::new()
        .decode(node.required_attr("type").at(&locator)?, "Elements@type")
        .at(&locator)?;
    let connectivity = IdList::exact(shape.node_count());

    let elements = node
        .children
        .iter()
        .enumerate()
        .map(|(position, child)| -> Result<Element, BuildError> {
            let at = entity_locator(&locator, child, "id", position);
            expect_tag(child, "elem", "Elements").at(&at)?;
            Ok(Element {
                id: Id.decode(child.required_attr("id").at(&at)?, "elem@id").at(&at)?,
                nodes: connectivity.decode(child.text(), "elem").at(&at)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ElementsGroup {
        name: name.to_string(),
        shape,
        elements,
        attributes: node.attributes_except(&["type", "name"]),
    })
}

fn read_node_set(node: &XmlNode, parent: &Locator) -> Result<NodeSet, BuildError> {
    let name = node.required_attr("name").at(&parent.child("NodeSet"))?;
    let locator = parent.entity("NodeSet", "name", name);

    let mut nodes = Vec::with_capacity(node.children.len());
    for (position, child) in node.children.iter().enumerate() {
        let at = entity_locator(&locator, child, "id", position);
        expect_tag(child, "node", "NodeSet").at(&at)?;
        nodes.push(Id.decode(child.required_attr("id").at(&at)?, "node@id").at(&at)?);
    }
    // Older writers list the ids as text.
    nodes.extend(IdList::default().decode(node.text(), "NodeSet").at(&locator)?);

    Ok(NodeSet {
        name: name.to_string(),
        nodes,
    })
}

fn read_surface(node: &XmlNode, parent: &Locator) -> Result<Surface, BuildError> {
    let name = node.required_attr("name").at(&parent.child("Surface"))?;
    let locator = parent.entity("Surface", "name", name);

    let faces = node
        .children
        .iter()
        .enumerate()
        .map(|(position, child)| -> Result<Face, BuildError> {
            let at = entity_locator(&locator, child, "id", position);
            let shape = Enum::<FaceShape>::new()
                .decode(&child.name, "Surface facet")
                .at(&at)?;
            Ok(Face {
                shape,
                id: Id.decode(child.required_attr("id").at(&at)?, "facet@id").at(&at)?,
                nodes: IdList::exact(shape.node_count())
                    .decode(child.text(), &child.name)
                    .at(&at)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Surface {
        name: name.to_string(),
        faces,
    })
}

// ============================================================================
// OUTPUT
// ============================================================================

const LOG_REQUEST_ATTRIBUTES: &[&str] = &["data", "name", "file", "delim", "format"];

fn read_output(node: &XmlNode, locator: &Locator) -> Result<Output, BuildError> {
    let mut output = Output::default();
    for child in &node.children {
        if child.name != "logfile" {
            output.entries.push(OutputEntry::Opaque(child.clone()));
            continue;
        }
        let at = locator.child("logfile");
        let requests = child
            .children
            .iter()
            .map(|request| read_log_request(request, &at))
            .collect::<Result<Vec<_>, _>>()?;
        output.entries.push(OutputEntry::LogFile(LogFile {
            file: child.attr("file").map(str::to_string),
            requests,
            attributes: child.attributes_except(&["file"]),
        }));
    }
    Ok(output)
}

fn read_log_request(node: &XmlNode, parent: &Locator) -> Result<LogRequest, BuildError> {
    let at = parent.child(&node.name);
    let kind = LogKind::from_tag(&node.name)
        .ok_or_else(|| {
            FebError::malformed(format!("unexpected <{}> in <logfile>", node.name))
        })
        .at(&at)?;
    let data = node.required_attr("data").at(&at)?;
    let text_attr = |key: &str| node.attr(key).map(str::to_string);

    Ok(LogRequest {
        kind,
        data: Channels.decode(data, "data").at(&at)?,
        name: text_attr("name"),
        file: text_attr("file"),
        delim: text_attr("delim"),
        format: text_attr("format"),
        items: IdList::default().decode(node.text(), &node.name).at(&at)?,
        attributes: node.attributes_except(LOG_REQUEST_ATTRIBUTES),
    })
}
