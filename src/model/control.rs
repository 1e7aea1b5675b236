//! Module, control settings, globals and output requests.
//!
//! These are flat records nothing else refers to. The one exception is the
//! time stepper's `dtmax`, which may follow a must-point load controller.
//!
//! Records that mix typed fields with verbatim extras keep a `layout` of
//! [`Slot`]s so they are written back in the order they were read.

use crate::codec::{AnalysisKind, ModuleKind, OutputLevel, QnMethod};
use crate::registry::Scaled;
use crate::tree::XmlNode;

/// Position of one child element of a record, in document order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// A typed field, by tag.
    Field(&'static str),
    /// Index into the record's `extras`.
    Extra(usize),
}

/// Order children: recorded slots first, then typed fields the layout does
/// not mention (in the order given), then unrecorded extras.
pub(crate) fn arrange(
    layout: &[Slot],
    mut fields: Vec<(&'static str, XmlNode)>,
    extras: &[XmlNode],
) -> Vec<XmlNode> {
    let mut children = Vec::with_capacity(fields.len() + extras.len());
    let mut used = vec![false; extras.len()];
    for slot in layout {
        match slot {
            Slot::Field(tag) => {
                if let Some(at) = fields.iter().position(|(name, _)| name == tag) {
                    children.push(fields.remove(at).1);
                }
            }
            Slot::Extra(index) => {
                if let (Some(node), Some(seen)) = (extras.get(*index), used.get_mut(*index)) {
                    if !*seen {
                        *seen = true;
                        children.push(node.clone());
                    }
                }
            }
        }
    }
    children.extend(fields.into_iter().map(|(_, node)| node));
    children.extend(
        extras
            .iter()
            .zip(used)
            .filter(|(_, seen)| !seen)
            .map(|(node, _)| node.clone()),
    );
    children
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub kind: ModuleKind,
    /// Attributes other than `type`.
    pub attributes: Vec<(String, String)>,
}

impl Default for Module {
    fn default() -> Self {
        Self {
            kind: ModuleKind::Solid,
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub analysis: AnalysisKind,
    pub time_steps: i64,
    pub step_size: f64,
    pub output_level: Option<OutputLevel>,
    pub solver: Option<SolverSettings>,
    pub time_stepper: Option<TimeStepper>,
    /// Children without a typed field, in document order.
    pub extras: Vec<XmlNode>,
    pub layout: Vec<Slot>,
}

impl Control {
    pub fn new(analysis: AnalysisKind, time_steps: i64, step_size: f64) -> Self {
        Self {
            analysis,
            time_steps,
            step_size,
            output_level: None,
            solver: None,
            time_stepper: None,
            extras: Vec::new(),
            layout: Vec::new(),
        }
    }
}

/// Nonlinear solver tolerances and iteration limits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverSettings {
    pub etol: Option<f64>,
    pub rtol: Option<f64>,
    pub lstol: Option<f64>,
    pub dtol: Option<f64>,
    pub min_residual: Option<f64>,
    pub rhoi: Option<f64>,
    pub max_refs: Option<i64>,
    pub max_ups: Option<i64>,
    pub diverge_reform: Option<i64>,
    pub reform_each_time_step: Option<i64>,
    pub qnmethod: Option<QnMethod>,
    /// 0 unsymmetric, 1 symmetric, 2 structurally symmetric.
    pub symmetric_stiffness: Option<i64>,
    pub attributes: Vec<(String, String)>,
    pub extras: Vec<XmlNode>,
    pub layout: Vec<Slot>,
}

/// Adaptive time-stepping limits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeStepper {
    pub dtmin: Option<f64>,
    pub dtmax: Option<Scaled>,
    pub max_retries: Option<i64>,
    pub opt_iter: Option<i64>,
    pub attributes: Vec<(String, String)>,
    pub extras: Vec<XmlNode>,
    pub layout: Vec<Slot>,
}

/// `<Globals>`: the `Constants` block plus anything else kept verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Globals {
    /// `None` when the document has no `Constants` block.
    pub constants: Option<Constants>,
    pub extras: Vec<XmlNode>,
    pub layout: Vec<Slot>,
}

impl Globals {
    /// Value of the first plain constant with this name.
    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.as_ref()?.entries.iter().find_map(|entry| match entry {
            Constant::Value { name: n, value } if n == name => Some(*value),
            _ => None,
        })
    }
}

/// `<Constants>` children in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constants {
    pub entries: Vec<Constant>,
    pub attributes: Vec<(String, String)>,
}

impl Constants {
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(Constant::name).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// `<T>298</T>`.
    Value { name: String, value: f64 },
    /// A constant with attributes or children, or a repeat of an earlier
    /// name, kept verbatim.
    Opaque(XmlNode),
}

impl Constant {
    pub fn name(&self) -> &str {
        match self {
            Constant::Value { name, .. } => name,
            Constant::Opaque(node) => &node.name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    pub entries: Vec<OutputEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputEntry {
    LogFile(LogFile),
    /// `plotfile` and anything else, kept verbatim.
    Opaque(XmlNode),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFile {
    pub file: Option<String>,
    pub requests: Vec<LogRequest>,
    /// Attributes other than `file`.
    pub attributes: Vec<(String, String)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogKind {
    NodeData,
    FaceData,
    ElementData,
    RigidBodyData,
}

impl LogKind {
    pub const ALL: [LogKind; 4] = [
        LogKind::NodeData,
        LogKind::FaceData,
        LogKind::ElementData,
        LogKind::RigidBodyData,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            LogKind::NodeData => "node_data",
            LogKind::FaceData => "face_data",
            LogKind::ElementData => "element_data",
            LogKind::RigidBodyData => "rigid_body_data",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// One data request of a log file, e.g.
/// `<element_data data="Ex;Ey;Ez" delim=",">1,2,3</element_data>`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRequest {
    pub kind: LogKind,
    pub data: Vec<String>,
    pub name: Option<String>,
    pub file: Option<String>,
    pub delim: Option<String>,
    pub format: Option<String>,
    /// Restricts the request to these item ids; empty means all.
    pub items: Vec<u32>,
    pub attributes: Vec<(String, String)>,
}

impl LogRequest {
    pub fn new(kind: LogKind, data: Vec<String>) -> Self {
        Self {
            kind,
            data,
            name: None,
            file: None,
            delim: None,
            format: None,
            items: Vec::new(),
            attributes: Vec::new(),
        }
    }
}
