//! Materials, domain assignments, boundary conditions, surface loads and
//! load controllers.
//!
//! Each polymorphic entity carries a discriminant enum (known variants plus
//! `Other`) and a [`Params`] list decoded through the type registry.

use super::{ElementsGroup, Handle, Mesh, NodeSet, Surface};
use crate::codec::{Extend, FebEnum, Interpolation};
use crate::error::{Category, FebError};
use crate::registry::{FieldValue, Params, Scaled};
use crate::tree::XmlNode;

macro_rules! discriminant {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $token:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            /// A discriminant without a built-in variant, kept verbatim.
            Other(String),
        }

        impl $name {
            pub fn from_discriminant(raw: &str) -> Self {
                match raw {
                    $($token => Self::$variant,)*
                    other => Self::Other(other.to_string()),
                }
            }

            pub fn discriminant(&self) -> &str {
                match self {
                    $(Self::$variant => $token,)*
                    Self::Other(raw) => raw,
                }
            }

            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.discriminant())
            }
        }
    };
}

discriminant! {
    pub enum MaterialType {
        NeoHookean => "neo-Hookean",
        IsotropicElastic => "isotropic elastic",
        MooneyRivlin => "Mooney-Rivlin",
        CoupledMooneyRivlin => "coupled Mooney-Rivlin",
    }
}

discriminant! {
    pub enum BcType {
        Fix => "fix",
        Prescribe => "prescribe",
        Rigid => "rigid",
    }
}

discriminant! {
    pub enum SurfaceLoadType {
        Pressure => "pressure",
        Traction => "traction",
    }
}

discriminant! {
    pub enum ControllerType {
        LoadCurve => "loadcurve",
    }
}

discriminant! {
    /// Tag of a `<MeshDomains>` child.
    pub enum DomainKind {
        Solid => "SolidDomain",
        Shell => "ShellDomain",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: u32,
    pub name: String,
    pub kind: MaterialType,
    pub params: Params,
    /// Attributes other than `id`, `name` and `type`.
    pub attributes: Vec<(String, String)>,
}

impl Material {
    pub fn new(id: u32, name: impl Into<String>, kind: MaterialType) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            params: Params::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Binding of an elements group to a material.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainAssignment {
    pub kind: DomainKind,
    pub elements: Handle<ElementsGroup>,
    pub material: Handle<Material>,
    /// Attributes other than `name` and `mat`.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Prefix of a `node_set` reference that names a surface.
pub const SURFACE_PREFIX: &str = "@surface:";

/// Nodes a boundary condition applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTarget {
    NodeSet(Handle<NodeSet>),
    /// `@surface:NAME`: every node of the surface, first appearance first.
    Surface {
        surface: Handle<Surface>,
        nodes: Vec<u32>,
    },
}

impl NodeTarget {
    /// Target every node of `surface`.
    pub fn surface(mesh: &Mesh, surface: Handle<Surface>) -> Result<Self, FebError> {
        let nodes = mesh
            .surface(surface)
            .ok_or_else(|| FebError::dangling(Category::Surface, surface))?
            .unique_nodes();
        Ok(NodeTarget::Surface { surface, nodes })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCondition {
    pub name: Option<String>,
    pub kind: BcType,
    pub target: Option<NodeTarget>,
    pub params: Params,
    /// Attributes other than `name`, `type` and `node_set`.
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLoad {
    pub name: Option<String>,
    pub kind: SurfaceLoadType,
    pub surface: Handle<Surface>,
    pub params: Params,
    /// Attributes other than `name`, `type` and `surface`.
    pub attributes: Vec<(String, String)>,
}

impl SurfaceLoad {
    /// The first scaled field: the load's magnitude and its controller.
    pub fn magnitude(&self) -> Option<&Scaled> {
        self.params.scaled().next().map(|(_, scaled)| scaled)
    }
}

/// Time-dependent curve referenced by id from scaled fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadController {
    pub id: u32,
    pub kind: ControllerType,
    pub params: Params,
    /// Attributes other than `id` and `type`.
    pub attributes: Vec<(String, String)>,
}

impl LoadController {
    pub fn new(id: u32, kind: ControllerType) -> Self {
        Self {
            id,
            kind,
            params: Params::new(),
            attributes: Vec::new(),
        }
    }

    /// A `loadcurve` through `points` with the given interpolation.
    pub fn curve(id: u32, interpolation: Interpolation, points: Vec<[f64; 2]>) -> Self {
        Self::new(id, ControllerType::LoadCurve).with_params(
            Params::new()
                .with("interpolate", FieldValue::Keyword(interpolation.as_str().to_string()))
                .with("points", FieldValue::Points(points)),
        )
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn interpolation(&self) -> Option<Interpolation> {
        self.params
            .get("interpolate")
            .and_then(FieldValue::as_keyword)
            .and_then(|token| Interpolation::from_token(token).ok())
    }

    pub fn extend(&self) -> Option<Extend> {
        self.params
            .get("extend")
            .and_then(FieldValue::as_keyword)
            .and_then(|token| Extend::from_token(token).ok())
    }

    pub fn points(&self) -> &[[f64; 2]] {
        self.params
            .get("points")
            .and_then(FieldValue::as_points)
            .unwrap_or(&[])
    }
}
