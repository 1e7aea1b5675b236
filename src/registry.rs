//! Polymorphic type registry.
//!
//! Materials, surface loads, boundary conditions and load controllers carry a
//! `type` attribute (the discriminant) that selects which child fields they
//! hold. The registry maps `(category, discriminant)` to a [`Schema`]: an
//! ordered list of fields, each with a [`FieldCodec`], a required flag and an
//! optional default.
//!
//! ## Passthrough
//!
//! Decoding never drops data:
//! - fields absent from the schema are kept as [`Param::Opaque`] nodes
//! - a known field whose element has an unexpected shape is kept opaque too
//! - a discriminant without a schema keeps every child opaque
//!
//! Encoding writes parameters back in their stored order, so opaque fields
//! come out where they went in.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::codec::{
    Codec, DOF_TOKENS, Extend, FebEnum, Flag, Id, Integer, Interpolation, Keyword, Pair, Real,
    Tokens, Triple,
};
use crate::error::{Category, FebError};
use crate::model::{Handle, LoadController, Material, MaterialType};
use crate::tree::XmlNode;

// ============================================================================
// VALUES
// ============================================================================

/// A scalar magnitude, optionally driven over time by a load controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaled {
    pub scale: f64,
    pub controller: Option<Handle<LoadController>>,
}

impl Scaled {
    pub fn constant(scale: f64) -> Self {
        Self {
            scale,
            controller: None,
        }
    }

    pub fn controlled(scale: f64, controller: Handle<LoadController>) -> Self {
        Self {
            scale,
            controller: Some(controller),
        }
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Real(f64),
    Integer(i64),
    Flag(bool),
    Triple([f64; 3]),
    Keyword(String),
    Tokens(Vec<String>),
    Scaled(Scaled),
    Points(Vec<[f64; 2]>),
    Text(String),
}

impl FieldValue {
    pub fn as_real(&self) -> Option<f64> {
        match self {
            FieldValue::Real(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Scaled(s) => Some(s.scale),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            FieldValue::Keyword(v) | FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tokens(&self) -> Option<&[String]> {
        match self {
            FieldValue::Tokens(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&[[f64; 2]]> {
        match self {
            FieldValue::Points(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_scaled(&self) -> Option<&Scaled> {
        match self {
            FieldValue::Scaled(v) => Some(v),
            _ => None,
        }
    }
}

/// One child field of a polymorphic entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Known { name: String, value: FieldValue },
    Opaque(XmlNode),
}

impl Param {
    pub fn name(&self) -> &str {
        match self {
            Param::Known { name, .. } => name,
            Param::Opaque(node) => &node.name,
        }
    }
}

/// Ordered parameters of a polymorphic entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<Param>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a known field.
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.push(Param::Known {
            name: name.into(),
            value,
        });
    }

    pub fn push_opaque(&mut self, node: XmlNode) {
        self.0.push(Param::Opaque(node));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find_map(|p| match p {
            Param::Known { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }

    pub fn real(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_real)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_flag)
    }

    /// True if a field of this name is present, decoded or opaque.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|p| p.name() == name)
    }

    pub fn opaque(&self, name: &str) -> Option<&XmlNode> {
        self.0.iter().find_map(|p| match p {
            Param::Opaque(node) if node.name == name => Some(node),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scaled fields, in order, with their names.
    pub fn scaled(&self) -> impl Iterator<Item = (&str, &Scaled)> {
        self.0.iter().filter_map(|p| match p {
            Param::Known {
                name,
                value: FieldValue::Scaled(s),
            } => Some((name.as_str(), s)),
            _ => None,
        })
    }

    pub(crate) fn scaled_at_mut(&mut self, index: usize) -> Option<&mut Scaled> {
        match self.0.get_mut(index) {
            Some(Param::Known {
                value: FieldValue::Scaled(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// CODECS
// ============================================================================

/// How a field's element is decoded and encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldCodec {
    Real,
    Integer,
    Flag,
    Triple,
    Keyword(&'static [&'static str]),
    Tokens(&'static [&'static str]),
    /// Real text with an optional `lc` load-controller attribute.
    Scaled,
    /// At least this many `<point>t,v</point>` children.
    Points(usize),
    Text,
}

/// A decoded field plus the raw load-controller id it referenced, if any.
pub type DecodedField = (FieldValue, Option<u32>);

impl FieldCodec {
    /// Codec matching a value's own shape; used for fields no schema declares.
    pub fn for_value(value: &FieldValue) -> Self {
        match value {
            FieldValue::Real(_) => FieldCodec::Real,
            FieldValue::Integer(_) => FieldCodec::Integer,
            FieldValue::Flag(_) => FieldCodec::Flag,
            FieldValue::Triple(_) => FieldCodec::Triple,
            FieldValue::Keyword(_) | FieldValue::Text(_) => FieldCodec::Text,
            FieldValue::Tokens(_) => FieldCodec::Tokens(&[]),
            FieldValue::Scaled(_) => FieldCodec::Scaled,
            FieldValue::Points(_) => FieldCodec::Points(0),
        }
    }

    fn accepts_shape(&self, node: &XmlNode) -> bool {
        match self {
            FieldCodec::Scaled => {
                node.children.is_empty() && node.attributes.iter().all(|(k, _)| k == "lc")
            }
            FieldCodec::Points(_) => {
                node.attributes.is_empty()
                    && node.text().trim().is_empty()
                    && node.children.iter().all(|c| c.name == "point" && c.is_leaf())
            }
            _ => node.is_leaf(),
        }
    }

    /// Decode a field element. `Ok(None)` means the element's shape does not
    /// fit this codec and should be kept opaque.
    pub fn decode(&self, node: &XmlNode) -> Result<Option<DecodedField>, FebError> {
        if !self.accepts_shape(node) {
            return Ok(None);
        }
        let field = node.name.as_str();
        let raw = node.text();
        let decoded = match self {
            FieldCodec::Real => (FieldValue::Real(Real.decode(raw, field)?), None),
            FieldCodec::Integer => (FieldValue::Integer(Integer.decode(raw, field)?), None),
            FieldCodec::Flag => (FieldValue::Flag(Flag.decode(raw, field)?), None),
            FieldCodec::Triple => (FieldValue::Triple(Triple.decode(raw, field)?), None),
            FieldCodec::Keyword(allowed) => {
                (FieldValue::Keyword(Keyword(*allowed).decode(raw, field)?), None)
            }
            FieldCodec::Tokens(allowed) => {
                (FieldValue::Tokens(Tokens(*allowed).decode(raw, field)?), None)
            }
            FieldCodec::Text => (FieldValue::Text(raw.trim().to_string()), None),
            FieldCodec::Scaled => {
                let scale = Real.decode(raw, field)?;
                let lc = node
                    .attr("lc")
                    .map(|id| parse_controller_id(id, field))
                    .transpose()?;
                (FieldValue::Scaled(Scaled::constant(scale)), lc)
            }
            FieldCodec::Points(min) => {
                let points = node
                    .children
                    .iter()
                    .map(|point| Pair.decode(point.text(), "point"))
                    .collect::<Result<Vec<_>, _>>()?;
                check_point_count(field, points.len(), *min)?;
                (FieldValue::Points(points), None)
            }
        };
        Ok(Some(decoded))
    }

    /// Encode a value as a field element named `name`.
    pub fn encode(
        &self,
        name: &str,
        value: &FieldValue,
        controller_id: Option<u32>,
    ) -> Result<XmlNode, FebError> {
        let node = XmlNode::new(name);
        let node = match (self, value) {
            (FieldCodec::Real, FieldValue::Real(v)) => node.with_text(Real.encode(v)),
            (FieldCodec::Real, FieldValue::Integer(v)) => node.with_text(v.to_string()),
            (FieldCodec::Integer, FieldValue::Integer(v)) => node.with_text(Integer.encode(v)),
            (FieldCodec::Flag, FieldValue::Flag(v)) => node.with_text(Flag.encode(v)),
            (FieldCodec::Triple, FieldValue::Triple(v)) => node.with_text(Triple.encode(v)),
            (FieldCodec::Keyword(allowed), FieldValue::Keyword(v)) => {
                let token = Keyword(*allowed).decode(v, name)?;
                node.with_text(token)
            }
            (FieldCodec::Tokens(allowed), FieldValue::Tokens(v)) => {
                if !allowed.is_empty() {
                    if let Some(bad) = v.iter().find(|t| !allowed.contains(&t.as_str())) {
                        return Err(FebError::unknown_token(name, bad.as_str()));
                    }
                }
                node.with_text(Tokens(*allowed).encode(v))
            }
            (FieldCodec::Text, FieldValue::Text(v) | FieldValue::Keyword(v)) => node.with_text(v.as_str()),
            (FieldCodec::Scaled, FieldValue::Scaled(s)) => {
                let node = match controller_id {
                    Some(id) => node.with_attr("lc", id.to_string()),
                    None => node,
                };
                node.with_text(Real.encode(&s.scale))
            }
            (FieldCodec::Points(min), FieldValue::Points(points)) => {
                check_point_count(name, points.len(), *min)?;
                points.iter().fold(node, |node, p| {
                    node.with_child(XmlNode::new("point").with_text(Pair.encode(p)))
                })
            }
            (codec, value) => {
                return Err(FebError::invalid(
                    name,
                    format!("{value:?}"),
                    format!("value does not fit the {codec:?} codec"),
                ));
            }
        };
        Ok(node)
    }
}

fn check_point_count(field: &str, count: usize, min: usize) -> Result<(), FebError> {
    if count < min {
        return Err(FebError::invalid(
            field,
            format!("{count} points"),
            format!("expected at least {min} points"),
        ));
    }
    Ok(())
}

fn json_numbers<const N: usize>(value: &Value) -> Option<[f64; N]> {
    let items = value.as_array()?;
    let numbers = items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>()?;
    numbers.try_into().ok()
}

/// One field of a material field map, shaped by the field's codec.
fn json_field(spec: &FieldSpec, value: &Value) -> Result<FieldValue, FebError> {
    let name = spec.name.as_str();
    let decoded = match (spec.codec, value) {
        (FieldCodec::Real, Value::Number(n)) => n.as_f64().map(FieldValue::Real),
        (FieldCodec::Scaled, Value::Number(n)) => {
            n.as_f64().map(|v| FieldValue::Scaled(Scaled::constant(v)))
        }
        (FieldCodec::Integer, Value::Number(n)) => n.as_i64().map(FieldValue::Integer),
        (FieldCodec::Flag, Value::Bool(b)) => Some(FieldValue::Flag(*b)),
        (FieldCodec::Flag, Value::Number(n)) => match n.as_i64() {
            Some(0) => Some(FieldValue::Flag(false)),
            Some(1) => Some(FieldValue::Flag(true)),
            _ => None,
        },
        (FieldCodec::Triple, _) => json_numbers::<3>(value).map(FieldValue::Triple),
        (FieldCodec::Keyword(allowed), Value::String(raw)) => {
            Some(FieldValue::Keyword(Keyword(allowed).decode(raw, name)?))
        }
        (FieldCodec::Text, Value::String(raw)) => Some(FieldValue::Text(raw.clone())),
        (FieldCodec::Tokens(allowed), Value::String(raw)) => {
            Some(FieldValue::Tokens(Tokens(allowed).decode(raw, name)?))
        }
        (FieldCodec::Tokens(allowed), Value::Array(items)) => {
            let raw = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>();
            match raw {
                Some(tokens) => Some(FieldValue::Tokens(
                    Tokens(allowed).decode(&tokens.join(","), name)?,
                )),
                None => None,
            }
        }
        (FieldCodec::Points(min), Value::Array(items)) => {
            let points = items.iter().map(json_numbers::<2>).collect::<Option<Vec<_>>>();
            if let Some(points) = &points {
                check_point_count(name, points.len(), min)?;
            }
            points.map(FieldValue::Points)
        }
        _ => None,
    };
    decoded.ok_or_else(|| {
        FebError::invalid(
            name,
            value.to_string(),
            format!("value does not fit the {:?} codec", spec.codec),
        )
    })
}

fn parse_controller_id(raw: &str, field: &str) -> Result<u32, FebError> {
    Id.decode(raw, &format!("{field}@lc"))
}

// ============================================================================
// SCHEMAS
// ============================================================================

/// One declared field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub codec: FieldCodec,
    pub required: bool,
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, codec: FieldCodec) -> Self {
        Self {
            name: name.into(),
            codec,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, codec: FieldCodec) -> Self {
        Self {
            name: name.into(),
            codec,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Field layout selected by one discriminant.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub category: Category,
    pub discriminant: String,
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(category: Category, discriminant: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            category,
            discriminant: discriminant.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The stored value of `name`, falling back to the schema default.
    pub fn value_or_default<'a>(&'a self, params: &'a Params, name: &str) -> Option<&'a FieldValue> {
        params
            .get(name)
            .or_else(|| self.field(name).and_then(|f| f.default.as_ref()))
    }

    fn check_required(&self, params: &Params) -> Result<(), FebError> {
        match self
            .fields
            .iter()
            .find(|f| f.required && !params.contains(&f.name))
        {
            Some(missing) => Err(FebError::missing_field(missing.name.as_str())),
            None => Ok(()),
        }
    }
}

/// A load-controller id found while decoding, keyed by parameter position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerRef {
    pub param: usize,
    pub id: u32,
}

/// Result of decoding the children of a polymorphic entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedParams {
    pub params: Params,
    pub controller_refs: Vec<ControllerRef>,
}

/// Schema table keyed by category and discriminant.
///
/// Plain read-only data once built; share it by reference across builds.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    schemas: IndexMap<Category, IndexMap<String, Schema>>,
}

impl TypeRegistry {
    /// An empty registry: every discriminant decodes opaquely.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the FEBio 3.0 types this crate understands.
    pub fn febio() -> Self {
        use FieldCodec as C;
        let mut registry = Self::new();

        let density = || FieldSpec::optional("density", C::Real).with_default(FieldValue::Real(1.0));
        for name in ["neo-Hookean", "isotropic elastic"] {
            registry.register(Schema::new(
                Category::Material,
                name,
                vec![
                    density(),
                    FieldSpec::required("E", C::Real),
                    FieldSpec::required("v", C::Real),
                ],
            ));
        }
        for name in ["Mooney-Rivlin", "coupled Mooney-Rivlin"] {
            registry.register(Schema::new(
                Category::Material,
                name,
                vec![
                    density(),
                    FieldSpec::required("c1", C::Real),
                    FieldSpec::required("c2", C::Real),
                    FieldSpec::required("k", C::Real),
                ],
            ));
        }

        registry.register(Schema::new(
            Category::SurfaceLoad,
            "pressure",
            vec![
                FieldSpec::required("pressure", C::Scaled),
                FieldSpec::optional("symmetric_stiffness", C::Flag)
                    .with_default(FieldValue::Flag(true)),
                FieldSpec::optional("linear", C::Flag).with_default(FieldValue::Flag(false)),
                FieldSpec::optional("shell_bottom", C::Flag).with_default(FieldValue::Flag(false)),
            ],
        ));
        registry.register(Schema::new(
            Category::SurfaceLoad,
            "traction",
            vec![
                FieldSpec::optional("scale", C::Scaled)
                    .with_default(FieldValue::Scaled(Scaled::constant(1.0))),
                FieldSpec::required("traction", C::Triple),
            ],
        ));

        registry.register(Schema::new(
            Category::BoundaryCondition,
            "fix",
            vec![FieldSpec::required("dofs", C::Tokens(DOF_TOKENS))],
        ));
        registry.register(Schema::new(
            Category::BoundaryCondition,
            "prescribe",
            vec![
                FieldSpec::required("dof", C::Keyword(DOF_TOKENS)),
                FieldSpec::required("scale", C::Scaled),
                FieldSpec::optional("relative", C::Flag).with_default(FieldValue::Flag(false)),
            ],
        ));
        registry.register(Schema::new(
            Category::BoundaryCondition,
            "rigid",
            vec![
                FieldSpec::required("rb", C::Integer),
                FieldSpec::optional("dofs", C::Tokens(DOF_TOKENS)),
            ],
        ));

        registry.register(Schema::new(
            Category::LoadController,
            "loadcurve",
            vec![
                FieldSpec::optional("interpolate", C::Keyword(Interpolation::TOKENS)),
                FieldSpec::optional("extend", C::Keyword(Extend::TOKENS)),
                FieldSpec::required("points", C::Points(2)),
            ],
        ));

        registry
    }

    /// Add or replace a schema, returning the one it replaced.
    pub fn register(&mut self, schema: Schema) -> Option<Schema> {
        self.schemas
            .entry(schema.category)
            .or_default()
            .insert(schema.discriminant.clone(), schema)
    }

    pub fn schema(&self, category: Category, discriminant: &str) -> Option<&Schema> {
        self.schemas.get(&category)?.get(discriminant)
    }

    /// Decode the children of a polymorphic entity.
    pub fn decode(
        &self,
        category: Category,
        discriminant: &str,
        children: &[XmlNode],
    ) -> Result<DecodedParams, FebError> {
        let mut decoded = DecodedParams::default();

        let Some(schema) = self.schema(category, discriminant) else {
            debug!(%category, discriminant, "no schema registered, keeping fields opaque");
            for child in children {
                decoded.params.push_opaque(child.clone());
            }
            return Ok(decoded);
        };

        for child in children {
            let Some(spec) = schema.field(&child.name) else {
                debug!(%category, discriminant, field = %child.name, "unknown field kept opaque");
                decoded.params.push_opaque(child.clone());
                continue;
            };
            match spec.codec.decode(child)? {
                Some((value, lc)) => {
                    if let Some(id) = lc {
                        decoded.controller_refs.push(ControllerRef {
                            param: decoded.params.len(),
                            id,
                        });
                    }
                    decoded.params.push(child.name.as_str(), value);
                }
                None => {
                    debug!(%category, discriminant, field = %child.name, "unexpected field shape kept opaque");
                    decoded.params.push_opaque(child.clone());
                }
            }
        }

        schema.check_required(&decoded.params)?;
        Ok(decoded)
    }

    /// Encode parameters back to field elements, in stored order.
    ///
    /// `controller_id` maps a bound controller handle back to its id.
    pub fn encode<F>(
        &self,
        category: Category,
        discriminant: &str,
        params: &Params,
        controller_id: F,
    ) -> Result<Vec<XmlNode>, FebError>
    where
        F: Fn(Handle<LoadController>) -> Result<u32, FebError>,
    {
        let schema = self.schema(category, discriminant);
        if let Some(schema) = schema {
            schema.check_required(params)?;
        }

        params
            .iter()
            .map(|param| match param {
                Param::Opaque(node) => Ok(node.clone()),
                Param::Known { name, value } => {
                    let codec = schema
                        .and_then(|s| s.field(name))
                        .map(|f| f.codec)
                        .unwrap_or_else(|| FieldCodec::for_value(value));
                    let lc = match value {
                        FieldValue::Scaled(Scaled {
                            controller: Some(handle),
                            ..
                        }) => Some(controller_id(*handle)?),
                        _ => None,
                    };
                    codec.encode(name, value, lc)
                }
            })
            .collect()
    }

    /// Build a material from a flat field map checked against its schema,
    /// e.g. `{"mat_type": "neo-Hookean", "id": 1, "E": 0.3, "v": 0.48}`.
    ///
    /// Nothing is kept opaque here: the type needs a schema and every key
    /// other than `mat_type` and `id` must be one of its fields.
    pub fn material_from_map(
        &self,
        name: &str,
        fields: &Map<String, Value>,
    ) -> Result<Material, FebError> {
        let raw = fields
            .get("mat_type")
            .ok_or_else(|| FebError::missing_field("mat_type"))?;
        let kind = raw
            .as_str()
            .ok_or_else(|| FebError::invalid("mat_type", raw.to_string(), "expected a string"))?;
        let schema = self
            .schema(Category::Material, kind)
            .ok_or_else(|| FebError::unknown_token("mat_type", kind))?;

        let raw = fields.get("id").ok_or_else(|| FebError::missing_field("id"))?;
        let id = raw
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| FebError::invalid("id", raw.to_string(), "expected a positive id"))?;

        let unknown = fields
            .iter()
            .find(|(key, _)| !matches!(key.as_str(), "mat_type" | "id") && schema.field(key).is_none());
        if let Some((key, value)) = unknown {
            return Err(FebError::invalid(
                key.as_str(),
                value.to_string(),
                format!("not a field of '{kind}'"),
            ));
        }

        let mut params = Params::new();
        for spec in &schema.fields {
            if let Some(value) = fields.get(&spec.name) {
                params.push(spec.name.as_str(), json_field(spec, value)?);
            }
        }
        schema.check_required(&params)?;
        debug!(material = name, kind, "built material from field map");
        Ok(Material::new(id, name, MaterialType::from_discriminant(kind)).with_params(params))
    }
}
