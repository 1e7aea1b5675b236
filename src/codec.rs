//! Primitive codecs for leaf values.
//!
//! Every codec decodes a raw string into a typed value or fails with
//! [`FebError::InvalidPrimitive`] (or [`FebError::UnknownEnumValue`] for
//! enumerations), and encodes the value back so that
//! `decode(encode(x)) == x`.

use std::marker::PhantomData;

use crate::error::FebError;

/// A bidirectional leaf-value codec.
pub trait Codec {
    type Value;

    /// Decode `raw`; `field` names the value in diagnostics.
    fn decode(&self, raw: &str, field: &str) -> Result<Self::Value, FebError>;

    fn encode(&self, value: &Self::Value) -> String;
}

/// Format a real number in the shortest form that parses back to the same
/// value. Integral values are written without a fraction (`1`, not `1.0`).
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:?}")
    }
}

fn parse_real(raw: &str, field: &str) -> Result<f64, FebError> {
    let trimmed = raw.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| FebError::invalid(field, raw, "expected a number"))?;
    if !value.is_finite() {
        return Err(FebError::invalid(field, raw, "number must be finite"));
    }
    Ok(value)
}

fn split_list<'a>(raw: &'a str, separator: char) -> impl Iterator<Item = &'a str> {
    raw.split(separator).map(str::trim)
}

/// Real number in fixed or scientific notation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Real;

impl Codec for Real {
    type Value = f64;

    fn decode(&self, raw: &str, field: &str) -> Result<f64, FebError> {
        parse_real(raw, field)
    }

    fn encode(&self, value: &f64) -> String {
        format_number(*value)
    }
}

/// Signed integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integer;

impl Codec for Integer {
    type Value = i64;

    fn decode(&self, raw: &str, field: &str) -> Result<i64, FebError> {
        raw.trim()
            .parse()
            .map_err(|_| FebError::invalid(field, raw, "expected an integer"))
    }

    fn encode(&self, value: &i64) -> String {
        value.to_string()
    }
}

/// Boolean written as `0` or `1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flag;

impl Codec for Flag {
    type Value = bool;

    fn decode(&self, raw: &str, field: &str) -> Result<bool, FebError> {
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(FebError::invalid(field, raw, "expected 0 or 1")),
        }
    }

    fn encode(&self, value: &bool) -> String {
        let token = if *value { "1" } else { "0" };
        token.to_string()
    }
}

/// Exactly three comma-separated reals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Triple;

impl Codec for Triple {
    type Value = [f64; 3];

    fn decode(&self, raw: &str, field: &str) -> Result<[f64; 3], FebError> {
        let parts: Vec<&str> = split_list(raw, ',').collect();
        if parts.len() != 3 {
            return Err(FebError::invalid(
                field,
                raw,
                format!("expected 3 comma-separated numbers, got {}", parts.len()),
            ));
        }
        Ok([
            parse_real(parts[0], field)?,
            parse_real(parts[1], field)?,
            parse_real(parts[2], field)?,
        ])
    }

    fn encode(&self, value: &[f64; 3]) -> String {
        value.map(format_number).join(",")
    }
}

/// Two comma-separated reals, e.g. a `(time, value)` control point.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pair;

impl Codec for Pair {
    type Value = [f64; 2];

    fn decode(&self, raw: &str, field: &str) -> Result<[f64; 2], FebError> {
        let parts: Vec<&str> = split_list(raw, ',').collect();
        if parts.len() != 2 {
            return Err(FebError::invalid(
                field,
                raw,
                format!("expected 2 comma-separated numbers, got {}", parts.len()),
            ));
        }
        Ok([parse_real(parts[0], field)?, parse_real(parts[1], field)?])
    }

    fn encode(&self, value: &[f64; 2]) -> String {
        value.map(format_number).join(",")
    }
}

/// A single positive integer id.
#[derive(Debug, Clone, Copy, Default)]
pub struct Id;

impl Codec for Id {
    type Value = u32;

    fn decode(&self, raw: &str, field: &str) -> Result<u32, FebError> {
        match raw.trim().parse::<u32>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(FebError::invalid(field, raw, "expected a positive id")),
        }
    }

    fn encode(&self, value: &u32) -> String {
        value.to_string()
    }
}

/// Comma-separated positive integer ids, optionally of an exact length.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdList {
    pub len: Option<usize>,
}

impl IdList {
    pub fn exact(len: usize) -> Self {
        Self { len: Some(len) }
    }
}

impl Codec for IdList {
    type Value = Vec<u32>;

    fn decode(&self, raw: &str, field: &str) -> Result<Vec<u32>, FebError> {
        if raw.trim().is_empty() {
            return match self.len {
                Some(n) if n > 0 => Err(FebError::invalid(field, raw, format!("expected {n} ids"))),
                _ => Ok(Vec::new()),
            };
        }
        let ids = split_list(raw, ',')
            .map(|part| {
                Id.decode(part, field)
                    .map_err(|_| FebError::invalid(field, raw, format!("'{part}' is not a positive id")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(n) = self.len {
            if ids.len() != n {
                return Err(FebError::invalid(
                    field,
                    raw,
                    format!("expected {n} ids, got {}", ids.len()),
                ));
            }
        }
        Ok(ids)
    }

    fn encode(&self, value: &Vec<u32>) -> String {
        value.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
    }
}

/// Semicolon-separated data channel names, e.g. `Ex;Ey;Ez`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Channels;

impl Codec for Channels {
    type Value = Vec<String>;

    fn decode(&self, raw: &str, field: &str) -> Result<Vec<String>, FebError> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<String> = split_list(raw, ';').map(str::to_string).collect();
        if names.iter().any(String::is_empty) {
            return Err(FebError::invalid(field, raw, "empty channel name"));
        }
        Ok(names)
    }

    fn encode(&self, value: &Vec<String>) -> String {
        value.join(";")
    }
}

/// Comma-separated tokens drawn from an allowed set, e.g. `x,y,z`.
#[derive(Debug, Clone, Copy)]
pub struct Tokens(pub &'static [&'static str]);

impl Codec for Tokens {
    type Value = Vec<String>;

    fn decode(&self, raw: &str, field: &str) -> Result<Vec<String>, FebError> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        split_list(raw, ',')
            .map(|token| {
                if self.0.contains(&token) {
                    Ok(token.to_string())
                } else {
                    Err(FebError::unknown_token(field, token))
                }
            })
            .collect()
    }

    fn encode(&self, value: &Vec<String>) -> String {
        value.join(",")
    }
}

/// A single token drawn from an allowed set.
#[derive(Debug, Clone, Copy)]
pub struct Keyword(pub &'static [&'static str]);

impl Codec for Keyword {
    type Value = String;

    fn decode(&self, raw: &str, field: &str) -> Result<String, FebError> {
        let token = raw.trim();
        if self.0.contains(&token) {
            Ok(token.to_string())
        } else {
            Err(FebError::unknown_token(field, token))
        }
    }

    fn encode(&self, value: &String) -> String {
        value.clone()
    }
}

// ============================================================================
// ENUMERATIONS
// ============================================================================

/// A closed enumeration with one case-sensitive token per value.
pub trait FebEnum: Sized + Copy + 'static {
    /// Field name reported in diagnostics.
    const FIELD: &'static str;
    const ALL: &'static [Self];
    const TOKENS: &'static [&'static str];

    fn as_str(&self) -> &'static str;

    fn from_token(raw: &str) -> Result<Self, FebError> {
        let token = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == token)
            .ok_or_else(|| FebError::unknown_token(Self::FIELD, token))
    }
}

/// Codec over any [`FebEnum`].
pub struct Enum<E>(PhantomData<E>);

impl<E> Enum<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for Enum<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: FebEnum> Codec for Enum<E> {
    type Value = E;

    fn decode(&self, raw: &str, field: &str) -> Result<E, FebError> {
        E::from_token(raw).map_err(|err| match err {
            FebError::UnknownEnumValue { token, .. } => FebError::unknown_token(field, token),
            other => other,
        })
    }

    fn encode(&self, value: &E) -> String {
        value.as_str().to_string()
    }
}

macro_rules! feb_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($field:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::codec::FebEnum for $name {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$(Self::$variant),+];
            const TOKENS: &'static [&'static str] = &[$($token),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::codec::FebEnum::as_str(self))
            }
        }
    };
}

feb_enum! {
    /// Analysis module of the document.
    pub enum ModuleKind ("Module@type") {
        Solid => "solid",
        Biphasic => "biphasic",
        Solute => "solute",
        Multiphasic => "multiphasic",
        Heat => "heat",
        Fluid => "fluid",
        FluidFsi => "fluid-FSI",
    }
}

feb_enum! {
    pub enum AnalysisKind ("analysis") {
        Static => "STATIC",
        SteadyState => "STEADY-STATE",
        Dynamic => "DYNAMIC",
    }
}

feb_enum! {
    /// Quasi-Newton stiffness update method.
    pub enum QnMethod ("qnmethod") {
        Bfgs => "BFGS",
        Broyden => "Broyden",
        Jfnk => "JFNK",
    }
}

feb_enum! {
    pub enum OutputLevel ("output_level") {
        Never => "OUTPUT_NEVER",
        MustPoints => "OUTPUT_MUST_POINTS",
        MajorIterations => "OUTPUT_MAJOR_ITRS",
        MinorIterations => "OUTPUT_MINOR_ITRS",
        Final => "OUTPUT_FINAL",
    }
}

feb_enum! {
    /// Interpolation between load-curve points.
    pub enum Interpolation ("interpolate") {
        Step => "STEP",
        Linear => "LINEAR",
        Smooth => "SMOOTH",
        CubicSpline => "CUBIC SPLINE",
        ControlPoints => "CONTROL POINTS",
        Approximation => "APPROXIMATION",
        SmoothStep => "SMOOTH STEP",
    }
}

feb_enum! {
    /// Load-curve behaviour outside its point range.
    pub enum Extend ("extend") {
        Constant => "CONSTANT",
        Extrapolate => "EXTRAPOLATE",
        Repeat => "REPEAT",
        RepeatOffset => "REPEAT OFFSET",
    }
}

feb_enum! {
    pub enum ElementShape ("Elements@type") {
        Tet4 => "tet4",
        Tet10 => "tet10",
        Tet15 => "tet15",
        Hex8 => "hex8",
        Hex20 => "hex20",
        Hex27 => "hex27",
        Penta6 => "penta6",
        Penta15 => "penta15",
        Pyra5 => "pyra5",
        Tri3 => "tri3",
        Tri6 => "tri6",
        Quad4 => "quad4",
        Quad8 => "quad8",
        Quad9 => "quad9",
    }
}

impl ElementShape {
    pub fn node_count(&self) -> usize {
        match self {
            ElementShape::Tet4 => 4,
            ElementShape::Tet10 => 10,
            ElementShape::Tet15 => 15,
            ElementShape::Hex8 => 8,
            ElementShape::Hex20 => 20,
            ElementShape::Hex27 => 27,
            ElementShape::Penta6 => 6,
            ElementShape::Penta15 => 15,
            ElementShape::Pyra5 => 5,
            ElementShape::Tri3 => 3,
            ElementShape::Tri6 => 6,
            ElementShape::Quad4 => 4,
            ElementShape::Quad8 => 8,
            ElementShape::Quad9 => 9,
        }
    }
}

feb_enum! {
    /// Surface facet shape; also the facet's tag name.
    pub enum FaceShape ("Surface facet") {
        Tri3 => "tri3",
        Tri6 => "tri6",
        Tri7 => "tri7",
        Quad4 => "quad4",
        Quad8 => "quad8",
        Quad9 => "quad9",
    }
}

impl FaceShape {
    pub fn node_count(&self) -> usize {
        match self {
            FaceShape::Tri3 => 3,
            FaceShape::Tri6 => 6,
            FaceShape::Tri7 => 7,
            FaceShape::Quad4 => 4,
            FaceShape::Quad8 => 8,
            FaceShape::Quad9 => 9,
        }
    }
}

/// Degrees of freedom accepted in `dofs` / `dof` fields.
pub const DOF_TOKENS: &[&str] = &[
    "x", "y", "z", "u", "v", "w", "sx", "sy", "sz", "wx", "wy", "wz", "p", "q", "T", "ef",
    "Rx", "Ry", "Rz", "Ru", "Rv", "Rw",
];
