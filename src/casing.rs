//! Field name casing between the internal (camelCase) names used by table
//! columns and the names a backend expects on the wire.
//!
//! The default [`DashCase`] follows json:api dasherized member names:
//! `lastName` => `last-name`. Backends with other conventions plug in their
//! own [`FieldCasing`], either as a type or as a plain closure:
//! ```rust
//! use tabular_query::casing::{Direction, FieldCasing};
//!
//! let keep_camel = |field: &str, _direction: Direction| -> Option<String> {
//!     (!field.is_empty()).then(|| field.to_owned())
//! };
//! assert_eq!(keep_camel.to_wire("isAdmin").as_deref(), Some("isAdmin"));
//! ```
use convert_case::{Boundary, Case, Converter};
use serde::{Deserialize, Serialize};

/// Which way a field name is travelling.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    ToWire,
    FromWire,
}

/// A bidirectional field name transform.
///
/// Implementations only see single path segments; dotted relationship paths
/// are split before and joined after by [`translate_path`].
pub trait FieldCasing: Send + Sync {
    fn translate(&self, field: &str, direction: Direction) -> Option<String>;

    fn to_wire(&self, field: &str) -> Option<String> {
        self.translate(field, Direction::ToWire)
    }

    fn from_wire(&self, field: &str) -> Option<String> {
        self.translate(field, Direction::FromWire)
    }
}

impl<F> FieldCasing for F
where
    F: Fn(&str, Direction) -> Option<String> + Send + Sync,
{
    fn translate(&self, field: &str, direction: Direction) -> Option<String> {
        self(field, direction)
    }
}

/// camelCase internally, dash-case on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashCase;

impl FieldCasing for DashCase {
    fn translate(&self, field: &str, direction: Direction) -> Option<String> {
        if field.is_empty() {
            return None;
        }
        Some(match direction {
            Direction::ToWire => dasherize(field),
            Direction::FromWire => camelize(field),
        })
    }
}

/// camelCase both ways, for backends that do not dasherize.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCase;

impl FieldCasing for CamelCase {
    fn translate(&self, field: &str, _direction: Direction) -> Option<String> {
        if field.is_empty() {
            return None;
        }
        Some(camelize(field))
    }
}

/// Sends names exactly as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl FieldCasing for Verbatim {
    fn translate(&self, field: &str, _direction: Direction) -> Option<String> {
        if field.is_empty() {
            return None;
        }
        Some(field.to_owned())
    }
}

/// Translate a possibly dotted path segment by segment, keeping the dots.
///
/// Returns `None` when the path is empty or any segment translates to
/// nothing.
pub fn translate_path(
    casing: &dyn FieldCasing,
    path: &str,
    direction: Direction,
) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let segments = path
        .split('.')
        .map(|segment| casing.translate(segment, direction).filter(|s| !s.is_empty()))
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("."))
}

/// Word boundaries inside a camelCase or snake_case field name.
const FIELD_BOUNDARIES: [Boundary; 4] = [
    Boundary::LowerUpper,
    Boundary::DigitUpper,
    Boundary::Underscore,
    Boundary::Space,
];

/// Word boundaries inside a dash-case wire name; camelCase humps are kept
/// so an already camelized name survives.
const WIRE_BOUNDARIES: [Boundary; 5] = [
    Boundary::Hyphen,
    Boundary::Underscore,
    Boundary::Space,
    Boundary::LowerUpper,
    Boundary::DigitUpper,
];

/// `lastName` => `last-name`, `first_name` => `first-name`
pub fn dasherize(input: &str) -> String {
    Converter::new()
        .set_boundaries(&FIELD_BOUNDARIES)
        .to_case(Case::Kebab)
        .convert(input)
}

/// `last-name` => `lastName`, `Last_name` => `lastName`
pub fn camelize(input: &str) -> String {
    Converter::new()
        .set_boundaries(&WIRE_BOUNDARIES)
        .to_case(Case::Camel)
        .convert(input)
}
