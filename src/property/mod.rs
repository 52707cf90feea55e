//! The unified property model.
//!
//! A symbol instance carries two physically different kinds of named fields:
//! fixed-text fields (attribute-like text slots) and parametric fields
//! (typed parameters that drive geometry). Both are surfaced as
//! [`PropertyModel`] values so reads and writes go through one interface,
//! dispatching on [`PropertyKind`] rather than on runtime type inspection.

pub mod set;

use crate::session::FieldHandle;

pub use set::PropertySet;

/// Runtime type code of a parametric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamTypeCode {
    /// No runtime type; writes to such a field are silent no-ops.
    Null,
    Real,
    Integer,
    Text,
    /// Any other host type; coercion targets the field's current value.
    Other,
}

/// What a property is physically backed by, with the per-kind details
/// needed to write it correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// An attribute-like text slot.
    FixedText {
        /// The field stores rich text and must be updated through its
        /// contents accessor.
        rich_text: bool,
        /// The field uses default alignment; when false, an alignment fix
        /// pass runs after every write.
        default_alignment: bool,
    },
    /// A named dynamic parameter.
    Parametric { type_code: ParamTypeCode },
}

/// A property's value. `Null` stands for both "no value" and the zero value
/// of an untyped parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Text(String),
    Real(f64),
    Integer(i64),
    Bool(bool),
}

impl PropertyValue {
    /// The textual form used when this value is written into a fixed-text
    /// field, and in diagnostics.
    pub fn display_text(&self) -> String {
        match self {
            PropertyValue::Null => String::new(),
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::Real(r) => format!("{}", r),
            PropertyValue::Integer(i) => format!("{}", i),
            PropertyValue::Bool(b) => format!("{}", b),
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            PropertyValue::Real(r) => Some(*r),
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            PropertyValue::Null => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            PropertyValue::Real(r) if r.is_finite() => Some(r.round() as i64),
            PropertyValue::Real(_) => None,
            PropertyValue::Bool(b) => Some(if *b { 1 } else { 0 }),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            PropertyValue::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            PropertyValue::Integer(i) => Some(*i != 0),
            PropertyValue::Real(r) => Some(*r != 0.0),
            PropertyValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            PropertyValue::Null => None,
        }
    }

    /// Convert this value to the concrete variant of `like`, for parametric
    /// fields whose type code gives no better target.
    pub fn coerce_like(&self, like: &PropertyValue) -> Option<PropertyValue> {
        match like {
            PropertyValue::Null => Some(self.clone()),
            PropertyValue::Text(_) => Some(PropertyValue::Text(self.display_text())),
            PropertyValue::Real(_) => self.as_real().map(PropertyValue::Real),
            PropertyValue::Integer(_) => self.as_integer().map(PropertyValue::Integer),
            PropertyValue::Bool(_) => self.as_bool().map(PropertyValue::Bool),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Real(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

/// Typed extraction from a [`PropertyValue`], used by the typed read path.
///
/// `Null` coerces to the implementing type's zero value; `None` means the
/// stored value cannot represent the requested type.
pub trait FromPropertyValue: Sized + Default + PartialEq {
    fn from_value(value: &PropertyValue) -> Option<Self>;
}

impl FromPropertyValue for String {
    fn from_value(value: &PropertyValue) -> Option<Self> {
        Some(value.display_text())
    }
}

impl FromPropertyValue for f64 {
    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Null => Some(0.0),
            other => other.as_real(),
        }
    }
}

impl FromPropertyValue for i64 {
    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Null => Some(0),
            other => other.as_integer(),
        }
    }
}

impl FromPropertyValue for bool {
    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Null => Some(false),
            other => other.as_bool(),
        }
    }
}

/// One named property of a scanned symbol instance.
///
/// Equality covers the case-folded name and the value only; the source
/// field handle identifies location, not identity, and stays out of it.
#[derive(Debug, Clone)]
pub struct PropertyModel {
    name: String,
    kind: PropertyKind,
    value: PropertyValue,
    source: FieldHandle,
}

impl PropertyModel {
    pub fn new(name: String, kind: PropertyKind, value: PropertyValue, source: FieldHandle) -> Self {
        Self {
            name,
            kind,
            value,
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn source(&self) -> FieldHandle {
        self.source
    }

    pub(crate) fn set_value(&mut self, value: PropertyValue) {
        self.value = value;
    }
}

impl PartialEq for PropertyModel {
    fn eq(&self, other: &Self) -> bool {
        fold_name(&self.name) == fold_name(&other.name) && self.value == other.value
    }
}

/// Case-fold a property name for comparison and lookup.
pub(crate) fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Name lookup policy: exact anchored match, or case-insensitive substring
/// match for callers that only know part of the field name.
pub(crate) fn name_matches(name: &str, pattern: &str, exact: bool) -> bool {
    let name = fold_name(name);
    let pattern = fold_name(pattern);
    if exact {
        name == pattern
    } else {
        name.contains(&pattern)
    }
}
