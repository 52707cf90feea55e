//! Placement requests and the template cache.

pub mod cache;

pub use cache::{TemplateCache, TemplateKey};

use crate::geometry::Point3;
use crate::property::PropertyValue;
use crate::session::{ContainerId, DefinitionId};

/// One property value to apply to a freshly configured template.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOverride {
    /// Name (or name pattern) of the property to set.
    pub name: String,
    pub value: PropertyValue,
    /// Anchored name match (the default); false permits substring matching
    /// when the caller only knows part of the field name.
    pub exact_match: bool,
    /// A required override that fails is reported as an error tied to the
    /// instance; optional failures are logged only.
    pub required: bool,
}

impl PropertyOverride {
    pub fn new(name: &str, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            exact_match: true,
            required: false,
        }
    }

    /// Mark this override as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Switch to substring name matching.
    pub fn substring_match(mut self) -> Self {
        self.exact_match = false;
        self
    }
}

/// One desired insertion of a symbol definition.
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    /// The symbol definition to instantiate.
    pub definition: DefinitionId,
    /// Where the placed instance will live.
    pub container: ContainerId,
    /// Target reference point of the placed instance.
    pub position: Point3,
    /// Uniform scale factor; must be positive.
    pub scale: f64,
    /// Property overrides, applied in list order.
    pub overrides: Vec<PropertyOverride>,
}

impl PlacementRequest {
    pub fn new(definition: DefinitionId, container: ContainerId, position: Point3) -> Self {
        Self {
            definition,
            container,
            position,
            scale: 1.0,
            overrides: Vec::new(),
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_override(mut self, override_: PropertyOverride) -> Self {
        self.overrides.push(override_);
        self
    }

    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = PropertyOverride>) -> Self {
        self.overrides.extend(overrides);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_defaults() {
        let o = PropertyOverride::new("Width", 900.0);
        assert!(o.exact_match);
        assert!(!o.required);
        assert_eq!(o.value, PropertyValue::Real(900.0));
    }

    #[test]
    fn test_request_builder() {
        let request = PlacementRequest::new(
            DefinitionId(1),
            ContainerId(2),
            Point3::new(1.0, 2.0, 0.0),
        )
        .with_scale(2.0)
        .with_override(PropertyOverride::new("LABEL", "A-1").required())
        .with_override(PropertyOverride::new("width", 900.0).substring_match());

        assert_eq!(request.scale, 2.0);
        assert_eq!(request.overrides.len(), 2);
        assert!(request.overrides[0].required);
        assert!(!request.overrides[1].exact_match);
    }
}
