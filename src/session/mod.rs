//! Boundary to the host drawing document.
//!
//! The core never talks to a drawing database directly; everything it needs
//! is expressed by the [`DrawingSession`] trait: instantiate a definition,
//! duplicate an instance, transform it, scan its fields, write to a field,
//! delete it. The session is an external, already-open resource; the core
//! neither opens nor closes it.

pub mod memory;

use thiserror::Error;

use crate::geometry::{PlacementTransform, Point3};
use crate::property::{PropertyKind, PropertyValue};

pub use memory::{DefinitionBuilder, MemoryDrawing};

/// Identity of a symbol definition in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefinitionId(pub u64);

/// Identity of a container (a drawing space) instances live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

/// Handle to one placed symbol instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

/// Handle to one field (fixed-text or parametric) on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle(pub u64);

/// One field discovered while scanning an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedField {
    pub handle: FieldHandle,
    pub name: String,
    pub kind: PropertyKind,
    pub value: PropertyValue,
}

/// Faults raised by the host document.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown definition {0:?}")]
    UnknownDefinition(DefinitionId),

    #[error("unknown container {0:?}")]
    UnknownContainer(ContainerId),

    #[error("unknown instance {0:?}")]
    UnknownInstance(InstanceHandle),

    #[error("unknown field {0:?}")]
    UnknownField(FieldHandle),

    #[error("write to field '{field}' rejected: {reason}")]
    WriteRejected { field: String, reason: String },

    #[error("instance {0:?} was already erased")]
    AlreadyErased(InstanceHandle),
}

/// Operations the core requires from the host document. Each is assumed
/// atomic: it either succeeds or raises a [`SessionError`].
pub trait DrawingSession {
    /// The container used for staging template instances.
    fn staging_container(&self) -> ContainerId;

    /// Insert a fresh instance of `definition` into `container` at `at`.
    fn instantiate(
        &mut self,
        definition: DefinitionId,
        container: ContainerId,
        at: Point3,
    ) -> Result<InstanceHandle, SessionError>;

    /// Copy an existing instance, fields and all, into `container`.
    fn duplicate(
        &mut self,
        instance: InstanceHandle,
        container: ContainerId,
    ) -> Result<InstanceHandle, SessionError>;

    /// Apply a placement transform to an instance in place.
    fn apply_transform(
        &mut self,
        instance: InstanceHandle,
        transform: &PlacementTransform,
    ) -> Result<(), SessionError>;

    /// The instance's reference (insertion) point.
    fn reference_point(&self, instance: InstanceHandle) -> Result<Point3, SessionError>;

    /// The effective definition name of an instance, for diagnostics.
    fn symbol_name(&self, instance: InstanceHandle) -> Result<String, SessionError>;

    /// Discover an instance's fields, fixed-text fields first, then
    /// parametric fields, each in definition order.
    fn scan(&self, instance: InstanceHandle) -> Result<Vec<ScannedField>, SessionError>;

    /// Assign plain text to a fixed-text field.
    fn write_text(&mut self, field: FieldHandle, text: &str) -> Result<(), SessionError>;

    /// Update a rich-text-capable field through its contents accessor.
    fn write_rich_text(&mut self, field: FieldHandle, contents: &str) -> Result<(), SessionError>;

    /// Re-run alignment layout for a field with non-default alignment.
    fn fix_alignment(&mut self, field: FieldHandle) -> Result<(), SessionError>;

    /// Assign a new value to a parametric field.
    fn write_parameter(
        &mut self,
        field: FieldHandle,
        value: &PropertyValue,
    ) -> Result<(), SessionError>;

    /// Erase an instance from its container.
    fn delete(&mut self, instance: InstanceHandle) -> Result<(), SessionError>;
}
