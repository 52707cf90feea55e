//! In-memory drawing session.
//!
//! A small reference implementation of [`DrawingSession`] backed by plain
//! maps. It powers the crate's tests and doctests, and doubles as a dry-run
//! backend: definitions are registered through a builder, instances carry
//! position, scale and field values, and counters expose how many
//! instantiate/duplicate/write operations actually ran.

use std::collections::{HashMap, HashSet};

use crate::geometry::{PlacementTransform, Point3};
use crate::property::{fold_name, ParamTypeCode, PropertyKind, PropertyValue};
use crate::session::{
    ContainerId, DefinitionId, DrawingSession, FieldHandle, InstanceHandle, ScannedField,
    SessionError,
};

#[derive(Debug, Clone)]
struct FieldSpec {
    name: String,
    kind: PropertyKind,
    initial: PropertyValue,
}

#[derive(Debug)]
struct Definition {
    name: String,
    fields: Vec<FieldSpec>,
}

#[derive(Debug)]
struct Instance {
    definition: DefinitionId,
    container: ContainerId,
    position: Point3,
    scale: f64,
    fields: Vec<FieldHandle>,
    erased: bool,
}

#[derive(Debug)]
struct Field {
    name: String,
    kind: PropertyKind,
    value: PropertyValue,
}

/// An in-memory drawing with a staging container and a model container.
#[derive(Debug)]
pub struct MemoryDrawing {
    definitions: HashMap<DefinitionId, Definition>,
    containers: HashMap<ContainerId, String>,
    instances: HashMap<InstanceHandle, Instance>,
    fields: HashMap<FieldHandle, Field>,
    staging: ContainerId,
    model: ContainerId,
    next_id: u64,
    instantiate_count: usize,
    duplicate_count: usize,
    parameter_write_count: usize,
    alignment_fix_count: usize,
    fail_writes: HashSet<String>,
    fail_deletes: HashSet<InstanceHandle>,
}

impl Default for MemoryDrawing {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDrawing {
    pub fn new() -> Self {
        let mut drawing = Self {
            definitions: HashMap::new(),
            containers: HashMap::new(),
            instances: HashMap::new(),
            fields: HashMap::new(),
            staging: ContainerId(0),
            model: ContainerId(0),
            next_id: 0,
            instantiate_count: 0,
            duplicate_count: 0,
            parameter_write_count: 0,
            alignment_fix_count: 0,
            fail_writes: HashSet::new(),
            fail_deletes: HashSet::new(),
        };
        drawing.staging = ContainerId(drawing.next_id());
        drawing
            .containers
            .insert(drawing.staging, "staging".to_string());
        drawing.model = ContainerId(drawing.next_id());
        drawing.containers.insert(drawing.model, "model".to_string());
        drawing
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Start registering a symbol definition.
    pub fn definition(&mut self, name: &str) -> DefinitionBuilder<'_> {
        DefinitionBuilder {
            drawing: self,
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Add a named container and return its id.
    pub fn add_container(&mut self, name: &str) -> ContainerId {
        let id = ContainerId(self.next_id());
        self.containers.insert(id, name.to_string());
        id
    }

    /// The default target container for placements.
    pub fn model_space(&self) -> ContainerId {
        self.model
    }

    /// Make every write to fields with this name fail, for fault-injection
    /// tests.
    pub fn fail_writes_to(&mut self, field_name: &str) {
        self.fail_writes.insert(fold_name(field_name));
    }

    /// Make deleting this instance fail, for cleanup tests.
    pub fn fail_delete_of(&mut self, instance: InstanceHandle) {
        self.fail_deletes.insert(instance);
    }

    pub fn instantiate_count(&self) -> usize {
        self.instantiate_count
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicate_count
    }

    pub fn parameter_write_count(&self) -> usize {
        self.parameter_write_count
    }

    pub fn alignment_fix_count(&self) -> usize {
        self.alignment_fix_count
    }

    /// The uniform scale factor of a live instance.
    pub fn instance_scale(&self, instance: InstanceHandle) -> Option<f64> {
        self.instances
            .get(&instance)
            .filter(|i| !i.erased)
            .map(|i| i.scale)
    }

    pub fn is_erased(&self, instance: InstanceHandle) -> bool {
        self.instances.get(&instance).map_or(false, |i| i.erased)
    }

    /// Count of live instances in a container.
    pub fn live_instances_in(&self, container: ContainerId) -> usize {
        self.instances
            .values()
            .filter(|i| i.container == container && !i.erased)
            .count()
    }

    /// Handles of the live instances in a container, in handle order.
    pub fn instances_in(&self, container: ContainerId) -> Vec<InstanceHandle> {
        let mut handles: Vec<_> = self
            .instances
            .iter()
            .filter(|(_, i)| i.container == container && !i.erased)
            .map(|(h, _)| *h)
            .collect();
        handles.sort_by_key(|h| h.0);
        handles
    }

    fn live(&self, instance: InstanceHandle) -> Result<&Instance, SessionError> {
        let rec = self
            .instances
            .get(&instance)
            .ok_or(SessionError::UnknownInstance(instance))?;
        if rec.erased {
            return Err(SessionError::AlreadyErased(instance));
        }
        Ok(rec)
    }

    fn field_for_write(
        &mut self,
        field: FieldHandle,
    ) -> Result<&mut Field, SessionError> {
        let rec = self
            .fields
            .get_mut(&field)
            .ok_or(SessionError::UnknownField(field))?;
        if self.fail_writes.contains(&fold_name(&rec.name)) {
            return Err(SessionError::WriteRejected {
                field: rec.name.clone(),
                reason: "field is locked".to_string(),
            });
        }
        Ok(rec)
    }
}

impl DrawingSession for MemoryDrawing {
    fn staging_container(&self) -> ContainerId {
        self.staging
    }

    fn instantiate(
        &mut self,
        definition: DefinitionId,
        container: ContainerId,
        at: Point3,
    ) -> Result<InstanceHandle, SessionError> {
        if !self.containers.contains_key(&container) {
            return Err(SessionError::UnknownContainer(container));
        }
        let specs = self
            .definitions
            .get(&definition)
            .ok_or(SessionError::UnknownDefinition(definition))?
            .fields
            .clone();

        let handle = InstanceHandle(self.next_id());
        let mut fields = Vec::with_capacity(specs.len());
        for spec in specs {
            let fh = FieldHandle(self.next_id());
            self.fields.insert(
                fh,
                Field {
                    name: spec.name,
                    kind: spec.kind,
                    value: spec.initial,
                },
            );
            fields.push(fh);
        }

        self.instances.insert(
            handle,
            Instance {
                definition,
                container,
                position: at,
                scale: 1.0,
                fields,
                erased: false,
            },
        );
        self.instantiate_count += 1;
        Ok(handle)
    }

    fn duplicate(
        &mut self,
        instance: InstanceHandle,
        container: ContainerId,
    ) -> Result<InstanceHandle, SessionError> {
        if !self.containers.contains_key(&container) {
            return Err(SessionError::UnknownContainer(container));
        }
        let source = self.live(instance)?;
        let definition = source.definition;
        let position = source.position;
        let scale = source.scale;
        let copied: Vec<Field> = source
            .fields
            .iter()
            .map(|fh| {
                let f = &self.fields[fh];
                Field {
                    name: f.name.clone(),
                    kind: f.kind,
                    value: f.value.clone(),
                }
            })
            .collect();

        let handle = InstanceHandle(self.next_id());
        let mut fields = Vec::with_capacity(copied.len());
        for field in copied {
            let fh = FieldHandle(self.next_id());
            self.fields.insert(fh, field);
            fields.push(fh);
        }

        self.instances.insert(
            handle,
            Instance {
                definition,
                container,
                position,
                scale,
                fields,
                erased: false,
            },
        );
        self.duplicate_count += 1;
        Ok(handle)
    }

    fn apply_transform(
        &mut self,
        instance: InstanceHandle,
        transform: &PlacementTransform,
    ) -> Result<(), SessionError> {
        self.live(instance)?;
        let rec = self.instances.get_mut(&instance).unwrap();
        rec.position = transform.apply_point(rec.position);
        rec.scale = transform.apply_scale(rec.scale);
        Ok(())
    }

    fn reference_point(&self, instance: InstanceHandle) -> Result<Point3, SessionError> {
        Ok(self.live(instance)?.position)
    }

    fn symbol_name(&self, instance: InstanceHandle) -> Result<String, SessionError> {
        let definition = self.live(instance)?.definition;
        Ok(self.definitions[&definition].name.clone())
    }

    fn scan(&self, instance: InstanceHandle) -> Result<Vec<ScannedField>, SessionError> {
        let rec = self.live(instance)?;
        let mut text_fields = Vec::new();
        let mut parameters = Vec::new();
        for fh in &rec.fields {
            let f = &self.fields[fh];
            let scanned = ScannedField {
                handle: *fh,
                name: f.name.clone(),
                kind: f.kind,
                value: f.value.clone(),
            };
            match f.kind {
                PropertyKind::FixedText { .. } => text_fields.push(scanned),
                PropertyKind::Parametric { .. } => parameters.push(scanned),
            }
        }
        text_fields.extend(parameters);
        Ok(text_fields)
    }

    fn write_text(&mut self, field: FieldHandle, text: &str) -> Result<(), SessionError> {
        let rec = self.field_for_write(field)?;
        match rec.kind {
            PropertyKind::FixedText { .. } => {
                rec.value = PropertyValue::Text(text.to_string());
                Ok(())
            }
            PropertyKind::Parametric { .. } => Err(SessionError::WriteRejected {
                field: rec.name.clone(),
                reason: "not a text field".to_string(),
            }),
        }
    }

    fn write_rich_text(&mut self, field: FieldHandle, contents: &str) -> Result<(), SessionError> {
        let rec = self.field_for_write(field)?;
        match rec.kind {
            PropertyKind::FixedText { rich_text: true, .. } => {
                rec.value = PropertyValue::Text(contents.to_string());
                Ok(())
            }
            _ => Err(SessionError::WriteRejected {
                field: rec.name.clone(),
                reason: "not a rich text field".to_string(),
            }),
        }
    }

    fn fix_alignment(&mut self, field: FieldHandle) -> Result<(), SessionError> {
        let rec = self
            .fields
            .get(&field)
            .ok_or(SessionError::UnknownField(field))?;
        match rec.kind {
            PropertyKind::FixedText { .. } => {
                self.alignment_fix_count += 1;
                Ok(())
            }
            PropertyKind::Parametric { .. } => Err(SessionError::WriteRejected {
                field: rec.name.clone(),
                reason: "not a text field".to_string(),
            }),
        }
    }

    fn write_parameter(
        &mut self,
        field: FieldHandle,
        value: &PropertyValue,
    ) -> Result<(), SessionError> {
        let rec = self.field_for_write(field)?;
        match rec.kind {
            PropertyKind::Parametric { .. } => {
                rec.value = value.clone();
                self.parameter_write_count += 1;
                Ok(())
            }
            PropertyKind::FixedText { .. } => Err(SessionError::WriteRejected {
                field: rec.name.clone(),
                reason: "not a parametric field".to_string(),
            }),
        }
    }

    fn delete(&mut self, instance: InstanceHandle) -> Result<(), SessionError> {
        if self.fail_deletes.contains(&instance) {
            return Err(SessionError::WriteRejected {
                field: format!("{:?}", instance),
                reason: "instance is locked".to_string(),
            });
        }
        self.live(instance)?;
        self.instances.get_mut(&instance).unwrap().erased = true;
        Ok(())
    }
}

/// Builder for registering a symbol definition with the drawing.
pub struct DefinitionBuilder<'a> {
    drawing: &'a mut MemoryDrawing,
    name: String,
    fields: Vec<FieldSpec>,
}

impl DefinitionBuilder<'_> {
    /// Add a plain fixed-text field with default alignment.
    pub fn text_field(mut self, name: &str, initial: &str) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind: PropertyKind::FixedText {
                rich_text: false,
                default_alignment: true,
            },
            initial: PropertyValue::Text(initial.to_string()),
        });
        self
    }

    /// Add a rich-text-capable fixed-text field.
    pub fn rich_text_field(mut self, name: &str, initial: &str) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind: PropertyKind::FixedText {
                rich_text: true,
                default_alignment: true,
            },
            initial: PropertyValue::Text(initial.to_string()),
        });
        self
    }

    /// Add a fixed-text field with non-default alignment; writes to it
    /// trigger the alignment fix pass.
    pub fn aligned_text_field(mut self, name: &str, initial: &str) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind: PropertyKind::FixedText {
                rich_text: false,
                default_alignment: false,
            },
            initial: PropertyValue::Text(initial.to_string()),
        });
        self
    }

    /// Add a parametric field.
    pub fn parameter(mut self, name: &str, type_code: ParamTypeCode, initial: PropertyValue) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind: PropertyKind::Parametric { type_code },
            initial,
        });
        self
    }

    /// Finish registration and return the definition's id.
    pub fn register(self) -> DefinitionId {
        let id = DefinitionId(self.drawing.next_id());
        self.drawing.definitions.insert(
            id,
            Definition {
                name: self.name,
                fields: self.fields,
            },
        );
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valve(drawing: &mut MemoryDrawing) -> DefinitionId {
        drawing
            .definition("valve")
            .text_field("TAG", "V-0")
            .parameter("Size", ParamTypeCode::Real, PropertyValue::Real(50.0))
            .register()
    }

    #[test]
    fn test_instantiate_creates_fields_from_definition() {
        let mut drawing = MemoryDrawing::new();
        let def = valve(&mut drawing);
        let staging = drawing.staging_container();

        let h = drawing.instantiate(def, staging, Point3::ORIGIN).unwrap();
        let fields = drawing.scan(h).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "TAG");
        assert_eq!(fields[1].value, PropertyValue::Real(50.0));
        assert_eq!(drawing.instantiate_count(), 1);
    }

    #[test]
    fn test_duplicate_copies_values_into_new_fields() {
        let mut drawing = MemoryDrawing::new();
        let def = valve(&mut drawing);
        let staging = drawing.staging_container();
        let model = drawing.model_space();

        let original = drawing.instantiate(def, staging, Point3::ORIGIN).unwrap();
        let tag = drawing.scan(original).unwrap()[0].handle;
        drawing.write_text(tag, "V-17").unwrap();

        let copy = drawing.duplicate(original, model).unwrap();
        let copied = drawing.scan(copy).unwrap();
        assert_eq!(copied[0].value, PropertyValue::Text("V-17".to_string()));
        assert_ne!(copied[0].handle, tag);
        assert_eq!(drawing.live_instances_in(model), 1);
    }

    #[test]
    fn test_erased_instance_rejects_operations() {
        let mut drawing = MemoryDrawing::new();
        let def = valve(&mut drawing);
        let staging = drawing.staging_container();

        let h = drawing.instantiate(def, staging, Point3::ORIGIN).unwrap();
        drawing.delete(h).unwrap();
        assert!(drawing.is_erased(h));
        assert!(matches!(
            drawing.duplicate(h, staging),
            Err(SessionError::AlreadyErased(_))
        ));
        assert!(matches!(
            drawing.delete(h),
            Err(SessionError::AlreadyErased(_))
        ));
    }

    #[test]
    fn test_unknown_ids_are_faults() {
        let mut drawing = MemoryDrawing::new();
        let def = valve(&mut drawing);
        assert!(matches!(
            drawing.instantiate(def, ContainerId(999), Point3::ORIGIN),
            Err(SessionError::UnknownContainer(_))
        ));
        assert!(matches!(
            drawing.instantiate(DefinitionId(999), drawing.staging_container(), Point3::ORIGIN),
            Err(SessionError::UnknownDefinition(_))
        ));
    }

    #[test]
    fn test_locked_field_rejects_writes() {
        let mut drawing = MemoryDrawing::new();
        let def = valve(&mut drawing);
        let staging = drawing.staging_container();
        drawing.fail_writes_to("TAG");

        let h = drawing.instantiate(def, staging, Point3::ORIGIN).unwrap();
        let tag = drawing.scan(h).unwrap()[0].handle;
        assert!(matches!(
            drawing.write_text(tag, "V-1"),
            Err(SessionError::WriteRejected { .. })
        ));
    }
}
