//! Property collections scanned from one symbol instance.

use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink};
use crate::property::{
    name_matches, FromPropertyValue, ParamTypeCode, PropertyKind, PropertyModel, PropertyValue,
};
use crate::session::{DrawingSession, InstanceHandle, SessionError};

/// The ordered properties of one scanned symbol instance.
///
/// Iteration order is discovery order (fixed-text fields first, then
/// parametric fields). Lookup returns the first match; duplicate names are
/// tolerated. Equality is order-insensitive: two sets are equal when they
/// hold the same multiset of properties.
#[derive(Debug, Clone)]
pub struct PropertySet {
    properties: Vec<PropertyModel>,
    symbol_name: String,
    instance: InstanceHandle,
}

impl PropertySet {
    /// Scan an instance's fields into a fresh set.
    pub fn scan<S: DrawingSession>(
        session: &S,
        instance: InstanceHandle,
    ) -> Result<Self, SessionError> {
        let symbol_name = session.symbol_name(instance)?;
        let properties = session
            .scan(instance)?
            .into_iter()
            .map(|f| PropertyModel::new(f.name, f.kind, f.value, f.handle))
            .collect();
        Ok(Self {
            properties,
            symbol_name,
            instance,
        })
    }

    /// Name of the symbol these properties belong to.
    pub fn symbol_name(&self) -> &str {
        &self.symbol_name
    }

    /// The instance these properties were scanned from.
    pub fn instance(&self) -> InstanceHandle {
        self.instance
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyModel> {
        self.properties.iter()
    }

    /// First property whose name matches `pattern` under the given mode.
    pub fn find(&self, pattern: &str, exact: bool) -> Option<&PropertyModel> {
        self.properties
            .iter()
            .find(|p| name_matches(p.name(), pattern, exact))
    }

    /// Typed read. A missing property is reported when `required` (silent
    /// otherwise) and yields the type's zero value. A stored value that
    /// cannot be coerced to `T` is reported as an error when `required` and
    /// logged otherwise, again yielding the zero value.
    pub fn value<T: FromPropertyValue>(
        &self,
        pattern: &str,
        required: bool,
        exact: bool,
        sink: &dyn DiagnosticSink,
    ) -> T {
        self.value_inner(pattern, required, exact, sink).0
    }

    /// Typed read with a fallback: `default` is returned whenever the
    /// resolved value equals `T`'s zero value, including when the property
    /// is absent.
    pub fn value_or<T: FromPropertyValue>(
        &self,
        pattern: &str,
        default: T,
        required: bool,
        exact: bool,
        sink: &dyn DiagnosticSink,
    ) -> T {
        let (value, _) = self.value_inner(pattern, required, exact, sink);
        if value == T::default() {
            default
        } else {
            value
        }
    }

    /// Like [`value_or`](Self::value_or), but when the property exists and
    /// holds its zero value the default is also written back into the field.
    /// The write-back is best-effort: failures are logged and never
    /// escalated.
    pub fn value_or_init<T, S>(
        &mut self,
        session: &mut S,
        pattern: &str,
        default: T,
        required: bool,
        exact: bool,
        sink: &dyn DiagnosticSink,
    ) -> T
    where
        T: FromPropertyValue + Into<PropertyValue> + Clone,
        S: DrawingSession,
    {
        let (value, has_property) = self.value_inner(pattern, required, exact, sink);
        if value == T::default() {
            if has_property {
                self.write(session, pattern, default.clone().into(), exact, false, &LogSink);
            }
            return default;
        }
        value
    }

    fn value_inner<T: FromPropertyValue>(
        &self,
        pattern: &str,
        required: bool,
        exact: bool,
        sink: &dyn DiagnosticSink,
    ) -> (T, bool) {
        let prop = match self.find(pattern, exact) {
            Some(prop) => prop,
            None => {
                if required {
                    sink.report(Diagnostic::missing_property(pattern, Some(self.instance)));
                }
                return (T::default(), false);
            }
        };

        match T::from_value(prop.value()) {
            Some(value) => (value, true),
            None => {
                let stored = prop.value().display_text();
                if required {
                    sink.report(Diagnostic::type_mismatch(
                        pattern,
                        &stored,
                        Some(self.instance),
                    ));
                } else {
                    log::warn!(
                        "property '{}' in symbol '{}' holds incompatible value {}",
                        pattern,
                        self.symbol_name,
                        stored
                    );
                }
                (T::default(), true)
            }
        }
    }

    /// Write a value into the first matching property, dispatching on its
    /// kind. Returns true when the field was brought to the requested value
    /// (including the no-write case where it already held it).
    ///
    /// Failures never escalate: a missing required property and every field
    /// fault are reported through the sink and swallowed.
    pub fn write<S: DrawingSession>(
        &mut self,
        session: &mut S,
        pattern: &str,
        value: PropertyValue,
        exact: bool,
        required: bool,
        sink: &dyn DiagnosticSink,
    ) -> bool {
        let index = self
            .properties
            .iter()
            .position(|p| name_matches(p.name(), pattern, exact));

        let index = match index {
            Some(index) => index,
            None => {
                if required {
                    sink.report(Diagnostic::missing_property(pattern, Some(self.instance)));
                }
                return false;
            }
        };

        match self.properties[index].kind() {
            PropertyKind::FixedText {
                rich_text,
                default_alignment,
            } => self.write_fixed_text(session, index, &value, rich_text, default_alignment, sink),
            PropertyKind::Parametric { type_code } => {
                self.write_parametric(session, index, &value, type_code, sink)
            }
        }
    }

    fn write_fixed_text<S: DrawingSession>(
        &mut self,
        session: &mut S,
        index: usize,
        value: &PropertyValue,
        rich_text: bool,
        default_alignment: bool,
        sink: &dyn DiagnosticSink,
    ) -> bool {
        let field = self.properties[index].source();
        let text = value.display_text();

        let result = if rich_text {
            session.write_rich_text(field, &text)
        } else {
            session.write_text(field, &text)
        };
        let result = result.and_then(|_| {
            if default_alignment {
                Ok(())
            } else {
                session.fix_alignment(field)
            }
        });

        match result {
            Ok(()) => {
                self.properties[index].set_value(PropertyValue::Text(text));
                true
            }
            Err(_) => {
                self.report_write_failure(index, value, sink);
                false
            }
        }
    }

    fn write_parametric<S: DrawingSession>(
        &mut self,
        session: &mut S,
        index: usize,
        value: &PropertyValue,
        type_code: ParamTypeCode,
        sink: &dyn DiagnosticSink,
    ) -> bool {
        // A null value carries nothing to assign; skip silently.
        if matches!(value, PropertyValue::Null) {
            return false;
        }

        let coerced = match type_code {
            // An untyped parameter accepts nothing; skip silently.
            ParamTypeCode::Null => return false,
            ParamTypeCode::Real => value.as_real().map(PropertyValue::Real),
            _ => value.coerce_like(self.properties[index].value()),
        };

        let coerced = match coerced {
            Some(coerced) => coerced,
            None => {
                self.report_write_failure(index, value, sink);
                return false;
            }
        };

        // Avoid spurious parametric recompute when nothing changes.
        if &coerced == self.properties[index].value() {
            return true;
        }

        let field = self.properties[index].source();
        match session.write_parameter(field, &coerced) {
            Ok(()) => {
                self.properties[index].set_value(coerced);
                true
            }
            Err(_) => {
                self.report_write_failure(index, value, sink);
                false
            }
        }
    }

    fn report_write_failure(
        &self,
        index: usize,
        attempted: &PropertyValue,
        sink: &dyn DiagnosticSink,
    ) {
        sink.report(Diagnostic::write_failure(
            self.properties[index].name(),
            &attempted.display_text(),
            &self.symbol_name,
            Some(self.instance),
        ));
    }
}

impl PartialEq for PropertySet {
    fn eq(&self, other: &Self) -> bool {
        if self.properties.len() != other.properties.len() {
            return false;
        }
        let mut used = vec![false; other.properties.len()];
        'outer: for p in &self.properties {
            for (j, q) in other.properties.iter().enumerate() {
                if !used[j] && p == q {
                    used[j] = true;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, RecordingSink};
    use crate::session::memory::MemoryDrawing;
    use crate::session::DrawingSession;

    fn drawing_with_door() -> (MemoryDrawing, crate::session::DefinitionId) {
        let mut drawing = MemoryDrawing::new();
        let door = drawing
            .definition("door")
            .text_field("LABEL", "")
            .text_field("ROOM", "0")
            .parameter("Width", ParamTypeCode::Real, PropertyValue::Real(900.0))
            .parameter("Leafs", ParamTypeCode::Integer, PropertyValue::Integer(1))
            .register();
        (drawing, door)
    }

    fn scanned(drawing: &mut MemoryDrawing, door: crate::session::DefinitionId) -> PropertySet {
        let staging = drawing.staging_container();
        let instance = drawing
            .instantiate(door, staging, crate::geometry::Point3::ORIGIN)
            .unwrap();
        PropertySet::scan(drawing, instance).unwrap()
    }

    #[test]
    fn test_scan_orders_text_fields_first() {
        let (mut drawing, door) = drawing_with_door();
        let set = scanned(&mut drawing, door);
        let names: Vec<_> = set.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["LABEL", "ROOM", "Width", "Leafs"]);
        assert_eq!(set.symbol_name(), "door");
    }

    #[test]
    fn test_typed_read_with_coercion() {
        let (mut drawing, door) = drawing_with_door();
        let set = scanned(&mut drawing, door);
        let sink = RecordingSink::new();

        let width: f64 = set.value("Width", true, true, &sink);
        assert_eq!(width, 900.0);
        // Text field holding "0" reads as the number 0.
        let room: i64 = set.value("ROOM", true, true, &sink);
        assert_eq!(room, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_required_miss_reports_and_yields_zero() {
        let (mut drawing, door) = drawing_with_door();
        let set = scanned(&mut drawing, door);
        let sink = RecordingSink::new();

        let missing: f64 = set.value("NoSuch", true, true, &sink);
        assert_eq!(missing, 0.0);
        assert_eq!(sink.count_of(DiagnosticKind::MissingProperty), 1);

        // Optional miss is silent.
        let missing: f64 = set.value("NoSuch", false, true, &sink);
        assert_eq!(missing, 0.0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_substring_lookup_finds_first_match() {
        let (mut drawing, door) = drawing_with_door();
        let set = scanned(&mut drawing, door);
        let sink = RecordingSink::new();

        let width: f64 = set.value("width", true, false, &sink);
        assert_eq!(width, 900.0);
        assert!(set.find("width", true).is_none());
    }

    #[test]
    fn test_value_or_init_writes_default_into_zero_field() {
        let (mut drawing, door) = drawing_with_door();
        let mut set = scanned(&mut drawing, door);
        let sink = RecordingSink::new();

        // ROOM holds "0": default substituted and written back.
        let room = set.value_or_init(&mut drawing, "ROOM", 5_i64, false, true, &sink);
        assert_eq!(room, 5);
        assert_eq!(
            set.find("ROOM", true).unwrap().value(),
            &PropertyValue::Text("5".to_string())
        );

        // Width holds 900: untouched.
        let width = set.value_or_init(&mut drawing, "Width", 5.0, false, true, &sink);
        assert_eq!(width, 900.0);
        assert_eq!(
            set.find("Width", true).unwrap().value(),
            &PropertyValue::Real(900.0)
        );
    }

    #[test]
    fn test_write_text_updates_model_in_place() {
        let (mut drawing, door) = drawing_with_door();
        let mut set = scanned(&mut drawing, door);
        let sink = RecordingSink::new();

        assert!(set.write(
            &mut drawing,
            "LABEL",
            PropertyValue::from("A-101"),
            true,
            true,
            &sink
        ));
        assert_eq!(
            set.find("LABEL", true).unwrap().value(),
            &PropertyValue::Text("A-101".to_string())
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_write_parametric_skips_equal_value() {
        let (mut drawing, door) = drawing_with_door();
        let mut set = scanned(&mut drawing, door);
        let sink = RecordingSink::new();

        let writes_before = drawing.parameter_write_count();
        assert!(set.write(
            &mut drawing,
            "Width",
            PropertyValue::Real(900.0),
            true,
            true,
            &sink
        ));
        assert_eq!(drawing.parameter_write_count(), writes_before);

        assert!(set.write(
            &mut drawing,
            "Width",
            PropertyValue::Real(1200.0),
            true,
            true,
            &sink
        ));
        assert_eq!(drawing.parameter_write_count(), writes_before + 1);
    }

    #[test]
    fn test_write_parametric_coerces_text_to_integer() {
        let (mut drawing, door) = drawing_with_door();
        let mut set = scanned(&mut drawing, door);
        let sink = RecordingSink::new();

        assert!(set.write(
            &mut drawing,
            "Leafs",
            PropertyValue::from("2"),
            true,
            true,
            &sink
        ));
        assert_eq!(
            set.find("Leafs", true).unwrap().value(),
            &PropertyValue::Integer(2)
        );
    }

    #[test]
    fn test_failed_write_is_reported_not_raised() {
        let (mut drawing, door) = drawing_with_door();
        let mut set = scanned(&mut drawing, door);
        let sink = RecordingSink::new();
        drawing.fail_writes_to("LABEL");

        assert!(!set.write(
            &mut drawing,
            "LABEL",
            PropertyValue::from("A-101"),
            true,
            true,
            &sink
        ));
        assert_eq!(sink.count_of(DiagnosticKind::WriteFailure), 1);
        let entry = &sink.entries()[0];
        assert!(entry.message.contains("LABEL"));
        assert!(entry.message.contains("A-101"));
        assert!(entry.message.contains("door"));
    }

    #[test]
    fn test_sets_scanned_from_identical_instances_are_equal() {
        let (mut drawing, door) = drawing_with_door();
        let staging = drawing.staging_container();
        let a = drawing
            .instantiate(door, staging, crate::geometry::Point3::ORIGIN)
            .unwrap();
        let b = drawing
            .instantiate(door, staging, crate::geometry::Point3::ORIGIN)
            .unwrap();

        let set_a = PropertySet::scan(&drawing, a).unwrap();
        let set_b = PropertySet::scan(&drawing, b).unwrap();
        assert_eq!(set_a, set_b);

        // Re-scanning the same unchanged instance is stable.
        let again = PropertySet::scan(&drawing, a).unwrap();
        assert_eq!(set_a, again);
    }

    #[test]
    fn test_sets_with_different_values_are_not_equal() {
        let (mut drawing, door) = drawing_with_door();
        let staging = drawing.staging_container();
        let a = drawing
            .instantiate(door, staging, crate::geometry::Point3::ORIGIN)
            .unwrap();
        let b = drawing
            .instantiate(door, staging, crate::geometry::Point3::ORIGIN)
            .unwrap();

        let mut set_b = PropertySet::scan(&drawing, b).unwrap();
        let sink = RecordingSink::new();
        set_b.write(
            &mut drawing,
            "Width",
            PropertyValue::Real(1200.0),
            true,
            true,
            &sink,
        );

        let set_a = PropertySet::scan(&drawing, a).unwrap();
        assert_ne!(set_a, set_b);
    }
}
