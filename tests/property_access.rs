//! Tests for the unified property read/write contract.

use pretty_assertions::assert_eq;

use block_stamper::{
    DefinitionId, DiagnosticKind, DrawingSession, MemoryDrawing, ParamTypeCode, Point3,
    PropertySet, PropertyValue, RecordingSink, Severity,
};

fn drawing_with_frame() -> (MemoryDrawing, DefinitionId) {
    let mut drawing = MemoryDrawing::new();
    let frame = drawing
        .definition("frame")
        .text_field("TITLE", "")
        .text_field("CODE", "abc")
        .rich_text_field("NOTES", "")
        .aligned_text_field("STAMP", "")
        .parameter("Width", ParamTypeCode::Real, PropertyValue::Real(0.0))
        .parameter("Count", ParamTypeCode::Integer, PropertyValue::Integer(0))
        .parameter("Grip", ParamTypeCode::Null, PropertyValue::Null)
        .register();
    (drawing, frame)
}

fn scan_fresh(drawing: &mut MemoryDrawing, frame: DefinitionId) -> PropertySet {
    let staging = drawing.staging_container();
    let instance = drawing.instantiate(frame, staging, Point3::ORIGIN).unwrap();
    PropertySet::scan(drawing, instance).unwrap()
}

#[test]
fn test_rich_text_field_goes_through_contents_accessor() {
    let (mut drawing, frame) = drawing_with_frame();
    let mut set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();

    assert!(set.write(
        &mut drawing,
        "NOTES",
        PropertyValue::from("line one\\Pline two"),
        true,
        true,
        &sink
    ));
    assert_eq!(
        set.find("NOTES", true).unwrap().value(),
        &PropertyValue::Text("line one\\Pline two".to_string())
    );
    assert!(sink.is_empty());
}

#[test]
fn test_non_default_alignment_triggers_fix_pass() {
    let (mut drawing, frame) = drawing_with_frame();
    let mut set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();

    set.write(
        &mut drawing,
        "TITLE",
        PropertyValue::from("Plan"),
        true,
        true,
        &sink,
    );
    assert_eq!(drawing.alignment_fix_count(), 0);

    set.write(
        &mut drawing,
        "STAMP",
        PropertyValue::from("Rev A"),
        true,
        true,
        &sink,
    );
    assert_eq!(drawing.alignment_fix_count(), 1);
}

#[test]
fn test_numbers_are_stringified_into_text_fields() {
    let (mut drawing, frame) = drawing_with_frame();
    let mut set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();

    set.write(
        &mut drawing,
        "TITLE",
        PropertyValue::Real(12.5),
        true,
        true,
        &sink,
    );
    assert_eq!(
        set.find("TITLE", true).unwrap().value(),
        &PropertyValue::Text("12.5".to_string())
    );
}

#[test]
fn test_null_type_code_parameter_ignores_writes() {
    let (mut drawing, frame) = drawing_with_frame();
    let mut set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();

    let applied = set.write(
        &mut drawing,
        "Grip",
        PropertyValue::Real(5.0),
        true,
        true,
        &sink,
    );
    assert!(!applied);
    assert!(sink.is_empty());
    assert_eq!(drawing.parameter_write_count(), 0);
}

#[test]
fn test_real_parameter_coerces_text_input() {
    let (mut drawing, frame) = drawing_with_frame();
    let mut set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();

    assert!(set.write(
        &mut drawing,
        "Width",
        PropertyValue::from("1250.5"),
        true,
        true,
        &sink
    ));
    assert_eq!(
        set.find("Width", true).unwrap().value(),
        &PropertyValue::Real(1250.5)
    );
}

#[test]
fn test_uncoercible_parameter_value_is_a_write_failure() {
    let (mut drawing, frame) = drawing_with_frame();
    let mut set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();

    let applied = set.write(
        &mut drawing,
        "Width",
        PropertyValue::from("wide"),
        true,
        true,
        &sink,
    );
    assert!(!applied);
    assert_eq!(sink.len(), 1);
    assert!(sink.entries()[0].message.contains("Width"));
}

#[test]
fn test_uncoercible_typed_read_reports_mismatch_only_when_required() {
    let (mut drawing, frame) = drawing_with_frame();
    let set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();

    // CODE holds "abc": a required read as f64 reports one mismatch
    // naming the property and the stored value, and yields zero.
    let code: f64 = set.value("CODE", true, true, &sink);
    assert_eq!(code, 0.0);
    assert_eq!(sink.count_of(DiagnosticKind::TypeMismatch), 1);
    let entry = &sink.entries()[0];
    assert_eq!(entry.severity, Severity::Error);
    assert!(entry.message.contains("CODE"));
    assert!(entry.message.contains("abc"));

    // An optional read of the same field is logged, not reported.
    let code: f64 = set.value("CODE", false, true, &sink);
    assert_eq!(code, 0.0);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_default_is_substituted_and_written_back_for_zero_fields() {
    let (mut drawing, frame) = drawing_with_frame();
    let mut set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();

    // Width holds 0.0: the default is returned and persisted.
    let width = set.value_or_init(&mut drawing, "Width", 5.0, false, true, &sink);
    assert_eq!(width, 5.0);
    assert_eq!(
        set.find("Width", true).unwrap().value(),
        &PropertyValue::Real(5.0)
    );

    // A later plain read sees the written value, so no substitution.
    let width = set.value_or("Width", 9.0, false, true, &sink);
    assert_eq!(width, 5.0);
}

#[test]
fn test_absent_property_yields_default_without_write() {
    let (mut drawing, frame) = drawing_with_frame();
    let mut set = scan_fresh(&mut drawing, frame);
    let sink = RecordingSink::new();
    let writes_before = drawing.parameter_write_count();

    let value = set.value_or_init(&mut drawing, "NoSuch", 7_i64, false, true, &sink);
    assert_eq!(value, 7);
    assert_eq!(drawing.parameter_write_count(), writes_before);
}
