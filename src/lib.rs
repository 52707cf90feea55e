//! Block Stamper - bulk placement of attributed, parametric symbols
//!
//! Placing many copies of a dynamic block is dominated by the configuration
//! step: writing attribute text and dynamic parameters triggers geometry
//! recompute on every changed field. This library configures one template
//! instance per distinct (definition, override list) combination and serves
//! every placement by duplicating the template and applying a rigid
//! transform.
//!
//! # Example
//!
//! ```rust
//! use block_stamper::{
//!     place_batch, MemoryDrawing, NullSink, ParamTypeCode, PlacementConfig,
//!     PlacementRequest, Point3, PropertyOverride, PropertyValue,
//! };
//!
//! let mut drawing = MemoryDrawing::new();
//! let door = drawing
//!     .definition("door")
//!     .text_field("LABEL", "")
//!     .parameter("Width", ParamTypeCode::Real, PropertyValue::Real(900.0))
//!     .register();
//! let model = drawing.model_space();
//!
//! let requests: Vec<_> = (0..3)
//!     .map(|i| {
//!         PlacementRequest::new(door, model, Point3::new(i as f64 * 10.0, 0.0, 0.0))
//!             .with_override(PropertyOverride::new("Width", 1200.0))
//!     })
//!     .collect();
//!
//! let placed = place_batch(&mut drawing, &requests, PlacementConfig::default(), &NullSink).unwrap();
//! assert_eq!(placed.len(), 3);
//!
//! // One template was configured; every placement is a cheap duplicate.
//! assert_eq!(drawing.instantiate_count(), 1);
//! assert_eq!(drawing.duplicate_count(), 3);
//! ```

pub mod config;
pub mod diagnostics;
pub mod geometry;
pub mod placement;
pub mod property;
pub mod session;

pub use config::{ConfigError, PlacementConfig};
pub use diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, LogSink, NullSink, RecordingSink, Severity,
};
pub use geometry::{PlacementTransform, Point3, Vector3};
pub use placement::{PlacementRequest, PropertyOverride, TemplateCache, TemplateKey};
pub use property::{
    FromPropertyValue, ParamTypeCode, PropertyKind, PropertyModel, PropertySet, PropertyValue,
};
pub use session::{
    ContainerId, DefinitionId, DrawingSession, FieldHandle, InstanceHandle, MemoryDrawing,
    ScannedField, SessionError,
};

use thiserror::Error;

/// Errors that can abort a placement.
///
/// Property-level problems never land here; they go to the diagnostics sink
/// and the placement proceeds. Only faults that make the request impossible
/// to satisfy propagate.
#[derive(Debug, Error)]
pub enum PlaceError {
    /// The requested scale was zero, negative, or not a number.
    #[error("placement scale must be positive, got {0}")]
    InvalidScale(f64),

    /// An instantiate/duplicate/transform/scan primitive faulted.
    #[error("template construction failed: {0}")]
    Template(#[from] SessionError),
}

/// Place a whole batch through a fresh template cache, then release every
/// template the batch created. Release runs even when a placement fails
/// midway.
pub fn place_batch<S: DrawingSession>(
    session: &mut S,
    requests: &[PlacementRequest],
    config: PlacementConfig,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<InstanceHandle>, PlaceError> {
    let mut cache = TemplateCache::new(config, sink);
    let mut placed = Vec::with_capacity(requests.len());
    let mut failure = None;

    for request in requests {
        match cache.place(session, request) {
            Ok(instance) => placed.push(instance),
            Err(error) => {
                failure = Some(error);
                break;
            }
        }
    }

    cache.release(session);
    match failure {
        Some(error) => Err(error),
        None => Ok(placed),
    }
}
