//! The template cache.
//!
//! Configuring a fresh symbol instance is the expensive step of a bulk
//! placement: attribute text layout and parametric evaluation both run on
//! every changed field. The cache configures one "template" instance per
//! distinct (definition, override list) key and serves every placement by
//! duplicating a template and applying a rigid transform. Templates live in
//! the session's staging container, are never handed out, and are deleted on
//! [`release`](TemplateCache::release).

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::diagnostics::{Diagnostic, DiagnosticSink, RecordingSink};
use crate::geometry::PlacementTransform;
use crate::placement::{PlacementRequest, PropertyOverride};
use crate::property::{fold_name, PropertySet, PropertyValue};
use crate::session::{DefinitionId, DrawingSession, InstanceHandle};
use crate::PlaceError;

/// Structural key identifying one template configuration.
///
/// Two keys are equal when the definitions match and the override lists are
/// pairwise equal under (case-folded name, value), in the order the caller
/// supplied them. Override order is deliberately significant: callers that
/// author overrides in a stable order share templates, and reordering is
/// treated as a distinct configuration.
#[derive(Debug, Clone)]
pub struct TemplateKey {
    definition: DefinitionId,
    overrides: Vec<(String, PropertyValue)>,
}

impl TemplateKey {
    pub fn for_request(request: &PlacementRequest) -> Self {
        Self {
            definition: request.definition,
            overrides: request
                .overrides
                .iter()
                .map(|o| (fold_name(&o.name), o.value.clone()))
                .collect(),
        }
    }
}

impl PartialEq for TemplateKey {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition && self.overrides == other.overrides
    }
}

// Override values are finite in practice; a NaN value would never compare
// equal to itself and simply always miss the cache.
impl Eq for TemplateKey {}

impl Hash for TemplateKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Values stay out of the hash (they include reals); equal keys agree
        // on definition and names, which is all Hash needs.
        self.definition.hash(state);
        for (name, _) in &self.overrides {
            name.hash(state);
        }
    }
}

/// Cache of configured template instances, one per distinct [`TemplateKey`].
///
/// The cache is the sole owner of every template it creates; instances
/// returned by [`place`](Self::place) are caller-owned duplicates. Intended
/// for single-writer use within one batch.
pub struct TemplateCache<'a> {
    templates: HashMap<TemplateKey, InstanceHandle>,
    config: crate::config::PlacementConfig,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> TemplateCache<'a> {
    pub fn new(config: crate::config::PlacementConfig, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            templates: HashMap::new(),
            config,
            sink,
        }
    }

    /// Number of distinct templates currently cached.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Place one request, reusing a cached template when the key matches.
    ///
    /// Property-level failures while configuring a new template are reported
    /// through the sink and never abort the placement; only structural
    /// faults (instantiate, duplicate, transform, scan) propagate.
    pub fn place<S: DrawingSession>(
        &mut self,
        session: &mut S,
        request: &PlacementRequest,
    ) -> Result<InstanceHandle, PlaceError> {
        self.place_with(session, request, |_, _| {})
    }

    /// Like [`place`](Self::place), with a callback invoked once per
    /// override failure while a new template is being configured.
    pub fn place_with<S, F>(
        &mut self,
        session: &mut S,
        request: &PlacementRequest,
        mut on_override_failure: F,
    ) -> Result<InstanceHandle, PlaceError>
    where
        S: DrawingSession,
        F: FnMut(&PropertyOverride, &Diagnostic),
    {
        if !(request.scale > 0.0) {
            return Err(PlaceError::InvalidScale(request.scale));
        }

        let key = TemplateKey::for_request(request);
        let template = match self.templates.get(&key) {
            Some(&template) => template,
            None => {
                let template = self.build_template(session, request, &mut on_override_failure)?;
                self.templates.insert(key, template);
                template
            }
        };

        // Hit or miss, the caller always gets a transformed duplicate; the
        // template itself stays pristine at the staging point.
        let instance = session.duplicate(template, request.container)?;
        let reference = session.reference_point(instance)?;
        let transform = PlacementTransform::for_placement(
            reference,
            request.position,
            request.scale,
            self.config.scale_tolerance,
        );
        if !transform.is_identity() {
            session.apply_transform(instance, &transform)?;
        }
        Ok(instance)
    }

    fn build_template<S, F>(
        &mut self,
        session: &mut S,
        request: &PlacementRequest,
        on_override_failure: &mut F,
    ) -> Result<InstanceHandle, PlaceError>
    where
        S: DrawingSession,
        F: FnMut(&PropertyOverride, &Diagnostic),
    {
        let staging = session.staging_container();
        let instance =
            session.instantiate(request.definition, staging, self.config.staging_point)?;
        let mut properties = PropertySet::scan(session, instance)?;

        for override_ in &request.overrides {
            // A probe sink captures this override's diagnostics so they can
            // be forwarded to the callback as well as the main sink.
            let probe = RecordingSink::new();
            properties.write(
                session,
                &override_.name,
                override_.value.clone(),
                override_.exact_match,
                override_.required,
                &probe,
            );
            for diagnostic in probe.entries() {
                on_override_failure(override_, &diagnostic);
                self.sink.report(diagnostic);
            }
        }

        Ok(instance)
    }

    /// Delete every cached template. Best-effort: a template that fails to
    /// delete is reported as a cleanup failure and skipped, never preventing
    /// cleanup of the rest. Idempotent; the cache is empty and reusable
    /// afterwards.
    pub fn release<S: DrawingSession>(&mut self, session: &mut S) {
        for (_, template) in self.templates.drain() {
            if let Err(fault) = session.delete(template) {
                self.sink
                    .report(Diagnostic::cleanup_failure(template, &fault.to_string()));
            }
        }
    }
}

impl Drop for TemplateCache<'_> {
    fn drop(&mut self) {
        if !self.templates.is_empty() {
            log::warn!(
                "template cache dropped with {} undeleted templates; call release()",
                self.templates.len()
            );
        }
    }
}
