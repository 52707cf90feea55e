//! Points, vectors and the placement transform.
//!
//! Placement uses a deliberately small transform model: a displacement that
//! moves a duplicate from the template's reference point to the requested
//! position, optionally composed with a uniform scale about the requested
//! position. Because the scale is centered on the target position, the placed
//! reference point is a fixed point of the whole transform.

/// A 3D point in drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// The drawing origin, used as the neutral staging point for templates.
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Displacement vector from `other` to `self`.
    pub fn vector_from(&self, other: Point3) -> Vector3 {
        Vector3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub fn translated(&self, v: Vector3) -> Point3 {
        Point3 {
            x: self.x + v.x,
            y: self.y + v.y,
            z: self.z + v.z,
        }
    }
}

/// A 3D displacement vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// True for an exactly zero displacement. Placement skips the translation
    /// part entirely in that case rather than applying a no-op.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// Rigid placement transform: optional displacement, then optional uniform
/// scale about a fixed center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementTransform {
    displacement: Option<Vector3>,
    scale: Option<Scaling>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Scaling {
    factor: f64,
    center: Point3,
}

impl PlacementTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            displacement: None,
            scale: None,
        }
    }

    /// Build the transform that moves an instance whose reference point is at
    /// `reference` so that it lands on `target`, scaled by `scale` about
    /// `target`.
    ///
    /// A zero-length displacement is dropped, and a scale within `tolerance`
    /// of 1 is dropped, so repeated placement at the same point with unit
    /// scale yields the identity.
    pub fn for_placement(reference: Point3, target: Point3, scale: f64, tolerance: f64) -> Self {
        let vec = target.vector_from(reference);
        let displacement = if vec.is_zero() { None } else { Some(vec) };

        let scale = if (scale - 1.0).abs() > tolerance {
            Some(Scaling {
                factor: scale,
                center: target,
            })
        } else {
            None
        };

        Self {
            displacement,
            scale,
        }
    }

    /// True when applying this transform would change nothing.
    pub fn is_identity(&self) -> bool {
        self.displacement.is_none() && self.scale.is_none()
    }

    /// The uniform scale factor carried by this transform (1 when none).
    pub fn scale_factor(&self) -> f64 {
        self.scale.map(|s| s.factor).unwrap_or(1.0)
    }

    /// Map a point: translate first, then scale about the center.
    pub fn apply_point(&self, p: Point3) -> Point3 {
        let mut p = match self.displacement {
            Some(v) => p.translated(v),
            None => p,
        };
        if let Some(Scaling { factor, center }) = self.scale {
            p = Point3 {
                x: center.x + (p.x - center.x) * factor,
                y: center.y + (p.y - center.y) * factor,
                z: center.z + (p.z - center.z) * factor,
            };
        }
        p
    }

    /// Map an instance's uniform scale factor.
    pub fn apply_scale(&self, existing: f64) -> f64 {
        existing * self.scale_factor()
    }
}
