use super::{Point3, Vector3, TOLERANCE};

/// A half-line `origin + t * direction`, `t >= 0`.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Start point of the ray.
    pub origin: Point3,
    /// Direction of travel (need not be unit length).
    pub direction: Vector3,
}

impl Ray {
    /// Creates a new ray.
    #[must_use]
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// Computes the ray parameter at which `ray` crosses `tri` (Möller–Trumbore).
///
/// Returns `None` when the ray misses, runs parallel to the triangle plane,
/// or hits behind its origin. Both triangle sides are considered.
#[must_use]
pub fn ray_triangle_intersect(ray: &Ray, tri: &[Point3; 3]) -> Option<f64> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];

    let pvec = ray.direction.cross(&edge2);
    let det = edge1.dot(&pvec);
    if det.abs() < TOLERANCE {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = ray.origin - tri[0];
    let u = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(&edge1);
    let v = ray.direction.dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(&qvec) * inv_det;
    (t >= 0.0).then_some(t)
}
