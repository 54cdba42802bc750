use super::{fallback_normal, Point3, Vector3, TOLERANCE};

/// Centroid of a triangle.
#[must_use]
pub fn triangle_centroid(tri: &[Point3; 3]) -> Point3 {
    Point3::from((tri[0].coords + tri[1].coords + tri[2].coords) / 3.0)
}

/// Unnormalized normal `(v1 - v0) × (v2 - v0)`.
#[must_use]
pub fn triangle_cross(tri: &[Point3; 3]) -> Vector3 {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    edge1.cross(&edge2)
}

/// Unit normal of a triangle, or `None` when the triangle is degenerate.
#[must_use]
pub fn try_triangle_normal(tri: &[Point3; 3]) -> Option<Vector3> {
    let cross = triangle_cross(tri);
    let len = cross.norm();
    if len < TOLERANCE || !len.is_finite() {
        None
    } else {
        Some(cross / len)
    }
}

/// Unit normal of a triangle, falling back to `+Z` for zero-area triangles.
#[must_use]
pub fn triangle_normal(tri: &[Point3; 3]) -> Vector3 {
    try_triangle_normal(tri).unwrap_or_else(fallback_normal)
}

/// Area of a triangle (half the cross-product magnitude).
#[must_use]
pub fn triangle_area(tri: &[Point3; 3]) -> f64 {
    triangle_cross(tri).norm() * 0.5
}

/// Normalizes `v`, returning `None` when it has (near) zero length.
#[must_use]
pub fn try_normalize(v: &Vector3) -> Option<Vector3> {
    let len = v.norm();
    if len < TOLERANCE || !len.is_finite() {
        None
    } else {
        Some(v / len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn right_triangle_properties() {
        let tri = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)];
        assert_relative_eq!(triangle_area(&tri), 2.0);
        assert_relative_eq!(triangle_normal(&tri), Vector3::z());
        assert_relative_eq!(triangle_centroid(&tri), p(2.0 / 3.0, 2.0 / 3.0, 0.0));
    }

    #[test]
    fn winding_flips_normal() {
        let tri = [p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 0.0, 0.0)];
        assert_relative_eq!(triangle_normal(&tri), -Vector3::z());
    }

    #[test]
    fn degenerate_triangle_uses_fallback() {
        let tri = [p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0)];
        assert!(try_triangle_normal(&tri).is_none());
        assert_eq!(triangle_normal(&tri), Vector3::z());
        assert_relative_eq!(triangle_area(&tri), 0.0);
    }
}
