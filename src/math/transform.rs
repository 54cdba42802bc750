use super::{Matrix4, Point3, Vector3};

/// Transforms a point by a 4x4 matrix (homogeneous coordinates).
///
/// Projective matrices are normalized by `w`; affine matrices pass through
/// unchanged.
#[must_use]
pub fn transform_point(matrix: &Matrix4, point: &Point3) -> Point3 {
    let v = matrix * nalgebra::Vector4::new(point.x, point.y, point.z, 1.0);
    if (v.w - 1.0).abs() > f64::EPSILON && v.w.abs() > f64::EPSILON {
        Point3::new(v.x / v.w, v.y / v.w, v.z / v.w)
    } else {
        Point3::new(v.x, v.y, v.z)
    }
}

/// Transforms a direction vector by a 4x4 matrix (ignoring translation).
#[must_use]
pub fn transform_direction(matrix: &Matrix4, dir: &Vector3) -> Vector3 {
    let v = matrix * nalgebra::Vector4::new(dir.x, dir.y, dir.z, 0.0);
    Vector3::new(v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn translation_moves_points_not_directions() {
        let m = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        let p = transform_point(&m, &Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(2.0, 3.0, 4.0));

        let d = transform_direction(&m, &Vector3::x());
        assert_relative_eq!(d, Vector3::x());
    }

    #[test]
    fn uniform_scale() {
        let m = Matrix4::new_scaling(2.0);
        let p = transform_point(&m, &Point3::new(1.0, -1.0, 0.5));
        assert_relative_eq!(p, Point3::new(2.0, -2.0, 1.0));
    }
}
