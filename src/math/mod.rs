pub mod aabb;
pub mod intersect_3d;
pub mod transform;
pub mod triangle;

pub use aabb::Aabb;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Normal substituted wherever a cross product degenerates to zero length.
#[must_use]
pub fn fallback_normal() -> Vector3 {
    Vector3::z()
}
