use crate::math::intersect_3d::{ray_triangle_intersect, Ray};
use crate::math::Point3;
use crate::reconstruct::FaceId;

use super::FaceGeometryStore;

/// Nearest face under a pointer ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Face that was hit.
    pub face: FaceId,
    /// Ray parameter of the hit.
    pub distance: f64,
    /// World-space hit point.
    pub point: Point3,
}

impl FaceGeometryStore {
    /// Finds the nearest surface intersected by `ray`.
    ///
    /// Equal distances resolve to the lower [`FaceId`].
    #[must_use]
    pub fn pick(&self, ray: &Ray) -> Option<PickHit> {
        let mut best: Option<PickHit> = None;
        for surface in self.iter() {
            for tri in surface.triangles() {
                let Some(t) = ray_triangle_intersect(ray, &tri) else {
                    continue;
                };
                if best.is_none_or(|b| t < b.distance) {
                    best = Some(PickHit {
                        face: surface.id(),
                        distance: t,
                        point: ray.point_at(t),
                    });
                }
            }
        }
        best
    }
}
