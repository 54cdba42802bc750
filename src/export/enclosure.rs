//! Hollow box around a model, written as one closed solid.
//!
//! The outer walls coincide with the model bounds and face outward; the inner
//! walls sit `wall_thickness` inside them and face into the cavity.

use tracing::{info, instrument};

use crate::error::{ExportError, Result};
use crate::math::{Aabb, Point3, Vector3};
use crate::selection::GroupLabel;

use super::{ExportedSurface, StlWriter, DEFAULT_EXTENSION};

/// Default wall thickness, in model units.
pub const DEFAULT_WALL_THICKNESS: f64 = 2.0;

/// Default solid name and file stem.
pub const DEFAULT_ENCLOSURE_NAME: &str = "bounding_box";

// Corner `i` takes max x when bit 0 is set, max y for bit 1, max z for bit 2.
// Quads wind counter-clockwise seen from outside the box.
const BOX_QUADS: [[usize; 4]; 6] = [
    [0, 4, 6, 2], // -x
    [1, 3, 7, 5], // +x
    [0, 1, 5, 4], // -y
    [2, 6, 7, 3], // +y
    [0, 2, 3, 1], // -z
    [4, 5, 7, 6], // +z
];

/// Exports a hollow enclosure around `bounds`.
pub struct ExportEnclosure {
    bounds: Aabb,
    wall_thickness: f64,
    name: String,
    extension: String,
}

impl ExportEnclosure {
    /// Creates a new `ExportEnclosure` operation with the default thickness
    /// and name.
    #[must_use]
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            wall_thickness: DEFAULT_WALL_THICKNESS,
            name: DEFAULT_ENCLOSURE_NAME.to_owned(),
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }

    /// Sets the wall thickness.
    #[must_use]
    pub fn with_wall_thickness(mut self, wall_thickness: f64) -> Self {
        self.wall_thickness = wall_thickness;
        self
    }

    /// Sets the solid name, which is also the file stem.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the output file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Executes the export, producing `<name>.<ext>`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::WallThickness`] unless the thickness is positive
    /// and below half the smallest extent of the bounds, or an error if the
    /// name is not a valid label.
    #[instrument(skip_all, fields(name = %self.name, wall_thickness = self.wall_thickness))]
    pub fn execute(&self) -> Result<ExportedSurface> {
        let label = GroupLabel::new(self.name.as_str())?;

        let extent = self.bounds.max - self.bounds.min;
        let limit = extent.min() / 2.0;
        let t = self.wall_thickness;
        if !(t > 0.0 && t < limit) {
            return Err(ExportError::WallThickness { thickness: t, limit }.into());
        }
        let inner = Aabb {
            min: self.bounds.min + Vector3::repeat(t),
            max: self.bounds.max - Vector3::repeat(t),
        };

        let mut writer = StlWriter::begin(Vec::new(), label.as_str()).map_err(ExportError::from)?;
        write_box(&mut writer, &self.bounds, false)?;
        write_box(&mut writer, &inner, true)?;
        let (contents, triangle_count) = writer.finish(label.as_str()).map_err(ExportError::from)?;

        let exported = ExportedSurface {
            file_name: format!("{label}.{}", self.extension),
            group: label,
            contents,
            face_count: 2 * BOX_QUADS.len(),
            triangle_count,
            area: box_area(&self.bounds) + box_area(&inner),
        };
        info!(
            triangles = exported.triangle_count,
            bytes = exported.contents.len(),
            "enclosure exported"
        );
        Ok(exported)
    }
}

fn write_box(writer: &mut StlWriter<Vec<u8>>, bounds: &Aabb, inward: bool) -> Result<()> {
    let corner = |i: usize| {
        Point3::new(
            if i & 1 == 0 { bounds.min.x } else { bounds.max.x },
            if i & 2 == 0 { bounds.min.y } else { bounds.max.y },
            if i & 4 == 0 { bounds.min.z } else { bounds.max.z },
        )
    };
    for quad in BOX_QUADS {
        let [a, b, c, d] = quad.map(corner);
        let tris = if inward {
            [[a, c, b], [a, d, c]]
        } else {
            [[a, b, c], [a, c, d]]
        };
        for tri in &tris {
            writer.facet(tri).map_err(ExportError::from)?;
        }
    }
    Ok(())
}

fn box_area(bounds: &Aabb) -> f64 {
    let e = bounds.max - bounds.min;
    2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
}
