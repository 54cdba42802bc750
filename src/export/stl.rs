use std::io::{self, Write};

use crate::math::triangle::try_triangle_normal;
use crate::math::{fallback_normal, Point3, Vector3};

/// Writes ASCII STL solids with fixed six-digit precision.
pub struct StlWriter<W: Write> {
    out: W,
    facets: usize,
}

impl<W: Write> StlWriter<W> {
    /// Starts a solid named `name`.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures from `out`.
    pub fn begin(mut out: W, name: &str) -> io::Result<Self> {
        writeln!(out, "solid {name}")?;
        Ok(Self { out, facets: 0 })
    }

    /// Writes one facet. The normal is `(v2 - v1) × (v3 - v1)`, normalized,
    /// or `0 0 1` for a degenerate triangle.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures from the sink.
    pub fn facet(&mut self, tri: &[Point3; 3]) -> io::Result<()> {
        let n = facet_normal(tri);
        writeln!(self.out, "  facet normal {} {} {}", fmt6(n.x), fmt6(n.y), fmt6(n.z))?;
        writeln!(self.out, "    outer loop")?;
        for v in tri {
            writeln!(self.out, "      vertex {} {} {}", fmt6(v.x), fmt6(v.y), fmt6(v.z))?;
        }
        writeln!(self.out, "    endloop")?;
        writeln!(self.out, "  endfacet")?;
        self.facets += 1;
        Ok(())
    }

    /// Closes the solid and returns the sink with the facet count.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures from the sink.
    pub fn finish(mut self, name: &str) -> io::Result<(W, usize)> {
        writeln!(self.out, "endsolid {name}")?;
        self.out.flush()?;
        Ok((self.out, self.facets))
    }
}

/// Unit facet normal with the `+Z` fallback.
#[must_use]
pub fn facet_normal(tri: &[Point3; 3]) -> Vector3 {
    try_triangle_normal(tri).unwrap_or_else(fallback_normal)
}

/// Formats with six fractional digits; negative zero prints as zero.
fn fmt6(value: f64) -> String {
    format!("{:.6}", value + 0.0)
}
