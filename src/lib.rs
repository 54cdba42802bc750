//! Face reconstruction, physical grouping and surface export for
//! tessellated CAD meshes.
//!
//! ```text
//! Mesh ──► ReconstructFaces ──► FaceGeometryStore ──► ExportGroup ──► <group>_faces.stl
//!                                       ▲
//!                              SelectionManager (face → group)
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod math;
pub mod mesh;
pub mod reconstruct;
pub mod selection;
pub mod session;
pub mod surface;

pub use error::{FacemapError, Result};
