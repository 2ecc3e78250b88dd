//! Common file-level traits.
//!
//! ```ignore
//! use tds_io::{Reader, TdsReader};
//!
//! fn load<R: Reader>(path: &str) -> DecodeResult<EmittedScene> {
//!     let mut reader = R::open(path)?;
//!     reader.read_scene()
//! }
//! ```

use std::path::Path;

use tds_core::emitted_scene::{Diagnostics, EmittedScene};
use tds_core::material::Material;
use tds_core::status::{DecodeResult, Status};

use crate::mesh_source::MeshSource;

/// A file that decodes into an [`EmittedScene`].
pub trait Reader: Sized {
    fn open<P: AsRef<Path>>(path: P) -> DecodeResult<Self>;

    fn read_scene(&mut self) -> DecodeResult<EmittedScene>;

    /// Counters from the most recent [`read_scene`](Self::read_scene),
    /// including a failed one.
    fn diagnostics(&self) -> Diagnostics;
}

/// Collects materials and meshes, then writes them as one file.
pub trait Writer: Sized {
    fn new() -> Self;

    fn add_material(&mut self, material: Material);

    fn add_mesh(&mut self, mesh: MeshSource) -> Status;

    fn write<P: AsRef<Path>>(&self, path: P) -> Status;

    fn vertex_count(&self) -> usize;

    fn face_count(&self) -> usize {
        0
    }
}
