//! Caller-owned output of a decode.
//!
//! Everything here is plain data. Positions are in the model's Y-up frame
//! and are never modified by the trailing transform, which is reported
//! separately for the caller to apply.

use std::fmt;

use crate::bounding_box::BoundingBox;
use crate::geometry_indices::MaterialId;
use crate::material::{Material, TextureTransform};
use crate::vector::Vector3f;

/// How the `normals` of a triangle batch line up with its triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalBinding {
    None,
    PerFace,
    PerCorner,
}

/// Triangles indexing into the owning object's shared vertex arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTriangles {
    pub indices: Vec<u32>,
    pub normal_binding: NormalBinding,
    pub normals: Vec<[f32; 3]>,
}

impl IndexedTriangles {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Triangles carrying private copies of their corner data.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTriangles {
    pub positions: Vec<[f32; 3]>,
    /// Empty when the batch is untextured or the object has no UVs.
    pub tex_coords: Vec<[f32; 2]>,
    pub normal_binding: NormalBinding,
    pub normals: Vec<[f32; 3]>,
}

impl FlatTriangles {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Material { id: MaterialId, material: Material },
    /// Binds a texture file, or unbinds with `None`.
    Texture(Option<String>),
    TextureTransform(TextureTransform),
    IndexedTriangles(IndexedTriangles),
    FlatTriangles(FlatTriangles),
}

impl Batch {
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            Batch::Material { .. } | Batch::Texture(_) | Batch::TextureTransform(_)
        )
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Batch::IndexedTriangles(t) => t.triangle_count(),
            Batch::FlatTriangles(t) => t.triangle_count(),
            _ => 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Batch::Material { .. } => "material",
            Batch::Texture(_) => "texture",
            Batch::TextureTransform(_) => "texture-transform",
            Batch::IndexedTriangles(_) => "indexed-triangles",
            Batch::FlatTriangles(_) => "flat-triangles",
        }
    }
}

/// Re-centering translation and uniform scale: `p' = (p + translation) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingTransform {
    pub translation: Vector3f,
    pub scale: f32,
}

impl TrailingTransform {
    /// Builds the transform for `bounds`. Returns `None` when neither
    /// centering nor rescaling is requested or the box is empty.
    pub fn for_bounds(bounds: &BoundingBox, center: bool, target_size: f32) -> Option<Self> {
        if !bounds.is_valid() || !(center || target_size > 0.0) {
            return None;
        }
        let translation = if center {
            -bounds.center()
        } else {
            Vector3f::ZERO
        };
        let extent = bounds.extent().max_element();
        let scale = if target_size > 0.0 && extent > 0.0 {
            target_size / extent
        } else {
            1.0
        };
        Some(Self { translation, scale })
    }

    pub fn apply(&self, p: Vector3f) -> Vector3f {
        (p + self.translation) * self.scale
    }
}

/// Header-level values from the file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneInfo {
    pub version: Option<u32>,
    pub mesh_version: Option<u32>,
    pub master_scale: Option<f32>,
}

/// One triangle mesh object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmittedObject {
    pub name: Option<String>,
    /// Shared positions, filled in indexed mode only.
    pub positions: Vec<[f32; 3]>,
    /// Shared UVs, filled in indexed mode when the object is textured.
    pub tex_coords: Vec<[f32; 2]>,
    pub batches: Vec<Batch>,
    pub bounds: BoundingBox,
    pub mesh_matrix: Option<[f32; 12]>,
}

impl EmittedObject {
    pub fn triangle_count(&self) -> usize {
        self.batches.iter().map(Batch::triangle_count).sum()
    }

    pub fn state_change_count(&self) -> usize {
        self.batches.iter().filter(|b| b.is_state_change()).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmittedScene {
    pub objects: Vec<EmittedObject>,
    pub bounds: BoundingBox,
    pub transform: Option<TrailingTransform>,
    pub info: SceneInfo,
}

impl EmittedScene {
    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.objects.iter().flat_map(|o| o.batches.iter())
    }

    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(EmittedObject::triangle_count).sum()
    }
}

/// Counters gathered during a decode, kept even when it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub object_count: usize,
    pub vertex_count: usize,
    pub face_count: usize,
    pub degenerate_count: usize,
    pub material_count: usize,
    pub skipped_chunks: usize,
    pub boundary_edges: usize,
    pub non_manifold_edges: usize,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "objects={} vertices={} faces={} degenerate={} materials={} skipped_chunks={}",
            self.object_count,
            self.vertex_count,
            self.face_count,
            self.degenerate_count,
            self.material_count,
            self.skipped_chunks
        )?;
        if self.boundary_edges > 0 || self.non_manifold_edges > 0 {
            write!(
                f,
                " boundary_edges={} non_manifold_edges={}",
                self.boundary_edges, self.non_manifold_edges
            )?;
        }
        Ok(())
    }
}
