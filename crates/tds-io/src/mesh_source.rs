//! Input records for the encoder.

use tds_core::material::Material;
use tds_core::mesh_model::MeshModel;
use tds_core::status::{DecodeError, Status};
use tds_core::vector::Vector3f;

/// One triangle mesh to be written, in the decoder's Y-up frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSource {
    pub name: String,
    pub positions: Vec<Vector3f>,
    pub faces: Vec<[u32; 3]>,
    /// Per-face flag words; empty writes 0 for every face.
    pub face_flags: Vec<u16>,
    pub tex_coords: Vec<[f32; 2]>,
    /// Material name and the faces it claims.
    pub material_groups: Vec<(String, Vec<u32>)>,
    pub smoothing_groups: Vec<u32>,
    pub mesh_matrix: Option<[f32; 12]>,
}

impl MeshSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_positions(mut self, positions: Vec<Vector3f>) -> Self {
        self.positions = positions;
        self
    }

    pub fn with_faces(mut self, faces: Vec<[u32; 3]>) -> Self {
        self.faces = faces;
        self
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<[f32; 2]>) -> Self {
        self.tex_coords = tex_coords;
        self
    }

    pub fn with_group(mut self, material: impl Into<String>, faces: Vec<u32>) -> Self {
        self.material_groups.push((material.into(), faces));
        self
    }

    /// Captures a decoded model so it can be written back out.
    pub fn from_model(name: impl Into<String>, model: &MeshModel) -> Self {
        let tex_coords = if model.has_tex_coords() {
            model
                .vertices()
                .iter()
                .map(|v| v.tex_coord.unwrap_or([0.0, 0.0]))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            name: name.into(),
            positions: model.vertices().iter().map(|v| v.position).collect(),
            faces: model
                .faces()
                .iter()
                .map(|f| f.vertices().map(u32::from))
                .collect(),
            face_flags: model.faces().iter().map(|f| f.flags()).collect(),
            tex_coords,
            material_groups: model
                .groups()
                .iter()
                .map(|g| {
                    (
                        g.material_name().to_string(),
                        g.faces().iter().map(|f| f.0).collect(),
                    )
                })
                .collect(),
            smoothing_groups: model.faces().iter().map(|f| f.smoothing_group()).collect(),
            mesh_matrix: model.mesh_matrix().copied(),
        }
    }

    /// Checks that the mesh fits the format's 16-bit counts and indices.
    pub fn validate(&self) -> Status {
        let limit = u16::MAX as usize;
        for (what, len) in [
            ("vertices", self.positions.len()),
            ("faces", self.faces.len()),
            ("texture coordinates", self.tex_coords.len()),
        ] {
            if len > limit {
                return Err(DecodeError::InvalidConfiguration(format!(
                    "mesh '{}' has {} {}, more than the format allows",
                    self.name, len, what
                )));
            }
        }
        let count = self.positions.len();
        for face in &self.faces {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= count) {
                return Err(DecodeError::IndexOutOfRange {
                    what: "vertex",
                    index,
                    count,
                });
            }
        }
        if !self.face_flags.is_empty() && self.face_flags.len() != self.faces.len() {
            return Err(DecodeError::InvalidConfiguration(format!(
                "mesh '{}' has {} face flags for {} faces",
                self.name,
                self.face_flags.len(),
                self.faces.len()
            )));
        }
        if !self.smoothing_groups.is_empty() && self.smoothing_groups.len() != self.faces.len() {
            return Err(DecodeError::InvalidConfiguration(format!(
                "mesh '{}' has {} smoothing masks for {} faces",
                self.name,
                self.smoothing_groups.len(),
                self.faces.len()
            )));
        }
        for (material, faces) in &self.material_groups {
            if faces.len() > limit {
                return Err(DecodeError::InvalidConfiguration(format!(
                    "material group '{}' lists too many faces",
                    material
                )));
            }
            if let Some(&index) = faces.iter().find(|&&f| f as usize >= self.faces.len()) {
                return Err(DecodeError::IndexOutOfRange {
                    what: "face",
                    index,
                    count: self.faces.len(),
                });
            }
        }
        Ok(())
    }
}

/// Everything written to one file.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSource {
    pub version: u32,
    pub mesh_version: u32,
    pub master_scale: f32,
    pub materials: Vec<Material>,
    pub meshes: Vec<MeshSource>,
}

impl Default for SceneSource {
    fn default() -> Self {
        Self {
            version: 3,
            mesh_version: 3,
            master_scale: 1.0,
            materials: Vec::new(),
            meshes: Vec::new(),
        }
    }
}
