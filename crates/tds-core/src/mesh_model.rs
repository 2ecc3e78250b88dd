//! Mutable accumulation target for one decoded triangle mesh.
//!
//! Vertices and faces live in owned vectors and refer to each other by
//! typed index only, so growing one array never invalidates the other.
//! Faces start in the implicit default group and may be claimed by at most
//! one explicit [`FaceGroup`].

use std::collections::HashMap;

use crate::bounding_box::BoundingBox;
use crate::geometry_indices::{EdgeIndex, FaceIndex, GroupIndex, MaterialId, VertexIndex};
use crate::normals::triangle_normal;
use crate::status::{DecodeError, DecodeResult, Status};
use crate::vector::Vector3f;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub position: Vector3f,
    pub tex_coord: Option<[f32; 2]>,
    faces: Vec<FaceIndex>,
}

impl Vertex {
    pub fn new(position: Vector3f) -> Self {
        Self {
            position,
            tex_coord: None,
            faces: Vec::new(),
        }
    }

    /// Faces that reference this vertex.
    pub fn incident_faces(&self) -> &[FaceIndex] {
        &self.faces
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    vertices: [VertexIndex; 3],
    flags: u16,
    smoothing_group: u32,
    degenerate: bool,
    group: Option<GroupIndex>,
    edges: Option<[EdgeIndex; 3]>,
}

impl Face {
    pub fn vertices(&self) -> [VertexIndex; 3] {
        self.vertices
    }

    /// Raw flag word as stored in the file.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn smoothing_group(&self) -> u32 {
        self.smoothing_group
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Owning explicit group; `None` is the default group.
    pub fn group(&self) -> Option<GroupIndex> {
        self.group
    }

    /// Edge slots, present once adjacency has been built.
    pub fn edges(&self) -> Option<[EdgeIndex; 3]> {
        self.edges
    }
}

/// Faces sharing one material.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGroup {
    material: MaterialId,
    material_name: String,
    faces: Vec<FaceIndex>,
    degenerate_count: usize,
}

impl FaceGroup {
    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn material_name(&self) -> &str {
        &self.material_name
    }

    pub fn faces(&self) -> &[FaceIndex] {
        &self.faces
    }

    pub fn degenerate_count(&self) -> usize {
        self.degenerate_count
    }

    /// Faces that will actually be emitted.
    pub fn retained_count(&self) -> usize {
        self.faces.len() - self.degenerate_count
    }
}

/// Undirected edge between two vertices and the faces that use it.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    vertices: [VertexIndex; 2],
    faces: Vec<FaceIndex>,
}

impl Edge {
    pub fn vertices(&self) -> [VertexIndex; 2] {
        self.vertices
    }

    pub fn faces(&self) -> &[FaceIndex] {
        &self.faces
    }

    pub fn is_boundary(&self) -> bool {
        self.faces.len() == 1
    }

    pub fn is_non_manifold(&self) -> bool {
        self.faces.len() > 2
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshModel {
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    groups: Vec<FaceGroup>,
    default_degenerate: usize,
    bounds: BoundingBox,
    edges: Vec<Edge>,
    has_vertex_array: bool,
    has_face_array: bool,
    has_tex_coords: bool,
    mesh_matrix: Option<[f32; 12]>,
}

impl MeshModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the vertex array. A second call for the same model fails.
    pub fn set_vertices(&mut self, positions: Vec<Vector3f>) -> Status {
        if self.has_vertex_array {
            return Err(DecodeError::DuplicateChunk("vertex array".into()));
        }
        self.vertices = positions.into_iter().map(Vertex::new).collect();
        self.has_vertex_array = true;
        Ok(())
    }

    pub fn has_vertices(&self) -> bool {
        self.has_vertex_array
    }

    /// Assigns UV pairs to vertices in order and returns how many were applied.
    /// Surplus pairs are ignored and vertices past the end keep no UV.
    pub fn set_tex_coords(&mut self, uvs: &[[f32; 2]]) -> DecodeResult<usize> {
        if !self.has_vertex_array {
            return Err(DecodeError::MissingPrerequisiteChunk(
                "texture coordinates before vertex array".into(),
            ));
        }
        let applied = uvs.len().min(self.vertices.len());
        for (vertex, uv) in self.vertices.iter_mut().zip(uvs) {
            vertex.tex_coord = Some(*uv);
        }
        self.has_tex_coords = applied > 0;
        Ok(applied)
    }

    pub fn has_tex_coords(&self) -> bool {
        self.has_tex_coords
    }

    /// Prepares for `count` faces. Requires the vertex array.
    pub fn begin_faces(&mut self, count: usize) -> Status {
        if !self.has_vertex_array {
            return Err(DecodeError::MissingPrerequisiteChunk(
                "face array before vertex array".into(),
            ));
        }
        if self.has_face_array {
            return Err(DecodeError::DuplicateChunk("face array".into()));
        }
        self.has_face_array = true;
        self.faces.reserve_exact(count);
        Ok(())
    }

    pub fn has_faces(&self) -> bool {
        self.has_face_array
    }

    /// Appends a face into the default group, computing its degeneracy and
    /// extending the bounding box over its three vertices.
    ///
    /// A face with a NaN or infinite corner is degenerate: it is counted but
    /// never emitted, and the non-finite corner stays out of the bounds.
    pub fn add_face(&mut self, indices: [u32; 3], flags: u16) -> DecodeResult<FaceIndex> {
        if !self.has_face_array {
            return Err(DecodeError::MissingPrerequisiteChunk(
                "face added outside a face array".into(),
            ));
        }
        let count = self.vertices.len();
        for &index in &indices {
            if index as usize >= count {
                return Err(DecodeError::IndexOutOfRange {
                    what: "vertex",
                    index,
                    count,
                });
            }
        }

        let vertices = indices.map(VertexIndex);
        let [p0, p1, p2] = vertices.map(|v| self.vertices[v.index()].position);
        let degenerate = triangle_normal(p0, p1, p2) == Vector3f::ZERO;

        for p in [p0, p1, p2] {
            self.bounds.extend(p);
        }

        let face_index = FaceIndex::from(self.faces.len());
        for (corner, v) in vertices.iter().enumerate() {
            if !vertices[..corner].contains(v) {
                self.vertices[v.index()].faces.push(face_index);
            }
        }

        if degenerate {
            self.default_degenerate += 1;
        }
        self.faces.push(Face {
            vertices,
            flags,
            smoothing_group: 0,
            degenerate,
            group: None,
            edges: None,
        });
        Ok(face_index)
    }

    /// Moves the listed faces from the default group into a new group bound
    /// to `material`. Claiming a face that already belongs to an explicit
    /// group fails.
    pub fn assign_group(
        &mut self,
        material: MaterialId,
        material_name: &str,
        faces: &[u32],
    ) -> DecodeResult<GroupIndex> {
        if !self.has_face_array {
            return Err(DecodeError::MissingPrerequisiteChunk(
                "material group before face array".into(),
            ));
        }
        let group_index = GroupIndex::from(self.groups.len());
        let mut group = FaceGroup {
            material,
            material_name: material_name.to_string(),
            faces: Vec::with_capacity(faces.len()),
            degenerate_count: 0,
        };

        for &index in faces {
            let count = self.faces.len();
            let face = self
                .faces
                .get_mut(index as usize)
                .ok_or(DecodeError::IndexOutOfRange {
                    what: "face",
                    index,
                    count,
                })?;
            if face.group.is_some() {
                return Err(DecodeError::DuplicateMaterialAssignment {
                    face: index,
                    material: material_name.to_string(),
                });
            }
            face.group = Some(group_index);
            if face.degenerate {
                self.default_degenerate -= 1;
                group.degenerate_count += 1;
            }
            group.faces.push(FaceIndex(index));
        }

        self.groups.push(group);
        Ok(group_index)
    }

    /// Stores per-face smoothing masks. Extra masks are ignored.
    pub fn set_smoothing_groups(&mut self, masks: &[u32]) -> Status {
        if !self.has_face_array {
            return Err(DecodeError::MissingPrerequisiteChunk(
                "smoothing groups before face array".into(),
            ));
        }
        for (face, &mask) in self.faces.iter_mut().zip(masks) {
            face.smoothing_group = mask;
        }
        Ok(())
    }

    pub fn set_mesh_matrix(&mut self, matrix: [f32; 12]) {
        self.mesh_matrix = Some(matrix);
    }

    /// Local axes (3x3, row-major) followed by the origin, if the file gave one.
    pub fn mesh_matrix(&self) -> Option<&[f32; 12]> {
        self.mesh_matrix.as_ref()
    }

    /// Builds the undirected edge list and each face's three edge slots.
    /// Degenerate faces get no edges.
    pub fn build_edge_adjacency(&mut self) {
        let mut lookup: HashMap<(VertexIndex, VertexIndex), EdgeIndex> = HashMap::new();
        self.edges.clear();

        for (fi, face) in self.faces.iter_mut().enumerate() {
            if face.degenerate {
                face.edges = None;
                continue;
            }
            let [a, b, c] = face.vertices;
            let mut slots = [EdgeIndex(0); 3];
            for (slot, (u, v)) in slots.iter_mut().zip([(a, b), (b, c), (c, a)]) {
                let key = if u < v { (u, v) } else { (v, u) };
                let edges = &mut self.edges;
                let edge = *lookup.entry(key).or_insert_with(|| {
                    edges.push(Edge {
                        vertices: [key.0, key.1],
                        faces: Vec::new(),
                    });
                    EdgeIndex::from(edges.len() - 1)
                });
                edges[edge.index()].faces.push(FaceIndex::from(fi));
                *slot = edge;
            }
            face.edges = Some(slots);
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_boundary()).count()
    }

    pub fn non_manifold_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_non_manifold()).count()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex(&self, index: VertexIndex) -> &Vertex {
        &self.vertices[index.index()]
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face(&self, index: FaceIndex) -> &Face {
        &self.faces[index.index()]
    }

    pub fn face_positions(&self, index: FaceIndex) -> [Vector3f; 3] {
        self.faces[index.index()]
            .vertices
            .map(|v| self.vertices[v.index()].position)
    }

    pub fn groups(&self) -> &[FaceGroup] {
        &self.groups
    }

    /// Faces not claimed by any explicit group, in face order.
    pub fn default_group_faces(&self) -> impl Iterator<Item = FaceIndex> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.group.is_none())
            .map(|(i, _)| FaceIndex::from(i))
    }

    pub fn default_group_degenerate_count(&self) -> usize {
        self.default_degenerate
    }

    /// Degenerate faces across the default and all explicit groups.
    pub fn degenerate_count(&self) -> usize {
        self.default_degenerate + self.groups.iter().map(|g| g.degenerate_count).sum::<usize>()
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
}
