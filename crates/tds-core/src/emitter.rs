//! Converts a finished [`MeshModel`] into ordered primitive batches.
//!
//! The default group goes first, followed by explicit groups in the order
//! their chunks appeared. Before each geometry batch the emitter compares
//! the group's texture, texture transform and material with the currently
//! active values and only emits the ones that changed, in that order.

use tracing::debug;

use crate::decode_options::{DecodeOptions, NormalMode};
use crate::emitted_scene::{
    Batch, EmittedObject, FlatTriangles, IndexedTriangles, NormalBinding,
};
use crate::geometry_indices::{FaceIndex, MaterialId, DEFAULT_MATERIAL_ID};
use crate::material::{Material, MaterialTable, TextureTransform};
use crate::mesh_model::MeshModel;
use crate::normals;
use crate::status::{DecodeError, DecodeResult, Status};
use crate::vector::Vector3f;

/// Retained faces of one group together with its material.
struct GroupPlan<'m> {
    material_id: MaterialId,
    material: &'m Material,
    faces: Vec<FaceIndex>,
    textured: bool,
}

/// Normal data prepared once per object.
enum NormalSource {
    None,
    PerFace(Vec<Vector3f>),
    PerVertex(Vec<Vector3f>),
}

impl NormalSource {
    fn binding(&self) -> NormalBinding {
        match self {
            NormalSource::None => NormalBinding::None,
            NormalSource::PerFace(_) => NormalBinding::PerFace,
            NormalSource::PerVertex(_) => NormalBinding::PerCorner,
        }
    }

    fn push(&self, model: &MeshModel, face: FaceIndex, out: &mut Vec<[f32; 3]>) {
        match self {
            NormalSource::None => {}
            NormalSource::PerFace(n) => out.push(n[face.index()].to_array()),
            NormalSource::PerVertex(n) => out.extend(
                normals::corner_normals(model, face, n).map(Vector3f::to_array),
            ),
        }
    }
}

/// Currently active render state. Reset for every object.
struct StateCache {
    texture: Option<String>,
    transform: TextureTransform,
    material: Option<MaterialId>,
}

impl StateCache {
    fn new() -> Self {
        Self {
            texture: None,
            transform: TextureTransform::IDENTITY,
            material: None,
        }
    }
}

pub struct Emitter<'a> {
    options: &'a DecodeOptions,
    materials: &'a MaterialTable,
}

impl<'a> Emitter<'a> {
    pub fn new(options: &'a DecodeOptions, materials: &'a MaterialTable) -> Self {
        Self { options, materials }
    }

    pub fn emit_object(&self, name: Option<String>, model: &MeshModel) -> DecodeResult<EmittedObject> {
        let plans = self.plan_groups(model);
        self.check_configuration(model, &plans)?;

        let normals = match self.options.normal_mode {
            NormalMode::None => NormalSource::None,
            NormalMode::Flat => NormalSource::PerFace(normals::face_normals(model)),
            NormalMode::Smooth => NormalSource::PerVertex(normals::vertex_normals(model)),
        };
        let with_uvs = model.has_tex_coords() && plans.iter().any(|p| p.textured);

        let mut object = EmittedObject {
            name,
            bounds: *model.bounds(),
            mesh_matrix: model.mesh_matrix().copied(),
            ..EmittedObject::default()
        };

        if self.options.indexed_output {
            object.positions = model
                .vertices()
                .iter()
                .map(|v| v.position.to_array())
                .collect();
            if with_uvs {
                object.tex_coords = model
                    .vertices()
                    .iter()
                    .map(|v| v.tex_coord.unwrap_or([0.0, 0.0]))
                    .collect();
            }
        }

        let mut state = StateCache::new();
        for plan in &plans {
            Self::emit_state(plan, &mut state, &mut object.batches);
            let batch = if self.options.indexed_output {
                Self::indexed_batch(model, plan, &normals)
            } else {
                Self::flat_batch(model, plan, &normals, with_uvs && plan.textured)
            };
            object.batches.push(batch);
        }

        debug!(
            name = object.name.as_deref().unwrap_or(""),
            groups = plans.len(),
            batches = object.batches.len(),
            triangles = object.triangle_count(),
            "emitted object"
        );
        Ok(object)
    }

    fn material(&self, id: MaterialId) -> &'a Material {
        self.materials
            .get(id)
            .unwrap_or_else(|| self.materials.default_material())
    }

    fn plan_groups(&self, model: &MeshModel) -> Vec<GroupPlan<'a>> {
        let textures = self.options.textures_enabled();
        let mut plans = Vec::with_capacity(model.groups().len() + 1);

        let default_faces: Vec<FaceIndex> = model
            .default_group_faces()
            .filter(|&f| !model.face(f).is_degenerate())
            .collect();
        if !default_faces.is_empty() {
            plans.push(GroupPlan {
                material_id: DEFAULT_MATERIAL_ID,
                material: self.materials.default_material(),
                faces: default_faces,
                textured: false,
            });
        }

        for group in model.groups() {
            let faces: Vec<FaceIndex> = group
                .faces()
                .iter()
                .copied()
                .filter(|&f| !model.face(f).is_degenerate())
                .collect();
            if faces.is_empty() {
                continue;
            }
            let material = self.material(group.material());
            plans.push(GroupPlan {
                material_id: group.material(),
                material,
                faces,
                textured: textures && material.texture.is_some(),
            });
        }
        plans
    }

    fn check_configuration(&self, model: &MeshModel, plans: &[GroupPlan<'_>]) -> Status {
        if self.options.indexed_output
            && self.options.normal_mode == NormalMode::Smooth
            && !model.has_tex_coords()
        {
            if let Some(plan) = plans.iter().find(|p| p.textured) {
                return Err(DecodeError::InvalidConfiguration(format!(
                    "smooth indexed output needs texture coordinates for textured material '{}'",
                    plan.material.name
                )));
            }
        }
        Ok(())
    }

    fn emit_state(plan: &GroupPlan<'_>, state: &mut StateCache, out: &mut Vec<Batch>) {
        let (texture, transform) = match (&plan.material.texture, plan.textured) {
            (Some(map), true) => (Some(map.filename.clone()), Some(map.transform())),
            _ => (None, None),
        };

        if state.texture != texture {
            out.push(Batch::Texture(texture.clone()));
            state.texture = texture;
        }
        if let Some(transform) = transform {
            if state.transform != transform {
                out.push(Batch::TextureTransform(transform));
                state.transform = transform;
            }
        }
        if state.material != Some(plan.material_id) {
            out.push(Batch::Material {
                id: plan.material_id,
                material: plan.material.clone(),
            });
            state.material = Some(plan.material_id);
        }
    }

    fn indexed_batch(model: &MeshModel, plan: &GroupPlan<'_>, normals: &NormalSource) -> Batch {
        let mut indices = Vec::with_capacity(plan.faces.len() * 3);
        let mut out_normals = Vec::new();
        for &face in &plan.faces {
            indices.extend(model.face(face).vertices().iter().map(|v| v.0));
            normals.push(model, face, &mut out_normals);
        }
        Batch::IndexedTriangles(IndexedTriangles {
            indices,
            normal_binding: normals.binding(),
            normals: out_normals,
        })
    }

    fn flat_batch(
        model: &MeshModel,
        plan: &GroupPlan<'_>,
        normals: &NormalSource,
        with_uvs: bool,
    ) -> Batch {
        let corners = plan.faces.len() * 3;
        let mut positions = Vec::with_capacity(corners);
        let mut tex_coords = Vec::with_capacity(if with_uvs { corners } else { 0 });
        let mut out_normals = Vec::new();
        for &face in &plan.faces {
            for v in model.face(face).vertices() {
                let vertex = model.vertex(v);
                positions.push(vertex.position.to_array());
                if with_uvs {
                    tex_coords.push(vertex.tex_coord.unwrap_or([0.0, 0.0]));
                }
            }
            normals.push(model, face, &mut out_normals);
        }
        Batch::FlatTriangles(FlatTriangles {
            positions,
            tex_coords,
            normal_binding: normals.binding(),
            normals: out_normals,
        })
    }
}
