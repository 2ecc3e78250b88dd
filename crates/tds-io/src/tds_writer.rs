//! 3DS encoder.
//!
//! Writes materials first, then one named object per mesh, so that every
//! material group refers to an already written material. Positions are
//! converted from the Y-up model frame back to the file's Z-up frame.

use std::path::Path;

use tds_core::byte_stream::{ByteStream, StreamConfig};
use tds_core::material::{Material, TextureMap};
use tds_core::status::{DecodeError, DecodeResult, Status};
use tds_core::vector::Vector3f;
use tracing::debug;

use crate::chunk_ids::*;
use crate::chunk_writer::ChunkWriter;
use crate::mesh_source::{MeshSource, SceneSource};
use crate::traits::Writer;

/// Inverse of the decoder's `(x, y, z) -> (x, z, -y)` remap.
fn to_file_axes(p: Vector3f) -> [f32; 3] {
    [p.x, -p.z, p.y]
}

fn write_color(w: &mut ChunkWriter<'_>, tag: u16, rgb: [f32; 3]) -> Status {
    w.chunk(tag, |w| {
        w.chunk(COLOR_24, |w| {
            let bytes = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            w.write_bytes(&bytes)
        })?;
        w.chunk(LIN_COLOR_F, |w| w.write_array(&rgb))
    })
}

fn write_percentage(w: &mut ChunkWriter<'_>, tag: u16, value: f32) -> Status {
    w.chunk(tag, |w| w.scalar_chunk(FLOAT_PERCENTAGE, value * 100.0))
}

fn write_texture_map(w: &mut ChunkWriter<'_>, map: &TextureMap) -> Status {
    w.chunk(MAT_TEXMAP, |w| {
        w.chunk(MAT_MAPNAME, |w| w.write_zstring(&map.filename))?;
        w.scalar_chunk(MAT_MAP_USCALE, map.scale[0])?;
        w.scalar_chunk(MAT_MAP_VSCALE, map.scale[1])?;
        w.scalar_chunk(MAT_MAP_UOFFSET, map.offset[0])?;
        w.scalar_chunk(MAT_MAP_VOFFSET, map.offset[1])
    })
}

fn check_name(name: &str) -> Status {
    if name.len() + 1 > MAX_NAME_LEN {
        return Err(DecodeError::StringTooLong {
            max_len: MAX_NAME_LEN,
        });
    }
    Ok(())
}

fn write_material(w: &mut ChunkWriter<'_>, material: &Material) -> Status {
    check_name(&material.name)?;
    w.chunk(MATERIAL_ENTRY, |w| {
        w.chunk(MAT_NAME, |w| w.write_zstring(&material.name))?;
        write_color(w, MAT_AMBIENT, material.ambient)?;
        write_color(w, MAT_DIFFUSE, material.diffuse)?;
        write_color(w, MAT_SPECULAR, material.specular)?;
        write_percentage(w, MAT_SHININESS, material.shininess)?;
        write_percentage(w, MAT_TRANSPARENCY, material.transparency)?;
        if material.two_sided {
            w.empty_chunk(MAT_TWO_SIDE)?;
        }
        if let Some(map) = &material.texture {
            check_name(&map.filename)?;
            write_texture_map(w, map)?;
        }
        Ok(())
    })
}

fn write_mesh(w: &mut ChunkWriter<'_>, mesh: &MeshSource) -> Status {
    mesh.validate()?;
    check_name(&mesh.name)?;
    w.chunk(NAMED_OBJECT, |w| {
        w.write_zstring(&mesh.name)?;
        w.chunk(TRIANGLE_MESH, |w| {
            w.chunk(VERTEX_ARRAY, |w| {
                w.write(mesh.positions.len() as u16)?;
                for &p in &mesh.positions {
                    w.write_array(&to_file_axes(p))?;
                }
                Ok(())
            })?;

            if !mesh.tex_coords.is_empty() {
                w.chunk(TEX_VERTS, |w| {
                    w.write(mesh.tex_coords.len() as u16)?;
                    for uv in &mesh.tex_coords {
                        w.write_array(uv)?;
                    }
                    Ok(())
                })?;
            }

            if let Some(matrix) = &mesh.mesh_matrix {
                w.chunk(MESH_MATRIX, |w| w.write_array(matrix))?;
            }

            w.chunk(FACE_ARRAY, |w| {
                w.write(mesh.faces.len() as u16)?;
                for (i, face) in mesh.faces.iter().enumerate() {
                    for &index in face {
                        w.write(index as u16)?;
                    }
                    w.write(mesh.face_flags.get(i).copied().unwrap_or(0))?;
                }
                for (material, faces) in &mesh.material_groups {
                    check_name(material)?;
                    w.chunk(MATERIAL_GROUP, |w| {
                        w.write_zstring(material)?;
                        w.write(faces.len() as u16)?;
                        for &f in faces {
                            w.write(f as u16)?;
                        }
                        Ok(())
                    })?;
                }
                if !mesh.smoothing_groups.is_empty() {
                    w.chunk(SMOOTH_GROUP, |w| w.write_array(&mesh.smoothing_groups))?;
                }
                Ok(())
            })
        })
    })
}

/// Writes `scene` as a complete file into `stream`.
pub fn encode_to(scene: &SceneSource, stream: &mut ByteStream) -> Status {
    let mut w = ChunkWriter::new(stream);
    w.chunk(MAIN, |w| {
        w.scalar_chunk(VERSION, scene.version)?;
        w.chunk(EDITOR, |w| {
            w.scalar_chunk(MESH_VERSION, scene.mesh_version)?;
            w.scalar_chunk(MASTER_SCALE, scene.master_scale)?;
            for material in &scene.materials {
                write_material(w, material)?;
            }
            for mesh in &scene.meshes {
                write_mesh(w, mesh)?;
            }
            Ok(())
        })
    })?;
    w.finish()
}

/// Encodes `scene` into a new buffer.
pub fn encode(scene: &SceneSource) -> DecodeResult<Vec<u8>> {
    let mut stream = ByteStream::memory(StreamConfig::default());
    encode_to(scene, &mut stream)?;
    debug!(
        materials = scene.materials.len(),
        meshes = scene.meshes.len(),
        bytes = stream.position(),
        "encoded scene"
    );
    stream
        .into_memory()
        .ok_or_else(|| DecodeError::Io("memory stream lost its buffer".into()))
}

/// Accumulates materials and meshes for [`Writer::write`].
#[derive(Debug, Clone, Default)]
pub struct TdsWriter {
    scene: SceneSource,
}

impl TdsWriter {
    pub fn scene(&self) -> &SceneSource {
        &self.scene
    }

    pub fn to_bytes(&self) -> DecodeResult<Vec<u8>> {
        encode(&self.scene)
    }
}

impl Writer for TdsWriter {
    fn new() -> Self {
        Self::default()
    }

    fn add_material(&mut self, material: Material) {
        self.scene.materials.push(material);
    }

    fn add_mesh(&mut self, mesh: MeshSource) -> Status {
        mesh.validate()?;
        self.scene.meshes.push(mesh);
        Ok(())
    }

    fn write<P: AsRef<Path>>(&self, path: P) -> Status {
        let mut stream = ByteStream::create_file(path, StreamConfig::default())?;
        encode_to(&self.scene, &mut stream)?;
        stream
            .flush()
            .map_err(|e| DecodeError::Io(format!("flush failed: {}", e)))
    }

    fn vertex_count(&self) -> usize {
        self.scene.meshes.iter().map(|m| m.positions.len()).sum()
    }

    fn face_count(&self) -> usize {
        self.scene.meshes.iter().map(|m| m.faces.len()).sum()
    }
}
