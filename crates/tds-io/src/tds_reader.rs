//! 3DS decoder.
//!
//! Decoding happens in two passes. The chunk pass walks the file once and
//! fills a [`DecodedFile`]: the material table plus one [`MeshModel`] per
//! triangle mesh. The emission pass turns that into an [`EmittedScene`].
//! Any error in either pass discards everything built so far.
//!
//! # Example
//!
//! ```ignore
//! use tds_core::{ByteStream, DecodeOptions, NormalMode, StreamConfig};
//! use tds_io::tds_reader::Decoder;
//!
//! let mut stream = ByteStream::open_file("model.3ds", StreamConfig::default())?;
//! let mut decoder = Decoder::new(DecodeOptions::new().with_normal_mode(NormalMode::Smooth));
//! let scene = decoder.decode(&mut stream)?;
//! println!("{} triangles ({})", scene.triangle_count(), decoder.diagnostics());
//! ```

use std::path::Path;

use tds_core::byte_stream::{ByteStream, StreamConfig};
use tds_core::decode_options::DecodeOptions;
use tds_core::emitted_scene::{Diagnostics, EmittedScene, SceneInfo, TrailingTransform};
use tds_core::emitter::Emitter;
use tds_core::material::{Material, MaterialTable, TextureMap};
use tds_core::mesh_model::MeshModel;
use tds_core::status::{DecodeError, DecodeResult, Status};
use tds_core::vector::Vector3f;
use tracing::{debug, warn};

use crate::chunk_ids::*;
use crate::chunk_reader::{Chunk, ChunkHandler, ChunkReader};
use crate::mesh_source::{MeshSource, SceneSource};
use crate::traits::Reader;

/// File `(x, y, z)` to model `(x, z, -y)`: Z-up to Y-up.
fn from_file_axes([x, y, z]: [f32; 3]) -> Vector3f {
    Vector3f::new(x, z, -y)
}

fn percentage(value: f32) -> f32 {
    if value.is_finite() {
        (value / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// =============================================================================
// Decoded (pre-emission) data
// =============================================================================

#[derive(Debug, Clone)]
pub struct DecodedObject {
    pub name: String,
    pub model: MeshModel,
}

/// Result of the chunk pass.
#[derive(Debug, Clone, Default)]
pub struct DecodedFile {
    pub materials: MaterialTable,
    pub objects: Vec<DecodedObject>,
    pub info: SceneInfo,
}

impl DecodedFile {
    /// Runs the emission pass over every object.
    pub fn emit(&self, options: &DecodeOptions) -> DecodeResult<EmittedScene> {
        options.validate()?;
        let emitter = Emitter::new(options, &self.materials);
        let mut scene = EmittedScene {
            info: self.info,
            ..EmittedScene::default()
        };
        for object in &self.objects {
            let name = options.load_object_names.then(|| object.name.clone());
            let emitted = emitter.emit_object(name, &object.model)?;
            scene.bounds.union(&emitted.bounds);
            scene.objects.push(emitted);
        }
        if options.wants_trailing_transform() {
            scene.transform = TrailingTransform::for_bounds(
                &scene.bounds,
                options.center_model,
                options.target_size,
            );
        }
        Ok(scene)
    }

    /// Converts back into encoder input.
    pub fn to_scene_source(&self) -> SceneSource {
        SceneSource {
            version: self.info.version.unwrap_or(3),
            mesh_version: self.info.mesh_version.unwrap_or(3),
            master_scale: self.info.master_scale.unwrap_or(1.0),
            materials: self.materials.named().cloned().collect(),
            meshes: self
                .objects
                .iter()
                .map(|o| MeshSource::from_model(o.name.clone(), &o.model))
                .collect(),
        }
    }
}

// =============================================================================
// Chunk pass
// =============================================================================

struct DecodeContext {
    options: DecodeOptions,
    file: DecodedFile,
    object_name: String,
    model: Option<MeshModel>,
    diagnostics: Diagnostics,
}

impl DecodeContext {
    fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            file: DecodedFile::default(),
            object_name: String::new(),
            model: None,
            diagnostics: Diagnostics::default(),
        }
    }

    fn model(&mut self) -> DecodeResult<&mut MeshModel> {
        self.model.as_mut().ok_or_else(|| {
            DecodeError::MissingPrerequisiteChunk("mesh data outside a triangle mesh".into())
        })
    }

    fn finish_object(&mut self, mut model: MeshModel) {
        if self.options.build_adjacency {
            model.build_edge_adjacency();
            self.diagnostics.boundary_edges += model.boundary_edge_count();
            self.diagnostics.non_manifold_edges += model.non_manifold_edge_count();
        }
        self.diagnostics.object_count += 1;
        debug!(
            name = %self.object_name,
            vertices = model.vertex_count(),
            faces = model.face_count(),
            degenerate = model.degenerate_count(),
            groups = model.groups().len(),
            "decoded object"
        );
        self.file.objects.push(DecodedObject {
            name: self.object_name.clone(),
            model,
        });
    }
}

type Ctx = DecodeContext;

const MAIN_HANDLERS: &[(u16, ChunkHandler<Ctx>)] = &[(VERSION, on_version), (EDITOR, on_editor)];

const EDITOR_HANDLERS: &[(u16, ChunkHandler<Ctx>)] = &[
    (MESH_VERSION, on_mesh_version),
    (MASTER_SCALE, on_master_scale),
    (MATERIAL_ENTRY, on_material_entry),
    (NAMED_OBJECT, on_named_object),
];

const OBJECT_HANDLERS: &[(u16, ChunkHandler<Ctx>)] = &[(TRIANGLE_MESH, on_triangle_mesh)];

const MESH_HANDLERS: &[(u16, ChunkHandler<Ctx>)] = &[
    (VERTEX_ARRAY, on_vertex_array),
    (FACE_ARRAY, on_face_array),
    (TEX_VERTS, on_tex_verts),
    (MESH_MATRIX, on_mesh_matrix),
];

const FACE_HANDLERS: &[(u16, ChunkHandler<Ctx>)] = &[
    (MATERIAL_GROUP, on_material_group),
    (SMOOTH_GROUP, on_smooth_group),
];

fn on_version(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    ctx.file.info.version = Some(reader.read()?);
    Ok(())
}

fn on_editor(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    reader.walk(ctx, chunk, EDITOR_HANDLERS)
}

fn on_mesh_version(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    ctx.file.info.mesh_version = Some(reader.read()?);
    Ok(())
}

fn on_master_scale(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    ctx.file.info.master_scale = Some(reader.read()?);
    Ok(())
}

fn on_named_object(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    ctx.object_name = reader.read_zstring(MAX_NAME_LEN)?;
    reader.walk(ctx, chunk, OBJECT_HANDLERS)
}

fn on_triangle_mesh(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    ctx.model = Some(MeshModel::new());
    reader.walk(ctx, chunk, MESH_HANDLERS)?;
    if let Some(model) = ctx.model.take() {
        ctx.finish_object(model);
    }
    Ok(())
}

fn on_vertex_array(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    let count = reader.read::<u16>()? as usize;
    reader.check_count(chunk, count, 12)?;
    let mut positions = Vec::with_capacity(count);
    for _ in 0..count {
        positions.push(from_file_axes(reader.read_array()?));
    }
    ctx.model()?.set_vertices(positions)?;
    ctx.diagnostics.vertex_count += count;
    Ok(())
}

fn on_face_array(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    let count = reader.read::<u16>()? as usize;
    reader.check_count(chunk, count, 8)?;
    // Faces added before a failure still count.
    let (faces, degenerate, result) = {
        let model = ctx.model()?;
        model.begin_faces(count)?;
        let result = (0..count).try_for_each(|_| -> Status {
            let indices: [u16; 3] = reader.read_array()?;
            let flags: u16 = reader.read()?;
            model.add_face(indices.map(u32::from), flags)?;
            Ok(())
        });
        (model.face_count(), model.degenerate_count(), result)
    };
    ctx.diagnostics.face_count += faces;
    ctx.diagnostics.degenerate_count += degenerate;
    result?;
    reader.walk(ctx, chunk, FACE_HANDLERS)
}

fn on_material_group(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    if !ctx.options.load_materials {
        return Ok(());
    }
    let name = reader.read_zstring(MAX_NAME_LEN)?;
    let count = reader.read::<u16>()? as usize;
    reader.check_count(chunk, count, 2)?;
    let mut faces = Vec::with_capacity(count);
    for _ in 0..count {
        faces.push(u32::from(reader.read::<u16>()?));
    }
    let id = ctx
        .file
        .materials
        .lookup(&name)
        .ok_or_else(|| DecodeError::UnresolvedMaterialReference(name.clone()))?;
    ctx.model()?.assign_group(id, &name, &faces)?;
    Ok(())
}

fn on_smooth_group(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    let count = ctx.model()?.face_count();
    reader.check_count(chunk, count, 4)?;
    let mut masks = Vec::with_capacity(count);
    for _ in 0..count {
        masks.push(reader.read::<u32>()?);
    }
    ctx.model()?.set_smoothing_groups(&masks)
}

fn on_tex_verts(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    let count = reader.read::<u16>()? as usize;
    reader.check_count(chunk, count, 8)?;
    let mut uvs = Vec::with_capacity(count);
    for _ in 0..count {
        uvs.push(reader.read_array::<f32, 2>()?);
    }
    let name = ctx.object_name.clone();
    let model = ctx.model()?;
    if count != model.vertex_count() && model.has_vertices() {
        warn!(
            object = %name,
            tex_coords = count,
            vertices = model.vertex_count(),
            "texture coordinate count does not match vertex count"
        );
    }
    model.set_tex_coords(&uvs)?;
    Ok(())
}

fn on_mesh_matrix(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    let matrix: [f32; 12] = reader.read_array()?;
    ctx.model()?.set_mesh_matrix(matrix);
    Ok(())
}

// -----------------------------------------------------------------------------
// Materials
// -----------------------------------------------------------------------------

fn on_material_entry(ctx: &mut Ctx, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    if !ctx.options.load_materials {
        return Ok(());
    }
    let mut material = Material::default();
    reader.walk(&mut material, chunk, MATERIAL_HANDLERS)?;
    if material.name.is_empty() {
        warn!(offset = chunk.start, "material entry without a name ignored");
        return Ok(());
    }
    let name = material.name.clone();
    let (_, replaced) = ctx.file.materials.insert(material);
    if replaced {
        warn!(material = %name, "duplicate material name, later entry wins");
    }
    ctx.diagnostics.material_count = ctx.file.materials.named_count();
    Ok(())
}

const MATERIAL_HANDLERS: &[(u16, ChunkHandler<Material>)] = &[
    (MAT_NAME, on_mat_name),
    (MAT_AMBIENT, on_mat_ambient),
    (MAT_DIFFUSE, on_mat_diffuse),
    (MAT_SPECULAR, on_mat_specular),
    (MAT_SHININESS, on_mat_shininess),
    (MAT_TRANSPARENCY, on_mat_transparency),
    (MAT_TWO_SIDE, on_mat_two_side),
    (MAT_TEXMAP, on_mat_texmap),
];

fn on_mat_name(m: &mut Material, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    m.name = reader.read_zstring(MAX_NAME_LEN)?;
    Ok(())
}

fn on_mat_ambient(m: &mut Material, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    if let Some(c) = read_color(reader, chunk)? {
        m.ambient = c;
    }
    Ok(())
}

fn on_mat_diffuse(m: &mut Material, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    if let Some(c) = read_color(reader, chunk)? {
        m.diffuse = c;
    }
    Ok(())
}

fn on_mat_specular(m: &mut Material, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    if let Some(c) = read_color(reader, chunk)? {
        m.specular = c;
    }
    Ok(())
}

fn on_mat_shininess(m: &mut Material, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    if let Some(v) = read_percentage(reader, chunk)? {
        m.shininess = v;
    }
    Ok(())
}

fn on_mat_transparency(m: &mut Material, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    if let Some(v) = read_percentage(reader, chunk)? {
        m.transparency = v;
    }
    Ok(())
}

fn on_mat_two_side(m: &mut Material, _: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    m.two_sided = true;
    Ok(())
}

fn on_mat_texmap(m: &mut Material, reader: &mut ChunkReader<'_>, chunk: &Chunk) -> Status {
    let mut map = TextureMap::new(String::new());
    reader.walk(&mut map, chunk, TEXMAP_HANDLERS)?;
    if map.filename.is_empty() {
        warn!(material = %m.name, "texture map without a file name ignored");
    } else {
        m.texture = Some(map);
    }
    Ok(())
}

const TEXMAP_HANDLERS: &[(u16, ChunkHandler<TextureMap>)] = &[
    (MAT_MAPNAME, on_map_name),
    (MAT_MAP_USCALE, on_map_uscale),
    (MAT_MAP_VSCALE, on_map_vscale),
    (MAT_MAP_UOFFSET, on_map_uoffset),
    (MAT_MAP_VOFFSET, on_map_voffset),
];

fn on_map_name(t: &mut TextureMap, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    t.filename = reader.read_zstring(MAX_NAME_LEN)?;
    Ok(())
}

fn on_map_uscale(t: &mut TextureMap, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    t.scale[0] = reader.read()?;
    Ok(())
}

fn on_map_vscale(t: &mut TextureMap, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    t.scale[1] = reader.read()?;
    Ok(())
}

fn on_map_uoffset(t: &mut TextureMap, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    t.offset[0] = reader.read()?;
    Ok(())
}

fn on_map_voffset(t: &mut TextureMap, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    t.offset[1] = reader.read()?;
    Ok(())
}

/// Gamma and linear forms seen inside one colour chunk.
#[derive(Default)]
struct ColorParse {
    gamma: Option<[f32; 3]>,
    linear: Option<[f32; 3]>,
}

fn read_color_f(reader: &mut ChunkReader<'_>) -> DecodeResult<[f32; 3]> {
    let rgb: [f32; 3] = reader.read_array()?;
    Ok(rgb.map(|c| if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 }))
}

fn read_color_24(reader: &mut ChunkReader<'_>) -> DecodeResult<[f32; 3]> {
    let rgb: [u8; 3] = reader.read_array()?;
    Ok(rgb.map(|c| f32::from(c) / 255.0))
}

fn on_color_f(c: &mut ColorParse, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    c.gamma = Some(read_color_f(reader)?);
    Ok(())
}

fn on_color_24(c: &mut ColorParse, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    c.gamma = Some(read_color_24(reader)?);
    Ok(())
}

fn on_lin_color_24(c: &mut ColorParse, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    c.linear = Some(read_color_24(reader)?);
    Ok(())
}

fn on_lin_color_f(c: &mut ColorParse, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    c.linear = Some(read_color_f(reader)?);
    Ok(())
}

const COLOR_HANDLERS: &[(u16, ChunkHandler<ColorParse>)] = &[
    (COLOR_F, on_color_f),
    (COLOR_24, on_color_24),
    (LIN_COLOR_24, on_lin_color_24),
    (LIN_COLOR_F, on_lin_color_f),
];

/// Linear colour wins when both forms are present.
fn read_color(reader: &mut ChunkReader<'_>, chunk: &Chunk) -> DecodeResult<Option<[f32; 3]>> {
    let mut color = ColorParse::default();
    reader.walk(&mut color, chunk, COLOR_HANDLERS)?;
    Ok(color.linear.or(color.gamma))
}

fn on_int_percentage(p: &mut Option<f32>, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    *p = Some(percentage(f32::from(reader.read::<i16>()?)));
    Ok(())
}

fn on_float_percentage(p: &mut Option<f32>, reader: &mut ChunkReader<'_>, _: &Chunk) -> Status {
    *p = Some(percentage(reader.read::<f32>()?));
    Ok(())
}

const PERCENT_HANDLERS: &[(u16, ChunkHandler<Option<f32>>)] = &[
    (INT_PERCENTAGE, on_int_percentage),
    (FLOAT_PERCENTAGE, on_float_percentage),
];

fn read_percentage(reader: &mut ChunkReader<'_>, chunk: &Chunk) -> DecodeResult<Option<f32>> {
    let mut value = None;
    reader.walk(&mut value, chunk, PERCENT_HANDLERS)?;
    Ok(value)
}

// =============================================================================
// Decoder
// =============================================================================

/// Decodes 3DS streams with a fixed set of options.
///
/// [`diagnostics`](Self::diagnostics) reflects the most recent decode, also
/// when it failed.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecodeOptions,
    diagnostics: Diagnostics,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Runs the chunk pass only.
    pub fn read_file(&mut self, stream: &mut ByteStream) -> DecodeResult<DecodedFile> {
        self.diagnostics = Diagnostics::default();
        self.options.validate()?;

        let mut ctx = DecodeContext::new(self.options.clone());
        let mut reader = ChunkReader::new(stream).with_debug_level(self.options.debug_level);
        let result = reader
            .read_root(MAIN)
            .and_then(|root| reader.walk(&mut ctx, &root, MAIN_HANDLERS));
        ctx.diagnostics.skipped_chunks = reader.skipped_chunks();
        self.diagnostics = ctx.diagnostics;
        result?;
        Ok(ctx.file)
    }

    /// Decodes `stream` into caller-owned primitive batches.
    pub fn decode(&mut self, stream: &mut ByteStream) -> DecodeResult<EmittedScene> {
        let file = self.read_file(stream)?;
        let scene = file.emit(&self.options)?;
        debug!(
            objects = scene.objects.len(),
            triangles = scene.triangle_count(),
            "decoded scene"
        );
        Ok(scene)
    }
}

/// Decodes one stream with `options`.
pub fn decode(stream: &mut ByteStream, options: &DecodeOptions) -> DecodeResult<EmittedScene> {
    Decoder::new(options.clone()).decode(stream)
}

// =============================================================================
// File reader
// =============================================================================

pub struct TdsReader {
    stream: ByteStream,
    decoder: Decoder,
}

impl TdsReader {
    pub fn open<P: AsRef<Path>>(path: P) -> DecodeResult<Self> {
        Ok(Self {
            stream: ByteStream::open_file(path, StreamConfig::default())?,
            decoder: Decoder::default(),
        })
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.decoder = Decoder::new(options);
        self
    }

    fn rewind(&mut self) -> Status {
        if self.stream.position() != 0 {
            self.stream.set_position(0)?;
        }
        Ok(())
    }

    /// Runs the chunk pass only, for callers that want the models.
    pub fn read_file(&mut self) -> DecodeResult<DecodedFile> {
        self.rewind()?;
        self.decoder.read_file(&mut self.stream)
    }
}

impl Reader for TdsReader {
    fn open<P: AsRef<Path>>(path: P) -> DecodeResult<Self> {
        TdsReader::open(path)
    }

    fn read_scene(&mut self) -> DecodeResult<EmittedScene> {
        self.rewind()?;
        self.decoder.decode(&mut self.stream)
    }

    fn diagnostics(&self) -> Diagnostics {
        *self.decoder.diagnostics()
    }
}
