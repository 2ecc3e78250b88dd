//! Core data structures for decoding 3DS chunk files.
//!
//! Byte streams with a sticky failure flag, the per-object mesh model,
//! material table, normal evaluation and the primitive emitter. Chunk
//! traversal and the file format itself live in `tds-io`.

#![allow(clippy::needless_range_loop)]

// =============================================================================
// Streams
// =============================================================================

pub mod byte_stream;
pub mod scalar;
pub mod status;
pub mod stream_backend;

// =============================================================================
// Model
// =============================================================================

pub mod bounding_box;
pub mod geometry_indices;
pub mod material;
pub mod mesh_model;
pub mod vector;

// =============================================================================
// Evaluation and output
// =============================================================================

pub mod decode_options;
pub mod emitted_scene;
pub mod emitter;
pub mod normals;

pub use bounding_box::BoundingBox;
pub use byte_stream::{ByteOrderConfig, ByteStream, Endian, StreamConfig, StreamMode};
pub use decode_options::{DecodeOptions, NormalMode};
pub use emitted_scene::{
    Batch, Diagnostics, EmittedObject, EmittedScene, FlatTriangles, IndexedTriangles,
    NormalBinding, SceneInfo, TrailingTransform,
};
pub use emitter::Emitter;
pub use geometry_indices::{
    EdgeIndex, FaceIndex, GroupIndex, MaterialId, VertexIndex, DEFAULT_MATERIAL_ID,
};
pub use material::{Material, MaterialTable, TextureMap, TextureTransform};
pub use mesh_model::{Edge, Face, FaceGroup, MeshModel, Vertex};
pub use scalar::{Scalar, ScalarKind, TextIntFormat};
pub use status::{DecodeError, DecodeResult, Status, StreamError, StreamResult};
pub use vector::Vector3f;
