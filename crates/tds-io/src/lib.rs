//! Reading and writing 3DS chunk files.
//!
//! The decoder walks the chunk tree with [`chunk_reader::ChunkReader`],
//! builds one [`tds_core::MeshModel`] per triangle mesh and emits the result
//! as a [`tds_core::EmittedScene`]. The encoder writes the same format back
//! with [`chunk_writer::ChunkWriter`].
//!
//! # Recognised chunks
//!
//! | Chunk            | Read | Write |
//! |------------------|------|-------|
//! | Version, scale   | ✓    | ✓     |
//! | Materials        | ✓    | ✓     |
//! | Texture maps     | ✓    | ✓     |
//! | Vertices, faces  | ✓    | ✓     |
//! | Material groups  | ✓    | ✓     |
//! | UVs              | ✓    | ✓     |
//! | Smoothing groups | ✓    | ✓     |
//! | Mesh matrix      | ✓    | ✓     |
//!
//! Anything else (lights, cameras, keyframes) is skipped.
//!
//! ```ignore
//! use tds_io::{Reader, TdsReader};
//!
//! let mut reader = TdsReader::open("model.3ds")?;
//! let scene = reader.read_scene()?;
//! println!("{}", reader.diagnostics());
//! ```

pub mod chunk_ids;
pub mod mesh_source;
pub mod traits;

// Reader modules (require decoder feature)
#[cfg(feature = "decoder")]
pub mod chunk_reader;
#[cfg(feature = "decoder")]
pub mod tds_reader;

// Writer modules (require encoder feature)
#[cfg(feature = "encoder")]
pub mod chunk_writer;
#[cfg(feature = "encoder")]
pub mod tds_writer;

pub use mesh_source::{MeshSource, SceneSource};
pub use traits::{Reader, Writer};

#[cfg(feature = "decoder")]
pub use tds_reader::{decode, DecodedFile, DecodedObject, Decoder, TdsReader};

#[cfg(feature = "encoder")]
pub use tds_writer::{encode, encode_to, TdsWriter};
