//! Chunk tags of the 3DS format.

pub const MAIN: u16 = 0x4D4D;
pub const VERSION: u16 = 0x0002;
pub const EDITOR: u16 = 0x3D3D;
pub const MESH_VERSION: u16 = 0x3D3E;
pub const MASTER_SCALE: u16 = 0x0100;

pub const NAMED_OBJECT: u16 = 0x4000;
pub const TRIANGLE_MESH: u16 = 0x4100;
pub const VERTEX_ARRAY: u16 = 0x4110;
pub const FACE_ARRAY: u16 = 0x4120;
pub const MATERIAL_GROUP: u16 = 0x4130;
pub const TEX_VERTS: u16 = 0x4140;
pub const SMOOTH_GROUP: u16 = 0x4150;
pub const MESH_MATRIX: u16 = 0x4160;

pub const MATERIAL_ENTRY: u16 = 0xAFFF;
pub const MAT_NAME: u16 = 0xA000;
pub const MAT_AMBIENT: u16 = 0xA010;
pub const MAT_DIFFUSE: u16 = 0xA020;
pub const MAT_SPECULAR: u16 = 0xA030;
pub const MAT_SHININESS: u16 = 0xA040;
pub const MAT_TRANSPARENCY: u16 = 0xA050;
pub const MAT_TWO_SIDE: u16 = 0xA081;
pub const MAT_TEXMAP: u16 = 0xA200;
pub const MAT_MAPNAME: u16 = 0xA300;
pub const MAT_MAP_USCALE: u16 = 0xA354;
pub const MAT_MAP_VSCALE: u16 = 0xA356;
pub const MAT_MAP_UOFFSET: u16 = 0xA358;
pub const MAT_MAP_VOFFSET: u16 = 0xA35A;

pub const COLOR_F: u16 = 0x0010;
pub const COLOR_24: u16 = 0x0011;
pub const LIN_COLOR_24: u16 = 0x0012;
pub const LIN_COLOR_F: u16 = 0x0013;
pub const INT_PERCENTAGE: u16 = 0x0030;
pub const FLOAT_PERCENTAGE: u16 = 0x0031;

/// Size of a chunk header: `u16` tag plus `u32` length.
pub const CHUNK_HEADER_SIZE: u64 = 6;

/// Longest object, material or map name, including the terminator.
pub const MAX_NAME_LEN: usize = 256;

pub const MAX_CHUNK_DEPTH: usize = 32;

/// Readable name for logging.
pub fn chunk_name(tag: u16) -> &'static str {
    match tag {
        MAIN => "MAIN",
        VERSION => "VERSION",
        EDITOR => "EDITOR",
        MESH_VERSION => "MESH_VERSION",
        MASTER_SCALE => "MASTER_SCALE",
        NAMED_OBJECT => "NAMED_OBJECT",
        TRIANGLE_MESH => "TRIANGLE_MESH",
        VERTEX_ARRAY => "VERTEX_ARRAY",
        FACE_ARRAY => "FACE_ARRAY",
        MATERIAL_GROUP => "MATERIAL_GROUP",
        TEX_VERTS => "TEX_VERTS",
        SMOOTH_GROUP => "SMOOTH_GROUP",
        MESH_MATRIX => "MESH_MATRIX",
        MATERIAL_ENTRY => "MATERIAL_ENTRY",
        MAT_NAME => "MAT_NAME",
        MAT_AMBIENT => "MAT_AMBIENT",
        MAT_DIFFUSE => "MAT_DIFFUSE",
        MAT_SPECULAR => "MAT_SPECULAR",
        MAT_SHININESS => "MAT_SHININESS",
        MAT_TRANSPARENCY => "MAT_TRANSPARENCY",
        MAT_TWO_SIDE => "MAT_TWO_SIDE",
        MAT_TEXMAP => "MAT_TEXMAP",
        MAT_MAPNAME => "MAT_MAPNAME",
        MAT_MAP_USCALE => "MAT_MAP_USCALE",
        MAT_MAP_VSCALE => "MAT_MAP_VSCALE",
        MAT_MAP_UOFFSET => "MAT_MAP_UOFFSET",
        MAT_MAP_VOFFSET => "MAT_MAP_VOFFSET",
        COLOR_F => "COLOR_F",
        COLOR_24 => "COLOR_24",
        LIN_COLOR_24 => "LIN_COLOR_24",
        LIN_COLOR_F => "LIN_COLOR_F",
        INT_PERCENTAGE => "INT_PERCENTAGE",
        FLOAT_PERCENTAGE => "FLOAT_PERCENTAGE",
        _ => "UNKNOWN",
    }
}
