//! Typed indices into the mesh model's arrays.

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v as u32)
            }
        }

        impl From<$name> for u32 {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl From<$name> for usize {
            fn from(v: $name) -> Self {
                v.0 as usize
            }
        }
    };
}

define_index!(
    /// Position in a model's vertex array.
    VertexIndex
);
define_index!(
    /// Position in a model's face array.
    FaceIndex
);
define_index!(
    /// Position in a model's explicit face-group list.
    GroupIndex
);
define_index!(
    /// Position in a model's edge list (adjacency mode only).
    EdgeIndex
);
define_index!(
    /// Position in the material table. `MaterialId(0)` is the built-in default.
    MaterialId
);

pub const DEFAULT_MATERIAL_ID: MaterialId = MaterialId(0);
