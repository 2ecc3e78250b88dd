//! Named material records and the table that resolves them.

use std::collections::HashMap;

use crate::geometry_indices::{MaterialId, DEFAULT_MATERIAL_ID};

/// Name of the built-in material at index 0.
pub const DEFAULT_MATERIAL_NAME: &str = "";

/// Texture tiling applied to a material's UVs.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureMap {
    pub filename: String,
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl TextureMap {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            scale: [1.0, 1.0],
            offset: [0.0, 0.0],
        }
    }

    pub fn transform(&self) -> TextureTransform {
        TextureTransform {
            scale: self.scale,
            offset: self.offset,
        }
    }
}

/// Scale and offset applied to texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureTransform {
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl TextureTransform {
    pub const IDENTITY: Self = Self {
        scale: [1.0, 1.0],
        offset: [0.0, 0.0],
    };
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Surface description. Colours, shininess and transparency are in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub transparency: f32,
    pub two_sided: bool,
    pub texture: Option<TextureMap>,
}

impl Material {
    /// A material with the default surface values and the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: DEFAULT_MATERIAL_NAME.to_string(),
            ambient: [0.2, 0.2, 0.2],
            diffuse: [0.8, 0.8, 0.8],
            specular: [0.0, 0.0, 0.0],
            shininess: 0.2,
            transparency: 0.0,
            two_sided: false,
            texture: None,
        }
    }
}

/// Materials keyed by unique name, with the default material always at 0.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    materials: Vec<Material>,
    by_name: HashMap<String, MaterialId>,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialTable {
    pub fn new() -> Self {
        Self {
            materials: vec![Material::default()],
            by_name: HashMap::new(),
        }
    }

    /// Adds a material. A material with the same name is replaced in place and
    /// keeps its id; the returned flag is `true` in that case.
    pub fn insert(&mut self, material: Material) -> (MaterialId, bool) {
        if let Some(&id) = self.by_name.get(&material.name) {
            self.materials[id.index()] = material;
            return (id, true);
        }
        let id = MaterialId::from(self.materials.len());
        self.by_name.insert(material.name.clone(), id);
        self.materials.push(material);
        (id, false)
    }

    /// Looks up a named material. The default material has no name entry.
    pub fn lookup(&self, name: &str) -> Option<MaterialId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn default_material(&self) -> &Material {
        &self.materials[DEFAULT_MATERIAL_ID.index()]
    }

    /// Number of materials including the default.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Number of named materials.
    pub fn named_count(&self) -> usize {
        self.materials.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.named_count() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId::from(i), m))
    }

    /// Named materials in insertion order.
    pub fn named(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter().skip(1)
    }
}
