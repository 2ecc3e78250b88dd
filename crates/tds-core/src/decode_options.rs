use crate::status::{DecodeError, Status};

/// Which normals the emitter attaches to triangle batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalMode {
    None,
    /// One normal per retained face.
    #[default]
    Flat,
    /// One angle-weighted normal per face corner.
    Smooth,
}

impl NormalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            NormalMode::None => "none",
            NormalMode::Flat => "flat",
            NormalMode::Smooth => "smooth",
        }
    }
}

impl std::str::FromStr for NormalMode {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(NormalMode::None),
            "flat" => Ok(NormalMode::Flat),
            "smooth" => Ok(NormalMode::Smooth),
            other => Err(DecodeError::InvalidConfiguration(format!(
                "unknown normal mode '{}'",
                other
            ))),
        }
    }
}

/// Caller-supplied settings for one decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    pub normal_mode: NormalMode,
    pub load_materials: bool,
    pub load_textures: bool,
    pub load_object_names: bool,
    pub indexed_output: bool,
    pub center_model: bool,
    /// Largest bounding-box extent after rescaling; 0 disables rescaling.
    pub target_size: f32,
    pub build_adjacency: bool,
    /// 0 is quiet, 1 reports skipped chunks, 2 traces every chunk.
    pub debug_level: u8,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            normal_mode: NormalMode::Flat,
            load_materials: true,
            load_textures: true,
            load_object_names: true,
            indexed_output: false,
            center_model: false,
            target_size: 0.0,
            build_adjacency: false,
            debug_level: 0,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normal_mode(mut self, mode: NormalMode) -> Self {
        self.normal_mode = mode;
        self
    }

    pub fn with_materials(mut self, load: bool) -> Self {
        self.load_materials = load;
        self
    }

    pub fn with_textures(mut self, load: bool) -> Self {
        self.load_textures = load;
        self
    }

    pub fn with_object_names(mut self, load: bool) -> Self {
        self.load_object_names = load;
        self
    }

    pub fn with_indexed_output(mut self, indexed: bool) -> Self {
        self.indexed_output = indexed;
        self
    }

    pub fn with_center_model(mut self, center: bool) -> Self {
        self.center_model = center;
        self
    }

    pub fn with_target_size(mut self, size: f32) -> Self {
        self.target_size = size;
        self
    }

    pub fn with_adjacency(mut self, build: bool) -> Self {
        self.build_adjacency = build;
        self
    }

    pub fn with_debug_level(mut self, level: u8) -> Self {
        self.debug_level = level;
        self
    }

    /// Textures are only meaningful when materials are loaded.
    pub fn textures_enabled(&self) -> bool {
        self.load_materials && self.load_textures
    }

    /// Centering or rescaling was requested.
    pub fn wants_trailing_transform(&self) -> bool {
        self.center_model || self.target_size > 0.0
    }

    pub fn validate(&self) -> Status {
        if !self.target_size.is_finite() || self.target_size < 0.0 {
            return Err(DecodeError::InvalidConfiguration(format!(
                "target size must be finite and non-negative, got {}",
                self.target_size
            )));
        }
        Ok(())
    }
}
