use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::texture::TextureHandle;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Colour stored in sRGB space, the way packed hex literals are authored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a colour from a `0xRRGGBB` literal.
    pub fn from_packed(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xff) as f32 / 255.0,
            g: ((packed >> 8) & 0xff) as f32 / 255.0,
            b: (packed & 0xff) as f32 / 255.0,
        }
    }

    /// Converts to linear light for shading.
    pub fn to_linear(self) -> Vec3 {
        Vec3::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        )
    }
}

fn srgb_to_linear(channel: f32) -> f32 {
    if channel < 0.04045 {
        channel * 0.077_399_38
    } else {
        (channel * 0.947_867_3 + 0.052_132_7).powf(2.4)
    }
}

/// Texture channels a standard material can sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureChannel {
    Albedo,
    AmbientOcclusion,
    Normal,
    Roughness,
    Displacement,
}

impl TextureChannel {
    pub const ALL: [TextureChannel; 5] = [
        TextureChannel::Albedo,
        TextureChannel::AmbientOcclusion,
        TextureChannel::Normal,
        TextureChannel::Roughness,
        TextureChannel::Displacement,
    ];

    pub fn index(self) -> usize {
        match self {
            TextureChannel::Albedo => 0,
            TextureChannel::AmbientOcclusion => 1,
            TextureChannel::Normal => 2,
            TextureChannel::Roughness => 3,
            TextureChannel::Displacement => 4,
        }
    }

    /// Albedo is authored in sRGB, every other channel is raw data.
    pub fn is_color(self) -> bool {
        matches!(self, TextureChannel::Albedo)
    }
}

/// Optional texture per channel.
#[derive(Debug, Clone, Default)]
pub struct TextureSet {
    slots: [Option<TextureHandle>; 5],
}

impl TextureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: TextureChannel, texture: TextureHandle) -> Self {
        self.slots[channel.index()] = Some(texture);
        self
    }

    pub fn get(&self, channel: TextureChannel) -> Option<&TextureHandle> {
        self.slots[channel.index()].as_ref()
    }
}

/// Lit material with optional texture maps.
#[derive(Debug, Clone)]
pub struct StandardMaterial {
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub textures: TextureSet,
    pub ao_intensity: f32,
    pub displacement_scale: f32,
}

impl StandardMaterial {
    pub fn new(color: Color, roughness: f32) -> Self {
        Self {
            color,
            roughness,
            metalness: 0.0,
            textures: TextureSet::new(),
            ao_intensity: 1.0,
            displacement_scale: 1.0,
        }
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }
}

/// Unlit material, used for the light beam.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicMaterial {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub double_sided: bool,
    pub depth_write: bool,
}

impl BasicMaterial {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            transparent: false,
            double_sided: false,
            depth_write: true,
        }
    }
}

/// Fixed-function state a material needs from its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    /// Alpha blended and drawn after every opaque mesh.
    pub blended: bool,
    pub depth_write: bool,
    /// Back faces are drawn too.
    pub double_sided: bool,
}

impl RenderState {
    pub const OPAQUE: Self = Self {
        blended: false,
        depth_write: true,
        double_sided: false,
    };
}

#[derive(Debug, Clone)]
pub enum MaterialKind {
    Standard(StandardMaterial),
    Basic(BasicMaterial),
}

/// Material with a process-unique id used to cache GPU bind groups.
#[derive(Debug)]
pub struct Material {
    id: u64,
    pub kind: MaterialKind,
}

impl Material {
    pub fn standard(material: StandardMaterial) -> Self {
        Self::from_kind(MaterialKind::Standard(material))
    }

    pub fn basic(material: BasicMaterial) -> Self {
        Self::from_kind(MaterialKind::Basic(material))
    }

    fn from_kind(kind: MaterialKind) -> Self {
        Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            kind,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn color(&self) -> Color {
        match &self.kind {
            MaterialKind::Standard(standard) => standard.color,
            MaterialKind::Basic(basic) => basic.color,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.render_state().blended
    }

    pub fn render_state(&self) -> RenderState {
        match &self.kind {
            MaterialKind::Standard(_) => RenderState::OPAQUE,
            MaterialKind::Basic(basic) => RenderState {
                blended: basic.transparent,
                depth_write: basic.depth_write,
                double_sided: basic.double_sided,
            },
        }
    }

    pub fn textures(&self) -> Option<&TextureSet> {
        match &self.kind {
            MaterialKind::Standard(standard) => Some(&standard.textures),
            MaterialKind::Basic(_) => None,
        }
    }
}
