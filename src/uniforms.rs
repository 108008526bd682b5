use crate::surface::Distortion;
use crate::utils::{Mat3, Size};

/// Pass-wide uniform values shared by every sprite in a draw batch. Written
/// by the host between passes, read-only while a pass is in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassUniforms {
    pub world_transform: Mat3,
    pub distortion: Distortion,
}

impl PassUniforms {
    pub const DEFAULT: PassUniforms = PassUniforms {
        world_transform: Mat3::IDENTITY,
        distortion: Distortion::NONE,
    };
}

impl Default for PassUniforms {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The three uniform sources a draw batch can resolve against, in priority
/// order: an explicitly bound projection surface, the ambient active
/// projection inherited from a parent, then process-wide defaults.
///
/// Resolution happens once per draw batch, before packing or drawing, and
/// the winner is passed down explicitly; nothing below this point consults
/// shared state.
#[derive(Debug, Clone, Copy)]
pub struct UniformContext<'a> {
    pub surface: Option<&'a PassUniforms>,
    pub active: Option<&'a PassUniforms>,
    pub defaults: &'a PassUniforms,
}

impl<'a> UniformContext<'a> {
    pub fn defaults_only(defaults: &'a PassUniforms) -> Self {
        UniformContext {
            surface: None,
            active: None,
            defaults,
        }
    }

    /// Exactly one source is authoritative: the bound surface if present,
    /// else the active projection, else the defaults.
    pub fn resolve(&self) -> &'a PassUniforms {
        self.surface.or(self.active).unwrap_or(self.defaults)
    }
}

/// GPU mirror of the resolved uniforms plus the screen projection, padded to
/// WGSL uniform layout (mat3x3 columns are 16-byte aligned).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RawUniforms {
    pub projection: [[f32; 4]; 3],
    pub world_transform: [[f32; 4]; 3],
    pub distortion: [f32; 2],
    pub _pad: [f32; 2],
}

impl RawUniforms {
    pub fn new(viewport: Size, uniforms: &PassUniforms) -> Self {
        RawUniforms {
            projection: Mat3::screen_projection(viewport).to_gpu_columns(),
            world_transform: uniforms.world_transform.to_gpu_columns(),
            distortion: [uniforms.distortion.x, uniforms.distortion.y],
            _pad: [0.0, 0.0],
        }
    }
}
