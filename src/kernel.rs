//! CPU reference for the fragment stage. Runs the same per-fragment
//! contract as the WGSL kernel — inverse solve, UV map, edge factor, sample,
//! tint — so the whole path is exercisable without a device.

use image::RgbaImage;

use crate::sprite::unpack_tint;
use crate::surface::{surface_to_uv, BilinearSurface, Distortion};
use crate::utils::Position;
use crate::vertex::BilinearVertex;

/// Interpolated inputs for one covered pixel. The rasterizer produces these
/// by bilinear interpolation of the four corner records; tests construct
/// them directly.
#[derive(Debug, Clone, Copy)]
pub struct FragmentInput {
    pub position: Position,
    pub trans1: [f32; 3],
    pub trans2: [f32; 3],
    pub frame: [f32; 4],
    /// Premultiplied tint as floats.
    pub color: [f32; 4],
    pub texture_id: f32,
}

impl FragmentInput {
    /// Inputs as they would arrive at a fragment sitting exactly on a packed
    /// corner (no interpolation between corners).
    pub fn from_vertex(v: &BilinearVertex) -> Self {
        FragmentInput {
            position: Position::new(v.position[0], v.position[1]),
            trans1: v.trans1,
            trans2: v.trans2,
            frame: v.frame,
            color: unpack_tint(v.color),
            texture_id: v.texture_id,
        }
    }
}

/// Shaded result. `coverage` is the frame edge factor; it is reported here
/// but not folded into the color's alpha, matching the pass's current
/// visible behavior (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentOutput {
    pub color: [f32; 4],
    pub coverage: f32,
}

/// A bound texture unit, sampled bilinearly with clamp-to-edge addressing.
pub struct TextureSlot {
    image: RgbaImage,
}

impl TextureSlot {
    pub fn new(image: RgbaImage) -> Self {
        TextureSlot { image }
    }

    /// Samples at normalized (u, v), filtering between the four nearest
    /// texels.
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        let w = self.image.width() as i64;
        let h = self.image.height() as i64;
        let x = u * w as f32 - 0.5;
        let y = v * h as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let texel = |tx: i64, ty: i64| -> [f32; 4] {
            let cx = tx.clamp(0, w - 1) as u32;
            let cy = ty.clamp(0, h - 1) as u32;
            let p = self.image.get_pixel(cx, cy).0;
            [
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
                p[3] as f32 / 255.0,
            ]
        };

        let c00 = texel(x0 as i64, y0 as i64);
        let c10 = texel(x0 as i64 + 1, y0 as i64);
        let c01 = texel(x0 as i64, y0 as i64 + 1);
        let c11 = texel(x0 as i64 + 1, y0 as i64 + 1);

        let mut out = [0.0f32; 4];
        for i in 0..4 {
            let top = c00[i] + (c10[i] - c00[i]) * fx;
            let bottom = c01[i] + (c11[i] - c01[i]) * fx;
            out[i] = top + (bottom - top) * fy;
        }
        out
    }
}

/// Product of the four clamped distances from `uv` to the frame bounds.
/// Feeds [`FragmentOutput::coverage`]; not applied to alpha.
pub fn edge_coverage(uv: [f32; 2], frame: [f32; 4]) -> f32 {
    let left = (uv[0] - frame[0] + 0.5).clamp(0.0, 1.0);
    let top = (uv[1] - frame[1] + 0.5).clamp(0.0, 1.0);
    let right = (frame[2] - uv[0] + 0.5).clamp(0.0, 1.0);
    let bottom = (frame[3] - uv[1] + 0.5).clamp(0.0, 1.0);
    left * top * right * bottom
}

/// Shades one fragment. `None` is the discard outcome: either the inverse
/// solve has no real solution, or the rounded texture id points at an
/// unbound unit.
pub fn shade(
    input: &FragmentInput,
    distortion: Distortion,
    textures: &[TextureSlot],
) -> Option<FragmentOutput> {
    let surface = BilinearSurface::new(distortion).unproject(input.position)?;
    let uv = surface_to_uv(input.trans1, input.trans2, surface);

    let coverage = edge_coverage(uv, input.frame);
    // Edge coverage stays out of alpha for now; it is surfaced on the
    // output instead.
    let alpha = 1.0;

    let slot = (input.texture_id + 0.5).floor() as usize;
    let sampled = textures.get(slot)?.sample(uv[0], uv[1]);

    let mut color = [0.0f32; 4];
    for i in 0..4 {
        color[i] = sampled[i] * input.color[i] * alpha;
    }
    Some(FragmentOutput { color, coverage })
}
