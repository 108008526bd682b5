use uuid::Uuid;

use crate::surface::BilinearSurface;
use crate::utils::{Affine2, Position, Rectangle, Size};

/// One sprite queued for a distorted draw. Instances are transient: the host
/// rebuilds them every frame from its scene state, the batcher packs them,
/// nothing is retained across frames.
#[derive(Debug, Clone)]
pub struct SpriteInstance {
    /// Screen-space quad corners in TL, TR, BR, BL order.
    pub corners: [Position; 4],
    /// Atlas UV sub-rectangle holding this sprite's source pixels.
    pub frame: Rectangle,
    /// Forward transform mapping a solved surface coordinate to atlas UV.
    pub trans: Affine2,
    /// Premultiplied tint, packed 4x8-bit with red in byte 0.
    pub tint: u32,
    /// Untrimmed source size. Carried on the instance but not part of the
    /// packed record; see DESIGN.md.
    pub orig_size: Size,
    /// Texture the frame lives in; the batcher resolves this to a unit index.
    pub texture: Uuid,
}

impl SpriteInstance {
    /// A sprite covering `rect` on an undistorted surface, textured by the
    /// whole of `texture` (frame spans the full UV square).
    pub fn from_rect(texture: Uuid, rect: Rectangle, tint: u32) -> Self {
        SpriteInstance {
            corners: [
                rect.pos(),
                Position::new(rect.x + rect.width, rect.y),
                Position::new(rect.x + rect.width, rect.y + rect.height),
                Position::new(rect.x, rect.y + rect.height),
            ],
            frame: Rectangle::new(0.0, 0.0, 1.0, 1.0),
            trans: frame_transform(Rectangle::new(0.0, 0.0, 1.0, 1.0), rect.size()),
            tint,
            orig_size: rect.size(),
            texture,
        }
    }
}

/// Affine map taking surface coordinates in `[0, size.width] x
/// [0, size.height]` into the frame's UV rectangle.
pub fn frame_transform(frame: Rectangle, size: Size) -> Affine2 {
    Affine2 {
        a: frame.width / size.width,
        b: 0.0,
        c: 0.0,
        d: frame.height / size.height,
        tx: frame.x,
        ty: frame.y,
    }
}

/// Forward-distorts the corners of a surface-space rectangle into the screen
/// quad the rasterizer will cover, TL, TR, BR, BL.
pub fn project_corners(surface: &BilinearSurface, rect: Rectangle) -> [Position; 4] {
    [
        surface.project(rect.pos()),
        surface.project(Position::new(rect.x + rect.width, rect.y)),
        surface.project(Position::new(rect.x + rect.width, rect.y + rect.height)),
        surface.project(Position::new(rect.x, rect.y + rect.height)),
    ]
}

/// Packs a straight-alpha RGBA tint into the record's color field,
/// premultiplying color by alpha. Byte 0 is red so the GPU side reads the
/// same bytes back through a `Unorm8x4` attribute.
pub fn pack_tint(rgb: [f32; 3], alpha: f32) -> u32 {
    let a = alpha.clamp(0.0, 1.0);
    let to_byte = |c: f32| ((c.clamp(0.0, 1.0) * a) * 255.0).round() as u32;
    to_byte(rgb[0])
        | (to_byte(rgb[1]) << 8)
        | (to_byte(rgb[2]) << 16)
        | (((a * 255.0).round() as u32) << 24)
}

/// Unpacks a record color field back into premultiplied RGBA floats.
pub fn unpack_tint(tint: u32) -> [f32; 4] {
    [
        (tint & 0xFF) as f32 / 255.0,
        ((tint >> 8) & 0xFF) as f32 / 255.0,
        ((tint >> 16) & 0xFF) as f32 / 255.0,
        ((tint >> 24) & 0xFF) as f32 / 255.0,
    ]
}
