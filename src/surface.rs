//! Bilinear surface projection: the forward map that pins a rectangular
//! texture to a warped quad, and the per-fragment inverse that recovers the
//! undistorted surface coordinate from an interpolated screen position.

use serde::{Deserialize, Serialize};

use crate::utils::Position;

/// Discriminant floor for the general quadratic branch. At or below this the
/// screen point has no representable preimage on the surface and the
/// fragment is dropped.
pub const MIN_DISCRIMINANT: f32 = 1e-5;

/// Per-axis perspective warp coefficients. Zero on an axis selects that
/// axis's degenerate branch of the inverse; both zero is a plain affine
/// passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Distortion {
    pub x: f32,
    pub y: f32,
}

impl Distortion {
    pub const NONE: Distortion = Distortion { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Distortion { x, y }
    }
}

/// A distorted quad surface. `project` runs on the control path when quad
/// corners are placed; `unproject` is the per-fragment solver and is also
/// mirrored in WGSL by the GPU pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BilinearSurface {
    pub distortion: Distortion,
}

impl BilinearSurface {
    pub fn new(distortion: Distortion) -> Self {
        BilinearSurface { distortion }
    }

    /// Forward map, surface space to screen space:
    /// `vx = sx * (1 + dx * sy)`, `vy = sy * (1 + dy * sx)`.
    pub fn project(&self, surface: Position) -> Position {
        let dx = self.distortion.x;
        let dy = self.distortion.y;
        Position {
            x: surface.x * (1.0 + dx * surface.y),
            y: surface.y * (1.0 + dy * surface.x),
        }
    }

    /// Inverse map, screen space back to surface space. Returns `None` when
    /// the quadratic discriminant is at or below [`MIN_DISCRIMINANT`], the
    /// fragment-discard case.
    ///
    /// Branch order matters: `dx == 0` is checked first, so a fully zero
    /// distortion degenerates to the affine passthrough with no division by
    /// zero anywhere.
    pub fn unproject(&self, screen: Position) -> Option<Position> {
        let vx = screen.x;
        let vy = screen.y;
        let dx = self.distortion.x;
        let dy = self.distortion.y;

        if dx == 0.0 {
            Some(Position {
                x: vx,
                y: vy / (1.0 + dy * vx),
            })
        } else if dy == 0.0 {
            Some(Position {
                x: vx / (1.0 + dx * vy),
                y: vy,
            })
        } else {
            let b = (vy * dx - vx * dy + 1.0) * 0.5 / dy;
            let d = b * b + vx / dy;
            if d <= MIN_DISCRIMINANT {
                return None;
            }
            // The in-domain root is fixed by the sign of dy, not by
            // comparing candidates.
            let sx = if dy > 0.0 {
                -b + d.sqrt()
            } else {
                -b - d.sqrt()
            };
            let sy = (vx / sx - 1.0) / dx;
            Some(Position { x: sx, y: sy })
        }
    }
}

/// Maps a solved surface coordinate into texture UV space using the packed
/// per-vertex transform rows: `u = t1 . (sx, sy, 1)`, `v = t2 . (sx, sy, 1)`.
pub fn surface_to_uv(trans1: [f32; 3], trans2: [f32; 3], surface: Position) -> [f32; 2] {
    [
        trans1[0] * surface.x + trans1[1] * surface.y + trans1[2],
        trans2[0] * surface.x + trans2[1] * surface.y + trans2[2],
    ]
}
