//! The interleaved per-vertex record consumed by the distortion pass and the
//! packer that fills it, four corners per sprite.

use crate::sprite::SpriteInstance;

/// Scalar slots per vertex; a packed quad advances a flat offset by
/// `4 * VERTEX_SCALARS` slots.
pub const VERTEX_SCALARS: usize = 14;

/// One corner record, 56 bytes. Field order is the wire layout: position,
/// the two transform rows, frame bounds, packed color, texture unit.
///
/// `color` is deliberately a `u32`: the GPU reads the same four bytes back
/// through a normalized `Unorm8x4` attribute, so producer and consumer share
/// one binary layout instead of aliasing float and integer views over the
/// same buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BilinearVertex {
    pub position: [f32; 2],
    pub trans1: [f32; 3],
    pub trans2: [f32; 3],
    pub frame: [f32; 4],
    pub color: u32,
    pub texture_id: f32,
}

impl BilinearVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BilinearVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // trans1
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // trans2
                wgpu::VertexAttribute {
                    offset: 20,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // frame
                wgpu::VertexAttribute {
                    offset: 32,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // color, normalized bytes
                wgpu::VertexAttribute {
                    offset: 48,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
                // texture id
                wgpu::VertexAttribute {
                    offset: 52,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Writes the sprite's four corner records into `out` starting at vertex
/// `offset` and returns the advanced offset (`offset + 4`, i.e. 56 scalar
/// slots further into the flat buffer).
///
/// No error path: the caller guarantees capacity. The sprite's untrimmed
/// size is not written; only corners, transform rows, frame bounds, color,
/// and the texture unit go into the record.
pub fn pack_sprite(
    out: &mut [BilinearVertex],
    offset: usize,
    sprite: &SpriteInstance,
    texture_unit: u32,
) -> usize {
    let trans1 = sprite.trans.row_x();
    let trans2 = sprite.trans.row_y();
    let frame = sprite.frame.bounds();

    for (i, corner) in sprite.corners.iter().enumerate() {
        out[offset + i] = BilinearVertex {
            position: [corner.x, corner.y],
            trans1,
            trans2,
            frame,
            color: sprite.tint,
            texture_id: texture_unit as f32,
        };
    }
    offset + 4
}

/// Index list pairing two triangles per quad: `[0,1,2, 0,2,3]` against the
/// TL, TR, BR, BL corner order.
pub fn build_quad_indices(quad_count: usize) -> Vec<u16> {
    let mut indices = Vec::with_capacity(quad_count * 6);
    for quad in 0..quad_count {
        let base = (quad * 4) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}
