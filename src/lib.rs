//! Projective sprite rendering: pins a rectangular texture to the four
//! corners of a warped quad and recovers, per fragment, the undistorted
//! texture coordinate via an inverse bilinear-surface solve.
//!
//! The crate splits into a pure core — [`surface`] (the solver),
//! [`vertex`] (the packed record and packer), [`batch`] (per-frame quad
//! batching), [`uniforms`] (pass-wide state and its resolution) — a CPU
//! reference of the fragment stage in [`kernel`], and the wgpu plumbing in
//! [`pass`].

pub mod batch;
pub mod kernel;
#[cfg(feature = "backend-wgpu")]
pub mod pass;
pub mod sprite;
pub mod surface;
pub mod uniforms;
pub mod utils;
pub mod vertex;

pub use batch::{DrawBatch, PassConfig, SpriteBatcher};
pub use sprite::{pack_tint, unpack_tint, SpriteInstance};
pub use surface::{BilinearSurface, Distortion, MIN_DISCRIMINANT};
pub use uniforms::{PassUniforms, UniformContext};
pub use utils::{Affine2, Mat3, Position, Rectangle, Size};
pub use vertex::{build_quad_indices, pack_sprite, BilinearVertex, VERTEX_SCALARS};
