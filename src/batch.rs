//! Frame-transient quad batching: sprites arrive in draw order, get packed
//! into one interleaved vertex buffer, and are grouped into draw batches of
//! at most `max_textures` distinct textures.

use bytemuck::Zeroable;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sprite::SpriteInstance;
use crate::vertex::{build_quad_indices, pack_sprite, BilinearVertex};

/// Pass configuration. `max_textures` bounds how many texture units one draw
/// batch may sample from; this variant defaults to a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassConfig {
    pub max_textures: usize,
}

impl Default for PassConfig {
    fn default() -> Self {
        PassConfig { max_textures: 1 }
    }
}

impl PassConfig {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

/// A contiguous run of quads drawable with one set of bound textures. The
/// `textures` vec doubles as the unit table: a sprite packed with
/// `texture_id = i` samples `textures[i]`.
#[derive(Debug, Clone)]
pub struct DrawBatch {
    pub textures: Vec<Uuid>,
    pub quad_start: usize,
    pub quad_count: usize,
}

impl DrawBatch {
    pub fn first_index(&self) -> u32 {
        (self.quad_start * 6) as u32
    }

    pub fn index_count(&self) -> u32 {
        (self.quad_count * 6) as u32
    }
}

/// Accumulates sprites for one pass. Cleared and refilled every frame; the
/// only state carried across `push` calls is the advancing buffer offset.
pub struct SpriteBatcher {
    max_textures: usize,
    vertices: Vec<BilinearVertex>,
    batches: Vec<DrawBatch>,
}

impl SpriteBatcher {
    pub fn new(config: PassConfig) -> Self {
        SpriteBatcher {
            max_textures: config.max_textures.max(1),
            vertices: Vec::new(),
            batches: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.batches.clear();
    }

    /// Packs the sprite's four corner records and assigns it a texture unit
    /// within the open batch, starting a new batch when the unit table is
    /// full.
    pub fn push(&mut self, sprite: &SpriteInstance) {
        let quad_index = self.vertices.len() / 4;
        let unit = match self.batches.last_mut() {
            Some(open) => match open.textures.iter().position(|t| *t == sprite.texture) {
                Some(unit) => unit,
                None if open.textures.len() < self.max_textures => {
                    open.textures.push(sprite.texture);
                    open.textures.len() - 1
                }
                None => {
                    log::debug!(
                        "texture units exhausted ({}), starting new batch at quad {}",
                        self.max_textures,
                        quad_index
                    );
                    self.batches.push(DrawBatch {
                        textures: vec![sprite.texture],
                        quad_start: quad_index,
                        quad_count: 0,
                    });
                    0
                }
            },
            None => {
                self.batches.push(DrawBatch {
                    textures: vec![sprite.texture],
                    quad_start: 0,
                    quad_count: 0,
                });
                0
            }
        };

        let offset = self.vertices.len();
        self.vertices.resize(offset + 4, BilinearVertex::zeroed());
        let advanced = pack_sprite(&mut self.vertices, offset, sprite, unit as u32);
        debug_assert_eq!(advanced, offset + 4);

        if let Some(open) = self.batches.last_mut() {
            open.quad_count += 1;
        }
    }

    pub fn vertices(&self) -> &[BilinearVertex] {
        &self.vertices
    }

    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Two triangles per packed quad, in quad order.
    pub fn indices(&self) -> Vec<u16> {
        build_quad_indices(self.quad_count())
    }
}
