use quadwarp::utils::Rectangle;
use quadwarp::{PassConfig, SpriteBatcher, SpriteInstance};
use uuid::Uuid;

fn sprite(texture: Uuid) -> SpriteInstance {
    SpriteInstance::from_rect(texture, Rectangle::new(0.0, 0.0, 16.0, 16.0), 0xFFFF_FFFF)
}

#[test]
fn same_texture_extends_one_batch() {
    let tex = Uuid::new_v4();
    let mut batcher = SpriteBatcher::new(PassConfig::default());
    batcher.push(&sprite(tex));
    batcher.push(&sprite(tex));

    assert_eq!(batcher.quad_count(), 2);
    assert_eq!(batcher.vertices().len(), 8);
    let batches = batcher.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].quad_count, 2);
    assert_eq!(batches[0].textures, vec![tex]);
}

#[test]
fn texture_change_starts_new_batch_at_unit_limit_one() {
    let tex_a = Uuid::new_v4();
    let tex_b = Uuid::new_v4();
    let mut batcher = SpriteBatcher::new(PassConfig { max_textures: 1 });
    batcher.push(&sprite(tex_a));
    batcher.push(&sprite(tex_b));
    batcher.push(&sprite(tex_a));

    let batches = batcher.batches();
    assert_eq!(batches.len(), 3, "alternating textures cannot share a batch");
    assert_eq!(batches[1].quad_start, 1);
    assert_eq!(batches[1].first_index(), 6);
    assert_eq!(batches[2].quad_start, 2);

    // With one unit per batch every record carries id 0.
    assert!(batcher.vertices().iter().all(|v| v.texture_id == 0.0));
}

#[test]
fn units_are_assigned_within_a_batch() {
    let tex_a = Uuid::new_v4();
    let tex_b = Uuid::new_v4();
    let mut batcher = SpriteBatcher::new(PassConfig { max_textures: 2 });
    batcher.push(&sprite(tex_a));
    batcher.push(&sprite(tex_b));
    batcher.push(&sprite(tex_a));

    let batches = batcher.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].textures, vec![tex_a, tex_b]);

    let ids: Vec<f32> = batcher
        .vertices()
        .chunks(4)
        .map(|quad| quad[0].texture_id)
        .collect();
    assert_eq!(ids, vec![0.0, 1.0, 0.0]);
}

#[test]
fn exhausted_units_flush_into_new_batch() {
    let textures: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let mut batcher = SpriteBatcher::new(PassConfig { max_textures: 2 });
    for tex in &textures {
        batcher.push(&sprite(*tex));
    }

    let batches = batcher.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].textures.len(), 2);
    assert_eq!(batches[1].textures, vec![textures[2]]);
    assert_eq!(batches[1].quad_start, 2);
}

#[test]
fn clear_resets_everything() {
    let mut batcher = SpriteBatcher::new(PassConfig::default());
    batcher.push(&sprite(Uuid::new_v4()));
    batcher.clear();
    assert!(batcher.is_empty());
    assert!(batcher.batches().is_empty());
    assert_eq!(batcher.indices().len(), 0);
}

#[test]
fn indices_cover_all_quads() {
    let tex = Uuid::new_v4();
    let mut batcher = SpriteBatcher::new(PassConfig::default());
    for _ in 0..3 {
        batcher.push(&sprite(tex));
    }
    let indices = batcher.indices();
    assert_eq!(indices.len(), 18);
    assert_eq!(&indices[12..], &[8, 9, 10, 8, 10, 11]);
}

#[test]
fn config_round_trips_through_json() {
    let config = PassConfig { max_textures: 4 };
    let json = config.to_json();
    let parsed = PassConfig::from_json(&json).expect("parse config");
    assert_eq!(parsed, config);
    assert!(PassConfig::from_json("not json").is_none());
}
