use bytemuck::Zeroable;
use quadwarp::utils::{Affine2, Position, Rectangle, Size};
use quadwarp::{
    build_quad_indices, pack_sprite, pack_tint, unpack_tint, BilinearVertex, SpriteInstance,
    VERTEX_SCALARS,
};

fn zeroed_records(n: usize) -> Vec<BilinearVertex> {
    vec![BilinearVertex::zeroed(); n]
}

fn test_sprite() -> SpriteInstance {
    SpriteInstance {
        corners: [
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(10.0, 10.0),
            Position::new(0.0, 10.0),
        ],
        frame: Rectangle::new(0.0, 0.0, 1.0, 1.0),
        trans: Affine2::IDENTITY,
        tint: 0xFFFF_FFFF,
        orig_size: Size {
            width: 10.0,
            height: 10.0,
        },
        texture: uuid::Uuid::new_v4(),
    }
}

#[test]
fn record_is_56_bytes_with_spec_offsets() {
    assert_eq!(std::mem::size_of::<BilinearVertex>(), 56);
    assert_eq!(VERTEX_SCALARS * 4, 56);

    let desc = BilinearVertex::desc();
    assert_eq!(desc.array_stride, 56);
    let offsets: Vec<u64> = desc.attributes.iter().map(|a| a.offset).collect();
    assert_eq!(offsets, vec![0, 8, 20, 32, 48, 52]);
}

#[test]
fn packs_four_records_per_sprite() {
    let sprite = test_sprite();
    let mut out = zeroed_records(8);

    let next = pack_sprite(&mut out, 0, &sprite, 0);
    assert_eq!(next, 4, "one sprite advances the offset by four records");
    assert_eq!(
        next * VERTEX_SCALARS,
        56,
        "four records span 56 scalar slots"
    );

    let expected_positions = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
    for (i, v) in out[..4].iter().enumerate() {
        assert_eq!(v.position, expected_positions[i]);
        assert_eq!(v.trans1, [1.0, 0.0, 0.0], "identity x row is (a, c, tx)");
        assert_eq!(v.trans2, [0.0, 1.0, 0.0], "identity y row is (b, d, ty)");
        assert_eq!(v.frame, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(v.color, 0xFFFF_FFFF);
        assert_eq!(v.texture_id, 0.0);
    }

    // A second sprite starts exactly where the first ended.
    let after = pack_sprite(&mut out, next, &test_sprite(), 0);
    assert_eq!(after, 8);
    assert_eq!(out[4].position, [0.0, 0.0]);
    assert_eq!(out[7].position, [0.0, 10.0]);
}

#[test]
fn color_field_shares_bytes_with_unorm_view() {
    let mut sprite = test_sprite();
    sprite.tint = pack_tint([1.0, 0.5, 0.0], 1.0);

    let mut out = zeroed_records(4);
    pack_sprite(&mut out, 0, &sprite, 0);

    // The u32 field and the GPU's Unorm8x4 view must agree byte for byte:
    // red in byte 0, alpha in byte 3 at offset 48.
    let bytes: &[u8] = bytemuck::cast_slice(&out[..1]);
    assert_eq!(&bytes[48..52], &[255, 128, 0, 255]);
}

#[test]
fn tint_packs_premultiplied() {
    let tint = pack_tint([1.0, 0.5, 0.0], 0.5);
    let unpacked = unpack_tint(tint);
    assert!((unpacked[0] - 0.5).abs() < 2.0 / 255.0, "red premultiplied");
    assert!((unpacked[1] - 0.25).abs() < 2.0 / 255.0, "green premultiplied");
    assert_eq!(unpacked[2], 0.0);
    assert!((unpacked[3] - 0.5).abs() < 2.0 / 255.0, "alpha untouched");
}

#[test]
fn indices_pair_two_triangles_per_quad() {
    assert_eq!(build_quad_indices(1), vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(
        build_quad_indices(2),
        vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]
    );
    // Record-count invariant: every quad owns exactly four records.
    assert_eq!(build_quad_indices(100).len(), 600);
}

#[test]
fn frame_bounds_pack_as_min_max() {
    let mut sprite = test_sprite();
    sprite.frame = Rectangle::new(0.25, 0.5, 0.5, 0.25);
    let mut out = zeroed_records(4);
    pack_sprite(&mut out, 0, &sprite, 0);
    assert_eq!(out[0].frame, [0.25, 0.5, 0.75, 0.75]);
}
