use image::{Rgba, RgbaImage};
use quadwarp::kernel::{edge_coverage, shade, FragmentInput, TextureSlot};
use quadwarp::utils::{Position, Rectangle};
use quadwarp::{pack_sprite, pack_tint, Distortion, SpriteInstance};

fn solid_texture(rgba: [u8; 4]) -> TextureSlot {
    TextureSlot::new(RgbaImage::from_pixel(4, 4, Rgba(rgba)))
}

fn plain_input(position: Position) -> FragmentInput {
    FragmentInput {
        position,
        trans1: [1.0, 0.0, 0.0],
        trans2: [0.0, 1.0, 0.0],
        frame: [0.0, 0.0, 1.0, 1.0],
        color: [1.0, 1.0, 1.0, 1.0],
        texture_id: 0.0,
    }
}

#[test]
fn samples_texel_centers_exactly() {
    let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 1, Rgba([0, 255, 0, 255]));
    let slot = TextureSlot::new(img);

    let top_left = slot.sample(0.25, 0.25);
    assert_eq!(top_left, [1.0, 0.0, 0.0, 1.0]);

    let bottom_right = slot.sample(0.75, 0.75);
    assert_eq!(bottom_right, [0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn sampling_clamps_to_edge() {
    let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
    let slot = TextureSlot::new(img);

    // Far outside the right edge still reads the rightmost texel.
    assert_eq!(slot.sample(4.0, 0.5), [1.0, 1.0, 1.0, 1.0]);
    assert_eq!(slot.sample(-3.0, 0.5), [0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn undistorted_fragment_samples_and_tints() {
    let textures = [solid_texture([255, 0, 0, 255])];
    let out = shade(
        &plain_input(Position::new(0.5, 0.5)),
        Distortion::NONE,
        &textures,
    )
    .expect("no distortion never discards in-bounds fragments");
    assert_eq!(out.color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(out.coverage, 1.0);
}

#[test]
fn tint_multiplies_premultiplied() {
    let textures = [solid_texture([255, 255, 255, 255])];
    let mut input = plain_input(Position::new(0.5, 0.5));
    input.color = [0.5, 0.25, 0.0, 0.5];
    let out = shade(&input, Distortion::NONE, &textures).expect("shaded");
    assert_eq!(out.color, [0.5, 0.25, 0.0, 0.5]);
}

#[test]
fn no_solution_discards() {
    let textures = [solid_texture([255, 255, 255, 255])];
    // dx = dy = 1 with vy == vx gives discriminant 0.25 + vx.
    let input = plain_input(Position::new(-0.25, -0.25));
    assert!(shade(&input, Distortion::new(1.0, 1.0), &textures).is_none());
}

#[test]
fn distorted_fragment_recovers_surface_point() {
    let textures = [solid_texture([0, 0, 255, 255])];
    let distortion = Distortion::new(0.35, 0.25);
    let surface = quadwarp::BilinearSurface::new(distortion);
    // Shade at the projected position of a known surface point; the solver
    // must land back inside the frame and sample.
    let screen = surface.project(Position::new(0.5, 0.5));
    let out = shade(&plain_input(screen), distortion, &textures).expect("in-domain");
    assert_eq!(out.color, [0.0, 0.0, 1.0, 1.0]);
    assert!((out.coverage - 1.0).abs() < 1e-4);
}

#[test]
fn texture_unit_rounds_to_nearest() {
    let textures = [
        solid_texture([255, 0, 0, 255]),
        solid_texture([0, 255, 0, 255]),
    ];
    let mut input = plain_input(Position::new(0.5, 0.5));

    input.texture_id = 0.4;
    let out = shade(&input, Distortion::NONE, &textures).expect("unit 0");
    assert_eq!(out.color, [1.0, 0.0, 0.0, 1.0]);

    input.texture_id = 0.6;
    let out = shade(&input, Distortion::NONE, &textures).expect("unit 1");
    assert_eq!(out.color, [0.0, 1.0, 0.0, 1.0]);

    input.texture_id = 1.4;
    let out = shade(&input, Distortion::NONE, &textures).expect("unit 1");
    assert_eq!(out.color, [0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn unbound_unit_discards() {
    let textures = [solid_texture([255, 0, 0, 255])];
    let mut input = plain_input(Position::new(0.5, 0.5));
    input.texture_id = 1.0;
    assert!(shade(&input, Distortion::NONE, &textures).is_none());
}

#[test]
fn edge_coverage_is_reported_but_not_applied() {
    let textures = [solid_texture([255, 255, 255, 255])];
    // uv lands 0.4 past the right frame bound.
    let input = plain_input(Position::new(1.4, 0.5));
    let out = shade(&input, Distortion::NONE, &textures).expect("shaded");
    assert!((out.coverage - 0.1).abs() < 1e-6, "partial edge factor");
    // Alpha stays untouched by the coverage factor.
    assert_eq!(out.color[3], 1.0);
}

#[test]
fn edge_coverage_factors() {
    let frame = [0.0, 0.0, 1.0, 1.0];
    assert_eq!(edge_coverage([0.5, 0.5], frame), 1.0);
    assert!(edge_coverage([1.3, 0.5], frame) < 1.0);
    assert_eq!(edge_coverage([2.0, 0.5], frame), 0.0);
}

#[test]
fn packed_corner_shades_like_direct_input() {
    let textures = [solid_texture([255, 0, 0, 255])];
    let sprite = SpriteInstance::from_rect(
        uuid::Uuid::new_v4(),
        Rectangle::new(0.0, 0.0, 8.0, 8.0),
        pack_tint([1.0, 1.0, 1.0], 1.0),
    );
    let mut records = vec![bytemuck::Zeroable::zeroed(); 4];
    pack_sprite(&mut records, 0, &sprite, 0);

    // Corner BR maps to uv (1, 1) through the frame transform.
    let input = FragmentInput::from_vertex(&records[2]);
    let out = shade(&input, Distortion::NONE, &textures).expect("shaded");
    assert_eq!(out.color, [1.0, 0.0, 0.0, 1.0]);
}
