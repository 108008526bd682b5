use std::fs;
use std::path::Path;

use image::{ImageReader, Rgba, RgbaImage};
use quadwarp::pass::{request_headless_device, BilinearSpritePass};
use quadwarp::sprite::{frame_transform, project_corners};
use quadwarp::utils::{Mat3, Rectangle, Size};
use quadwarp::{
    pack_tint, BilinearSurface, Distortion, PassConfig, PassUniforms, SpriteBatcher,
    SpriteInstance, UniformContext,
};

fn checkerboard(size: u32, cell: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba([235, 235, 235, 255])
        } else {
            Rgba([40, 40, 40, 255])
        }
    })
}

fn save_texture_png(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    tex: &wgpu::Texture,
    path: &Path,
) -> anyhow::Result<()> {
    let size = tex.size();
    let bytes_per_row = ((size.width * 4 + 255) / 256) * 256; // align to 256
    let output = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("snapshot-output"),
        size: (bytes_per_row as u64) * (size.height as u64),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("snapshot-encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: tex,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &output,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size.height),
            },
        },
        wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = output.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        tx.send(r).ok();
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv()??;
    let view = slice.get_mapped_range();
    let mut rgba = Vec::with_capacity((size.width * size.height * 4) as usize);
    for row in view.chunks(bytes_per_row as usize) {
        rgba.extend_from_slice(&row[..(size.width * 4) as usize]);
    }
    drop(view);
    output.unmap();

    let img = RgbaImage::from_raw(size.width, size.height, rgba)
        .ok_or_else(|| anyhow::anyhow!("readback size mismatch"))?;
    img.save(path)?;
    Ok(())
}

fn compare_with_tolerance(a_path: &Path, b_path: &Path, tolerance: u8) -> anyhow::Result<bool> {
    let a = ImageReader::open(a_path)?.decode()?.to_rgba8();
    let b = ImageReader::open(b_path)?.decode()?.to_rgba8();
    if a.dimensions() != b.dimensions() {
        return Ok(false);
    }
    Ok(a.pixels().zip(b.pixels()).all(|(pa, pb)| {
        let da = pa.0;
        let db = pb.0;
        (0..4).all(|i| da[i].abs_diff(db[i]) <= tolerance)
    }))
}

fn render_snapshot(name: &str, distortion: Distortion) -> anyhow::Result<()> {
    let (_instance, device, queue) = request_headless_device()?;
    let mut pass = BilinearSpritePass::new(
        &device,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        PassConfig::default(),
    );

    let texture = pass.register_texture(&device, &queue, &checkerboard(256, 32));

    // Quad corners live in surface-projected space; screen placement goes
    // through the world transform so the solver sees undisplaced positions.
    let rect = Rectangle::new(0.0, 0.0, 200.0, 200.0);
    let surface = BilinearSurface::new(distortion);
    let sprite = SpriteInstance {
        corners: project_corners(&surface, rect),
        frame: Rectangle::new(0.0, 0.0, 1.0, 1.0),
        trans: frame_transform(Rectangle::new(0.0, 0.0, 1.0, 1.0), rect.size()),
        tint: pack_tint([1.0, 1.0, 1.0], 1.0),
        orig_size: rect.size(),
        texture,
    };

    let mut batcher = SpriteBatcher::new(pass.config());
    batcher.push(&sprite);

    let bound = PassUniforms {
        world_transform: Mat3::translation(32.0, 32.0),
        distortion,
    };
    let ctx = UniformContext {
        surface: Some(&bound),
        active: None,
        defaults: &PassUniforms::DEFAULT,
    };
    let uniforms = *ctx.resolve();

    let viewport = Size {
        width: 320.0,
        height: 320.0,
    };
    pass.prepare(&device, &queue, &batcher, &uniforms, viewport);

    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("snapshot-target"),
        size: wgpu::Extent3d {
            width: 320,
            height: 320,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[wgpu::TextureFormat::Rgba8UnormSrgb],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("snapshot-render"),
    });
    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("snapshot-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.1,
                        g: 0.2,
                        b: 0.3,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.draw(&mut rpass, &batcher);
    }
    queue.submit(Some(encoder.finish()));

    fs::create_dir_all("snapshots/actual").ok();
    fs::create_dir_all("snapshots/golden").ok();
    let out_actual = Path::new("snapshots/actual").join(format!("{name}.png"));
    let out_golden = Path::new("snapshots/golden").join(format!("{name}.png"));
    save_texture_png(&device, &queue, &target, &out_actual)?;
    if !out_golden.exists() {
        fs::copy(&out_actual, &out_golden)?;
    }
    let ok = compare_with_tolerance(&out_actual, &out_golden, 3)?;
    println!("{} snapshot {}", name, if ok { "OK" } else { "MISMATCH" });
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    render_snapshot("affine_passthrough", Distortion::NONE)?;
    render_snapshot("warped_general", Distortion::new(0.0008, 0.0005))?;
    render_snapshot("warped_one_axis", Distortion::new(0.0, 0.002))?;
    Ok(())
}
