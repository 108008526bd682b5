//! Animated distortion demo: a checkerboard sprite pinned to a quad whose
//! warp coefficients oscillate over time.

use std::sync::Arc;
use std::time::Instant;

use image::{Rgba, RgbaImage};
use quadwarp::pass::BilinearSpritePass;
use quadwarp::sprite::{frame_transform, project_corners};
use quadwarp::utils::{Mat3, Rectangle, Size};
use quadwarp::{
    pack_tint, BilinearSurface, Distortion, PassConfig, PassUniforms, SpriteBatcher,
    SpriteInstance,
};
use uuid::Uuid;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

const SPRITE_SIZE: f32 = 360.0;

fn checkerboard(size: u32, cell: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba([240, 200, 80, 255])
        } else {
            Rgba([40, 60, 110, 255])
        }
    })
}

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pass: BilinearSpritePass,
    texture: Uuid,
    batcher: SpriteBatcher,
}

struct WarpDemo {
    state: Option<State>,
    start: Instant,
}

impl WarpDemo {
    fn new() -> Self {
        Self {
            state: None,
            start: Instant::now(),
        }
    }
}

impl ApplicationHandler<()> for WarpDemo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let attributes = Window::default_attributes()
            .with_title("quadwarp demo")
            .with_inner_size(winit::dpi::PhysicalSize::new(800, 600));
        let Ok(window) = event_loop.create_window(attributes) else {
            return;
        };
        let window = Arc::new(window);
        let size = window.inner_size();

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .expect("no suitable adapter");
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("request device");

        let config = wgpu::SurfaceConfiguration {
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![wgpu::TextureFormat::Bgra8UnormSrgb],
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
        };
        surface.configure(&device, &config);

        let mut pass =
            BilinearSpritePass::new(&device, config.format, PassConfig::default());
        let texture = pass.register_texture(&device, &queue, &checkerboard(512, 64));
        let batcher = SpriteBatcher::new(pass.config());

        self.state = Some(State {
            window,
            surface,
            device,
            queue,
            config,
            pass,
            texture,
            batcher,
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        match event {
            WindowEvent::Resized(new_size) => {
                state.config.width = new_size.width.max(1);
                state.config.height = new_size.height.max(1);
                state.surface.configure(&state.device, &state.config);
            }
            WindowEvent::RedrawRequested => {
                let t = self.start.elapsed().as_secs_f32();
                let distortion =
                    Distortion::new(0.0022 * (t * 0.9).sin(), 0.0018 * (t * 1.3).cos());

                let rect = Rectangle::new(0.0, 0.0, SPRITE_SIZE, SPRITE_SIZE);
                let warp_surface = BilinearSurface::new(distortion);
                let sprite = SpriteInstance {
                    corners: project_corners(&warp_surface, rect),
                    frame: Rectangle::new(0.0, 0.0, 1.0, 1.0),
                    trans: frame_transform(Rectangle::new(0.0, 0.0, 1.0, 1.0), rect.size()),
                    tint: pack_tint([1.0, 1.0, 1.0], 1.0),
                    orig_size: rect.size(),
                    texture: state.texture,
                };

                state.batcher.clear();
                state.batcher.push(&sprite);

                let uniforms = PassUniforms {
                    world_transform: Mat3::translation(120.0, 120.0),
                    distortion,
                };
                let viewport = Size {
                    width: state.config.width as f32,
                    height: state.config.height as f32,
                };
                state.pass.prepare(
                    &state.device,
                    &state.queue,
                    &state.batcher,
                    &uniforms,
                    viewport,
                );

                let frame = match state.surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(e) => {
                        log::warn!("surface frame unavailable: {e}");
                        return;
                    }
                };
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                let mut encoder = state
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("demo-encoder"),
                    });
                {
                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("demo-pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: 0.08,
                                    g: 0.08,
                                    b: 0.1,
                                    a: 1.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    state.pass.draw(&mut rpass, &state.batcher);
                }
                state.queue.submit(Some(encoder.finish()));
                frame.present();
                state.window.request_redraw();
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            _ => (),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let event_loop = EventLoop::new()?;
    let mut app = WarpDemo::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
