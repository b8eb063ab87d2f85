use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use glam::{Mat4, Vec3, Vec4};
use log::info;
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use prism_runtime::shader::{
    instanced_shader_source, lit_shader_source, skinned_shader_source, skybox_shader_source,
};
use prism_runtime::{
    unit_cube, DirectionsInput, Material, MeshData, Motion, MouseRelativeMovement, PingPong,
    PixelShader, PointLight, Renderer, RuntimeError, SamplerKind, Scene, SkinWeights,
    SkinnedModel, Skybox, StaticRenderable, TextureData, VertexShader, VoxelBatch,
};

const DEFAULT_HEADLESS_FRAMES: u64 = 120;
const FIXED_STEP: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let renderer = build_demo()?;
    println!("Draw plan:");
    for item in renderer.frame_plan().items {
        println!(" - {} ({:?})", item.name, item.kind);
    }

    if options.headless {
        return run_headless(renderer, options.frames.unwrap_or(DEFAULT_HEADLESS_FRAMES));
    }

    match run_interactive(renderer, options.frames) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!("{err}. Falling back to --headless mode.");
                run_headless(
                    build_demo()?,
                    options.frames.unwrap_or(DEFAULT_HEADLESS_FRAMES),
                )
            } else {
                Err(err)
            }
        }
    }
}

/// Builds the demo content: shaders, a populated main scene and one
/// top-level renderable rebound to the registered shaders.
fn build_demo() -> Result<Renderer> {
    let mut renderer = Renderer::new();

    renderer.add_vertex_shader("Lit", VertexShader::new(lit_shader_source(), "vs_main"))?;
    renderer.add_pixel_shader("Lit", PixelShader::new(lit_shader_source(), "fs_main"))?;
    renderer.add_vertex_shader(
        "Voxel",
        VertexShader::new(instanced_shader_source(), "vs_main"),
    )?;
    renderer.add_pixel_shader(
        "Voxel",
        PixelShader::new(instanced_shader_source(), "fs_main"),
    )?;
    renderer.add_vertex_shader(
        "Skinned",
        VertexShader::new(skinned_shader_source(), "vs_main"),
    )?;
    renderer.add_pixel_shader(
        "Skinned",
        PixelShader::new(skinned_shader_source(), "fs_main"),
    )?;
    renderer.add_vertex_shader(
        "Skybox",
        VertexShader::new(skybox_shader_source(), "vs_main"),
    )?;
    renderer.add_pixel_shader(
        "Skybox",
        PixelShader::new(skybox_shader_source(), "fs_main"),
    )?;

    let mut scene = Scene::new();
    scene.set_light(
        0,
        PointLight::new(Vec3::new(0.0, 4.0, -4.0), Vec3::ONE, 12.0),
    )?;
    scene.set_light(
        1,
        PointLight::new(Vec3::new(5.0, 3.0, 0.0), Vec3::new(1.0, 0.6, 0.3), 10.0).with_orbit(0.8),
    )?;

    scene.add_renderable(
        "orbiter",
        StaticRenderable::new(
            unit_cube(),
            Motion::Orbit {
                spin_rate: 1.0,
                orbit_rate: 0.5,
                offset: Vec3::new(-4.0, 1.0, 0.0),
                scale: 0.3,
            },
        )
        .with_output_color(Vec4::new(0.2, 0.8, 0.3, 1.0))
        .with_shaders("Lit", "Lit"),
    )?;
    scene.add_renderable(
        "spinner",
        StaticRenderable::new(unit_cube(), Motion::Spin { rate: 1.5 })
            .with_materials(vec![Material::diffuse_only(checkerboard(8))])
            .with_shaders("Lit", "Lit"),
    )?;
    scene.add_renderable(
        "bobber",
        StaticRenderable::new(unit_cube(), Motion::Bob { radius: 3.0 })
            .with_output_color(Vec4::new(0.9, 0.3, 0.2, 1.0))
            .with_shaders("Lit", "Lit"),
    )?;

    scene.add_voxel_batch(
        VoxelBatch::new(unit_cube(), floor_instances(8))
            .with_output_color(Vec4::new(0.4, 0.4, 0.5, 1.0))
            .with_shaders("Voxel", "Voxel"),
    );

    let mesh = unit_cube();
    let skin = cube_skin(&mesh);
    scene.add_model(
        SkinnedModel::new(mesh, skin, 2)
            .with_motion(Motion::Fixed)
            .with_materials(vec![Material::diffuse_only(checkerboard(4))])
            .with_shaders("Skinned", "Skinned"),
    );

    scene.set_skybox(Skybox::new(sky_gradient(), 500.0).with_shaders("Skybox", "Skybox"));

    renderer.add_scene("Main", scene)?;
    renderer.set_main_scene("Main")?;

    renderer.add_renderable(
        "Cube",
        StaticRenderable::new(unit_cube(), Motion::PingPong(PingPong::new(1.0, 6.0, 3.0)))
            .with_output_color(Vec4::new(0.3, 0.5, 0.9, 1.0)),
    )?;
    renderer.set_vertex_shader_of_renderable("Cube", "Lit")?;
    renderer.set_pixel_shader_of_renderable("Cube", "Lit")?;

    Ok(renderer)
}

fn floor_instances(side: i32) -> Vec<Mat4> {
    let mut instances = Vec::with_capacity((side * side) as usize);
    for x in 0..side {
        for z in 0..side {
            let offset = Vec3::new(
                (x - side / 2) as f32,
                -1.5,
                (z - side / 2) as f32,
            );
            instances
                .push(Mat4::from_translation(offset) * Mat4::from_scale(Vec3::splat(0.9)));
        }
    }
    instances
}

/// Rigid two-bone skin: vertices above the cube midline follow bone 1.
fn cube_skin(mesh: &MeshData) -> Vec<SkinWeights> {
    mesh.vertices
        .iter()
        .map(|vertex| {
            let bone = if vertex.position[1] > 0.0 { 1 } else { 0 };
            SkinWeights {
                bone_indices: [bone, 0, 0, 0],
                bone_weights: [1.0, 0.0, 0.0, 0.0],
            }
        })
        .collect()
}

fn checkerboard(size: u32) -> TextureData {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let value = if (x + y) % 2 == 0 { 220 } else { 40 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    TextureData::new(size, size, pixels, SamplerKind::Wrap)
}

fn sky_gradient() -> TextureData {
    let height = 64u32;
    let mut pixels = Vec::with_capacity((height * 4) as usize);
    for y in 0..height {
        let t = y as f32 / (height - 1) as f32;
        let r = (10.0 + 40.0 * t) as u8;
        let g = (20.0 + 60.0 * t) as u8;
        let b = (80.0 + 120.0 * t) as u8;
        pixels.extend_from_slice(&[r, g, b, 255]);
    }
    TextureData::new(1, height, pixels, SamplerKind::Clamp)
}

/// Procedural pose for the demo's two-bone model.
fn sway_pose(elapsed: f32) -> [Mat4; 2] {
    [
        Mat4::IDENTITY,
        Mat4::from_rotation_z((elapsed * 2.0).sin() * 0.4),
    ]
}

fn run_headless(mut renderer: Renderer, frames: u64) -> Result<()> {
    let mut elapsed = 0.0f32;
    for _ in 0..frames {
        elapsed += FIXED_STEP;
        if let Some(scene) = renderer.main_scene_mut() {
            scene.set_bone_transforms(&sway_pose(elapsed));
        }
        renderer.update(FIXED_STEP);
    }
    println!("Simulated {frames} frames");
    print_final_state(&renderer);
    Ok(())
}

fn print_final_state(renderer: &Renderer) {
    let eye = renderer.camera().eye();
    println!("Camera eye=({:.2}, {:.2}, {:.2})", eye.x, eye.y, eye.z);
    if let Some(scene) = renderer.main_scene() {
        for (name, renderable) in scene.renderables() {
            let position = renderable.world().w_axis;
            println!(
                " - {name} pos=({:.2}, {:.2}, {:.2})",
                position.x, position.y, position.z
            );
        }
    }
    for (name, renderable) in renderer.registry().renderables() {
        let position = renderable.world().w_axis;
        println!(
            " - {name} pos=({:.2}, {:.2}, {:.2})",
            position.x, position.y, position.z
        );
    }
}

fn run_interactive(renderer: Renderer, frames: Option<u64>) -> Result<()> {
    let event_loop = EventLoop::new()
        .map_err(|err| anyhow!(WindowInitError::from_error("event loop", err)))?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Prism Runtime")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| anyhow!(WindowInitError::from_error("window", err)))?,
    );

    let mut app = AppState {
        renderer,
        directions: DirectionsInput::default(),
        mouse: MouseRelativeMovement::default(),
        last_frame: Instant::now(),
        elapsed: 0.0,
        frame_count: 0,
        frame_limit: frames,
        last_error: None,
    };

    match block_on(app.renderer.initialize(Arc::clone(&window))) {
        Ok(()) => {}
        Err(RuntimeError::Setup(message)) => {
            return Err(anyhow!(WindowInitError::from_error("device", message)));
        }
        Err(err) => return Err(err.into()),
    }

    event_loop.run(|event, elwt| {
        if let Err(err) = app.process_event(&event, elwt) {
            app.last_error = Some(err);
            elwt.exit();
        }
    })?;

    println!("Simulated {} frames", app.frame_count);
    print_final_state(&app.renderer);

    if let Some(err) = app.last_error {
        return Err(err);
    }
    Ok(())
}

struct AppState {
    renderer: Renderer,
    directions: DirectionsInput,
    mouse: MouseRelativeMovement,
    last_frame: Instant,
    elapsed: f32,
    frame_count: u64,
    frame_limit: Option<u64>,
    last_error: Option<anyhow::Error>,
}

impl AppState {
    fn process_event(
        &mut self,
        event: &Event<()>,
        elwt: &EventLoopWindowTarget<()>,
    ) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id }
                if Some(*window_id) == self.renderer.window_id() =>
            {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => self.renderer.resize(*size),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(code),
                                state,
                                ..
                            },
                        ..
                    } => self.handle_key(*code, *state, elwt),
                    WindowEvent::RedrawRequested => return self.redraw(elwt),
                    _ => {}
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                self.mouse.accumulate(delta.0 as f32, delta.1 as f32);
            }
            Event::AboutToWait => {
                if let Some(window) = self.renderer.window() {
                    window.request_redraw();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState, elwt: &EventLoopWindowTarget<()>) {
        let pressed = state == ElementState::Pressed;
        match code {
            KeyCode::KeyW => self.directions.front = pressed,
            KeyCode::KeyS => self.directions.back = pressed,
            KeyCode::KeyA => self.directions.left = pressed,
            KeyCode::KeyD => self.directions.right = pressed,
            KeyCode::Space => self.directions.up = pressed,
            KeyCode::ShiftLeft => self.directions.down = pressed,
            KeyCode::Escape if pressed => elwt.exit(),
            _ => {}
        }
    }

    fn redraw(&mut self, elwt: &EventLoopWindowTarget<()>) -> Result<()> {
        let now = Instant::now();
        let delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.elapsed += delta_time;

        self.renderer
            .handle_input(&self.directions, &self.mouse, delta_time);
        self.mouse.reset();

        let pose = sway_pose(self.elapsed);
        if let Some(scene) = self.renderer.main_scene_mut() {
            scene.set_bone_transforms(&pose);
        }
        self.renderer.update(delta_time);

        if let Err(err) = self.renderer.render() {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    if let Some(window) = self.renderer.window() {
                        let size = window.inner_size();
                        self.renderer.resize(size);
                    }
                }
                wgpu::SurfaceError::OutOfMemory => {
                    return Err(anyhow!("GPU is out of memory"));
                }
                wgpu::SurfaceError::Timeout => {
                    info!("surface timeout; retrying next frame");
                }
            }
        }

        self.frame_count += 1;
        if let Some(limit) = self.frame_limit {
            if self.frame_count >= limit {
                elwt.exit();
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

struct CliOptions {
    frames: Option<u64>,
    headless: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut frames = None;
        let mut headless = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--headless" => headless = true,
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames expects a count"))?;
                    frames = Some(value.parse().map_err(|_| {
                        anyhow!("invalid frame count: {value}")
                    })?);
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --headless or --frames <count>"
                    ));
                }
            }
        }
        Ok(Self { frames, headless })
    }
}
