pub mod context;
pub mod frame;
pub mod pipeline;
pub mod uniforms;

use std::f32::consts::FRAC_PI_4;
use std::ops::Range;
use std::sync::Arc;

use bytemuck::bytes_of;
use glam::Mat4;
use log::warn;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::camera::Camera;
use crate::drawable::StaticRenderable;
use crate::error::{Result, RuntimeError};
use crate::geometry::{MeshBuffers, SubMesh};
use crate::input::{DirectionsInput, MouseRelativeMovement};
use crate::registry::ResourceRegistry;
use crate::scene::Scene;
use crate::shader::{
    instanced_shader_source, lit_shader_source, skinned_shader_source, skybox_shader_source,
    PixelShader, VertexShader,
};
use crate::texture::{create_samplers, GpuTexture, SamplerKind, TextureData};

use context::GpuContext;
use frame::FramePlan;
use pipeline::{BindGroupLayouts, DrawKind, ModelGpu, PipelineCache, PipelineKey, RenderableGpu,
    SkyboxGpu, VoxelGpu};
use uniforms::{
    CameraUniform, LightsUniform, ObjectUniform, ProjectionUniform, SkinningUniform,
};

const NEAR_PLANE: f32 = 0.01;
const FAR_PLANE: f32 = 1000.0;

// MidnightBlue, the fixed clear color.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 25.0 / 255.0,
    g: 25.0 / 255.0,
    b: 112.0 / 255.0,
    a: 1.0,
};

/// Shader modules used for any draw whose named shaders do not resolve.
struct BuiltinShaders {
    lit: wgpu::ShaderModule,
    instanced: wgpu::ShaderModule,
    skinned: wgpu::ShaderModule,
    skybox: wgpu::ShaderModule,
}

impl BuiltinShaders {
    fn compile(device: &wgpu::Device) -> Self {
        let compile = |source: String, label| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };
        Self {
            lit: compile(lit_shader_source(), "builtin-lit"),
            instanced: compile(instanced_shader_source(), "builtin-instanced"),
            skinned: compile(skinned_shader_source(), "builtin-skinned"),
            skybox: compile(skybox_shader_source(), "builtin-skybox"),
        }
    }

    fn module(&self, kind: DrawKind) -> &wgpu::ShaderModule {
        match kind {
            DrawKind::Static => &self.lit,
            DrawKind::Instanced => &self.instanced,
            DrawKind::Skinned => &self.skinned,
            DrawKind::Skybox => &self.skybox,
        }
    }
}

fn builtin_shader_name(kind: DrawKind) -> &'static str {
    match kind {
        DrawKind::Static => "builtin-lit",
        DrawKind::Instanced => "builtin-instanced",
        DrawKind::Skinned => "builtin-skinned",
        DrawKind::Skybox => "builtin-skybox",
    }
}

/// Maps a draw to its pipeline key, falling back to the builtin shaders
/// when a referenced shader is unregistered or not yet compiled.
fn resolve_key(
    registry: &ResourceRegistry,
    kind: DrawKind,
    vertex_shader: Option<&str>,
    pixel_shader: Option<&str>,
) -> PipelineKey {
    let vertex_shader = vertex_shader
        .filter(|name| {
            registry
                .vertex_shader(name)
                .is_some_and(|shader| shader.module().is_some())
        })
        .unwrap_or_else(|| builtin_shader_name(kind))
        .to_string();
    let pixel_shader = pixel_shader
        .filter(|name| {
            registry
                .pixel_shader(name)
                .is_some_and(|shader| shader.module().is_some())
        })
        .unwrap_or_else(|| builtin_shader_name(kind))
        .to_string();
    PipelineKey {
        vertex_shader,
        pixel_shader,
        kind,
    }
}

struct GpuState {
    window: Arc<Window>,
    context: GpuContext,
    layouts: BindGroupLayouts,
    pipelines: PipelineCache,
    builtins: BuiltinShaders,
    samplers: [wgpu::Sampler; SamplerKind::COUNT],
    fallback: GpuTexture,
    projection_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
}

/// The runtime core: owns the registry, the camera and all GPU state, and
/// drives the per-frame update/render split.
///
/// Resources can be registered before a device exists; `initialize` uploads
/// everything registered so far, and later additions are uploaded lazily on
/// the next frame.
pub struct Renderer {
    registry: ResourceRegistry,
    camera: Camera,
    gpu: Option<GpuState>,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            registry: ResourceRegistry::new(),
            camera: Camera::new(glam::Vec3::new(0.0, 3.0, -6.0)),
            gpu: None,
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn add_scene(&mut self, name: impl Into<String>, scene: Scene) -> Result<()> {
        self.registry.add_scene(name, scene)
    }

    pub fn add_vertex_shader(
        &mut self,
        name: impl Into<String>,
        shader: VertexShader,
    ) -> Result<()> {
        self.registry.add_vertex_shader(name, shader)
    }

    pub fn add_pixel_shader(&mut self, name: impl Into<String>, shader: PixelShader) -> Result<()> {
        self.registry.add_pixel_shader(name, shader)
    }

    pub fn add_renderable(
        &mut self,
        name: impl Into<String>,
        renderable: StaticRenderable,
    ) -> Result<()> {
        self.registry.add_renderable(name, renderable)
    }

    pub fn set_main_scene(&mut self, name: impl Into<String>) -> Result<()> {
        self.registry.set_main_scene(name)
    }

    pub fn set_vertex_shader_of_renderable(
        &mut self,
        renderable_name: &str,
        shader_name: &str,
    ) -> Result<()> {
        self.registry
            .set_vertex_shader_of_renderable(renderable_name, shader_name)
    }

    pub fn set_pixel_shader_of_renderable(
        &mut self,
        renderable_name: &str,
        shader_name: &str,
    ) -> Result<()> {
        self.registry
            .set_pixel_shader_of_renderable(renderable_name, shader_name)
    }

    pub fn main_scene(&self) -> Option<&Scene> {
        self.registry.main_scene()
    }

    pub fn main_scene_mut(&mut self) -> Option<&mut Scene> {
        self.registry.main_scene_mut()
    }

    /// The draws the next frame will issue, in order.
    pub fn frame_plan(&self) -> FramePlan {
        FramePlan::build(&self.registry)
    }

    pub fn window_id(&self) -> Option<WindowId> {
        self.gpu.as_ref().map(|gpu| gpu.window.id())
    }

    pub fn window(&self) -> Option<&Window> {
        self.gpu.as_ref().map(|gpu| gpu.window.as_ref())
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    /// Brings up the GPU and uploads everything registered so far.
    ///
    /// Fails with `Configuration` when no main scene has been designated.
    pub async fn initialize(&mut self, window: Arc<Window>) -> Result<()> {
        let context = GpuContext::new(Arc::clone(&window)).await?;
        self.validate_main_scene()?;

        let device = &context.device;

        let projection_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("projection-uniform"),
            size: std::mem::size_of::<ProjectionUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let projection = ProjectionUniform::new(Mat4::perspective_lh(
            FRAC_PI_4,
            context.aspect_ratio(),
            NEAR_PLANE,
            FAR_PLANE,
        ));
        context
            .queue
            .write_buffer(&projection_buffer, 0, bytes_of(&projection));

        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lights-uniform"),
            size: std::mem::size_of::<LightsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.camera.initialize(device)?;
        let camera_buffer = self
            .camera
            .buffer()
            .ok_or_else(|| RuntimeError::Setup("camera buffer missing".to_string()))?;

        let layouts = BindGroupLayouts::new(device);
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: projection_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        let samplers = create_samplers(device);
        let fallback = GpuTexture::upload(
            device,
            &context.queue,
            &TextureData::fallback(),
            "fallback-texture",
        );
        let builtins = BuiltinShaders::compile(device);

        for (name, shader) in self.registry.vertex_shaders_mut() {
            shader.compile(&context.device, name)?;
        }
        for (name, shader) in self.registry.pixel_shaders_mut() {
            shader.compile(&context.device, name)?;
        }

        self.gpu = Some(GpuState {
            window,
            context,
            layouts,
            pipelines: PipelineCache::new(),
            builtins,
            samplers,
            fallback,
            projection_buffer,
            lights_buffer,
            frame_bind_group,
        });

        self.ensure_gpu_resources();
        self.ensure_pipelines();
        Ok(())
    }

    /// Resizes the swap chain and refreshes the projection for the new
    /// aspect ratio.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.context.resize(new_size);
            let projection = ProjectionUniform::new(Mat4::perspective_lh(
                FRAC_PI_4,
                gpu.context.aspect_ratio(),
                NEAR_PLANE,
                FAR_PLANE,
            ));
            gpu.context
                .queue
                .write_buffer(&gpu.projection_buffer, 0, bytes_of(&projection));
        }
    }

    /// A renderer without a designated main scene must not finish
    /// `initialize`; `set_main_scene` guarantees a designated name resolves.
    fn validate_main_scene(&self) -> Result<()> {
        if self.registry.main_scene_name().is_none() {
            return Err(RuntimeError::Configuration(
                "no main scene designated".to_string(),
            ));
        }
        Ok(())
    }

    /// Forwards one frame's worth of host input to the camera.
    pub fn handle_input(
        &mut self,
        directions: &DirectionsInput,
        mouse: &MouseRelativeMovement,
        delta_time: f32,
    ) {
        self.camera.handle_input(directions, mouse, delta_time);
    }

    /// Advances every scene object, then the camera, by `delta_time`.
    pub fn update(&mut self, delta_time: f32) {
        if let Some(scene) = self.registry.main_scene_mut() {
            scene.update(delta_time);
        }
        for (_, renderable) in self.registry.renderables_mut() {
            renderable.update(delta_time);
        }
        self.camera.update(delta_time);
    }

    /// Uploads GPU state for any drawable registered after `initialize`.
    fn ensure_gpu_resources(&mut self) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        let device = &gpu.context.device;
        let queue = &gpu.context.queue;

        if let Some(scene) = self.registry.main_scene_mut() {
            for (name, renderable) in scene.renderables_mut() {
                if renderable.gpu.is_none() {
                    renderable.gpu = Some(RenderableGpu::new(
                        device,
                        queue,
                        &gpu.layouts,
                        &gpu.samplers,
                        &gpu.fallback,
                        renderable.mesh(),
                        renderable.materials(),
                        name,
                    ));
                }
            }
            for (index, batch) in scene.voxel_batches_mut().iter_mut().enumerate() {
                if batch.gpu.is_none() {
                    let label = format!("voxel-batch-{index}");
                    batch.gpu = Some(VoxelGpu::new(
                        device,
                        queue,
                        &gpu.layouts,
                        &gpu.samplers,
                        &gpu.fallback,
                        batch.mesh(),
                        batch.materials(),
                        batch.instances(),
                        &label,
                    ));
                }
            }
            for (index, model) in scene.models_mut().iter_mut().enumerate() {
                if model.gpu.is_none() {
                    let label = format!("model-{index}");
                    model.gpu = Some(ModelGpu::new(
                        device,
                        queue,
                        &gpu.layouts,
                        &gpu.samplers,
                        &gpu.fallback,
                        model.mesh(),
                        model.skin(),
                        model.materials(),
                        &label,
                    ));
                }
            }
            if let Some(skybox) = scene.skybox_mut() {
                if skybox.gpu.is_none() {
                    skybox.gpu = Some(SkyboxGpu::new(
                        device,
                        queue,
                        &gpu.layouts,
                        &gpu.samplers,
                        skybox.mesh(),
                        skybox.environment(),
                        "skybox",
                    ));
                }
            }
        }

        for (name, renderable) in self.registry.renderables_mut() {
            if renderable.gpu.is_none() {
                renderable.gpu = Some(RenderableGpu::new(
                    device,
                    queue,
                    &gpu.layouts,
                    &gpu.samplers,
                    &gpu.fallback,
                    renderable.mesh(),
                    renderable.materials(),
                    name,
                ));
            }
        }
    }

    /// Builds any pipeline the next frame needs that is not cached yet.
    fn ensure_pipelines(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let plan = FramePlan::build(&self.registry);
        for item in &plan.items {
            if let Some(name) = item.vertex_shader.as_deref() {
                if self.registry.vertex_shader(name).is_none() {
                    warn!("vertex shader {name} not registered, using builtin for {}", item.name);
                }
            }
            if let Some(name) = item.pixel_shader.as_deref() {
                if self.registry.pixel_shader(name).is_none() {
                    warn!("pixel shader {name} not registered, using builtin for {}", item.name);
                }
            }
            let key = resolve_key(
                &self.registry,
                item.kind,
                item.vertex_shader.as_deref(),
                item.pixel_shader.as_deref(),
            );
            if gpu.pipelines.get(&key).is_some() {
                continue;
            }
            let (vertex_module, vertex_entry) = match self
                .registry
                .vertex_shader(&key.vertex_shader)
                .and_then(|shader| shader.module().map(|module| (module, shader.entry_point())))
            {
                Some(resolved) => resolved,
                None => (gpu.builtins.module(item.kind), "vs_main"),
            };
            let (pixel_module, pixel_entry) = match self
                .registry
                .pixel_shader(&key.pixel_shader)
                .and_then(|shader| shader.module().map(|module| (module, shader.entry_point())))
            {
                Some(resolved) => resolved,
                None => (gpu.builtins.module(item.kind), "fs_main"),
            };
            gpu.pipelines.get_or_create(
                &gpu.context.device,
                &gpu.layouts,
                gpu.context.config.format,
                key,
                vertex_module,
                vertex_entry,
                pixel_module,
                pixel_entry,
            );
        }
    }

    /// Draws one frame in the fixed order: the main scene's statics and the
    /// top-level renderables, then voxel batches, skinned models and the
    /// skybox, and presents.
    pub fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        self.ensure_gpu_resources();
        self.ensure_pipelines();

        let Some(gpu) = self.gpu.as_ref() else {
            return Ok(());
        };
        let queue = &gpu.context.queue;

        let output = gpu.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Upload phase: frame uniforms first, then per-object state.
        if let Some(buffer) = self.camera.buffer() {
            let camera = CameraUniform::new(self.camera.view(), self.camera.eye());
            queue.write_buffer(buffer, 0, bytes_of(&camera));
        }

        if let Some(scene) = self.registry.main_scene() {
            let lights = LightsUniform::new(scene.lights());
            queue.write_buffer(&gpu.lights_buffer, 0, bytes_of(&lights));

            for (_, renderable) in scene.renderables() {
                if let Some(state) = renderable.gpu.as_ref() {
                    let object = ObjectUniform::new(
                        renderable.world(),
                        renderable.output_color(),
                        renderable.has_normal_map(),
                        renderable.has_texture(),
                    );
                    queue.write_buffer(&state.object_buffer, 0, bytes_of(&object));
                }
            }
            for batch in scene.voxel_batches() {
                if let Some(state) = batch.gpu.as_ref() {
                    let object = ObjectUniform::new(
                        batch.world(),
                        batch.output_color(),
                        batch.has_normal_map(),
                        batch.has_texture(),
                    );
                    queue.write_buffer(&state.object_buffer, 0, bytes_of(&object));
                }
            }
            for model in scene.models() {
                if let Some(state) = model.gpu.as_ref() {
                    let object = ObjectUniform::new(
                        model.world(),
                        model.output_color(),
                        model.has_normal_map(),
                        model.has_texture(),
                    );
                    queue.write_buffer(&state.object_buffer, 0, bytes_of(&object));
                    let palette = SkinningUniform::new(model.bone_transforms());
                    queue.write_buffer(&state.bones_buffer, 0, bytes_of(&palette));
                }
            }
            if let Some(skybox) = scene.skybox() {
                if let Some(state) = skybox.gpu.as_ref() {
                    let object = ObjectUniform::new(
                        skybox.world_at(self.camera.eye()),
                        skybox.output_color(),
                        false,
                        true,
                    );
                    queue.write_buffer(&state.object_buffer, 0, bytes_of(&object));
                }
            }
        }
        for (_, renderable) in self.registry.renderables() {
            if let Some(state) = renderable.gpu.as_ref() {
                let object = ObjectUniform::new(
                    renderable.world(),
                    renderable.output_color(),
                    renderable.has_normal_map(),
                    renderable.has_texture(),
                );
                queue.write_buffer(&state.object_buffer, 0, bytes_of(&object));
            }
        }

        let mut encoder =
            gpu.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame-encoder"),
                });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.context.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &gpu.frame_bind_group, &[]);

            let set_pipeline = |pass: &mut wgpu::RenderPass,
                                kind: DrawKind,
                                vertex_shader: Option<&str>,
                                pixel_shader: Option<&str>|
             -> bool {
                let key = resolve_key(&self.registry, kind, vertex_shader, pixel_shader);
                match gpu.pipelines.get(&key) {
                    Some(pipeline) => {
                        pass.set_pipeline(pipeline);
                        true
                    }
                    None => false,
                }
            };

            if let Some(scene) = self.registry.main_scene() {
                for (_, renderable) in scene.renderables() {
                    if let Some(state) = renderable.gpu.as_ref() {
                        if set_pipeline(
                            &mut pass,
                            DrawKind::Static,
                            renderable.vertex_shader(),
                            renderable.pixel_shader(),
                        ) {
                            pass.set_bind_group(1, &state.object_bind_group, &[]);
                            pass.set_vertex_buffer(0, state.mesh.vertex.slice(..));
                            draw_mesh(
                                &mut pass,
                                &state.mesh,
                                &renderable.mesh().submeshes,
                                &state.material_bind_groups,
                                0..1,
                            );
                        }
                    }
                }
            }
            for (_, renderable) in self.registry.renderables() {
                if let Some(state) = renderable.gpu.as_ref() {
                    if set_pipeline(
                        &mut pass,
                        DrawKind::Static,
                        renderable.vertex_shader(),
                        renderable.pixel_shader(),
                    ) {
                        pass.set_bind_group(1, &state.object_bind_group, &[]);
                        pass.set_vertex_buffer(0, state.mesh.vertex.slice(..));
                        draw_mesh(
                            &mut pass,
                            &state.mesh,
                            &renderable.mesh().submeshes,
                            &state.material_bind_groups,
                            0..1,
                        );
                    }
                }
            }
            if let Some(scene) = self.registry.main_scene() {
                for batch in scene.voxel_batches() {
                    if let Some(state) = batch.gpu.as_ref() {
                        if set_pipeline(
                            &mut pass,
                            DrawKind::Instanced,
                            batch.vertex_shader(),
                            batch.pixel_shader(),
                        ) {
                            pass.set_bind_group(1, &state.object_bind_group, &[]);
                            pass.set_vertex_buffer(0, state.mesh.vertex.slice(..));
                            pass.set_vertex_buffer(1, state.instance_buffer.slice(..));
                            draw_mesh(
                                &mut pass,
                                &state.mesh,
                                &batch.mesh().submeshes,
                                &state.material_bind_groups,
                                0..state.instance_count,
                            );
                        }
                    }
                }
                for model in scene.models() {
                    if let Some(state) = model.gpu.as_ref() {
                        if set_pipeline(
                            &mut pass,
                            DrawKind::Skinned,
                            model.vertex_shader(),
                            model.pixel_shader(),
                        ) {
                            pass.set_bind_group(1, &state.object_bind_group, &[]);
                            pass.set_vertex_buffer(0, state.mesh.vertex.slice(..));
                            pass.set_vertex_buffer(1, state.skin_buffer.slice(..));
                            draw_mesh(
                                &mut pass,
                                &state.mesh,
                                &model.mesh().submeshes,
                                &state.material_bind_groups,
                                0..1,
                            );
                        }
                    }
                }
                if let Some(skybox) = scene.skybox() {
                    if let Some(state) = skybox.gpu.as_ref() {
                        if set_pipeline(
                            &mut pass,
                            DrawKind::Skybox,
                            skybox.vertex_shader(),
                            skybox.pixel_shader(),
                        ) {
                            pass.set_bind_group(1, &state.object_bind_group, &[]);
                            pass.set_bind_group(2, &state.material_bind_group, &[]);
                            pass.set_vertex_buffer(0, state.mesh.vertex.slice(..));
                            pass.set_index_buffer(
                                state.mesh.index.slice(..),
                                wgpu::IndexFormat::Uint16,
                            );
                            pass.draw_indexed(0..state.mesh.index_count, 0, 0..1);
                        }
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Issues the indexed draws for a mesh, binding each sub-mesh's material.
/// A mesh without sub-meshes draws whole with the first material group.
fn draw_mesh(
    pass: &mut wgpu::RenderPass<'_>,
    mesh: &MeshBuffers,
    submeshes: &[SubMesh],
    materials: &[wgpu::BindGroup],
    instances: Range<u32>,
) {
    pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint16);
    if submeshes.is_empty() {
        if let Some(group) = materials.first() {
            pass.set_bind_group(2, group, &[]);
        }
        pass.draw_indexed(0..mesh.index_count, 0, instances);
        return;
    }
    for submesh in submeshes {
        let group = materials
            .get(submesh.material_index)
            .or_else(|| materials.first());
        if let Some(group) = group {
            pass.set_bind_group(2, group, &[]);
        }
        pass.draw_indexed(
            submesh.base_index..submesh.base_index + submesh.index_count,
            submesh.base_vertex,
            instances.clone(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::Motion;
    use crate::geometry::unit_cube;

    #[test]
    fn renderer_accepts_registrations_before_any_device_exists() {
        let mut renderer = Renderer::new();
        renderer.add_scene("Main", Scene::new()).unwrap();
        renderer.set_main_scene("Main").unwrap();
        renderer
            .add_renderable("Cube", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        assert!(!renderer.is_initialized());
        assert_eq!(renderer.frame_plan().len(), 1);
    }

    #[test]
    fn update_advances_scene_and_top_level_renderables() {
        let mut renderer = Renderer::new();
        let mut scene = Scene::new();
        scene
            .add_renderable(
                "inner",
                StaticRenderable::new(unit_cube(), Motion::Spin { rate: 1.0 }),
            )
            .unwrap();
        renderer.add_scene("Main", scene).unwrap();
        renderer.set_main_scene("Main").unwrap();
        renderer
            .add_renderable(
                "outer",
                StaticRenderable::new(unit_cube(), Motion::Spin { rate: 2.0 }),
            )
            .unwrap();

        renderer.update(0.5);

        let inner = renderer.main_scene().unwrap().renderable("inner").unwrap();
        assert_eq!(
            inner.world().to_cols_array(),
            Mat4::from_rotation_y(0.5).to_cols_array()
        );
        let outer = renderer.registry().renderable("outer").unwrap();
        assert_eq!(
            outer.world().to_cols_array(),
            Mat4::from_rotation_y(1.0).to_cols_array()
        );
    }

    #[test]
    fn initialize_refuses_without_a_designated_main_scene() {
        let renderer = Renderer::new();
        assert!(matches!(
            renderer.validate_main_scene(),
            Err(RuntimeError::Configuration(_))
        ));

        let mut renderer = Renderer::new();
        renderer.add_scene("Main", Scene::new()).unwrap();
        renderer.set_main_scene("Main").unwrap();
        assert!(renderer.validate_main_scene().is_ok());
    }

    #[test]
    fn handle_input_drives_the_camera() {
        let mut renderer = Renderer::new();
        let directions = DirectionsInput {
            front: true,
            ..DirectionsInput::default()
        };
        renderer.handle_input(&directions, &MouseRelativeMovement::default(), 1.0);
        let start = renderer.camera().eye();
        renderer.update(1.0);
        assert!(renderer.camera().eye().z > start.z);
    }

    #[test]
    fn unresolved_shader_names_fall_back_to_builtins() {
        let registry = ResourceRegistry::new();
        let key = resolve_key(&registry, DrawKind::Static, Some("Missing"), None);
        assert_eq!(key.vertex_shader, "builtin-lit");
        assert_eq!(key.pixel_shader, "builtin-lit");
        let key = resolve_key(&registry, DrawKind::Skybox, None, None);
        assert_eq!(key.vertex_shader, "builtin-skybox");
    }
}
