use std::collections::HashMap;
use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::geometry::{MeshBuffers, MeshData, SkinWeights, Vertex};
use crate::render::context::DepthBuffer;
use crate::render::uniforms::{
    transposed, CameraUniform, LightsUniform, ObjectUniform, ProjectionUniform, SkinningUniform,
};
use crate::texture::{GpuTexture, Material, SamplerKind, TextureData};

/// Which pipeline family a draw belongs to. Also fixes the frame order:
/// statics first, then voxel batches, then skinned models, skybox last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawKind {
    Static,
    Instanced,
    Skinned,
    Skybox,
}

/// The fixed bind group layouts behind the slot contract.
///
/// Group 0 is frame data (binding 0 camera, 1 projection, 3 lights),
/// group 1 per-object data (binding 2, plus 4 for the bone palette) and
/// group 2 the material textures.
pub struct BindGroupLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub object: wgpu::BindGroupLayout,
    pub skinned_object: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
}

fn uniform_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bind-layout"),
            entries: &[
                uniform_entry(0, std::mem::size_of::<CameraUniform>()),
                uniform_entry(1, std::mem::size_of::<ProjectionUniform>()),
                uniform_entry(3, std::mem::size_of::<LightsUniform>()),
            ],
        });
        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[uniform_entry(2, std::mem::size_of::<ObjectUniform>())],
        });
        let skinned_object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skinned-object-bind-layout"),
            entries: &[
                uniform_entry(2, std::mem::size_of::<ObjectUniform>()),
                uniform_entry(4, std::mem::size_of::<SkinningUniform>()),
            ],
        });
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material-bind-layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                texture_entry(2),
                sampler_entry(3),
            ],
        });
        Self {
            frame,
            object,
            skinned_object,
            material,
        }
    }

    fn object_layout(&self, kind: DrawKind) -> &wgpu::BindGroupLayout {
        match kind {
            DrawKind::Skinned => &self.skinned_object,
            _ => &self.object,
        }
    }
}

const VERTEX_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

const INSTANCE_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4];

const SKIN_ATTRS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![3 => Uint32x4, 4 => Float32x4];

pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

/// One transposed 4x4 matrix per instance, fed as four vec4 rows.
pub fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[[f32; 4]; 4]>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRS,
    }
}

pub fn skin_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SkinWeights>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &SKIN_ATTRS,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub vertex_shader: String,
    pub pixel_shader: String,
    pub kind: DrawKind,
}

/// Render pipelines keyed by shader pair and draw kind, built lazily.
pub struct PipelineCache {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
        }
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        surface_format: wgpu::TextureFormat,
        key: PipelineKey,
        vertex_module: &wgpu::ShaderModule,
        vertex_entry: &str,
        pixel_module: &wgpu::ShaderModule,
        pixel_entry: &str,
    ) -> &wgpu::RenderPipeline {
        self.pipelines.entry(key.clone()).or_insert_with(|| {
            let pipeline_layout =
                device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("runtime-pipeline-layout"),
                    bind_group_layouts: &[
                        &layouts.frame,
                        layouts.object_layout(key.kind),
                        &layouts.material,
                    ],
                    push_constant_ranges: &[],
                });

            let instance_buffers;
            let skin_buffers;
            let static_buffers;
            let buffers: &[wgpu::VertexBufferLayout] = match key.kind {
                DrawKind::Instanced => {
                    instance_buffers = [vertex_layout(), instance_layout()];
                    &instance_buffers
                }
                DrawKind::Skinned => {
                    skin_buffers = [vertex_layout(), skin_layout()];
                    &skin_buffers
                }
                DrawKind::Static | DrawKind::Skybox => {
                    static_buffers = [vertex_layout()];
                    &static_buffers
                }
            };

            // The skybox draws at far depth without writing, everything
            // else writes depth normally.
            let depth_stencil = match key.kind {
                DrawKind::Skybox => wgpu::DepthStencilState {
                    format: DepthBuffer::FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: Default::default(),
                    bias: Default::default(),
                },
                _ => wgpu::DepthStencilState {
                    format: DepthBuffer::FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                },
            };

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("runtime-pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex_module,
                    entry_point: Some(vertex_entry),
                    compilation_options: Default::default(),
                    buffers,
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    ..Default::default()
                },
                depth_stencil: Some(depth_stencil),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: pixel_module,
                    entry_point: Some(pixel_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
                cache: None,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

impl Default for PipelineCache {
    fn default() -> Self {
        Self::new()
    }
}

fn object_uniform_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<ObjectUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[allow(clippy::too_many_arguments)]
fn material_bind_groups(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layouts: &BindGroupLayouts,
    samplers: &[wgpu::Sampler; SamplerKind::COUNT],
    fallback: &GpuTexture,
    materials: &[Material],
    label: &str,
) -> Vec<wgpu::BindGroup> {
    let build = |diffuse: &GpuTexture, normal: &GpuTexture| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&samplers[diffuse.sampler.index()]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&samplers[normal.sampler.index()]),
                },
            ],
        })
    };

    if materials.is_empty() {
        return vec![build(fallback, fallback)];
    }

    materials
        .iter()
        .map(|material| {
            let diffuse = material
                .diffuse
                .as_ref()
                .map(|data| GpuTexture::upload(device, queue, data, label));
            let normal = material
                .normal
                .as_ref()
                .map(|data| GpuTexture::upload(device, queue, data, label));
            build(
                diffuse.as_ref().unwrap_or(fallback),
                normal.as_ref().unwrap_or(fallback),
            )
        })
        .collect()
}

fn object_bind_group(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.object,
        entries: &[wgpu::BindGroupEntry {
            binding: 2,
            resource: buffer.as_entire_binding(),
        }],
    })
}

/// GPU state for a static renderable: mesh buffers, its object uniform and
/// one material bind group per sub-mesh (or a single fallback group).
pub struct RenderableGpu {
    pub mesh: MeshBuffers,
    pub object_buffer: wgpu::Buffer,
    pub object_bind_group: wgpu::BindGroup,
    pub material_bind_groups: Vec<wgpu::BindGroup>,
}

impl RenderableGpu {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindGroupLayouts,
        samplers: &[wgpu::Sampler; SamplerKind::COUNT],
        fallback: &GpuTexture,
        mesh: &MeshData,
        materials: &[Material],
        label: &str,
    ) -> Self {
        let object_buffer = object_uniform_buffer(device, label);
        Self {
            mesh: MeshBuffers::new(device, mesh, label),
            object_bind_group: object_bind_group(device, layouts, &object_buffer, label),
            material_bind_groups: material_bind_groups(
                device, queue, layouts, samplers, fallback, materials, label,
            ),
            object_buffer,
        }
    }
}

/// GPU state for a voxel batch; adds the per-instance transform buffer.
pub struct VoxelGpu {
    pub mesh: MeshBuffers,
    pub object_buffer: wgpu::Buffer,
    pub object_bind_group: wgpu::BindGroup,
    pub material_bind_groups: Vec<wgpu::BindGroup>,
    pub instance_buffer: wgpu::Buffer,
    pub instance_count: u32,
}

impl VoxelGpu {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindGroupLayouts,
        samplers: &[wgpu::Sampler; SamplerKind::COUNT],
        fallback: &GpuTexture,
        mesh: &MeshData,
        materials: &[Material],
        instances: &[glam::Mat4],
        label: &str,
    ) -> Self {
        let rows: Vec<[[f32; 4]; 4]> = instances
            .iter()
            .map(|instance| transposed(*instance))
            .collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&rows),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let object_buffer = object_uniform_buffer(device, label);
        Self {
            mesh: MeshBuffers::new(device, mesh, label),
            object_bind_group: object_bind_group(device, layouts, &object_buffer, label),
            material_bind_groups: material_bind_groups(
                device, queue, layouts, samplers, fallback, materials, label,
            ),
            object_buffer,
            instance_buffer,
            instance_count: instances.len() as u32,
        }
    }
}

/// GPU state for a skinned model; adds the skin attribute buffer and the
/// bone palette uniform bound at slot 4.
pub struct ModelGpu {
    pub mesh: MeshBuffers,
    pub skin_buffer: wgpu::Buffer,
    pub object_buffer: wgpu::Buffer,
    pub bones_buffer: wgpu::Buffer,
    pub object_bind_group: wgpu::BindGroup,
    pub material_bind_groups: Vec<wgpu::BindGroup>,
}

impl ModelGpu {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindGroupLayouts,
        samplers: &[wgpu::Sampler; SamplerKind::COUNT],
        fallback: &GpuTexture,
        mesh: &MeshData,
        skin: &[SkinWeights],
        materials: &[Material],
        label: &str,
    ) -> Self {
        let skin_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(skin),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let object_buffer = object_uniform_buffer(device, label);
        let bones_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<SkinningUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.skinned_object,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: object_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: bones_buffer.as_entire_binding(),
                },
            ],
        });
        Self {
            mesh: MeshBuffers::new(device, mesh, label),
            skin_buffer,
            object_bind_group,
            material_bind_groups: material_bind_groups(
                device, queue, layouts, samplers, fallback, materials, label,
            ),
            object_buffer,
            bones_buffer,
        }
    }
}

/// GPU state for the skybox shell.
pub struct SkyboxGpu {
    pub mesh: MeshBuffers,
    pub object_buffer: wgpu::Buffer,
    pub object_bind_group: wgpu::BindGroup,
    pub material_bind_group: wgpu::BindGroup,
}

impl SkyboxGpu {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindGroupLayouts,
        samplers: &[wgpu::Sampler; SamplerKind::COUNT],
        mesh: &MeshData,
        environment: &TextureData,
        label: &str,
    ) -> Self {
        let texture = GpuTexture::upload(device, queue, environment, label);
        let object_buffer = object_uniform_buffer(device, label);
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(
                        &samplers[SamplerKind::Clamp.index()],
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(
                        &samplers[SamplerKind::Clamp.index()],
                    ),
                },
            ],
        });
        Self {
            mesh: MeshBuffers::new(device, mesh, label),
            object_bind_group: object_bind_group(device, layouts, &object_buffer, label),
            object_buffer,
            material_bind_group,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layouts_cover_their_structs() {
        assert_eq!(vertex_layout().array_stride, 32);
        assert_eq!(instance_layout().array_stride, 64);
        assert_eq!(skin_layout().array_stride, 32);
        assert_eq!(instance_layout().step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn skinned_draws_use_the_extended_object_layout() {
        // Location assignments must not collide within one pipeline family.
        let static_locations: Vec<u32> = VERTEX_ATTRS.iter().map(|a| a.shader_location).collect();
        let instance_locations: Vec<u32> =
            INSTANCE_ATTRS.iter().map(|a| a.shader_location).collect();
        let skin_locations: Vec<u32> = SKIN_ATTRS.iter().map(|a| a.shader_location).collect();
        for location in &instance_locations {
            assert!(!static_locations.contains(location));
        }
        for location in &skin_locations {
            assert!(!static_locations.contains(location));
        }
    }
}
