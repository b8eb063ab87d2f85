use std::borrow::Cow;
use std::sync::Arc;

use crate::error::Result;

/// A vertex shader registered by name: WGSL source plus its entry point.
///
/// The module is compiled during `Renderer::initialize`, once a device
/// exists; until then the shader is plain data.
pub struct VertexShader {
    source: Arc<str>,
    entry_point: String,
    module: Option<wgpu::ShaderModule>,
}

impl VertexShader {
    pub fn new(source: impl Into<Arc<str>>, entry_point: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entry_point: entry_point.into(),
            module: None,
        }
    }

    pub fn compile(&mut self, device: &wgpu::Device, label: &str) -> Result<()> {
        self.module = Some(create_module(device, &self.source, label));
        Ok(())
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn module(&self) -> Option<&wgpu::ShaderModule> {
        self.module.as_ref()
    }
}

/// A pixel (fragment) shader registered by name.
pub struct PixelShader {
    source: Arc<str>,
    entry_point: String,
    module: Option<wgpu::ShaderModule>,
}

impl PixelShader {
    pub fn new(source: impl Into<Arc<str>>, entry_point: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entry_point: entry_point.into(),
            module: None,
        }
    }

    pub fn compile(&mut self, device: &wgpu::Device, label: &str) -> Result<()> {
        self.module = Some(create_module(device, &self.source, label));
        Ok(())
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn module(&self) -> Option<&wgpu::ShaderModule> {
        self.module.as_ref()
    }
}

fn create_module(device: &wgpu::Device, source: &str, label: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    })
}

// Shared WGSL declarations for the constant-buffer slot contract:
// group 0 carries the frame data (binding 0 = camera, 1 = projection,
// 3 = lights), group 1 the per-object data (binding 2, plus 4 for bones),
// group 2 the material textures (0/1 diffuse, 2/3 normal).
const COMMON_DECLS: &str = r#"
struct CameraUniform {
    view: mat4x4<f32>,
    camera_position: vec4<f32>,
}

struct ProjectionUniform {
    projection: mat4x4<f32>,
}

struct PointLight {
    position: vec4<f32>,
    color: vec4<f32>,
    attenuation: vec4<f32>,
}

struct LightsUniform {
    lights: array<PointLight, 2>,
}

struct ObjectUniform {
    world: mat4x4<f32>,
    output_color: vec4<f32>,
    flags: vec4<u32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> projection: ProjectionUniform;
@group(0) @binding(3) var<uniform> lights: LightsUniform;
@group(1) @binding(2) var<uniform> object: ObjectUniform;
@group(2) @binding(0) var diffuse_texture: texture_2d<f32>;
@group(2) @binding(1) var diffuse_sampler: sampler;
@group(2) @binding(2) var normal_texture: texture_2d<f32>;
@group(2) @binding(3) var normal_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}
"#;

// Matrices arrive transposed, so every multiplication is row-vector style.
const LIT_FRAGMENT: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    var base = object.output_color.rgb;
    if (object.flags.y == 1u) {
        base = textureSample(diffuse_texture, diffuse_sampler, input.uv).rgb;
    }
    var n = normalize(input.normal);
    if (object.flags.x == 1u) {
        let sampled = textureSample(normal_texture, normal_sampler, input.uv).xyz * 2.0 - 1.0;
        n = normalize(n + sampled * 0.5);
    }
    var lit = base * 0.1;
    for (var i = 0u; i < 2u; i = i + 1u) {
        let light = lights.lights[i];
        let to_light = light.position.xyz - input.world_pos;
        let distance_sq = dot(to_light, to_light);
        let diffuse = max(dot(n, normalize(to_light)), 0.0);
        let attenuation = light.attenuation.z / (light.attenuation.z + distance_sq);
        lit = lit + base * light.color.rgb * diffuse * attenuation;
    }
    return vec4<f32>(lit, 1.0);
}
"#;

/// Lit shader for static renderables.
pub fn lit_shader_source() -> String {
    format!(
        r#"{COMMON_DECLS}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {{
    var out: VertexOutput;
    let world_pos = vec4<f32>(input.position, 1.0) * object.world;
    out.clip_position = (world_pos * camera.view) * projection.projection;
    out.world_pos = world_pos.xyz;
    out.normal = normalize((vec4<f32>(input.normal, 0.0) * object.world).xyz);
    out.uv = input.uv;
    return out;
}}
{LIT_FRAGMENT}"#
    )
}

/// Lit shader for instanced voxel batches; the per-instance transform rides
/// in as four vertex attributes.
pub fn instanced_shader_source() -> String {
    format!(
        r#"{COMMON_DECLS}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) instance_row0: vec4<f32>,
    @location(4) instance_row1: vec4<f32>,
    @location(5) instance_row2: vec4<f32>,
    @location(6) instance_row3: vec4<f32>,
}}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {{
    let instance_world = mat4x4<f32>(
        input.instance_row0,
        input.instance_row1,
        input.instance_row2,
        input.instance_row3,
    );
    var out: VertexOutput;
    let world_pos = (vec4<f32>(input.position, 1.0) * instance_world) * object.world;
    out.clip_position = (world_pos * camera.view) * projection.projection;
    out.world_pos = world_pos.xyz;
    out.normal = normalize(((vec4<f32>(input.normal, 0.0) * instance_world) * object.world).xyz);
    out.uv = input.uv;
    return out;
}}
{LIT_FRAGMENT}"#
    )
}

/// Lit shader for skinned models; bone palette rides in slot 4.
pub fn skinned_shader_source() -> String {
    format!(
        r#"{COMMON_DECLS}
struct SkinningUniform {{
    bones: array<mat4x4<f32>, 256>,
}}

@group(1) @binding(4) var<uniform> skinning: SkinningUniform;

struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) bone_indices: vec4<u32>,
    @location(4) bone_weights: vec4<f32>,
}}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {{
    let skin = skinning.bones[input.bone_indices.x] * input.bone_weights.x
        + skinning.bones[input.bone_indices.y] * input.bone_weights.y
        + skinning.bones[input.bone_indices.z] * input.bone_weights.z
        + skinning.bones[input.bone_indices.w] * input.bone_weights.w;
    var out: VertexOutput;
    let world_pos = (vec4<f32>(input.position, 1.0) * skin) * object.world;
    out.clip_position = (world_pos * camera.view) * projection.projection;
    out.world_pos = world_pos.xyz;
    out.normal = normalize(((vec4<f32>(input.normal, 0.0) * skin) * object.world).xyz);
    out.uv = input.uv;
    return out;
}}
{LIT_FRAGMENT}"#
    )
}

/// Shader for the camera-centered skybox shell; samples the environment
/// texture directly, no lighting.
pub fn skybox_shader_source() -> String {
    format!(
        r#"{COMMON_DECLS}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {{
    var out: VertexOutput;
    let world_pos = vec4<f32>(input.position, 1.0) * object.world;
    out.clip_position = (world_pos * camera.view) * projection.projection;
    out.world_pos = world_pos.xyz;
    out.normal = input.normal;
    out.uv = input.uv;
    return out;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    return textureSample(diffuse_texture, diffuse_sampler, input.uv);
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_shader_declares_the_slot_contract() {
        for source in [
            lit_shader_source(),
            instanced_shader_source(),
            skinned_shader_source(),
            skybox_shader_source(),
        ] {
            assert!(source.contains("@group(0) @binding(0) var<uniform> camera"));
            assert!(source.contains("@group(0) @binding(1) var<uniform> projection"));
            assert!(source.contains("@group(0) @binding(3) var<uniform> lights"));
            assert!(source.contains("@group(1) @binding(2) var<uniform> object"));
        }
        assert!(skinned_shader_source().contains("@group(1) @binding(4) var<uniform> skinning"));
    }
}
