use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::light::{PointLight, NUM_LIGHTS};

/// Upper bound on bones per skinned model; fixes the size of the palette
/// uniform so one buffer layout serves every model.
pub const MAX_BONES: usize = 256;

/// Matrices are uploaded transposed so shaders multiply row-vector style,
/// `v * M`, against the column-major matrices glam builds on the CPU.
pub fn transposed(matrix: Mat4) -> [[f32; 4]; 4] {
    matrix.transpose().to_cols_array_2d()
}

/// Frame slot 0: view transform and camera position.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, eye: Vec3) -> Self {
        Self {
            view: transposed(view),
            camera_position: [eye.x, eye.y, eye.z, 1.0],
        }
    }
}

/// Frame slot 1: projection transform, re-uploaded only on resize.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ProjectionUniform {
    pub projection: [[f32; 4]; 4],
}

impl ProjectionUniform {
    pub fn new(projection: Mat4) -> Self {
        Self {
            projection: transposed(projection),
        }
    }
}

/// Object slot 2: world transform, fallback color and material flags.
///
/// `flags.x` marks a normal map present, `flags.y` a diffuse texture.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub world: [[f32; 4]; 4],
    pub output_color: [f32; 4],
    pub flags: [u32; 4],
}

impl ObjectUniform {
    pub fn new(world: Mat4, output_color: Vec4, has_normal_map: bool, has_texture: bool) -> Self {
        Self {
            world: transposed(world),
            output_color: output_color.to_array(),
            flags: [has_normal_map as u32, has_texture as u32, 0, 0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PointLightGpu {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub attenuation: [f32; 4],
}

impl From<&PointLight> for PointLightGpu {
    fn from(light: &PointLight) -> Self {
        let position = light.position();
        let d = light.attenuation_distance();
        Self {
            position: [position.x, position.y, position.z, 1.0],
            color: light.color().to_array(),
            attenuation: [d, d, d * d, d * d],
        }
    }
}

/// Frame slot 3: both point lights, re-uploaded every frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    pub lights: [PointLightGpu; NUM_LIGHTS],
}

impl LightsUniform {
    pub fn new(lights: &[PointLight; NUM_LIGHTS]) -> Self {
        Self {
            lights: std::array::from_fn(|index| PointLightGpu::from(&lights[index])),
        }
    }
}

/// Object slot 4: the bone palette for skinned draws, padded to `MAX_BONES`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SkinningUniform {
    pub bones: [[[f32; 4]; 4]; MAX_BONES],
}

impl SkinningUniform {
    pub fn new(bone_transforms: &[Mat4]) -> Self {
        let mut bones = [transposed(Mat4::IDENTITY); MAX_BONES];
        for (slot, bone) in bones.iter_mut().zip(bone_transforms.iter()) {
            *slot = transposed(*bone);
        }
        Self { bones }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn uniform_sizes_match_shader_layouts() {
        assert_eq!(size_of::<CameraUniform>(), 80);
        assert_eq!(size_of::<ProjectionUniform>(), 64);
        assert_eq!(size_of::<ObjectUniform>(), 96);
        assert_eq!(size_of::<PointLightGpu>(), 48);
        assert_eq!(size_of::<LightsUniform>(), 96);
        assert_eq!(size_of::<SkinningUniform>(), 64 * MAX_BONES);
    }

    #[test]
    fn matrices_are_uploaded_transposed() {
        let translate = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let rows = transposed(translate);
        // Translation lands in the last column of each uploaded row.
        assert_eq!(rows[0][3], 1.0);
        assert_eq!(rows[1][3], 2.0);
        assert_eq!(rows[2][3], 3.0);
    }

    #[test]
    fn light_attenuation_packs_distance_terms() {
        let light = PointLight::new(Vec3::ZERO, Vec3::ONE, 10.0);
        let gpu = PointLightGpu::from(&light);
        assert_eq!(gpu.attenuation, [10.0, 10.0, 100.0, 100.0]);
    }

    #[test]
    fn lights_uniform_carries_every_light() {
        let mut lights: [PointLight; NUM_LIGHTS] = Default::default();
        lights[0] = PointLight::new(Vec3::X, Vec3::ONE, 1.0);
        lights[NUM_LIGHTS - 1] = PointLight::new(Vec3::Y, Vec3::ONE, 2.0);
        let uniform = LightsUniform::new(&lights);
        assert_eq!(uniform.lights[0].position, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            uniform.lights[NUM_LIGHTS - 1].position,
            [0.0, 1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn skinning_pads_missing_bones_with_identity() {
        let palette = SkinningUniform::new(&[Mat4::from_translation(Vec3::X)]);
        assert_eq!(palette.bones[0][0][3], 1.0);
        assert_eq!(palette.bones[1], transposed(Mat4::IDENTITY));
    }
}
