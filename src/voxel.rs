use glam::{Mat4, Vec4};

use crate::drawable::Motion;
use crate::geometry::MeshData;
use crate::render::pipeline::VoxelGpu;
use crate::texture::Material;

/// Many copies of one mesh drawn in a single indexed-instanced call.
///
/// The batch shares the static renderable's material/shader handling but
/// carries a per-instance transform buffer instead of being drawn per voxel.
pub struct VoxelBatch {
    mesh: MeshData,
    materials: Vec<Material>,
    instances: Vec<Mat4>,
    motion: Motion,
    output_color: Vec4,
    elapsed: f32,
    world: Mat4,
    vertex_shader: Option<String>,
    pixel_shader: Option<String>,
    pub(crate) gpu: Option<VoxelGpu>,
}

impl VoxelBatch {
    pub fn new(mesh: MeshData, instances: Vec<Mat4>) -> Self {
        Self {
            mesh,
            materials: Vec::new(),
            instances,
            motion: Motion::Fixed,
            output_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            elapsed: 0.0,
            world: Mat4::IDENTITY,
            vertex_shader: None,
            pixel_shader: None,
            gpu: None,
        }
    }

    pub fn with_materials(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_output_color(mut self, color: Vec4) -> Self {
        self.output_color = color;
        self
    }

    pub fn with_shaders(mut self, vertex: impl Into<String>, pixel: impl Into<String>) -> Self {
        self.vertex_shader = Some(vertex.into());
        self.pixel_shader = Some(pixel.into());
        self
    }

    pub fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        self.world = self.motion.world(self.elapsed);
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn instances(&self) -> &[Mat4] {
        &self.instances
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn output_color(&self) -> Vec4 {
        self.output_color
    }

    pub fn has_texture(&self) -> bool {
        self.materials
            .iter()
            .any(|material| material.diffuse.is_some())
    }

    pub fn has_normal_map(&self) -> bool {
        self.materials
            .iter()
            .any(|material| material.normal.is_some())
    }

    pub fn vertex_shader(&self) -> Option<&str> {
        self.vertex_shader.as_deref()
    }

    pub fn pixel_shader(&self) -> Option<&str> {
        self.pixel_shader.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::unit_cube;
    use glam::Vec3;

    #[test]
    fn batch_reports_instance_count() {
        let instances = (0..8)
            .map(|i| Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        let batch = VoxelBatch::new(unit_cube(), instances);
        assert_eq!(batch.instance_count(), 8);
    }

    #[test]
    fn fixed_batch_keeps_identity_world() {
        let mut batch = VoxelBatch::new(unit_cube(), vec![Mat4::IDENTITY]);
        batch.update(1.0);
        assert_eq!(batch.world(), Mat4::IDENTITY);
    }
}
