use glam::{Mat4, Vec4};

use crate::drawable::Motion;
use crate::geometry::{MeshData, SkinWeights};
use crate::render::pipeline::ModelGpu;
use crate::render::uniforms::MAX_BONES;
use crate::texture::Material;

/// A mesh deformed by a bone palette uploaded before every draw.
///
/// Bone transforms come from an external animation source through
/// `set_bone_transforms`; the core only stores and uploads them.
pub struct SkinnedModel {
    mesh: MeshData,
    skin: Vec<SkinWeights>,
    materials: Vec<Material>,
    bone_transforms: Vec<Mat4>,
    motion: Motion,
    output_color: Vec4,
    elapsed: f32,
    world: Mat4,
    vertex_shader: Option<String>,
    pixel_shader: Option<String>,
    pub(crate) gpu: Option<ModelGpu>,
}

impl SkinnedModel {
    /// `skin` must carry one entry per vertex in `mesh`.
    pub fn new(mesh: MeshData, skin: Vec<SkinWeights>, bone_count: usize) -> Self {
        debug_assert_eq!(mesh.vertices.len(), skin.len());
        debug_assert!(bone_count <= MAX_BONES);
        Self {
            mesh,
            skin,
            materials: Vec::new(),
            bone_transforms: vec![Mat4::IDENTITY; bone_count],
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

    pub fn with_shaders(mut self, vertex: impl Into<String>, pixel: impl Into<String>) -> Self {
        self.vertex_shader = Some(vertex.into());
        self.pixel_shader = Some(pixel.into());
        self
    }

    pub fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        self.world = self.motion.world(self.elapsed);
    }

    /// Replaces the bone palette for this frame. Extra transforms beyond the
    /// model's bone count are ignored.
    pub fn set_bone_transforms(&mut self, transforms: &[Mat4]) {
        let count = self.bone_transforms.len().min(transforms.len());
        self.bone_transforms[..count].copy_from_slice(&transforms[..count]);
    }

    pub fn bone_transforms(&self) -> &[Mat4] {
        &self.bone_transforms
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn skin(&self) -> &[SkinWeights] {
        &self.skin
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
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

    fn rigid_skin(vertex_count: usize) -> Vec<SkinWeights> {
        vec![
            SkinWeights {
                bone_indices: [0, 0, 0, 0],
                bone_weights: [1.0, 0.0, 0.0, 0.0],
            };
            vertex_count
        ]
    }

    #[test]
    fn bone_palette_starts_at_identity() {
        let mesh = unit_cube();
        let skin = rigid_skin(mesh.vertices.len());
        let model = SkinnedModel::new(mesh, skin, 4);
        assert_eq!(model.bone_transforms().len(), 4);
        assert!(model
            .bone_transforms()
            .iter()
            .all(|bone| *bone == Mat4::IDENTITY));
    }

    #[test]
    fn set_bone_transforms_ignores_extras() {
        let mesh = unit_cube();
        let skin = rigid_skin(mesh.vertices.len());
        let mut model = SkinnedModel::new(mesh, skin, 2);
        let pose = vec![Mat4::from_translation(Vec3::X); 5];
        model.set_bone_transforms(&pose);
        assert_eq!(model.bone_transforms().len(), 2);
        assert_eq!(model.bone_transforms()[1], pose[1]);
    }
}
