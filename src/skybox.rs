use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use crate::geometry::{skybox_shell, MeshData};
use crate::render::pipeline::SkyboxGpu;
use crate::texture::TextureData;

/// The environment shell drawn last each frame, centered on the camera.
///
/// The shell itself never moves; the renderer composes the camera eye into
/// the uploaded world transform so the sky never parallaxes. It samples its
/// texture through a dedicated sampler, separate from object materials.
pub struct Skybox {
    mesh: MeshData,
    environment: Arc<TextureData>,
    radius: f32,
    elapsed: f32,
    vertex_shader: Option<String>,
    pixel_shader: Option<String>,
    pub(crate) gpu: Option<SkyboxGpu>,
}

impl Skybox {
    pub fn new(environment: TextureData, radius: f32) -> Self {
        Self {
            mesh: skybox_shell(),
            environment: Arc::new(environment),
            radius,
            elapsed: 0.0,
            vertex_shader: None,
            pixel_shader: None,
            gpu: None,
        }
    }

    pub fn with_shaders(mut self, vertex: impl Into<String>, pixel: impl Into<String>) -> Self {
        self.vertex_shader = Some(vertex.into());
        self.pixel_shader = Some(pixel.into());
        self
    }

    pub fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// World transform for this frame: the shell scaled to its radius and
    /// recentered on the camera.
    pub fn world_at(&self, eye: Vec3) -> Mat4 {
        Mat4::from_translation(eye) * Mat4::from_scale(Vec3::splat(self.radius))
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn environment(&self) -> &TextureData {
        &self.environment
    }

    pub fn output_color(&self) -> Vec4 {
        Vec4::ONE
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

    #[test]
    fn shell_recenters_on_the_camera() {
        let skybox = Skybox::new(TextureData::solid([40, 60, 120, 255]), 250.0);
        let eye = Vec3::new(7.0, -2.0, 11.0);
        let world = skybox.world_at(eye);
        let center = world.transform_point3(Vec3::ZERO);
        assert!((center - eye).length() < 1e-5);
        let surface = world.transform_point3(Vec3::X);
        assert!(((surface - eye).length() - 250.0).abs() < 1e-3);
    }
}
