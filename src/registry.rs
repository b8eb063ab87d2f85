use std::collections::BTreeMap;

use crate::drawable::StaticRenderable;
use crate::error::{Result, RuntimeError};
use crate::scene::Scene;
use crate::shader::{PixelShader, VertexShader};

/// Name-keyed store for scenes, shaders and top-level renderables.
///
/// Every map enforces unique names: inserting under an existing name fails
/// and leaves the stored value untouched. Maps are sorted so the renderer
/// iterates them in a stable order.
pub struct ResourceRegistry {
    scenes: BTreeMap<String, Scene>,
    vertex_shaders: BTreeMap<String, VertexShader>,
    pixel_shaders: BTreeMap<String, PixelShader>,
    renderables: BTreeMap<String, StaticRenderable>,
    main_scene: Option<String>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            scenes: BTreeMap::new(),
            vertex_shaders: BTreeMap::new(),
            pixel_shaders: BTreeMap::new(),
            renderables: BTreeMap::new(),
            main_scene: None,
        }
    }

    pub fn add_scene(&mut self, name: impl Into<String>, scene: Scene) -> Result<()> {
        let name = name.into();
        if self.scenes.contains_key(&name) {
            return Err(RuntimeError::DuplicateName(name));
        }
        self.scenes.insert(name, scene);
        Ok(())
    }

    pub fn add_vertex_shader(
        &mut self,
        name: impl Into<String>,
        shader: VertexShader,
    ) -> Result<()> {
        let name = name.into();
        if self.vertex_shaders.contains_key(&name) {
            return Err(RuntimeError::DuplicateName(name));
        }
        self.vertex_shaders.insert(name, shader);
        Ok(())
    }

    pub fn add_pixel_shader(
        &mut self,
        name: impl Into<String>,
        shader: PixelShader,
    ) -> Result<()> {
        let name = name.into();
        if self.pixel_shaders.contains_key(&name) {
            return Err(RuntimeError::DuplicateName(name));
        }
        self.pixel_shaders.insert(name, shader);
        Ok(())
    }

    pub fn add_renderable(
        &mut self,
        name: impl Into<String>,
        renderable: StaticRenderable,
    ) -> Result<()> {
        let name = name.into();
        if self.renderables.contains_key(&name) {
            return Err(RuntimeError::DuplicateName(name));
        }
        self.renderables.insert(name, renderable);
        Ok(())
    }

    /// Marks the named scene as the one the renderer draws. The scene must
    /// already be registered.
    pub fn set_main_scene(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !self.scenes.contains_key(&name) {
            return Err(RuntimeError::UnresolvedName(name));
        }
        self.main_scene = Some(name);
        Ok(())
    }

    pub fn main_scene_name(&self) -> Option<&str> {
        self.main_scene.as_deref()
    }

    pub fn main_scene(&self) -> Option<&Scene> {
        self.main_scene
            .as_deref()
            .and_then(|name| self.scenes.get(name))
    }

    pub fn main_scene_mut(&mut self) -> Option<&mut Scene> {
        let name = self.main_scene.clone()?;
        self.scenes.get_mut(&name)
    }

    /// Rebinds a top-level renderable to a registered vertex shader. Both
    /// names must resolve.
    pub fn set_vertex_shader_of_renderable(
        &mut self,
        renderable_name: &str,
        shader_name: &str,
    ) -> Result<()> {
        if !self.vertex_shaders.contains_key(shader_name) {
            return Err(RuntimeError::UnresolvedName(shader_name.to_string()));
        }
        let renderable = self
            .renderables
            .get_mut(renderable_name)
            .ok_or_else(|| RuntimeError::UnresolvedName(renderable_name.to_string()))?;
        renderable.set_vertex_shader(shader_name);
        Ok(())
    }

    /// Rebinds a top-level renderable to a registered pixel shader.
    pub fn set_pixel_shader_of_renderable(
        &mut self,
        renderable_name: &str,
        shader_name: &str,
    ) -> Result<()> {
        if !self.pixel_shaders.contains_key(shader_name) {
            return Err(RuntimeError::UnresolvedName(shader_name.to_string()));
        }
        let renderable = self
            .renderables
            .get_mut(renderable_name)
            .ok_or_else(|| RuntimeError::UnresolvedName(renderable_name.to_string()))?;
        renderable.set_pixel_shader(shader_name);
        Ok(())
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub fn vertex_shader(&self, name: &str) -> Option<&VertexShader> {
        self.vertex_shaders.get(name)
    }

    pub fn pixel_shader(&self, name: &str) -> Option<&PixelShader> {
        self.pixel_shaders.get(name)
    }

    pub fn renderable(&self, name: &str) -> Option<&StaticRenderable> {
        self.renderables.get(name)
    }

    pub fn renderables(&self) -> impl Iterator<Item = (&str, &StaticRenderable)> {
        self.renderables
            .iter()
            .map(|(name, renderable)| (name.as_str(), renderable))
    }

    pub(crate) fn renderables_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &mut StaticRenderable)> {
        self.renderables
            .iter_mut()
            .map(|(name, renderable)| (name.as_str(), renderable))
    }

    pub(crate) fn vertex_shaders_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &mut VertexShader)> {
        self.vertex_shaders
            .iter_mut()
            .map(|(name, shader)| (name.as_str(), shader))
    }

    pub(crate) fn pixel_shaders_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &mut PixelShader)> {
        self.pixel_shaders
            .iter_mut()
            .map(|(name, shader)| (name.as_str(), shader))
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::Motion;
    use crate::geometry::unit_cube;
    use crate::shader::lit_shader_source;

    fn cube() -> StaticRenderable {
        StaticRenderable::new(unit_cube(), Motion::Fixed)
    }

    #[test]
    fn duplicate_names_are_rejected_per_map() {
        let mut registry = ResourceRegistry::new();
        registry.add_scene("Main", Scene::new()).unwrap();
        assert!(matches!(
            registry.add_scene("Main", Scene::new()),
            Err(RuntimeError::DuplicateName(_))
        ));

        registry.add_renderable("Cube", cube()).unwrap();
        assert!(registry.add_renderable("Cube", cube()).is_err());

        // The same name is fine across different maps.
        registry
            .add_vertex_shader("Cube", VertexShader::new(lit_shader_source(), "vs_main"))
            .unwrap();
    }

    #[test]
    fn shader_rebind_requires_both_names() {
        let mut registry = ResourceRegistry::new();
        registry.add_renderable("Cube", cube()).unwrap();
        registry
            .add_vertex_shader("Lit", VertexShader::new(lit_shader_source(), "vs_main"))
            .unwrap();
        registry
            .add_pixel_shader("Lit", PixelShader::new(lit_shader_source(), "fs_main"))
            .unwrap();

        registry.set_vertex_shader_of_renderable("Cube", "Lit").unwrap();
        registry.set_pixel_shader_of_renderable("Cube", "Lit").unwrap();
        let renderable = registry.renderable("Cube").unwrap();
        assert_eq!(renderable.vertex_shader(), Some("Lit"));
        assert_eq!(renderable.pixel_shader(), Some("Lit"));

        assert!(matches!(
            registry.set_vertex_shader_of_renderable("Cube", "Missing"),
            Err(RuntimeError::UnresolvedName(_))
        ));
        assert!(matches!(
            registry.set_pixel_shader_of_renderable("Missing", "Lit"),
            Err(RuntimeError::UnresolvedName(_))
        ));
    }

    #[test]
    fn main_scene_must_be_registered_first() {
        let mut registry = ResourceRegistry::new();
        assert!(matches!(
            registry.set_main_scene("Main"),
            Err(RuntimeError::UnresolvedName(_))
        ));
        assert!(registry.main_scene().is_none());
        registry.add_scene("Main", Scene::new()).unwrap();
        registry.set_main_scene("Main").unwrap();
        assert!(registry.main_scene().is_some());
        assert_eq!(registry.main_scene_name(), Some("Main"));
    }
}
