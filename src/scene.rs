use std::collections::BTreeMap;

use glam::Mat4;

use crate::drawable::StaticRenderable;
use crate::error::{Result, RuntimeError};
use crate::light::{PointLight, NUM_LIGHTS};
use crate::model::SkinnedModel;
use crate::skybox::Skybox;
use crate::voxel::VoxelBatch;

/// Everything drawn in one frame: lights, named static renderables, voxel
/// batches, skinned models and an optional skybox.
///
/// Renderables are keyed by name in a sorted map so that iteration, and
/// therefore draw order, is deterministic regardless of insertion order.
pub struct Scene {
    lights: [PointLight; NUM_LIGHTS],
    renderables: BTreeMap<String, StaticRenderable>,
    voxel_batches: Vec<VoxelBatch>,
    models: Vec<SkinnedModel>,
    skybox: Option<Skybox>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            lights: Default::default(),
            renderables: BTreeMap::new(),
            voxel_batches: Vec::new(),
            models: Vec::new(),
            skybox: None,
        }
    }

    /// Registers a named renderable. Names are unique; a second insert under
    /// the same name is rejected and the scene is left unchanged.
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

    pub fn add_voxel_batch(&mut self, batch: VoxelBatch) {
        self.voxel_batches.push(batch);
    }

    pub fn add_model(&mut self, model: SkinnedModel) {
        self.models.push(model);
    }

    pub fn set_skybox(&mut self, skybox: Skybox) {
        self.skybox = Some(skybox);
    }

    pub fn set_light(&mut self, index: usize, light: PointLight) -> Result<()> {
        if index >= NUM_LIGHTS {
            return Err(RuntimeError::Configuration(format!(
                "light index {index} out of range (limit {NUM_LIGHTS})"
            )));
        }
        self.lights[index] = light;
        Ok(())
    }

    /// Advances every object's clock by `delta_time`, in the same order the
    /// frame later draws them.
    pub fn update(&mut self, delta_time: f32) {
        for renderable in self.renderables.values_mut() {
            renderable.update(delta_time);
        }
        for batch in &mut self.voxel_batches {
            batch.update(delta_time);
        }
        for model in &mut self.models {
            model.update(delta_time);
        }
        if let Some(skybox) = &mut self.skybox {
            skybox.update(delta_time);
        }
        for light in &mut self.lights {
            light.update(delta_time);
        }
    }

    /// Drives every model's bone palette from one shared pose.
    pub fn set_bone_transforms(&mut self, transforms: &[Mat4]) {
        for model in &mut self.models {
            model.set_bone_transforms(transforms);
        }
    }

    pub fn lights(&self) -> &[PointLight; NUM_LIGHTS] {
        &self.lights
    }

    pub fn renderables(&self) -> impl Iterator<Item = (&str, &StaticRenderable)> {
        self.renderables
            .iter()
            .map(|(name, renderable)| (name.as_str(), renderable))
    }

    pub fn renderable(&self, name: &str) -> Option<&StaticRenderable> {
        self.renderables.get(name)
    }

    pub fn renderable_mut(&mut self, name: &str) -> Option<&mut StaticRenderable> {
        self.renderables.get_mut(name)
    }

    pub fn renderable_count(&self) -> usize {
        self.renderables.len()
    }

    pub fn voxel_batches(&self) -> &[VoxelBatch] {
        &self.voxel_batches
    }

    pub fn models(&self) -> &[SkinnedModel] {
        &self.models
    }

    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox.as_ref()
    }

    pub(crate) fn renderables_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &mut StaticRenderable)> {
        self.renderables
            .iter_mut()
            .map(|(name, renderable)| (name.as_str(), renderable))
    }

    pub(crate) fn voxel_batches_mut(&mut self) -> &mut [VoxelBatch] {
        &mut self.voxel_batches
    }

    pub(crate) fn models_mut(&mut self) -> &mut [SkinnedModel] {
        &mut self.models
    }

    pub(crate) fn skybox_mut(&mut self) -> Option<&mut Skybox> {
        self.skybox.as_mut()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::Motion;
    use crate::geometry::unit_cube;

    #[test]
    fn duplicate_renderable_name_is_rejected() {
        let mut scene = Scene::new();
        scene
            .add_renderable("cube", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        let err = scene
            .add_renderable(
                "cube",
                StaticRenderable::new(unit_cube(), Motion::Spin { rate: 1.0 }),
            )
            .unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateName(name) if name == "cube"));
        assert_eq!(scene.renderable_count(), 1);
        assert_eq!(scene.renderable("cube").unwrap().motion(), &Motion::Fixed);
    }

    #[test]
    fn renderables_iterate_in_name_order() {
        let mut scene = Scene::new();
        for name in ["zeta", "alpha", "mid"] {
            scene
                .add_renderable(name, StaticRenderable::new(unit_cube(), Motion::Fixed))
                .unwrap();
        }
        let names: Vec<&str> = scene.renderables().map(|(name, _)| name).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn out_of_range_light_index_is_rejected() {
        let mut scene = Scene::new();
        let err = scene.set_light(NUM_LIGHTS, PointLight::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::Configuration(_)));
    }

    #[test]
    fn update_advances_every_member() {
        let mut scene = Scene::new();
        scene
            .add_renderable(
                "spinner",
                StaticRenderable::new(unit_cube(), Motion::Spin { rate: 1.0 }),
            )
            .unwrap();
        scene.update(0.5);
        let world = scene.renderable("spinner").unwrap().world();
        assert_eq!(
            world.to_cols_array(),
            glam::Mat4::from_rotation_y(0.5).to_cols_array()
        );
    }
}
