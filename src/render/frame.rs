use crate::registry::ResourceRegistry;
use crate::render::pipeline::DrawKind;

/// One planned draw, in frame order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameItem {
    pub kind: DrawKind,
    pub name: String,
    pub vertex_shader: Option<String>,
    pub pixel_shader: Option<String>,
}

/// The ordered list of draws one frame will issue.
///
/// Built without touching the GPU, so frame composition can be inspected
/// and tested headlessly. The order is fixed: the main scene's statics by
/// name, then top-level renderables by name, then voxel batches, then
/// skinned models, then the skybox.
#[derive(Clone, Debug, Default)]
pub struct FramePlan {
    pub items: Vec<FrameItem>,
}

impl FramePlan {
    pub fn build(registry: &ResourceRegistry) -> Self {
        let mut items = Vec::new();

        if let Some(scene) = registry.main_scene() {
            for (name, renderable) in scene.renderables() {
                items.push(FrameItem {
                    kind: DrawKind::Static,
                    name: name.to_string(),
                    vertex_shader: renderable.vertex_shader().map(str::to_string),
                    pixel_shader: renderable.pixel_shader().map(str::to_string),
                });
            }
        }

        for (name, renderable) in registry.renderables() {
            items.push(FrameItem {
                kind: DrawKind::Static,
                name: name.to_string(),
                vertex_shader: renderable.vertex_shader().map(str::to_string),
                pixel_shader: renderable.pixel_shader().map(str::to_string),
            });
        }

        if let Some(scene) = registry.main_scene() {
            for (index, batch) in scene.voxel_batches().iter().enumerate() {
                items.push(FrameItem {
                    kind: DrawKind::Instanced,
                    name: format!("voxel-batch-{index}"),
                    vertex_shader: batch.vertex_shader().map(str::to_string),
                    pixel_shader: batch.pixel_shader().map(str::to_string),
                });
            }
            for (index, model) in scene.models().iter().enumerate() {
                items.push(FrameItem {
                    kind: DrawKind::Skinned,
                    name: format!("model-{index}"),
                    vertex_shader: model.vertex_shader().map(str::to_string),
                    pixel_shader: model.pixel_shader().map(str::to_string),
                });
            }
            if let Some(skybox) = scene.skybox() {
                items.push(FrameItem {
                    kind: DrawKind::Skybox,
                    name: "skybox".to_string(),
                    vertex_shader: skybox.vertex_shader().map(str::to_string),
                    pixel_shader: skybox.pixel_shader().map(str::to_string),
                });
            }
        }

        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::{Motion, StaticRenderable};
    use crate::geometry::unit_cube;
    use crate::model::SkinnedModel;
    use crate::scene::Scene;
    use crate::skybox::Skybox;
    use crate::texture::TextureData;
    use crate::voxel::VoxelBatch;
    use glam::Mat4;

    fn populated_registry() -> ResourceRegistry {
        let mut scene = Scene::new();
        scene
            .add_renderable("zebra", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        scene
            .add_renderable("apple", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        scene.add_voxel_batch(VoxelBatch::new(unit_cube(), vec![Mat4::IDENTITY]));
        let mesh = unit_cube();
        let skin = vec![
            crate::geometry::SkinWeights {
                bone_indices: [0, 0, 0, 0],
                bone_weights: [1.0, 0.0, 0.0, 0.0],
            };
            mesh.vertices.len()
        ];
        scene.add_model(SkinnedModel::new(mesh, skin, 1));
        scene.set_skybox(Skybox::new(TextureData::solid([0, 0, 64, 255]), 100.0));

        let mut registry = ResourceRegistry::new();
        registry.add_scene("Main", scene).unwrap();
        registry.set_main_scene("Main").unwrap();
        registry
            .add_renderable("middle", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        registry
    }

    #[test]
    fn frame_order_is_statics_voxels_models_skybox() {
        let plan = FramePlan::build(&populated_registry());
        let kinds: Vec<DrawKind> = plan.items.iter().map(|item| item.kind).collect();
        assert_eq!(
            kinds,
            [
                DrawKind::Static,
                DrawKind::Static,
                DrawKind::Static,
                DrawKind::Instanced,
                DrawKind::Skinned,
                DrawKind::Skybox,
            ]
        );
        // Scene statics come first in name order, then top-level ones.
        let names: Vec<&str> = plan.items[..3].iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["apple", "zebra", "middle"]);
    }

    #[test]
    fn plan_without_main_scene_covers_top_level_renderables_only() {
        let mut registry = ResourceRegistry::new();
        registry
            .add_renderable("cube", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        let plan = FramePlan::build(&registry);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.items[0].kind, DrawKind::Static);
    }

    #[test]
    fn plan_is_stable_across_insertion_order() {
        let first = FramePlan::build(&populated_registry());

        let mut scene = Scene::new();
        scene
            .add_renderable("apple", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        scene
            .add_renderable("zebra", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        scene.add_voxel_batch(VoxelBatch::new(unit_cube(), vec![Mat4::IDENTITY]));
        let mesh = unit_cube();
        let skin = vec![
            crate::geometry::SkinWeights {
                bone_indices: [0, 0, 0, 0],
                bone_weights: [1.0, 0.0, 0.0, 0.0],
            };
            mesh.vertices.len()
        ];
        scene.add_model(SkinnedModel::new(mesh, skin, 1));
        scene.set_skybox(Skybox::new(TextureData::solid([0, 0, 64, 255]), 100.0));
        let mut registry = ResourceRegistry::new();
        registry
            .add_renderable("middle", StaticRenderable::new(unit_cube(), Motion::Fixed))
            .unwrap();
        registry.add_scene("Main", scene).unwrap();
        registry.set_main_scene("Main").unwrap();

        let second = FramePlan::build(&registry);
        let first_names: Vec<&str> = first.items.iter().map(|item| item.name.as_str()).collect();
        let second_names: Vec<&str> = second.items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(first_names, second_names);
    }
}
