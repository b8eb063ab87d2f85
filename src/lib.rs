//! Core of a real-time rendering runtime built on wgpu.
//!
//! The crate exposes the building blocks of a frame: a name-keyed resource
//! registry, a fly camera, animated renderables (static meshes, instanced
//! voxel batches, skinned models, a skybox) and a renderer that draws them
//! in a fixed order each frame.  Asset decoding and window management stay
//! outside the crate so the scene and animation logic remain testable
//! without a GPU.

pub mod camera;
pub mod drawable;
pub mod error;
pub mod geometry;
pub mod input;
pub mod light;
pub mod model;
pub mod registry;
pub mod render;
pub mod scene;
pub mod shader;
pub mod skybox;
pub mod texture;
pub mod voxel;

pub use camera::Camera;
pub use drawable::{Motion, PingPong, StaticRenderable};
pub use error::{Result, RuntimeError};
pub use geometry::{unit_cube, MeshData, SkinWeights, SubMesh, Vertex};
pub use input::{DirectionsInput, MouseRelativeMovement};
pub use light::{PointLight, NUM_LIGHTS};
pub use model::SkinnedModel;
pub use registry::ResourceRegistry;
pub use render::frame::{FrameItem, FramePlan};
pub use render::pipeline::DrawKind;
pub use render::Renderer;
pub use scene::Scene;
pub use shader::{PixelShader, VertexShader};
pub use skybox::Skybox;
pub use texture::{Material, SamplerKind, TextureData};
pub use voxel::VoxelBatch;
