use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Interleaved vertex layout shared by every drawable kind.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Skinning attributes stored in a second vertex buffer for skinned models.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SkinWeights {
    pub bone_indices: [u32; 4],
    pub bone_weights: [f32; 4],
}

/// An index range within a mesh that draws with one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubMesh {
    pub index_count: u32,
    pub base_index: u32,
    pub base_vertex: i32,
    pub material_index: usize,
}

/// Pre-validated geometry handed to the core by the asset collaborator.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub submeshes: Vec<SubMesh>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// GPU-side vertex/index buffers for one mesh.
pub struct MeshBuffers {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffers {
    pub fn new(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.index_count(),
        }
    }
}

fn vertex(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex {
        position,
        normal,
        uv,
    }
}

/// A unit cube centered at the origin, one sub-mesh per call site's choice
/// of material (callers fill in `submeshes` when they carry materials).
pub fn unit_cube() -> MeshData {
    let vertices = vec![
        // +Z face
        vertex([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 1.0]),
        vertex([0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 1.0]),
        vertex([0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 0.0]),
        vertex([-0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 0.0]),
        // -Z face
        vertex([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 1.0]),
        vertex([0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 1.0]),
        vertex([0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 0.0]),
        vertex([-0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 0.0]),
        // -X face
        vertex([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 1.0]),
        vertex([-0.5, -0.5, 0.5], [-1.0, 0.0, 0.0], [1.0, 1.0]),
        vertex([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0], [1.0, 0.0]),
        vertex([-0.5, 0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 0.0]),
        // +X face
        vertex([0.5, -0.5, -0.5], [1.0, 0.0, 0.0], [1.0, 1.0]),
        vertex([0.5, -0.5, 0.5], [1.0, 0.0, 0.0], [0.0, 1.0]),
        vertex([0.5, 0.5, 0.5], [1.0, 0.0, 0.0], [0.0, 0.0]),
        vertex([0.5, 0.5, -0.5], [1.0, 0.0, 0.0], [1.0, 0.0]),
        // -Y face
        vertex([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [0.0, 0.0]),
        vertex([0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [1.0, 0.0]),
        vertex([0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [1.0, 1.0]),
        vertex([-0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [0.0, 1.0]),
        // +Y face
        vertex([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 0.0]),
        vertex([0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [1.0, 0.0]),
        vertex([0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [1.0, 1.0]),
        vertex([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [0.0, 1.0]),
    ];
    let indices = vec![
        0, 1, 2, 0, 2, 3, // +Z
        4, 6, 5, 4, 7, 6, // -Z
        8, 9, 10, 8, 10, 11, // -X
        12, 14, 13, 12, 15, 14, // +X
        16, 18, 17, 16, 19, 18, // -Y
        20, 21, 22, 20, 22, 23, // +Y
    ];
    MeshData {
        vertices,
        indices,
        submeshes: Vec::new(),
    }
}

/// An inward-facing shell around the camera; winding is reversed so the
/// inside faces rasterize.
pub fn skybox_shell() -> MeshData {
    let mut mesh = unit_cube();
    for vertex in &mut mesh.vertices {
        for component in &mut vertex.normal {
            *component = -*component;
        }
    }
    for triangle in mesh.indices.chunks_exact_mut(3) {
        triangle.swap(1, 2);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_is_closed() {
        let mesh = unit_cube();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert!(mesh
            .indices
            .iter()
            .all(|&index| (index as usize) < mesh.vertices.len()));
    }

    #[test]
    fn shell_reverses_winding_and_normals() {
        let cube = unit_cube();
        let shell = skybox_shell();
        assert_eq!(shell.indices[1], cube.indices[2]);
        assert_eq!(shell.indices[2], cube.indices[1]);
        assert_eq!(shell.vertices[0].normal[2], -cube.vertices[0].normal[2]);
    }
}
