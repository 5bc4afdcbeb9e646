//! Model geometry: CPU-side import from glTF and the GPU buffers built from it.

use std::path::Path;

use glam::{Mat3, Mat4, Vec3};
use log::debug;
use wgpu::util::DeviceExt;

use crate::engine::graphics::vertex::{Vertex, CUBE_INDICES, CUBE_VERTICES, QUAD_INDICES, QUAD_VERTICES};
use crate::error::{GameError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Triangle list in model space.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Imports every mesh reachable from the default scene of a `.glb`/`.gltf`
    /// file, baking node transforms into the vertices.
    pub fn load(path: &Path) -> Result<Self> {
        let (document, buffers, _images) = gltf::import(path).map_err(|e| GameError::Model {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| GameError::Model {
                path: path.to_path_buf(),
                reason: "file contains no scene".to_string(),
            })?;

        let mut data = MeshData::default();
        for node in scene.nodes() {
            data.append_node(&node, Mat4::IDENTITY, &buffers);
        }

        if data.indices.is_empty() {
            return Err(GameError::Model {
                path: path.to_path_buf(),
                reason: "no triangles".to_string(),
            });
        }
        debug!(
            "Imported {} ({} vertices, {} triangles)",
            path.display(),
            data.vertices.len(),
            data.indices.len() / 3
        );
        Ok(data)
    }

    fn append_node(&mut self, node: &gltf::Node, parent: Mat4, buffers: &[gltf::buffer::Data]) {
        let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    continue;
                }
                let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
                let Some(positions) = reader.read_positions() else {
                    continue;
                };

                let base = self.vertices.len() as u32;
                let mut vertices: Vec<Vertex> = positions
                    .map(|p| {
                        let p = transform.transform_point3(Vec3::from(p));
                        Vertex::new(p.to_array(), [0.0, 1.0, 0.0], [0.0, 0.0])
                    })
                    .collect();

                if let Some(normals) = reader.read_normals() {
                    for (vertex, n) in vertices.iter_mut().zip(normals) {
                        vertex.normal = (normal_matrix * Vec3::from(n)).normalize_or_zero().to_array();
                    }
                }
                if let Some(tex_coords) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
                    for (vertex, uv) in vertices.iter_mut().zip(tex_coords) {
                        vertex.tex_coords = uv;
                    }
                }

                let count = vertices.len() as u32;
                match reader.read_indices() {
                    Some(indices) => self
                        .indices
                        .extend(indices.into_u32().filter(|&i| i < count).map(|i| base + i)),
                    None => self.indices.extend(base..base + count - count % 3),
                }
                self.vertices.append(&mut vertices);
            }
        }

        for child in node.children() {
            self.append_node(&child, transform, buffers);
        }
    }

    pub fn cube() -> Self {
        Self {
            vertices: CUBE_VERTICES.to_vec(),
            indices: CUBE_INDICES.to_vec(),
        }
    }

    pub fn quad() -> Self {
        Self {
            vertices: QUAD_VERTICES.to_vec(),
            indices: QUAD_INDICES.to_vec(),
        }
    }

    /// Sphere around the axis-aligned bounds of the vertices.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        if self.vertices.is_empty() {
            return BoundingSphere {
                center: Vec3::ZERO,
                radius: 0.0,
            };
        }
        let (min, max) = self.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), v| {
                let p = Vec3::from(v.position);
                (min.min(p), max.max(p))
            },
        );
        let center = (min + max) * 0.5;
        let radius = self
            .vertices
            .iter()
            .map(|v| Vec3::from(v.position).distance(center))
            .fold(0.0, f32::max);
        BoundingSphere { center, radius }
    }
}

/// Vertex and index buffers on the GPU.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, data: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_indices: data.indices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_bounding_sphere() {
        let sphere = MeshData::cube().bounding_sphere();
        assert!(sphere.center.length() < 1e-6);
        assert!((sphere.radius - 0.75_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_empty_bounding_sphere() {
        let sphere = MeshData::default().bounding_sphere();
        assert_eq!(sphere.radius, 0.0);
    }

    #[test]
    fn test_missing_model_is_error() {
        let err = MeshData::load(Path::new("no/such/model.glb")).unwrap_err();
        assert!(matches!(err, GameError::Model { .. }));
    }

    #[test]
    fn test_fallback_meshes_are_triangle_lists() {
        for mesh in [MeshData::cube(), MeshData::quad()] {
            assert_eq!(mesh.indices.len() % 3, 0);
            assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        }
    }
}
