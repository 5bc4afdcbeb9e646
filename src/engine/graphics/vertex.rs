use wgpu;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRIBUTES,
        }
    }
}

/// Per-instance data for one draw: the model matrix plus the lighting terms
/// the shader needs.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawInstance {
    pub model: [[f32; 4]; 4],
    /// rgb ambient color, w unused
    pub ambient: [f32; 4],
    /// rgb diffuse color, w = 1 when the directional light applies
    pub diffuse: [f32; 4],
    /// x = opacity, y = alpha cutoff
    pub params: [f32; 4],
}

impl DrawInstance {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x4,
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<DrawInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: ATTRIBUTES,
        }
    }
}

const FRONT: [f32; 3] = [0.0, 0.0, 1.0];
const BACK: [f32; 3] = [0.0, 0.0, -1.0];
const LEFT: [f32; 3] = [-1.0, 0.0, 0.0];
const RIGHT: [f32; 3] = [1.0, 0.0, 0.0];
const UP: [f32; 3] = [0.0, 1.0, 0.0];
const DOWN: [f32; 3] = [0.0, -1.0, 0.0];

// Unit cube used when a model file cannot be loaded
pub const CUBE_VERTICES: &[Vertex] = &[
    // Front face
    Vertex::new([-0.5, -0.5,  0.5], FRONT, [0.0, 1.0]),
    Vertex::new([ 0.5, -0.5,  0.5], FRONT, [1.0, 1.0]),
    Vertex::new([ 0.5,  0.5,  0.5], FRONT, [1.0, 0.0]),
    Vertex::new([-0.5,  0.5,  0.5], FRONT, [0.0, 0.0]),

    // Back face
    Vertex::new([-0.5, -0.5, -0.5], BACK, [1.0, 1.0]),
    Vertex::new([ 0.5, -0.5, -0.5], BACK, [0.0, 1.0]),
    Vertex::new([ 0.5,  0.5, -0.5], BACK, [0.0, 0.0]),
    Vertex::new([-0.5,  0.5, -0.5], BACK, [1.0, 0.0]),

    // Left face
    Vertex::new([-0.5, -0.5, -0.5], LEFT, [0.0, 1.0]),
    Vertex::new([-0.5, -0.5,  0.5], LEFT, [1.0, 1.0]),
    Vertex::new([-0.5,  0.5,  0.5], LEFT, [1.0, 0.0]),
    Vertex::new([-0.5,  0.5, -0.5], LEFT, [0.0, 0.0]),

    // Right face
    Vertex::new([ 0.5, -0.5, -0.5], RIGHT, [1.0, 1.0]),
    Vertex::new([ 0.5, -0.5,  0.5], RIGHT, [0.0, 1.0]),
    Vertex::new([ 0.5,  0.5,  0.5], RIGHT, [0.0, 0.0]),
    Vertex::new([ 0.5,  0.5, -0.5], RIGHT, [1.0, 0.0]),

    // Top face
    Vertex::new([-0.5,  0.5, -0.5], UP, [0.0, 1.0]),
    Vertex::new([ 0.5,  0.5, -0.5], UP, [1.0, 1.0]),
    Vertex::new([ 0.5,  0.5,  0.5], UP, [1.0, 0.0]),
    Vertex::new([-0.5,  0.5,  0.5], UP, [0.0, 0.0]),

    // Bottom face
    Vertex::new([-0.5, -0.5, -0.5], DOWN, [1.0, 1.0]),
    Vertex::new([ 0.5, -0.5, -0.5], DOWN, [0.0, 1.0]),
    Vertex::new([ 0.5, -0.5,  0.5], DOWN, [0.0, 0.0]),
    Vertex::new([-0.5, -0.5,  0.5], DOWN, [1.0, 0.0]),
];

pub const CUBE_INDICES: &[u32] = &[
    0, 1, 2,  2, 3, 0,
    4, 5, 6,  6, 7, 4,
    8, 9, 10, 10, 11, 8,
    12, 13, 14, 14, 15, 12,
    16, 17, 18, 18, 19, 16,
    20, 21, 22, 22, 23, 20,
];

// Camera-facing quad for particles, centered at the origin, size 1
pub const QUAD_VERTICES: &[Vertex] = &[
    Vertex::new([-0.5, -0.5, 0.0], BACK, [0.0, 1.0]),
    Vertex::new([ 0.5, -0.5, 0.0], BACK, [1.0, 1.0]),
    Vertex::new([ 0.5,  0.5, 0.0], BACK, [1.0, 0.0]),
    Vertex::new([-0.5,  0.5, 0.0], BACK, [0.0, 0.0]),
];

pub const QUAD_INDICES: &[u32] = &[0, 1, 2, 2, 3, 0];
