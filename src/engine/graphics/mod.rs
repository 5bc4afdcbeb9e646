pub mod draw;
pub mod frustum;
pub mod mesh;
pub mod renderer;
pub mod texture;
pub mod vertex;

pub use draw::{BlendMode, DrawCall, FramePlan, Lighting, MeshId, ScenePass, TextureId};
pub use frustum::Frustum;
pub use mesh::{BoundingSphere, MeshData};
pub use renderer::Renderer;
pub use texture::Texture;
pub use vertex::Vertex;
