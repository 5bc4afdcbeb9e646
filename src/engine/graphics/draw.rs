//! Explicit draw descriptions handed from the game to the renderer.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::engine::graphics::vertex::DrawInstance;

/// Handle to a mesh uploaded with `Renderer::add_mesh`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// Handle to a texture uploaded with `Renderer::add_texture`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Alpha tested at 0.5 and blended, writes depth.
    Cutout,
    /// Alpha blended without depth writes, drawn last.
    Translucent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lighting {
    /// Texture color only.
    Unlit,
    /// White ambient plus the white directional light.
    #[default]
    Daylight,
    /// Gray ambient plus the warm directional light used on the sky.
    Sunset,
}

impl Lighting {
    /// (ambient rgb, diffuse rgb, directional light enabled)
    pub fn terms(self) -> ([f32; 3], [f32; 3], bool) {
        match self {
            Lighting::Unlit => ([1.0, 1.0, 1.0], [0.0, 0.0, 0.0], false),
            Lighting::Daylight => ([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], true),
            Lighting::Sunset => ([0.6, 0.6, 0.6], [0.98, 0.37, 0.33], true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshId,
    pub texture: TextureId,
    pub transform: Mat4,
    pub blend: BlendMode,
    pub lighting: Lighting,
    pub opacity: f32,
}

impl DrawCall {
    pub fn new(mesh: MeshId, texture: TextureId, transform: Mat4) -> Self {
        Self {
            mesh,
            texture,
            transform,
            blend: BlendMode::Opaque,
            lighting: Lighting::Daylight,
            opacity: 1.0,
        }
    }

    pub fn blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn instance(&self) -> DrawInstance {
        let (ambient, diffuse, lit) = self.lighting.terms();
        let cutoff = match self.blend {
            BlendMode::Cutout => 0.5,
            BlendMode::Opaque | BlendMode::Translucent => 0.0,
        };
        DrawInstance {
            model: self.transform.to_cols_array_2d(),
            ambient: [ambient[0], ambient[1], ambient[2], 0.0],
            diffuse: [diffuse[0], diffuse[1], diffuse[2], if lit { 1.0 } else { 0.0 }],
            params: [self.opacity.clamp(0.0, 1.0), cutoff, 0.0, 0.0],
        }
    }
}

/// One camera and everything drawn through it.
#[derive(Debug, Clone, Default)]
pub struct ScenePass {
    pub view_proj: Mat4,
    pub draws: Vec<DrawCall>,
}

/// Everything needed to draw one frame: an optional 3D world pass followed by
/// an overlay pass that clears depth and draws on top.
#[derive(Debug, Clone, Default)]
pub struct FramePlan {
    pub world: Option<ScenePass>,
    pub overlay: ScenePass,
    /// Direction the light travels, world space.
    pub light_direction: Vec3,
}

/// Consecutive draws sharing mesh, texture and blend mode, drawn as one instanced call.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub mesh: MeshId,
    pub texture: TextureId,
    pub blend: BlendMode,
    pub instances: Vec<DrawInstance>,
}

/// Groups draws by blend mode (opaque, cutout, translucent), keeping submission
/// order inside a mode, and merges neighbours with the same mesh and texture.
pub fn batch(draws: &[DrawCall]) -> Vec<Batch> {
    let mut ordered: Vec<&DrawCall> = draws.iter().collect();
    ordered.sort_by_key(|d| d.blend);

    let mut batches: Vec<Batch> = Vec::new();
    for draw in ordered {
        match batches.last_mut() {
            Some(last)
                if last.mesh == draw.mesh
                    && last.texture == draw.texture
                    && last.blend == draw.blend =>
            {
                last.instances.push(draw.instance());
            }
            _ => batches.push(Batch {
                mesh: draw.mesh,
                texture: draw.texture,
                blend: draw.blend,
                instances: vec![draw.instance()],
            }),
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(mesh: usize, texture: usize, blend: BlendMode) -> DrawCall {
        DrawCall::new(MeshId(mesh), TextureId(texture), Mat4::IDENTITY).blend(blend)
    }

    #[test]
    fn test_batches_merge_neighbours() {
        let draws = [
            draw(0, 0, BlendMode::Opaque),
            draw(0, 0, BlendMode::Opaque),
            draw(1, 0, BlendMode::Opaque),
            draw(0, 0, BlendMode::Opaque),
        ];
        let batches = batch(&draws);
        let sizes: Vec<usize> = batches.iter().map(|b| b.instances.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
    }

    #[test]
    fn test_translucent_drawn_last() {
        let draws = [
            draw(2, 2, BlendMode::Translucent),
            draw(1, 1, BlendMode::Cutout),
            draw(0, 0, BlendMode::Opaque),
        ];
        let order: Vec<BlendMode> = batch(&draws).iter().map(|b| b.blend).collect();
        assert_eq!(
            order,
            vec![BlendMode::Opaque, BlendMode::Cutout, BlendMode::Translucent]
        );
    }

    #[test]
    fn test_instance_terms() {
        let call = draw(0, 0, BlendMode::Cutout).lighting(Lighting::Unlit).opacity(0.25);
        let instance = call.instance();
        assert_eq!(instance.params[0], 0.25);
        assert_eq!(instance.params[1], 0.5);
        assert_eq!(instance.diffuse[3], 0.0);
    }
}
