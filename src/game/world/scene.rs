//! Turns the level and the hunt into draw calls.
//!
//! `SceneAssets::load` uploads everything the level names and resolves it to
//! handles. `Scene` holds only handles and prebuilt draw lists, so building a
//! frame plan needs no GPU.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use glam::{Mat4, Vec3};
use image::RgbaImage;
use log::{info, warn};
use rayon::prelude::*;

use crate::engine::audio::{AudioEngine, SoundId};
use crate::engine::graphics::texture;
use crate::engine::graphics::{
    BlendMode, DrawCall, FramePlan, Lighting, MeshData, MeshId, Renderer, ScenePass, TextureId,
};
use crate::error::Result;
use crate::game::hunt::Hunt;
use crate::game::state::Phase;
use crate::game::world::camera::{overlay_view_proj, Camera};
use crate::game::world::level::{Level, Placement, ScreenPair};
use crate::game::world::particles::ParticleSystem;

/// Handles for everything the level refers to by name.
#[derive(Debug, Clone, Default)]
pub struct AssetIds {
    pub meshes: BTreeMap<String, MeshId>,
    pub textures: BTreeMap<String, TextureId>,
    /// Unit quad used for particle billboards.
    pub quad: MeshId,
    pub fallback_mesh: MeshId,
    pub fallback_texture: TextureId,
}

impl AssetIds {
    fn mesh(&self, name: &str) -> MeshId {
        self.meshes.get(name).copied().unwrap_or(self.fallback_mesh)
    }

    fn texture(&self, name: &str) -> TextureId {
        self.textures.get(name).copied().unwrap_or(self.fallback_texture)
    }

    fn placement(&self, placement: &Placement) -> DrawCall {
        DrawCall::new(
            self.mesh(&placement.model),
            self.texture(&placement.texture),
            placement.transform(),
        )
        .blend(placement.blend)
        .lighting(placement.lighting)
    }

    fn screen(&self, pair: &ScreenPair) -> Vec<DrawCall> {
        vec![self.placement(&pair.left), self.placement(&pair.right)]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sounds {
    pub music: SoundId,
    pub ambience: SoundId,
    pub footsteps: SoundId,
    pub pickup: SoundId,
}

pub struct SceneAssets {
    pub scene: Scene,
    pub sounds: Sounds,
    /// Bounding radius of the egg model before scaling.
    pub egg_radius: f32,
}

impl SceneAssets {
    /// Loads models, textures and sounds named by the level from `assets_dir`.
    /// Files that fail to load are replaced by a cube, a checker texture or
    /// silence.
    pub fn load(renderer: &mut Renderer, audio: &mut AudioEngine, level: &Level, assets_dir: &Path) -> Self {
        let start = Instant::now();

        let fallback_mesh = renderer.add_mesh(&MeshData::cube(), "fallback cube");
        let fallback_texture = renderer.add_default_texture();
        let quad = renderer.add_mesh(&MeshData::quad(), "particle quad");

        // Decoding is CPU-only, uploads stay on this thread
        let decoded_models: Vec<(&String, Result<MeshData>)> = level
            .models
            .par_iter()
            .map(|(name, path)| (name, MeshData::load(&assets_dir.join(path))))
            .collect();
        let decoded_textures: Vec<(&String, Result<RgbaImage>)> = level
            .textures
            .par_iter()
            .map(|(name, source)| {
                let alpha = source.alpha.as_ref().map(|a| assets_dir.join(a));
                (name, texture::decode(&assets_dir.join(&source.image), alpha.as_deref()))
            })
            .collect();

        let mut ids = AssetIds {
            quad,
            fallback_mesh,
            fallback_texture,
            ..Default::default()
        };
        let mut egg_radius = MeshData::cube().bounding_sphere().radius;

        for (name, result) in decoded_models {
            match result {
                Ok(data) => {
                    if *name == level.egg.model {
                        egg_radius = data.bounding_sphere().radius;
                    }
                    ids.meshes.insert(name.clone(), renderer.add_mesh(&data, name));
                }
                Err(e) => {
                    warn!("Model '{name}' unavailable, drawing a cube: {e}");
                    ids.meshes.insert(name.clone(), fallback_mesh);
                }
            }
        }
        for (name, result) in decoded_textures {
            match result {
                Ok(rgba) => {
                    ids.textures.insert(name.clone(), renderer.add_texture(&rgba, name));
                }
                Err(e) => {
                    warn!("Texture '{name}' unavailable, using checker: {e}");
                    ids.textures.insert(name.clone(), fallback_texture);
                }
            }
        }

        let mut load_sound = |path: &Path| match audio.load(&assets_dir.join(path)) {
            Ok(id) => id,
            Err(e) => {
                warn!("{e}; using silence");
                audio.load_silent()
            }
        };
        let sounds = Sounds {
            music: load_sound(&level.sounds.music),
            ambience: load_sound(&level.sounds.ambience),
            footsteps: load_sound(&level.sounds.footsteps),
            pickup: load_sound(&level.sounds.pickup),
        };

        let scene = Scene::new(level, ids);
        info!(
            "Loaded level '{}': {} models, {} textures, {} static draws in {:.2?}",
            level.name,
            level.models.len(),
            level.textures.len(),
            scene.world.len(),
            start.elapsed()
        );

        Self {
            scene,
            sounds,
            egg_radius,
        }
    }
}

/// What the camera looks at this frame.
pub struct View<'a> {
    pub camera: &'a Camera,
    pub aspect: f32,
    pub now: Instant,
}

pub struct Scene {
    ids: AssetIds,
    /// Sky, ground, props and scatter, fixed for the whole run.
    world: Vec<DrawCall>,
    title: Vec<DrawCall>,
    help: Vec<DrawCall>,
    game_over: Vec<DrawCall>,
    crosshair: DrawCall,
    egg_icon: DrawCall,
    icon_spacing: f32,
    egg_mesh: MeshId,
    egg_texture: TextureId,
    glitter_texture: TextureId,
    light_direction: Vec3,
}

impl Scene {
    pub fn new(level: &Level, ids: AssetIds) -> Self {
        let mut world = vec![ids.placement(&level.sky), ids.placement(&level.ground)];
        world.extend(level.props.iter().map(|p| ids.placement(p)));
        world.extend(level.scatter_placements().iter().map(|p| ids.placement(p)));

        Self {
            title: ids.screen(&level.screens.title),
            help: ids.screen(&level.screens.help),
            game_over: ids.screen(&level.screens.game_over),
            crosshair: ids.placement(&level.hud.crosshair),
            egg_icon: ids.placement(&level.hud.egg_icon),
            icon_spacing: level.hud.icon_spacing,
            egg_mesh: ids.mesh(&level.egg.model),
            egg_texture: ids.texture(&level.egg.texture),
            glitter_texture: ids.texture(&level.glitter.texture),
            light_direction: level.light_direction(),
            world,
            ids,
        }
    }

    pub fn plan(&self, hunt: &Hunt, particles: &ParticleSystem, view: &View) -> FramePlan {
        let overlay = |draws: Vec<DrawCall>| ScenePass {
            view_proj: overlay_view_proj(view.aspect),
            draws,
        };
        let (world, overlay) = match hunt.phase() {
            Phase::Title => (None, overlay(self.title.clone())),
            Phase::GameOver => (None, overlay(self.game_over.clone())),
            Phase::Play if hunt.state().is_help_shown() => (None, overlay(self.help.clone())),
            Phase::Play => (
                Some(self.world_pass(hunt, particles, view)),
                overlay(self.hud(hunt.eggs().collected())),
            ),
        };
        FramePlan {
            world,
            overlay,
            light_direction: self.light_direction,
        }
    }

    fn world_pass(&self, hunt: &Hunt, particles: &ParticleSystem, view: &View) -> ScenePass {
        let t = hunt.elapsed(view.now);
        let eggs = hunt.eggs();

        let mut draws = self.world.clone();
        draws.extend(eggs.visible().map(|egg| {
            DrawCall::new(self.egg_mesh, self.egg_texture, eggs.transform(egg, t)).lighting(Lighting::Unlit)
        }));

        let heading = view.camera.heading();
        let right = view.camera.right();
        let up = heading.cross(right).normalize_or_zero();
        let size = particles.particle_size();
        draws.extend(particles.alive().map(|particle| {
            let transform = Mat4::from_cols(
                (right * size).extend(0.0),
                (up * size).extend(0.0),
                heading.extend(0.0),
                particle.position.extend(1.0),
            );
            DrawCall::new(self.ids.quad, self.glitter_texture, transform)
                .blend(BlendMode::Translucent)
                .lighting(Lighting::Unlit)
                .opacity(particle.opacity())
        }));

        ScenePass {
            view_proj: view.camera.view_proj(view.aspect),
            draws,
        }
    }

    /// Crosshair plus one icon per collected egg, stepping left from the
    /// icon anchor.
    fn hud(&self, collected: usize) -> Vec<DrawCall> {
        let mut draws = vec![self.crosshair];
        draws.extend((1..=collected).map(|k| {
            let offset = Mat4::from_translation(Vec3::new(self.icon_spacing * k as f32, 0.0, 0.0));
            DrawCall {
                transform: offset * self.egg_icon.transform,
                ..self.egg_icon
            }
        }));
        draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::Frustum;
    use crate::engine::input::GameInput;
    use crate::game::world::particles::EmitterDef;

    fn scene(level: &Level) -> Scene {
        let mut ids = AssetIds {
            quad: MeshId(0),
            fallback_mesh: MeshId(1),
            fallback_texture: TextureId(0),
            ..Default::default()
        };
        for (i, name) in level.models.keys().enumerate() {
            ids.meshes.insert(name.clone(), MeshId(i + 2));
        }
        for (i, name) in level.textures.keys().enumerate() {
            ids.textures.insert(name.clone(), TextureId(i + 1));
        }
        Scene::new(level, ids)
    }

    fn view(camera: &Camera, now: Instant) -> View<'_> {
        View {
            camera,
            aspect: 16.0 / 9.0,
            now,
        }
    }

    #[test]
    fn test_static_draws_cover_level() {
        let level = Level::embedded().unwrap();
        let scene = scene(&level);
        let scattered: usize = level.scatter.iter().map(|g| g.count).sum();
        assert_eq!(scene.world.len(), 2 + level.props.len() + scattered);
        assert!(scene.world.iter().all(|d| d.mesh != MeshId(1)));
    }

    #[test]
    fn test_title_and_help_skip_world() {
        let level = Level::embedded().unwrap();
        let scene = scene(&level);
        let now = Instant::now();
        let mut hunt = Hunt::new(&level, 10.0, now);
        let particles = ParticleSystem::new(EmitterDef::glitter(), 5.0);
        let camera = Camera::from_heading(level.start_position(), level.start_heading());

        let plan = scene.plan(&hunt, &particles, &view(&camera, now));
        assert!(plan.world.is_none());
        assert_eq!(plan.overlay.draws, scene.title);

        hunt.handle(GameInput::Confirm, camera.position, camera.heading(), now);
        let plan = scene.plan(&hunt, &particles, &view(&camera, now));
        assert!(plan.world.is_some());
        assert_eq!(plan.overlay.draws.len(), 1);

        hunt.handle(GameInput::ToggleHelp, camera.position, camera.heading(), now);
        let plan = scene.plan(&hunt, &particles, &view(&camera, now));
        assert!(plan.world.is_none());
        assert_eq!(plan.overlay.draws, scene.help);
    }

    #[test]
    fn test_visible_eggs_are_drawn_unlit() {
        let level = Level::embedded().unwrap();
        let scene = scene(&level);
        let now = Instant::now();
        let mut hunt = Hunt::new(&level, 10.0, now);
        hunt.handle(GameInput::Confirm, Vec3::ZERO, Vec3::Z, now);
        let particles = ParticleSystem::new(EmitterDef::glitter(), 5.0);

        let egg = Vec3::from(level.eggs[0].position);
        let camera = Camera::from_heading(egg - Vec3::new(0.0, -25.0, 200.0), Vec3::Z);
        hunt.animate(now, &Frustum::from_view_proj(&camera.view_proj(16.0 / 9.0)));

        let plan = scene.plan(&hunt, &particles, &view(&camera, now));
        let world = plan.world.unwrap();
        let eggs: Vec<&DrawCall> = world.draws.iter().filter(|d| d.mesh == scene.egg_mesh).collect();
        assert_eq!(eggs.len(), hunt.eggs().visible().count());
        assert!(!eggs.is_empty());
        assert!(eggs.iter().all(|d| d.lighting == Lighting::Unlit));
    }

    #[test]
    fn test_hud_icons_step_left() {
        let level = Level::embedded().unwrap();
        let scene = scene(&level);
        let hud = scene.hud(3);
        assert_eq!(hud.len(), 4);
        let xs: Vec<f32> = hud[1..]
            .iter()
            .map(|d| d.transform.transform_point3(Vec3::ZERO).x)
            .collect();
        for (k, x) in xs.iter().enumerate() {
            let expected = 6.8 - 0.8 * (k + 1) as f32;
            assert!((x - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_particles_become_translucent_billboards() {
        let level = Level::embedded().unwrap();
        let scene = scene(&level);
        let now = Instant::now();
        let mut hunt = Hunt::new(&level, 10.0, now);
        hunt.handle(GameInput::Confirm, Vec3::ZERO, Vec3::Z, now);

        let mut particles = ParticleSystem::new(EmitterDef::glitter(), 5.0);
        particles.set_emitting(true);
        particles.update(0.1);
        let camera = Camera::new(Vec3::new(0.0, 0.0, -100.0));

        let plan = scene.plan(&hunt, &particles, &view(&camera, now));
        let quads = plan
            .world
            .unwrap()
            .draws
            .into_iter()
            .filter(|d| d.mesh == MeshId(0))
            .count();
        assert_eq!(quads, particles.alive_count());
    }
}
