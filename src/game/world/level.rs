//! Level description loaded from RON: asset tables, prop placements, scatter
//! groups, eggs and screens.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec3};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::graphics::{BlendMode, Lighting};
use crate::error::{GameError, Result};

const EMBEDDED_LEVEL: &str = include_str!("../../../assets/level.ron");
/// Longest glitter effect a level may ask for, in seconds.
pub const MAX_GLITTER_DURATION: f32 = 60.0;

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn unit_speed() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartPoint {
    pub position: [f32; 3],
    pub heading: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureSource {
    pub image: PathBuf,
    /// Grayscale image whose brightness becomes the alpha channel.
    #[serde(default)]
    pub alpha: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSources {
    pub music: PathBuf,
    pub ambience: PathBuf,
    pub footsteps: PathBuf,
    pub pickup: PathBuf,
}

/// One model instance in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub model: String,
    pub texture: String,
    pub position: [f32; 3],
    /// Degrees about the vertical axis.
    #[serde(default)]
    pub rotation_y: f32,
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub blend: BlendMode,
    #[serde(default)]
    pub lighting: Lighting,
}

impl Placement {
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_rotation_y(self.rotation_y.to_radians()),
            Vec3::from(self.position),
        )
    }
}

/// `count` copies of a model at random spots inside an x/z rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterGroup {
    pub model: String,
    pub texture: String,
    pub count: usize,
    pub x: (f32, f32),
    pub y: f32,
    pub z: (f32, f32),
    pub scale: f32,
    #[serde(default)]
    pub rotation_y: f32,
    #[serde(default)]
    pub blend: BlendMode,
    #[serde(default)]
    pub lighting: Lighting,
}

impl ScatterGroup {
    fn expand(&self, rng: &mut StdRng) -> impl Iterator<Item = Placement> + '_ {
        let positions: Vec<[f32; 3]> = (0..self.count)
            .map(|_| {
                let x = rng.gen_range(self.x.0.min(self.x.1)..=self.x.0.max(self.x.1));
                let z = rng.gen_range(self.z.0.min(self.z.1)..=self.z.0.max(self.z.1));
                [x, self.y, z]
            })
            .collect();

        positions.into_iter().map(move |position| Placement {
            model: self.model.clone(),
            texture: self.texture.clone(),
            position,
            rotation_y: self.rotation_y,
            scale: [self.scale; 3],
            blend: self.blend,
            lighting: self.lighting,
        })
    }
}

/// How eggs look and move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EggModel {
    pub model: String,
    pub texture: String,
    pub scale: f32,
    /// Fixed lean in degrees.
    pub tilt: f32,
    /// How far above its base height an egg rises at the top of its bob.
    pub bob_height: f32,
    /// Offset from the bob height to the pickup sphere center.
    pub sphere_lift: f32,
    /// Degrees of spin per second.
    pub spin_rate: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EggSpawn {
    pub position: [f32; 3],
    #[serde(default = "unit_speed")]
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlitterParams {
    pub texture: String,
    /// Height above the egg's bob height.
    pub lift: f32,
    pub scale: f32,
    /// Seconds the effect stays active after a pickup.
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenPair {
    pub left: Placement,
    pub right: Placement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screens {
    pub title: ScreenPair,
    pub help: ScreenPair,
    pub game_over: ScreenPair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub crosshair: Placement,
    /// Position of the slot before the first icon.
    pub egg_icon: Placement,
    /// X offset between icons.
    pub icon_spacing: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub seed: u64,
    pub start: StartPoint,
    pub light_direction: [f32; 3],
    pub pickup_distance: f32,
    pub models: BTreeMap<String, PathBuf>,
    pub textures: BTreeMap<String, TextureSource>,
    pub sounds: SoundSources,
    pub sky: Placement,
    pub ground: Placement,
    #[serde(default)]
    pub props: Vec<Placement>,
    #[serde(default)]
    pub scatter: Vec<ScatterGroup>,
    pub egg: EggModel,
    pub eggs: Vec<EggSpawn>,
    pub glitter: GlitterParams,
    pub screens: Screens,
    pub hud: Hud,
}

impl Level {
    /// Parses and validates a level document.
    pub fn from_ron(source: &str) -> Result<Self> {
        let level: Level = ron::from_str(source)?;
        level.validate()?;
        Ok(level)
    }

    /// The meadow level compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_ron(EMBEDDED_LEVEL)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let level = Self::from_ron(&source)?;
        info!("Loaded level '{}' from {}", level.name, path.display());
        Ok(level)
    }

    /// Every hand-placed or overlay placement, for reference checks.
    fn placements(&self) -> impl Iterator<Item = &Placement> {
        [&self.sky, &self.ground]
            .into_iter()
            .chain(self.props.iter())
            .chain([
                &self.screens.title.left,
                &self.screens.title.right,
                &self.screens.help.left,
                &self.screens.help.right,
                &self.screens.game_over.left,
                &self.screens.game_over.right,
                &self.hud.crosshair,
                &self.hud.egg_icon,
            ])
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(GameError::LevelValidation(msg));

        if self.eggs.is_empty() {
            return fail("level has no eggs".to_string());
        }
        if !(self.pickup_distance.is_finite() && self.pickup_distance > 0.0) {
            return fail(format!("pickup distance {} must be positive", self.pickup_distance));
        }
        if !(self.glitter.duration > 0.0 && self.glitter.duration <= MAX_GLITTER_DURATION) {
            return fail(format!(
                "glitter duration {} must be in (0, {MAX_GLITTER_DURATION}]",
                self.glitter.duration
            ));
        }
        if Vec3::from(self.start.heading).length_squared() == 0.0 {
            return fail("start heading must be non-zero".to_string());
        }

        let check_refs = |what: &str, model: &str, texture: &str| -> Result<()> {
            if !self.models.contains_key(model) {
                return Err(GameError::LevelValidation(format!("{what} uses unknown model '{model}'")));
            }
            if !self.textures.contains_key(texture) {
                return Err(GameError::LevelValidation(format!(
                    "{what} uses unknown texture '{texture}'"
                )));
            }
            Ok(())
        };

        for (i, placement) in self.placements().enumerate() {
            check_refs(&format!("placement {i}"), &placement.model, &placement.texture)?;
            let finite = placement.position.iter().chain(placement.scale.iter()).all(|v| v.is_finite())
                && placement.rotation_y.is_finite();
            if !finite {
                return fail(format!("placement {i} ({}) has a non-finite value", placement.model));
            }
        }

        for (i, group) in self.scatter.iter().enumerate() {
            check_refs(&format!("scatter group {i}"), &group.model, &group.texture)?;
            let (x, z) = (group.x, group.z);
            let finite = [x.0, x.1, group.y, z.0, z.1, group.scale].iter().all(|v| v.is_finite());
            if !finite || x.0 > x.1 || z.0 > z.1 {
                return fail(format!("scatter group {i} has an empty or invalid range"));
            }
        }

        check_refs("egg", &self.egg.model, &self.egg.texture)?;
        if !self.textures.contains_key(&self.glitter.texture) {
            return fail(format!("glitter uses unknown texture '{}'", self.glitter.texture));
        }
        for (i, egg) in self.eggs.iter().enumerate() {
            if !egg.position.iter().all(|v| v.is_finite()) || !egg.speed.is_finite() {
                return fail(format!("egg {i} has a non-finite value"));
            }
        }
        Ok(())
    }

    /// Expands every scatter group. The same seed always gives the same layout.
    pub fn scatter_placements(&self) -> Vec<Placement> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.scatter
            .iter()
            .flat_map(|group| group.expand(&mut rng).collect::<Vec<_>>())
            .collect()
    }

    pub fn start_position(&self) -> Vec3 {
        Vec3::from(self.start.position)
    }

    pub fn start_heading(&self) -> Vec3 {
        Vec3::from(self.start.heading).normalize_or_zero()
    }

    pub fn light_direction(&self) -> Vec3 {
        Vec3::from(self.light_direction).normalize_or_zero()
    }
}
