//! Eggs: placement, bobbing animation, visibility and pickup.

use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};
use log::debug;

use crate::engine::graphics::Frustum;
use crate::game::world::geometry::{planar_distance, Ray, Sphere};
use crate::game::world::level::{Level, MAX_GLITTER_DURATION};

/// Shape and timing shared by every egg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EggParams {
    pub scale: f32,
    /// Degrees of lean about the x axis.
    pub tilt: f32,
    pub bob_height: f32,
    pub sphere_lift: f32,
    /// Degrees per second at speed 1.0.
    pub spin_rate: f32,
    /// World-space radius of the pickup sphere.
    pub sphere_radius: f32,
    pub pickup_distance: f32,
    pub glitter_lift: f32,
    pub effect_duration: Duration,
}

impl EggParams {
    /// Takes the egg model's own bounding radius; the pickup sphere is that
    /// radius times the egg scale.
    pub fn from_level(level: &Level, model_radius: f32) -> Self {
        Self {
            scale: level.egg.scale,
            tilt: level.egg.tilt,
            bob_height: level.egg.bob_height,
            sphere_lift: level.egg.sphere_lift,
            spin_rate: level.egg.spin_rate,
            sphere_radius: model_radius * level.egg.scale,
            pickup_distance: level.pickup_distance,
            glitter_lift: level.glitter.lift,
            effect_duration: Duration::try_from_secs_f32(
                level.glitter.duration.clamp(0.0, MAX_GLITTER_DURATION),
            )
            .unwrap_or(Duration::ZERO),
        }
    }

    /// Pickup sphere of an egg at its current bob height.
    fn sphere(&self, egg: &Egg) -> Sphere {
        let center = Vec3::new(egg.position.x, egg.bob_y + self.sphere_lift, egg.position.z);
        Sphere::new(center, self.sphere_radius)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Egg {
    pub position: Vec3,
    pub speed: f32,
    /// Current height, between `position.y` and `position.y + bob_height`.
    pub bob_y: f32,
    pub present: bool,
    /// Whether the egg passed the frustum test in the last animation step.
    pub on_screen: bool,
    /// Set on pickup; cleared for good once the effect has run its course.
    pub effect_started: Option<Instant>,
}

impl Egg {
    fn new(position: Vec3, speed: f32) -> Self {
        Self {
            position,
            speed,
            bob_y: position.y,
            present: true,
            on_screen: false,
            effect_started: None,
        }
    }
}

pub struct EggField {
    eggs: Vec<Egg>,
    params: EggParams,
    collected: usize,
    /// Indices in pickup order.
    pickup_order: Vec<usize>,
}

impl EggField {
    pub fn new(level: &Level, params: EggParams) -> Self {
        let eggs = level
            .eggs
            .iter()
            .map(|spawn| Egg::new(Vec3::from(spawn.position), spawn.speed))
            .collect();
        Self {
            eggs,
            params,
            collected: 0,
            pickup_order: Vec::new(),
        }
    }

    pub fn params(&self) -> &EggParams {
        &self.params
    }

    pub fn eggs(&self) -> &[Egg] {
        &self.eggs
    }

    pub fn len(&self) -> usize {
        self.eggs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eggs.is_empty()
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn remaining(&self) -> usize {
        self.eggs.iter().filter(|e| e.present).count()
    }

    pub fn all_collected(&self) -> bool {
        self.collected == self.eggs.len()
    }

    fn sphere(&self, egg: &Egg) -> Sphere {
        self.params.sphere(egg)
    }

    /// Moves every present egg to its bob height for `t` seconds since the
    /// level started and records which of them are inside the frustum.
    pub fn animate(&mut self, t: f32, frustum: &Frustum) {
        let params = self.params;
        for egg in &mut self.eggs {
            if !egg.present {
                egg.on_screen = false;
                continue;
            }
            let alpha = (t * egg.speed).sin() * 0.5 + 0.5;
            egg.bob_y = egg.position.y + params.bob_height * alpha;
            let sphere = params.sphere(egg);
            egg.on_screen = frustum.sphere_visible(sphere.center, sphere.radius);
        }
    }

    /// Present, on-screen eggs within pickup range of `player`.
    pub fn candidates(&self, player: Vec3) -> impl Iterator<Item = usize> + '_ {
        self.eggs.iter().enumerate().filter_map(move |(i, egg)| {
            let in_range = planar_distance(player, egg.position) <= self.params.pickup_distance;
            (egg.present && egg.on_screen && in_range).then_some(i)
        })
    }

    /// Collects every candidate egg the ray passes through. All eggs are
    /// tested, so two eggs on one line are both taken.
    pub fn try_pickup(&mut self, ray: &Ray, player: Vec3, now: Instant) -> Vec<usize> {
        let hits: Vec<usize> = self
            .candidates(player)
            .filter(|&i| ray.intersect_sphere(&self.sphere(&self.eggs[i])).is_some())
            .collect();

        for &i in &hits {
            let egg = &mut self.eggs[i];
            egg.present = false;
            egg.on_screen = false;
            egg.effect_started = Some(now);
            self.collected += 1;
            self.pickup_order.push(i);
            debug!("Collected egg {i} ({}/{})", self.collected, self.eggs.len());
        }
        hits
    }

    pub fn is_effect_active(&self, index: usize, now: Instant) -> bool {
        self.eggs
            .get(index)
            .and_then(|egg| egg.effect_started)
            .is_some_and(|start| now.saturating_duration_since(start) < self.params.effect_duration)
    }

    /// Clears effects whose time is up. They never restart.
    pub fn expire_effects(&mut self, now: Instant) {
        let duration = self.params.effect_duration;
        for egg in &mut self.eggs {
            if egg
                .effect_started
                .is_some_and(|start| now.saturating_duration_since(start) >= duration)
            {
                egg.effect_started = None;
            }
        }
    }

    /// Where the shared glitter belongs: above the most recently collected
    /// egg whose effect is still running.
    pub fn effect_origin(&self, now: Instant) -> Option<Vec3> {
        self.pickup_order
            .iter()
            .rev()
            .find(|&&i| self.is_effect_active(i, now))
            .map(|&i| {
                let egg = &self.eggs[i];
                Vec3::new(egg.position.x, egg.bob_y + self.params.glitter_lift, egg.position.z)
            })
    }

    /// Model matrix for an egg at `t` seconds: scale, spin, tilt, then move.
    pub fn transform(&self, egg: &Egg, t: f32) -> Mat4 {
        let spin = (t * self.params.spin_rate * egg.speed).to_radians();
        Mat4::from_translation(Vec3::new(egg.position.x, egg.bob_y, egg.position.z))
            * Mat4::from_rotation_x(self.params.tilt.to_radians())
            * Mat4::from_rotation_y(spin)
            * Mat4::from_scale(Vec3::splat(self.params.scale))
    }

    /// Eggs to draw this frame.
    pub fn visible(&self) -> impl Iterator<Item = &Egg> {
        self.eggs.iter().filter(|e| e.present && e.on_screen)
    }
}
