//! Glitter shown where an egg was picked up.
//!
//! A fixed-size pool of particles fed by one emitter. Moving the emitter only
//! changes where new particles appear; live ones keep their own positions.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maximum number of live particles
pub const MAX_PARTICLES: usize = 128;

#[derive(Debug, Clone, Copy, Default)]
pub struct Particle {
    /// World position
    pub position: Vec3,
    /// Units per second
    pub velocity: Vec3,
    /// Remaining life in seconds
    pub life: f32,
    pub max_life: f32,
    pub alive: bool,
}

impl Particle {
    /// 1.0 when just spawned, falling to 0.0 at the end of its life.
    pub fn opacity(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

/// Emitter settings in effect-local units, multiplied by the system scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterDef {
    /// Particles per second
    pub spawn_rate: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Half-angle of the upward cone, radians
    pub spread: f32,
    pub gravity: f32,
    pub life_min: f32,
    pub life_max: f32,
    /// Billboard edge length
    pub size: f32,
}

impl EmitterDef {
    pub fn glitter() -> Self {
        Self {
            spawn_rate: 60.0,
            speed_min: 2.0,
            speed_max: 6.0,
            spread: 0.7,
            gravity: 4.0,
            life_min: 0.3,
            life_max: 0.8,
            size: 0.6,
        }
    }
}

pub struct ParticleSystem {
    def: EmitterDef,
    particles: Vec<Particle>,
    origin: Vec3,
    scale: f32,
    emitting: bool,
    spawn_accumulator: f32,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new(def: EmitterDef, scale: f32) -> Self {
        Self {
            def,
            particles: vec![Particle::default(); MAX_PARTICLES],
            origin: Vec3::ZERO,
            scale,
            emitting: false,
            spawn_accumulator: 0.0,
            rng: StdRng::seed_from_u64(0x6c17_7e25),
        }
    }

    pub fn set_origin(&mut self, origin: Vec3) {
        self.origin = origin;
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn set_emitting(&mut self, emitting: bool) {
        if !emitting {
            self.spawn_accumulator = 0.0;
        }
        self.emitting = emitting;
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// World-space edge length of one particle billboard.
    pub fn particle_size(&self) -> f32 {
        self.def.size * self.scale
    }

    fn spawn_one(&mut self) {
        let Some(idx) = self.particles.iter().position(|p| !p.alive) else {
            return;
        };
        let def = self.def;
        let speed = self.rng.gen_range(def.speed_min..=def.speed_max) * self.scale;
        let life = self.rng.gen_range(def.life_min..=def.life_max);
        let theta = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let phi = self.rng.gen_range(0.0..=def.spread);

        let sin_phi = phi.sin();
        let velocity = Vec3::new(
            sin_phi * theta.cos() * speed,
            phi.cos() * speed,
            sin_phi * theta.sin() * speed,
        );

        self.particles[idx] = Particle {
            position: self.origin,
            velocity,
            life,
            max_life: life,
            alive: true,
        };
    }

    pub fn update(&mut self, delta_time: f32) {
        if self.emitting {
            self.spawn_accumulator += self.def.spawn_rate * delta_time;
            while self.spawn_accumulator >= 1.0 {
                self.spawn_accumulator -= 1.0;
                self.spawn_one();
            }
        }

        let gravity = self.def.gravity * self.scale;
        for particle in self.particles.iter_mut().filter(|p| p.alive) {
            particle.life -= delta_time;
            if particle.life <= 0.0 {
                particle.alive = false;
                continue;
            }
            particle.velocity.y -= gravity * delta_time;
            particle.position += particle.velocity * delta_time;
        }
    }

    pub fn alive(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    pub fn clear(&mut self) {
        for p in &mut self.particles {
            p.alive = false;
        }
        self.spawn_accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_system_spawns_nothing() {
        let mut system = ParticleSystem::new(EmitterDef::glitter(), 5.0);
        system.update(0.5);
        assert_eq!(system.alive_count(), 0);
    }

    #[test]
    fn test_spawn_rate() {
        let mut system = ParticleSystem::new(EmitterDef::glitter(), 5.0);
        system.set_emitting(true);
        // 60 per second, all still alive after 0.1s
        system.update(0.1);
        assert_eq!(system.alive_count(), 6);
    }

    #[test]
    fn test_particles_die_after_stopping() {
        let mut system = ParticleSystem::new(EmitterDef::glitter(), 5.0);
        system.set_emitting(true);
        system.update(0.2);
        system.set_emitting(false);
        for _ in 0..10 {
            system.update(0.1);
        }
        assert_eq!(system.alive_count(), 0);
    }

    #[test]
    fn test_pool_is_bounded() {
        let def = EmitterDef {
            spawn_rate: 10_000.0,
            life_min: 5.0,
            life_max: 5.0,
            ..EmitterDef::glitter()
        };
        let mut system = ParticleSystem::new(def, 1.0);
        system.set_emitting(true);
        system.update(1.0);
        assert_eq!(system.alive_count(), MAX_PARTICLES);
    }

    #[test]
    fn test_live_particles_stay_when_emitter_moves() {
        let mut system = ParticleSystem::new(EmitterDef::glitter(), 5.0);
        system.set_origin(Vec3::new(100.0, 0.0, 0.0));
        system.set_emitting(true);
        system.update(0.05);
        system.set_emitting(false);
        system.set_origin(Vec3::new(-100.0, 0.0, 0.0));
        system.update(0.01);
        assert!(system.alive().all(|p| p.position.x > 50.0));
    }

    #[test]
    fn test_opacity_fades() {
        let particle = Particle {
            life: 0.25,
            max_life: 1.0,
            alive: true,
            ..Default::default()
        };
        assert_eq!(particle.opacity(), 0.25);
    }
}
