use std::time::Instant;

use glam::{Vec2, Vec3};
use log::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use crate::config::GameConfig;
use crate::engine::audio::AudioEngine;
use crate::engine::graphics::{Frustum, Renderer};
use crate::engine::input::{GameInput, InputHandler, MoveCommand};
use crate::engine::window::WindowManager;
use crate::error::{GameError, Result};
use crate::game::hunt::{Hunt, HuntEvent};
use crate::game::player::Player;
use crate::game::state::Phase;
use crate::game::world::level::Level;
use crate::game::world::particles::{EmitterDef, ParticleSystem};
use crate::game::world::scene::{Scene, SceneAssets, Sounds, View};

const MUSIC_VOLUME: f32 = 0.7;
const FOOTSTEPS_VOLUME: f32 = 0.75;
const PICKUP_VOLUME: f32 = 1.4;
/// Crickets are heard only near the origin.
const AMBIENCE_RANGE: (f32, f32) = (0.0, 100.0);
/// Longest step the simulation takes after a stall.
const MAX_FRAME_TIME: f32 = 0.1;

/// Everything that exists once the window is up.
struct Session {
    renderer: Renderer,
    audio: AudioEngine,
    scene: Scene,
    sounds: Sounds,
    hunt: Hunt,
    player: Player,
    particles: ParticleSystem,
    last_frame: Instant,
    footsteps_playing: bool,
}

pub struct App {
    config: GameConfig,
    level: Level,
    window_manager: WindowManager,
    input_handler: InputHandler,
    session: Option<Session>,
    fatal: Option<GameError>,
}

impl App {
    pub fn new(config: GameConfig, level: Level) -> Self {
        Self {
            config,
            level,
            window_manager: WindowManager::new(),
            input_handler: InputHandler::new(),
            session: None,
            fatal: None,
        }
    }

    /// The error that stopped the loop, if it did not end with a quit.
    pub fn take_error(&mut self) -> Option<GameError> {
        self.fatal.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: GameError) {
        error!("{e}");
        self.fatal = Some(e);
        event_loop.exit();
    }

    fn start_session(&mut self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let window = self.window_manager.create_window(event_loop, &self.config.window)?;
        let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;

        let mut audio = if self.config.audio.enabled {
            AudioEngine::new(self.config.audio.master_volume)
        } else {
            AudioEngine::silent()
        };
        if !audio.is_enabled() {
            info!("Running without sound");
        }

        let assets = SceneAssets::load(&mut renderer, &mut audio, &self.level, &self.config.assets_dir);
        let now = Instant::now();
        let hunt = Hunt::new(&self.level, assets.egg_radius, now);
        let player = Player::new(
            self.level.start_position(),
            self.level.start_heading(),
            &self.config.controls,
        );
        let particles = ParticleSystem::new(EmitterDef::glitter(), self.level.glitter.scale);

        let sounds = assets.sounds;
        audio.set_volume(sounds.music, MUSIC_VOLUME);
        audio.set_volume(sounds.footsteps, FOOTSTEPS_VOLUME);
        audio.set_volume(sounds.pickup, PICKUP_VOLUME);
        audio.set_position(sounds.ambience, Vec3::ZERO, AMBIENCE_RANGE.0, AMBIENCE_RANGE.1);
        audio.set_listener(player.position());
        audio.play(sounds.music, true);
        audio.play(sounds.ambience, true);

        self.input_handler.handle_window_focus(true, Some(&window));

        Ok(Session {
            renderer,
            audio,
            scene: assets.scene,
            sounds,
            hunt,
            player,
            particles,
            last_frame: now,
            footsteps_playing: false,
        })
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, input: GameInput) {
        let Some(session) = &mut self.session else {
            if input == GameInput::Quit {
                event_loop.exit();
            }
            return;
        };
        let position = session.player.position();
        let heading = session.player.heading();
        for event in session.hunt.handle(input, position, heading, Instant::now()) {
            match event {
                HuntEvent::Started => info!("Entering the meadow"),
                HuntEvent::HelpToggled(shown) => debug!("Help shown: {shown}"),
                HuntEvent::EggCollected { index, .. } => {
                    debug!("Pickup of egg {index}");
                    session.audio.play(session.sounds.pickup, false);
                }
                HuntEvent::Won => info!(
                    "Found all {} eggs in {:.1}s",
                    session.hunt.eggs().len(),
                    session.hunt.elapsed(Instant::now())
                ),
                HuntEvent::Quit => event_loop.exit(),
            }
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = &mut self.session else {
            return;
        };
        if session.hunt.state().should_quit() {
            event_loop.exit();
            return;
        }

        let now = Instant::now();
        let delta_time = now
            .duration_since(session.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_TIME);
        session.last_frame = now;

        let mut mouse_delta = self.input_handler.take_mouse_delta();
        let mut movement = self.input_handler.movement();
        if !session.hunt.state().movement_allowed() {
            mouse_delta = Vec2::ZERO;
            movement = MoveCommand::default();
        }
        session.player.update(delta_time, movement, mouse_delta);
        session.update_footsteps(movement.is_moving());
        session.audio.set_listener(session.player.position());

        let aspect = session.renderer.aspect_ratio();
        if session.hunt.phase() == Phase::Play {
            let frustum = Frustum::from_view_proj(&session.player.camera.view_proj(aspect));
            session.hunt.animate(now, &frustum);
        }
        match session.hunt.update_effects(now) {
            Some(origin) => {
                session.particles.set_origin(origin);
                session.particles.set_emitting(true);
                session.particles.update(delta_time);
            }
            None if session.particles.is_emitting() => {
                session.particles.set_emitting(false);
                session.particles.clear();
            }
            None => {}
        }

        let view = View {
            camera: &session.player.camera,
            aspect,
            now,
        };
        let plan = session.scene.plan(&session.hunt, &session.particles, &view);
        match session.renderer.render(&plan) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost or outdated, reconfiguring");
                session.renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => warn!("Surface timeout, skipping frame"),
            // Out of memory
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl Session {
    fn update_footsteps(&mut self, walking: bool) {
        if walking == self.footsteps_playing {
            return;
        }
        if walking {
            self.audio.play(self.sounds.footsteps, true);
        } else {
            self.audio.stop(self.sounds.footsteps);
        }
        self.footsteps_playing = walking;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match self.start_session(event_loop) {
            Ok(session) => {
                self.session = Some(session);
                self.window_manager.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(session) = &mut self.session {
                    session.hunt.request_quit();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                self.window_manager.request_redraw();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(session) = &mut self.session {
                    session.renderer.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    if let Some(input) = self.input_handler.handle_keyboard_input_event(keycode, pressed) {
                        self.dispatch(event_loop, input);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                if let Some(input) = self.input_handler.handle_mouse_button(button, pressed) {
                    self.dispatch(event_loop, input);
                }
            }
            WindowEvent::Focused(focused) => {
                self.input_handler
                    .handle_window_focus(focused, self.window_manager.get_window());
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input_handler.handle_mouse_motion(delta);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &self.session {
            session.audio.stop_all();
            info!(
                "Leaving with {}/{} eggs",
                session.hunt.eggs().collected(),
                session.hunt.eggs().len()
            );
        }
    }
}
