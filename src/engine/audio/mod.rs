//! Sound output.
//!
//! The game thread sends `MixerCommand`s over a channel; the cpal callback
//! drains them and mixes. When no output device is available the engine
//! keeps accepting calls and plays nothing.

pub mod mixer;
pub mod wav;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use crossbeam_channel::{Receiver, Sender};
use glam::Vec3;
use log::{debug, info, warn};

use crate::error::{GameError, Result};
use mixer::{Mixer, MixerCommand};
use wav::Clip;

/// Handle to a sound loaded with `AudioEngine::load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub usize);

/// Rate used for decoding when there is no output stream.
const FALLBACK_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy)]
struct Emitter {
    position: Vec3,
    min_distance: f32,
    max_distance: f32,
}

/// Linear fall-off: full level inside `min_distance`, silent beyond `max_distance`.
pub fn distance_gain(distance: f32, min_distance: f32, max_distance: f32) -> f32 {
    if distance <= min_distance {
        1.0
    } else if distance >= max_distance {
        0.0
    } else {
        1.0 - (distance - min_distance) / (max_distance - min_distance)
    }
}

pub struct AudioEngine {
    sender: Option<Sender<MixerCommand>>,
    _stream: Option<cpal::Stream>,
    sample_rate: u32,
    next_id: usize,
    emitters: HashMap<SoundId, Emitter>,
}

impl AudioEngine {
    /// Opens the default output device. Any failure leaves a silent engine.
    pub fn new(master_volume: f32) -> Self {
        match open_stream(master_volume) {
            Ok((stream, sender, sample_rate)) => {
                info!("Audio output running at {sample_rate} Hz");
                Self {
                    sender: Some(sender),
                    _stream: Some(stream),
                    sample_rate,
                    next_id: 0,
                    emitters: HashMap::new(),
                }
            }
            Err(e) => {
                warn!("{e}; continuing without sound");
                Self::silent()
            }
        }
    }

    pub fn silent() -> Self {
        Self {
            sender: None,
            _stream: None,
            sample_rate: FALLBACK_SAMPLE_RATE,
            next_id: 0,
            emitters: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    fn send(&self, command: MixerCommand) {
        if let Some(sender) = &self.sender {
            // Only fails once the stream is gone
            let _ = sender.send(command);
        }
    }

    /// Decodes a WAV file and hands it to the mixer at the output rate.
    pub fn load(&mut self, path: &Path) -> Result<SoundId> {
        let bytes = fs::read(path).map_err(|e| GameError::Sound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let clip = wav::decode(&bytes).map_err(|e| GameError::Sound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(
            "Decoded {} ({:.2}s at {} Hz)",
            path.display(),
            clip.duration_secs(),
            clip.sample_rate
        );
        Ok(self.add_clip(clip.resample(self.sample_rate)))
    }

    /// Registers a sound that never makes noise, for files that failed to load.
    pub fn load_silent(&mut self) -> SoundId {
        self.add_clip(Clip::silent(self.sample_rate))
    }

    fn add_clip(&mut self, clip: Clip) -> SoundId {
        let id = SoundId(self.next_id);
        self.next_id += 1;
        self.send(MixerCommand::Load {
            id,
            clip: Arc::new(clip),
        });
        id
    }

    /// Starts the sound from the beginning, restarting it if it is already playing.
    pub fn play(&self, id: SoundId, looping: bool) {
        self.send(MixerCommand::Play { id, looping });
    }

    pub fn stop(&self, id: SoundId) {
        self.send(MixerCommand::Stop { id });
    }

    pub fn stop_all(&self) {
        self.send(MixerCommand::StopAll);
    }

    pub fn set_volume(&self, id: SoundId, volume: f32) {
        self.send(MixerCommand::SetVolume { id, volume });
    }

    /// Places a sound in the world; its level then follows the listener distance.
    pub fn set_position(&mut self, id: SoundId, position: Vec3, min_distance: f32, max_distance: f32) {
        self.emitters.insert(
            id,
            Emitter {
                position,
                min_distance,
                max_distance,
            },
        );
    }

    pub fn set_listener(&self, listener: Vec3) {
        for (&id, emitter) in &self.emitters {
            let gain = distance_gain(
                listener.distance(emitter.position),
                emitter.min_distance,
                emitter.max_distance,
            );
            self.send(MixerCommand::SetGain { id, gain });
        }
    }
}

fn open_stream(master_volume: f32) -> Result<(cpal::Stream, Sender<MixerCommand>, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| GameError::Audio("no output device".to_string()))?;
    let supported = device
        .default_output_config()
        .map_err(|e| GameError::Audio(e.to_string()))?;

    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;
    let (sender, receiver) = crossbeam_channel::unbounded();
    let mixer = Mixer::new(master_volume);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer, receiver),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer, receiver),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer, receiver),
        other => return Err(GameError::Audio(format!("unsupported sample format {other:?}"))),
    }?;
    stream.play().map_err(|e| GameError::Audio(e.to_string()))?;

    Ok((stream, sender, sample_rate))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut mixer: Mixer,
    receiver: Receiver<MixerCommand>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for command in receiver.try_iter() {
                    mixer.apply(command);
                }
                scratch.resize(data.len(), 0.0);
                mixer.render(&mut scratch, channels);
                for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(sample);
                }
            },
            |err| warn!("Audio stream error: {err}"),
            None,
        )
        .map_err(|e| GameError::Audio(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_gain() {
        assert_eq!(distance_gain(0.0, 0.0, 100.0), 1.0);
        assert_eq!(distance_gain(50.0, 0.0, 100.0), 0.5);
        assert_eq!(distance_gain(100.0, 0.0, 100.0), 0.0);
        assert_eq!(distance_gain(5000.0, 0.0, 100.0), 0.0);
        assert_eq!(distance_gain(5.0, 10.0, 100.0), 1.0);
    }

    #[test]
    fn test_silent_engine_accepts_calls() {
        let mut engine = AudioEngine::silent();
        let id = engine.load_silent();
        engine.play(id, true);
        engine.set_volume(id, 0.7);
        engine.set_position(id, Vec3::ZERO, 0.0, 100.0);
        engine.set_listener(Vec3::new(10.0, 0.0, 0.0));
        engine.stop_all();
        assert!(!engine.is_enabled());
        assert_ne!(engine.load_silent(), id);
    }

    #[test]
    fn test_missing_file_is_sound_error() {
        let mut engine = AudioEngine::silent();
        let err = engine.load(Path::new("no/such/sound.wav")).unwrap_err();
        assert!(matches!(err, GameError::Sound { .. }));
    }

    #[test]
    fn test_load_wav_from_disk() {
        let path = std::env::temp_dir().join(format!("egg_hunt_test_{}.wav", std::process::id()));
        fs::write(&path, wav::tests::wav_bytes(1, 16, 44_100, &[0, 0, 0, 64])).unwrap();

        let mut engine = AudioEngine::silent();
        let loaded = engine.load(&path);
        let _ = fs::remove_file(&path);
        assert!(loaded.is_ok());
    }
}
