//! Software mixer run inside the audio callback.
//!
//! Each loaded sound owns exactly one voice. Playing a sound that is already
//! playing restarts it from the beginning.

use std::collections::HashMap;
use std::sync::Arc;

use super::wav::Clip;
use super::SoundId;

#[derive(Debug, Clone)]
pub enum MixerCommand {
    Load { id: SoundId, clip: Arc<Clip> },
    Play { id: SoundId, looping: bool },
    Stop { id: SoundId },
    StopAll,
    /// Level set by the game, 1.0 is the file's own level.
    SetVolume { id: SoundId, volume: f32 },
    /// Distance attenuation, multiplied with the volume.
    SetGain { id: SoundId, gain: f32 },
}

#[derive(Debug)]
struct Voice {
    clip: Arc<Clip>,
    cursor: usize,
    playing: bool,
    looping: bool,
    volume: f32,
    gain: f32,
}

#[derive(Debug)]
pub struct Mixer {
    voices: HashMap<SoundId, Voice>,
    master_volume: f32,
}

impl Mixer {
    pub fn new(master_volume: f32) -> Self {
        Self {
            voices: HashMap::new(),
            master_volume,
        }
    }

    pub fn apply(&mut self, command: MixerCommand) {
        match command {
            MixerCommand::Load { id, clip } => {
                self.voices.insert(
                    id,
                    Voice {
                        clip,
                        cursor: 0,
                        playing: false,
                        looping: false,
                        volume: 1.0,
                        gain: 1.0,
                    },
                );
            }
            MixerCommand::Play { id, looping } => {
                if let Some(voice) = self.voices.get_mut(&id) {
                    voice.cursor = 0;
                    voice.looping = looping;
                    voice.playing = !voice.clip.frames.is_empty();
                }
            }
            MixerCommand::Stop { id } => {
                if let Some(voice) = self.voices.get_mut(&id) {
                    voice.playing = false;
                }
            }
            MixerCommand::StopAll => {
                for voice in self.voices.values_mut() {
                    voice.playing = false;
                }
            }
            MixerCommand::SetVolume { id, volume } => {
                if let Some(voice) = self.voices.get_mut(&id) {
                    voice.volume = volume.max(0.0);
                }
            }
            MixerCommand::SetGain { id, gain } => {
                if let Some(voice) = self.voices.get_mut(&id) {
                    voice.gain = gain.clamp(0.0, 1.0);
                }
            }
        }
    }

    #[cfg(test)]
    fn is_playing(&self, id: SoundId) -> bool {
        self.voices.get(&id).is_some_and(|v| v.playing)
    }

    /// Mixes all playing voices into an interleaved buffer with `channels`
    /// channels, overwriting its contents.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        out.iter_mut().for_each(|s| *s = 0.0);
        if channels == 0 {
            return;
        }
        let master = self.master_volume;

        for voice in self.voices.values_mut().filter(|v| v.playing) {
            let level = voice.volume * voice.gain * master;
            let len = voice.clip.frames.len();

            for frame in out.chunks_exact_mut(channels) {
                if voice.cursor >= len {
                    if voice.looping {
                        voice.cursor = 0;
                    } else {
                        voice.playing = false;
                        break;
                    }
                }
                let [left, right] = voice.clip.frames[voice.cursor];
                voice.cursor += 1;

                if channels == 1 {
                    frame[0] += (left + right) * 0.5 * level;
                } else {
                    frame[0] += left * level;
                    frame[1] += right * level;
                }
            }
            // A one-shot that ends exactly on the buffer boundary is done too
            if !voice.looping && voice.cursor >= len {
                voice.playing = false;
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(values: &[f32]) -> Arc<Clip> {
        Arc::new(Clip {
            sample_rate: 48_000,
            frames: values.iter().map(|&v| [v, v]).collect(),
        })
    }

    fn mixer_with(id: SoundId, values: &[f32]) -> Mixer {
        let mut mixer = Mixer::new(1.0);
        mixer.apply(MixerCommand::Load { id, clip: clip(values) });
        mixer
    }

    #[test]
    fn test_one_shot_plays_once() {
        let id = SoundId(0);
        let mut mixer = mixer_with(id, &[0.1, 0.2]);
        mixer.apply(MixerCommand::Play { id, looping: false });

        let mut out = [0.0; 8];
        mixer.render(&mut out, 2);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.0, 0.0, 0.0, 0.0]);
        assert!(!mixer.is_playing(id));
    }

    #[test]
    fn test_loop_wraps() {
        let id = SoundId(1);
        let mut mixer = mixer_with(id, &[0.1, 0.2]);
        mixer.apply(MixerCommand::Play { id, looping: true });

        let mut out = [0.0; 5];
        mixer.render(&mut out, 1);
        assert_eq!(out, [0.1, 0.2, 0.1, 0.2, 0.1]);
        assert!(mixer.is_playing(id));
    }

    #[test]
    fn test_replay_restarts() {
        let id = SoundId(2);
        let mut mixer = mixer_with(id, &[0.1, 0.2, 0.3]);
        mixer.apply(MixerCommand::Play { id, looping: false });

        let mut out = [0.0; 2];
        mixer.render(&mut out, 1);
        mixer.apply(MixerCommand::Play { id, looping: false });
        mixer.render(&mut out, 1);
        assert_eq!(out, [0.1, 0.2]);
    }

    #[test]
    fn test_stop_silences() {
        let id = SoundId(3);
        let mut mixer = mixer_with(id, &[0.5; 16]);
        mixer.apply(MixerCommand::Play { id, looping: true });
        mixer.apply(MixerCommand::Stop { id });

        let mut out = [1.0; 4];
        mixer.render(&mut out, 2);
        assert_eq!(out, [0.0; 4]);
        assert!(!mixer.is_playing(id));
    }

    #[test]
    fn test_volume_and_gain_scale() {
        let id = SoundId(4);
        let mut mixer = mixer_with(id, &[0.5; 4]);
        mixer.apply(MixerCommand::SetVolume { id, volume: 0.5 });
        mixer.apply(MixerCommand::SetGain { id, gain: 0.5 });
        mixer.apply(MixerCommand::Play { id, looping: false });

        let mut out = [0.0; 1];
        mixer.render(&mut out, 1);
        assert_eq!(out, [0.125]);
    }

    #[test]
    fn test_output_is_clamped() {
        let a = SoundId(5);
        let b = SoundId(6);
        let mut mixer = mixer_with(a, &[0.9]);
        mixer.apply(MixerCommand::Load { id: b, clip: clip(&[0.9]) });
        mixer.apply(MixerCommand::Play { id: a, looping: false });
        mixer.apply(MixerCommand::Play { id: b, looping: false });

        let mut out = [0.0; 1];
        mixer.render(&mut out, 1);
        assert_eq!(out, [1.0]);
    }

    #[test]
    fn test_empty_clip_never_plays() {
        let id = SoundId(7);
        let mut mixer = mixer_with(id, &[]);
        mixer.apply(MixerCommand::Play { id, looping: true });
        assert!(!mixer.is_playing(id));
    }
}
