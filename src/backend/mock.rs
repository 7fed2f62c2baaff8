use super::{AudioBackend, BackendError, VoiceParams};
use crate::ids::{SoundId, VoiceId};
use std::collections::{HashMap, HashSet};

/// Transport state of a [`MockVoice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockVoiceState {
    Stopped,
    Playing,
    Paused,
    /// Reached the natural end of a non-looping sound.
    Finished,
}

/// Everything the router told the backend about one voice.
#[derive(Debug, Clone)]
pub struct MockVoice {
    pub sound: SoundId,
    pub state: MockVoiceState,
    pub looping: bool,
    pub params: VoiceParams,
    /// Number of loop iterations completed while looping.
    pub loops_completed: u32,
    /// Number of `set_voice_params` calls received.
    pub param_updates: u32,
    /// Parameters held when the voice was first started, `None` until then.
    pub params_at_first_play: Option<VoiceParams>,
}

/// In-memory backend that renders nothing.
///
/// Playback time is simulated explicitly: [`complete_iteration`](Self::complete_iteration)
/// moves every playing voice to the end of its sound. Voice creation can be made
/// to fail to exercise the router's retry path.
#[derive(Debug, Default)]
pub struct MockBackend {
    voices: HashMap<VoiceId, MockVoice>,
    next_voice_id: u64,
    failing_sounds: HashSet<SoundId>,
    fail_next: usize,
    created_total: usize,
    destroyed_total: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `create_voice` fail.
    pub fn fail_next_creations(&mut self, count: usize) {
        self.fail_next = count;
    }

    /// Make every voice creation for `sound` fail until called again with `false`.
    pub fn set_sound_failing(&mut self, sound: SoundId, failing: bool) {
        if failing {
            self.failing_sounds.insert(sound);
        } else {
            self.failing_sounds.remove(&sound);
        }
    }

    pub fn voice(&self, voice: VoiceId) -> Option<&MockVoice> {
        self.voices.get(&voice)
    }

    pub fn voices(&self) -> impl Iterator<Item = (VoiceId, &MockVoice)> {
        self.voices.iter().map(|(id, voice)| (*id, voice))
    }

    pub fn live_voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn playing_voice_count(&self) -> usize {
        self.voices
            .values()
            .filter(|voice| voice.state == MockVoiceState::Playing)
            .count()
    }

    pub fn created_total(&self) -> usize {
        self.created_total
    }

    pub fn destroyed_total(&self) -> usize {
        self.destroyed_total
    }

    /// Let every playing voice reach the end of its sound.
    ///
    /// Looping voices wrap around and keep playing; the others finish.
    pub fn complete_iteration(&mut self) {
        for voice in self.voices.values_mut() {
            if voice.state != MockVoiceState::Playing {
                continue;
            }
            if voice.looping {
                voice.loops_completed += 1;
            } else {
                voice.state = MockVoiceState::Finished;
            }
        }
    }

    /// Force a single voice to its natural end regardless of looping.
    pub fn finish_voice(&mut self, voice: VoiceId) {
        if let Some(voice) = self.voices.get_mut(&voice) {
            voice.state = MockVoiceState::Finished;
        }
    }
}

impl AudioBackend for MockBackend {
    fn create_voice(&mut self, sound: SoundId) -> Result<VoiceId, BackendError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(BackendError::VoiceCreation(format!(
                "mock failure for {}",
                sound
            )));
        }
        if self.failing_sounds.contains(&sound) {
            return Err(BackendError::UnknownSound(sound));
        }

        let id = VoiceId(self.next_voice_id);
        self.next_voice_id += 1;
        self.created_total += 1;
        self.voices.insert(
            id,
            MockVoice {
                sound,
                state: MockVoiceState::Stopped,
                looping: false,
                params: VoiceParams::default(),
                loops_completed: 0,
                param_updates: 0,
                params_at_first_play: None,
            },
        );
        Ok(id)
    }

    fn destroy_voice(&mut self, voice: VoiceId) {
        if self.voices.remove(&voice).is_some() {
            self.destroyed_total += 1;
        } else {
            log::warn!("MockBackend: destroy of unknown voice {}", voice);
        }
    }

    fn set_voice_params(&mut self, voice: VoiceId, params: VoiceParams) {
        if let Some(voice) = self.voices.get_mut(&voice) {
            voice.params = params;
            voice.param_updates += 1;
        }
    }

    fn set_voice_loop(&mut self, voice: VoiceId, looping: bool) {
        if let Some(voice) = self.voices.get_mut(&voice) {
            voice.looping = looping;
        }
    }

    fn play(&mut self, voice: VoiceId) {
        if let Some(voice) = self.voices.get_mut(&voice) {
            voice.state = MockVoiceState::Playing;
            voice.params_at_first_play.get_or_insert(voice.params);
        }
    }

    fn pause(&mut self, voice: VoiceId) {
        if let Some(voice) = self.voices.get_mut(&voice) {
            if voice.state == MockVoiceState::Playing {
                voice.state = MockVoiceState::Paused;
            }
        }
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(voice) = self.voices.get_mut(&voice) {
            voice.state = MockVoiceState::Stopped;
        }
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        self.voices
            .get(&voice)
            .is_some_and(|voice| voice.state == MockVoiceState::Finished)
    }
}
