//! Contract of the native audio backend.
//!
//! The router decides which voices must exist and with what spatialization; the
//! backend owns decoding, mixing and device output. Every call here is expected
//! to be safe to issue from the simulation thread while the backend renders on
//! its own thread.

pub mod mock;

use crate::ids::{SoundId, VoiceId};
use thiserror::Error;

pub use mock::{MockBackend, MockVoice, MockVoiceState};

/// Errors reported by a backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Voice creation failed: {0}")]
    VoiceCreation(String),

    #[error("Unknown sound: {0}")]
    UnknownSound(SoundId),

    #[error("Backend error: {0}")]
    Other(String),
}

/// Spatialization parameters pushed to a live voice every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    /// Stereo pan, -1.0 = full left, 1.0 = full right.
    pub pan: f32,
    /// Linear gain, controller volume times distance attenuation.
    pub gain: f32,
    /// Playback rate ratio carrying the Doppler shift, 1.0 = unchanged.
    pub pitch: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            pan: 0.0,
            gain: 1.0,
            pitch: 1.0,
        }
    }
}

/// The native backend as seen by the router.
///
/// A freshly created voice is stopped at the start of its sound with looping off.
pub trait AudioBackend {
    fn create_voice(&mut self, sound: SoundId) -> Result<VoiceId, BackendError>;
    fn destroy_voice(&mut self, voice: VoiceId);
    fn set_voice_params(&mut self, voice: VoiceId, params: VoiceParams);
    fn set_voice_loop(&mut self, voice: VoiceId, looping: bool);
    fn play(&mut self, voice: VoiceId);
    fn pause(&mut self, voice: VoiceId);
    fn stop(&mut self, voice: VoiceId);
    /// True once a non-looping voice has reached the natural end of its sound.
    fn is_finished(&self, voice: VoiceId) -> bool;
}
