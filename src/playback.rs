//! Playback control and state management.
//!
//! This module provides the per-(emitter, sound) playback handle and its state machine:
//! - [`PlayState`]: Playback state (playing, paused, stopped)
//! - [`SoundController`]: Intent, looping, volume and spatial settings of one named sound
//! - [`PlaybackCommand`]: Transport commands queued until the next commit (internal)
//!
//! Users drive controllers through [`AudioRouter`](crate::AudioRouter) methods like
//! `play()`, `pause()` and `stop()`. Those update the controller's intent right away
//! but only reach the voices during the next [`update`](crate::AudioRouter::update).

use crate::config::SpatialSettings;
use crate::error::{Result, RouterError};
use crate::ids::{ControllerId, EntityId, SoundId};

/// Playback state of a sound controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    /// Audio is currently playing
    Playing,
    /// Audio is paused (voices retain their position)
    Paused,
    /// Audio is stopped (no voices)
    #[default]
    Stopped,
}

/// Transport commands recorded by the public API and applied to voices at commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    /// Resume every existing voice of the controller
    Play(ControllerId),
    /// Suspend every voice of the controller
    Pause(ControllerId),
    /// Stop and destroy every voice of the controller
    Stop(ControllerId),
    /// Let the current loop iteration be the last one
    ExitLoop(ControllerId),
    /// Forward a looping change to existing (paused) voices
    SetLooping(ControllerId, bool),
}

impl PlaybackCommand {
    pub fn controller(&self) -> ControllerId {
        match self {
            Self::Play(id)
            | Self::Pause(id)
            | Self::Stop(id)
            | Self::ExitLoop(id)
            | Self::SetLooping(id, _) => *id,
        }
    }
}

/// Playback handle for one named sound of one emitter.
///
/// Created lazily by [`AudioRouter::sound_controller`](crate::AudioRouter::sound_controller)
/// and dropped together with its emitter.
#[derive(Debug, Clone)]
pub struct SoundController {
    id: ControllerId,
    emitter: EntityId,
    sound_name: String,
    sound: SoundId,
    intent: PlayState,
    /// Intent as applied by the last commit
    committed: PlayState,
    looping: bool,
    volume: f32,
    exit_loop_requested: bool,
    spatial: SpatialSettings,
}

impl SoundController {
    pub(crate) fn new(
        id: ControllerId,
        emitter: EntityId,
        sound_name: impl Into<String>,
        sound: SoundId,
        spatial: SpatialSettings,
    ) -> Self {
        Self {
            id,
            emitter,
            sound_name: sound_name.into(),
            sound,
            intent: PlayState::Stopped,
            committed: PlayState::Stopped,
            looping: false,
            volume: 1.0,
            exit_loop_requested: false,
            spatial,
        }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn emitter(&self) -> EntityId {
        self.emitter
    }

    pub fn sound_name(&self) -> &str {
        &self.sound_name
    }

    pub fn sound(&self) -> SoundId {
        self.sound
    }

    /// The most recently requested state, not yet necessarily committed.
    pub fn intent_state(&self) -> PlayState {
        self.intent
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn exit_loop_requested(&self) -> bool {
        self.exit_loop_requested
    }

    pub fn spatial_settings(&self) -> SpatialSettings {
        self.spatial
    }

    pub(crate) fn committed_state(&self) -> PlayState {
        self.committed
    }

    /// Whether a voice of this controller should loop at the backend.
    pub(crate) fn voice_loops(&self) -> bool {
        self.looping && !self.exit_loop_requested
    }

    pub(crate) fn set_sound(&mut self, sound: SoundId) {
        self.sound = sound;
    }

    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    pub(crate) fn set_spatial_settings(&mut self, spatial: SpatialSettings) {
        self.spatial = spatial;
    }

    pub(crate) fn play(&mut self) -> Option<PlaybackCommand> {
        match self.intent {
            PlayState::Playing => None,
            PlayState::Paused => {
                log::debug!("Controller {} resuming", self.id);
                self.intent = PlayState::Playing;
                Some(PlaybackCommand::Play(self.id))
            }
            PlayState::Stopped => {
                log::debug!(
                    "Controller {} playing '{}' (looping: {})",
                    self.id,
                    self.sound_name,
                    self.looping
                );
                self.intent = PlayState::Playing;
                self.exit_loop_requested = false;
                Some(PlaybackCommand::Play(self.id))
            }
        }
    }

    pub(crate) fn pause(&mut self) -> Option<PlaybackCommand> {
        if self.intent != PlayState::Playing {
            return None;
        }
        log::debug!("Controller {} paused", self.id);
        self.intent = PlayState::Paused;
        Some(PlaybackCommand::Pause(self.id))
    }

    pub(crate) fn stop(&mut self) -> Option<PlaybackCommand> {
        if self.intent == PlayState::Stopped {
            return None;
        }
        log::debug!("Controller {} stopped", self.id);
        self.intent = PlayState::Stopped;
        Some(PlaybackCommand::Stop(self.id))
    }

    pub(crate) fn exit_loop(&mut self) -> Option<PlaybackCommand> {
        if self.intent == PlayState::Stopped || !self.looping || self.exit_loop_requested {
            return None;
        }
        log::debug!("Controller {} will stop at the end of its loop", self.id);
        self.exit_loop_requested = true;
        Some(PlaybackCommand::ExitLoop(self.id))
    }

    pub(crate) fn set_looping(&mut self, looping: bool) -> Result<Option<PlaybackCommand>> {
        if self.intent == PlayState::Playing {
            return Err(RouterError::InvalidState(format!(
                "cannot change looping of {} while it is playing",
                self.id
            )));
        }
        if self.looping == looping && !self.exit_loop_requested {
            return Ok(None);
        }
        self.looping = looping;
        self.exit_loop_requested = false;
        Ok(Some(PlaybackCommand::SetLooping(self.id, looping)))
    }

    /// Every voice reached its natural end.
    pub(crate) fn finish(&mut self) {
        log::debug!("Controller {} finished playing '{}'", self.id, self.sound_name);
        self.intent = PlayState::Stopped;
        self.exit_loop_requested = false;
    }

    pub(crate) fn commit(&mut self) {
        self.committed = self.intent;
    }
}
