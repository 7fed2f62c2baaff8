//! Lightweight, type-safe handles used across the router.

use std::fmt;

/// Identity of a scene entity, supplied by the external scene graph.
///
/// An entity may carry a listener aspect, an emitter aspect, or both. The router
/// never allocates entity ids itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

/// Handle for one (emitter, sound name) playback controller.
///
/// Returned by [`AudioRouter::sound_controller`](crate::AudioRouter::sound_controller).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub(crate) u64);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControllerId({})", self.0)
    }
}

/// Opaque sound asset handle understood by the audio backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SoundId(pub u64);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SoundId({})", self.0)
    }
}

/// Native playback voice handle allocated by the audio backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoiceId({})", self.0)
    }
}
