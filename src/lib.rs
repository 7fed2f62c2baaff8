//! Spatial audio routing for scene graphs.
//!
//! The router keeps one backend voice per (listener, sound controller) pair
//! while both sides are active, and feeds each voice pan, gain and Doppler pitch
//! derived from the listener and emitter poses. Every change made through
//! [`AudioRouter`] is committed once per tick by [`AudioRouter::update`].
//!
//! Decoding, mixing and device output belong to an [`AudioBackend`]
//! implementation; world transforms come from a [`TransformProvider`].

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod math;
pub mod playback;
pub mod pose;
pub mod registry;
pub mod scene;
pub mod spatial;
pub mod voice;
pub mod world;

pub use backend::{AudioBackend, BackendError, MockBackend, VoiceParams};
pub use config::{RouterDesc, SpatialSettings};
pub use error::{Result, RouterError};
pub use events::RouterEvent;
pub use ids::{ControllerId, EntityId, SoundId, VoiceId};
pub use math::{Pose, Quat, SpatialPose, Vec3};
pub use playback::{PlayState, PlaybackCommand, SoundController};
pub use scene::TransformProvider;
pub use voice::VoiceBinding;
pub use world::AudioRouter;
