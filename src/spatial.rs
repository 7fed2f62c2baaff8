//! Per-voice spatialization: pan, distance attenuation and Doppler pitch.

use crate::backend::VoiceParams;
use crate::config::{RouterDesc, SpatialSettings};
use crate::math::SpatialPose;

/// Below this raw distance the emitter direction is undefined.
pub const MIN_DISTANCE_EPSILON: f32 = 1e-4;

/// Compute the parameters of the voice binding `listener` to `emitter`.
///
/// `volume` is the controller's unclamped volume multiplier.
pub fn compute_voice_params(
    listener: &SpatialPose,
    emitter: &SpatialPose,
    volume: f32,
    settings: &SpatialSettings,
    desc: &RouterDesc,
) -> VoiceParams {
    let to_emitter = emitter.position - listener.position;
    let raw_distance = to_emitter.length();

    let gain = volume
        * attenuation(
            raw_distance * settings.distance_scale,
            desc.reference_distance,
        );

    if raw_distance < MIN_DISTANCE_EPSILON {
        return VoiceParams {
            pan: 0.0,
            gain,
            pitch: 1.0,
        };
    }

    let direction = to_emitter / raw_distance;
    let right = listener.right().normalize_or_zero();
    let pan = direction.dot(right).clamp(-1.0, 1.0);

    // positive when the emitter moves away from the listener
    let radial_velocity = (emitter.velocity - listener.velocity).dot(direction);
    let pitch = doppler_pitch(
        radial_velocity * settings.doppler_scale,
        desc.speed_of_sound,
        desc.max_doppler_shift,
    );

    VoiceParams { pan, gain, pitch }
}

/// Inverse-distance falloff, 1.0 inside `reference_distance`.
pub fn attenuation(distance: f32, reference_distance: f32) -> f32 {
    reference_distance / distance.max(reference_distance)
}

/// Pitch ratio heard for a source receding at `radial_velocity`.
pub fn doppler_pitch(radial_velocity: f32, speed_of_sound: f32, max_shift: f32) -> f32 {
    let denominator = speed_of_sound + radial_velocity;
    if denominator <= 0.0 {
        // approaching at or above the speed of sound
        return max_shift;
    }
    (speed_of_sound / denominator).clamp(1.0 / max_shift, max_shift)
}
