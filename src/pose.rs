//! Pose tracking for active listeners and emitters.
//!
//! Velocities are finite differences between consecutive commits. The tracker
//! only remembers the previous position of objects that were active on the last
//! commit, so an object coming back from inactivity starts at rest instead of
//! reporting the whole gap as one tick of motion.

use crate::ids::EntityId;
use crate::math::{Pose, SpatialPose, Vec3};
use std::collections::HashMap;
use std::time::Duration;

/// Which audio aspect of an entity a tracked pose belongs to.
///
/// An entity may be both a listener and an emitter; the two are tracked apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseKey {
    Listener(EntityId),
    Emitter(EntityId),
}

#[derive(Debug, Default)]
pub struct PoseTracker {
    previous_positions: HashMap<PoseKey, Vec3>,
}

impl PoseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute this tick's pose from the world transform and remember the
    /// position for the next tick's velocity.
    pub fn update_pose(&mut self, key: PoseKey, transform: &Pose, dt: Duration) -> SpatialPose {
        let mut pose = SpatialPose::at_rest(transform);
        let dt_secs = dt.as_secs_f32();

        if let Some(previous) = self.previous_positions.insert(key, transform.position) {
            if dt_secs > 0.0 {
                pose.velocity = (transform.position - previous) / dt_secs;
            }
        }

        pose
    }

    /// Forget the previous position of an object that is no longer active.
    pub fn reset(&mut self, key: PoseKey) {
        self.previous_positions.remove(&key);
    }

    pub fn is_tracking(&self, key: PoseKey) -> bool {
        self.previous_positions.contains_key(&key)
    }

    /// Drop every tracked object for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(PoseKey) -> bool) {
        self.previous_positions.retain(|key, _| keep(*key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    const TICK: Duration = Duration::from_millis(500);

    #[test]
    fn first_tick_is_at_rest() {
        let mut tracker = PoseTracker::new();
        let key = PoseKey::Listener(EntityId(1));
        let pose = tracker.update_pose(key, &Pose::from_position(Vec3::new(3.0, 0.0, 0.0)), TICK);
        assert_eq!(pose.position, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(pose.velocity, Vec3::ZERO);
        assert!(tracker.is_tracking(key));
    }

    #[test]
    fn velocity_is_finite_difference() {
        let mut tracker = PoseTracker::new();
        let key = PoseKey::Emitter(EntityId(1));
        tracker.update_pose(key, &Pose::from_position(Vec3::ZERO), TICK);
        let pose = tracker.update_pose(key, &Pose::from_position(Vec3::new(1.0, 2.0, 3.0)), TICK);
        assert!((pose.velocity - Vec3::new(2.0, 4.0, 6.0)).length() < 1e-5);
    }

    #[test]
    fn reset_prevents_velocity_across_gap() {
        let mut tracker = PoseTracker::new();
        let key = PoseKey::Listener(EntityId(4));
        tracker.update_pose(key, &Pose::from_position(Vec3::ZERO), TICK);
        tracker.reset(key);
        let pose = tracker.update_pose(key, &Pose::from_position(Vec3::splat(100.0)), TICK);
        assert_eq!(pose.velocity, Vec3::ZERO);
    }

    #[test]
    fn zero_dt_yields_zero_velocity() {
        let mut tracker = PoseTracker::new();
        let key = PoseKey::Listener(EntityId(2));
        tracker.update_pose(key, &Pose::from_position(Vec3::ZERO), TICK);
        let pose = tracker.update_pose(key, &Pose::from_position(Vec3::X), Duration::ZERO);
        assert_eq!(pose.velocity, Vec3::ZERO);
    }

    #[test]
    fn orientation_follows_rotation() {
        let mut tracker = PoseTracker::new();
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let pose = tracker.update_pose(
            PoseKey::Listener(EntityId(9)),
            &Pose::from_rotation(rotation),
            TICK,
        );
        assert!((pose.forward - Vec3::X).length() < 1e-6);
        assert!((pose.up - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn listener_and_emitter_aspects_are_independent() {
        let mut tracker = PoseTracker::new();
        let entity = EntityId(5);
        tracker.update_pose(PoseKey::Listener(entity), &Pose::identity(), TICK);
        assert!(!tracker.is_tracking(PoseKey::Emitter(entity)));

        tracker.update_pose(PoseKey::Emitter(entity), &Pose::identity(), TICK);
        tracker.retain(|key| matches!(key, PoseKey::Emitter(_)));
        assert!(!tracker.is_tracking(PoseKey::Listener(entity)));
        assert!(tracker.is_tracking(PoseKey::Emitter(entity)));
    }
}
