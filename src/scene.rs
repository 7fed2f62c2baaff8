//! Interface to the scene graph that owns entity transforms.
//!
//! The router does not maintain a transform hierarchy. Once per tick it asks a
//! [`TransformProvider`] for the world transform of every active listener and
//! emitter; hierarchy membership arrives separately through
//! [`AudioRouter::on_entity_added`](crate::AudioRouter::on_entity_added) and
//! [`AudioRouter::on_entity_removed`](crate::AudioRouter::on_entity_removed).
//!
//! # Example
//!
//! ```rust,ignore
//! use petalsonic_router::scene::TransformProvider;
//! use petalsonic_router::{EntityId, Pose};
//!
//! struct MySceneGraph { /* ... */ }
//!
//! impl TransformProvider for MySceneGraph {
//!     fn world_transform(&self, entity: EntityId) -> Option<Pose> {
//!         // Resolve the entity's world matrix from your own hierarchy
//!         None
//!     }
//! }
//! ```

use crate::ids::EntityId;
use crate::math::Pose;
use std::collections::HashMap;

/// Supplies world-space transforms for scene entities.
pub trait TransformProvider {
    /// World-space position and orientation of `entity`, or `None` if the scene
    /// graph does not know it.
    fn world_transform(&self, entity: EntityId) -> Option<Pose>;
}

impl TransformProvider for HashMap<EntityId, Pose> {
    fn world_transform(&self, entity: EntityId) -> Option<Pose> {
        self.get(&entity).copied()
    }
}

impl<T: TransformProvider + ?Sized> TransformProvider for &T {
    fn world_transform(&self, entity: EntityId) -> Option<Pose> {
        (**self).world_transform(entity)
    }
}
