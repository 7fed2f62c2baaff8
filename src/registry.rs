//! Activation bookkeeping for listeners and emitters.
//!
//! Flags flip synchronously: after `remove_listener` or `on_entity_removed`
//! returns, the affected objects already read as inactive. The costly
//! consequences (voice teardown, pose reset, controller collection) wait for the
//! next commit, which calls [`ActivationRegistry::purge_unregistered_listeners`]
//! and [`ActivationRegistry::take_detached_emitters`].

use crate::error::{Result, RouterError};
use crate::ids::{ControllerId, EntityId, SoundId};
use crate::math::SpatialPose;
use crate::playback::{PlayState, SoundController};
use std::collections::{HashMap, HashSet};

/// Registration state of a listener aspect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListenerEntry {
    /// Registered with the router. `pose` is `None` until the listener has been
    /// active during a commit, and again after it leaves the hierarchy.
    Registered { pose: Option<SpatialPose> },
    /// Unregistered since the last commit; dropped once its voices are torn down.
    Unregistered,
}

impl ListenerEntry {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }

    pub fn pose(&self) -> Option<SpatialPose> {
        match self {
            Self::Registered { pose } => *pose,
            Self::Unregistered => None,
        }
    }
}

/// Audio-emitter aspect of a scene entity.
#[derive(Debug, Clone, Default)]
pub struct EmitterHandle {
    sounds: HashMap<String, SoundId>,
    controllers: HashMap<String, ControllerId>,
    pose: Option<SpatialPose>,
    detached: bool,
}

impl EmitterHandle {
    pub fn sound(&self, name: &str) -> Option<SoundId> {
        self.sounds.get(name).copied()
    }

    pub fn controller(&self, name: &str) -> Option<ControllerId> {
        self.controllers.get(name).copied()
    }

    pub fn controllers(&self) -> impl Iterator<Item = ControllerId> + '_ {
        self.controllers.values().copied()
    }

    pub fn pose(&self) -> Option<SpatialPose> {
        self.pose
    }

    pub(crate) fn set_sound(&mut self, name: &str, sound: SoundId) {
        self.sounds.insert(name.to_owned(), sound);
    }

    pub(crate) fn insert_controller(&mut self, name: &str, id: ControllerId) {
        self.controllers.insert(name.to_owned(), id);
    }

    pub(crate) fn set_pose(&mut self, pose: Option<SpatialPose>) {
        self.pose = pose;
    }
}

#[derive(Debug, Default)]
pub struct ActivationRegistry {
    listeners: HashMap<EntityId, ListenerEntry>,
    emitters: HashMap<EntityId, EmitterHandle>,
    hierarchy: HashSet<EntityId>,
}

impl ActivationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Listeners

    /// Returns false when the listener was already registered.
    pub fn add_listener(&mut self, entity: EntityId) -> bool {
        match self.listeners.get(&entity) {
            Some(ListenerEntry::Registered { .. }) => false,
            _ => {
                self.listeners
                    .insert(entity, ListenerEntry::Registered { pose: None });
                true
            }
        }
    }

    pub fn remove_listener(&mut self, entity: EntityId) -> Result<()> {
        match self.listeners.get_mut(&entity) {
            Some(entry) if entry.is_registered() => {
                *entry = ListenerEntry::Unregistered;
                Ok(())
            }
            _ => Err(RouterError::UnregisteredListener(entity)),
        }
    }

    pub fn listener(&self, entity: EntityId) -> Option<&ListenerEntry> {
        self.listeners.get(&entity)
    }

    pub fn is_listener_registered(&self, entity: EntityId) -> bool {
        self.listeners
            .get(&entity)
            .is_some_and(ListenerEntry::is_registered)
    }

    pub fn is_listener_active(&self, entity: EntityId) -> bool {
        self.is_listener_registered(entity) && self.hierarchy.contains(&entity)
    }

    pub fn active_listeners(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.listeners
            .iter()
            .filter(|&(entity, entry)| entry.is_registered() && self.hierarchy.contains(entity))
            .map(|(entity, _)| *entity)
    }

    pub fn active_listener_count(&self) -> usize {
        self.active_listeners().count()
    }

    /// Registered listeners that are out of the hierarchy.
    pub fn dormant_listeners(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.listeners
            .iter()
            .filter(|&(entity, entry)| entry.is_registered() && !self.hierarchy.contains(entity))
            .map(|(entity, _)| *entity)
    }

    pub fn set_listener_pose(&mut self, entity: EntityId, new_pose: Option<SpatialPose>) {
        if let Some(ListenerEntry::Registered { pose }) = self.listeners.get_mut(&entity) {
            *pose = new_pose;
        }
    }

    /// Drop listeners unregistered since the last commit and return them.
    pub fn purge_unregistered_listeners(&mut self) -> Vec<EntityId> {
        let removed: Vec<EntityId> = self
            .listeners
            .iter()
            .filter(|(_, entry)| !entry.is_registered())
            .map(|(entity, _)| *entity)
            .collect();
        for entity in &removed {
            self.listeners.remove(entity);
        }
        removed
    }

    // Hierarchy

    /// Returns false when the entity was already in the hierarchy.
    pub fn on_entity_added(&mut self, entity: EntityId) -> bool {
        self.hierarchy.insert(entity)
    }

    /// Returns false when the entity was not in the hierarchy.
    pub fn on_entity_removed(&mut self, entity: EntityId) -> bool {
        self.hierarchy.remove(&entity)
    }

    pub fn is_in_hierarchy(&self, entity: EntityId) -> bool {
        self.hierarchy.contains(&entity)
    }

    // Emitters

    /// Returns false when an emitter is already attached. Attaching again before
    /// the commit that would collect a detached emitter cancels the detach.
    pub fn attach_emitter(&mut self, entity: EntityId) -> bool {
        match self.emitters.get_mut(&entity) {
            Some(emitter) if emitter.detached => {
                emitter.detached = false;
                true
            }
            Some(_) => false,
            None => {
                self.emitters.insert(entity, EmitterHandle::default());
                true
            }
        }
    }

    pub fn detach_emitter(&mut self, entity: EntityId) -> Result<()> {
        match self.emitters.get_mut(&entity) {
            Some(emitter) if !emitter.detached => {
                emitter.detached = true;
                Ok(())
            }
            _ => Err(RouterError::UnknownEmitter(entity)),
        }
    }

    /// Attached (not detached) emitter of `entity`.
    pub fn emitter(&self, entity: EntityId) -> Option<&EmitterHandle> {
        self.emitters.get(&entity).filter(|emitter| !emitter.detached)
    }

    pub(crate) fn emitter_mut(&mut self, entity: EntityId) -> Option<&mut EmitterHandle> {
        self.emitters
            .get_mut(&entity)
            .filter(|emitter| !emitter.detached)
    }

    pub fn emitter_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.emitters.keys().copied()
    }

    /// Attached and present in the hierarchy.
    pub fn is_emitter_live(&self, entity: EntityId) -> bool {
        self.emitter(entity).is_some() && self.hierarchy.contains(&entity)
    }

    pub(crate) fn take_detached_emitters(&mut self) -> Vec<(EntityId, EmitterHandle)> {
        let detached: Vec<EntityId> = self
            .emitters
            .iter()
            .filter(|(_, emitter)| emitter.detached)
            .map(|(entity, _)| *entity)
            .collect();
        detached
            .into_iter()
            .filter_map(|entity| self.emitters.remove(&entity).map(|e| (entity, e)))
            .collect()
    }

    /// A controller wants voices iff its emitter is live and it is not stopped.
    pub fn is_controller_active(&self, controller: &SoundController) -> bool {
        controller.intent_state() != PlayState::Stopped
            && self.is_emitter_live(controller.emitter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpatialSettings;

    #[test]
    fn listener_needs_registration_and_hierarchy() {
        let mut registry = ActivationRegistry::new();
        let l = EntityId(1);

        assert!(registry.add_listener(l));
        assert!(!registry.is_listener_active(l));
        assert!(registry.on_entity_added(l));
        assert!(registry.is_listener_active(l));
        assert_eq!(registry.active_listener_count(), 1);

        registry.on_entity_removed(l);
        assert!(!registry.is_listener_active(l));
        assert!(registry.is_listener_registered(l));
        assert_eq!(registry.dormant_listeners().collect::<Vec<_>>(), vec![l]);
    }

    #[test]
    fn adding_twice_is_harmless() {
        let mut registry = ActivationRegistry::new();
        assert!(registry.add_listener(EntityId(1)));
        assert!(!registry.add_listener(EntityId(1)));
    }

    #[test]
    fn remove_flips_synchronously_and_purges_at_commit() {
        let mut registry = ActivationRegistry::new();
        let l = EntityId(1);
        registry.add_listener(l);
        registry.on_entity_added(l);

        registry.remove_listener(l).unwrap();
        assert!(!registry.is_listener_active(l));
        assert_eq!(registry.listener(l), Some(&ListenerEntry::Unregistered));

        assert!(matches!(
            registry.remove_listener(l),
            Err(RouterError::UnregisteredListener(e)) if e == l
        ));

        assert_eq!(registry.purge_unregistered_listeners(), vec![l]);
        assert!(registry.listener(l).is_none());
        assert!(registry.remove_listener(l).is_err());
    }

    #[test]
    fn re_add_before_commit_keeps_listener() {
        let mut registry = ActivationRegistry::new();
        let l = EntityId(1);
        registry.add_listener(l);
        registry.remove_listener(l).unwrap();
        assert!(registry.add_listener(l));
        assert!(registry.purge_unregistered_listeners().is_empty());
        assert!(registry.is_listener_registered(l));
    }

    #[test]
    fn controller_activity() {
        let mut registry = ActivationRegistry::new();
        let e = EntityId(2);
        registry.attach_emitter(e);
        let mut controller = SoundController::new(
            ControllerId(0),
            e,
            "tone",
            SoundId(1),
            SpatialSettings::default(),
        );

        controller.play();
        assert!(!registry.is_controller_active(&controller));
        registry.on_entity_added(e);
        assert!(registry.is_controller_active(&controller));
        controller.pause();
        assert!(registry.is_controller_active(&controller));
        controller.stop();
        assert!(!registry.is_controller_active(&controller));

        controller.play();
        registry.detach_emitter(e).unwrap();
        assert!(!registry.is_controller_active(&controller));
    }

    #[test]
    fn detach_and_collect() {
        let mut registry = ActivationRegistry::new();
        let e = EntityId(3);
        assert!(registry.detach_emitter(e).is_err());
        registry.attach_emitter(e);
        registry.detach_emitter(e).unwrap();
        assert!(registry.emitter(e).is_none());
        assert!(registry.detach_emitter(e).is_err());

        let collected = registry.take_detached_emitters();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].0, e);
        assert_eq!(registry.emitter_entities().count(), 0);
    }

    #[test]
    fn reattach_cancels_detach() {
        let mut registry = ActivationRegistry::new();
        let e = EntityId(3);
        registry.attach_emitter(e);
        registry.detach_emitter(e).unwrap();
        assert!(registry.attach_emitter(e));
        assert!(registry.take_detached_emitters().is_empty());
        assert!(registry.emitter(e).is_some());
    }
}
