//! The router: public API and the once-per-tick commit loop.

use crate::backend::AudioBackend;
use crate::config::{RouterDesc, SpatialSettings};
use crate::error::{Result, RouterError};
use crate::events::RouterEvent;
use crate::ids::{ControllerId, EntityId, SoundId, VoiceId};
use crate::math::SpatialPose;
use crate::playback::{PlayState, PlaybackCommand, SoundController};
use crate::pose::{PoseKey, PoseTracker};
use crate::registry::{ActivationRegistry, EmitterHandle, ListenerEntry};
use crate::scene::TransformProvider;
use crate::spatial::compute_voice_params;
use crate::voice::{VoiceBinding, VoiceManager};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Routes emitters to listeners and owns every playback voice.
///
/// `AudioRouter` is the central API of the crate. It runs on the simulation
/// thread and records every change immediately, but only touches the audio
/// backend from [`update`](Self::update), which must be called exactly once per
/// tick after the scene's transforms are final and before the backend renders.
///
/// # Deferred commands
///
/// Controller methods like [`play`](Self::play) update the controller's intent
/// right away and queue a [`PlaybackCommand`] for its voices. The commit loop
/// drains that queue, reconciles the voice table against the activity of every
/// listener and controller, and pushes fresh spatialization to each voice.
/// [`play_state`](Self::play_state) reports what the last commit applied.
///
/// # Example
///
/// ```rust,ignore
/// let mut router = AudioRouter::new(RouterDesc::default())?;
/// router.add_listener(camera);
/// router.on_entity_added(camera);
///
/// router.attach_emitter(engine);
/// router.on_entity_added(engine);
/// router.set_sound(engine, "idle", idle_sound)?;
/// let idle = router.sound_controller(engine, "idle")?;
/// router.set_looping(idle, true)?;
/// router.play(idle)?;
///
/// router.update(dt, &scene, &mut backend);
/// assert_eq!(router.play_state(idle)?, PlayState::Playing);
/// ```
pub struct AudioRouter {
    desc: RouterDesc,
    registry: ActivationRegistry,
    controllers: BTreeMap<ControllerId, SoundController>,
    poses: PoseTracker,
    voices: VoiceManager,
    command_sender: Sender<PlaybackCommand>,
    command_receiver: Receiver<PlaybackCommand>,
    events: Vec<RouterEvent>,
    /// Listeners that were active during the last commit.
    committed_listeners: HashSet<EntityId>,
    next_controller_id: u64,
}

impl AudioRouter {
    /// Creates a router with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Configuration`] if `desc` holds a non-positive speed
    /// of sound or reference distance, or a maximum Doppler shift below 1.0.
    pub fn new(desc: RouterDesc) -> Result<Self> {
        desc.validate()?;
        let (command_sender, command_receiver) = unbounded();
        log::info!(
            "Audio router created (speed of sound: {}, reference distance: {})",
            desc.speed_of_sound,
            desc.reference_distance
        );
        Ok(Self {
            desc,
            registry: ActivationRegistry::new(),
            controllers: BTreeMap::new(),
            poses: PoseTracker::new(),
            voices: VoiceManager::new(),
            command_sender,
            command_receiver,
            events: Vec::new(),
            committed_listeners: HashSet::new(),
            next_controller_id: 0,
        })
    }

    pub fn desc(&self) -> &RouterDesc {
        &self.desc
    }

    // Listeners

    /// Registers a listener. Registering an already registered listener is a no-op.
    pub fn add_listener(&mut self, entity: EntityId) {
        if self.registry.add_listener(entity) {
            log::info!("Listener {} registered", entity);
        } else {
            log::warn!("Listener {} is already registered", entity);
        }
    }

    /// Unregisters a listener.
    ///
    /// The listener stops counting as active immediately; its voices are
    /// destroyed during the next [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnregisteredListener`] if the listener is not
    /// currently registered.
    pub fn remove_listener(&mut self, entity: EntityId) -> Result<()> {
        self.registry.remove_listener(entity)?;
        log::info!("Listener {} unregistered", entity);
        Ok(())
    }

    pub fn is_listener_registered(&self, entity: EntityId) -> bool {
        self.registry.is_listener_registered(entity)
    }

    /// Registered and present in the scene hierarchy.
    pub fn is_listener_active(&self, entity: EntityId) -> bool {
        self.registry.is_listener_active(entity)
    }

    /// Pose computed by the last commit, `None` while the listener is inactive.
    pub fn listener_pose(&self, entity: EntityId) -> Option<SpatialPose> {
        self.registry.listener(entity).and_then(ListenerEntry::pose)
    }

    pub fn active_listener_count(&self) -> usize {
        self.registry.active_listener_count()
    }

    // Hierarchy

    /// The scene graph added `entity` to the hierarchy.
    pub fn on_entity_added(&mut self, entity: EntityId) {
        if self.registry.on_entity_added(entity) {
            log::debug!("Entity {} entered the hierarchy", entity);
        }
    }

    /// The scene graph removed `entity` from the hierarchy.
    ///
    /// Controllers of an emitter keep their intent and resume once the entity
    /// is added again.
    pub fn on_entity_removed(&mut self, entity: EntityId) {
        if self.registry.on_entity_removed(entity) {
            log::debug!("Entity {} left the hierarchy", entity);
        }
    }

    pub fn is_in_hierarchy(&self, entity: EntityId) -> bool {
        self.registry.is_in_hierarchy(entity)
    }

    // Emitters

    /// Gives `entity` an emitter aspect. Attaching twice is a no-op.
    pub fn attach_emitter(&mut self, entity: EntityId) {
        if self.registry.attach_emitter(entity) {
            log::info!("Emitter attached to {}", entity);
        }
    }

    /// Permanently removes the emitter of `entity`.
    ///
    /// Its controllers are garbage-collected during the next
    /// [`update`](Self::update), unless the emitter is attached again first.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownEmitter`] if no emitter is attached.
    pub fn detach_emitter(&mut self, entity: EntityId) -> Result<()> {
        self.registry.detach_emitter(entity)?;
        log::info!("Emitter detached from {}", entity);
        Ok(())
    }

    /// Binds a sound asset to a name on an emitter.
    ///
    /// If a controller for `name` already exists it plays `sound` on the voices
    /// created from now on.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownEmitter`] if no emitter is attached.
    pub fn set_sound(&mut self, entity: EntityId, name: &str, sound: SoundId) -> Result<()> {
        let emitter = self
            .registry
            .emitter_mut(entity)
            .ok_or(RouterError::UnknownEmitter(entity))?;
        emitter.set_sound(name, sound);

        if let Some(controller) = emitter
            .controller(name)
            .and_then(|id| self.controllers.get_mut(&id))
        {
            controller.set_sound(sound);
        }
        Ok(())
    }

    /// Returns the controller of the named sound, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownEmitter`] if no emitter is attached to
    /// `entity`, or [`RouterError::UnknownSound`] if no sound was set under `name`.
    pub fn sound_controller(&mut self, entity: EntityId, name: &str) -> Result<ControllerId> {
        let emitter = self
            .registry
            .emitter(entity)
            .ok_or(RouterError::UnknownEmitter(entity))?;
        if let Some(id) = emitter.controller(name) {
            return Ok(id);
        }
        let sound = emitter.sound(name).ok_or_else(|| RouterError::UnknownSound {
            entity,
            name: name.to_owned(),
        })?;

        let id = ControllerId(self.next_controller_id);
        self.next_controller_id += 1;
        self.controllers.insert(
            id,
            SoundController::new(id, entity, name, sound, self.desc.default_spatial),
        );
        if let Some(emitter) = self.registry.emitter_mut(entity) {
            emitter.insert_controller(name, id);
        }

        log::debug!("Created controller {} for '{}' on {}", id, name, entity);
        Ok(id)
    }

    /// Pose computed by the last commit, `None` while none of its controllers
    /// is active.
    pub fn emitter_pose(&self, entity: EntityId) -> Option<SpatialPose> {
        self.registry.emitter(entity).and_then(EmitterHandle::pose)
    }

    // Controllers

    /// Read-only view of a controller.
    pub fn controller(&self, id: ControllerId) -> Option<&SoundController> {
        self.controllers.get(&id)
    }

    /// Starts or resumes playback for every active listener.
    ///
    /// A stopped controller restarts from the beginning with its loop re-armed;
    /// a paused one resumes where it was. If the emitter is not in the hierarchy
    /// the intent is kept and voices appear once it enters.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownController`] for an unknown id, or
    /// [`RouterError::CommandQueue`] if the command cannot be queued.
    pub fn play(&mut self, id: ControllerId) -> Result<()> {
        self.transition(id, SoundController::play)
    }

    /// Suspends playback. Voices keep their position.
    pub fn pause(&mut self, id: ControllerId) -> Result<()> {
        self.transition(id, SoundController::pause)
    }

    /// Stops playback and releases every voice of the controller.
    pub fn stop(&mut self, id: ControllerId) -> Result<()> {
        self.transition(id, SoundController::stop)
    }

    /// Lets the current loop iteration be the last one.
    ///
    /// `is_looping` stays true. Ignored while stopped or when not looping.
    pub fn exit_loop(&mut self, id: ControllerId) -> Result<()> {
        self.transition(id, SoundController::exit_loop)
    }

    /// Sets the volume multiplier. Applied by the next commit.
    pub fn set_volume(&mut self, id: ControllerId, volume: f32) -> Result<()> {
        self.controller_mut(id)?.set_volume(volume);
        Ok(())
    }

    pub fn volume(&self, id: ControllerId) -> Result<f32> {
        Ok(self.controller_ref(id)?.volume())
    }

    /// Changes looping.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidState`] while the controller is playing.
    pub fn set_looping(&mut self, id: ControllerId, looping: bool) -> Result<()> {
        if let Some(command) = self.controller_mut(id)?.set_looping(looping)? {
            self.send(command)?;
        }
        Ok(())
    }

    pub fn is_looping(&self, id: ControllerId) -> Result<bool> {
        Ok(self.controller_ref(id)?.is_looping())
    }

    pub fn set_spatial_settings(
        &mut self,
        id: ControllerId,
        settings: SpatialSettings,
    ) -> Result<()> {
        self.controller_mut(id)?.set_spatial_settings(settings);
        Ok(())
    }

    /// Observable playback state.
    ///
    /// `Stopped` while no listener is active or while the controller owns no
    /// voice; otherwise the state applied by the last commit.
    pub fn play_state(&self, id: ControllerId) -> Result<PlayState> {
        let controller = self.controller_ref(id)?;
        if self.registry.active_listener_count() == 0 || !self.voices.has_voices(id) {
            return Ok(PlayState::Stopped);
        }
        Ok(controller.committed_state())
    }

    // Introspection

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice_bindings(&self) -> impl Iterator<Item = &VoiceBinding> {
        self.voices.iter()
    }

    pub fn has_voice(&self, listener: EntityId, controller: ControllerId) -> bool {
        self.voices.contains(listener, controller)
    }

    pub fn voice(&self, listener: EntityId, controller: ControllerId) -> Option<&VoiceBinding> {
        self.voices.get(listener, controller)
    }

    /// Drains the events produced since the last call.
    pub fn poll_events(&mut self) -> Vec<RouterEvent> {
        std::mem::take(&mut self.events)
    }

    // Commit loop

    /// Commits everything recorded since the previous call.
    ///
    /// Runs, in order: registry bookkeeping, pose computation, queued commands,
    /// completion polling, the voice diff, spatialization, and garbage collection
    /// of detached emitters. New voices start only after their first parameter
    /// push. Backend failures are reported as
    /// [`RouterEvent::VoiceCreationFailed`] and retried on the next call.
    pub fn update(
        &mut self,
        dt: Duration,
        transforms: &impl TransformProvider,
        backend: &mut impl AudioBackend,
    ) {
        self.apply_registry_changes();
        self.update_poses(dt, transforms);
        self.apply_commands(backend);
        self.poll_completion(&*backend);
        let started = self.reconcile_voices(backend);
        self.push_voice_params(backend);
        for voice in started {
            backend.play(voice);
        }
        self.collect_detached_emitters();

        for controller in self.controllers.values_mut() {
            controller.commit();
        }
    }

    /// Destroys every live voice. Call before dropping the backend.
    ///
    /// Controllers keep their intent, so a later [`update`](Self::update)
    /// recreates the voices of every active pair.
    pub fn shutdown(&mut self, backend: &mut impl AudioBackend) {
        let released = self.voices.destroy_all(backend);
        log::info!("Audio router shut down, released {} voices", released.len());
        self.record_destroyed(released);
    }

    fn apply_registry_changes(&mut self) {
        let purged = self.registry.purge_unregistered_listeners();
        if !purged.is_empty() {
            log::debug!("Purged {} unregistered listeners", purged.len());
        }

        let dormant: Vec<EntityId> = self.registry.dormant_listeners().collect();
        for listener in dormant {
            self.registry.set_listener_pose(listener, None);
        }

        let registry = &self.registry;
        self.poses.retain(|key| match key {
            PoseKey::Listener(entity) => registry.is_listener_active(entity),
            PoseKey::Emitter(entity) => registry.is_emitter_live(entity),
        });

        let active: HashSet<EntityId> = self.registry.active_listeners().collect();
        let mut activated: Vec<EntityId> = active
            .difference(&self.committed_listeners)
            .copied()
            .collect();
        let mut deactivated: Vec<EntityId> = self
            .committed_listeners
            .difference(&active)
            .copied()
            .collect();
        activated.sort();
        deactivated.sort();

        self.events.extend(
            deactivated
                .into_iter()
                .map(|listener| RouterEvent::ListenerDeactivated { listener }),
        );
        self.events.extend(
            activated
                .into_iter()
                .map(|listener| RouterEvent::ListenerActivated { listener }),
        );
        self.committed_listeners = active;
    }

    fn update_poses(&mut self, dt: Duration, transforms: &impl TransformProvider) {
        let listeners: Vec<EntityId> = self.registry.active_listeners().collect();
        for listener in listeners {
            let pose = self.track(PoseKey::Listener(listener), listener, dt, transforms);
            self.registry.set_listener_pose(listener, pose);
        }

        let audible: HashSet<EntityId> = self
            .controllers
            .values()
            .filter(|controller| self.registry.is_controller_active(controller))
            .map(SoundController::emitter)
            .collect();
        let emitters: Vec<EntityId> = self.registry.emitter_entities().collect();
        for emitter in emitters {
            let key = PoseKey::Emitter(emitter);
            let pose = if audible.contains(&emitter) {
                self.track(key, emitter, dt, transforms)
            } else {
                self.poses.reset(key);
                None
            };
            if let Some(handle) = self.registry.emitter_mut(emitter) {
                handle.set_pose(pose);
            }
        }
    }

    fn track(
        &mut self,
        key: PoseKey,
        entity: EntityId,
        dt: Duration,
        transforms: &impl TransformProvider,
    ) -> Option<SpatialPose> {
        match transforms.world_transform(entity) {
            Some(transform) => Some(self.poses.update_pose(key, &transform, dt)),
            None => {
                log::warn!("No world transform for active entity {}", entity);
                self.poses.reset(key);
                None
            }
        }
    }

    fn apply_commands(&mut self, backend: &mut impl AudioBackend) {
        while let Ok(command) = self.command_receiver.try_recv() {
            let id = command.controller();
            if !self.controllers.contains_key(&id) {
                log::debug!("Dropping {:?} for collected controller", command);
                continue;
            }

            let voices: Vec<VoiceId> = self.voices.voices_of(id).collect();
            match command {
                // a voice that already ended is left to completion polling
                PlaybackCommand::Play(_) => {
                    for &voice in &voices {
                        if !backend.is_finished(voice) {
                            backend.play(voice);
                        }
                    }
                }
                PlaybackCommand::Pause(_) => voices.iter().for_each(|&v| backend.pause(v)),
                PlaybackCommand::Stop(_) => {
                    let released = self.voices.destroy_for_controller(backend, id);
                    self.record_destroyed(released);
                }
                PlaybackCommand::ExitLoop(_) => {
                    voices.iter().for_each(|&v| backend.set_voice_loop(v, false))
                }
                PlaybackCommand::SetLooping(_, looping) => {
                    voices.iter().for_each(|&v| backend.set_voice_loop(v, looping))
                }
            }
        }
    }

    fn poll_completion(&mut self, backend: &impl AudioBackend) {
        let finished: Vec<ControllerId> = self
            .controllers
            .values()
            .filter(|controller| controller.intent_state() != PlayState::Stopped)
            .map(SoundController::id)
            .filter(|&id| {
                let mut voices = self.voices.voices_of(id).peekable();
                voices.peek().is_some() && voices.all(|voice| backend.is_finished(voice))
            })
            .collect();

        for id in finished {
            if let Some(controller) = self.controllers.get_mut(&id) {
                controller.finish();
            }
            self.events.push(RouterEvent::ControllerFinished { controller: id });
        }
    }

    /// Returns the new voices that must start playing.
    fn reconcile_voices(&mut self, backend: &mut impl AudioBackend) -> Vec<VoiceId> {
        let registry = &self.registry;
        let controllers = &self.controllers;
        let stale = self.voices.destroy_where(backend, |binding| {
            !registry.is_listener_active(binding.listener)
                || !controllers
                    .get(&binding.controller)
                    .is_some_and(|controller| registry.is_controller_active(controller))
        });
        self.record_destroyed(stale);

        let mut listeners: Vec<EntityId> = self.registry.active_listeners().collect();
        listeners.sort();
        let wanted: Vec<(ControllerId, SoundId, bool, bool)> = self
            .controllers
            .values()
            .filter(|controller| self.registry.is_controller_active(controller))
            .map(|controller| {
                (
                    controller.id(),
                    controller.sound(),
                    controller.voice_loops(),
                    controller.intent_state() == PlayState::Playing,
                )
            })
            .collect();

        let mut started = Vec::new();
        for &listener in &listeners {
            for &(controller, sound, looping, playing) in &wanted {
                if self.voices.contains(listener, controller) {
                    continue;
                }
                match self.voices.create(backend, listener, controller, sound) {
                    Ok(voice) => {
                        backend.set_voice_loop(voice, looping);
                        if playing {
                            started.push(voice);
                        }
                        self.events
                            .push(RouterEvent::VoiceCreated { listener, controller });
                    }
                    Err(e) => {
                        log::warn!(
                            "Failed to create voice for listener {} and controller {}: {}",
                            listener,
                            controller,
                            e
                        );
                        self.events.push(RouterEvent::VoiceCreationFailed {
                            listener,
                            controller,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
        started
    }

    fn push_voice_params(&mut self, backend: &mut impl AudioBackend) {
        for binding in self.voices.iter_mut() {
            let Some(controller) = self.controllers.get(&binding.controller) else {
                continue;
            };
            let listener_pose = self
                .registry
                .listener(binding.listener)
                .and_then(ListenerEntry::pose);
            let emitter_pose = self
                .registry
                .emitter(controller.emitter())
                .and_then(EmitterHandle::pose);
            let (Some(listener_pose), Some(emitter_pose)) = (listener_pose, emitter_pose) else {
                continue;
            };

            let params = compute_voice_params(
                &listener_pose,
                &emitter_pose,
                controller.volume(),
                &controller.spatial_settings(),
                &self.desc,
            );
            backend.set_voice_params(binding.voice, params);
            binding.params = Some(params);
        }
    }

    fn collect_detached_emitters(&mut self) {
        for (emitter, handle) in self.registry.take_detached_emitters() {
            let mut controllers: Vec<ControllerId> = handle.controllers().collect();
            controllers.sort();
            for id in &controllers {
                self.controllers.remove(id);
            }
            log::info!(
                "Collected emitter {} with {} controllers",
                emitter,
                controllers.len()
            );
            self.events.push(RouterEvent::EmitterCollected {
                emitter,
                controllers,
            });
        }
    }

    fn transition(
        &mut self,
        id: ControllerId,
        apply: impl FnOnce(&mut SoundController) -> Option<PlaybackCommand>,
    ) -> Result<()> {
        if let Some(command) = apply(self.controller_mut(id)?) {
            self.send(command)?;
        }
        Ok(())
    }

    fn send(&self, command: PlaybackCommand) -> Result<()> {
        self.command_sender.send(command).map_err(|e| {
            RouterError::CommandQueue(format!("Failed to send {:?}: {}", command, e))
        })
    }

    fn record_destroyed(&mut self, bindings: Vec<VoiceBinding>) {
        self.events
            .extend(bindings.into_iter().map(|binding| RouterEvent::VoiceDestroyed {
                listener: binding.listener,
                controller: binding.controller,
            }));
    }

    fn controller_ref(&self, id: ControllerId) -> Result<&SoundController> {
        self.controllers
            .get(&id)
            .ok_or(RouterError::UnknownController(id))
    }

    fn controller_mut(&mut self, id: ControllerId) -> Result<&mut SoundController> {
        self.controllers
            .get_mut(&id)
            .ok_or(RouterError::UnknownController(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockVoiceState};
    use crate::math::{Pose, Vec3};
    use std::collections::HashMap;

    const TICK: Duration = Duration::from_millis(16);
    const LISTENER: EntityId = EntityId(1);
    const EMITTER: EntityId = EntityId(2);
    const SOUND: SoundId = SoundId(100);

    struct Fixture {
        router: AudioRouter,
        backend: MockBackend,
        scene: HashMap<EntityId, Pose>,
        controller: ControllerId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut router = AudioRouter::new(RouterDesc::default()).unwrap();
            router.add_listener(LISTENER);
            router.on_entity_added(LISTENER);
            router.attach_emitter(EMITTER);
            router.on_entity_added(EMITTER);
            router.set_sound(EMITTER, "EffectBip", SOUND).unwrap();
            let controller = router.sound_controller(EMITTER, "EffectBip").unwrap();

            let mut scene = HashMap::new();
            scene.insert(LISTENER, Pose::identity());
            scene.insert(EMITTER, Pose::from_position(Vec3::new(0.0, 0.0, 4.0)));

            Self {
                router,
                backend: MockBackend::new(),
                scene,
                controller,
            }
        }

        fn tick(&mut self) {
            self.router.update(TICK, &self.scene, &mut self.backend);
        }

        fn state(&self) -> PlayState {
            self.router.play_state(self.controller).unwrap()
        }
    }

    #[test]
    fn rejects_invalid_desc() {
        let result = AudioRouter::new(RouterDesc::new().speed_of_sound(0.0));
        assert!(matches!(result, Err(RouterError::Configuration(_))));
    }

    #[test]
    fn controller_requires_emitter_and_sound() {
        let mut router = AudioRouter::new(RouterDesc::default()).unwrap();
        assert!(matches!(
            router.sound_controller(EMITTER, "missing"),
            Err(RouterError::UnknownEmitter(_))
        ));
        router.attach_emitter(EMITTER);
        assert!(matches!(
            router.sound_controller(EMITTER, "missing"),
            Err(RouterError::UnknownSound { .. })
        ));
        router.set_sound(EMITTER, "tone", SOUND).unwrap();
        let first = router.sound_controller(EMITTER, "tone").unwrap();
        let second = router.sound_controller(EMITTER, "tone").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn defaults_match_a_fresh_controller() {
        let f = Fixture::new();
        assert_eq!(f.router.volume(f.controller).unwrap(), 1.0);
        assert!(!f.router.is_looping(f.controller).unwrap());
        assert_eq!(f.state(), PlayState::Stopped);
    }

    #[test]
    fn intent_is_visible_after_commit() {
        let mut f = Fixture::new();
        f.tick();

        f.router.play(f.controller).unwrap();
        assert_eq!(f.state(), PlayState::Stopped);
        assert_eq!(
            f.router.controller(f.controller).unwrap().intent_state(),
            PlayState::Playing
        );
        f.tick();
        assert_eq!(f.state(), PlayState::Playing);

        f.router.pause(f.controller).unwrap();
        assert_eq!(f.state(), PlayState::Playing);
        f.tick();
        assert_eq!(f.state(), PlayState::Paused);
        assert_eq!(f.backend.playing_voice_count(), 0);
        assert_eq!(f.backend.live_voice_count(), 1);

        f.router.stop(f.controller).unwrap();
        f.tick();
        assert_eq!(f.state(), PlayState::Stopped);
        assert_eq!(f.backend.live_voice_count(), 0);
    }

    #[test]
    fn removing_the_last_listener_stops_immediately() {
        let mut f = Fixture::new();
        f.router.play(f.controller).unwrap();
        f.tick();
        assert_eq!(f.state(), PlayState::Playing);

        f.router.remove_listener(LISTENER).unwrap();
        assert_eq!(f.state(), PlayState::Stopped);
        assert_eq!(f.router.voice_count(), 1);
        f.tick();
        assert_eq!(f.router.voice_count(), 0);
        assert!(f.router.listener_pose(LISTENER).is_none());
    }

    #[test]
    fn stop_then_play_in_one_tick_restarts() {
        let mut f = Fixture::new();
        f.router.play(f.controller).unwrap();
        f.tick();
        let first = f.router.voice(LISTENER, f.controller).unwrap().voice;

        f.router.stop(f.controller).unwrap();
        f.router.play(f.controller).unwrap();
        f.tick();

        let second = f.router.voice(LISTENER, f.controller).unwrap().voice;
        assert_ne!(first, second);
        assert_eq!(
            f.backend.voice(second).unwrap().state,
            MockVoiceState::Playing
        );
        assert_eq!(f.state(), PlayState::Playing);
    }

    #[test]
    fn voice_created_while_paused_starts_suspended() {
        let mut f = Fixture::new();
        f.router.play(f.controller).unwrap();
        f.router.pause(f.controller).unwrap();
        f.tick();

        let binding = *f.router.voice(LISTENER, f.controller).unwrap();
        assert_eq!(
            f.backend.voice(binding.voice).unwrap().state,
            MockVoiceState::Stopped
        );
        assert_eq!(f.state(), PlayState::Paused);

        f.router.play(f.controller).unwrap();
        f.tick();
        assert_eq!(
            f.backend.voice(binding.voice).unwrap().state,
            MockVoiceState::Playing
        );
    }

    #[test]
    fn new_voice_is_spatialized_before_it_starts() {
        let mut f = Fixture::new();
        f.router.play(f.controller).unwrap();
        f.tick();

        let voice = f.router.voice(LISTENER, f.controller).unwrap().voice;
        let mock = f.backend.voice(voice).unwrap();
        assert_eq!(mock.state, MockVoiceState::Playing);
        let first = mock.params_at_first_play.unwrap();
        assert!((first.gain - 0.25).abs() < 1e-6);
        assert_eq!(first, mock.params);
    }

    #[test]
    fn volume_and_spatial_settings_reach_the_voice() {
        let mut f = Fixture::new();
        f.router.play(f.controller).unwrap();
        f.tick();
        let voice = f.router.voice(LISTENER, f.controller).unwrap().voice;
        assert!((f.backend.voice(voice).unwrap().params.gain - 0.25).abs() < 1e-6);

        f.router.set_volume(f.controller, 2.0).unwrap();
        f.router
            .set_spatial_settings(
                f.controller,
                SpatialSettings {
                    distance_scale: 0.5,
                    doppler_scale: 1.0,
                },
            )
            .unwrap();
        f.tick();
        assert!((f.backend.voice(voice).unwrap().params.gain - 1.0).abs() < 1e-6);
        assert_eq!(
            f.router.voice(LISTENER, f.controller).unwrap().params,
            Some(f.backend.voice(voice).unwrap().params)
        );
    }

    #[test]
    fn unknown_controller_is_an_error() {
        let mut f = Fixture::new();
        f.router.detach_emitter(EMITTER).unwrap();
        f.tick();
        assert!(f.router.controller(f.controller).is_none());
        assert!(matches!(
            f.router.play(f.controller),
            Err(RouterError::UnknownController(_))
        ));
        assert!(matches!(
            f.router.play_state(f.controller),
            Err(RouterError::UnknownController(_))
        ));
    }

    #[test]
    fn shutdown_releases_every_voice() {
        let mut f = Fixture::new();
        f.router.play(f.controller).unwrap();
        f.tick();
        f.router.poll_events();

        f.router.shutdown(&mut f.backend);
        assert_eq!(f.backend.live_voice_count(), 0);
        assert_eq!(f.router.voice_count(), 0);
        assert_eq!(
            f.router.poll_events(),
            vec![RouterEvent::VoiceDestroyed {
                listener: LISTENER,
                controller: f.controller,
            }]
        );
    }

    #[test]
    fn listener_activation_events() {
        let mut f = Fixture::new();
        f.tick();
        assert_eq!(
            f.router.poll_events(),
            vec![RouterEvent::ListenerActivated { listener: LISTENER }]
        );

        f.router.on_entity_removed(LISTENER);
        f.tick();
        assert_eq!(
            f.router.poll_events(),
            vec![RouterEvent::ListenerDeactivated { listener: LISTENER }]
        );
        assert!(f.router.is_listener_registered(LISTENER));
        assert!(f.router.listener_pose(LISTENER).is_none());
    }
}
