//! Voices: one backend voice per (listener, controller) pair.

use crate::backend::{AudioBackend, BackendError, VoiceParams};
use crate::ids::{ControllerId, EntityId, SoundId, VoiceId};
use std::collections::HashMap;

/// A live backend voice rendering one controller's sound for one listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceBinding {
    pub listener: EntityId,
    pub controller: ControllerId,
    pub voice: VoiceId,
    /// Parameters pushed on the last commit, `None` before the first push.
    pub params: Option<VoiceParams>,
}

/// Owns every voice binding. Only the commit loop mutates it.
#[derive(Debug, Default)]
pub struct VoiceManager {
    bindings: HashMap<(EntityId, ControllerId), VoiceBinding>,
}

impl VoiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, listener: EntityId, controller: ControllerId) -> Option<&VoiceBinding> {
        self.bindings.get(&(listener, controller))
    }

    pub fn contains(&self, listener: EntityId, controller: ControllerId) -> bool {
        self.bindings.contains_key(&(listener, controller))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoiceBinding> {
        self.bindings.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut VoiceBinding> {
        self.bindings.values_mut()
    }

    /// Every voice currently bound to `controller`.
    pub fn voices_of(&self, controller: ControllerId) -> impl Iterator<Item = VoiceId> + '_ {
        self.bindings
            .values()
            .filter(move |binding| binding.controller == controller)
            .map(|binding| binding.voice)
    }

    pub fn has_voices(&self, controller: ControllerId) -> bool {
        self.voices_of(controller).next().is_some()
    }

    /// Ask the backend for a voice and bind it. The voice is left stopped.
    ///
    /// An existing binding for the pair is returned unchanged.
    pub fn create(
        &mut self,
        backend: &mut impl AudioBackend,
        listener: EntityId,
        controller: ControllerId,
        sound: SoundId,
    ) -> Result<VoiceId, BackendError> {
        if let Some(binding) = self.bindings.get(&(listener, controller)) {
            return Ok(binding.voice);
        }

        let voice = backend.create_voice(sound)?;
        log::debug!(
            "Created voice {} for listener {} and controller {}",
            voice,
            listener,
            controller
        );
        self.bindings.insert(
            (listener, controller),
            VoiceBinding {
                listener,
                controller,
                voice,
                params: None,
            },
        );
        Ok(voice)
    }

    /// Destroy every voice matching `predicate` and return the removed bindings.
    pub fn destroy_where(
        &mut self,
        backend: &mut impl AudioBackend,
        mut predicate: impl FnMut(&VoiceBinding) -> bool,
    ) -> Vec<VoiceBinding> {
        let keys: Vec<(EntityId, ControllerId)> = self
            .bindings
            .iter()
            .filter(|&(_, binding)| predicate(binding))
            .map(|(key, _)| *key)
            .collect();

        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(binding) = self.bindings.remove(&key) {
                release(backend, &binding);
                removed.push(binding);
            }
        }
        removed
    }

    pub fn destroy_for_controller(
        &mut self,
        backend: &mut impl AudioBackend,
        controller: ControllerId,
    ) -> Vec<VoiceBinding> {
        self.destroy_where(backend, |binding| binding.controller == controller)
    }

    pub fn destroy_all(&mut self, backend: &mut impl AudioBackend) -> Vec<VoiceBinding> {
        self.destroy_where(backend, |_| true)
    }
}

fn release(backend: &mut impl AudioBackend, binding: &VoiceBinding) {
    backend.stop(binding.voice);
    backend.destroy_voice(binding.voice);
    log::debug!(
        "Destroyed voice {} of listener {} and controller {}",
        binding.voice,
        binding.listener,
        binding.controller
    );
}
