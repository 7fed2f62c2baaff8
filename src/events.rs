//! Event types for PetalSonic Router

use crate::ids::{ControllerId, EntityId};

/// Notifications produced by [`AudioRouter::update`](crate::AudioRouter::update)
/// and drained with [`AudioRouter::poll_events`](crate::AudioRouter::poll_events).
#[derive(Debug, Clone, PartialEq)]
pub enum RouterEvent {
    VoiceCreated {
        listener: EntityId,
        controller: ControllerId,
    },
    VoiceDestroyed {
        listener: EntityId,
        controller: ControllerId,
    },
    /// The backend refused a voice; creation is retried at the next commit.
    VoiceCreationFailed {
        listener: EntityId,
        controller: ControllerId,
        error: String,
    },
    /// Every voice of the controller reached its natural end.
    ControllerFinished {
        controller: ControllerId,
    },
    ListenerActivated {
        listener: EntityId,
    },
    ListenerDeactivated {
        listener: EntityId,
    },
    /// Controllers of a detached emitter were dropped.
    EmitterCollected {
        emitter: EntityId,
        controllers: Vec<ControllerId>,
    },
}

impl RouterEvent {
    pub fn controller(&self) -> Option<ControllerId> {
        match self {
            Self::VoiceCreated { controller, .. }
            | Self::VoiceDestroyed { controller, .. }
            | Self::VoiceCreationFailed { controller, .. }
            | Self::ControllerFinished { controller } => Some(*controller),
            _ => None,
        }
    }

    pub fn listener(&self) -> Option<EntityId> {
        match self {
            Self::VoiceCreated { listener, .. }
            | Self::VoiceDestroyed { listener, .. }
            | Self::VoiceCreationFailed { listener, .. }
            | Self::ListenerActivated { listener }
            | Self::ListenerDeactivated { listener } => Some(*listener),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::VoiceCreationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let failed = RouterEvent::VoiceCreationFailed {
            listener: EntityId(1),
            controller: ControllerId(2),
            error: "boom".into(),
        };
        assert!(failed.is_error());
        assert_eq!(failed.controller(), Some(ControllerId(2)));
        assert_eq!(failed.listener(), Some(EntityId(1)));

        let collected = RouterEvent::EmitterCollected {
            emitter: EntityId(3),
            controllers: vec![],
        };
        assert!(!collected.is_error());
        assert_eq!(collected.controller(), None);
        assert_eq!(collected.listener(), None);
    }
}
