use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

#[derive(Debug, Clone)]
pub enum StageEvent {
    PreviewStarted { entity: Entity, prototype: String },
    PreviewEnded,
    PropPlaced { entity: Entity, prototype: String, animation: Option<String> },
    PropDeleted { entity: Entity },
    AnimationSwitched { name: String },
    CameraSlotEntered { slot: usize, label: String },
    SceneLoadStarted { name: String },
    SceneActivated { name: String },
    SceneLoadFailed { name: String, reason: String },
}

impl fmt::Display for StageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageEvent::PreviewStarted { entity, prototype } => {
                write!(f, "PreviewStarted entity={} prototype={}", entity.index(), prototype)
            }
            StageEvent::PreviewEnded => write!(f, "PreviewEnded"),
            StageEvent::PropPlaced { entity, prototype, animation } => {
                write!(
                    f,
                    "PropPlaced entity={} prototype={} animation={}",
                    entity.index(),
                    prototype,
                    animation.as_deref().unwrap_or("none")
                )
            }
            StageEvent::PropDeleted { entity } => {
                write!(f, "PropDeleted entity={}", entity.index())
            }
            StageEvent::AnimationSwitched { name } => write!(f, "AnimationSwitched name={name}"),
            StageEvent::CameraSlotEntered { slot, label } => {
                write!(f, "CameraSlotEntered slot={slot} label={label}")
            }
            StageEvent::SceneLoadStarted { name } => write!(f, "SceneLoadStarted name={name}"),
            StageEvent::SceneActivated { name } => write!(f, "SceneActivated name={name}"),
            StageEvent::SceneLoadFailed { name, reason } => {
                write!(f, "SceneLoadFailed name={name} reason={reason}")
            }
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<StageEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<StageEvent> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
