use serde::{Deserialize, Serialize};

use super::{EntityRef, Pose, TagKind};

/// Input for spawning an annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnAnnotationInput {
    pub kind: TagKind,
}

/// Replacement text for an annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTextInput {
    pub text: String,
}

/// A focus-enter/exit or drag-start signal for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySignal {
    pub entity: EntityRef,
}

/// Drag-stop signal carrying the pose the entity was released at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragStopInput {
    pub entity: EntityRef,
    pub pose: Pose,
}

/// Transcript delivered by the speech recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictationResultInput {
    pub text: String,
}

/// Application focus notification from the host environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleInput {
    pub focused: bool,
}

/// Names of every live entity, per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityNames {
    pub bounding_boxes: Vec<String>,
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusState {
    pub entity: Option<EntityRef>,
    pub is_bounding_box: bool,
}

/// Whether a focus-mediated command applied to anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub applied: bool,
}
