use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Pose, Vector3};

/// Process-local identity of a live entity.
///
/// Names are not guaranteed unique (bounding boxes are named by collection
/// size), so every reference held outside the store uses this id instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A reference to either kind of entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    BoundingBox(EntityId),
    Annotation(EntityId),
}

impl EntityRef {
    pub fn id(&self) -> EntityId {
        match self {
            Self::BoundingBox(id) | Self::Annotation(id) => *id,
        }
    }

    pub fn is_bounding_box(&self) -> bool {
        matches!(self, Self::BoundingBox(_))
    }
}

/// The three annotation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    Fault,
    History,
    Label,
}

impl TagKind {
    /// Name prefix, as in `FaultTag0`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Fault => "Fault",
            Self::History => "History",
            Self::Label => "Label",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fault => "fault",
            Self::History => "history",
            Self::Label => "label",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fault" => Some(Self::Fault),
            "history" => Some(Self::History),
            "label" => Some(Self::Label),
            _ => None,
        }
    }

    pub fn entity_name(&self, counter: u32) -> String {
        format!("{}Tag{}", self.prefix(), counter)
    }
}

/// Whether an entity currently holds its spatial anchor.
///
/// - `Bound`: attached under the entity name
/// - `Unbound`: detached while dragging, or the last attach failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorState {
    Bound,
    #[default]
    Unbound,
}

/// A scaled volume marking a region of the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: EntityId,
    pub name: String,
    pub scale: Vector3,
    pub pose: Pose,
    pub anchor: AnchorState,
}

impl BoundingBox {
    pub fn new(name: impl Into<String>, scale: Vector3, pose: Pose) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            scale,
            pose,
            anchor: AnchorState::Unbound,
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::BoundingBox(self.id)
    }

    pub fn box_name(index: usize) -> String {
        format!("BoundingBoxTag{}", index)
    }
}

/// A text note of one of the [`TagKind`]s.
///
/// `page` is the 1-based page currently shown; see [`super::PageLayout`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub id: EntityId,
    pub name: String,
    pub kind: TagKind,
    pub text: String,
    pub pose: Pose,
    pub anchor: AnchorState,
    pub page: usize,
}

impl Annotation {
    pub fn new(name: impl Into<String>, kind: TagKind, text: impl Into<String>, pose: Pose) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            kind,
            text: text.into(),
            pose,
            anchor: AnchorState::Unbound,
            page: 1,
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Annotation(self.id)
    }
}

/// Anything that can hold a spatial anchor.
pub trait Anchored {
    fn name(&self) -> &str;
    fn pose(&self) -> &Pose;
    fn set_pose(&mut self, pose: Pose);
    fn anchor_state(&self) -> AnchorState;
    fn set_anchor_state(&mut self, state: AnchorState);
}

macro_rules! impl_anchored {
    ($ty:ty) => {
        impl Anchored for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn pose(&self) -> &Pose {
                &self.pose
            }

            fn set_pose(&mut self, pose: Pose) {
                self.pose = pose;
            }

            fn anchor_state(&self) -> AnchorState {
                self.anchor
            }

            fn set_anchor_state(&mut self, state: AnchorState) {
                self.anchor = state;
            }
        }
    };
}

impl_anchored!(BoundingBox);
impl_anchored!(Annotation);

/// Per-kind naming counters for annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindCounters {
    pub fault: u32,
    pub history: u32,
    pub label: u32,
}

impl KindCounters {
    pub fn get(&self, kind: TagKind) -> u32 {
        match kind {
            TagKind::Fault => self.fault,
            TagKind::History => self.history,
            TagKind::Label => self.label,
        }
    }

    fn slot(&mut self, kind: TagKind) -> &mut u32 {
        match kind {
            TagKind::Fault => &mut self.fault,
            TagKind::History => &mut self.history,
            TagKind::Label => &mut self.label,
        }
    }

    /// Increments the counter for `kind`, returning the value before the increment.
    pub fn increment(&mut self, kind: TagKind) -> u32 {
        let slot = self.slot(kind);
        let before = *slot;
        *slot += 1;
        before
    }

    pub fn decrement(&mut self, kind: TagKind) {
        let slot = self.slot(kind);
        *slot = slot.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
