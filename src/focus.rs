use crate::models::EntityRef;

/// Single-slot focus state.
///
/// Setting focus replaces whatever was held before without notifying the
/// previous holder. The bounding-box flag is derived from the reference variant.
#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    focused: Option<EntityRef>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_focus(&mut self, entity: Option<EntityRef>) {
        self.focused = entity;
    }

    /// Clear focus only if `entity` still holds it. Returns whether it did.
    pub fn clear_if_focused(&mut self, entity: EntityRef) -> bool {
        if self.focused == Some(entity) {
            self.focused = None;
            true
        } else {
            false
        }
    }

    pub fn focus(&self) -> Option<EntityRef> {
        self.focused
    }

    pub fn is_focus_bounding_box(&self) -> bool {
        self.focused.is_some_and(|entity| entity.is_bounding_box())
    }
}
