//! Keeps each entity's spatial anchor in step with its lifecycle.
//!
//! Transitions per entity:
//!
//! - spawn / drag stop: `Unbound -> Bound` via [`AnchorBinding::bind`]
//! - reload: [`AnchorBinding::restore`], which adopts the stored pose first
//! - drag start: `Bound -> Unbound` via [`AnchorBinding::unbind`]
//! - delete: [`AnchorBinding::destroy`], the only path that forgets an anchor
//!
//! Port failures are logged and never propagated. The in-memory entity stays
//! valid even when its anchor could not be attached.

use crate::anchors::SpatialAnchorPort;
use crate::models::{AnchorState, Anchored};

pub struct AnchorBinding {
    port: Box<dyn SpatialAnchorPort>,
}

impl AnchorBinding {
    pub fn new(port: Box<dyn SpatialAnchorPort>) -> Self {
        Self { port }
    }

    pub fn bind(&self, entity: &mut impl Anchored) {
        match self.port.attach(entity.name(), entity.pose()) {
            Ok(diagnostic) => {
                tracing::debug!("Added anchor: {}", diagnostic);
                entity.set_anchor_state(AnchorState::Bound);
            }
            Err(e) => {
                tracing::warn!("Failed to attach anchor {}: {}", entity.name(), e);
                entity.set_anchor_state(AnchorState::Unbound);
            }
        }
    }

    /// Re-bind a reloaded entity, moving it to the pose the anchor service remembers.
    pub fn restore(&self, entity: &mut impl Anchored) {
        match self.port.locate(entity.name()) {
            Ok(Some(pose)) => entity.set_pose(pose),
            Ok(None) => tracing::debug!("No stored anchor for {}, creating one", entity.name()),
            Err(e) => tracing::warn!("Failed to locate anchor {}: {}", entity.name(), e),
        }
        self.bind(entity);
    }

    pub fn unbind(&self, entity: &mut impl Anchored) {
        if let Err(e) = self.port.detach(entity.name()) {
            tracing::warn!("Failed to detach anchor {}: {}", entity.name(), e);
        }
        entity.set_anchor_state(AnchorState::Unbound);
    }

    pub fn destroy(&self, entity: &impl Anchored) {
        if let Err(e) = self.port.delete(entity.name()) {
            tracing::warn!("Failed to delete anchor {}: {}", entity.name(), e);
        }
    }
}
