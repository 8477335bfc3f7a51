//! The authoritative set of tags and bounding boxes.
//!
//! [`AnnotationStore`] is the only place entities are created, mutated or
//! destroyed. Every mutation ends with a full save of the affected stream, so
//! the files on disk always mirror the last completed operation.

use crate::anchors::SpatialAnchorPort;
use crate::binding::AnchorBinding;
use crate::codec::{PersistenceCodec, Stream};
use crate::dictation::DictationPort;
use crate::focus::FocusTracker;
use crate::models::*;
use crate::placement::PlacementProvider;

/// External services the store drives.
pub struct Collaborators {
    pub anchors: Box<dyn SpatialAnchorPort>,
    pub placement: Box<dyn PlacementProvider>,
    pub dictation: Box<dyn DictationPort>,
}

/// An in-progress dictation into one annotation.
#[derive(Debug, Clone)]
struct DictationSession {
    target: EntityId,
    /// Text present when recording started; transcripts are appended to it.
    prior_text: String,
}

pub struct AnnotationStore {
    codec: PersistenceCodec,
    binding: AnchorBinding,
    placement: Box<dyn PlacementProvider>,
    dictation: Box<dyn DictationPort>,
    layout: PageLayout,
    bounding_boxes: Vec<BoundingBox>,
    annotations: Vec<Annotation>,
    counters: KindCounters,
    focus: FocusTracker,
    session: Option<DictationSession>,
}

impl AnnotationStore {
    /// An empty, unfocused store. Call [`Self::reload`] before spawning anything.
    pub fn new(codec: PersistenceCodec, collaborators: Collaborators, layout: PageLayout) -> Self {
        Self {
            codec,
            binding: AnchorBinding::new(collaborators.anchors),
            placement: collaborators.placement,
            dictation: collaborators.dictation,
            layout,
            bounding_boxes: Vec::new(),
            annotations: Vec::new(),
            counters: KindCounters::default(),
            focus: FocusTracker::new(),
            session: None,
        }
    }

    /// Construct and immediately restore the persisted state.
    pub fn open(codec: PersistenceCodec, collaborators: Collaborators, layout: PageLayout) -> Self {
        let mut store = Self::new(codec, collaborators, layout);
        store.reload();
        store
    }

    // ============================================================
    // Spawning
    // ============================================================

    pub fn spawn_bounding_box(&mut self) -> EntityRef {
        tracing::info!("Spawning bounding box...");
        let name = BoundingBox::box_name(self.bounding_boxes.len());
        let mut bbox = BoundingBox::new(name, Vector3::ONE, self.placement.spawn_pose());
        self.binding.bind(&mut bbox);

        let entity = bbox.entity_ref();
        self.bounding_boxes.push(bbox);
        self.save_bounding_boxes();
        entity
    }

    pub fn spawn_annotation(&mut self, kind: TagKind) -> EntityRef {
        tracing::info!("Spawning {} tag...", kind.as_str());
        let name = kind.entity_name(self.counters.increment(kind));
        let mut pose = self.placement.spawn_pose();
        pose.rotation = self.placement.menu_rotation();

        let mut annotation = Annotation::new(name, kind, String::new(), pose);
        self.binding.bind(&mut annotation);

        let entity = annotation.entity_ref();
        self.annotations.push(annotation);
        self.save_annotations();
        entity
    }

    // ============================================================
    // Deletion
    // ============================================================

    /// Delete whatever is focused. Does nothing when nothing is.
    pub fn delete_focused(&mut self) -> bool {
        match self.focus.focus() {
            Some(EntityRef::BoundingBox(id)) => self.delete_bounding_box(id),
            Some(EntityRef::Annotation(id)) => self.delete_annotation(id),
            None => false,
        }
    }

    /// Returns `false` if `id` was not live; deleting twice is harmless.
    pub fn delete_annotation(&mut self, id: EntityId) -> bool {
        let Some(index) = self.annotation_index(id) else {
            tracing::debug!("Annotation {} not found, nothing to delete", id);
            return false;
        };

        let annotation = self.annotations.remove(index);
        tracing::info!("Deleting {}", annotation.name);
        self.counters.decrement(annotation.kind);
        self.binding.destroy(&annotation);
        for other in self.annotations.iter_mut().filter(|a| a.name == annotation.name) {
            rebind_survivor(&self.binding, other);
        }
        self.focus.clear_if_focused(annotation.entity_ref());
        if self.session.as_ref().is_some_and(|s| s.target == id) {
            self.session = None;
            self.dictation.stop_recording();
        }
        self.save_annotations();
        true
    }

    pub fn delete_bounding_box(&mut self, id: EntityId) -> bool {
        let Some(index) = self.bounding_box_index(id) else {
            tracing::debug!("Bounding box {} not found, nothing to delete", id);
            return false;
        };

        let bbox = self.bounding_boxes.remove(index);
        tracing::info!("Deleting {}", bbox.name);
        self.binding.destroy(&bbox);
        for other in self.bounding_boxes.iter_mut().filter(|b| b.name == bbox.name) {
            rebind_survivor(&self.binding, other);
        }
        self.focus.clear_if_focused(bbox.entity_ref());
        self.save_bounding_boxes();
        true
    }

    /// Remove every entity and anchor and reset naming. Administrative use only.
    pub fn delete_all(&mut self) {
        tracing::warn!(
            "Deleting all {} bounding boxes and {} annotations",
            self.bounding_boxes.len(),
            self.annotations.len()
        );

        for bbox in self.bounding_boxes.drain(..) {
            self.binding.destroy(&bbox);
        }
        for annotation in self.annotations.drain(..) {
            self.binding.destroy(&annotation);
        }
        self.counters.reset();
        self.focus.set_focus(None);
        if self.session.take().is_some() {
            self.dictation.stop_recording();
        }

        self.save_bounding_boxes();
        self.save_annotations();
    }

    // ============================================================
    // Persistence
    // ============================================================

    /// Replace the in-memory state with what was last saved and re-bind every anchor.
    pub fn reload(&mut self) {
        self.bounding_boxes.clear();
        self.annotations.clear();
        self.counters.reset();
        self.focus.set_focus(None);
        if self.session.take().is_some() {
            self.dictation.stop_recording();
        }

        let boxes: Vec<BoundingBoxRecord> = self.codec.load(Stream::BoundingBoxes);
        for record in boxes {
            let mut bbox = BoundingBox::new(record.name, record.scale, self.placement.spawn_pose());
            self.binding.restore(&mut bbox);
            self.bounding_boxes.push(bbox);
        }

        let tags: Vec<AnnotationRecord> = self.codec.load(Stream::Annotations);
        for record in tags {
            self.counters.increment(record.kind);
            let mut annotation =
                Annotation::new(record.name, record.kind, record.text, self.placement.spawn_pose());
            self.binding.restore(&mut annotation);
            self.annotations.push(annotation);
        }

        tracing::info!(
            "Reloaded {} bounding boxes and {} annotations",
            self.bounding_boxes.len(),
            self.annotations.len()
        );
    }

    pub fn save_bounding_boxes(&self) {
        let records: Vec<BoundingBoxRecord> =
            self.bounding_boxes.iter().map(BoundingBoxRecord::from).collect();
        if let Err(e) = self.codec.save(&records, Stream::BoundingBoxes) {
            tracing::error!("Error while saving bounding boxes: {}", e);
        }
    }

    pub fn save_annotations(&self) {
        let records: Vec<AnnotationRecord> =
            self.annotations.iter().map(AnnotationRecord::from).collect();
        if let Err(e) = self.codec.save(&records, Stream::Annotations) {
            tracing::error!("Error while saving annotations: {}", e);
        }
    }

    /// Environment notification; losing focus (suspend, close) is the save checkpoint.
    pub fn on_application_focus(&self, focused: bool) {
        if !focused {
            self.save_bounding_boxes();
            self.save_annotations();
        }
    }

    // ============================================================
    // Focus
    // ============================================================

    /// Focus-enter signal. References to entities that are no longer live are ignored.
    pub fn focus_enter(&mut self, entity: EntityRef) -> bool {
        if !self.contains(entity) {
            tracing::debug!("Ignoring focus on unknown entity {}", entity.id());
            return false;
        }
        self.focus.set_focus(Some(entity));
        true
    }

    /// Focus-exit signal. Only clears focus if `entity` still holds it.
    pub fn focus_exit(&mut self, entity: EntityRef) -> bool {
        self.focus.clear_if_focused(entity)
    }

    pub fn focus(&self) -> Option<EntityRef> {
        self.focus.focus()
    }

    pub fn is_focus_bounding_box(&self) -> bool {
        self.focus.is_focus_bounding_box()
    }

    fn focused_annotation_mut(&mut self) -> Option<&mut Annotation> {
        let Some(EntityRef::Annotation(id)) = self.focus.focus() else {
            return None;
        };
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    pub fn focused_next_page(&mut self) -> bool {
        let layout = self.layout;
        let Some(annotation) = self.focused_annotation_mut() else {
            return false;
        };
        annotation.page = layout.next(&annotation.text, annotation.page);
        true
    }

    pub fn focused_prev_page(&mut self) -> bool {
        let layout = self.layout;
        let Some(annotation) = self.focused_annotation_mut() else {
            return false;
        };
        annotation.page = layout.prev(&annotation.text, annotation.page);
        true
    }

    pub fn focused_clear(&mut self) -> bool {
        let Some(annotation) = self.focused_annotation_mut() else {
            return false;
        };
        tracing::debug!("Clearing text of {}", annotation.name);
        annotation.text.clear();
        annotation.page = 1;
        self.save_annotations();
        true
    }

    // ============================================================
    // Dictation
    // ============================================================

    /// Start dictating into the focused annotation. Ignored while another session runs.
    pub fn focused_start_dictation(&mut self) -> bool {
        if self.session.is_some() {
            tracing::debug!("Dictation already in progress");
            return false;
        }
        let Some(annotation) = self.focused_annotation_mut() else {
            return false;
        };
        let (target, name, prior_text) = (annotation.id, annotation.name.clone(), annotation.text.clone());

        match self.dictation.start_recording(&name) {
            Ok(()) => {
                self.session = Some(DictationSession { target, prior_text });
                true
            }
            Err(e) => {
                tracing::warn!("Could not start dictation for {}: {}", name, e);
                false
            }
        }
    }

    /// Transcript so far for the active session. Replaces anything recorded earlier
    /// in the same session.
    pub fn dictation_recorded(&mut self, recorded: &str) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let text = format!("{}\n{}", session.prior_text, recorded);
        let target = session.target;
        let layout = self.layout;

        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == target) else {
            return false;
        };
        annotation.text = text;
        annotation.page = layout.clamp(&annotation.text, annotation.page);
        true
    }

    pub fn stop_dictation(&mut self) -> bool {
        if self.session.take().is_none() {
            return false;
        }
        self.dictation.stop_recording();
        self.save_annotations();
        true
    }

    pub fn is_dictating(&self) -> bool {
        self.session.is_some()
    }

    // ============================================================
    // Manipulation
    // ============================================================

    /// Drag-start signal: release the anchor so the entity can move freely.
    pub fn drag_started(&mut self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::BoundingBox(id) => {
                let Some(index) = self.bounding_box_index(id) else {
                    return false;
                };
                self.binding.unbind(&mut self.bounding_boxes[index]);
            }
            EntityRef::Annotation(id) => {
                let Some(index) = self.annotation_index(id) else {
                    return false;
                };
                self.binding.unbind(&mut self.annotations[index]);
            }
        }
        true
    }

    /// Drag-stop signal: re-anchor at `pose` under the same name.
    pub fn drag_stopped(&mut self, entity: EntityRef, pose: Pose) -> bool {
        match entity {
            EntityRef::BoundingBox(id) => {
                let Some(index) = self.bounding_box_index(id) else {
                    return false;
                };
                let bbox = &mut self.bounding_boxes[index];
                bbox.pose = pose;
                self.binding.bind(bbox);
            }
            EntityRef::Annotation(id) => {
                let Some(index) = self.annotation_index(id) else {
                    return false;
                };
                let annotation = &mut self.annotations[index];
                annotation.pose = pose;
                self.binding.bind(annotation);
            }
        }
        true
    }

    pub fn set_annotation_text(&mut self, id: EntityId, text: impl Into<String>) -> bool {
        let layout = self.layout;
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        annotation.text = text.into();
        annotation.page = layout.clamp(&annotation.text, annotation.page);
        self.save_annotations();
        true
    }

    pub fn set_bounding_box_scale(&mut self, id: EntityId, scale: Vector3) -> bool {
        let Some(bbox) = self.bounding_boxes.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        bbox.scale = scale;
        self.save_bounding_boxes();
        true
    }

    // ============================================================
    // Queries
    // ============================================================

    pub fn bounding_box_names(&self) -> Vec<String> {
        self.bounding_boxes.iter().map(|b| b.name.clone()).collect()
    }

    pub fn annotation_names(&self) -> Vec<String> {
        self.annotations.iter().map(|a| a.name.clone()).collect()
    }

    pub fn bounding_boxes(&self) -> &[BoundingBox] {
        &self.bounding_boxes
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn bounding_box(&self, id: EntityId) -> Option<&BoundingBox> {
        self.bounding_boxes.iter().find(|b| b.id == id)
    }

    pub fn annotation(&self, id: EntityId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// First live entity called `name`, bounding boxes first.
    pub fn find_by_name(&self, name: &str) -> Option<EntityRef> {
        self.bounding_boxes
            .iter()
            .find(|b| b.name == name)
            .map(BoundingBox::entity_ref)
            .or_else(|| {
                self.annotations
                    .iter()
                    .find(|a| a.name == name)
                    .map(Annotation::entity_ref)
            })
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::BoundingBox(id) => self.bounding_box_index(id).is_some(),
            EntityRef::Annotation(id) => self.annotation_index(id).is_some(),
        }
    }

    pub fn counters(&self) -> KindCounters {
        self.counters
    }

    /// `"Page N"` for annotations whose text spans several pages.
    pub fn page_label(&self, id: EntityId) -> Option<String> {
        let annotation = self.annotation(id)?;
        self.layout.label(&annotation.text, annotation.page)
    }

    pub fn visible_text(&self, id: EntityId) -> Option<&str> {
        let annotation = self.annotation(id)?;
        Some(self.layout.page(&annotation.text, annotation.page))
    }

    fn bounding_box_index(&self, id: EntityId) -> Option<usize> {
        self.bounding_boxes.iter().position(|b| b.id == id)
    }

    fn annotation_index(&self, id: EntityId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }
}

/// Names can repeat among live entities, and anchors are keyed by name, so a
/// delete also removes the anchor of any namesake. Re-attach those that were
/// bound; one mid-drag is re-attached when its drag stops.
fn rebind_survivor(binding: &AnchorBinding, entity: &mut impl Anchored) {
    if entity.anchor_state() == AnchorState::Bound {
        tracing::debug!("Re-binding {} after its namesake was deleted", entity.name());
        binding.bind(entity);
    }
}
