use spatial_tags::anchors::{AnchorError, SpatialAnchorPort, SqliteAnchorStore};
use spatial_tags::codec::{PersistenceCodec, Stream};
use spatial_tags::dictation::DetachedDictation;
use spatial_tags::models::*;
use spatial_tags::placement::CameraPlacement;
use spatial_tags::store::{AnnotationStore, Collaborators};
use speculate2::speculate;
use tempfile::TempDir;

/// A data directory and anchor database shared by every store it opens,
/// so opening a second store simulates an application restart.
struct Harness {
    dir: TempDir,
    anchors: SqliteAnchorStore,
    dictation: DetachedDictation,
}

impl Harness {
    fn new() -> Self {
        let anchors = SqliteAnchorStore::open_memory().expect("Failed to open anchor store");
        anchors.migrate().expect("Failed to migrate anchor store");
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            anchors,
            dictation: DetachedDictation::new(),
        }
    }

    fn codec(&self) -> PersistenceCodec {
        PersistenceCodec::new(self.dir.path())
    }

    fn open(&self) -> AnnotationStore {
        self.open_with(Box::new(self.anchors.clone()))
    }

    fn open_with(&self, anchors: Box<dyn SpatialAnchorPort>) -> AnnotationStore {
        let collaborators = Collaborators {
            anchors,
            placement: Box::new(CameraPlacement {
                camera: Pose::new(Vector3::new(0.0, 1.5, 0.0), Quaternion::IDENTITY),
                distance: 2.0,
                menu_rotation: Quaternion::from_yaw(0.5),
            }),
            dictation: Box::new(self.dictation.clone()),
        };
        AnnotationStore::open(self.codec(), collaborators, PageLayout::new(10))
    }

    fn saved_annotations(&self) -> Vec<AnnotationRecord> {
        self.codec().load(Stream::Annotations)
    }

    fn saved_boxes(&self) -> Vec<BoundingBoxRecord> {
        self.codec().load(Stream::BoundingBoxes)
    }
}

struct OfflineAnchors;

impl SpatialAnchorPort for OfflineAnchors {
    fn attach(&self, _name: &str, _pose: &Pose) -> Result<String, AnchorError> {
        Err(AnchorError::Unavailable("offline".to_string()))
    }

    fn detach(&self, _name: &str) -> Result<(), AnchorError> {
        Err(AnchorError::Unavailable("offline".to_string()))
    }

    fn delete(&self, _name: &str) -> Result<(), AnchorError> {
        Err(AnchorError::Unavailable("offline".to_string()))
    }

    fn locate(&self, _name: &str) -> Result<Option<Pose>, AnchorError> {
        Err(AnchorError::Unavailable("offline".to_string()))
    }
}

fn annotation_name(store: &AnnotationStore, entity: EntityRef) -> String {
    store
        .annotation(entity.id())
        .map(|a| a.name.clone())
        .expect("annotation should be live")
}

fn box_name(store: &AnnotationStore, entity: EntityRef) -> String {
    store
        .bounding_box(entity.id())
        .map(|b| b.name.clone())
        .expect("bounding box should be live")
}

speculate! {
    before {
        let harness = Harness::new();
        let mut store = harness.open();
    }

    describe "spawn_annotation" {
        it "names fault tags from the fault counter" {
            let first = store.spawn_annotation(TagKind::Fault);
            assert_eq!(annotation_name(&store, first), "FaultTag0");
            assert_eq!(store.counters().fault, 1);

            let second = store.spawn_annotation(TagKind::Fault);
            assert_eq!(annotation_name(&store, second), "FaultTag1");
            assert_eq!(store.counters().fault, 2);
        }

        it "keeps independent counters per kind" {
            store.spawn_annotation(TagKind::Fault);
            let history = store.spawn_annotation(TagKind::History);
            let label = store.spawn_annotation(TagKind::Label);

            assert_eq!(annotation_name(&store, history), "HistoryTag0");
            assert_eq!(annotation_name(&store, label), "LabelTag0");
            assert_eq!(store.counters(), KindCounters { fault: 1, history: 1, label: 1 });
        }

        it "persists the whole annotation collection" {
            store.spawn_annotation(TagKind::Fault);
            store.spawn_annotation(TagKind::Label);

            let saved = harness.saved_annotations();
            assert_eq!(saved.len(), 2);
            assert_eq!(saved[0].name, "FaultTag0");
            assert_eq!(saved[1].kind, TagKind::Label);
            assert_eq!(saved[1].text, "");
        }

        it "anchors the tag in front of the camera facing the menu" {
            let entity = store.spawn_annotation(TagKind::History);
            let annotation = store.annotation(entity.id()).unwrap();

            assert_eq!(annotation.anchor, AnchorState::Bound);
            assert_eq!(annotation.pose.position, Vector3::new(0.0, 1.5, 2.0));
            assert_eq!(annotation.pose.rotation, Quaternion::from_yaw(0.5));

            let anchor = harness.anchors.get("HistoryTag0").unwrap().expect("anchor stored");
            assert!(anchor.attached);
            assert_eq!(anchor.pose, annotation.pose);
        }
    }

    describe "spawn_bounding_box" {
        it "names boxes by collection size" {
            let first = store.spawn_bounding_box();
            let second = store.spawn_bounding_box();

            assert_eq!(box_name(&store, first), "BoundingBoxTag0");
            assert_eq!(box_name(&store, second), "BoundingBoxTag1");
            assert_eq!(store.bounding_box_names(), vec!["BoundingBoxTag0", "BoundingBoxTag1"]);
        }

        it "persists unit scale" {
            store.spawn_bounding_box();

            let saved = harness.saved_boxes();
            assert_eq!(saved, vec![BoundingBoxRecord {
                name: "BoundingBoxTag0".to_string(),
                scale: Vector3::ONE,
            }]);
        }

        it "reuses a live name after an earlier box is deleted" {
            let first = store.spawn_bounding_box();
            store.spawn_bounding_box();
            store.delete_bounding_box(first.id());

            let third = store.spawn_bounding_box();
            assert_eq!(box_name(&store, third), "BoundingBoxTag1");
            assert_eq!(store.bounding_box_names(), vec!["BoundingBoxTag1", "BoundingBoxTag1"]);
        }

        it "keeps the anchor of a namesake when one duplicate is deleted" {
            let first = store.spawn_bounding_box();
            let survivor = store.spawn_bounding_box();
            store.delete_bounding_box(first.id());
            let duplicate = store.spawn_bounding_box();

            store.delete_bounding_box(duplicate.id());
            assert_eq!(store.bounding_box(survivor.id()).unwrap().anchor, AnchorState::Bound);
            assert!(harness.anchors.get("BoundingBoxTag1").unwrap().is_some());
        }
    }

    describe "delete_annotation" {
        it "decrements the counter so the name is reused" {
            let label = store.spawn_annotation(TagKind::Label);
            assert_eq!(annotation_name(&store, label), "LabelTag0");

            assert!(store.delete_annotation(label.id()));
            assert_eq!(store.counters().label, 0);

            let again = store.spawn_annotation(TagKind::Label);
            assert_eq!(annotation_name(&store, again), "LabelTag0");
        }

        it "is idempotent" {
            let keep = store.spawn_annotation(TagKind::Fault);
            let gone = store.spawn_annotation(TagKind::Fault);

            assert!(store.delete_annotation(gone.id()));
            let names = store.annotation_names();
            let counters = store.counters();

            assert!(!store.delete_annotation(gone.id()));
            assert_eq!(store.annotation_names(), names);
            assert_eq!(store.counters(), counters);
            assert!(store.contains(keep));
        }

        it "removes the anchor and the saved record" {
            let entity = store.spawn_annotation(TagKind::History);
            store.delete_annotation(entity.id());

            assert!(harness.anchors.get("HistoryTag0").unwrap().is_none());
            assert!(harness.saved_annotations().is_empty());
        }

        it "clears focus when the focused tag is deleted" {
            let entity = store.spawn_annotation(TagKind::Fault);
            store.focus_enter(entity);

            store.delete_annotation(entity.id());
            assert_eq!(store.focus(), None);
        }

        it "keeps the anchor of a live tag sharing the deleted name" {
            let first = store.spawn_annotation(TagKind::Fault);
            let survivor = store.spawn_annotation(TagKind::Fault);
            store.delete_annotation(first.id());
            let duplicate = store.spawn_annotation(TagKind::Fault);
            assert_eq!(store.annotation_names(), vec!["FaultTag1", "FaultTag1"]);

            store.delete_annotation(duplicate.id());
            assert_eq!(store.annotation(survivor.id()).unwrap().anchor, AnchorState::Bound);
            let anchor = harness.anchors.get("FaultTag1").unwrap().expect("anchor row kept");
            assert!(anchor.attached);
        }

        it "leaves a dragged namesake detached until its drag stops" {
            let first = store.spawn_annotation(TagKind::Fault);
            let dragged = store.spawn_annotation(TagKind::Fault);
            store.delete_annotation(first.id());
            let duplicate = store.spawn_annotation(TagKind::Fault);

            store.drag_started(dragged);
            store.delete_annotation(duplicate.id());
            assert_eq!(store.annotation(dragged.id()).unwrap().anchor, AnchorState::Unbound);
            assert!(harness.anchors.get("FaultTag1").unwrap().is_none());

            let pose = Pose::new(Vector3::new(1.0, 0.0, 1.0), Quaternion::IDENTITY);
            store.drag_stopped(dragged, pose);
            assert!(harness.anchors.get("FaultTag1").unwrap().is_some());
        }

        it "leaves another entity's focus alone" {
            let focused = store.spawn_bounding_box();
            let other = store.spawn_annotation(TagKind::Fault);
            store.focus_enter(focused);

            store.delete_annotation(other.id());
            assert_eq!(store.focus(), Some(focused));
        }
    }

    describe "delete_focused" {
        it "does nothing when nothing is focused" {
            store.spawn_bounding_box();
            store.spawn_annotation(TagKind::Label);

            assert!(!store.delete_focused());
            assert_eq!(store.bounding_boxes().len(), 1);
            assert_eq!(store.annotations().len(), 1);
        }

        it "deletes a focused bounding box without touching counters" {
            store.spawn_annotation(TagKind::Fault);
            let bbox = store.spawn_bounding_box();
            store.focus_enter(bbox);
            assert!(store.is_focus_bounding_box());

            assert!(store.delete_focused());
            assert!(store.bounding_boxes().is_empty());
            assert_eq!(store.counters().fault, 1);
            assert!(harness.saved_boxes().is_empty());
            assert!(harness.anchors.get("BoundingBoxTag0").unwrap().is_none());
        }

        it "deletes a focused annotation" {
            let tag = store.spawn_annotation(TagKind::History);
            store.focus_enter(tag);
            assert!(!store.is_focus_bounding_box());

            assert!(store.delete_focused());
            assert!(store.annotations().is_empty());
            assert_eq!(store.counters().history, 0);
        }
    }

    describe "delete_all" {
        it "empties everything and resets naming" {
            store.spawn_bounding_box();
            store.spawn_annotation(TagKind::Fault);
            let history = store.spawn_annotation(TagKind::History);
            store.focus_enter(history);

            store.delete_all();

            assert!(store.bounding_boxes().is_empty());
            assert!(store.annotations().is_empty());
            assert_eq!(store.counters(), KindCounters::default());
            assert_eq!(store.focus(), None);
            assert!(harness.saved_boxes().is_empty());
            assert!(harness.saved_annotations().is_empty());
            assert!(harness.anchors.list().unwrap().is_empty());

            let fault = store.spawn_annotation(TagKind::Fault);
            assert_eq!(annotation_name(&store, fault), "FaultTag0");
        }
    }

    describe "reload" {
        it "restores a bounding box with the same name and scale" {
            let entity = store.spawn_bounding_box();
            let scale = Vector3::new(0.5, 2.0, 1.25);
            store.set_bounding_box_scale(entity.id(), scale);
            drop(store);

            let restarted = harness.open();
            let restored = &restarted.bounding_boxes()[0];
            assert_eq!(restored.name, "BoundingBoxTag0");
            assert_eq!(restored.scale, scale);
            assert_eq!(restored.anchor, AnchorState::Bound);
        }

        it "restores annotations with text and bumps counters" {
            let fault = store.spawn_annotation(TagKind::Fault);
            store.spawn_annotation(TagKind::Fault);
            store.spawn_annotation(TagKind::Label);
            store.set_annotation_text(fault.id(), "Cracked housing");
            drop(store);

            let mut restarted = harness.open();
            assert_eq!(restarted.annotation_names(), vec!["FaultTag0", "FaultTag1", "LabelTag0"]);
            assert_eq!(restarted.annotations()[0].text, "Cracked housing");
            assert_eq!(restarted.counters(), KindCounters { fault: 2, history: 0, label: 1 });

            let next = restarted.spawn_annotation(TagKind::Fault);
            assert_eq!(annotation_name(&restarted, next), "FaultTag2");
        }

        it "moves restored entities to their anchored pose" {
            let entity = store.spawn_annotation(TagKind::Label);
            let moved = Pose::new(Vector3::new(3.0, 1.0, -2.0), Quaternion::from_yaw(1.0));
            store.drag_started(entity);
            store.drag_stopped(entity, moved);
            drop(store);

            let restarted = harness.open();
            assert_eq!(restarted.annotations()[0].pose, moved);
        }

        it "starts empty when nothing was saved" {
            assert!(store.bounding_boxes().is_empty());
            assert!(store.annotations().is_empty());
            assert_eq!(store.counters(), KindCounters::default());
        }

        it "starts empty when the saved file is corrupt" {
            store.spawn_annotation(TagKind::Fault);
            std::fs::write(harness.codec().path(Stream::Annotations), b"[{\"name\":").unwrap();

            store.reload();
            assert!(store.annotations().is_empty());
            assert_eq!(store.counters().fault, 0);
        }

        it "clears focus" {
            let entity = store.spawn_bounding_box();
            store.focus_enter(entity);

            store.reload();
            assert_eq!(store.focus(), None);
        }
    }

    describe "focus" {
        it "replaces an earlier focus and ignores its exit" {
            let a = store.spawn_annotation(TagKind::Fault);
            let b = store.spawn_bounding_box();

            store.focus_enter(a);
            store.focus_enter(b);
            assert_eq!(store.focus(), Some(b));

            assert!(!store.focus_exit(a));
            assert_eq!(store.focus(), Some(b));

            assert!(store.focus_exit(b));
            assert_eq!(store.focus(), None);
        }

        it "ignores entities that are not live" {
            let entity = store.spawn_annotation(TagKind::Label);
            store.delete_annotation(entity.id());

            assert!(!store.focus_enter(entity));
            assert_eq!(store.focus(), None);
        }
    }

    describe "drag" {
        it "detaches on start and re-attaches at the new pose on stop" {
            let entity = store.spawn_bounding_box();

            assert!(store.drag_started(entity));
            assert_eq!(store.bounding_box(entity.id()).unwrap().anchor, AnchorState::Unbound);
            assert!(!harness.anchors.get("BoundingBoxTag0").unwrap().unwrap().attached);

            let pose = Pose::new(Vector3::new(-1.0, 0.5, 4.0), Quaternion::IDENTITY);
            assert!(store.drag_stopped(entity, pose));

            let bbox = store.bounding_box(entity.id()).unwrap();
            assert_eq!(bbox.anchor, AnchorState::Bound);
            assert_eq!(bbox.pose, pose);

            let anchor = harness.anchors.get("BoundingBoxTag0").unwrap().unwrap();
            assert!(anchor.attached);
            assert_eq!(anchor.pose, pose);
        }

        it "never deletes the anchor" {
            let entity = store.spawn_annotation(TagKind::Fault);
            store.drag_started(entity);

            assert!(harness.anchors.get("FaultTag0").unwrap().is_some());
            assert!(store.contains(entity));
        }

        it "rejects unknown entities" {
            let entity = EntityRef::Annotation(EntityId::new());
            assert!(!store.drag_started(entity));
            assert!(!store.drag_stopped(entity, Pose::default()));
        }
    }

    describe "anchor failures" {
        it "still spawns and persists the entity" {
            let mut offline = harness.open_with(Box::new(OfflineAnchors));
            let entity = offline.spawn_annotation(TagKind::Fault);

            let annotation = offline.annotation(entity.id()).unwrap();
            assert_eq!(annotation.anchor, AnchorState::Unbound);
            assert_eq!(harness.saved_annotations().len(), 1);

            assert!(offline.delete_annotation(entity.id()));
            assert!(harness.saved_annotations().is_empty());
        }
    }

    describe "paging" {
        it "turns pages of the focused annotation within range" {
            let entity = store.spawn_annotation(TagKind::History);
            store.set_annotation_text(entity.id(), "0123456789abcdefghijXYZ");
            store.focus_enter(entity);

            assert_eq!(store.page_label(entity.id()).as_deref(), Some("Page 1"));
            assert!(store.focused_next_page());
            assert!(store.focused_next_page());
            assert!(store.focused_next_page());
            assert_eq!(store.visible_text(entity.id()), Some("XYZ"));
            assert_eq!(store.page_label(entity.id()).as_deref(), Some("Page 3"));

            assert!(store.focused_prev_page());
            assert_eq!(store.visible_text(entity.id()), Some("abcdefghij"));
        }

        it "is a no-op for bounding boxes and when unfocused" {
            assert!(!store.focused_next_page());
            assert!(!store.focused_clear());

            let bbox = store.spawn_bounding_box();
            store.focus_enter(bbox);
            assert!(!store.focused_next_page());
            assert!(!store.focused_prev_page());
            assert!(!store.focused_clear());
            assert!(!store.focused_start_dictation());
        }

        it "clears the focused text and saves" {
            let entity = store.spawn_annotation(TagKind::Label);
            store.set_annotation_text(entity.id(), "0123456789abc");
            store.focus_enter(entity);
            store.focused_next_page();

            assert!(store.focused_clear());
            let annotation = store.annotation(entity.id()).unwrap();
            assert_eq!(annotation.text, "");
            assert_eq!(annotation.page, 1);
            assert_eq!(harness.saved_annotations()[0].text, "");
        }

        it "pulls the page back when text shrinks" {
            let entity = store.spawn_annotation(TagKind::Label);
            store.set_annotation_text(entity.id(), "0123456789abcdefghijXYZ");
            store.focus_enter(entity);
            store.focused_next_page();
            store.focused_next_page();

            store.set_annotation_text(entity.id(), "short");
            assert_eq!(store.annotation(entity.id()).unwrap().page, 1);
        }
    }

    describe "dictation" {
        it "appends the transcript to the prior text" {
            let entity = store.spawn_annotation(TagKind::Fault);
            store.set_annotation_text(entity.id(), "Leak");
            store.focus_enter(entity);

            assert!(store.focused_start_dictation());
            assert!(store.is_dictating());
            assert_eq!(harness.dictation.target().as_deref(), Some("FaultTag0"));

            assert!(store.dictation_recorded("near valve"));
            assert!(store.dictation_recorded("near valve two"));
            assert_eq!(store.annotation(entity.id()).unwrap().text, "Leak\nnear valve two");

            assert!(store.stop_dictation());
            assert!(!store.is_dictating());
            assert_eq!(harness.dictation.target(), None);
            assert_eq!(harness.saved_annotations()[0].text, "Leak\nnear valve two");
        }

        it "ignores a second start while recording" {
            let entity = store.spawn_annotation(TagKind::Fault);
            store.focus_enter(entity);

            assert!(store.focused_start_dictation());
            assert!(!store.focused_start_dictation());
        }

        it "cancels when the target is deleted" {
            let entity = store.spawn_annotation(TagKind::Label);
            store.focus_enter(entity);
            store.focused_start_dictation();

            store.delete_focused();
            assert!(!store.is_dictating());
            assert_eq!(harness.dictation.target(), None);
            assert!(!store.dictation_recorded("lost"));
        }

        it "releases the recognizer on reload" {
            let entity = store.spawn_annotation(TagKind::Label);
            store.focus_enter(entity);
            store.focused_start_dictation();

            store.reload();
            assert!(!store.is_dictating());
            assert_eq!(harness.dictation.target(), None);

            let restored = store.find_by_name("LabelTag0").expect("tag restored");
            store.focus_enter(restored);
            assert!(store.focused_start_dictation());
            assert_eq!(harness.dictation.target().as_deref(), Some("LabelTag0"));
        }
    }

    describe "on_application_focus" {
        it "saves both streams when focus is lost" {
            assert!(!harness.codec().path(Stream::BoundingBoxes).exists());

            store.on_application_focus(true);
            assert!(!harness.codec().path(Stream::BoundingBoxes).exists());

            store.on_application_focus(false);
            assert!(harness.codec().path(Stream::BoundingBoxes).exists());
            assert!(harness.codec().path(Stream::Annotations).exists());
        }
    }

    describe "find_by_name" {
        it "finds bounding boxes and annotations" {
            let bbox = store.spawn_bounding_box();
            let tag = store.spawn_annotation(TagKind::History);

            assert_eq!(store.find_by_name("BoundingBoxTag0"), Some(bbox));
            assert_eq!(store.find_by_name("HistoryTag0"), Some(tag));
            assert_eq!(store.find_by_name("LabelTag0"), None);
        }
    }
}
