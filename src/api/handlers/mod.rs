use axum::{extract::Path, extract::State, http::StatusCode, response::IntoResponse, Json};

use super::SharedStore;
use crate::models::*;

type ApiError = (StatusCode, String);

fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

fn outcome(applied: bool) -> Json<CommandOutcome> {
    Json(CommandOutcome { applied })
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Entities
// ============================================================

pub async fn list_names(State(store): State<SharedStore>) -> Json<EntityNames> {
    let names = {
        let store = store.lock();
        EntityNames {
            bounding_boxes: store.bounding_box_names(),
            annotations: store.annotation_names(),
        }
    };
    Json(names)
}

pub async fn delete_all(State(store): State<SharedStore>) -> StatusCode {
    store.lock().delete_all();
    StatusCode::NO_CONTENT
}

// ============================================================
// Bounding boxes
// ============================================================

pub async fn list_bounding_boxes(State(store): State<SharedStore>) -> Json<Vec<BoundingBox>> {
    let boxes = store.lock().bounding_boxes().to_vec();
    Json(boxes)
}

pub async fn get_bounding_box(
    State(store): State<SharedStore>,
    Path(id): Path<EntityId>,
) -> Result<Json<BoundingBox>, ApiError> {
    let bbox = store.lock().bounding_box(id).cloned();
    bbox.map(Json).ok_or_else(|| not_found("Bounding box"))
}

pub async fn spawn_bounding_box(
    State(store): State<SharedStore>,
) -> Result<(StatusCode, Json<BoundingBox>), ApiError> {
    let bbox = {
        let mut store = store.lock();
        let entity = store.spawn_bounding_box();
        store.bounding_box(entity.id()).cloned()
    };
    bbox.map(|b| (StatusCode::CREATED, Json(b)))
        .ok_or_else(|| not_found("Bounding box"))
}

pub async fn delete_bounding_box(
    State(store): State<SharedStore>,
    Path(id): Path<EntityId>,
) -> StatusCode {
    store.lock().delete_bounding_box(id);
    StatusCode::NO_CONTENT
}

pub async fn set_bounding_box_scale(
    State(store): State<SharedStore>,
    Path(id): Path<EntityId>,
    Json(scale): Json<Vector3>,
) -> Result<Json<BoundingBox>, ApiError> {
    let bbox = {
        let mut store = store.lock();
        if store.set_bounding_box_scale(id, scale) {
            store.bounding_box(id).cloned()
        } else {
            None
        }
    };
    bbox.map(Json).ok_or_else(|| not_found("Bounding box"))
}

// ============================================================
// Annotations
// ============================================================

pub async fn list_annotations(State(store): State<SharedStore>) -> Json<Vec<Annotation>> {
    let annotations = store.lock().annotations().to_vec();
    Json(annotations)
}

pub async fn get_annotation(
    State(store): State<SharedStore>,
    Path(id): Path<EntityId>,
) -> Result<Json<Annotation>, ApiError> {
    let annotation = store.lock().annotation(id).cloned();
    annotation.map(Json).ok_or_else(|| not_found("Annotation"))
}

pub async fn spawn_annotation(
    State(store): State<SharedStore>,
    Json(input): Json<SpawnAnnotationInput>,
) -> Result<(StatusCode, Json<Annotation>), ApiError> {
    let annotation = {
        let mut store = store.lock();
        let entity = store.spawn_annotation(input.kind);
        store.annotation(entity.id()).cloned()
    };
    annotation
        .map(|a| (StatusCode::CREATED, Json(a)))
        .ok_or_else(|| not_found("Annotation"))
}

pub async fn delete_annotation(
    State(store): State<SharedStore>,
    Path(id): Path<EntityId>,
) -> StatusCode {
    store.lock().delete_annotation(id);
    StatusCode::NO_CONTENT
}

pub async fn set_annotation_text(
    State(store): State<SharedStore>,
    Path(id): Path<EntityId>,
    Json(input): Json<SetTextInput>,
) -> Result<Json<Annotation>, ApiError> {
    let annotation = {
        let mut store = store.lock();
        if store.set_annotation_text(id, input.text) {
            store.annotation(id).cloned()
        } else {
            None
        }
    };
    annotation.map(Json).ok_or_else(|| not_found("Annotation"))
}

// ============================================================
// Focus
// ============================================================

pub async fn get_focus(State(store): State<SharedStore>) -> Json<FocusState> {
    let focus = {
        let store = store.lock();
        FocusState {
            entity: store.focus(),
            is_bounding_box: store.is_focus_bounding_box(),
        }
    };
    Json(focus)
}

pub async fn focus_enter(
    State(store): State<SharedStore>,
    Json(signal): Json<EntitySignal>,
) -> Json<CommandOutcome> {
    let applied = store.lock().focus_enter(signal.entity);
    outcome(applied)
}

pub async fn focus_exit(
    State(store): State<SharedStore>,
    Json(signal): Json<EntitySignal>,
) -> Json<CommandOutcome> {
    let applied = store.lock().focus_exit(signal.entity);
    outcome(applied)
}

pub async fn delete_focused(State(store): State<SharedStore>) -> StatusCode {
    store.lock().delete_focused();
    StatusCode::NO_CONTENT
}

pub async fn focused_next_page(State(store): State<SharedStore>) -> Json<CommandOutcome> {
    let applied = store.lock().focused_next_page();
    outcome(applied)
}

pub async fn focused_prev_page(State(store): State<SharedStore>) -> Json<CommandOutcome> {
    let applied = store.lock().focused_prev_page();
    outcome(applied)
}

pub async fn focused_clear(State(store): State<SharedStore>) -> Json<CommandOutcome> {
    let applied = store.lock().focused_clear();
    outcome(applied)
}

pub async fn focused_start_dictation(State(store): State<SharedStore>) -> Json<CommandOutcome> {
    let applied = store.lock().focused_start_dictation();
    outcome(applied)
}

// ============================================================
// Dictation
// ============================================================

pub async fn dictation_result(
    State(store): State<SharedStore>,
    Json(input): Json<DictationResultInput>,
) -> Json<CommandOutcome> {
    let applied = store.lock().dictation_recorded(&input.text);
    outcome(applied)
}

pub async fn stop_dictation(State(store): State<SharedStore>) -> Json<CommandOutcome> {
    let applied = store.lock().stop_dictation();
    outcome(applied)
}

// ============================================================
// Drag
// ============================================================

pub async fn drag_start(
    State(store): State<SharedStore>,
    Json(signal): Json<EntitySignal>,
) -> Result<Json<CommandOutcome>, ApiError> {
    let applied = store.lock().drag_started(signal.entity);
    if applied {
        Ok(outcome(true))
    } else {
        Err(not_found("Entity"))
    }
}

pub async fn drag_stop(
    State(store): State<SharedStore>,
    Json(input): Json<DragStopInput>,
) -> Result<Json<CommandOutcome>, ApiError> {
    let applied = store.lock().drag_stopped(input.entity, input.pose);
    if applied {
        Ok(outcome(true))
    } else {
        Err(not_found("Entity"))
    }
}

// ============================================================
// Persistence
// ============================================================

pub async fn save(State(store): State<SharedStore>) -> StatusCode {
    {
        let store = store.lock();
        store.save_bounding_boxes();
        store.save_annotations();
    }
    StatusCode::NO_CONTENT
}

pub async fn lifecycle(
    State(store): State<SharedStore>,
    Json(input): Json<LifecycleInput>,
) -> StatusCode {
    store.lock().on_application_focus(input.focused);
    StatusCode::NO_CONTENT
}
