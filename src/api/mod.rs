mod handlers;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::store::AnnotationStore;

/// The store shared between request handlers. Access is serialized by the mutex.
#[derive(Clone)]
pub struct SharedStore(Arc<Mutex<AnnotationStore>>);

impl SharedStore {
    pub fn new(store: AnnotationStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    /// Lock the store, recovering from a poisoned lock.
    pub fn lock(&self) -> MutexGuard<'_, AnnotationStore> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn create_router(store: SharedStore) -> Router {
    let api = Router::new()
        // Entities
        .route("/names", get(handlers::list_names))
        .route("/entities", delete(handlers::delete_all))
        // Bounding boxes
        .route("/bounding-boxes", get(handlers::list_bounding_boxes))
        .route("/bounding-boxes", post(handlers::spawn_bounding_box))
        .route("/bounding-boxes/{id}", get(handlers::get_bounding_box))
        .route("/bounding-boxes/{id}", delete(handlers::delete_bounding_box))
        .route("/bounding-boxes/{id}/scale", put(handlers::set_bounding_box_scale))
        // Annotations
        .route("/annotations", get(handlers::list_annotations))
        .route("/annotations", post(handlers::spawn_annotation))
        .route("/annotations/{id}", get(handlers::get_annotation))
        .route("/annotations/{id}", delete(handlers::delete_annotation))
        .route("/annotations/{id}/text", put(handlers::set_annotation_text))
        // Focus
        .route("/focus", get(handlers::get_focus))
        .route("/focus", delete(handlers::delete_focused))
        .route("/focus/enter", post(handlers::focus_enter))
        .route("/focus/exit", post(handlers::focus_exit))
        .route("/focus/next-page", post(handlers::focused_next_page))
        .route("/focus/prev-page", post(handlers::focused_prev_page))
        .route("/focus/clear", post(handlers::focused_clear))
        .route("/focus/dictation", post(handlers::focused_start_dictation))
        // Dictation
        .route("/dictation/result", post(handlers::dictation_result))
        .route("/dictation/stop", post(handlers::stop_dictation))
        // Drag
        .route("/drag/start", post(handlers::drag_start))
        .route("/drag/stop", post(handlers::drag_stop))
        // Persistence
        .route("/save", post(handlers::save))
        .route("/lifecycle", post(handlers::lifecycle))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}
