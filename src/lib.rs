//! Spatially anchored tags and bounding boxes.
//!
//! The [`store::AnnotationStore`] owns every entity, names them, tracks the
//! single focused entity, persists both record streams through
//! [`codec::PersistenceCodec`] and keeps each entity's spatial anchor in step
//! through [`binding::AnchorBinding`]. Rendering, gaze, speech and menus are
//! external and reach the store through the traits in [`anchors`],
//! [`placement`] and [`dictation`], or through the HTTP [`api`].

pub mod anchors;
pub mod api;
pub mod binding;
pub mod codec;
pub mod config;
pub mod dictation;
pub mod focus;
pub mod models;
pub mod placement;
pub mod store;
