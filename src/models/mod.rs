//! Domain models for spatial tags.
//!
//! # Core Concepts
//!
//! ## Live Entities
//!
//! - [`BoundingBox`]: a scaled volume, named `BoundingBoxTag<n>`.
//! - [`Annotation`]: a text note of a [`TagKind`], named `<Kind>Tag<n>`.
//! - [`EntityRef`]: a tagged reference to either, used for focus and drag signals.
//!
//! ## Persisted Records
//!
//! Only the [`BoundingBoxRecord`] and [`AnnotationRecord`] projections are written
//! to disk. Poses are owned by the spatial anchor service, keyed by entity name.

mod entity;
mod geometry;
mod input;
mod pages;
mod record;

pub use entity::*;
pub use geometry::*;
pub use input::*;
pub use pages::*;
pub use record::*;
