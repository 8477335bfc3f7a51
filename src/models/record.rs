use serde::{Deserialize, Serialize};

use super::{Annotation, BoundingBox, TagKind, Vector3};

/// Persisted projection of a [`BoundingBox`].
///
/// The pose is not stored here; it lives with the spatial anchor of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxRecord {
    pub name: String,
    pub scale: Vector3,
}

impl From<&BoundingBox> for BoundingBoxRecord {
    fn from(bbox: &BoundingBox) -> Self {
        Self {
            name: bbox.name.clone(),
            scale: bbox.scale,
        }
    }
}

/// Persisted projection of an [`Annotation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub name: String,
    pub kind: TagKind,
    pub text: String,
}

impl From<&Annotation> for AnnotationRecord {
    fn from(annotation: &Annotation) -> Self {
        Self {
            name: annotation.name.clone(),
            kind: annotation.kind,
            text: annotation.text.clone(),
        }
    }
}
