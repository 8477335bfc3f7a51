use crate::models::{Pose, Quaternion};

/// Where newly spawned entities appear.
pub trait PlacementProvider: Send {
    /// Pose for a new entity, relative to the current camera.
    fn spawn_pose(&self) -> Pose;

    /// Orientation of the menu; new annotations face the same way.
    fn menu_rotation(&self) -> Quaternion;
}

/// Places entities a fixed distance in front of a camera pose.
#[derive(Debug, Clone, Copy)]
pub struct CameraPlacement {
    pub camera: Pose,
    pub distance: f32,
    pub menu_rotation: Quaternion,
}

impl CameraPlacement {
    pub fn new(camera: Pose, distance: f32) -> Self {
        Self {
            camera,
            distance,
            menu_rotation: camera.rotation,
        }
    }
}

impl Default for CameraPlacement {
    fn default() -> Self {
        Self::new(Pose::default(), 2.0)
    }
}

impl PlacementProvider for CameraPlacement {
    fn spawn_pose(&self) -> Pose {
        let position = self.camera.position + self.camera.forward() * self.distance;
        Pose::new(position, Quaternion::IDENTITY)
    }

    fn menu_rotation(&self) -> Quaternion {
        self.menu_rotation
    }
}
