pub mod folder_camera;
pub mod folder_manager;

pub use folder_camera::FolderCamera;
pub use folder_manager::{FolderDetectionManager, FolderManagerFactory};
