pub mod bootcamp_service;
pub mod file_storage;

pub use bootcamp_service::{BootcampError, BootcampService};
pub use file_storage::{FileStorage, LocalBackend, PhotoUpload, StorageError};
