use std::sync::Arc;

use thiserror::Error;

use crate::database::models::{Bootcamp, BootcampInput, Course, Review};
use crate::database::store::StoreError;
use crate::database::Repository;
use crate::filter::FilterData;
use crate::server::AppState;
use crate::services::file_storage::{FileStorage, PhotoUpload, StorageError};

#[derive(Debug, Error)]
pub enum BootcampError {
    #[error("The user with ID {0} has already published a bootcamp")]
    AlreadyPublished(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Bootcamp operations that span more than one collection or the file store
pub struct BootcampService {
    bootcamps: Repository<Bootcamp>,
    courses: Repository<Course>,
    reviews: Repository<Review>,
    files: Arc<dyn FileStorage>,
    max_file_upload: usize,
}

impl BootcampService {
    pub fn new(state: &AppState) -> Self {
        Self {
            bootcamps: state.repository(),
            courses: state.repository(),
            reviews: state.repository(),
            files: state.files.clone(),
            max_file_upload: state.config.upload.max_file_upload,
        }
    }

    /// Non-admin owners may publish a single bootcamp
    pub async fn create(&self, owner_id: &str, is_admin: bool, input: BootcampInput) -> Result<Bootcamp, BootcampError> {
        if !is_admin {
            let published = self.bootcamps.select_one(FilterData::by_field("user", owner_id)).await?;
            if published.is_some() {
                return Err(BootcampError::AlreadyPublished(owner_id.to_string()));
            }
        }
        Ok(self.bootcamps.create(input.into_new_document(owner_id)).await?)
    }

    /// Remove a bootcamp after each of its courses and reviews, one at a time
    pub async fn delete_cascade(&self, id: &str) -> Result<Option<Bootcamp>, BootcampError> {
        if self.bootcamps.select_id(id).await?.is_none() {
            return Ok(None);
        }

        let courses = self.courses.select_any(FilterData::by_field("bootcamp", id)).await?;
        for course in &courses {
            self.courses.delete(&course.id).await?;
        }
        let reviews = self.reviews.select_any(FilterData::by_field("bootcamp", id)).await?;
        for review in &reviews {
            self.reviews.delete(&review.id).await?;
        }
        tracing::info!(
            "Removed {} course(s) and {} review(s) of bootcamp {}",
            courses.len(), reviews.len(), id
        );

        Ok(self.bootcamps.delete(id).await?)
    }

    /// Store the photo as `photo_{id}{ext}` and record it on the bootcamp
    pub async fn upload_photo(&self, bootcamp: &Bootcamp, upload: PhotoUpload) -> Result<String, BootcampError> {
        let name = upload.stored_name(&bootcamp.id, self.max_file_upload)?;
        self.files.write(&name, &upload.data).await?;

        let mut patch = serde_json::Map::new();
        patch.insert("photo".into(), serde_json::Value::String(name.clone()));
        self.bootcamps.update(&bootcamp.id, patch).await?;
        Ok(name)
    }
}
