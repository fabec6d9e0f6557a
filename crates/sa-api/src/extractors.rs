//! Application state and shared extractors

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use sa_attachments::{
    AttachmentManager, AttachmentResult, AttachmentStore, OwnerType, UploadValidator,
};
use sa_core::config::AppConfig;
use sa_core::counter::{MemorySequenceStore, SequenceStore};
use sa_services::{MemoryRepository, Page, StaffService, StudentService, UserService};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub attachments: Arc<AttachmentManager>,
    pub staff: Arc<StaffService>,
    pub students: Arc<StudentService>,
    pub users: Arc<UserService>,
}

impl AppState {
    /// Wire the services over in-memory repositories and the configured storage root
    pub fn new(config: AppConfig) -> AttachmentResult<Self> {
        let store = AttachmentStore::from_config(&config.storage)?;
        let attachments = Arc::new(AttachmentManager::new(Arc::new(store)));
        let sequences: Arc<dyn SequenceStore> = Arc::new(MemorySequenceStore::new());

        Ok(Self {
            staff: Arc::new(StaffService::new(
                Arc::new(MemoryRepository::new()),
                sequences.clone(),
                attachments.clone(),
            )),
            students: Arc::new(StudentService::new(
                Arc::new(MemoryRepository::new()),
                sequences.clone(),
                attachments.clone(),
            )),
            users: Arc::new(UserService::new(
                Arc::new(MemoryRepository::new()),
                sequences,
                attachments.clone(),
            )),
            attachments,
            config: Arc::new(config),
        })
    }

    pub fn store(&self) -> &AttachmentStore {
        self.attachments.store()
    }

    pub fn upload_validator(&self, owner_type: OwnerType) -> UploadValidator {
        UploadValidator::new(owner_type, self.config.uploads.clone())
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_page_size() -> usize {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            offset: 0,
        }
    }
}

pub struct Pagination(pub PaginationParams);

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|_| Query(PaginationParams::default()));
        Ok(Pagination(params))
    }
}

impl From<Pagination> for sa_services::Pagination {
    fn from(Pagination(params): Pagination) -> Self {
        sa_services::Pagination::new(params.page_size.clamp(1, 500), params.offset)
    }
}

/// Paginated list response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    pub total: usize,
    pub count: usize,
    pub page_size: usize,
    pub offset: usize,
    pub items: Vec<T>,
}

impl<T> From<Page<T>> for Collection<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            total: page.total,
            count: page.items.len(),
            page_size: page.limit,
            offset: page.offset,
            items: page.items,
        }
    }
}
