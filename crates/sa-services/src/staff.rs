//! Staff services

use std::sync::Arc;

use sa_attachments::AttachmentManager;
use sa_core::counter::{next_code, CodeKind, SequenceStore};
use sa_core::traits::new_id;
use sa_models::{NewStaff, Staff, UpdateStaff};
use tracing::instrument;
use validator::Validate;

use crate::error::ServiceResult;
use crate::repository::{Page, Pagination, Repository};
use crate::workflow::{AttachmentRequest, RecordWorkflow};

/// Create, update and delete staff members with their documents and photo
pub struct StaffService {
    workflow: RecordWorkflow<Staff>,
    sequences: Arc<dyn SequenceStore>,
}

impl StaffService {
    pub fn new(
        repository: Arc<dyn Repository<Staff>>,
        sequences: Arc<dyn SequenceStore>,
        attachments: Arc<AttachmentManager>,
    ) -> Self {
        Self {
            workflow: RecordWorkflow::new(repository, attachments),
            sequences,
        }
    }

    #[instrument(skip_all)]
    pub async fn create(
        &self,
        params: NewStaff,
        request: AttachmentRequest,
    ) -> ServiceResult<Staff> {
        let wf = &self.workflow;
        wf.or_discard(&request, params.validate()).await?;

        let code = wf
            .or_discard(&request, next_code(self.sequences.as_ref(), CodeKind::Staff).await)
            .await?;
        let staff = Staff::new(new_id(), code, params);
        wf.or_discard(&request, staff.validate()).await?;

        wf.create(staff, request).await
    }

    #[instrument(skip(self, params, request))]
    pub async fn update(
        &self,
        id: &str,
        params: UpdateStaff,
        request: AttachmentRequest,
    ) -> ServiceResult<Staff> {
        let wf = &self.workflow;
        let mut staff = wf.load_for(id, &request).await?;
        wf.or_discard(&request, params.validate()).await?;

        staff.apply(params);
        wf.or_discard(&request, staff.validate()).await?;

        wf.update(staff, request).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<Staff> {
        self.workflow.delete(id).await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Staff> {
        self.workflow.get(id).await
    }

    pub async fn list(&self, pagination: Pagination) -> ServiceResult<Page<Staff>> {
        self.workflow.list(pagination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::repository::MemoryRepository;
    use crate::workflow::test_support::*;
    use sa_attachments::{PhotoSlot, UploadBatch, UploadKind};
    use sa_core::counter::MemorySequenceStore;
    use sa_core::SaError;
    use tempfile::TempDir;

    fn service(temp: &TempDir) -> StaffService {
        StaffService::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemorySequenceStore::new()),
            manager(temp),
        )
    }

    fn params(email: &str) -> NewStaff {
        NewStaff {
            full_name: "Meera Iyer".into(),
            email: email.into(),
            ..Default::default()
        }
    }

    async fn request_with(
        service: &StaffService,
        files: &[(&str, UploadKind, &str)],
    ) -> AttachmentRequest {
        let mut batch = UploadBatch::new();
        for (field, kind, name) in files {
            batch.push(stage(service.workflow.attachments(), field, *kind, name).await);
        }
        AttachmentRequest::new(batch, Vec::new())
    }

    #[tokio::test]
    async fn test_create_with_documents_and_photo() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        let request = request_with(
            &service,
            &[
                ("documents", UploadKind::Document, "cv.pdf"),
                ("photo", UploadKind::Photo(PhotoSlot::Staff), "me.png"),
            ],
        )
        .await;

        let staff = service.create(params("meera@school.edu"), request).await.unwrap();

        assert_eq!(staff.staff_code, "STAFF0001");
        assert_eq!(staff.documents.len(), 1);
        let photo = staff.photo.as_ref().unwrap();
        assert!(photo.stored_path.starts_with(&format!(
            "uploads/staff/STAFF0001/{}/photo/photo-",
            staff.id
        )));
        assert!(exists(&temp, &photo.stored_path));
        assert!(exists(&temp, &staff.documents[0].stored_path));
        assert!(staging_is_empty(&temp));
        assert_eq!(service.get(&staff.id).await.unwrap().id, staff.id);
    }

    #[tokio::test]
    async fn test_invalid_params_discard_staged_files() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        let request = request_with(&service, &[("documents", UploadKind::Document, "a.pdf")]).await;

        let err = service.create(params("nope"), request).await.unwrap_err();

        assert!(matches!(err, ServiceError::Core(SaError::Validation(_))));
        assert!(staging_is_empty(&temp));
        assert!(!exists(&temp, "uploads/staff"));
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_committed_files() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        service
            .create(params("dup@school.edu"), AttachmentRequest::default())
            .await
            .unwrap();

        let request = request_with(&service, &[("documents", UploadKind::Document, "a.pdf")]).await;
        let err = service.create(params("dup@school.edu"), request).await.unwrap_err();

        assert!(matches!(err, ServiceError::Core(SaError::Conflict { .. })));
        assert!(staging_is_empty(&temp));
        assert_eq!(files_under(&temp, "uploads/staff/STAFF0002"), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_photo_and_removes_documents() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        let request = request_with(
            &service,
            &[
                ("documents", UploadKind::Document, "a.pdf"),
                ("documents", UploadKind::Document, "b.pdf"),
                ("photo", UploadKind::Photo(PhotoSlot::Staff), "old.png"),
            ],
        )
        .await;
        let staff = service.create(params("s@school.edu"), request).await.unwrap();
        let old_photo = staff.photo.clone().unwrap().stored_path;
        let removed_doc = staff.documents[0].stored_path.clone();

        let mut request =
            request_with(&service, &[("photo", UploadKind::Photo(PhotoSlot::Staff), "new.jpg")]).await;
        request.removed_files = vec![removed_doc.clone()];
        let updated = service
            .update(
                &staff.id,
                UpdateStaff {
                    designation: Some("Principal".into()),
                    ..Default::default()
                },
                request,
            )
            .await
            .unwrap();

        assert_eq!(updated.designation, "Principal");
        assert_eq!(updated.documents.len(), 1);
        let new_photo = updated.photo.unwrap().stored_path;
        assert!(new_photo.ends_with(".jpg"));
        assert!(exists(&temp, &new_photo));
        assert!(!exists(&temp, &old_photo));
        assert!(!exists(&temp, &removed_doc));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_old_files() {
        let temp = TempDir::new().unwrap();
        let attachments = manager(&temp);
        let seed = StaffService::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemorySequenceStore::new()),
            attachments.clone(),
        );
        let mut batch = UploadBatch::new();
        batch.push(stage(&attachments, "photo", UploadKind::Photo(PhotoSlot::Staff), "a.png").await);
        let staff = seed
            .create(params("x@school.edu"), AttachmentRequest::new(batch, Vec::new()))
            .await
            .unwrap();
        let old_photo = staff.photo.clone().unwrap().stored_path;

        let repo = MemoryRepository::new();
        repo.insert(staff.clone()).await.unwrap();
        let failing = StaffService::new(
            Arc::new(FailingWrites(repo)),
            Arc::new(MemorySequenceStore::new()),
            attachments.clone(),
        );

        let mut batch = UploadBatch::new();
        batch.push(stage(&attachments, "photo", UploadKind::Photo(PhotoSlot::Staff), "b.png").await);
        let err = failing
            .update(
                &staff.id,
                UpdateStaff::default(),
                AttachmentRequest::new(batch, vec![old_photo.clone()]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Core(SaError::Internal(_))));
        assert!(exists(&temp, &old_photo));
        assert!(staging_is_empty(&temp));
        let photo_dir = format!("uploads/staff/STAFF0001/{}/photo", staff.id);
        assert_eq!(files_under(&temp, &photo_dir), 1);
    }

    #[tokio::test]
    async fn test_consecutive_photo_updates_leave_one_file() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        let request =
            request_with(&service, &[("photo", UploadKind::Photo(PhotoSlot::Staff), "0.png")]).await;
        let mut staff = service.create(params("r@school.edu"), request).await.unwrap();
        let photo_dir = format!("uploads/staff/STAFF0001/{}/photo", staff.id);

        for name in ["1.png", "2.png", "3.png"] {
            let previous = staff.photo.clone().unwrap().stored_path;
            let request =
                request_with(&service, &[("photo", UploadKind::Photo(PhotoSlot::Staff), name)]).await;
            staff = service
                .update(&staff.id, UpdateStaff::default(), request)
                .await
                .unwrap();

            let current = staff.photo.clone().unwrap().stored_path;
            assert_ne!(current, previous);
            assert!(!exists(&temp, &previous));
            assert!(exists(&temp, &current));
            assert_eq!(files_under(&temp, &photo_dir), 1);
        }
    }

    #[tokio::test]
    async fn test_failed_photo_update_right_after_create() {
        let temp = TempDir::new().unwrap();
        let attachments = manager(&temp);
        let seed = StaffService::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemorySequenceStore::new()),
            attachments.clone(),
        );
        let mut batch = UploadBatch::new();
        batch.push(stage(&attachments, "photo", UploadKind::Photo(PhotoSlot::Staff), "a.png").await);
        let staff = seed
            .create(params("y@school.edu"), AttachmentRequest::new(batch, Vec::new()))
            .await
            .unwrap();

        let repo = MemoryRepository::new();
        repo.insert(staff.clone()).await.unwrap();
        let failing = StaffService::new(
            Arc::new(FailingWrites(repo)),
            Arc::new(MemorySequenceStore::new()),
            attachments.clone(),
        );
        let mut batch = UploadBatch::new();
        batch.push(stage(&attachments, "photo", UploadKind::Photo(PhotoSlot::Staff), "a.png").await);
        let err = failing
            .update(&staff.id, UpdateStaff::default(), AttachmentRequest::new(batch, Vec::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Core(SaError::Internal(_))));
        let saved = seed.get(&staff.id).await.unwrap();
        assert!(exists(&temp, &saved.photo.unwrap().stored_path));
        let photo_dir = format!("uploads/staff/STAFF0001/{}/photo", staff.id);
        assert_eq!(files_under(&temp, &photo_dir), 1);
        assert!(staging_is_empty(&temp));
    }

    #[tokio::test]
    async fn test_update_missing_record_discards_uploads() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        let request = request_with(&service, &[("documents", UploadKind::Document, "a.pdf")]).await;

        let err = service
            .update("missing", UpdateStaff::default(), request)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Core(SaError::NotFound { .. })));
        assert!(staging_is_empty(&temp));
    }

    #[tokio::test]
    async fn test_delete_purges_owner_directory() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        let request = request_with(&service, &[("documents", UploadKind::Document, "a.pdf")]).await;
        let staff = service.create(params("d@school.edu"), request).await.unwrap();
        let owner_dir = format!("uploads/staff/{}/{}", staff.staff_code, staff.id);
        assert!(exists(&temp, &owner_dir));

        service.delete(&staff.id).await.unwrap();

        assert!(!exists(&temp, &owner_dir));
        assert!(matches!(
            service.delete(&staff.id).await,
            Err(ServiceError::Core(SaError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_photo_in_documents_field_is_not_a_staff_photo() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);
        let request = request_with(&service, &[("documents", UploadKind::Document, "scan.png")]).await;

        let staff = service.create(params("p@school.edu"), request).await.unwrap();
        assert!(staff.photo.is_none());
        assert!(staff.documents[0].stored_path.contains("/documents/"));
    }
}
