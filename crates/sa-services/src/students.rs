//! Student services

use std::sync::Arc;

use sa_attachments::AttachmentManager;
use sa_core::counter::{next_code, CodeKind, SequenceStore};
use sa_core::traits::new_id;
use sa_models::{NewStudent, Student, UpdateStudent};
use tracing::instrument;
use validator::Validate;

use crate::error::ServiceResult;
use crate::repository::{Page, Pagination, Repository};
use crate::workflow::{AttachmentRequest, RecordWorkflow};

/// Create, update and delete students with their documents and family photos
pub struct StudentService {
    workflow: RecordWorkflow<Student>,
    sequences: Arc<dyn SequenceStore>,
}

impl StudentService {
    pub fn new(
        repository: Arc<dyn Repository<Student>>,
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
        params: NewStudent,
        request: AttachmentRequest,
    ) -> ServiceResult<Student> {
        let wf = &self.workflow;
        wf.or_discard(&request, params.validate()).await?;

        let code = wf
            .or_discard(&request, next_code(self.sequences.as_ref(), CodeKind::Student).await)
            .await?;
        let student = Student::new(new_id(), code, params);
        wf.or_discard(&request, student.validate()).await?;

        wf.create(student, request).await
    }

    #[instrument(skip(self, params, request))]
    pub async fn update(
        &self,
        id: &str,
        params: UpdateStudent,
        request: AttachmentRequest,
    ) -> ServiceResult<Student> {
        let wf = &self.workflow;
        let mut student = wf.load_for(id, &request).await?;
        wf.or_discard(&request, params.validate()).await?;

        student.apply(params);
        wf.or_discard(&request, student.validate()).await?;

        wf.update(student, request).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<Student> {
        self.workflow.delete(id).await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Student> {
        self.workflow.get(id).await
    }

    pub async fn list(&self, pagination: Pagination) -> ServiceResult<Page<Student>> {
        self.workflow.list(pagination).await
    }
}
