//! User account services

use std::sync::Arc;

use sa_attachments::AttachmentManager;
use sa_core::counter::{next_code, CodeKind, SequenceStore};
use sa_core::traits::new_id;
use sa_core::SaError;
use sa_models::{NewUser, UpdateUser, User};
use tracing::{instrument, warn};
use validator::Validate;

use crate::error::ServiceResult;
use crate::password::hash_password;
use crate::repository::{Page, Pagination, Repository};
use crate::workflow::{AttachmentRequest, RecordWorkflow};

/// Create, update and delete user accounts with their avatar
pub struct UserService {
    workflow: RecordWorkflow<User>,
    sequences: Arc<dyn SequenceStore>,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn Repository<User>>,
        sequences: Arc<dyn SequenceStore>,
        attachments: Arc<AttachmentManager>,
    ) -> Self {
        Self {
            workflow: RecordWorkflow::new(repository, attachments),
            sequences,
        }
    }

    #[instrument(skip_all)]
    pub async fn create(&self, params: NewUser, request: AttachmentRequest) -> ServiceResult<User> {
        let wf = &self.workflow;
        wf.or_discard(&request, params.validate()).await?;

        let password_hash = wf
            .or_discard(&request, hash_password(&params.password))
            .await?;
        let code = wf
            .or_discard(&request, next_code(self.sequences.as_ref(), CodeKind::User).await)
            .await?;
        let user = User::new(new_id(), code, params, password_hash);
        wf.or_discard(&request, user.validate()).await?;

        wf.create(user, request).await
    }

    #[instrument(skip(self, params, request))]
    pub async fn update(
        &self,
        id: &str,
        mut params: UpdateUser,
        request: AttachmentRequest,
    ) -> ServiceResult<User> {
        let wf = &self.workflow;
        let mut user = wf.load_for(id, &request).await?;
        wf.or_discard(&request, params.validate()).await?;

        if let Some(password) = params.password.take() {
            user.password_hash = wf.or_discard(&request, hash_password(&password)).await?;
        }
        user.apply(params);
        wf.or_discard(&request, user.validate()).await?;

        wf.update(user, request).await
    }

    /// Delete a user; the last `SuperAdmin` cannot be deleted
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> ServiceResult<User> {
        let user = self.workflow.get(id).await?;
        if user.is_super_admin() {
            let super_admins = self
                .workflow
                .repository()
                .filter(&|u: &User| u.is_super_admin())
                .await?;
            if super_admins.len() <= 1 {
                warn!("Refusing to delete the last SuperAdmin");
                return Err(SaError::forbidden("Cannot delete the last SuperAdmin").into());
            }
        }
        self.workflow.delete(id).await
    }

    pub async fn get(&self, id: &str) -> ServiceResult<User> {
        self.workflow.get(id).await
    }

    pub async fn list(&self, pagination: Pagination) -> ServiceResult<Page<User>> {
        self.workflow.list(pagination).await
    }
}
