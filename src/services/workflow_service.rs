use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use validator::Validate;

use crate::database::Store;
use crate::dto::application_dto::{
    ApplicationCounts, ApplicationResponse, SubmitApplicationPayload,
};
use crate::error::{Error, Result};
use crate::middleware::auth::Identity;
use crate::models::{
    account::Role,
    application::{Application, ApplicationFilter, ReviewStatus},
    evaluation::Evaluation,
};
use crate::services::{
    evaluation_service::EvaluationService,
    lifecycle::{Action, LifecycleEngine},
    role_gate::{authorize, Resource, RoleGate, ANY_ROLE},
};
use crate::utils::time::today;

/// A failed workflow action, carrying the application as it is stored after the failure.
#[derive(Debug)]
pub struct WorkflowError {
    pub error: Error,
    pub current: Option<Application>,
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

impl From<Error> for WorkflowError {
    fn from(error: Error) -> Self {
        Self {
            error,
            current: None,
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let Some(current) = self.current else {
            return self.error.into_response();
        };
        let status = self.error.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.error, "workflow action failed");
        }
        let body = json!({
            "error": self.error.public_message(),
            "application": ApplicationResponse::from(current),
        });
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

/// An application together with its optional evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationAggregate {
    pub application: Application,
    pub evaluation: Option<Evaluation>,
}

#[derive(Clone)]
pub struct WorkflowService {
    store: Arc<dyn Store>,
    gate: RoleGate,
    engine: LifecycleEngine,
    evaluations: EvaluationService,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn Store>, evaluations: EvaluationService) -> Self {
        Self {
            gate: RoleGate::new(store.clone()),
            engine: LifecycleEngine::new(store.clone()),
            store,
            evaluations,
        }
    }

    pub async fn submit(
        &self,
        identity: Option<&Identity>,
        payload: SubmitApplicationPayload,
    ) -> Result<Application> {
        let identity = authorize(identity, &[Role::Student])?;
        payload.validate()?;
        let student = self
            .store
            .find_student(payload.student_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Student {} not found", payload.student_id)))?;
        self.gate
            .ensure_owns(identity, Resource::StudentProfile(student.id))
            .await?;
        let internship = self
            .store
            .find_internship(payload.internship_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Internship {} not found", payload.internship_id))
            })?;

        self.engine
            .submit(&student, &internship, payload.position_title, today())
            .await
    }

    pub async fn company_review(
        &self,
        identity: Option<&Identity>,
        application_id: i64,
        accept: bool,
        comment: Option<String>,
    ) -> WorkflowResult<Application> {
        let identity = authorize(identity, &[Role::Company])?;
        self.apply(
            identity,
            application_id,
            Action::CompanyReview { accept, comment },
        )
        .await
    }

    pub async fn faculty_approve(
        &self,
        identity: Option<&Identity>,
        application_id: i64,
        approve: bool,
    ) -> WorkflowResult<Application> {
        let identity = authorize(identity, &[Role::Faculty, Role::Admin])?;
        self.apply(identity, application_id, Action::FacultyApprove { approve })
            .await
    }

    pub async fn admin_approve(
        &self,
        identity: Option<&Identity>,
        application_id: i64,
        approve: bool,
    ) -> WorkflowResult<Application> {
        let identity = authorize(identity, &[Role::Admin])?;
        self.apply(identity, application_id, Action::AdminApprove { approve })
            .await
    }

    pub async fn evaluate(
        &self,
        identity: Option<&Identity>,
        application_id: i64,
        score: i32,
        comments: Option<String>,
    ) -> WorkflowResult<Evaluation> {
        let identity = authorize(identity, &[Role::Company, Role::Admin])?;
        let application = self.load(application_id).await?;
        self.gate
            .ensure_owns(identity, Resource::Application(application.id))
            .await?;

        match self
            .evaluations
            .record_evaluation(application.id, score, comments)
            .await
        {
            Ok(evaluation) => Ok(evaluation),
            Err(error) => Err(self.failed(error, application).await),
        }
    }

    /// Out-of-scope reads look exactly like unknown ids.
    pub async fn get_application(
        &self,
        identity: Option<&Identity>,
        application_id: i64,
    ) -> Result<ApplicationAggregate> {
        let identity = authorize(identity, ANY_ROLE)?;
        let application = self.load(application_id).await?;
        if !self.gate.can_view_application(identity, application.id).await? {
            tracing::warn!(
                account_id = identity.account_id,
                application_id,
                "application outside caller scope"
            );
            return Err(not_found(application_id));
        }
        let evaluation = self.evaluations.find(application.id).await?;
        Ok(ApplicationAggregate {
            application,
            evaluation,
        })
    }

    pub async fn list_applications(&self, identity: Option<&Identity>) -> Result<Vec<Application>> {
        let identity = authorize(identity, ANY_ROLE)?;
        self.gate.scope_applications(identity).await
    }

    /// Totals over the same rows [`WorkflowService::list_applications`] returns.
    pub async fn application_counts(
        &self,
        identity: Option<&Identity>,
    ) -> Result<ApplicationCounts> {
        let applications = self.list_applications(identity).await?;
        Ok(ApplicationCounts {
            total: applications.len() as i64,
            pending: applications
                .iter()
                .filter(|a| a.status.review_status() == ReviewStatus::Pending)
                .count() as i64,
        })
    }

    /// Applicants for one internship, for its company and the approving roles.
    pub async fn list_for_internship(
        &self,
        identity: Option<&Identity>,
        internship_id: i64,
    ) -> Result<Vec<Application>> {
        let identity = authorize(identity, &[Role::Company, Role::Faculty, Role::Admin])?;
        if self.store.find_internship(internship_id).await?.is_none() {
            return Err(Error::NotFound(format!("Internship {} not found", internship_id)));
        }
        match identity.role {
            Role::Company => {
                self.gate
                    .ensure_owns(identity, Resource::Internship(internship_id))
                    .await?
            }
            Role::Student | Role::Faculty | Role::Admin => {}
        }
        self.store
            .list_applications(ApplicationFilter::Internship(internship_id))
            .await
    }

    pub async fn get_evaluation(
        &self,
        identity: Option<&Identity>,
        application_id: i64,
    ) -> Result<Evaluation> {
        let aggregate = self.get_application(identity, application_id).await?;
        aggregate.evaluation.ok_or_else(|| {
            Error::NotFound(format!("Application {} has no evaluation", application_id))
        })
    }

    /// Load, re-check ownership, then hand over to the lifecycle engine.
    async fn apply(
        &self,
        identity: &Identity,
        application_id: i64,
        action: Action,
    ) -> WorkflowResult<Application> {
        let application = self.load(application_id).await?;
        match identity.role {
            Role::Student | Role::Company => {
                self.gate
                    .ensure_owns(identity, Resource::Application(application.id))
                    .await?
            }
            Role::Faculty | Role::Admin => {}
        }

        match self
            .engine
            .transition(&application, &action, identity.role)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(error) => Err(self.failed(error, application).await),
        }
    }

    async fn load(&self, application_id: i64) -> Result<Application> {
        self.store
            .find_application(application_id)
            .await?
            .ok_or_else(|| not_found(application_id))
    }

    /// Pairs the error with the stored record, which may have moved on if a concurrent call won.
    async fn failed(&self, error: Error, read: Application) -> WorkflowError {
        let current = match self.store.find_application(read.id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => read,
            Err(err) => {
                tracing::warn!(
                    application_id = read.id,
                    error = %err,
                    "could not reload application"
                );
                read
            }
        };
        WorkflowError {
            error,
            current: Some(current),
        }
    }
}

fn not_found(application_id: i64) -> Error {
    Error::NotFound(format!("Application {} not found", application_id))
}
