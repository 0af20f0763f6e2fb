use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{
    application::{Application, ApplicationStatus, ReviewStatus},
    evaluation::Evaluation,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitApplicationPayload {
    pub student_id: i64,
    pub internship_id: i64,
    #[validate(length(min = 1, max = 150))]
    pub position_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CompanyReviewPayload {
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub accept: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApprovalPayload {
    pub approve: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EvaluationPayload {
    pub score: i32,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: i64,
    pub student_id: i64,
    pub internship_id: i64,
    pub position_title: String,
    pub status: ApplicationStatus,
    pub review_status: ReviewStatus,
    pub review_comment: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationCounts {
    pub total: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationResponse {
    pub id: i64,
    pub application_id: i64,
    pub score: i32,
    pub comments: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl From<Application> for ApplicationResponse {
    fn from(value: Application) -> Self {
        Self {
            id: value.id,
            student_id: value.student_id,
            internship_id: value.internship_id,
            position_title: value.position_title,
            status: value.status,
            review_status: value.status.review_status(),
            review_comment: value.review_comment,
            applied_at: value.applied_at,
            updated_at: value.updated_at,
            evaluation: None,
        }
    }
}

impl ApplicationResponse {
    pub fn with_evaluation(mut self, evaluation: Option<Evaluation>) -> Self {
        self.evaluation = evaluation.map(Into::into);
        self
    }
}

impl From<Vec<Application>> for ApplicationListResponse {
    fn from(value: Vec<Application>) -> Self {
        let items: Vec<ApplicationResponse> = value.into_iter().map(Into::into).collect();
        Self {
            total: items.len(),
            items,
        }
    }
}

impl From<Evaluation> for EvaluationResponse {
    fn from(value: Evaluation) -> Self {
        Self {
            id: value.id,
            application_id: value.application_id,
            score: value.score,
            comments: value.comments,
            evaluated_at: value.evaluated_at,
        }
    }
}
