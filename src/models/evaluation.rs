use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Evaluation {
    pub id: i64,
    pub application_id: i64,
    pub score: i32,
    pub comments: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub application_id: i64,
    pub score: i32,
    pub comments: Option<String>,
}
