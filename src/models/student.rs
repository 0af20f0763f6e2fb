use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentProfile {
    pub id: i64,
    pub account_id: i64,
    pub student_code: String,
    pub full_name: String,
    pub major: Option<String>,
    pub year: Option<i32>,
    /// Filename in the document store, never the content.
    pub cv_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStudentProfile {
    pub account_id: i64,
    pub student_code: String,
    pub full_name: String,
    pub major: Option<String>,
    pub year: Option<i32>,
}

