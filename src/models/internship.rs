use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Internship {
    pub id: i64,
    pub company_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub seats: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternshipStatus {
    Active,
    Closed,
}

impl Internship {
    /// Closed once the end date lies strictly in the past; open-ended postings stay active.
    pub fn status_on(&self, today: NaiveDate) -> InternshipStatus {
        match self.end_date {
            Some(end) if end < today => InternshipStatus::Closed,
            _ => InternshipStatus::Active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewInternship {
    pub company_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub seats: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
