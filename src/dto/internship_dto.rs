use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::internship::{Internship, InternshipStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_dates"))]
pub struct CreateInternshipPayload {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(range(min = 0))]
    pub seats: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateInternshipPayload {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(range(min = 0))]
    pub seats: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn validate_create_dates(payload: &CreateInternshipPayload) -> Result<(), ValidationError> {
    check_date_order(payload.start_date, payload.end_date)
}

pub fn check_date_order(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            Err(ValidationError::new("end_date_before_start_date"))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InternshipResponse {
    pub id: i64,
    pub company_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub seats: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: InternshipStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InternshipListResponse {
    pub items: Vec<InternshipResponse>,
    pub total: usize,
}

impl InternshipResponse {
    pub fn from_internship(value: Internship, today: NaiveDate) -> Self {
        let status = value.status_on(today);
        Self {
            id: value.id,
            company_id: value.company_id,
            title: value.title,
            description: value.description,
            location: value.location,
            seats: value.seats,
            start_date: value.start_date,
            end_date: value.end_date,
            status,
            created_at: value.created_at,
        }
    }
}

impl InternshipListResponse {
    pub fn from_internships(items: Vec<Internship>, today: NaiveDate) -> Self {
        let items: Vec<InternshipResponse> = items
            .into_iter()
            .map(|i| InternshipResponse::from_internship(i, today))
            .collect();
        Self {
            total: items.len(),
            items,
        }
    }
}
