use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Canonical lifecycle of an internship application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Submitted,
    ReviewedByCompany,
    ApprovedByFaculty,
    ApprovedByAdmin,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::ReviewedByCompany,
        ApplicationStatus::ApprovedByFaculty,
        ApplicationStatus::ApprovedByAdmin,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::ReviewedByCompany => "REVIEWED_BY_COMPANY",
            ApplicationStatus::ApprovedByFaculty => "APPROVED_BY_FACULTY",
            ApplicationStatus::ApprovedByAdmin => "APPROVED_BY_ADMIN",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::ApprovedByAdmin | ApplicationStatus::Rejected
        )
    }

    /// Reduced three-state view shown to students and companies.
    pub const fn review_status(self) -> ReviewStatus {
        match self {
            ApplicationStatus::Submitted
            | ApplicationStatus::ReviewedByCompany
            | ApplicationStatus::ApprovedByFaculty => ReviewStatus::Pending,
            ApplicationStatus::ApprovedByAdmin => ReviewStatus::Approved,
            ApplicationStatus::Rejected => ReviewStatus::Rejected,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Application {
    pub id: i64,
    pub student_id: i64,
    pub internship_id: i64,
    pub position_title: String,
    pub status: ApplicationStatus,
    pub review_comment: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub student_id: i64,
    pub internship_id: i64,
    pub position_title: String,
}

/// Which slice of the applications table a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationFilter {
    All,
    Student(i64),
    Company(i64),
    Internship(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_status_projects_five_states_onto_three() {
        use crate::models::application::ApplicationStatus::*;
        assert_eq!(Submitted.review_status(), ReviewStatus::Pending);
        assert_eq!(ReviewedByCompany.review_status(), ReviewStatus::Pending);
        assert_eq!(ApprovedByFaculty.review_status(), ReviewStatus::Pending);
        assert_eq!(ApprovedByAdmin.review_status(), ReviewStatus::Approved);
        assert_eq!(Rejected.review_status(), ReviewStatus::Rejected);
    }

    #[test]
    fn only_admin_approval_and_rejection_are_terminal() {
        let terminal: Vec<_> = ApplicationStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![ApplicationStatus::ApprovedByAdmin, ApplicationStatus::Rejected]
        );
    }

    #[test]
    fn status_serializes_in_screaming_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::ReviewedByCompany).unwrap();
        assert_eq!(json, "\"REVIEWED_BY_COMPANY\"");
    }
}
