use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStudentProfilePayload {
    #[validate(length(min = 1, max = 50))]
    pub student_code: String,
    #[validate(length(min = 1, max = 150))]
    pub full_name: String,
    #[validate(length(max = 100))]
    pub major: Option<String>,
    #[validate(range(min = 1, max = 8))]
    pub year: Option<i32>,
}

/// Absent fields are left as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentProfilePayload {
    #[validate(length(min = 1, max = 150))]
    pub full_name: Option<String>,
    #[validate(length(max = 100))]
    pub major: Option<String>,
    #[validate(range(min = 1, max = 8))]
    pub year: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub cv_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyProfilePayload {
    #[validate(length(min = 1, max = 150))]
    pub company_name: String,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 30))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 255))]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyProfilePayload {
    #[validate(length(min = 1, max = 150))]
    pub company_name: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 30))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 255))]
    pub website: Option<String>,
}
