pub mod memory;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    account::{Account, NewAccount},
    application::{Application, ApplicationFilter, ApplicationStatus, NewApplication},
    company::{CompanyProfile, NewCompanyProfile},
    evaluation::{Evaluation, NewEvaluation},
    internship::{Internship, NewInternship},
    student::{NewStudentProfile, StudentProfile},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: i64,
    pub expected: ApplicationStatus,
    pub next: ApplicationStatus,
    pub review_comment: Option<String>,
    pub claims_seat: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(Application),
    /// The stored status moved on, or the application is gone.
    Stale,
    NoSeats,
}

/// Storage collaborator. Every call is atomic on its own; nothing here retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_account(&self, id: i64) -> Result<Option<Account>>;
    async fn list_accounts(&self) -> Result<Vec<Account>>;
    async fn insert_account(&self, account: NewAccount) -> Result<Account>;
    async fn update_account(&self, account: Account) -> Result<Account>;

    async fn find_student(&self, id: i64) -> Result<Option<StudentProfile>>;
    async fn find_student_by_account(&self, account_id: i64) -> Result<Option<StudentProfile>>;
    async fn insert_student(&self, profile: NewStudentProfile) -> Result<StudentProfile>;
    async fn update_student(&self, profile: StudentProfile) -> Result<StudentProfile>;

    async fn find_company_by_account(&self, account_id: i64) -> Result<Option<CompanyProfile>>;
    async fn count_companies(&self) -> Result<i64>;
    async fn insert_company(&self, profile: NewCompanyProfile) -> Result<CompanyProfile>;
    async fn update_company(&self, profile: CompanyProfile) -> Result<CompanyProfile>;

    async fn find_internship(&self, id: i64) -> Result<Option<Internship>>;
    /// `None` lists every internship, newest first.
    async fn list_internships(&self, company_id: Option<i64>) -> Result<Vec<Internship>>;
    async fn insert_internship(&self, internship: NewInternship) -> Result<Internship>;
    async fn update_internship(&self, internship: Internship) -> Result<Internship>;
    /// Without `cascade`, fails with `InternshipInUse` while any application references it.
    async fn delete_internship(&self, id: i64, cascade: bool) -> Result<bool>;

    async fn find_application(&self, id: i64) -> Result<Option<Application>>;
    async fn find_application_by_pair(
        &self,
        student_id: i64,
        internship_id: i64,
    ) -> Result<Option<Application>>;
    async fn list_applications(&self, filter: ApplicationFilter) -> Result<Vec<Application>>;
    async fn count_applications_in_status(
        &self,
        internship_id: i64,
        status: ApplicationStatus,
    ) -> Result<i64>;
    /// Fails with `DuplicateApplication` when the student already applied to the internship.
    async fn insert_application(&self, application: NewApplication) -> Result<Application>;
    /// Applies the change atomically: the status must still be `expected`, and a change that
    /// claims a seat must find one free on the internship at write time.
    async fn transition_status(&self, change: StatusChange) -> Result<TransitionOutcome>;
    async fn delete_application(&self, id: i64) -> Result<bool>;

    async fn find_evaluation(&self, application_id: i64) -> Result<Option<Evaluation>>;
    async fn upsert_evaluation(&self, evaluation: NewEvaluation) -> Result<Evaluation>;
}
