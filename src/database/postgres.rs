use async_trait::async_trait;
use sqlx::PgPool;

use super::{StatusChange, Store, TransitionOutcome};
use crate::error::{Error, Result};
use crate::models::{
    account::{Account, NewAccount},
    application::{Application, ApplicationFilter, ApplicationStatus, NewApplication},
    company::{CompanyProfile, NewCompanyProfile},
    evaluation::{Evaluation, NewEvaluation},
    internship::{Internship, NewInternship},
    student::{NewStudentProfile, StudentProfile},
};

const ACCOUNT_COLUMNS: &str = "id, email, display_name, role, is_active, created_at";
const STUDENT_COLUMNS: &str = "id, account_id, student_code, full_name, major, year, cv_file";
const COMPANY_COLUMNS: &str =
    "id, account_id, company_name, contact_email, contact_phone, website";
const INTERNSHIP_COLUMNS: &str =
    "id, company_id, title, description, location, seats, start_date, end_date, created_at";
const APPLICATION_COLUMNS: &str =
    "id, student_id, internship_id, position_title, status, review_comment, applied_at, updated_at";
const EVALUATION_COLUMNS: &str = "id, application_id, score, comments, evaluated_at";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_code(err, UNIQUE_VIOLATION)
}

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(code),
        _ => false,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_account(&self, id: i64) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        let inserted = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (email, display_name, role, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(account.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::BadRequest(format!("Email {} is already registered", account.email))
            } else {
                Error::from(err)
            }
        })?;
        Ok(inserted)
    }

    async fn update_account(&self, account: Account) -> Result<Account> {
        let updated = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
            SET email = $1, display_name = $2, role = $3, is_active = $4
            WHERE id = $5
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(account.role)
        .bind(account.is_active)
        .bind(account.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn find_student(&self, id: i64) -> Result<Option<StudentProfile>> {
        let profile = sqlx::query_as::<_, StudentProfile>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn find_student_by_account(&self, account_id: i64) -> Result<Option<StudentProfile>> {
        let profile = sqlx::query_as::<_, StudentProfile>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles WHERE account_id = $1"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_student(&self, profile: NewStudentProfile) -> Result<StudentProfile> {
        let inserted = sqlx::query_as::<_, StudentProfile>(&format!(
            r#"
            INSERT INTO student_profiles (account_id, student_code, full_name, major, year)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(profile.account_id)
        .bind(&profile.student_code)
        .bind(&profile.full_name)
        .bind(&profile.major)
        .bind(profile.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::BadRequest("Student profile already exists".to_string())
            } else {
                Error::from(err)
            }
        })?;
        Ok(inserted)
    }

    async fn update_student(&self, profile: StudentProfile) -> Result<StudentProfile> {
        let updated = sqlx::query_as::<_, StudentProfile>(&format!(
            r#"
            UPDATE student_profiles
            SET full_name = $1, major = $2, year = $3, cv_file = $4
            WHERE id = $5
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(&profile.full_name)
        .bind(&profile.major)
        .bind(profile.year)
        .bind(&profile.cv_file)
        .bind(profile.id)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| Error::NotFound(format!("Student {} not found", profile.id)))
    }

    async fn find_company_by_account(&self, account_id: i64) -> Result<Option<CompanyProfile>> {
        let profile = sqlx::query_as::<_, CompanyProfile>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM company_profiles WHERE account_id = $1"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn count_companies(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM company_profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_company(&self, profile: NewCompanyProfile) -> Result<CompanyProfile> {
        let inserted = sqlx::query_as::<_, CompanyProfile>(&format!(
            r#"
            INSERT INTO company_profiles (account_id, company_name, contact_email, contact_phone, website)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(profile.account_id)
        .bind(&profile.company_name)
        .bind(&profile.contact_email)
        .bind(&profile.contact_phone)
        .bind(&profile.website)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::BadRequest("Company profile already exists".to_string())
            } else {
                Error::from(err)
            }
        })?;
        Ok(inserted)
    }

    async fn update_company(&self, profile: CompanyProfile) -> Result<CompanyProfile> {
        let updated = sqlx::query_as::<_, CompanyProfile>(&format!(
            r#"
            UPDATE company_profiles
            SET company_name = $1, contact_email = $2, contact_phone = $3, website = $4
            WHERE id = $5
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(&profile.company_name)
        .bind(&profile.contact_email)
        .bind(&profile.contact_phone)
        .bind(&profile.website)
        .bind(profile.id)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| Error::NotFound(format!("Company {} not found", profile.id)))
    }

    async fn find_internship(&self, id: i64) -> Result<Option<Internship>> {
        let internship = sqlx::query_as::<_, Internship>(&format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(internship)
    }

    async fn list_internships(&self, company_id: Option<i64>) -> Result<Vec<Internship>> {
        let internships = sqlx::query_as::<_, Internship>(&format!(
            r#"
            SELECT {INTERNSHIP_COLUMNS} FROM internships
            WHERE ($1::BIGINT IS NULL OR company_id = $1)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(internships)
    }

    async fn insert_internship(&self, internship: NewInternship) -> Result<Internship> {
        let inserted = sqlx::query_as::<_, Internship>(&format!(
            r#"
            INSERT INTO internships (company_id, title, description, location, seats, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {INTERNSHIP_COLUMNS}
            "#
        ))
        .bind(internship.company_id)
        .bind(&internship.title)
        .bind(&internship.description)
        .bind(&internship.location)
        .bind(internship.seats)
        .bind(internship.start_date)
        .bind(internship.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn update_internship(&self, internship: Internship) -> Result<Internship> {
        let updated = sqlx::query_as::<_, Internship>(&format!(
            r#"
            UPDATE internships
            SET title = $1, description = $2, location = $3, seats = $4, start_date = $5, end_date = $6
            WHERE id = $7
            RETURNING {INTERNSHIP_COLUMNS}
            "#
        ))
        .bind(&internship.title)
        .bind(&internship.description)
        .bind(&internship.location)
        .bind(internship.seats)
        .bind(internship.start_date)
        .bind(internship.end_date)
        .bind(internship.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_internship(&self, id: i64, cascade: bool) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        if cascade {
            sqlx::query(
                r#"
                DELETE FROM evaluations
                WHERE application_id IN (SELECT id FROM applications WHERE internship_id = $1)
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
            sqlx::query("DELETE FROM applications WHERE internship_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        // Without cascade the foreign key on applications refuses the delete.
        let result = sqlx::query("DELETE FROM internships WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if has_code(&err, FOREIGN_KEY_VIOLATION) {
                    Error::InternshipInUse
                } else {
                    Error::from(err)
                }
            })?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_application(&self, id: i64) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn find_application_by_pair(
        &self,
        student_id: i64,
        internship_id: i64,
    ) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE student_id = $1 AND internship_id = $2"
        ))
        .bind(student_id)
        .bind(internship_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn list_applications(&self, filter: ApplicationFilter) -> Result<Vec<Application>> {
        let columns = APPLICATION_COLUMNS.replace(", ", ", a.");
        let (condition, key) = match filter {
            ApplicationFilter::All => ("", None),
            ApplicationFilter::Student(id) => ("WHERE a.student_id = $1", Some(id)),
            ApplicationFilter::Company(id) => ("WHERE i.company_id = $1", Some(id)),
            ApplicationFilter::Internship(id) => ("WHERE a.internship_id = $1", Some(id)),
        };
        let sql = format!(
            r#"
            SELECT a.{columns} FROM applications a
            JOIN internships i ON i.id = a.internship_id
            {condition}
            ORDER BY a.applied_at DESC, a.id DESC
            "#
        );
        let mut query = sqlx::query_as::<_, Application>(&sql);
        if let Some(key) = key {
            query = query.bind(key);
        }
        let applications = query.fetch_all(&self.pool).await?;
        Ok(applications)
    }

    async fn count_applications_in_status(
        &self,
        internship_id: i64,
        status: ApplicationStatus,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE internship_id = $1 AND status = $2",
        )
        .bind(internship_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_application(&self, application: NewApplication) -> Result<Application> {
        let inserted = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (student_id, internship_id, position_title, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(application.student_id)
        .bind(application.internship_id)
        .bind(&application.position_title)
        .bind(ApplicationStatus::Submitted)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::DuplicateApplication
            } else {
                Error::from(err)
            }
        })?;
        Ok(inserted)
    }

    async fn transition_status(&self, change: StatusChange) -> Result<TransitionOutcome> {
        let mut tx = self.pool.begin().await?;

        // Locking the internship row serialises every seat claim on it.
        let current: Option<(ApplicationStatus, i64)> = sqlx::query_as(
            r#"
            SELECT a.status, a.internship_id
            FROM applications a
            WHERE a.id = $1
            FOR UPDATE
            "#,
        )
        .bind(change.id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((status, internship_id)) = current else {
            return Ok(TransitionOutcome::Stale);
        };
        if status != change.expected {
            return Ok(TransitionOutcome::Stale);
        }

        if change.claims_seat {
            let seats: Option<i32> =
                sqlx::query_scalar("SELECT seats FROM internships WHERE id = $1 FOR UPDATE")
                    .bind(internship_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let approved: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM applications WHERE internship_id = $1 AND status = $2",
            )
            .bind(internship_id)
            .bind(ApplicationStatus::ApprovedByAdmin)
            .fetch_one(&mut *tx)
            .await?;
            if approved >= i64::from(seats.unwrap_or(0)) {
                return Ok(TransitionOutcome::NoSeats);
            }
        }

        let updated = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = $1, review_comment = COALESCE($2, review_comment), updated_at = NOW()
            WHERE id = $3 AND status = $4
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(change.next)
        .bind(change.review_comment)
        .bind(change.id)
        .bind(change.expected)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(match updated {
            Some(application) => TransitionOutcome::Applied(application),
            None => TransitionOutcome::Stale,
        })
    }

    async fn delete_application(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_evaluation(&self, application_id: i64) -> Result<Option<Evaluation>> {
        let evaluation = sqlx::query_as::<_, Evaluation>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE application_id = $1"
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(evaluation)
    }

    async fn upsert_evaluation(&self, evaluation: NewEvaluation) -> Result<Evaluation> {
        let stored = sqlx::query_as::<_, Evaluation>(&format!(
            r#"
            INSERT INTO evaluations (application_id, score, comments)
            VALUES ($1, $2, $3)
            ON CONFLICT (application_id)
            DO UPDATE SET score = EXCLUDED.score, comments = EXCLUDED.comments, evaluated_at = NOW()
            RETURNING {EVALUATION_COLUMNS}
            "#
        ))
        .bind(evaluation.application_id)
        .bind(evaluation.score)
        .bind(&evaluation.comments)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }
}
