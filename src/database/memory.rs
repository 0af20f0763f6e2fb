use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

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

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    accounts: BTreeMap<i64, Account>,
    students: BTreeMap<i64, StudentProfile>,
    companies: BTreeMap<i64, CompanyProfile>,
    internships: BTreeMap<i64, Internship>,
    applications: BTreeMap<i64, Application>,
    evaluations: BTreeMap<i64, Evaluation>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. A single mutex serialises every call, which gives the
/// compare-and-swap in `transition_status` the same guarantee a row lock does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| Error::Internal("memory store mutex poisoned".to_string()))
    }
}

fn newest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_account(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.tables()?.accounts.get(&id).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = self.tables()?.accounts.values().cloned().collect();
        Ok(newest_first(rows, |a: &Account| (a.created_at, a.id)))
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        let mut tables = self.tables()?;
        if tables
            .accounts
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(Error::BadRequest(format!(
                "Email {} is already registered",
                account.email
            )));
        }
        let id = tables.allocate_id();
        let stored = Account {
            id,
            email: account.email,
            display_name: account.display_name,
            role: account.role,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.accounts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_account(&self, account: Account) -> Result<Account> {
        let mut tables = self.tables()?;
        let slot = tables
            .accounts
            .get_mut(&account.id)
            .ok_or_else(|| Error::NotFound(format!("Account {} not found", account.id)))?;
        *slot = account.clone();
        Ok(account)
    }

    async fn find_student(&self, id: i64) -> Result<Option<StudentProfile>> {
        Ok(self.tables()?.students.get(&id).cloned())
    }

    async fn find_student_by_account(&self, account_id: i64) -> Result<Option<StudentProfile>> {
        Ok(self
            .tables()?
            .students
            .values()
            .find(|p| p.account_id == account_id)
            .cloned())
    }

    async fn insert_student(&self, profile: NewStudentProfile) -> Result<StudentProfile> {
        let mut tables = self.tables()?;
        if tables
            .students
            .values()
            .any(|p| p.account_id == profile.account_id || p.student_code == profile.student_code)
        {
            return Err(Error::BadRequest(
                "Student profile already exists".to_string(),
            ));
        }
        let id = tables.allocate_id();
        let stored = StudentProfile {
            id,
            account_id: profile.account_id,
            student_code: profile.student_code,
            full_name: profile.full_name,
            major: profile.major,
            year: profile.year,
            cv_file: None,
        };
        tables.students.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_student(&self, profile: StudentProfile) -> Result<StudentProfile> {
        let mut tables = self.tables()?;
        let slot = tables
            .students
            .get_mut(&profile.id)
            .ok_or_else(|| Error::NotFound(format!("Student {} not found", profile.id)))?;
        *slot = profile.clone();
        Ok(profile)
    }

    async fn find_company_by_account(&self, account_id: i64) -> Result<Option<CompanyProfile>> {
        Ok(self
            .tables()?
            .companies
            .values()
            .find(|p| p.account_id == account_id)
            .cloned())
    }

    async fn count_companies(&self) -> Result<i64> {
        Ok(self.tables()?.companies.len() as i64)
    }

    async fn insert_company(&self, profile: NewCompanyProfile) -> Result<CompanyProfile> {
        let mut tables = self.tables()?;
        if tables
            .companies
            .values()
            .any(|p| p.account_id == profile.account_id)
        {
            return Err(Error::BadRequest(
                "Company profile already exists".to_string(),
            ));
        }
        let id = tables.allocate_id();
        let stored = CompanyProfile {
            id,
            account_id: profile.account_id,
            company_name: profile.company_name,
            contact_email: profile.contact_email,
            contact_phone: profile.contact_phone,
            website: profile.website,
        };
        tables.companies.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_company(&self, profile: CompanyProfile) -> Result<CompanyProfile> {
        let mut tables = self.tables()?;
        let slot = tables
            .companies
            .get_mut(&profile.id)
            .ok_or_else(|| Error::NotFound(format!("Company {} not found", profile.id)))?;
        *slot = profile.clone();
        Ok(profile)
    }

    async fn find_internship(&self, id: i64) -> Result<Option<Internship>> {
        Ok(self.tables()?.internships.get(&id).cloned())
    }

    async fn list_internships(&self, company_id: Option<i64>) -> Result<Vec<Internship>> {
        let rows = self
            .tables()?
            .internships
            .values()
            .filter(|i| company_id.map_or(true, |company| i.company_id == company))
            .cloned()
            .collect();
        Ok(newest_first(rows, |i: &Internship| (i.created_at, i.id)))
    }

    async fn insert_internship(&self, internship: NewInternship) -> Result<Internship> {
        let mut tables = self.tables()?;
        let id = tables.allocate_id();
        let stored = Internship {
            id,
            company_id: internship.company_id,
            title: internship.title,
            description: internship.description,
            location: internship.location,
            seats: internship.seats,
            start_date: internship.start_date,
            end_date: internship.end_date,
            created_at: Utc::now(),
        };
        tables.internships.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_internship(&self, internship: Internship) -> Result<Internship> {
        let mut tables = self.tables()?;
        let slot = tables
            .internships
            .get_mut(&internship.id)
            .ok_or_else(|| Error::NotFound(format!("Internship {} not found", internship.id)))?;
        *slot = internship.clone();
        Ok(internship)
    }

    async fn delete_internship(&self, id: i64, cascade: bool) -> Result<bool> {
        let mut tables = self.tables()?;
        if !tables.internships.contains_key(&id) {
            return Ok(false);
        }
        let attached: Vec<i64> = tables
            .applications
            .values()
            .filter(|a| a.internship_id == id)
            .map(|a| a.id)
            .collect();
        if !attached.is_empty() && !cascade {
            return Err(Error::InternshipInUse);
        }
        for application_id in attached {
            tables.applications.remove(&application_id);
            tables.evaluations.remove(&application_id);
        }
        tables.internships.remove(&id);
        Ok(true)
    }

    async fn find_application(&self, id: i64) -> Result<Option<Application>> {
        Ok(self.tables()?.applications.get(&id).cloned())
    }

    async fn find_application_by_pair(
        &self,
        student_id: i64,
        internship_id: i64,
    ) -> Result<Option<Application>> {
        Ok(self
            .tables()?
            .applications
            .values()
            .find(|a| a.student_id == student_id && a.internship_id == internship_id)
            .cloned())
    }

    async fn list_applications(&self, filter: ApplicationFilter) -> Result<Vec<Application>> {
        let tables = self.tables()?;
        let rows = tables
            .applications
            .values()
            .filter(|a| match filter {
                ApplicationFilter::All => true,
                ApplicationFilter::Student(id) => a.student_id == id,
                ApplicationFilter::Internship(id) => a.internship_id == id,
                ApplicationFilter::Company(id) => tables
                    .internships
                    .get(&a.internship_id)
                    .map_or(false, |i| i.company_id == id),
            })
            .cloned()
            .collect();
        Ok(newest_first(rows, |a: &Application| (a.applied_at, a.id)))
    }

    async fn count_applications_in_status(
        &self,
        internship_id: i64,
        status: ApplicationStatus,
    ) -> Result<i64> {
        Ok(self
            .tables()?
            .applications
            .values()
            .filter(|a| a.internship_id == internship_id && a.status == status)
            .count() as i64)
    }

    async fn insert_application(&self, application: NewApplication) -> Result<Application> {
        let mut tables = self.tables()?;
        if tables.applications.values().any(|a| {
            a.student_id == application.student_id && a.internship_id == application.internship_id
        }) {
            return Err(Error::DuplicateApplication);
        }
        let id = tables.allocate_id();
        let now = Utc::now();
        let stored = Application {
            id,
            student_id: application.student_id,
            internship_id: application.internship_id,
            position_title: application.position_title,
            status: ApplicationStatus::Submitted,
            review_comment: None,
            applied_at: now,
            updated_at: now,
        };
        tables.applications.insert(id, stored.clone());
        Ok(stored)
    }

    async fn transition_status(&self, change: StatusChange) -> Result<TransitionOutcome> {
        let mut tables = self.tables()?;
        let Some(current) = tables.applications.get(&change.id) else {
            return Ok(TransitionOutcome::Stale);
        };
        if current.status != change.expected {
            return Ok(TransitionOutcome::Stale);
        }
        if change.claims_seat {
            let internship_id = current.internship_id;
            let seats = tables
                .internships
                .get(&internship_id)
                .map_or(0, |i| i64::from(i.seats));
            let approved = tables
                .applications
                .values()
                .filter(|a| {
                    a.internship_id == internship_id
                        && a.status == ApplicationStatus::ApprovedByAdmin
                })
                .count() as i64;
            if approved >= seats {
                return Ok(TransitionOutcome::NoSeats);
            }
        }

        let Some(application) = tables.applications.get_mut(&change.id) else {
            return Ok(TransitionOutcome::Stale);
        };
        application.status = change.next;
        if change.review_comment.is_some() {
            application.review_comment = change.review_comment;
        }
        application.updated_at = Utc::now();
        Ok(TransitionOutcome::Applied(application.clone()))
    }

    async fn delete_application(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables()?;
        let removed = tables.applications.remove(&id).is_some();
        if removed {
            tables.evaluations.remove(&id);
        }
        Ok(removed)
    }

    async fn find_evaluation(&self, application_id: i64) -> Result<Option<Evaluation>> {
        Ok(self.tables()?.evaluations.get(&application_id).cloned())
    }

    async fn upsert_evaluation(&self, evaluation: NewEvaluation) -> Result<Evaluation> {
        let mut tables = self.tables()?;
        if !tables.applications.contains_key(&evaluation.application_id) {
            return Err(Error::NotFound(format!(
                "Application {} not found",
                evaluation.application_id
            )));
        }
        let id = match tables.evaluations.get(&evaluation.application_id) {
            Some(existing) => existing.id,
            None => tables.allocate_id(),
        };
        let stored = Evaluation {
            id,
            application_id: evaluation.application_id,
            score: evaluation.score,
            comments: evaluation.comments,
            evaluated_at: Utc::now(),
        };
        tables
            .evaluations
            .insert(evaluation.application_id, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(seats: i32) -> (MemoryStore, i64, Vec<i64>) {
        let store = MemoryStore::new();
        let internship = store
            .insert_internship(NewInternship {
                company_id: 1,
                title: "Intern".into(),
                description: None,
                location: None,
                seats,
                start_date: None,
                end_date: None,
            })
            .await
            .unwrap();
        let mut applications = Vec::new();
        for student_id in [10, 11] {
            let application = store
                .insert_application(NewApplication {
                    student_id,
                    internship_id: internship.id,
                    position_title: "Intern".into(),
                })
                .await
                .unwrap();
            applications.push(application.id);
        }
        (store, internship.id, applications)
    }

    fn approve(id: i64, expected: ApplicationStatus) -> StatusChange {
        StatusChange {
            id,
            expected,
            next: ApplicationStatus::ApprovedByAdmin,
            review_comment: None,
            claims_seat: true,
        }
    }

    #[tokio::test]
    async fn seat_claim_is_checked_inside_the_swap() {
        let (store, _, applications) = seeded(1).await;
        let first = store
            .transition_status(approve(applications[0], ApplicationStatus::Submitted))
            .await
            .unwrap();
        assert!(matches!(first, TransitionOutcome::Applied(_)));

        let second = store
            .transition_status(approve(applications[1], ApplicationStatus::Submitted))
            .await
            .unwrap();
        assert_eq!(second, TransitionOutcome::NoSeats);
        let untouched = store.find_application(applications[1]).await.unwrap().unwrap();
        assert_eq!(untouched.status, ApplicationStatus::Submitted);
    }

    #[tokio::test]
    async fn stale_expectation_wins_over_seat_check() {
        let (store, _, applications) = seeded(0).await;
        let outcome = store
            .transition_status(approve(applications[0], ApplicationStatus::ApprovedByFaculty))
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Stale);
    }

    #[tokio::test]
    async fn internship_with_applications_needs_cascade_to_delete() {
        let (store, internship_id, applications) = seeded(1).await;
        assert!(matches!(
            store.delete_internship(internship_id, false).await,
            Err(Error::InternshipInUse)
        ));
        assert!(store.find_internship(internship_id).await.unwrap().is_some());

        assert!(store.delete_internship(internship_id, true).await.unwrap());
        assert!(store.find_application(applications[0]).await.unwrap().is_none());
    }
}
