use std::sync::Arc;

use validator::Validate;

use crate::database::Store;
use crate::dto::profile_dto::{
    CreateCompanyProfilePayload, CreateStudentProfilePayload, UpdateCompanyProfilePayload,
    UpdateStudentProfilePayload,
};
use crate::error::{Error, Result};
use crate::middleware::auth::Identity;
use crate::models::{
    account::Role,
    company::{CompanyProfile, NewCompanyProfile},
    student::{NewStudentProfile, StudentProfile},
};
use crate::services::role_gate::{authorize, Resource, RoleGate};

/// Student and company profiles, each edited only by the account it belongs to.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
    gate: RoleGate,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            gate: RoleGate::new(store.clone()),
            store,
        }
    }

    pub async fn own_student_profile(&self, identity: Option<&Identity>) -> Result<StudentProfile> {
        let identity = authorize(identity, &[Role::Student])?;
        self.store
            .find_student_by_account(identity.account_id)
            .await?
            .ok_or_else(|| Error::NotFound("No student profile for this account".to_string()))
    }

    pub async fn create_student_profile(
        &self,
        identity: Option<&Identity>,
        payload: CreateStudentProfilePayload,
    ) -> Result<StudentProfile> {
        let identity = authorize(identity, &[Role::Student])?;
        payload.validate()?;
        let profile = self
            .store
            .insert_student(NewStudentProfile {
                account_id: identity.account_id,
                student_code: payload.student_code,
                full_name: payload.full_name,
                major: payload.major,
                year: payload.year,
            })
            .await?;
        tracing::info!(
            student_id = profile.id,
            account_id = identity.account_id,
            "student profile created"
        );
        Ok(profile)
    }

    /// The student themself or an admin; `cv_file` only records the stored filename.
    pub async fn update_student_profile(
        &self,
        identity: Option<&Identity>,
        student_id: i64,
        payload: UpdateStudentProfilePayload,
    ) -> Result<StudentProfile> {
        let identity = authorize(identity, &[Role::Student, Role::Admin])?;
        payload.validate()?;
        let mut profile = self
            .store
            .find_student(student_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Student {} not found", student_id)))?;
        self.gate
            .ensure_owns(identity, Resource::StudentProfile(student_id))
            .await?;

        if let Some(full_name) = payload.full_name {
            profile.full_name = full_name;
        }
        if payload.major.is_some() {
            profile.major = payload.major;
        }
        if payload.year.is_some() {
            profile.year = payload.year;
        }
        if payload.cv_file.is_some() {
            profile.cv_file = payload.cv_file;
        }

        let updated = self.store.update_student(profile).await?;
        tracing::info!(
            student_id,
            changed_by = identity.account_id,
            "student profile updated"
        );
        Ok(updated)
    }

    pub async fn own_company_profile(&self, identity: Option<&Identity>) -> Result<CompanyProfile> {
        let identity = authorize(identity, &[Role::Company])?;
        self.load_company(identity).await
    }

    pub async fn create_company_profile(
        &self,
        identity: Option<&Identity>,
        payload: CreateCompanyProfilePayload,
    ) -> Result<CompanyProfile> {
        let identity = authorize(identity, &[Role::Company])?;
        payload.validate()?;
        let profile = self
            .store
            .insert_company(NewCompanyProfile {
                account_id: identity.account_id,
                company_name: payload.company_name,
                contact_email: payload.contact_email,
                contact_phone: payload.contact_phone,
                website: payload.website,
            })
            .await?;
        tracing::info!(
            company_id = profile.id,
            account_id = identity.account_id,
            "company profile created"
        );
        Ok(profile)
    }

    pub async fn update_company_profile(
        &self,
        identity: Option<&Identity>,
        payload: UpdateCompanyProfilePayload,
    ) -> Result<CompanyProfile> {
        let identity = authorize(identity, &[Role::Company])?;
        payload.validate()?;
        let mut profile = self.load_company(identity).await?;
        self.gate
            .ensure_owns(identity, Resource::Account(profile.account_id))
            .await?;

        if let Some(company_name) = payload.company_name {
            profile.company_name = company_name;
        }
        if payload.contact_email.is_some() {
            profile.contact_email = payload.contact_email;
        }
        if payload.contact_phone.is_some() {
            profile.contact_phone = payload.contact_phone;
        }
        if payload.website.is_some() {
            profile.website = payload.website;
        }

        let updated = self.store.update_company(profile).await?;
        tracing::info!(company_id = updated.id, "company profile updated");
        Ok(updated)
    }

    async fn load_company(&self, identity: &Identity) -> Result<CompanyProfile> {
        self.store
            .find_company_by_account(identity.account_id)
            .await?
            .ok_or_else(|| Error::NotFound("No company profile for this account".to_string()))
    }
}
