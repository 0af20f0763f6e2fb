use std::sync::Arc;

use crate::database::Store;
use crate::error::{Error, Result};
use crate::middleware::auth::Identity;
use crate::models::{
    account::Role,
    application::{Application, ApplicationFilter},
    internship::{Internship, InternshipStatus},
};
use crate::utils::time::today;

/// A record an identity may try to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account(i64),
    StudentProfile(i64),
    Internship(i64),
    Application(i64),
}

pub const ANY_ROLE: &[Role] = &[Role::Student, Role::Company, Role::Faculty, Role::Admin];

/// Authorization decisions. Ownership is always read fresh from the store.
#[derive(Clone)]
pub struct RoleGate {
    store: Arc<dyn Store>,
}

pub fn authorize<'a>(identity: Option<&'a Identity>, allowed: &[Role]) -> Result<&'a Identity> {
    let identity =
        identity.ok_or_else(|| Error::Unauthenticated("missing_authorization".to_string()))?;
    if !allowed.contains(&identity.role) {
        tracing::warn!(
            account_id = identity.account_id,
            role = %identity.role,
            "role not permitted for action"
        );
        return Err(Error::Forbidden(format!(
            "role {} may not perform this action",
            identity.role
        )));
    }
    Ok(identity)
}

impl RoleGate {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn scope_internships(&self, identity: &Identity) -> Result<Vec<Internship>> {
        match identity.role {
            Role::Company => match self.store.find_company_by_account(identity.account_id).await? {
                Some(company) => self.store.list_internships(Some(company.id)).await,
                None => Ok(Vec::new()),
            },
            Role::Student => {
                let today = today();
                let mut internships = self.store.list_internships(None).await?;
                internships.retain(|i| i.status_on(today) == InternshipStatus::Active);
                Ok(internships)
            }
            Role::Faculty | Role::Admin => self.store.list_internships(None).await,
        }
    }

    pub async fn scope_applications(&self, identity: &Identity) -> Result<Vec<Application>> {
        let filter = match identity.role {
            Role::Student => match self.store.find_student_by_account(identity.account_id).await? {
                Some(student) => ApplicationFilter::Student(student.id),
                None => return Ok(Vec::new()),
            },
            Role::Company => match self.store.find_company_by_account(identity.account_id).await? {
                Some(company) => ApplicationFilter::Company(company.id),
                None => return Ok(Vec::new()),
            },
            Role::Faculty | Role::Admin => ApplicationFilter::All,
        };
        self.store.list_applications(filter).await
    }

    pub async fn owns_resource(&self, identity: &Identity, resource: Resource) -> Result<bool> {
        match identity.role {
            Role::Admin => Ok(true),
            Role::Faculty => Ok(
                matches!(resource, Resource::Account(id) if id == identity.account_id),
            ),
            Role::Student => self.student_owns(identity, resource).await,
            Role::Company => self.company_owns(identity, resource).await,
        }
    }

    /// Like [`RoleGate::owns_resource`] but fails with `Forbidden`.
    pub async fn ensure_owns(&self, identity: &Identity, resource: Resource) -> Result<()> {
        if self.owns_resource(identity, resource).await? {
            Ok(())
        } else {
            tracing::warn!(
                account_id = identity.account_id,
                role = %identity.role,
                ?resource,
                "ownership check failed"
            );
            Err(Error::Forbidden("not the owner of this resource".to_string()))
        }
    }

    /// Read access to a single application: owners plus the approving roles.
    pub async fn can_view_application(&self, identity: &Identity, id: i64) -> Result<bool> {
        match identity.role {
            Role::Faculty | Role::Admin => Ok(true),
            Role::Student | Role::Company => {
                self.owns_resource(identity, Resource::Application(id)).await
            }
        }
    }

    async fn student_owns(&self, identity: &Identity, resource: Resource) -> Result<bool> {
        if let Resource::Account(id) = resource {
            return Ok(id == identity.account_id);
        }
        let Some(student) = self.store.find_student_by_account(identity.account_id).await? else {
            return Ok(false);
        };
        match resource {
            Resource::StudentProfile(id) => Ok(id == student.id),
            Resource::Application(id) => Ok(self
                .store
                .find_application(id)
                .await?
                .map_or(false, |a| a.student_id == student.id)),
            Resource::Internship(_) | Resource::Account(_) => Ok(false),
        }
    }

    async fn company_owns(&self, identity: &Identity, resource: Resource) -> Result<bool> {
        if let Resource::Account(id) = resource {
            return Ok(id == identity.account_id);
        }
        let Some(company) = self.store.find_company_by_account(identity.account_id).await? else {
            return Ok(false);
        };
        let internship_id = match resource {
            Resource::Internship(id) => id,
            Resource::Application(id) => match self.store.find_application(id).await? {
                Some(application) => application.internship_id,
                None => return Ok(false),
            },
            Resource::StudentProfile(_) | Resource::Account(_) => return Ok(false),
        };
        Ok(self
            .store
            .find_internship(internship_id)
            .await?
            .map_or(false, |i| i.company_id == company.id))
    }
}
