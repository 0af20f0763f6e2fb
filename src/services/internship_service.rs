use std::sync::Arc;

use validator::{Validate, ValidationErrors};

use crate::database::Store;
use crate::dto::internship_dto::{
    check_date_order, CreateInternshipPayload, UpdateInternshipPayload,
};
use crate::error::{Error, Result};
use crate::middleware::auth::Identity;
use crate::models::{
    account::Role,
    internship::{Internship, NewInternship},
};
use crate::services::role_gate::{authorize, Resource, RoleGate, ANY_ROLE};

#[derive(Clone)]
pub struct InternshipService {
    store: Arc<dyn Store>,
    gate: RoleGate,
}

impl InternshipService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            gate: RoleGate::new(store.clone()),
            store,
        }
    }

    pub async fn list(&self, identity: Option<&Identity>) -> Result<Vec<Internship>> {
        let identity = authorize(identity, ANY_ROLE)?;
        self.gate.scope_internships(identity).await
    }

    pub async fn get(&self, identity: Option<&Identity>, id: i64) -> Result<Internship> {
        let identity = authorize(identity, ANY_ROLE)?;
        let internship = self.load(id).await?;
        let visible = match identity.role {
            Role::Company => self.gate.owns_resource(identity, Resource::Internship(id)).await?,
            Role::Student | Role::Faculty | Role::Admin => true,
        };
        if !visible {
            return Err(not_found(id));
        }
        Ok(internship)
    }

    pub async fn create(
        &self,
        identity: Option<&Identity>,
        payload: CreateInternshipPayload,
    ) -> Result<Internship> {
        let identity = authorize(identity, &[Role::Company])?;
        payload.validate()?;
        let company = self
            .store
            .find_company_by_account(identity.account_id)
            .await?
            .ok_or_else(|| Error::Forbidden("no company profile for this account".to_string()))?;

        let internship = self
            .store
            .insert_internship(NewInternship {
                company_id: company.id,
                title: payload.title,
                description: payload.description,
                location: payload.location,
                seats: payload.seats,
                start_date: payload.start_date,
                end_date: payload.end_date,
            })
            .await?;
        tracing::info!(
            internship_id = internship.id,
            company_id = company.id,
            "internship created"
        );
        Ok(internship)
    }

    pub async fn update(
        &self,
        identity: Option<&Identity>,
        id: i64,
        payload: UpdateInternshipPayload,
    ) -> Result<Internship> {
        let identity = authorize(identity, &[Role::Company])?;
        payload.validate()?;
        let mut internship = self.load(id).await?;
        self.gate
            .ensure_owns(identity, Resource::Internship(id))
            .await?;

        if let Some(title) = payload.title {
            internship.title = title;
        }
        if payload.description.is_some() {
            internship.description = payload.description;
        }
        if payload.location.is_some() {
            internship.location = payload.location;
        }
        if let Some(seats) = payload.seats {
            internship.seats = seats;
        }
        if payload.start_date.is_some() {
            internship.start_date = payload.start_date;
        }
        if payload.end_date.is_some() {
            internship.end_date = payload.end_date;
        }
        if let Err(err) = check_date_order(internship.start_date, internship.end_date) {
            let mut errors = ValidationErrors::new();
            errors.add("end_date", err);
            return Err(errors.into());
        }

        let updated = self.store.update_internship(internship).await?;
        tracing::info!(internship_id = updated.id, "internship updated");
        Ok(updated)
    }

    /// The owning company may delete a posting nobody has applied to. Only an admin removes
    /// a posting together with its applications and evaluations.
    pub async fn delete(&self, identity: Option<&Identity>, id: i64) -> Result<()> {
        let identity = authorize(identity, &[Role::Company, Role::Admin])?;
        self.load(id).await?;
        self.gate
            .ensure_owns(identity, Resource::Internship(id))
            .await?;
        let cascade = match identity.role {
            Role::Admin => true,
            Role::Student | Role::Company | Role::Faculty => false,
        };
        if !self.store.delete_internship(id, cascade).await? {
            return Err(not_found(id));
        }
        tracing::info!(
            internship_id = id,
            account_id = identity.account_id,
            cascade,
            "internship deleted"
        );
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<Internship> {
        self.store
            .find_internship(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("Internship {} not found", id))
}
