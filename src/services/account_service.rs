use std::sync::Arc;

use chrono::Utc;

use crate::database::Store;
use crate::dto::admin_dto::DashboardStats;
use crate::error::{Error, Result};
use crate::middleware::auth::Identity;
use crate::models::{
    account::{Account, Role},
    application::{ApplicationFilter, ReviewStatus},
};
use crate::services::{
    notifier::{ActiveStatusChanged, Notifier, Subscription},
    role_gate::authorize,
};

/// Administrator-only account and record management.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    notifier: Notifier,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub async fn list_accounts(&self, identity: Option<&Identity>) -> Result<Vec<Account>> {
        authorize(identity, &[Role::Admin])?;
        self.store.list_accounts().await
    }

    /// Accounts currently flagged active, the snapshot the live stream starts from.
    pub async fn list_active_accounts(&self, identity: Option<&Identity>) -> Result<Vec<Account>> {
        authorize(identity, &[Role::Admin])?;
        let mut accounts = self.store.list_accounts().await?;
        accounts.retain(|a| a.is_active);
        Ok(accounts)
    }

    pub async fn set_active(
        &self,
        identity: Option<&Identity>,
        account_id: i64,
        active: bool,
    ) -> Result<Account> {
        let admin = authorize(identity, &[Role::Admin])?;
        let mut account = self.load(account_id).await?;
        account.is_active = active;
        let account = self.store.update_account(account).await?;

        tracing::info!(
            account_id,
            active,
            changed_by = admin.account_id,
            "account active flag changed"
        );
        self.notifier.publish(ActiveStatusChanged {
            account_id,
            active,
            changed_at: Utc::now(),
        });
        Ok(account)
    }

    pub async fn update_role(
        &self,
        identity: Option<&Identity>,
        account_id: i64,
        role: Role,
    ) -> Result<Account> {
        let admin = authorize(identity, &[Role::Admin])?;
        let mut account = self.load(account_id).await?;
        let previous = account.role;
        account.role = role;
        let account = self.store.update_account(account).await?;
        tracing::info!(
            account_id,
            from = %previous,
            to = %role,
            changed_by = admin.account_id,
            "account role changed"
        );
        Ok(account)
    }

    pub async fn delete_application(
        &self,
        identity: Option<&Identity>,
        application_id: i64,
    ) -> Result<()> {
        let admin = authorize(identity, &[Role::Admin])?;
        if !self.store.delete_application(application_id).await? {
            return Err(Error::NotFound(format!(
                "Application {} not found",
                application_id
            )));
        }
        tracing::info!(
            application_id,
            deleted_by = admin.account_id,
            "application deleted"
        );
        Ok(())
    }

    pub async fn dashboard_stats(&self, identity: Option<&Identity>) -> Result<DashboardStats> {
        authorize(identity, &[Role::Admin])?;
        let accounts = self.store.list_accounts().await?;
        let students = accounts.iter().filter(|a| a.role == Role::Student);
        let applications = self.store.list_applications(ApplicationFilter::All).await?;

        Ok(DashboardStats {
            total_students: students.clone().count() as i64,
            active_students: students.filter(|a| a.is_active).count() as i64,
            total_companies: self.store.count_companies().await?,
            total_internships: self.store.list_internships(None).await?.len() as i64,
            total_applications: applications.len() as i64,
            pending_applications: applications
                .iter()
                .filter(|a| a.status.review_status() == ReviewStatus::Pending)
                .count() as i64,
        })
    }

    /// Live feed of active-flag changes; the listener is released when the subscription drops.
    pub fn subscribe(&self, identity: Option<&Identity>) -> Result<Subscription> {
        authorize(identity, &[Role::Admin])?;
        Ok(self.notifier.subscribe())
    }

    async fn load(&self, account_id: i64) -> Result<Account> {
        self.store
            .find_account(account_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Account {} not found", account_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MockStore;

    fn admin() -> Identity {
        Identity {
            account_id: 1,
            email: "admin@example.com".into(),
            role: Role::Admin,
        }
    }

    fn account(id: i64, active: bool) -> Account {
        Account {
            id,
            email: format!("user{}@example.com", id),
            display_name: "User".into(),
            role: Role::Student,
            is_active: active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn deactivation_publishes_one_event() {
        let mut store = MockStore::new();
        store
            .expect_find_account()
            .returning(|id| Ok(Some(account(id, true))));
        store.expect_update_account().returning(Ok);
        let notifier = Notifier::new(4);
        let service = AccountService::new(Arc::new(store), notifier.clone());
        let mut subscription = service.subscribe(Some(&admin())).unwrap();

        let updated = service.set_active(Some(&admin()), 9, false).await.unwrap();
        assert!(!updated.is_active);

        let event = subscription.recv().await.unwrap();
        assert_eq!(event.account_id, 9);
        assert!(!event.active);
    }

    #[tokio::test]
    async fn non_admin_cannot_touch_accounts() {
        let service = AccountService::new(Arc::new(MockStore::new()), Notifier::default());
        let faculty = Identity {
            role: Role::Faculty,
            ..admin()
        };
        let err = service
            .set_active(Some(&faculty), 9, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
        assert!(matches!(
            service.subscribe(None),
            Err(Error::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn active_listing_skips_deactivated_accounts() {
        let mut store = MockStore::new();
        store
            .expect_list_accounts()
            .returning(|| Ok(vec![account(2, true), account(3, false), account(4, true)]));
        let service = AccountService::new(Arc::new(store), Notifier::default());

        let active = service.list_active_accounts(Some(&admin())).await.unwrap();
        let ids: Vec<i64> = active.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 4]);
    }
}
