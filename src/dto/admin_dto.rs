use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::account::{Account, Role};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetActivePayload {
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRolePayload {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountListResponse {
    pub items: Vec<Account>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_students: i64,
    pub active_students: i64,
    pub total_companies: i64,
    pub total_internships: i64,
    pub total_applications: i64,
    pub pending_applications: i64,
}

impl From<Vec<Account>> for AccountListResponse {
    fn from(items: Vec<Account>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}
