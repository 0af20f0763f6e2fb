#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use internship_backend::{
    app_router,
    config::Config,
    database::{MemoryStore, Store},
    middleware::auth::{Identity, TokenVerifier},
    models::{
        account::{Account, NewAccount, Role},
        company::{CompanyProfile, NewCompanyProfile},
        internship::{Internship, NewInternship},
        student::{NewStudentProfile, StudentProfile},
    },
    AppState,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test_secret_key";

pub fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: String::new(),
        jwt_secret: JWT_SECRET.into(),
        evaluation_min_score: 0,
        evaluation_max_score: 100,
        notifier_capacity: 16,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    tokens: TokenVerifier,
}

pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), &test_config());
    TestApp {
        router: app_router(state.clone()),
        state,
        store,
        tokens: TokenVerifier::new(JWT_SECRET),
    }
}

impl TestApp {
    pub async fn account(&self, email: &str, role: Role) -> (Account, String) {
        let account = self
            .store
            .insert_account(NewAccount {
                email: email.into(),
                display_name: email.split('@').next().unwrap_or(email).into(),
                role,
            })
            .await
            .expect("seed account");
        let token = self.token_for(&account);
        (account, token)
    }

    pub fn token_for(&self, account: &Account) -> String {
        self.tokens
            .issue(
                &Identity {
                    account_id: account.id,
                    email: account.email.clone(),
                    role: account.role,
                },
                chrono::Duration::minutes(30),
            )
            .expect("issue token")
    }

    pub async fn student(&self, email: &str, code: &str) -> (StudentProfile, String) {
        let (account, token) = self.account(email, Role::Student).await;
        let profile = self
            .store
            .insert_student(NewStudentProfile {
                account_id: account.id,
                student_code: code.into(),
                full_name: format!("Student {}", code),
                major: Some("Computer Science".into()),
                year: Some(3),
            })
            .await
            .expect("seed student");
        (profile, token)
    }

    pub async fn company(&self, email: &str, name: &str) -> (CompanyProfile, String) {
        let (account, token) = self.account(email, Role::Company).await;
        let profile = self
            .store
            .insert_company(NewCompanyProfile {
                account_id: account.id,
                company_name: name.into(),
                contact_email: Some(email.into()),
                contact_phone: None,
                website: None,
            })
            .await
            .expect("seed company");
        (profile, token)
    }

    pub async fn internship(
        &self,
        company_id: i64,
        seats: i32,
        end_date: Option<NaiveDate>,
    ) -> Internship {
        self.store
            .insert_internship(NewInternship {
                company_id,
                title: "Backend intern".into(),
                description: Some("Rust services".into()),
                location: Some("Remote".into()),
                seats,
                start_date: None,
                end_date,
            })
            .await
            .expect("seed internship")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        send(self.router.clone(), method, uri, token, body).await
    }
}

pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .oneshot(builder.body(body).expect("build request"))
        .await
        .expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}
