mod common;

use axum::http::{Method, StatusCode};
use internship_backend::models::account::Role;
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn student_creates_reads_and_updates_own_profile() {
    let app = spawn_app();
    let (_, token) = app.account("ada@uni.edu", Role::Student).await;

    let (status, _) = app
        .request(Method::GET, "/api/students/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) = app
        .request(
            Method::POST,
            "/api/students/me",
            Some(&token),
            Some(json!({ "student_code": "S-1", "full_name": "Ada L", "year": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert!(created["cv_file"].is_null());

    let uri = format!("/api/students/{}", created["id"]);
    let (status, updated) = app
        .request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "cv_file": "ada-cv.pdf", "major": "Mathematics" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["cv_file"], "ada-cv.pdf");
    assert_eq!(updated["major"], "Mathematics");
    assert_eq!(updated["full_name"], "Ada L");

    let (_, own) = app
        .request(Method::GET, "/api/students/me", Some(&token), None)
        .await;
    assert_eq!(own, updated);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/students/me",
            Some(&token),
            Some(json!({ "student_code": "S-2", "full_name": "Ada Again" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn student_profile_is_edited_only_by_its_owner_or_an_admin() {
    let app = spawn_app();
    let (ada, _) = app.student("ada@uni.edu", "S-1").await;
    let (_, bo_token) = app.student("bo@uni.edu", "S-2").await;
    let (_, company_token) = app.company("hr@acme.test", "Acme").await;
    let (_, faculty_token) = app.account("prof@uni.edu", Role::Faculty).await;
    let (_, admin_token) = app.account("admin@uni.edu", Role::Admin).await;
    let uri = format!("/api/students/{}", ada.id);
    let edit = json!({ "cv_file": "forged.pdf" });

    let (status, _) = app
        .request(Method::PATCH, &uri, Some(&bo_token), Some(edit.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    for token in [&company_token, &faculty_token] {
        let (status, _) = app
            .request(Method::PATCH, &uri, Some(token), Some(edit.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
    let (status, _) = app.request(Method::PATCH, &uri, None, Some(edit)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(
            Method::PATCH,
            &uri,
            Some(&admin_token),
            Some(json!({ "year": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], 4);
    assert!(body["cv_file"].is_null());

    let (status, _) = app
        .request(
            Method::PATCH,
            "/api/students/9999",
            Some(&admin_token),
            Some(json!({ "year": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_profile_payloads_are_rejected() {
    let app = spawn_app();
    let (student, token) = app.student("ada@uni.edu", "S-1").await;
    let uri = format!("/api/students/{}", student.id);

    for payload in [json!({ "full_name": "" }), json!({ "year": 0 })] {
        let (status, body) = app
            .request(Method::PATCH, &uri, Some(&token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn company_manages_its_own_profile() {
    let app = spawn_app();
    let (_, token) = app.account("hr@acme.test", Role::Company).await;

    let (status, created) = app
        .request(
            Method::POST,
            "/api/companies/me",
            Some(&token),
            Some(json!({ "company_name": "Acme", "contact_email": "hr@acme.test" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let (status, updated) = app
        .request(
            Method::PATCH,
            "/api/companies/me",
            Some(&token),
            Some(json!({ "website": "https://acme.test" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["website"], "https://acme.test");
    assert_eq!(updated["company_name"], "Acme");
    assert_eq!(updated["id"], created["id"]);

    let (status, body) = app
        .request(
            Method::PATCH,
            "/api/companies/me",
            Some(&token),
            Some(json!({ "contact_email": "not-an-email" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn company_profile_routes_refuse_other_roles() {
    let app = spawn_app();
    let (_, student_token) = app.student("ada@uni.edu", "S-1").await;
    let (_, admin_token) = app.account("admin@uni.edu", Role::Admin).await;

    for token in [&student_token, &admin_token] {
        let (status, _) = app
            .request(Method::GET, "/api/companies/me", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app
            .request(
                Method::PATCH,
                "/api/companies/me",
                Some(token),
                Some(json!({ "company_name": "Taken over" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
