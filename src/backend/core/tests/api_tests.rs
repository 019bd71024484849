//! End-to-end tests for the HTTP API.
//!
//! Tests cover:
//! - Public vs protected routes
//! - Account creation and password login
//! - Organization lifecycle and the ownership gates on destructive actions
//! - Project ownership checks through the member role
//! - Invite flow: create, accept, and the resulting membership role
//! - Billing visibility per role
//!
//! The whole stack is exercised through `tower::ServiceExt::oneshot`, the
//! same way a real client would hit the router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use lattice_core::{
    api::{build_router, AppState},
    authz::PolicyEngine,
    middleware::{AuthConfig, Authenticator},
    store::Store,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// Harness
// ============================================================================

fn test_app() -> Router {
    let authenticator = Authenticator::new(AuthConfig {
        jwt_secret: "api-test-secret-not-for-production".to_string(),
        ..Default::default()
    })
    .unwrap();

    build_router(AppState {
        store: Store::new(),
        policy: PolicyEngine::new(),
        authenticator: Arc::new(authenticator),
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn req(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Register an account and log in, returning the bearer token.
async fn register(app: &Router, name: &str, email: &str) -> String {
    let (status, _) = send(
        app,
        req(
            "POST",
            "/users",
            None,
            Some(json!({ "name": name, "email": email, "password": "hunter2-hunter2" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        req(
            "POST",
            "/sessions/password",
            None,
            Some(json!({ "email": email, "password": "hunter2-hunter2" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Create an organization and return its slug.
async fn create_org(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        req(
            "POST",
            "/organizations",
            Some(token),
            Some(json!({ "name": name })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["slug"].as_str().unwrap().to_string()
}

/// Invite `email` into the org and accept it as that user, returning their token.
async fn join_as(app: &Router, admin_token: &str, slug: &str, email: &str, role: &str) -> String {
    let (status, body) = send(
        app,
        req(
            "POST",
            &format!("/organizations/{slug}/invites"),
            Some(admin_token),
            Some(json!({ "email": email, "role": role })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let invite_id = body["data"]["invite_id"].as_str().unwrap().to_string();

    let token = register(app, email.split('@').next().unwrap(), email).await;
    let (status, _) = send(
        app,
        req(
            "POST",
            &format!("/invites/{invite_id}/accept"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    token
}

// ============================================================================
// Public vs Protected Routes
// ============================================================================

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let (status, body) = send(&app, req("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let app = test_app();
    let (status, _) = send(&app, req("GET", "/organizations", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_unauthorized_even_on_public_paths() {
    let app = test_app();
    let (status, _) = send(&app, req("GET", "/health", Some("garbage"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Accounts & Sessions
// ============================================================================

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = test_app();
    register(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &app,
        req(
            "POST",
            "/users",
            None,
            Some(json!({
                "name": "Imposter",
                "email": "ada@example.com",
                "password": "hunter2-hunter2"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_RECORD");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app();
    register(&app, "Ada", "ada@example.com").await;

    let (status, _) = send(
        &app,
        req(
            "POST",
            "/sessions/password",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_reflects_the_token_owner() {
    let app = test_app();
    let token = register(&app, "Ada", "ada@example.com").await;

    let (status, body) = send(&app, req("GET", "/profile", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ada@example.com");
}

// ============================================================================
// Organizations
// ============================================================================

#[tokio::test]
async fn creator_becomes_admin_member() {
    let app = test_app();
    let token = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &token, "Acme Corp").await;
    assert_eq!(slug, "acme-corp");

    let (status, body) = send(
        &app,
        req(
            "GET",
            &format!("/organizations/{slug}/membership"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "ADMIN");
}

#[tokio::test]
async fn owner_admin_can_shutdown_organization() {
    let app = test_app();
    let token = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &token, "Acme").await;

    let (status, _) = send(
        &app,
        req("DELETE", &format!("/organizations/{slug}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        req("GET", &format!("/organizations/{slug}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_admin_cannot_shutdown_organization() {
    let app = test_app();
    let owner = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &owner, "Acme").await;

    // Eve becomes an ADMIN, but not the owner.
    let eve = join_as(&app, &owner, &slug, "eve@example.com", "ADMIN").await;

    let (status, body) = send(
        &app,
        req("DELETE", &format!("/organizations/{slug}"), Some(&eve), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn transferred_organization_obeys_the_new_owner() {
    let app = test_app();
    let owner = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &owner, "Acme").await;
    let eve = join_as(&app, &owner, &slug, "eve@example.com", "ADMIN").await;

    // Look up Eve's user id through her profile.
    let (_, profile) = send(&app, req("GET", "/profile", Some(&eve), None)).await;
    let eve_id = profile["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        req(
            "PATCH",
            &format!("/organizations/{slug}/owner"),
            Some(&owner),
            Some(json!({ "transferToUserId": eve_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The previous owner may no longer shut the organization down; Eve may.
    let (status, _) = send(
        &app,
        req("DELETE", &format!("/organizations/{slug}"), Some(&owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        req("DELETE", &format!("/organizations/{slug}"), Some(&eve), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ============================================================================
// Projects
// ============================================================================

#[tokio::test]
async fn member_manages_only_owned_projects() {
    let app = test_app();
    let admin = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &admin, "Acme").await;
    let member = join_as(&app, &admin, &slug, "mia@example.com", "MEMBER").await;

    // The admin's project.
    let (status, body) = send(
        &app,
        req(
            "POST",
            &format!("/organizations/{slug}/projects"),
            Some(&admin),
            Some(json!({ "name": "Admin Project", "description": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let admin_project = body["data"]["project_id"].as_str().unwrap().to_string();

    // Members can create projects of their own.
    let (status, body) = send(
        &app,
        req(
            "POST",
            &format!("/organizations/{slug}/projects"),
            Some(&member),
            Some(json!({ "name": "Member Project", "description": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let member_project = body["data"]["project_id"].as_str().unwrap().to_string();

    // A member cannot delete a project they do not own.
    let (status, _) = send(
        &app,
        req(
            "DELETE",
            &format!("/organizations/{slug}/projects/{admin_project}"),
            Some(&member),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Their own project deletes fine.
    let (status, _) = send(
        &app,
        req(
            "DELETE",
            &format!("/organizations/{slug}/projects/{member_project}"),
            Some(&member),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The admin's wildcard covers foreign projects.
    let (status, _) = send(
        &app,
        req(
            "DELETE",
            &format!("/organizations/{slug}/projects/{admin_project}"),
            Some(&admin),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn non_member_cannot_list_projects() {
    let app = test_app();
    let admin = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &admin, "Acme").await;
    let outsider = register(&app, "Out", "out@example.com").await;

    let (status, _) = send(
        &app,
        req(
            "GET",
            &format!("/organizations/{slug}/projects"),
            Some(&outsider),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Billing
// ============================================================================

#[tokio::test]
async fn billing_visibility_per_role() {
    let app = test_app();
    let admin = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &admin, "Acme").await;
    let member = join_as(&app, &admin, &slug, "mia@example.com", "MEMBER").await;
    let billing = join_as(&app, &admin, &slug, "bill@example.com", "BILLING").await;

    // Members have no billing grant.
    let (status, _) = send(
        &app,
        req(
            "GET",
            &format!("/organizations/{slug}/billing"),
            Some(&member),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Billing members do; billing seats are not billable.
    let (status, body) = send(
        &app,
        req(
            "GET",
            &format!("/organizations/{slug}/billing"),
            Some(&billing),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["seats"]["amount"], 2);
    assert_eq!(body["data"]["seats"]["price"], 20);
    assert_eq!(body["data"]["projects"]["amount"], 0);
    assert_eq!(body["data"]["total"], 20);

    // Billing members cannot read the rest of the organization.
    let (status, _) = send(
        &app,
        req(
            "GET",
            &format!("/organizations/{slug}/projects"),
            Some(&billing),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Invites
// ============================================================================

#[tokio::test]
async fn member_cannot_create_invites() {
    let app = test_app();
    let admin = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &admin, "Acme").await;
    let member = join_as(&app, &admin, &slug, "mia@example.com", "MEMBER").await;

    let (status, _) = send(
        &app,
        req(
            "POST",
            &format!("/organizations/{slug}/invites"),
            Some(&member),
            Some(json!({ "email": "new@example.com", "role": "MEMBER" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invite_can_only_be_accepted_by_its_addressee() {
    let app = test_app();
    let admin = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &admin, "Acme").await;

    let (_, body) = send(
        &app,
        req(
            "POST",
            &format!("/organizations/{slug}/invites"),
            Some(&admin),
            Some(json!({ "email": "mia@example.com", "role": "MEMBER" })),
        ),
    )
    .await;
    let invite_id = body["data"]["invite_id"].as_str().unwrap().to_string();

    let stranger = register(&app, "Sam", "sam@example.com").await;
    let (status, _) = send(
        &app,
        req(
            "POST",
            &format!("/invites/{invite_id}/accept"),
            Some(&stranger),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mia = register(&app, "Mia", "mia@example.com").await;
    let (status, _) = send(
        &app,
        req(
            "POST",
            &format!("/invites/{invite_id}/accept"),
            Some(&mia),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The invite is consumed.
    let (status, _) = send(
        &app,
        req("GET", &format!("/invites/{invite_id}"), Some(&mia), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pending_invites_follow_the_email() {
    let app = test_app();
    let admin = register(&app, "Ada", "ada@example.com").await;
    let slug = create_org(&app, &admin, "Acme").await;

    send(
        &app,
        req(
            "POST",
            &format!("/organizations/{slug}/invites"),
            Some(&admin),
            Some(json!({ "email": "mia@example.com", "role": "MEMBER" })),
        ),
    )
    .await;

    let mia = register(&app, "Mia", "mia@example.com").await;
    let (status, body) = send(&app, req("GET", "/pending-invites", Some(&mia), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["organization_name"], "Acme");
}
