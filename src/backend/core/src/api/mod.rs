//! HTTP API layer for Lattice Core.
//!
//! Thin CRUD handlers over the store. Every mutating and most read endpoints
//! follow the same shape: resolve the caller's membership for the target
//! organization, obtain an [`crate::authz::Ability`] for the resolved role,
//! check the action against the target subject, then act. The route layer
//! never makes an authorization decision itself.

pub mod handlers;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::authz::PolicyEngine;
use crate::middleware::{AuthLayer, Authenticator};
use crate::store::Store;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub policy: PolicyEngine,
    pub authenticator: Arc<Authenticator>,
}

/// Build the API router.
///
/// # Endpoints
///
/// ## Auth
/// - `POST /users` - Create an account
/// - `POST /sessions/password` - Authenticate with email and password
/// - `GET /profile` - Get the authenticated user's profile
///
/// ## Organizations
/// - `POST /organizations` - Create an organization
/// - `GET /organizations` - List organizations the caller belongs to
/// - `GET /organizations/:slug` - Get an organization
/// - `PUT /organizations/:slug` - Update an organization
/// - `DELETE /organizations/:slug` - Shut down an organization
/// - `PATCH /organizations/:slug/owner` - Transfer ownership
/// - `GET /organizations/:slug/membership` - Get the caller's membership
///
/// ## Members
/// - `GET /organizations/:slug/members` - List members
/// - `PUT /organizations/:slug/members/:memberId` - Change a member's role
/// - `DELETE /organizations/:slug/members/:memberId` - Remove a member
///
/// ## Projects
/// - `POST /organizations/:slug/projects` - Create a project
/// - `GET /organizations/:slug/projects` - List projects
/// - `GET /organizations/:slug/projects/:projectId` - Get a project
/// - `PUT /organizations/:slug/projects/:projectId` - Update a project
/// - `DELETE /organizations/:slug/projects/:projectId` - Delete a project
///
/// ## Invites
/// - `POST /organizations/:slug/invites` - Create an invite
/// - `GET /organizations/:slug/invites` - List invites
/// - `DELETE /organizations/:slug/invites/:inviteId` - Revoke an invite
/// - `GET /invites/:inviteId` - Get an invite
/// - `POST /invites/:inviteId/accept` - Accept an invite
/// - `GET /pending-invites` - List the caller's pending invites
///
/// ## Billing
/// - `GET /organizations/:slug/billing` - Billing summary
///
/// ## System
/// - `GET /health` - Health check (unauthenticated)
/// - `GET /metrics` - Prometheus metrics (unauthenticated)
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth = AuthLayer::new(state.authenticator.clone());

    Router::new()
        // System
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        // Auth
        .route("/users", post(handlers::create_account))
        .route("/sessions/password", post(handlers::authenticate_with_password))
        .route("/profile", get(handlers::get_profile))
        // Organizations
        .route(
            "/organizations",
            post(handlers::create_organization).get(handlers::get_organizations),
        )
        .route(
            "/organizations/:slug",
            get(handlers::get_organization)
                .put(handlers::update_organization)
                .delete(handlers::shutdown_organization),
        )
        .route("/organizations/:slug/owner", patch(handlers::transfer_organization))
        .route("/organizations/:slug/membership", get(handlers::get_membership))
        // Members
        .route("/organizations/:slug/members", get(handlers::get_members))
        .route(
            "/organizations/:slug/members/:memberId",
            put(handlers::update_member).delete(handlers::remove_member),
        )
        // Projects
        .route(
            "/organizations/:slug/projects",
            post(handlers::create_project).get(handlers::get_projects),
        )
        .route(
            "/organizations/:slug/projects/:projectId",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        // Invites
        .route(
            "/organizations/:slug/invites",
            post(handlers::create_invite).get(handlers::get_invites),
        )
        .route(
            "/organizations/:slug/invites/:inviteId",
            delete(handlers::revoke_invite),
        )
        .route("/invites/:inviteId", get(handlers::get_invite))
        .route("/invites/:inviteId/accept", post(handlers::accept_invite))
        .route("/pending-invites", get(handlers::get_pending_invites))
        // Billing
        .route("/organizations/:slug/billing", get(handlers::get_billing))
        // Middleware
        .layer(auth)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// API response wrapper.
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: Some(code.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let response: ApiResponse<()> = ApiResponse::error("test error");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("test error".to_string()));
    }
}
