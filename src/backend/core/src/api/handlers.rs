//! API request handlers with proper error propagation.
//!
//! All handlers return `Result<impl IntoResponse, LatticeError>` so that
//! errors are automatically converted to appropriate HTTP status codes via
//! the `IntoResponse` implementation on `LatticeError`.
//!
//! Authorization follows one pattern everywhere: resolve the caller's
//! membership for the target organization (which yields the org-scoped
//! role), build an ability, and check the action against the subject built
//! from the record about to be read or mutated.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiResponse, AppState};
use crate::authz::{Ability, Action, Identity, Role, SubjectKind};
use crate::error::LatticeError;
use crate::middleware::CurrentUser;
use crate::observability;
use crate::store::{Member, Organization, Project};

// Billing unit prices, in dollars per month.
const SEAT_UNIT_PRICE: u64 = 10;
const PROJECT_UNIT_PRICE: u64 = 20;

// ═══════════════════════════════════════════════════════════════════════════════
// Shared Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolve the caller's membership in the organization addressed by `slug`.
///
/// Role resolution is organization-scoped: the same user may hold different
/// roles in different organizations.
fn resolve_membership(
    state: &AppState,
    slug: &str,
    user_id: Uuid,
) -> Result<(Organization, Member), LatticeError> {
    let organization = state
        .store
        .organization_by_slug(slug)
        .ok_or_else(|| LatticeError::not_found("Organization"))?;

    let member = state
        .store
        .membership(organization.id, user_id)
        .ok_or_else(|| LatticeError::forbidden("You're not a member of this organization"))?;

    Ok((organization, member))
}

/// Build the ability for a resolved membership.
fn ability_for(state: &AppState, member: &Member) -> Ability {
    state
        .policy
        .ability_for(&Identity::new(member.user_id, member.role))
}

/// The 403 raised when a policy decision comes back negative.
fn forbidden(action: Action, subject: SubjectKind, message: &'static str) -> LatticeError {
    observability::metrics::record_forbidden(action.as_str(), subject.as_str());
    LatticeError::forbidden(message)
}

fn hash_password(password: &str) -> Result<String, LatticeError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LatticeError::internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool, LatticeError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| LatticeError::internal(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Health & Metrics
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn prometheus_metrics() -> impl IntoResponse {
    let body = observability::metrics::render();

    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Auth Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct CreateAccountResponse {
    pub user_id: Uuid,
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    if req.name.trim().is_empty() {
        return Err(LatticeError::validation("Name cannot be empty"));
    }
    if !req.email.contains('@') {
        return Err(LatticeError::validation("Invalid e-mail address"));
    }
    if req.password.len() < 8 {
        return Err(LatticeError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .store
        .create_user(req.name.trim(), req.email.to_lowercase(), password_hash)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateAccountResponse {
            user_id: user.id,
        })),
    ))
}

#[derive(Deserialize)]
pub struct PasswordAuthRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct PasswordAuthResponse {
    pub token: String,
}

pub async fn authenticate_with_password(
    State(state): State<AppState>,
    Json(req): Json<PasswordAuthRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    let user = state
        .store
        .user_by_email(&req.email.to_lowercase())
        .ok_or_else(|| LatticeError::unauthorized("Invalid credentials"))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(LatticeError::unauthorized("Invalid credentials"));
    }

    let token = state
        .authenticator
        .issue_token(user.id)
        .map_err(|e| LatticeError::internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PasswordAuthResponse { token })),
    ))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<impl IntoResponse, LatticeError> {
    let user = state
        .store
        .user(ctx.user_id)
        .ok_or_else(|| LatticeError::not_found("User"))?;

    Ok(Json(ApiResponse::success(ProfileResponse {
        id: user.id,
        name: user.name,
        email: user.email,
    })))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Organization Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct CreateOrganizationResponse {
    pub organization_id: Uuid,
    pub slug: String,
}

pub async fn create_organization(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    if req.name.trim().is_empty() {
        return Err(LatticeError::validation("Organization name cannot be empty"));
    }

    let org = state
        .store
        .create_organization(req.name.trim(), ctx.user_id)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateOrganizationResponse {
            organization_id: org.id,
            slug: org.slug,
        })),
    ))
}

#[derive(Serialize)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
    pub role: Role,
}

pub async fn get_organizations(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<impl IntoResponse, LatticeError> {
    let mut organizations: Vec<OrganizationSummary> = state
        .store
        .organizations_for_user(ctx.user_id)
        .into_iter()
        .map(|(org, role)| OrganizationSummary {
            id: org.id,
            name: org.name,
            slug: org.slug,
            owner_id: org.owner_id,
            role,
        })
        .collect();
    organizations.sort_by(|a, b| a.slug.cmp(&b.slug));

    Ok(Json(ApiResponse::success(organizations)))
}

pub async fn get_organization(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Get, &org.policy_subject()) {
        return Err(forbidden(
            Action::Get,
            SubjectKind::Organization,
            "You're not allowed to see this organization",
        ));
    }

    Ok(Json(ApiResponse::success(org)))
}

#[derive(Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: String,
}

pub async fn update_organization(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
    Json(req): Json<UpdateOrganizationRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Update, &org.policy_subject()) {
        return Err(forbidden(
            Action::Update,
            SubjectKind::Organization,
            "You're not allowed to update this organization",
        ));
    }

    let org = state.store.rename_organization(org.id, req.name)?;
    Ok(Json(ApiResponse::success(org)))
}

pub async fn shutdown_organization(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Delete, &org.policy_subject()) {
        return Err(forbidden(
            Action::Delete,
            SubjectKind::Organization,
            "You're not allowed to shutdown this organization",
        ));
    }

    state.store.delete_organization(org.id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOrganizationRequest {
    pub transfer_to_user_id: Uuid,
}

pub async fn transfer_organization(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
    Json(req): Json<TransferOrganizationRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::TransferOwnership, &org.policy_subject()) {
        return Err(forbidden(
            Action::TransferOwnership,
            SubjectKind::Organization,
            "You're not allowed to transfer this organization",
        ));
    }

    if state
        .store
        .membership(org.id, req.transfer_to_user_id)
        .is_none()
    {
        return Err(LatticeError::validation(
            "Target user is not a member of the organization",
        ));
    }

    state
        .store
        .transfer_organization(org.id, req.transfer_to_user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct MembershipResponse {
    pub id: Uuid,
    pub role: Role,
    pub organization_id: Uuid,
}

pub async fn get_membership(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, LatticeError> {
    let (_, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    Ok(Json(ApiResponse::success(MembershipResponse {
        id: member.id,
        role: member.role,
        organization_id: member.organization_id,
    })))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Member Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

pub async fn get_members(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Get, SubjectKind::User) {
        return Err(forbidden(
            Action::Get,
            SubjectKind::User,
            "You're not allowed to see organization members",
        ));
    }

    let members: Vec<MemberResponse> = state
        .store
        .members_of(org.id)
        .into_iter()
        .filter_map(|m| {
            state.store.user(m.user_id).map(|user| MemberResponse {
                id: m.id,
                user_id: m.user_id,
                role: m.role,
                name: user.name,
                email: user.email,
                joined_at: m.joined_at,
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(members)))
}

#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Role,
}

/// Find a member record by its id within an organization.
fn member_by_id(state: &AppState, org_id: Uuid, member_id: Uuid) -> Result<Member, LatticeError> {
    state
        .store
        .members_of(org_id)
        .into_iter()
        .find(|m| m.id == member_id)
        .ok_or_else(|| LatticeError::not_found("Member"))
}

pub async fn update_member(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((slug, member_id)): Path<(String, Uuid)>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Update, SubjectKind::User) {
        return Err(forbidden(
            Action::Update,
            SubjectKind::User,
            "You're not allowed to update this member",
        ));
    }

    let target = member_by_id(&state, org.id, member_id)?;
    let updated = state
        .store
        .update_member_role(org.id, target.user_id, req.role)?;

    Ok(Json(ApiResponse::success(MembershipResponse {
        id: updated.id,
        role: updated.role,
        organization_id: updated.organization_id,
    })))
}

pub async fn remove_member(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((slug, member_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Delete, SubjectKind::User) {
        return Err(forbidden(
            Action::Delete,
            SubjectKind::User,
            "You're not allowed to remove this member",
        ));
    }

    let target = member_by_id(&state, org.id, member_id)?;
    state.store.remove_member(org.id, target.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Project Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: String,
}

#[derive(Serialize)]
pub struct CreateProjectResponse {
    pub project_id: Uuid,
}

pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    if req.name.trim().is_empty() {
        return Err(LatticeError::validation("Project name cannot be empty"));
    }

    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    // Check against the record about to be stored; ownership-conditioned
    // grants need the concrete instance, and the caller will be its owner.
    let project = Project::new(org.id, ctx.user_id, req.name.trim(), req.description);

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Create, &project.policy_subject()) {
        return Err(forbidden(
            Action::Create,
            SubjectKind::Project,
            "You're not allowed to create new projects",
        ));
    }

    let project = state.store.insert_project(project);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateProjectResponse {
            project_id: project.id,
        })),
    ))
}

pub async fn get_projects(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Get, SubjectKind::Project) {
        return Err(forbidden(
            Action::Get,
            SubjectKind::Project,
            "You're not allowed to see organization projects",
        ));
    }

    Ok(Json(ApiResponse::success(state.store.projects_of(org.id))))
}

pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((slug, project_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let project = state
        .store
        .project(org.id, project_id)
        .ok_or_else(|| LatticeError::not_found("Project"))?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Get, &project.policy_subject()) {
        return Err(forbidden(
            Action::Get,
            SubjectKind::Project,
            "You're not allowed to see this project",
        ));
    }

    Ok(Json(ApiResponse::success(project)))
}

#[derive(Deserialize)]
pub struct UpdateProjectRequest {
    pub name: String,
    pub description: String,
}

pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((slug, project_id)): Path<(String, Uuid)>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let project = state
        .store
        .project(org.id, project_id)
        .ok_or_else(|| LatticeError::not_found("Project"))?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Update, &project.policy_subject()) {
        return Err(forbidden(
            Action::Update,
            SubjectKind::Project,
            "You're not allowed to update this project",
        ));
    }

    let project = state
        .store
        .update_project(org.id, project_id, req.name, req.description)?;
    Ok(Json(ApiResponse::success(project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((slug, project_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let project = state
        .store
        .project(org.id, project_id)
        .ok_or_else(|| LatticeError::not_found("Project"))?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Delete, &project.policy_subject()) {
        return Err(forbidden(
            Action::Delete,
            SubjectKind::Project,
            "You're not allowed to delete this project",
        ));
    }

    state.store.delete_project(org.id, project_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Invite Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct CreateInviteRequest {
    pub email: String,
    pub role: Role,
}

#[derive(Serialize)]
pub struct CreateInviteResponse {
    pub invite_id: Uuid,
}

pub async fn create_invite(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
    Json(req): Json<CreateInviteRequest>,
) -> Result<impl IntoResponse, LatticeError> {
    if !req.email.contains('@') {
        return Err(LatticeError::validation("Invalid e-mail address"));
    }

    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Create, SubjectKind::Invite) {
        return Err(forbidden(
            Action::Create,
            SubjectKind::Invite,
            "You're not allowed to create new invites",
        ));
    }

    let invite = state.store.create_invite(
        org.id,
        req.email.to_lowercase(),
        req.role,
        ctx.user_id,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateInviteResponse {
            invite_id: invite.id,
        })),
    ))
}

pub async fn get_invites(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Get, SubjectKind::Invite) {
        return Err(forbidden(
            Action::Get,
            SubjectKind::Invite,
            "You're not allowed to see organization invites",
        ));
    }

    Ok(Json(ApiResponse::success(state.store.invites_of(org.id))))
}

#[derive(Serialize)]
pub struct InviteResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub organization_name: String,
    pub created_at: DateTime<Utc>,
}

/// The invite id itself is the capability here; any authenticated user
/// holding it may look the invite up before deciding to accept.
pub async fn get_invite(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(invite_id): Path<Uuid>,
) -> Result<impl IntoResponse, LatticeError> {
    let invite = state
        .store
        .invite(invite_id)
        .ok_or_else(|| LatticeError::not_found("Invite"))?;

    let organization = state
        .store
        .organization(invite.organization_id)
        .ok_or_else(|| LatticeError::not_found("Organization"))?;

    Ok(Json(ApiResponse::success(InviteResponse {
        id: invite.id,
        email: invite.email,
        role: invite.role,
        organization_name: organization.name,
        created_at: invite.created_at,
    })))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(invite_id): Path<Uuid>,
) -> Result<impl IntoResponse, LatticeError> {
    let invite = state
        .store
        .invite(invite_id)
        .ok_or_else(|| LatticeError::not_found("Invite"))?;

    let user = state
        .store
        .user(ctx.user_id)
        .ok_or_else(|| LatticeError::not_found("User"))?;

    if user.email != invite.email {
        return Err(LatticeError::forbidden("This invite belongs to another user"));
    }

    state
        .store
        .add_member(invite.organization_id, user.id, invite.role);
    state.store.delete_invite(invite.id)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_invite(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((slug, invite_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Delete, SubjectKind::Invite) {
        return Err(forbidden(
            Action::Delete,
            SubjectKind::Invite,
            "You're not allowed to revoke invites",
        ));
    }

    let invite = state
        .store
        .invite(invite_id)
        .filter(|i| i.organization_id == org.id)
        .ok_or_else(|| LatticeError::not_found("Invite"))?;

    state.store.delete_invite(invite.id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_pending_invites(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<impl IntoResponse, LatticeError> {
    let user = state
        .store
        .user(ctx.user_id)
        .ok_or_else(|| LatticeError::not_found("User"))?;

    let invites: Vec<InviteResponse> = state
        .store
        .pending_invites_for(&user.email)
        .into_iter()
        .filter_map(|invite| {
            state
                .store
                .organization(invite.organization_id)
                .map(|org| InviteResponse {
                    id: invite.id,
                    email: invite.email,
                    role: invite.role,
                    organization_name: org.name,
                    created_at: invite.created_at,
                })
        })
        .collect();

    Ok(Json(ApiResponse::success(invites)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Billing Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
pub struct BillingLine {
    pub amount: u64,
    pub unit: u64,
    pub price: u64,
}

#[derive(Serialize)]
pub struct BillingResponse {
    pub seats: BillingLine,
    pub projects: BillingLine,
    pub total: u64,
}

pub async fn get_billing(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, LatticeError> {
    let (org, member) = resolve_membership(&state, &slug, ctx.user_id)?;

    let ability = ability_for(&state, &member);
    if ability.cannot(Action::Get, &org.billing_subject()) {
        return Err(forbidden(
            Action::Get,
            SubjectKind::Billing,
            "You're not allowed to see billing information",
        ));
    }

    // Billing-only members occupy no billable seat.
    let seats = state
        .store
        .members_of(org.id)
        .into_iter()
        .filter(|m| m.role != Role::Billing)
        .count() as u64;
    let projects = state.store.projects_of(org.id).len() as u64;

    let seats_line = BillingLine {
        amount: seats,
        unit: SEAT_UNIT_PRICE,
        price: seats * SEAT_UNIT_PRICE,
    };
    let projects_line = BillingLine {
        amount: projects,
        unit: PROJECT_UNIT_PRICE,
        price: projects * PROJECT_UNIT_PRICE,
    };
    let total = seats_line.price + projects_line.price;

    Ok(Json(ApiResponse::success(BillingResponse {
        seats: seats_line,
        projects: projects_line,
        total,
    })))
}
