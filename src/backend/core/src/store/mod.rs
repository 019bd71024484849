//! In-memory persistence boundary.
//!
//! The store owns all records behind a cheaply cloneable handle and enforces
//! the unique indexes the HTTP layer relies on (user email, organization
//! slug). Handlers read records here, build policy subjects from them, and
//! ask the policy engine for a decision before mutating anything.

pub mod models;

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::authz::Role;

pub use models::{slugify, Invite, Member, Organization, Project, User};

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("A {entity} with this {field} already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Store
// ═══════════════════════════════════════════════════════════════════════════════

/// The shared application store. Thread-safe via `DashMap`; clone freely.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    users: DashMap<Uuid, User>,
    users_by_email: DashMap<String, Uuid>,
    organizations: DashMap<Uuid, Organization>,
    orgs_by_slug: DashMap<String, Uuid>,
    /// Key: (organization id, user id).
    members: DashMap<(Uuid, Uuid), Member>,
    projects: DashMap<Uuid, Project>,
    invites: DashMap<Uuid, Invite>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a user; fails if the email is already registered.
    pub fn create_user(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<User, StoreError> {
        let email = email.into();
        if self.inner.users_by_email.contains_key(&email) {
            return Err(StoreError::Duplicate {
                entity: "user",
                field: "email",
            });
        }

        let user = User::new(name, email.clone(), password_hash);
        self.inner.users_by_email.insert(email, user.id);
        self.inner.users.insert(user.id, user.clone());
        debug!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.inner.users.get(&id).map(|u| u.clone())
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let id = *self.inner.users_by_email.get(email)?;
        self.user(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Organizations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an organization and enroll the owner as an admin member.
    pub fn create_organization(
        &self,
        name: impl Into<String>,
        owner_id: Uuid,
    ) -> Result<Organization, StoreError> {
        let name = name.into();
        let slug = slugify(&name);
        if self.inner.orgs_by_slug.contains_key(&slug) {
            return Err(StoreError::Duplicate {
                entity: "organization",
                field: "slug",
            });
        }

        let org = Organization::new(name, slug.clone(), owner_id);
        self.inner.orgs_by_slug.insert(slug, org.id);
        self.inner.organizations.insert(org.id, org.clone());
        self.add_member(org.id, owner_id, Role::Admin);
        debug!(organization_id = %org.id, slug = %org.slug, "Organization created");
        Ok(org)
    }

    pub fn organization(&self, id: Uuid) -> Option<Organization> {
        self.inner.organizations.get(&id).map(|o| o.clone())
    }

    pub fn organization_by_slug(&self, slug: &str) -> Option<Organization> {
        let id = *self.inner.orgs_by_slug.get(slug)?;
        self.organization(id)
    }

    /// Organizations the user belongs to, with their role in each.
    pub fn organizations_for_user(&self, user_id: Uuid) -> Vec<(Organization, Role)> {
        self.inner
            .members
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .filter_map(|entry| {
                self.organization(entry.organization_id)
                    .map(|org| (org, entry.role))
            })
            .collect()
    }

    pub fn rename_organization(
        &self,
        id: Uuid,
        name: impl Into<String>,
    ) -> Result<Organization, StoreError> {
        let mut org = self
            .inner
            .organizations
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "Organization",
            })?;
        org.name = name.into();
        org.updated_at = chrono::Utc::now();
        Ok(org.clone())
    }

    /// Move ownership to another member, promoting them to admin.
    pub fn transfer_organization(
        &self,
        id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<Organization, StoreError> {
        if self.membership(id, new_owner_id).is_none() {
            return Err(StoreError::NotFound { entity: "Member" });
        }

        self.update_member_role(id, new_owner_id, Role::Admin)?;

        let mut org = self
            .inner
            .organizations
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "Organization",
            })?;
        org.owner_id = new_owner_id;
        org.updated_at = chrono::Utc::now();
        Ok(org.clone())
    }

    /// Delete an organization and everything scoped to it.
    pub fn delete_organization(&self, id: Uuid) -> Result<(), StoreError> {
        let (_, org) = self
            .inner
            .organizations
            .remove(&id)
            .ok_or(StoreError::NotFound {
                entity: "Organization",
            })?;

        self.inner.orgs_by_slug.remove(&org.slug);
        self.inner.members.retain(|key, _| key.0 != id);
        self.inner.projects.retain(|_, p| p.organization_id != id);
        self.inner.invites.retain(|_, i| i.organization_id != id);
        debug!(organization_id = %id, "Organization deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Memberships
    // ─────────────────────────────────────────────────────────────────────────

    pub fn add_member(&self, organization_id: Uuid, user_id: Uuid, role: Role) -> Member {
        let member = Member::new(organization_id, user_id, role);
        self.inner
            .members
            .insert((organization_id, user_id), member.clone());
        member
    }

    pub fn membership(&self, organization_id: Uuid, user_id: Uuid) -> Option<Member> {
        self.inner
            .members
            .get(&(organization_id, user_id))
            .map(|m| m.clone())
    }

    pub fn members_of(&self, organization_id: Uuid) -> Vec<Member> {
        let mut members: Vec<Member> = self
            .inner
            .members
            .iter()
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.clone())
            .collect();
        members.sort_by_key(|m| m.joined_at);
        members
    }

    pub fn update_member_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<Member, StoreError> {
        let mut member = self
            .inner
            .members
            .get_mut(&(organization_id, user_id))
            .ok_or(StoreError::NotFound { entity: "Member" })?;
        member.role = role;
        Ok(member.clone())
    }

    pub fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        self.inner
            .members
            .remove(&(organization_id, user_id))
            .map(|_| ())
            .ok_or(StoreError::NotFound { entity: "Member" })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a project constructed by the caller.
    ///
    /// Handlers build the record first so the policy check runs against the
    /// exact subject that will be stored.
    pub fn insert_project(&self, project: Project) -> Project {
        self.inner.projects.insert(project.id, project.clone());
        debug!(
            project_id = %project.id,
            organization_id = %project.organization_id,
            "Project created"
        );
        project
    }

    /// A project by id, scoped to the organization it must belong to.
    pub fn project(&self, organization_id: Uuid, project_id: Uuid) -> Option<Project> {
        self.inner
            .projects
            .get(&project_id)
            .filter(|p| p.organization_id == organization_id)
            .map(|p| p.clone())
    }

    pub fn projects_of(&self, organization_id: Uuid) -> Vec<Project> {
        let mut projects: Vec<Project> = self
            .inner
            .projects
            .iter()
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.clone())
            .collect();
        projects.sort_by_key(|p| p.created_at);
        projects
    }

    pub fn update_project(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Project, StoreError> {
        let mut project = self
            .inner
            .projects
            .get_mut(&project_id)
            .filter(|p| p.organization_id == organization_id)
            .ok_or(StoreError::NotFound { entity: "Project" })?;
        project.name = name.into();
        project.description = description.into();
        project.updated_at = chrono::Utc::now();
        Ok(project.clone())
    }

    pub fn delete_project(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<(), StoreError> {
        let scoped = self
            .inner
            .projects
            .get(&project_id)
            .is_some_and(|p| p.organization_id == organization_id);
        if !scoped {
            return Err(StoreError::NotFound { entity: "Project" });
        }
        self.inner.projects.remove(&project_id);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invites
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an invite; fails if the email already has one pending for the
    /// organization.
    pub fn create_invite(
        &self,
        organization_id: Uuid,
        email: impl Into<String>,
        role: Role,
        author_id: Uuid,
    ) -> Result<Invite, StoreError> {
        let email = email.into();
        let pending = self
            .inner
            .invites
            .iter()
            .any(|entry| entry.organization_id == organization_id && entry.email == email);
        if pending {
            return Err(StoreError::Duplicate {
                entity: "invite",
                field: "email",
            });
        }

        let invite = Invite::new(organization_id, email, role, author_id);
        self.inner.invites.insert(invite.id, invite.clone());
        Ok(invite)
    }

    pub fn invite(&self, id: Uuid) -> Option<Invite> {
        self.inner.invites.get(&id).map(|i| i.clone())
    }

    pub fn invites_of(&self, organization_id: Uuid) -> Vec<Invite> {
        let mut invites: Vec<Invite> = self
            .inner
            .invites
            .iter()
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.clone())
            .collect();
        invites.sort_by_key(|i| i.created_at);
        invites
    }

    pub fn pending_invites_for(&self, email: &str) -> Vec<Invite> {
        self.inner
            .invites
            .iter()
            .filter(|entry| entry.email == email)
            .map(|entry| entry.clone())
            .collect()
    }

    pub fn delete_invite(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner
            .invites
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { entity: "Invite" })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
