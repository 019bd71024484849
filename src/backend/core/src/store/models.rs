//! Persisted record shapes: users, organizations, memberships, projects, invites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::{
    BillingSubject, InviteSubject, OrganizationSubject, ProjectSubject, Role, Subject,
};

// ═══════════════════════════════════════════════════════════════════════════════
// User
// ═══════════════════════════════════════════════════════════════════════════════

/// An account holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 hash, never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Organization (tenant)
// ═══════════════════════════════════════════════════════════════════════════════

/// An organization (tenant) that owns resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// The policy subject for this record.
    pub fn policy_subject(&self) -> Subject {
        Subject::from(OrganizationSubject::new(self.id, self.owner_id))
    }

    /// The policy subject for this organization's billing surface.
    pub fn billing_subject(&self) -> Subject {
        Subject::from(BillingSubject::new(self.id))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Membership
// ═══════════════════════════════════════════════════════════════════════════════

/// Links a user to an organization with an organization-scoped role.
///
/// The same user may hold different roles in different organizations; the
/// policy engine is always handed the role resolved for the organization the
/// request targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(organization_id: Uuid, user_id: Uuid, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Project
// ═══════════════════════════════════════════════════════════════════════════════

/// A project inside an organization, owned by one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(
        organization_id: Uuid,
        owner_id: Uuid,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            owner_id,
            slug: slugify(&name),
            name,
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The policy subject for this record.
    pub fn policy_subject(&self) -> Subject {
        Subject::from(ProjectSubject::new(self.id, self.owner_id))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Invite
// ═══════════════════════════════════════════════════════════════════════════════

/// A pending invitation into an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: Role,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    pub fn new(organization_id: Uuid, email: impl Into<String>, role: Role, author_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            email: email.into(),
            role,
            author_id,
            created_at: Utc::now(),
        }
    }

    /// The policy subject for this record.
    pub fn policy_subject(&self) -> Subject {
        Subject::from(InviteSubject::new(self.id))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Derive a URL-safe slug from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::SubjectKind;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("  Lots   of spaces "), "lots-of-spaces");
        assert_eq!(slugify("Émile's Project!"), "mile-s-project");
    }

    #[test]
    fn test_organization_policy_subject() {
        let owner = Uuid::new_v4();
        let org = Organization::new("Acme", "acme", owner);

        let subject = org.policy_subject();
        assert_eq!(subject.kind(), SubjectKind::Organization);
        assert_eq!(subject.owner_id(), Some(owner));

        assert_eq!(org.billing_subject().kind(), SubjectKind::Billing);
    }

    #[test]
    fn test_project_slug_from_name() {
        let project = Project::new(Uuid::new_v4(), Uuid::new_v4(), "Site Redesign", "");
        assert_eq!(project.slug, "site-redesign");
        assert_eq!(project.policy_subject().kind(), SubjectKind::Project);
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let user = User::new("Ada", "ada@example.com", "argon2-hash");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2-hash"));
        assert!(json.contains("ada@example.com"));
    }
}
