//! Organization roles and their rule-building functions.
//!
//! Lattice ships with three membership roles:
//!
//! | Role    | Description                                                       |
//! |---------|-------------------------------------------------------------------|
//! | Admin   | Full access; destructive organization actions still need ownership |
//! | Member  | Read access plus full control of their own projects                |
//! | Billing | Read and update the organization's billing surface only           |
//!
//! Each role maps to exactly one rule-building function through a closed
//! `match`, so a role without rules is a compile error rather than a lookup
//! miss discovered per request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ability::{owned_by, AbilityBuilder, Action};
use super::engine::{Identity, PolicyError};
use super::subject::SubjectKind;

/// A membership role within one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Member,
    Billing,
}

impl Role {
    /// Every known role, for startup validation and admin UIs.
    pub const ALL: [Role; 3] = [Self::Admin, Self::Member, Self::Billing];

    /// The canonical string form stored on membership records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
            Self::Billing => "BILLING",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Full access to the organization and its resources",
            Self::Member => "Read access plus management of owned projects",
            Self::Billing => "Access to the organization's billing information",
        }
    }

    /// Run this role's rule-building function against `builder`.
    pub fn define_rules(&self, identity: &Identity, builder: &mut AbilityBuilder) {
        match self {
            Self::Admin => admin_rules(identity, builder),
            Self::Member => member_rules(identity, builder),
            Self::Billing => billing_rules(identity, builder),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "MEMBER" => Ok(Self::Member),
            "BILLING" => Ok(Self::Billing),
            other => Err(PolicyError::UnknownRole(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Per-role rule functions
// ─────────────────────────────────────────────────────────────────────────

/// Admins can do everything, except that update, ownership transfer, and
/// deletion of an organization remain gated on owning it. The unconditional
/// denial comes first so the later ownership-conditioned grant takes
/// precedence only for organizations the admin actually owns.
fn admin_rules(identity: &Identity, ability: &mut AbilityBuilder) {
    const DESTRUCTIVE_ORG_ACTIONS: [Action; 3] =
        [Action::Update, Action::TransferOwnership, Action::Delete];

    ability.can(&[Action::Manage], &[SubjectKind::All]);
    ability.cannot(&DESTRUCTIVE_ORG_ACTIONS, &[SubjectKind::Organization]);
    ability.can_if(
        &DESTRUCTIVE_ORG_ACTIONS,
        &[SubjectKind::Organization],
        owned_by(identity.id),
    );
}

/// Members can read organization-scoped resources and fully manage projects
/// they own. Organization-level scoping itself is the membership lookup's
/// responsibility, not a rule condition.
fn member_rules(identity: &Identity, ability: &mut AbilityBuilder) {
    ability.can(
        &[Action::Get],
        &[
            SubjectKind::Organization,
            SubjectKind::Project,
            SubjectKind::Invite,
            SubjectKind::User,
        ],
    );
    ability.can_if(
        &[Action::Create, Action::Update, Action::Delete],
        &[SubjectKind::Project],
        owned_by(identity.id),
    );
    ability.cannot(
        &[Action::Delete, Action::TransferOwnership],
        &[SubjectKind::Organization],
    );
}

/// Billing members see and update the billing surface, nothing else.
fn billing_rules(_identity: &Identity, ability: &mut AbilityBuilder) {
    ability.can(&[Action::Get, Action::Update], &[SubjectKind::Billing]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
