//! Policy subjects: the typed resource shapes authorization rules match against.
//!
//! A subject carries only what conditions need at decision time: its kind, its
//! id, and (for ownable resources) its owner. Subjects are transient values
//! built at the call site from persisted records; the engine never mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from constructing a subject out of a loosely-typed record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubjectError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} is not a valid identifier: {value}")]
    InvalidId { field: &'static str, value: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Subject Kinds
// ═══════════════════════════════════════════════════════════════════════════════

/// The kind discriminator for subjects.
///
/// `All` is a wildcard usable only on the matching side of a rule; it is never
/// the kind of a constructed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Organization,
    Project,
    Invite,
    Billing,
    User,
    All,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Project => "project",
            Self::Invite => "invite",
            Self::Billing => "billing",
            Self::User => "user",
            Self::All => "all",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Per-Kind Subjects
// ═══════════════════════════════════════════════════════════════════════════════

/// An organization, as seen by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSubject {
    pub id: Uuid,
    pub owner_id: Uuid,
}

impl OrganizationSubject {
    pub fn new(id: Uuid, owner_id: Uuid) -> Self {
        Self { id, owner_id }
    }

    /// Validate and construct from a loosely-typed record.
    pub fn from_record(record: &serde_json::Value) -> Result<Self, SubjectError> {
        Ok(Self {
            id: require_uuid(record, "id")?,
            owner_id: require_uuid(record, "owner_id")?,
        })
    }
}

/// A project, as seen by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSubject {
    pub id: Uuid,
    pub owner_id: Uuid,
}

impl ProjectSubject {
    pub fn new(id: Uuid, owner_id: Uuid) -> Self {
        Self { id, owner_id }
    }

    pub fn from_record(record: &serde_json::Value) -> Result<Self, SubjectError> {
        Ok(Self {
            id: require_uuid(record, "id")?,
            owner_id: require_uuid(record, "owner_id")?,
        })
    }
}

/// An invite, as seen by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteSubject {
    pub id: Uuid,
}

impl InviteSubject {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }

    pub fn from_record(record: &serde_json::Value) -> Result<Self, SubjectError> {
        Ok(Self {
            id: require_uuid(record, "id")?,
        })
    }
}

/// An organization's billing surface, as seen by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSubject {
    pub organization_id: Uuid,
}

impl BillingSubject {
    pub fn new(organization_id: Uuid) -> Self {
        Self { organization_id }
    }

    pub fn from_record(record: &serde_json::Value) -> Result<Self, SubjectError> {
        Ok(Self {
            organization_id: require_uuid(record, "organization_id")?,
        })
    }
}

/// A user, as seen by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSubject {
    pub id: Uuid,
}

impl UserSubject {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }

    pub fn from_record(record: &serde_json::Value) -> Result<Self, SubjectError> {
        Ok(Self {
            id: require_uuid(record, "id")?,
        })
    }
}

/// Read a required UUID field out of a loose JSON record.
fn require_uuid(record: &serde_json::Value, field: &'static str) -> Result<Uuid, SubjectError> {
    let raw = record
        .get(field)
        .and_then(serde_json::Value::as_str)
        .ok_or(SubjectError::MissingField(field))?;

    Uuid::parse_str(raw).map_err(|_| SubjectError::InvalidId {
        field,
        value: raw.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Subject (tagged union)
// ═══════════════════════════════════════════════════════════════════════════════

/// A concrete subject instance, tagged with its kind.
///
/// A closed sum type rather than a runtime type tag, so matching on subject
/// kinds is exhaustiveness-checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Organization(OrganizationSubject),
    Project(ProjectSubject),
    Invite(InviteSubject),
    Billing(BillingSubject),
    User(UserSubject),
}

impl Subject {
    /// The kind discriminator for this instance. Never `All`.
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Organization(_) => SubjectKind::Organization,
            Self::Project(_) => SubjectKind::Project,
            Self::Invite(_) => SubjectKind::Invite,
            Self::Billing(_) => SubjectKind::Billing,
            Self::User(_) => SubjectKind::User,
        }
    }

    /// The owning user, for kinds that carry ownership.
    pub fn owner_id(&self) -> Option<Uuid> {
        match self {
            Self::Organization(org) => Some(org.owner_id),
            Self::Project(project) => Some(project.owner_id),
            Self::Invite(_) | Self::Billing(_) | Self::User(_) => None,
        }
    }
}

impl From<OrganizationSubject> for Subject {
    fn from(subject: OrganizationSubject) -> Self {
        Self::Organization(subject)
    }
}

impl From<ProjectSubject> for Subject {
    fn from(subject: ProjectSubject) -> Self {
        Self::Project(subject)
    }
}

impl From<InviteSubject> for Subject {
    fn from(subject: InviteSubject) -> Self {
        Self::Invite(subject)
    }
}

impl From<BillingSubject> for Subject {
    fn from(subject: BillingSubject) -> Self {
        Self::Billing(subject)
    }
}

impl From<UserSubject> for Subject {
    fn from(subject: UserSubject) -> Self {
        Self::User(subject)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
