//! The policy engine facade: identity in, ability out.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::ability::{Ability, AbilityBuilder};
use super::roles::Role;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Structural policy errors. A denied decision is never one of these; it is a
/// plain `false` from [`Ability::can`].
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A role string with no registered rule-building function. Indicates a
    /// deployment or data defect, not a bad request.
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════════════

/// The acting principal: a user id and their already-resolved role within the
/// organization the request targets. Built per request from the membership
/// lookup; never persisted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Policy Engine
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds abilities from identities.
///
/// A pure function of its input: no caching, no I/O, no shared state, so
/// concurrent checks from request handlers need no coordination.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build a fresh [`Ability`] for `identity` by running its role's
    /// rule-building function against an empty builder.
    pub fn ability_for(&self, identity: &Identity) -> Ability {
        let mut builder = AbilityBuilder::new();
        identity.role.define_rules(identity, &mut builder);
        builder.build()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
