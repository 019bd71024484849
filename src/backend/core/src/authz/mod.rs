//! Authorization policy engine: role-scoped rules with instance-level conditions.
//!
//! This module provides:
//! - **Subjects**: typed resource shapes the engine reasons about (Organization,
//!   Project, Invite, Billing, User, plus the `All` wildcard kind)
//! - **Abilities**: the ordered rule list built for one identity, with the
//!   `can`/`cannot` decision functions
//! - **Roles**: Admin, Member, and Billing, each with a fixed rule-building function
//! - **Policy Engine**: the facade that turns an [`Identity`] into an [`Ability`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use lattice_core::authz::{Action, Identity, PolicyEngine, Role};
//!
//! let engine = PolicyEngine::new();
//! let ability = engine.ability_for(&Identity::new(user_id, Role::Member));
//!
//! if ability.cannot(Action::Delete, &project.policy_subject()) {
//!     // map to a 403 at the HTTP boundary
//! }
//! ```
//!
//! A negative decision is an ordinary `false`, never an error. Rules are
//! declared per role in [`roles`] and rebuilt fresh for every check.

pub mod ability;
pub mod engine;
pub mod roles;
pub mod subject;

pub use ability::{owned_by, Ability, AbilityBuilder, Action, Condition, Effect, Rule, Target};
pub use engine::{Identity, PolicyEngine, PolicyError};
pub use roles::Role;
pub use subject::{
    BillingSubject, InviteSubject, OrganizationSubject, ProjectSubject, Subject, SubjectError,
    SubjectKind, UserSubject,
};
