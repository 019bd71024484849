#![allow(clippy::result_large_err)]
//! # Lattice Core
//!
//! A multi-tenant SaaS backend: organizations, members, projects, invites,
//! and billing, served as thin CRUD handlers over an in-memory store.
//!
//! ## Architecture
//!
//! - **Authz**: the authorization policy engine: role-scoped rules with
//!   ownership conditions, wildcard grants, explicit denials, and
//!   reverse-declaration-order precedence
//! - **Store**: the persistence boundary with typed records and unique indexes
//! - **Middleware**: JWT bearer authentication with request context injection
//! - **API**: axum routes; every protected handler resolves the caller's
//!   organization-scoped role and asks the policy engine before acting
//! - **Observability**: tracing with optional OTLP export and Prometheus metrics

pub mod api;
pub mod authz;
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod store;

pub use error::{ErrorCode, ErrorContext, ErrorSeverity, LatticeError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::authz::{
        owned_by, Ability, AbilityBuilder, Action, BillingSubject, Effect, Identity,
        InviteSubject, OrganizationSubject, PolicyEngine, PolicyError, ProjectSubject, Role, Rule,
        Subject, SubjectError, SubjectKind, Target, UserSubject,
    };
    pub use crate::error::{ErrorCode, ErrorContext, ErrorSeverity, LatticeError, Result};
    pub use crate::middleware::{
        AuthConfig, AuthContext, AuthError, AuthLayer, Authenticator, Claims, CurrentUser,
    };
    pub use crate::store::{Invite, Member, Organization, Project, Store, StoreError, User};
}
