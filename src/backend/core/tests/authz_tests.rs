//! Integration tests for the authorization policy engine.
//!
//! Tests cover:
//! - Default deny for unmatched action/subject pairs
//! - Wildcard grants and later, more specific overrides
//! - Reverse-declaration-order precedence
//! - Ownership-conditioned rules and bare-kind queries
//! - Determinism of ability building
//! - Role scenarios: admin, member, and billing

use std::str::FromStr;

use lattice_core::authz::{
    owned_by, AbilityBuilder, Action, Identity, OrganizationSubject, PolicyEngine, PolicyError,
    ProjectSubject, Role, Subject, SubjectError, SubjectKind, UserSubject,
};
use uuid::Uuid;

fn engine() -> PolicyEngine {
    PolicyEngine::new()
}

fn uid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

// ============================================================================
// Default Deny
// ============================================================================

#[test]
fn empty_rule_set_denies_everything() {
    let ability = AbilityBuilder::new().build();

    for action in [
        Action::Manage,
        Action::Create,
        Action::Get,
        Action::Update,
        Action::Delete,
        Action::TransferOwnership,
    ] {
        for kind in [
            SubjectKind::Organization,
            SubjectKind::Project,
            SubjectKind::Invite,
            SubjectKind::Billing,
            SubjectKind::User,
        ] {
            assert!(!ability.can(action, kind), "{action} on {kind} should deny");
        }
    }
}

#[test]
fn absence_of_a_grant_is_a_deny() {
    // BILLING declares rules for Billing only; everything else must deny
    // without any explicit denial existing for it.
    let ability = engine().ability_for(&Identity::new(uid(1), Role::Billing));

    assert!(!ability.can(Action::Get, SubjectKind::Project));
    assert!(!ability.can(Action::Create, SubjectKind::Organization));
    assert!(ability.cannot(Action::Get, SubjectKind::User));
}

// ============================================================================
// Wildcard Coverage
// ============================================================================

#[test]
fn admin_wildcard_covers_every_action_and_kind() {
    let ability = engine().ability_for(&Identity::new(uid(1), Role::Admin));

    for action in [
        Action::Create,
        Action::Get,
        Action::Update,
        Action::Delete,
        Action::TransferOwnership,
    ] {
        for kind in [
            SubjectKind::Project,
            SubjectKind::Invite,
            SubjectKind::Billing,
            SubjectKind::User,
        ] {
            assert!(ability.can(action, kind), "admin {action} on {kind}");
        }
    }

    // Organization reads stay wildcard-covered; only the destructive org
    // actions are carved out below.
    assert!(ability.can(Action::Get, SubjectKind::Organization));
    assert!(ability.can(Action::Create, SubjectKind::Organization));
}

#[test]
fn later_specific_rule_overrides_wildcard() {
    let mut builder = AbilityBuilder::new();
    builder.can(&[Action::Manage], &[SubjectKind::All]);
    builder.cannot(&[Action::Delete], &[SubjectKind::Project]);
    let ability = builder.build();

    assert!(!ability.can(Action::Delete, SubjectKind::Project));
    assert!(ability.can(Action::Delete, SubjectKind::Invite));
    assert!(ability.can(Action::Update, SubjectKind::Project));
}

// ============================================================================
// Reverse Precedence
// ============================================================================

#[test]
fn later_rule_wins_ties() {
    let mut builder = AbilityBuilder::new();
    builder.can(&[Action::Get], &[SubjectKind::Project]);
    builder.cannot(&[Action::Get], &[SubjectKind::Project]);
    assert!(!builder.build().can(Action::Get, SubjectKind::Project));
}

#[test]
fn reversed_declaration_order_flips_the_decision() {
    let mut builder = AbilityBuilder::new();
    builder.cannot(&[Action::Get], &[SubjectKind::Project]);
    builder.can(&[Action::Get], &[SubjectKind::Project]);
    assert!(builder.build().can(Action::Get, SubjectKind::Project));
}

// ============================================================================
// Ownership Gating
// ============================================================================

#[test]
fn member_deletes_own_project_only() {
    let me = uid(0x11);
    let ability = engine().ability_for(&Identity::new(me, Role::Member));

    let mine = Subject::from(ProjectSubject::new(uid(10), me));
    let theirs = Subject::from(ProjectSubject::new(uid(11), uid(0x22)));

    assert!(ability.can(Action::Delete, &mine));
    assert!(!ability.can(Action::Delete, &theirs));
}

#[test]
fn condition_requires_an_instance() {
    let me = uid(1);
    let mut builder = AbilityBuilder::new();
    builder.can_if(&[Action::Delete], &[SubjectKind::Project], owned_by(me));
    let ability = builder.build();

    // The grant exists, but a bare-kind query can never satisfy it.
    assert!(!ability.can(Action::Delete, SubjectKind::Project));
    assert!(ability.can(Action::Delete, &Subject::from(ProjectSubject::new(uid(2), me))));
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn authorize_twice_yields_identical_decisions() {
    let identity = Identity::new(uid(7), Role::Admin);
    let first = engine().ability_for(&identity);
    let second = engine().ability_for(&identity);

    let owned = Subject::from(OrganizationSubject::new(uid(20), uid(7)));
    let foreign = Subject::from(OrganizationSubject::new(uid(21), uid(8)));

    for action in [
        Action::Manage,
        Action::Create,
        Action::Get,
        Action::Update,
        Action::Delete,
        Action::TransferOwnership,
    ] {
        for kind in [
            SubjectKind::Organization,
            SubjectKind::Project,
            SubjectKind::Invite,
            SubjectKind::Billing,
            SubjectKind::User,
            SubjectKind::All,
        ] {
            assert_eq!(first.can(action, kind), second.can(action, kind));
        }
        assert_eq!(first.can(action, &owned), second.can(action, &owned));
        assert_eq!(first.can(action, &foreign), second.can(action, &foreign));
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn admin_deletes_only_organizations_they_own() {
    let admin = uid(0xa1);
    let ability = engine().ability_for(&Identity::new(admin, Role::Admin));

    let owned = Subject::from(OrganizationSubject::new(uid(30), admin));
    let foreign = Subject::from(OrganizationSubject::new(uid(31), uid(0xbb)));

    assert!(ability.can(Action::Delete, &owned));
    assert!(!ability.can(Action::Delete, &foreign));
}

#[test]
fn admin_transfer_and_update_follow_the_same_gate() {
    let admin = uid(1);
    let ability = engine().ability_for(&Identity::new(admin, Role::Admin));

    let owned = Subject::from(OrganizationSubject::new(uid(40), admin));
    let foreign = Subject::from(OrganizationSubject::new(uid(41), uid(2)));

    assert!(ability.can(Action::TransferOwnership, &owned));
    assert!(ability.can(Action::Update, &owned));
    assert!(!ability.can(Action::TransferOwnership, &foreign));
    assert!(!ability.can(Action::Update, &foreign));
}

#[test]
fn billing_role_never_sees_projects() {
    let ability = engine().ability_for(&Identity::new(uid(0xb1), Role::Billing));

    let project = Subject::from(ProjectSubject::new(uid(50), uid(0xb1)));
    assert!(!ability.can(Action::Get, &project));
    assert!(!ability.can(Action::Get, SubjectKind::Project));

    assert!(ability.can(Action::Get, SubjectKind::Billing));
    assert!(ability.can(Action::Update, SubjectKind::Billing));
}

#[test]
fn member_reads_org_scoped_kinds() {
    let ability = engine().ability_for(&Identity::new(uid(3), Role::Member));

    assert!(ability.can(Action::Get, SubjectKind::Organization));
    assert!(ability.can(Action::Get, SubjectKind::Project));
    assert!(ability.can(Action::Get, SubjectKind::Invite));
    assert!(ability.can(Action::Get, SubjectKind::User));
    assert!(!ability.can(Action::Get, SubjectKind::Billing));
}

#[test]
fn member_cannot_destroy_organizations_even_as_owner() {
    let me = uid(4);
    let ability = engine().ability_for(&Identity::new(me, Role::Member));

    let owned_org = Subject::from(OrganizationSubject::new(uid(60), me));
    assert!(!ability.can(Action::Delete, &owned_org));
    assert!(!ability.can(Action::TransferOwnership, &owned_org));
}

// ============================================================================
// Structural Errors
// ============================================================================

#[test]
fn unknown_role_string_is_a_configuration_error() {
    let err = Role::from_str("OWNER").unwrap_err();
    assert!(matches!(err, PolicyError::UnknownRole(_)));

    for role in Role::ALL {
        assert!(Role::from_str(role.as_str()).is_ok());
    }
}

#[test]
fn subject_construction_validates_records() {
    let good = serde_json::json!({ "id": Uuid::new_v4().to_string() });
    assert!(UserSubject::from_record(&good).is_ok());

    let malformed = serde_json::json!({ "id": "u1" });
    assert!(matches!(
        UserSubject::from_record(&malformed),
        Err(SubjectError::InvalidId { .. })
    ));

    let missing = serde_json::json!({});
    assert_eq!(
        UserSubject::from_record(&missing).unwrap_err(),
        SubjectError::MissingField("id")
    );
}
