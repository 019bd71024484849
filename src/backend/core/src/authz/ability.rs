//! Rules, the rule builder, and the ability decision algorithm.
//!
//! An [`Ability`] is the immutable, ordered rule list built for one identity.
//! Its decision function scans the rules in reverse declaration order and
//! returns the effect of the first match; if nothing matches, the decision is
//! deny. Declaration order is therefore the precedence order: a role states
//! broad grants first and carves out narrower exceptions afterwards.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::subject::{Subject, SubjectKind};

// ═══════════════════════════════════════════════════════════════════════════════
// Actions
// ═══════════════════════════════════════════════════════════════════════════════

/// An operation name. `Manage` is the wildcard and matches any action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Manage,
    Create,
    Get,
    Update,
    Delete,
    TransferOwnership,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manage => "manage",
            Self::Create => "create",
            Self::Get => "get",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::TransferOwnership => "transfer_ownership",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rules
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether a matching rule grants or forbids the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

/// An instance-level predicate narrowing when a rule applies.
///
/// Conditions close over the identity they were declared for, so ownership
/// checks compare against the acting user without threading the identity
/// through the decision call.
pub type Condition = Arc<dyn Fn(&Subject) -> bool + Send + Sync>;

/// A condition matching subjects owned by the given user.
pub fn owned_by(user_id: Uuid) -> Condition {
    Arc::new(move |subject| subject.owner_id() == Some(user_id))
}

/// One declared rule: an effect, the actions and subject kinds it covers, and
/// an optional instance-level condition.
#[derive(Clone)]
pub struct Rule {
    effect: Effect,
    actions: Vec<Action>,
    subjects: Vec<SubjectKind>,
    condition: Option<Condition>,
}

impl Rule {
    pub fn effect(&self) -> Effect {
        self.effect
    }

    fn covers_action(&self, action: Action) -> bool {
        self.actions
            .iter()
            .any(|a| *a == Action::Manage || *a == action)
    }

    fn covers_subject(&self, kind: SubjectKind) -> bool {
        self.subjects
            .iter()
            .any(|s| *s == SubjectKind::All || *s == kind)
    }

    /// Whether this rule applies to the given action and target.
    ///
    /// A condition-bearing rule only ever matches a concrete instance; a
    /// bare-kind query cannot satisfy an instance-level predicate.
    fn matches(&self, action: Action, target: Target<'_>) -> bool {
        if !self.covers_action(action) || !self.covers_subject(target.kind()) {
            return false;
        }

        match (&self.condition, target) {
            (None, _) => true,
            (Some(_), Target::Kind(_)) => false,
            (Some(condition), Target::Instance(subject)) => condition(subject),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("effect", &self.effect)
            .field("actions", &self.actions)
            .field("subjects", &self.subjects)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Decision Targets
// ═══════════════════════════════════════════════════════════════════════════════

/// What a decision is asked about: a concrete instance, or a bare subject kind
/// for coarse-grained checks that cannot depend on instance-level conditions.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Kind(SubjectKind),
    Instance(&'a Subject),
}

impl Target<'_> {
    fn kind(&self) -> SubjectKind {
        match self {
            Self::Kind(kind) => *kind,
            Self::Instance(subject) => subject.kind(),
        }
    }
}

impl From<SubjectKind> for Target<'static> {
    fn from(kind: SubjectKind) -> Self {
        Self::Kind(kind)
    }
}

impl<'a> From<&'a Subject> for Target<'a> {
    fn from(subject: &'a Subject) -> Self {
        Self::Instance(subject)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Accumulates grant and deny rules for one identity, in declaration order.
///
/// The builder owns the growing rule list; `build` hands out the finalized,
/// immutable [`Ability`] and nothing else ever aliases the mutable sequence.
#[derive(Default)]
pub struct AbilityBuilder {
    rules: Vec<Rule>,
}

impl AbilityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a grant covering the given actions and subject kinds.
    pub fn can(&mut self, actions: &[Action], subjects: &[SubjectKind]) {
        self.push(Effect::Allow, actions, subjects, None);
    }

    /// Declare a grant that applies only when `condition` holds for the
    /// concrete subject instance.
    pub fn can_if(&mut self, actions: &[Action], subjects: &[SubjectKind], condition: Condition) {
        self.push(Effect::Allow, actions, subjects, Some(condition));
    }

    /// Declare a denial covering the given actions and subject kinds.
    pub fn cannot(&mut self, actions: &[Action], subjects: &[SubjectKind]) {
        self.push(Effect::Deny, actions, subjects, None);
    }

    /// Declare a denial that applies only when `condition` holds for the
    /// concrete subject instance.
    pub fn cannot_if(
        &mut self,
        actions: &[Action],
        subjects: &[SubjectKind],
        condition: Condition,
    ) {
        self.push(Effect::Deny, actions, subjects, Some(condition));
    }

    fn push(
        &mut self,
        effect: Effect,
        actions: &[Action],
        subjects: &[SubjectKind],
        condition: Option<Condition>,
    ) {
        self.rules.push(Rule {
            effect,
            actions: actions.to_vec(),
            subjects: subjects.to_vec(),
            condition,
        });
    }

    /// Finalize into an immutable [`Ability`].
    pub fn build(self) -> Ability {
        Ability { rules: self.rules }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Ability
// ═══════════════════════════════════════════════════════════════════════════════

/// The finalized rule list for one identity, exposing the decision function.
#[derive(Debug, Clone)]
pub struct Ability {
    rules: Vec<Rule>,
}

impl Ability {
    /// Decide whether `action` is permitted on `target`.
    ///
    /// Rules are scanned in reverse declaration order and the first matching
    /// rule's effect wins; with no match the decision is deny.
    pub fn can<'a>(&self, action: Action, target: impl Into<Target<'a>>) -> bool {
        let target = target.into();

        for rule in self.rules.iter().rev() {
            if rule.matches(action, target) {
                let allowed = rule.effect == Effect::Allow;
                debug!(
                    action = %action,
                    subject = %target.kind(),
                    effect = ?rule.effect,
                    "Authorization rule matched"
                );
                record_decision(allowed);
                return allowed;
            }
        }

        debug!(
            action = %action,
            subject = %target.kind(),
            "No authorization rule matched, denying"
        );
        record_decision(false);
        false
    }

    /// The negation of [`Ability::can`]; there is exactly one decision.
    pub fn cannot<'a>(&self, action: Action, target: impl Into<Target<'a>>) -> bool {
        !self.can(action, target)
    }

    /// The declared rules, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

fn record_decision(allowed: bool) {
    counter!(
        "lattice_authz_decisions_total",
        "effect" => if allowed { "allow" } else { "deny" }
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
