//! Authorization decision: resolved tier + an application's rules -> verdict.
//!
//! The policy is monotonic "at least": a rule applies to every tier ranked at
//! or above its minimum. Allow rules form a union (most permissive wins); a
//! matching deny rule overrides them all. No rules, or no active membership,
//! means deny.

use serde::Serialize;

use crate::{AccessEffect, AccessRule, AppKey, Tier, TierKey};

/// Why a verdict came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    /// The caller has no active membership (or is unknown).
    NoActiveMembership,
    /// The application has no rules at all; closed by default.
    NoRules,
    /// An allow rule with this minimum tier matched.
    Allowed { rule_tier: TierKey },
    /// A deny rule with this minimum tier matched.
    Denied { rule_tier: TierKey },
    /// The caller ranks below the lowest allow rule.
    BelowMinimum { required: TierKey, required_rank: i32 },
    /// Only deny rules exist and none matched; nothing grants access.
    NoAllowRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub granted: bool,
    pub reason: DecisionReason,
}

impl AccessDecision {
    fn allow(reason: DecisionReason) -> Self {
        Self { granted: true, reason }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self { granted: false, reason }
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }
}

/// Decide whether a caller at `tier` may enter an application with `rules`.
///
/// - No IO
/// - No panics
/// - Same inputs, same verdict
pub fn evaluate(tier: Option<&Tier>, rules: &[AccessRule]) -> AccessDecision {
    let Some(tier) = tier else {
        return AccessDecision::deny(DecisionReason::NoActiveMembership);
    };

    if rules.is_empty() {
        return AccessDecision::deny(DecisionReason::NoRules);
    }

    if let Some(deny) = rules
        .iter()
        .find(|r| r.effect == AccessEffect::Deny && r.matches(tier))
    {
        return AccessDecision::deny(DecisionReason::Denied {
            rule_tier: deny.minimum_tier.key.clone(),
        });
    }

    let lowest_allow = rules
        .iter()
        .filter(|r| r.effect == AccessEffect::Allow)
        .min_by_key(|r| r.minimum_tier.rank);

    match lowest_allow {
        Some(rule) if rule.matches(tier) => AccessDecision::allow(DecisionReason::Allowed {
            rule_tier: rule.minimum_tier.key.clone(),
        }),
        Some(rule) => AccessDecision::deny(DecisionReason::BelowMinimum {
            required: rule.minimum_tier.key.clone(),
            required_rank: rule.minimum_tier.rank,
        }),
        None => AccessDecision::deny(DecisionReason::NoAllowRule),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed, serialisable account of a single access decision.
///
/// Answers "why was I let in / kept out of this application?".
#[derive(Debug, Clone, Serialize)]
pub struct AccessExplanation {
    pub app: AppKey,
    pub granted: bool,

    /// Human-readable summary of the decision.
    pub reason: String,

    pub decision: DecisionReason,

    /// The caller's highest active tier, if any.
    pub caller_tier: Option<Tier>,

    /// Every rule of the application and whether it applied to the caller.
    pub rules: Vec<RuleOutcome>,

    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleOutcome {
    pub effect: AccessEffect,
    pub minimum_tier: TierKey,
    pub minimum_rank: i32,
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NoActiveMembership,
    NoRules,
    ExplicitDeny,
    TierTooLow,
}

const UPGRADE_HINT: &str =
    "Contact the Alliances team to discuss upgrading your membership tier";

/// Explain the decision `evaluate` makes for the same inputs.
pub fn explain(app: &AppKey, tier: Option<&Tier>, rules: &[AccessRule]) -> AccessExplanation {
    let decision = evaluate(tier, rules);

    let outcomes = rules
        .iter()
        .map(|r| RuleOutcome {
            effect: r.effect,
            minimum_tier: r.minimum_tier.key.clone(),
            minimum_rank: r.minimum_tier.rank,
            matched: tier.is_some_and(|t| r.matches(t)),
        })
        .collect();

    let tier_label = tier.map(|t| t.label.as_str()).unwrap_or("none");

    let (reason, denial_reason) = match &decision.reason {
        DecisionReason::Allowed { rule_tier } => (
            format!("{tier_label} satisfies the {rule_tier}+ rule for {app}"),
            None,
        ),
        DecisionReason::NoActiveMembership => (
            format!("No active membership; {app} requires one"),
            Some(DenialReason {
                kind: DenialKind::NoActiveMembership,
                message: "The caller holds no active membership".to_string(),
                suggestions: vec![
                    "Check that the membership is marked active".to_string(),
                    UPGRADE_HINT.to_string(),
                ],
            }),
        ),
        DecisionReason::NoRules => (
            format!("{app} has no access rules and is closed to everyone"),
            Some(DenialReason {
                kind: DenialKind::NoRules,
                message: "Applications without rules deny all access".to_string(),
                suggestions: vec![format!("Configure an ALLOW rule for {app}")],
            }),
        ),
        DecisionReason::Denied { rule_tier } => (
            format!("A DENY rule for {rule_tier}+ matched {tier_label}"),
            Some(DenialReason {
                kind: DenialKind::ExplicitDeny,
                message: format!("Tier {tier_label} is explicitly denied"),
                suggestions: vec![format!("Review the DENY rules configured for {app}")],
            }),
        ),
        DecisionReason::BelowMinimum { required, .. } => {
            let required_label = rules
                .iter()
                .find(|r| &r.minimum_tier.key == required)
                .map(|r| r.minimum_tier.label.clone())
                .unwrap_or_else(|| required.to_string());
            (
                format!("{tier_label} ranks below the {required}+ rule for {app}"),
                Some(DenialReason {
                    kind: DenialKind::TierTooLow,
                    message: format!("{app} requires {required_label} or above"),
                    suggestions: vec![
                        format!("Upgrade to {required_label} or above"),
                        UPGRADE_HINT.to_string(),
                    ],
                }),
            )
        }
        DecisionReason::NoAllowRule => (
            format!("{app} has no ALLOW rule"),
            Some(DenialReason {
                kind: DenialKind::NoRules,
                message: "Only DENY rules are configured".to_string(),
                suggestions: vec![format!("Configure an ALLOW rule for {app}")],
            }),
        ),
    };

    AccessExplanation {
        app: app.clone(),
        granted: decision.granted,
        reason,
        decision: decision.reason,
        caller_tier: tier.cloned(),
        rules: outcomes,
        denial_reason,
    }
}
