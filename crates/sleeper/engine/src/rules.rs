//! Classification rules: pure predicates over one or two snapshots
//!
//! The `72h` decision is an ordered rule table. Rules are tried in
//! declaration order and the first match wins, so both extension rules
//! take precedence over every close rule. A snapshot that matches nothing
//! falls through to a default close.

use crate::config::RuleThresholds;
use sleeper_types::{reaches_explosion, DecisionReason, MetricSnapshot};

/// Outcome of the `72h` decision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Extend,
    Close,
}

/// One row of the `72h` rule table
pub struct ClassificationRule {
    pub reason: DecisionReason,
    pub verdict: Verdict,
    predicate: fn(&MetricSnapshot, &RuleThresholds) -> bool,
}

impl ClassificationRule {
    pub fn matches(&self, snapshot: &MetricSnapshot, thresholds: &RuleThresholds) -> bool {
        (self.predicate)(snapshot, thresholds)
    }
}

impl std::fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("reason", &self.reason)
            .field("verdict", &self.verdict)
            .finish()
    }
}

/// The `72h` rule table, in precedence order.
pub static DECISION_RULES: [ClassificationRule; 5] = [
    ClassificationRule {
        reason: DecisionReason::HighRetentionLowCtr,
        verdict: Verdict::Extend,
        predicate: high_retention_low_ctr,
    },
    ClassificationRule {
        reason: DecisionReason::LowVphGoodRetention,
        verdict: Verdict::Extend,
        predicate: low_vph_good_retention,
    },
    ClassificationRule {
        reason: DecisionReason::EarlySuccess,
        verdict: Verdict::Close,
        predicate: early_success,
    },
    ClassificationRule {
        reason: DecisionReason::PoorContent,
        verdict: Verdict::Close,
        predicate: poor_content,
    },
    ClassificationRule {
        reason: DecisionReason::AlreadyTraction,
        verdict: Verdict::Close,
        predicate: already_traction,
    },
];

fn high_retention_low_ctr(s: &MetricSnapshot, t: &RuleThresholds) -> bool {
    s.retention >= t.extend_min_retention && s.ctr < t.extend_max_ctr
}

fn low_vph_good_retention(s: &MetricSnapshot, t: &RuleThresholds) -> bool {
    s.vph < t.low_vph && s.retention >= t.good_retention
}

fn early_success(s: &MetricSnapshot, t: &RuleThresholds) -> bool {
    s.ctr >= t.early_success_ctr
}

fn poor_content(s: &MetricSnapshot, t: &RuleThresholds) -> bool {
    s.retention < t.poor_content_retention
}

fn already_traction(s: &MetricSnapshot, t: &RuleThresholds) -> bool {
    s.vph >= t.traction_vph
}

/// Result of the `72h` decision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub reason: DecisionReason,
}

/// Run the `72h` rule table against a snapshot.
pub fn classify_decision(snapshot: &MetricSnapshot, thresholds: &RuleThresholds) -> Classification {
    DECISION_RULES
        .iter()
        .find(|rule| rule.matches(snapshot, thresholds))
        .map(|rule| Classification {
            verdict: rule.verdict,
            reason: rule.reason,
        })
        .unwrap_or(Classification {
            verdict: Verdict::Close,
            reason: DecisionReason::NoExtensionNoClosureDefault,
        })
}

/// Human-readable long-term reason, e.g. `high_retention_65.2%_low_ctr_3.8%`.
///
/// Extension rules format their deciding metrics; any other reason falls
/// back to its plain name.
pub fn long_term_reason(reason: DecisionReason, snapshot: &MetricSnapshot) -> String {
    match reason {
        DecisionReason::HighRetentionLowCtr => format!(
            "high_retention_{:.1}%_low_ctr_{:.1}%",
            snapshot.retention * 100.0,
            snapshot.ctr * 100.0
        ),
        DecisionReason::LowVphGoodRetention => format!(
            "low_vph_{:.0}_good_retention_{:.1}%",
            snapshot.vph,
            snapshot.retention * 100.0
        ),
        other => other.as_str().to_string(),
    }
}

// ── Explosion ────────────────────────────────────────────────────────

/// Result of comparing a long-term snapshot against the `72h` baseline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplosionCheck {
    /// CTR reached the explosion multiple of the baseline
    pub fired: bool,
    /// `None` when the baseline CTR is zero
    pub growth_percent: Option<f64>,
    /// `None` when the baseline VPH is zero
    pub vph_growth_percent: Option<f64>,
}

/// Compare a long-term snapshot with the `72h` baseline.
///
/// A zero baseline CTR makes the ratio undefined: the check is skipped and
/// growth is reported as `None`.
pub fn check_explosion(
    baseline: &MetricSnapshot,
    current: &MetricSnapshot,
    thresholds: &RuleThresholds,
) -> ExplosionCheck {
    let fired = reaches_explosion(baseline.ctr, current.ctr, thresholds.explosion_multiplier);

    ExplosionCheck {
        fired,
        growth_percent: growth_percent(baseline.ctr, current.ctr),
        vph_growth_percent: growth_percent(baseline.vph, current.vph),
    }
}

/// `(current / base - 1) × 100`, rounded to one decimal; `None` on a zero base.
pub fn growth_percent(base: f64, current: f64) -> Option<f64> {
    if base <= 0.0 {
        return None;
    }
    Some(round1((current / base - 1.0) * 100.0))
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
