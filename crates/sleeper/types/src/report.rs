//! Decision reports: the sole channel from the engine to its collaborators

use crate::{Checkpoint, CompletionReason, VideoId};
use serde::{Deserialize, Serialize};

/// What the engine decided for a record at one checkpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// Snapshot recorded, keep monitoring on schedule
    Continue,
    /// `72h` passed the extension rule, long-term watch begins
    Extend,
    /// Monitoring closed
    Close,
    /// Delayed explosion first detected, long-term watch continues
    DetectExplosionContinue,
    /// Delayed explosion first detected at the final checkpoint
    DetectExplosionClose,
}

impl DecisionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::Continue => "continue",
            DecisionAction::Extend => "extend",
            DecisionAction::Close => "close",
            DecisionAction::DetectExplosionContinue => "detect_explosion_continue",
            DecisionAction::DetectExplosionClose => "detect_explosion_close",
        }
    }

    /// Whether this action leaves the record completed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DecisionAction::Close | DecisionAction::DetectExplosionClose
        )
    }

    pub fn is_explosion(&self) -> bool {
        matches!(
            self,
            DecisionAction::DetectExplosionContinue | DecisionAction::DetectExplosionClose
        )
    }
}

impl std::fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule that produced a decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Short-term checkpoint recorded, no rule applies
    ScheduledCheckpoint,
    HighRetentionLowCtr,
    LowVphGoodRetention,
    EarlySuccess,
    PoorContent,
    AlreadyTraction,
    NoExtensionNoClosureDefault,
    /// Long-term checkpoint recorded without a new explosion
    LongTermWatch,
    DelayedExplosion,
    /// Long-term watch reached `30d`
    ExtendedWatchFinished,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::ScheduledCheckpoint => "scheduled_checkpoint",
            DecisionReason::HighRetentionLowCtr => "high_retention_low_ctr",
            DecisionReason::LowVphGoodRetention => "low_vph_good_retention",
            DecisionReason::EarlySuccess => "early_success",
            DecisionReason::PoorContent => "poor_content",
            DecisionReason::AlreadyTraction => "already_traction",
            DecisionReason::NoExtensionNoClosureDefault => "no_extension_no_closure_default",
            DecisionReason::LongTermWatch => "long_term_watch",
            DecisionReason::DelayedExplosion => "delayed_explosion",
            DecisionReason::ExtendedWatchFinished => "extended_watch_finished",
        }
    }
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Diagnosis ────────────────────────────────────────────────────────

/// Failure pattern read off a single snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Syndrome {
    /// The platform is barely showing the video
    LowReach,
    /// Shown widely but rarely clicked
    LowClickThrough,
    /// Clicked but abandoned early
    ClickbaitMismatch,
    Healthy,
    InsufficientData,
}

impl std::fmt::Display for Syndrome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Syndrome::LowReach => write!(f, "low_reach"),
            Syndrome::LowClickThrough => write!(f, "low_click_through"),
            Syndrome::ClickbaitMismatch => write!(f, "clickbait_mismatch"),
            Syndrome::Healthy => write!(f, "healthy"),
            Syndrome::InsufficientData => write!(f, "insufficient_data"),
        }
    }
}

/// Which part of the packaging the syndrome points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Culprit {
    Title,
    Thumbnail,
    Coherence,
    None,
    Unknown,
}

/// Impression volume band
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reach {
    Unknown,
    Low,
    Normal,
    High,
}

/// Root-cause diagnosis of one snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub syndrome: Syndrome,
    pub culprit: Culprit,
    pub reach: Reach,
    /// What the numbers show, with the values that triggered the case
    pub explanation: String,
    /// Suggested remedy for the channel profile
    pub action: String,
}

// ── Health ───────────────────────────────────────────────────────────

/// Profile-aware health of a video at the moment a snapshot was taken
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Still inside the silence window after publication
    WaitingIndexing,
    /// Past the profile's watch horizon
    Archived,

    // Search channels
    HealthySeoDrip,
    AlertStagnant,
    AlertLowCtrSeo,
    AlertLowRetention,
    MonitoringSeo,

    // Viral channels
    ViralSuccess,
    AlertLowCtrUrgent,
    AlertClickbaitMismatch,
    AlertStagnantViral,
    MonitoringViral,

    // Unclassified channels
    MonitoringOk,
    AlertLowPerformance,
    MonitoringNeutral,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::WaitingIndexing => "waiting_indexing",
            HealthStatus::Archived => "archived",
            HealthStatus::HealthySeoDrip => "healthy_seo_drip",
            HealthStatus::AlertStagnant => "alert_stagnant",
            HealthStatus::AlertLowCtrSeo => "alert_low_ctr_seo",
            HealthStatus::AlertLowRetention => "alert_low_retention",
            HealthStatus::MonitoringSeo => "monitoring_seo",
            HealthStatus::ViralSuccess => "viral_success",
            HealthStatus::AlertLowCtrUrgent => "alert_low_ctr_urgent",
            HealthStatus::AlertClickbaitMismatch => "alert_clickbait_mismatch",
            HealthStatus::AlertStagnantViral => "alert_stagnant_viral",
            HealthStatus::MonitoringViral => "monitoring_viral",
            HealthStatus::MonitoringOk => "monitoring_ok",
            HealthStatus::AlertLowPerformance => "alert_low_performance",
            HealthStatus::MonitoringNeutral => "monitoring_neutral",
        }
    }

    /// Whether the status asks for operator attention.
    pub fn is_alert(&self) -> bool {
        self.as_str().starts_with("alert_")
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently a health status should be looked at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Info,
    Success,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Info => write!(f, "info"),
            Priority::Success => write!(f, "success"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Health status with its priority and a one-line message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub priority: Priority,
    pub message: String,
}

// ── Report ───────────────────────────────────────────────────────────

/// Result of evaluating one snapshot against a record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub video_id: VideoId,
    pub checkpoint: Checkpoint,
    pub action: DecisionAction,
    pub reason: DecisionReason,
    /// Record flag after this evaluation (set-once)
    pub explosion_detected: bool,
    /// CTR growth over the `72h` baseline, one decimal; `None` when not
    /// applicable or the baseline CTR is zero
    pub growth_percent: Option<f64>,
    /// VPH growth over the `72h` baseline, informational only
    pub vph_growth_percent: Option<f64>,
    pub next_checkpoint: Option<Checkpoint>,
    pub long_term_reason: Option<String>,
    pub completion_reason: Option<CompletionReason>,
    pub diagnosis: Diagnosis,
    pub health: HealthCheck,
}
