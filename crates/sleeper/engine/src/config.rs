//! Monitoring configuration.
//!
//! Defines rule thresholds, diagnosis thresholds and checkpoint ordering.
//! Defaults reproduce the production policy; every field can be overridden
//! from a config file.

use serde::{Deserialize, Serialize};
use sleeper_types::{MonitorError, MonitorResult, DEFAULT_EXPLOSION_MULTIPLIER};

/// Configuration for the decision engine.
///
/// When deserialized, a missing `[diagnosis]` table takes the values of
/// `profile`, and a partial one overlays them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMonitorConfig")]
pub struct MonitorConfig {
    /// Channel profile: tunes `diagnosis` and words the remedies.
    pub profile: ChannelProfile,

    /// Thresholds for the extension and explosion rules.
    pub thresholds: RuleThresholds,

    /// Thresholds for root-cause diagnosis and health checks.
    pub diagnosis: DiagnosisThresholds,

    /// How strictly checkpoint order is enforced.
    pub ordering: CheckpointOrdering,
}

/// On-disk shape of [`MonitorConfig`]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMonitorConfig {
    profile: ChannelProfile,
    thresholds: RuleThresholds,
    diagnosis: DiagnosisOverrides,
    ordering: CheckpointOrdering,
}

impl From<RawMonitorConfig> for MonitorConfig {
    fn from(raw: RawMonitorConfig) -> Self {
        Self {
            profile: raw.profile,
            thresholds: raw.thresholds,
            diagnosis: raw
                .diagnosis
                .apply(DiagnosisThresholds::for_profile(raw.profile)),
            ordering: raw.ordering,
        }
    }
}

impl MonitorConfig {
    /// Create config tuned for a channel profile.
    pub fn for_profile(profile: ChannelProfile) -> Self {
        Self {
            profile,
            diagnosis: DiagnosisThresholds::for_profile(profile),
            ..Self::default()
        }
    }

    /// Reject thresholds that would make the rules meaningless.
    pub fn validate(&self) -> MonitorResult<()> {
        self.thresholds.validate()?;
        self.diagnosis.validate()
    }
}

/// Audience model of the channel a video belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelProfile {
    /// Search-driven: slow, steady discovery
    Search,
    /// Feed-driven: immediate impact or nothing
    Viral,
    /// Unclassified channel
    #[default]
    Generic,
}

impl std::fmt::Display for ChannelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelProfile::Search => write!(f, "search"),
            ChannelProfile::Viral => write!(f, "viral"),
            ChannelProfile::Generic => write!(f, "generic"),
        }
    }
}

/// How checkpoint arrival order is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointOrdering {
    /// Every snapshot must be for the next scheduled checkpoint.
    #[default]
    Strict,
    /// Forward skips are accepted (a missed run); backward arrivals are not.
    AllowGaps,
}

/// Thresholds for the `72h` extension rule and the explosion rule.
///
/// CTR and retention are fractions; VPH is views per hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Minimum retention for the high-retention / low-CTR extension.
    pub extend_min_retention: f64,

    /// CTR must stay below this for the high-retention / low-CTR extension.
    pub extend_max_ctr: f64,

    /// VPH must stay below this for the low-VPH / good-retention extension.
    pub low_vph: f64,

    /// Minimum retention for the low-VPH / good-retention extension.
    pub good_retention: f64,

    /// CTR at or above this closes as an early success.
    pub early_success_ctr: f64,

    /// Retention below this closes as poor content.
    pub poor_content_retention: f64,

    /// VPH at or above this closes as already having traction.
    pub traction_vph: f64,

    /// Multiple of the `72h` CTR that counts as a delayed explosion.
    pub explosion_multiplier: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            extend_min_retention: 0.50,
            extend_max_ctr: 0.08,
            low_vph: 20.0,
            good_retention: 0.45,
            early_success_ctr: 0.08,
            poor_content_retention: 0.45,
            traction_vph: 50.0,
            explosion_multiplier: DEFAULT_EXPLOSION_MULTIPLIER,
        }
    }
}

impl RuleThresholds {
    pub fn validate(&self) -> MonitorResult<()> {
        let fractions = [
            ("extend_min_retention", self.extend_min_retention),
            ("extend_max_ctr", self.extend_max_ctr),
            ("good_retention", self.good_retention),
            ("early_success_ctr", self.early_success_ctr),
            ("poor_content_retention", self.poor_content_retention),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(MonitorError::Configuration(format!(
                    "{} must be a fraction in [0, 1], got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [("low_vph", self.low_vph), ("traction_vph", self.traction_vph)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MonitorError::Configuration(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if !self.explosion_multiplier.is_finite() || self.explosion_multiplier <= 1.0 {
            return Err(MonitorError::Configuration(format!(
                "explosion_multiplier must be greater than 1.0, got {}",
                self.explosion_multiplier
            )));
        }
        Ok(())
    }
}

/// Thresholds for root-cause diagnosis and the health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisThresholds {
    /// Minimum acceptable CTR (fraction).
    pub min_ctr: f64,

    /// Minimum acceptable retention (fraction).
    pub min_retention: f64,

    /// Impressions below this are low reach.
    pub impressions_low: u64,

    /// Impressions at or above this are high reach.
    pub impressions_normal: u64,

    /// No health alerts before this many hours online.
    pub silence_hours: f64,

    /// Health checks report `archived` past this many hours online.
    pub archive_after_hours: f64,

    /// VPH at or above this is healthy.
    pub healthy_vph: f64,

    /// VPH below this is stagnant.
    pub stagnant_vph: f64,
}

impl Default for DiagnosisThresholds {
    fn default() -> Self {
        Self::for_profile(ChannelProfile::Generic)
    }
}

impl DiagnosisThresholds {
    pub fn for_profile(profile: ChannelProfile) -> Self {
        match profile {
            // Search discovery is slow; judge on smaller volumes
            ChannelProfile::Search => Self {
                min_ctr: 0.035,
                min_retention: 0.35,
                impressions_low: 500,
                impressions_normal: 2_000,
                silence_hours: 12.0,
                archive_after_hours: 168.0,
                healthy_vph: 5.0,
                stagnant_vph: 2.0,
            },
            ChannelProfile::Viral => Self {
                min_ctr: 0.04,
                min_retention: 0.40,
                impressions_low: 1_000,
                impressions_normal: 5_000,
                silence_hours: 3.0,
                archive_after_hours: 24.0,
                healthy_vph: 20.0,
                stagnant_vph: 10.0,
            },
            // Search windows, coarser velocity bands
            ChannelProfile::Generic => Self {
                healthy_vph: 20.0,
                stagnant_vph: 10.0,
                ..Self::for_profile(ChannelProfile::Search)
            },
        }
    }

    pub fn validate(&self) -> MonitorResult<()> {
        if !(0.0..=1.0).contains(&self.min_ctr) || !(0.0..=1.0).contains(&self.min_retention) {
            return Err(MonitorError::Configuration(
                "diagnosis min_ctr and min_retention must be fractions in [0, 1]".into(),
            ));
        }
        if self.impressions_low > self.impressions_normal {
            return Err(MonitorError::Configuration(format!(
                "impressions_low ({}) exceeds impressions_normal ({})",
                self.impressions_low, self.impressions_normal
            )));
        }
        for (name, value) in [
            ("silence_hours", self.silence_hours),
            ("archive_after_hours", self.archive_after_hours),
            ("healthy_vph", self.healthy_vph),
            ("stagnant_vph", self.stagnant_vph),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MonitorError::Configuration(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if self.silence_hours > self.archive_after_hours {
            return Err(MonitorError::Configuration(format!(
                "silence_hours ({}) exceeds archive_after_hours ({})",
                self.silence_hours, self.archive_after_hours
            )));
        }
        if self.stagnant_vph > self.healthy_vph {
            return Err(MonitorError::Configuration(format!(
                "stagnant_vph ({}) exceeds healthy_vph ({})",
                self.stagnant_vph, self.healthy_vph
            )));
        }
        Ok(())
    }
}

/// Fields of a `[diagnosis]` table actually present in a file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DiagnosisOverrides {
    min_ctr: Option<f64>,
    min_retention: Option<f64>,
    impressions_low: Option<u64>,
    impressions_normal: Option<u64>,
    silence_hours: Option<f64>,
    archive_after_hours: Option<f64>,
    healthy_vph: Option<f64>,
    stagnant_vph: Option<f64>,
}

impl DiagnosisOverrides {
    fn apply(self, base: DiagnosisThresholds) -> DiagnosisThresholds {
        DiagnosisThresholds {
            min_ctr: self.min_ctr.unwrap_or(base.min_ctr),
            min_retention: self.min_retention.unwrap_or(base.min_retention),
            impressions_low: self.impressions_low.unwrap_or(base.impressions_low),
            impressions_normal: self.impressions_normal.unwrap_or(base.impressions_normal),
            silence_hours: self.silence_hours.unwrap_or(base.silence_hours),
            archive_after_hours: self.archive_after_hours.unwrap_or(base.archive_after_hours),
            healthy_vph: self.healthy_vph.unwrap_or(base.healthy_vph),
            stagnant_vph: self.stagnant_vph.unwrap_or(base.stagnant_vph),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ordering, CheckpointOrdering::Strict);
        assert_eq!(config.thresholds.explosion_multiplier, 1.5);
    }

    #[test]
    fn test_for_profile_tunes_diagnosis_only() {
        let viral = MonitorConfig::for_profile(ChannelProfile::Viral);
        assert_eq!(viral.diagnosis.impressions_low, 1_000);
        assert_eq!(viral.thresholds, RuleThresholds::default());

        let search = MonitorConfig::for_profile(ChannelProfile::Search);
        assert_eq!(search.diagnosis.min_ctr, 0.035);
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        let mut config = MonitorConfig::default();
        config.thresholds.explosion_multiplier = 1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MonitorError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_inverted_impression_bands() {
        let mut config = MonitorConfig::default();
        config.diagnosis.impressions_low = 10_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            ordering = "allow_gaps"

            [thresholds]
            traction_vph = 75.0
            "#,
        )
        .unwrap();
        assert_eq!(config.ordering, CheckpointOrdering::AllowGaps);
        assert_eq!(config.thresholds.traction_vph, 75.0);
        assert_eq!(config.thresholds.low_vph, 20.0);
        assert_eq!(config.profile, ChannelProfile::Generic);
        assert_eq!(config.diagnosis, DiagnosisThresholds::default());
    }

    #[test]
    fn test_profile_in_file_retunes_diagnosis() {
        let config: MonitorConfig = toml::from_str(r#"profile = "viral""#).unwrap();
        assert_eq!(config, MonitorConfig::for_profile(ChannelProfile::Viral));
        assert_eq!(config.diagnosis.impressions_low, 1_000);
        assert_eq!(config.diagnosis.archive_after_hours, 24.0);
    }

    #[test]
    fn test_partial_diagnosis_table_overlays_profile() {
        let config: MonitorConfig = toml::from_str(
            r#"
            profile = "viral"

            [diagnosis]
            min_ctr = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(config.diagnosis.min_ctr, 0.05);
        assert_eq!(config.diagnosis.impressions_normal, 5_000);
        assert_eq!(config.diagnosis.healthy_vph, 20.0);
    }

    #[test]
    fn test_serialized_config_reloads_unchanged() {
        let mut config = MonitorConfig::for_profile(ChannelProfile::Search);
        config.diagnosis.stagnant_vph = 3.0;
        let text = toml::to_string(&config).unwrap();
        let back: MonitorConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_generic_profile_keeps_search_windows() {
        let generic = DiagnosisThresholds::for_profile(ChannelProfile::Generic);
        let search = DiagnosisThresholds::for_profile(ChannelProfile::Search);
        assert_eq!(generic.min_ctr, search.min_ctr);
        assert_eq!(generic.silence_hours, 12.0);
        assert_eq!(generic.healthy_vph, 20.0);
        assert_eq!(generic.stagnant_vph, 10.0);
    }

    #[test]
    fn test_validate_rejects_inverted_velocity_bands() {
        let mut config = MonitorConfig::default();
        config.diagnosis.stagnant_vph = 30.0;
        assert!(config.validate().is_err());
    }
}
