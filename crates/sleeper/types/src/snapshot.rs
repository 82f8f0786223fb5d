//! Metric snapshots observed at a single checkpoint.

use crate::Checkpoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metrics observed for a video at one checkpoint. Immutable once recorded.
///
/// `ctr` and `retention` are fractions (`0.042` is 4.2%). `vph` is views
/// per hour. `views` and `impressions` are optional and only feed the
/// root-cause diagnosis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    #[serde(rename = "checkpoint_id")]
    pub checkpoint: Checkpoint,
    pub captured_at: DateTime<Utc>,
    pub ctr: f64,
    pub vph: f64,
    pub retention: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impressions: Option<u64>,
}

impl MetricSnapshot {
    pub fn new(
        checkpoint: Checkpoint,
        captured_at: DateTime<Utc>,
        ctr: f64,
        vph: f64,
        retention: f64,
    ) -> Self {
        Self {
            checkpoint,
            captured_at,
            ctr,
            vph,
            retention,
            views: None,
            impressions: None,
        }
    }

    pub fn with_views(mut self, views: u64) -> Self {
        self.views = Some(views);
        self
    }

    pub fn with_impressions(mut self, impressions: u64) -> Self {
        self.impressions = Some(impressions);
        self
    }

    /// Check the input contract: finite non-negative `ctr` and `vph`,
    /// `retention` in `[0, 1]`.
    pub fn validate(&self) -> Result<(), String> {
        if !self.ctr.is_finite() || self.ctr < 0.0 {
            return Err(format!("ctr must be a non-negative number, got {}", self.ctr));
        }
        if !self.vph.is_finite() || self.vph < 0.0 {
            return Err(format!("vph must be a non-negative number, got {}", self.vph));
        }
        if !self.retention.is_finite() || !(0.0..=1.0).contains(&self.retention) {
            return Err(format!(
                "retention must be a fraction in [0, 1], got {}",
                self.retention
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(ctr: f64, vph: f64, retention: f64) -> MetricSnapshot {
        MetricSnapshot::new(Checkpoint::H24, Utc::now(), ctr, vph, retention)
    }

    #[test]
    fn test_validate_accepts_contract_values() {
        assert!(snapshot(0.0, 0.0, 0.0).validate().is_ok());
        assert!(snapshot(0.12, 340.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_contract() {
        assert!(snapshot(-0.01, 10.0, 0.5).validate().is_err());
        assert!(snapshot(0.05, -1.0, 0.5).validate().is_err());
        assert!(snapshot(0.05, 10.0, 1.2).validate().is_err());
        assert!(snapshot(f64::NAN, 10.0, 0.5).validate().is_err());
        assert!(snapshot(0.05, f64::INFINITY, 0.5).validate().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let snap = snapshot(0.05, 12.0, 0.4).with_impressions(900);
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["checkpoint_id"], "24h");
        assert_eq!(value["impressions"], 900);
        assert!(value.get("views").is_none());

        let back: MetricSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snap);
    }
}
