//! Root-cause diagnosis of a single snapshot.
//!
//! Reads which part of a video's packaging is failing (title, thumbnail,
//! or the match between promise and content). Diagnosis is advisory: it
//! rides along in every report and never drives a state transition.

use crate::config::{ChannelProfile, DiagnosisThresholds};
use sleeper_types::{Culprit, Diagnosis, MetricSnapshot, Reach, Syndrome};

/// Classify impression volume.
pub fn reach(impressions: Option<u64>, thresholds: &DiagnosisThresholds) -> Reach {
    match impressions {
        None => Reach::Unknown,
        Some(n) if n < thresholds.impressions_low => Reach::Low,
        Some(n) if n < thresholds.impressions_normal => Reach::Normal,
        Some(_) => Reach::High,
    }
}

/// Diagnose a snapshot. Cases are checked in a fixed order; the first match wins.
pub fn diagnose(
    snapshot: &MetricSnapshot,
    thresholds: &DiagnosisThresholds,
    profile: ChannelProfile,
) -> Diagnosis {
    let reach = reach(snapshot.impressions, thresholds);
    let impressions = snapshot.impressions.unwrap_or_default();
    let ctr = snapshot.ctr * 100.0;
    let retention = snapshot.retention * 100.0;
    let min_ctr = thresholds.min_ctr * 100.0;
    let min_retention = thresholds.min_retention * 100.0;
    let ctr_ok = snapshot.ctr >= thresholds.min_ctr;

    let (syndrome, culprit, explanation) = if reach == Reach::Low {
        (
            Syndrome::LowReach,
            Culprit::Title,
            format!(
                "The platform is barely showing the video ({} impressions < {})",
                impressions, thresholds.impressions_low
            ),
        )
    } else if reach == Reach::High && !ctr_ok {
        (
            Syndrome::LowClickThrough,
            Culprit::Thumbnail,
            format!(
                "Shown widely ({} impressions) but rarely clicked (CTR {:.1}% < {:.1}%)",
                impressions, ctr, min_ctr
            ),
        )
    } else if ctr_ok && snapshot.retention < thresholds.min_retention {
        (
            Syndrome::ClickbaitMismatch,
            Culprit::Coherence,
            format!(
                "Clicked (CTR {:.1}%) but abandoned early (retention {:.1}% < {:.1}%): \
                 the opening does not deliver what the packaging promised",
                ctr, retention, min_retention
            ),
        )
    } else if ctr_ok {
        (
            Syndrome::Healthy,
            Culprit::None,
            format!(
                "CTR {:.1}% (>= {:.1}%), retention {:.1}% (>= {:.1}%)",
                ctr, min_ctr, retention, min_retention
            ),
        )
    } else {
        (
            Syndrome::InsufficientData,
            Culprit::Unknown,
            "Not enough signal for a diagnosis yet".to_string(),
        )
    };

    Diagnosis {
        syndrome,
        culprit,
        reach,
        explanation,
        action: remedy(syndrome, profile).to_string(),
    }
}

fn remedy(syndrome: Syndrome, profile: ChannelProfile) -> &'static str {
    match (syndrome, profile) {
        (Syndrome::LowReach, ChannelProfile::Search) => {
            "Rewrite the title around the exact terms people search for: product, version, error code."
        }
        (Syndrome::LowReach, ChannelProfile::Viral) => {
            "Rewrite the title with a sharper angle: a specific pain plus a clear promise."
        }
        (Syndrome::LowReach, ChannelProfile::Generic) => {
            "Improve the title with more specific keywords for the audience."
        }
        (Syndrome::LowClickThrough, ChannelProfile::Search) => {
            "Keep the title. Simplify the thumbnail: three words at most, zoom on the result, high contrast."
        }
        (Syndrome::LowClickThrough, ChannelProfile::Viral) => {
            "Keep the title. Redesign the thumbnail with a stronger expression and brutal contrast."
        }
        (Syndrome::LowClickThrough, ChannelProfile::Generic) => {
            "Keep the title. Redesign the thumbnail with more contrast and less clutter."
        }
        (Syndrome::ClickbaitMismatch, _) => {
            "Keep title and thumbnail. Deliver the promise in the first ten seconds and pin a timestamp comment."
        }
        (Syndrome::Healthy, _) => "Keep monitoring. Title and thumbnail are working.",
        (Syndrome::InsufficientData, _) => "Keep monitoring until more metrics accumulate.",
    }
}
