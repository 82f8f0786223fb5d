//! Profile-aware health check of a single snapshot.
//!
//! Where diagnosis names the failing part of the packaging, the health
//! check says how the video is doing for its channel profile right now,
//! and how urgently someone should look. Like diagnosis it is advisory.

use crate::config::{ChannelProfile, DiagnosisThresholds};
use sleeper_types::{HealthCheck, HealthStatus, MetricSnapshot, Priority};

/// Viral alerts on CTR and velocity wait this long after publication.
pub const VIRAL_URGENT_AFTER_HOURS: f64 = 6.0;

/// Check the health of a snapshot taken `hours_online` after publication.
///
/// The silence window and archive horizon apply to every profile; the
/// remaining cases are checked in profile order and the first match wins.
pub fn check_health(
    snapshot: &MetricSnapshot,
    hours_online: f64,
    thresholds: &DiagnosisThresholds,
    profile: ChannelProfile,
) -> HealthCheck {
    if hours_online < thresholds.silence_hours {
        return health(
            HealthStatus::WaitingIndexing,
            Priority::Info,
            format!(
                "Indexing: wait {}h before judging ({:.1}h online)",
                thresholds.silence_hours, hours_online
            ),
        );
    }
    if hours_online > thresholds.archive_after_hours {
        return health(
            HealthStatus::Archived,
            Priority::Info,
            format!(
                "Watch window over ({:.1}h > {}h)",
                hours_online, thresholds.archive_after_hours
            ),
        );
    }

    match profile {
        ChannelProfile::Search => search_health(snapshot, thresholds),
        ChannelProfile::Viral => viral_health(snapshot, hours_online, thresholds),
        ChannelProfile::Generic => generic_health(snapshot, thresholds),
    }
}

fn health(status: HealthStatus, priority: Priority, message: String) -> HealthCheck {
    HealthCheck {
        status,
        priority,
        message,
    }
}

fn search_health(s: &MetricSnapshot, t: &DiagnosisThresholds) -> HealthCheck {
    let ctr = s.ctr * 100.0;
    let min_ctr = t.min_ctr * 100.0;
    let low_ctr = s.ctr < t.min_ctr;

    if s.vph >= t.healthy_vph {
        health(
            HealthStatus::HealthySeoDrip,
            Priority::Success,
            format!("Steady search traffic ({:.1} VPH >= {} VPH)", s.vph, t.healthy_vph),
        )
    } else if s.vph < t.stagnant_vph && low_ctr {
        health(
            HealthStatus::AlertStagnant,
            Priority::Medium,
            format!(
                "Stagnant: VPH {:.1} < {}, CTR {:.1}% < {:.1}%. Rework title, tags and description",
                s.vph, t.stagnant_vph, ctr, min_ctr
            ),
        )
    } else if low_ctr {
        health(
            HealthStatus::AlertLowCtrSeo,
            Priority::Medium,
            format!(
                "CTR {:.1}% < {:.1}% with acceptable VPH ({:.1}). Refresh title or thumbnail, no rush",
                ctr, min_ctr, s.vph
            ),
        )
    } else if s.retention < t.min_retention {
        health(
            HealthStatus::AlertLowRetention,
            Priority::Medium,
            format!(
                "Retention {:.1}% < {:.1}%. The content is the problem, not the title",
                s.retention * 100.0,
                t.min_retention * 100.0
            ),
        )
    } else {
        health(
            HealthStatus::MonitoringSeo,
            Priority::Info,
            format!("Search monitoring: VPH {:.1}, CTR {:.1}%", s.vph, ctr),
        )
    }
}

fn viral_health(s: &MetricSnapshot, hours_online: f64, t: &DiagnosisThresholds) -> HealthCheck {
    let ctr = s.ctr * 100.0;
    let min_ctr = t.min_ctr * 100.0;
    let urgent = hours_online >= VIRAL_URGENT_AFTER_HOURS;

    if s.vph >= t.healthy_vph {
        health(
            HealthStatus::ViralSuccess,
            Priority::Success,
            format!("Taking off: {:.1} VPH >= {} VPH", s.vph, t.healthy_vph),
        )
    } else if s.ctr < t.min_ctr && urgent {
        health(
            HealthStatus::AlertLowCtrUrgent,
            Priority::High,
            format!(
                "CTR {:.1}% < {:.1}%. Change the title now, the viral window is closing",
                ctr, min_ctr
            ),
        )
    } else if s.retention < t.min_retention && s.ctr >= t.min_ctr {
        health(
            HealthStatus::AlertClickbaitMismatch,
            Priority::High,
            format!(
                "Packaging works (CTR {:.1}%) but viewers leave (retention {:.1}% < {:.1}%)",
                ctr,
                s.retention * 100.0,
                t.min_retention * 100.0
            ),
        )
    } else if s.vph < t.stagnant_vph && urgent {
        health(
            HealthStatus::AlertStagnantViral,
            Priority::High,
            format!(
                "Not spreading: VPH {:.1} < {}. Revisit title and thumbnail now",
                s.vph, t.stagnant_vph
            ),
        )
    } else {
        health(
            HealthStatus::MonitoringViral,
            Priority::Info,
            format!("Waiting for lift-off: VPH {:.1}, CTR {:.1}%", s.vph, ctr),
        )
    }
}

fn generic_health(s: &MetricSnapshot, t: &DiagnosisThresholds) -> HealthCheck {
    if s.vph >= t.healthy_vph {
        health(
            HealthStatus::MonitoringOk,
            Priority::Success,
            format!("Stable: {:.1} VPH", s.vph),
        )
    } else if s.vph < t.stagnant_vph {
        health(
            HealthStatus::AlertLowPerformance,
            Priority::Medium,
            format!("Low VPH: {:.1}. Review title and thumbnail", s.vph),
        )
    } else {
        health(
            HealthStatus::MonitoringNeutral,
            Priority::Info,
            format!("Monitoring: {:.1} VPH", s.vph),
        )
    }
}
