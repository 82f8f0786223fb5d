//! Checkpoint schedule: the fixed observation offsets after publication.
//!
//! Eight checkpoints are defined. The first five (`1h` through `72h`) are
//! short-term and observed for every video; the last three (`7d`, `15d`,
//! `30d`) are long-term and only observed for records placed on
//! long-term watch at `72h`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A fixed time offset after publication at which metrics are sampled.
///
/// Variants are declared in schedule order, so the derived `Ord` is the
/// schedule order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Checkpoint {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "48h")]
    H48,
    #[serde(rename = "72h")]
    H72,
    #[serde(rename = "7d")]
    D7,
    #[serde(rename = "15d")]
    D15,
    #[serde(rename = "30d")]
    D30,
}

/// The full schedule, in order.
pub const SCHEDULE: [Checkpoint; 8] = [
    Checkpoint::H1,
    Checkpoint::H6,
    Checkpoint::H24,
    Checkpoint::H48,
    Checkpoint::H72,
    Checkpoint::D7,
    Checkpoint::D15,
    Checkpoint::D30,
];

/// Prefix used for checkpoint keys in the stored metrics map.
pub const STORAGE_KEY_PREFIX: &str = "checkpoint_";

impl Checkpoint {
    /// The checkpoint at which the extension rule runs.
    pub const DECISION: Checkpoint = Checkpoint::H72;

    /// The final long-term checkpoint.
    pub const FINAL: Checkpoint = Checkpoint::D30;

    /// Short label, e.g. `72h` or `7d`.
    pub fn label(&self) -> &'static str {
        match self {
            Checkpoint::H1 => "1h",
            Checkpoint::H6 => "6h",
            Checkpoint::H24 => "24h",
            Checkpoint::H48 => "48h",
            Checkpoint::H72 => "72h",
            Checkpoint::D7 => "7d",
            Checkpoint::D15 => "15d",
            Checkpoint::D30 => "30d",
        }
    }

    /// Key under which this checkpoint's snapshot is stored, e.g. `checkpoint_72h`.
    pub fn storage_key(&self) -> String {
        format!("{}{}", STORAGE_KEY_PREFIX, self.label())
    }

    /// Position in the schedule (0-based).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Hours after publication.
    pub fn hours(&self) -> i64 {
        match self {
            Checkpoint::H1 => 1,
            Checkpoint::H6 => 6,
            Checkpoint::H24 => 24,
            Checkpoint::H48 => 48,
            Checkpoint::H72 => 72,
            Checkpoint::D7 => 7 * 24,
            Checkpoint::D15 => 15 * 24,
            Checkpoint::D30 => 30 * 24,
        }
    }

    /// Offset after publication.
    pub fn offset(&self) -> Duration {
        Duration::hours(self.hours())
    }

    /// Half-width of the window in which this checkpoint counts as due.
    ///
    /// Thirty minutes below 48h, two hours from 48h on.
    pub fn tolerance(&self) -> Duration {
        if self.hours() < 48 {
            Duration::minutes(30)
        } else {
            Duration::hours(2)
        }
    }

    /// Whether this checkpoint is only observed under long-term watch.
    pub fn is_long_term(&self) -> bool {
        *self > Checkpoint::H72
    }

    /// The checkpoint after this one, or `None` when this is terminal.
    pub fn next(&self) -> Option<Checkpoint> {
        SCHEDULE.get(self.index() + 1).copied()
    }

    /// The checkpoint before this one, or `None` for `1h`.
    pub fn previous(&self) -> Option<Checkpoint> {
        self.index().checked_sub(1).map(|i| SCHEDULE[i])
    }

    /// Wall-clock time at which this checkpoint falls for a video.
    pub fn due_time(&self, published_at: DateTime<Utc>) -> DateTime<Utc> {
        published_at + self.offset()
    }

    /// Whether `elapsed` since publication falls inside this checkpoint's window.
    pub fn is_due(&self, elapsed: Duration) -> bool {
        let tolerance = self.tolerance();
        elapsed >= self.offset() - tolerance && elapsed <= self.offset() + tolerance
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error returned when a checkpoint label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown checkpoint: {0}")]
pub struct ParseCheckpointError(pub String);

impl std::str::FromStr for Checkpoint {
    type Err = ParseCheckpointError;

    /// Accepts both the short label (`72h`) and the storage key (`checkpoint_72h`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.strip_prefix(STORAGE_KEY_PREFIX).unwrap_or(s);
        SCHEDULE
            .iter()
            .copied()
            .find(|c| c.label() == label)
            .ok_or_else(|| ParseCheckpointError(s.to_string()))
    }
}

/// The checkpoint due at `now` for a video published at `published_at`.
///
/// Returns `None` when `now` falls between windows. Windows never overlap,
/// so at most one checkpoint matches.
pub fn resolve_due(published_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Checkpoint> {
    let elapsed = now - published_at;
    SCHEDULE.iter().copied().find(|c| c.is_due(elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schedule_order() {
        for pair in SCHEDULE.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].hours() < pair[1].hours());
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[1].previous(), Some(pair[0]));
        }
        assert_eq!(Checkpoint::D30.next(), None);
        assert_eq!(Checkpoint::H1.previous(), None);
    }

    #[test]
    fn test_long_term_split() {
        let long_term: Vec<_> = SCHEDULE.iter().filter(|c| c.is_long_term()).collect();
        assert_eq!(
            long_term,
            vec![&Checkpoint::D7, &Checkpoint::D15, &Checkpoint::D30]
        );
        assert!(!Checkpoint::DECISION.is_long_term());
    }

    #[test]
    fn test_parse_labels_and_keys() {
        assert_eq!("72h".parse::<Checkpoint>().unwrap(), Checkpoint::H72);
        assert_eq!("checkpoint_15d".parse::<Checkpoint>().unwrap(), Checkpoint::D15);
        assert!("12h".parse::<Checkpoint>().is_err());
        assert_eq!(Checkpoint::D7.storage_key(), "checkpoint_7d");
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&Checkpoint::D15).unwrap();
        assert_eq!(json, "\"15d\"");
        let back: Checkpoint = serde_json::from_str("\"48h\"").unwrap();
        assert_eq!(back, Checkpoint::H48);
    }

    #[test]
    fn test_resolve_due_windows() {
        let published = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        let at = |minutes: i64| published + Duration::minutes(minutes);

        assert_eq!(resolve_due(published, at(60)), Some(Checkpoint::H1));
        assert_eq!(resolve_due(published, at(89)), Some(Checkpoint::H1));
        assert_eq!(resolve_due(published, at(120)), None);
        assert_eq!(resolve_due(published, at(6 * 60 - 30)), Some(Checkpoint::H6));
        // 48h and above use a two hour window
        assert_eq!(resolve_due(published, at(46 * 60)), Some(Checkpoint::H48));
        assert_eq!(resolve_due(published, at(74 * 60)), Some(Checkpoint::H72));
        assert_eq!(resolve_due(published, at(75 * 60)), None);
        assert_eq!(resolve_due(published, at(30 * 24 * 60 + 90)), Some(Checkpoint::D30));
        assert_eq!(resolve_due(published, at(-10)), None);
    }

    #[test]
    fn test_due_time() {
        let published = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Checkpoint::D7.due_time(published),
            Utc.with_ymd_and_hms(2025, 3, 8, 0, 0, 0).unwrap()
        );
    }
}
