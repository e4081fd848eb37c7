use chrono::{DateTime, Utc};
use std::collections::HashSet;
use vitalmon_common::types::{AlertCandidate, AlertSource, ReadingKind, Severity, CORE_READING_KINDS};

pub const DAILY_TASKS_COMPLETED: &str = "Daily Health Tasks Completed";
pub const GOOD_PROGRESS: &str = "Good Progress";
pub const CONSISTENT_MONITORING: &str = "Consistent Health Monitoring";

/// Encouragement for subjects who keep logging.
///
/// The caller only invokes this when a pass produced no warning or
/// critical candidates; the generator does not look at other candidates.
pub struct PositiveReinforcement {
    pub consistency_min_readings: usize,
}

impl Default for PositiveReinforcement {
    fn default() -> Self {
        Self {
            consistency_min_readings: 20,
        }
    }
}

impl PositiveReinforcement {
    /// `logged_today` holds the kinds seen in the trailing day and
    /// `readings_this_week` the reading count over the trailing seven days.
    pub fn generate(
        &self,
        logged_today: &HashSet<ReadingKind>,
        readings_this_week: usize,
        now: DateTime<Utc>,
    ) -> Vec<AlertCandidate> {
        let mut candidates = Vec::new();
        let total = CORE_READING_KINDS.len();
        let logged = CORE_READING_KINDS
            .iter()
            .filter(|kind| logged_today.contains(*kind))
            .count();

        if logged == total {
            candidates.push(AlertCandidate::new(
                Severity::Info,
                AlertSource::PositiveReinforcement,
                DAILY_TASKS_COMPLETED,
                "You logged all of your daily health readings. Great job staying on top of your health!",
                now,
            ));
        } else if logged >= 2 {
            candidates.push(AlertCandidate::new(
                Severity::Info,
                AlertSource::PositiveReinforcement,
                GOOD_PROGRESS,
                format!("You logged {logged} of {total} daily health readings today. Keep it up!"),
                now,
            ));
        }

        if readings_this_week >= self.consistency_min_readings {
            candidates.push(AlertCandidate::new(
                Severity::Info,
                AlertSource::PositiveReinforcement,
                CONSISTENT_MONITORING,
                format!(
                    "You recorded {readings_this_week} readings this week. Consistent monitoring gives your care team a clearer picture."
                ),
                now,
            ));
        }

        candidates
    }
}
