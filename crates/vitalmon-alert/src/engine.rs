use crate::history::ReadingHistory;
use crate::missed::MissedReadingDetector;
use crate::pattern::PatternAnalyzer;
use crate::positive::PositiveReinforcement;
use crate::threshold::ThresholdEvaluator;
use chrono::Duration;
use vitalmon_common::types::{AlertCandidate, Reading};

/// Composes the generators into one evaluation pass for a subject.
pub struct EvaluationEngine {
    pub threshold: ThresholdEvaluator,
    pub patterns: PatternAnalyzer,
    pub missed: MissedReadingDetector,
    pub positive: PositiveReinforcement,
    /// Window for the missed-reading and daily-completion checks.
    pub daily_window: Duration,
    /// Window for the consistency check.
    pub weekly_window: Duration,
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        Self {
            threshold: ThresholdEvaluator::default(),
            patterns: PatternAnalyzer::default(),
            missed: MissedReadingDetector,
            positive: PositiveReinforcement::default(),
            daily_window: Duration::hours(24),
            weekly_window: Duration::days(7),
        }
    }
}

impl EvaluationEngine {
    /// How far back a pass needs readings.
    pub fn lookback(&self) -> Duration {
        self.weekly_window
            .max(self.patterns.window)
            .max(self.daily_window)
    }

    pub fn evaluate_reading(&self, reading: &Reading) -> Vec<AlertCandidate> {
        self.threshold.evaluate(reading)
    }

    /// Runs the pattern and missed-reading generators over `history`.
    ///
    /// Positive reinforcement runs only when neither `prior` (candidates
    /// already produced in the same pass) nor the new candidates contain a
    /// warning or critical one.
    pub fn evaluate_history(
        &self,
        history: &ReadingHistory,
        prior: &[AlertCandidate],
    ) -> Vec<AlertCandidate> {
        let now = history.now();
        let logged_today = history.kinds_within(self.daily_window);

        let mut candidates = self.patterns.analyze(history);
        candidates.extend(self.missed.detect(&logged_today, now));

        let actionable = prior
            .iter()
            .chain(candidates.iter())
            .any(|c| c.severity.is_actionable());
        if !actionable {
            let this_week = history.count_within(self.weekly_window);
            candidates.extend(self.positive.generate(&logged_today, this_week, now));
        }

        candidates
    }
}
