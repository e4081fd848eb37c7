use crate::history::ReadingHistory;
use crate::rules::format_value;
use chrono::Duration;
use vitalmon_common::types::{AlertCandidate, AlertSource, ReadingKind, Severity};

/// Looks for trends across several readings of the same kind.
///
/// Too little history for a rule is a silent no-op.
pub struct PatternAnalyzer {
    pub window: Duration,
    pub trend_points: usize,
    pub trend_systolic_floor: f64,
    pub variability_points: usize,
    /// Population variance in bpm².
    pub variability_threshold: f64,
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self {
            window: Duration::days(3),
            trend_points: 3,
            trend_systolic_floor: 130.0,
            variability_points: 5,
            variability_threshold: 200.0,
        }
    }
}

impl PatternAnalyzer {
    pub fn analyze(&self, history: &ReadingHistory) -> Vec<AlertCandidate> {
        let mut candidates = Vec::new();
        if let Some(c) = self.blood_pressure_trend(history) {
            candidates.push(c);
        }
        if let Some(c) = self.heart_rate_variability(history) {
            candidates.push(c);
        }
        candidates
    }

    fn blood_pressure_trend(&self, history: &ReadingHistory) -> Option<AlertCandidate> {
        let recent = history.latest(&ReadingKind::BloodPressure, self.window, self.trend_points);
        if recent.len() < self.trend_points.max(2) {
            return None;
        }

        let systolic: Vec<f64> = recent
            .iter()
            .filter_map(|r| r.value.as_blood_pressure().map(|(s, _)| s))
            .collect();
        if systolic.len() < recent.len() {
            return None;
        }

        let rising = systolic.windows(2).all(|w| w[1] > w[0]);
        let last = *systolic.last()?;
        if !rising || last <= self.trend_systolic_floor {
            return None;
        }

        let series = systolic
            .iter()
            .map(|v| format_value(*v))
            .collect::<Vec<_>>()
            .join(" → ");
        let observed_at = recent.last()?.observed_at;
        Some(
            AlertCandidate::new(
                Severity::Warning,
                AlertSource::Pattern,
                "Blood Pressure Trending Up",
                format!(
                    "Your systolic pressure has risen over your last {} readings ({series} mmHg). Keep monitoring and consider contacting your doctor.",
                    systolic.len()
                ),
                observed_at,
            )
            .with_kind(ReadingKind::BloodPressure),
        )
    }

    fn heart_rate_variability(&self, history: &ReadingHistory) -> Option<AlertCandidate> {
        let recent = history.latest(&ReadingKind::HeartRate, self.window, self.variability_points);
        if recent.len() < self.variability_points.max(1) {
            return None;
        }

        let values: Vec<f64> = recent.iter().filter_map(|r| r.value.as_scalar()).collect();
        if values.len() < recent.len() {
            return None;
        }

        let variance = population_variance(&values);
        if variance <= self.variability_threshold {
            return None;
        }

        let observed_at = recent.last()?.observed_at;
        Some(
            AlertCandidate::new(
                Severity::Info,
                AlertSource::Pattern,
                "Heart Rate Variability",
                format!(
                    "Your last {} heart rate readings varied more than usual (variance {:.0} bpm²). Try measuring at the same time of day while at rest.",
                    values.len(),
                    variance
                ),
                observed_at,
            )
            .with_kind(ReadingKind::HeartRate),
        )
    }
}

pub(crate) fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
