use super::format_value;
use crate::VitalRule;
use vitalmon_common::types::{AlertCandidate, AlertSource, Reading, ReadingKind, Severity};

pub struct HeartRateRule {
    pub critical_low: f64,
    pub critical_high: f64,
    pub warning_high: f64,
}

impl Default for HeartRateRule {
    fn default() -> Self {
        Self {
            critical_low: 50.0,
            critical_high: 120.0,
            warning_high: 100.0,
        }
    }
}

impl VitalRule for HeartRateRule {
    fn id(&self) -> &str {
        "heart-rate"
    }

    fn kind(&self) -> ReadingKind {
        ReadingKind::HeartRate
    }

    fn evaluate(&self, reading: &Reading) -> Option<AlertCandidate> {
        let bpm = reading.value.as_scalar()?;
        let shown = format_value(bpm);

        let (severity, title, message) = if bpm > self.critical_high {
            (
                Severity::Critical,
                "High Heart Rate",
                format!(
                    "Your heart rate of {shown} bpm is above {} bpm. Rest and seek medical attention if it does not come down.",
                    format_value(self.critical_high)
                ),
            )
        } else if bpm < self.critical_low {
            (
                Severity::Critical,
                "Low Heart Rate",
                format!(
                    "Your heart rate of {shown} bpm is below {} bpm. Seek medical attention if you feel dizzy or faint.",
                    format_value(self.critical_low)
                ),
            )
        } else if bpm > self.warning_high {
            (
                Severity::Warning,
                "Elevated Heart Rate",
                format!(
                    "Your heart rate of {shown} bpm is above the resting range (up to {} bpm).",
                    format_value(self.warning_high)
                ),
            )
        } else {
            return None;
        };

        Some(
            AlertCandidate::new(severity, AlertSource::Threshold, title, message, reading.observed_at)
                .with_kind(ReadingKind::HeartRate),
        )
    }
}
