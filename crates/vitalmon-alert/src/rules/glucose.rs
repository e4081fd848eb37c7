use super::format_value;
use crate::VitalRule;
use vitalmon_common::types::{AlertCandidate, AlertSource, Reading, ReadingKind, Severity};

/// Blood glucose thresholds in mg/dL.
pub struct GlucoseRule {
    pub critical_high: f64,
    pub warning_high: f64,
    pub warning_low: f64,
}

impl Default for GlucoseRule {
    fn default() -> Self {
        Self {
            critical_high: 200.0,
            warning_high: 140.0,
            warning_low: 70.0,
        }
    }
}

impl VitalRule for GlucoseRule {
    fn id(&self) -> &str {
        "glucose"
    }

    fn kind(&self) -> ReadingKind {
        ReadingKind::GlucoseLevel
    }

    fn evaluate(&self, reading: &Reading) -> Option<AlertCandidate> {
        let level = reading.value.as_scalar()?;
        let shown = format_value(level);

        let (severity, title, message) = if level >= self.critical_high {
            (
                Severity::Critical,
                "Very High Blood Glucose",
                format!(
                    "Your glucose level of {shown} mg/dL is at or above {} mg/dL. Follow your care plan and contact your doctor.",
                    format_value(self.critical_high)
                ),
            )
        } else if level >= self.warning_high {
            (
                Severity::Warning,
                "High Blood Glucose",
                format!(
                    "Your glucose level of {shown} mg/dL is at or above {} mg/dL.",
                    format_value(self.warning_high)
                ),
            )
        } else if level < self.warning_low {
            (
                Severity::Warning,
                "Low Blood Glucose",
                format!(
                    "Your glucose level of {shown} mg/dL is below {} mg/dL. Have a fast-acting carbohydrate and re-check in 15 minutes.",
                    format_value(self.warning_low)
                ),
            )
        } else {
            return None;
        };

        Some(
            AlertCandidate::new(severity, AlertSource::Threshold, title, message, reading.observed_at)
                .with_kind(ReadingKind::GlucoseLevel),
        )
    }
}
