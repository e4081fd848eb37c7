use super::format_value;
use crate::VitalRule;
use vitalmon_common::types::{AlertCandidate, AlertSource, Reading, ReadingKind, Severity};

/// Evaluates systolic and diastolic together as one signal.
pub struct BloodPressureRule {
    pub critical_systolic: f64,
    pub critical_diastolic: f64,
    pub warning_systolic: f64,
    pub warning_diastolic: f64,
}

impl Default for BloodPressureRule {
    fn default() -> Self {
        Self {
            critical_systolic: 180.0,
            critical_diastolic: 110.0,
            warning_systolic: 140.0,
            warning_diastolic: 90.0,
        }
    }
}

impl VitalRule for BloodPressureRule {
    fn id(&self) -> &str {
        "blood-pressure"
    }

    fn kind(&self) -> ReadingKind {
        ReadingKind::BloodPressure
    }

    fn evaluate(&self, reading: &Reading) -> Option<AlertCandidate> {
        let (systolic, diastolic) = reading.value.as_blood_pressure()?;
        let shown = format!("{}/{}", format_value(systolic), format_value(diastolic));

        let (severity, title, message) =
            if systolic >= self.critical_systolic || diastolic >= self.critical_diastolic {
                (
                    Severity::Critical,
                    "Hypertensive Crisis",
                    format!(
                        "Your blood pressure of {shown} mmHg is at a crisis level (at or above {}/{} mmHg). Seek emergency care if you have chest pain, shortness of breath or vision changes.",
                        format_value(self.critical_systolic),
                        format_value(self.critical_diastolic)
                    ),
                )
            } else if systolic >= self.warning_systolic || diastolic >= self.warning_diastolic {
                (
                    Severity::Warning,
                    "High Blood Pressure",
                    format!(
                        "Your blood pressure of {shown} mmHg is at or above {}/{} mmHg. Consider contacting your doctor.",
                        format_value(self.warning_systolic),
                        format_value(self.warning_diastolic)
                    ),
                )
            } else {
                return None;
            };

        Some(
            AlertCandidate::new(severity, AlertSource::Threshold, title, message, reading.observed_at)
                .with_kind(ReadingKind::BloodPressure),
        )
    }
}
