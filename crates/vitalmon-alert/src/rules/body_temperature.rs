use super::format_value;
use crate::VitalRule;
use vitalmon_common::types::{AlertCandidate, AlertSource, Reading, ReadingKind, Severity};

/// Thresholds are in °F; readings logged in °C are converted first.
pub struct BodyTemperatureRule {
    pub critical_high: f64,
    pub fever: f64,
    pub low: f64,
}

impl Default for BodyTemperatureRule {
    fn default() -> Self {
        Self {
            critical_high: 103.0,
            fever: 100.4,
            low: 97.0,
        }
    }
}

fn to_fahrenheit(value: f64, unit: &str) -> f64 {
    match unit.trim().trim_start_matches('°').to_ascii_lowercase().as_str() {
        "c" | "celsius" => value * 9.0 / 5.0 + 32.0,
        _ => value,
    }
}

impl VitalRule for BodyTemperatureRule {
    fn id(&self) -> &str {
        "body-temperature"
    }

    fn kind(&self) -> ReadingKind {
        ReadingKind::BodyTemperature
    }

    fn evaluate(&self, reading: &Reading) -> Option<AlertCandidate> {
        let temp = to_fahrenheit(reading.value.as_scalar()?, &reading.unit);
        let shown = format_value(temp);

        let (severity, title, message) = if temp >= self.critical_high {
            (
                Severity::Critical,
                "High Fever",
                format!(
                    "Your temperature of {shown}°F is at or above {}°F. Seek medical attention promptly.",
                    format_value(self.critical_high)
                ),
            )
        } else if temp >= self.fever {
            (
                Severity::Warning,
                "Fever Detected",
                format!("Your temperature of {shown}°F indicates a fever. Rest, stay hydrated and keep monitoring."),
            )
        } else if temp < self.low {
            (
                Severity::Warning,
                "Low Body Temperature",
                format!(
                    "Your temperature of {shown}°F is below {}°F. Warm up and measure again.",
                    format_value(self.low)
                ),
            )
        } else {
            return None;
        };

        Some(
            AlertCandidate::new(severity, AlertSource::Threshold, title, message, reading.observed_at)
                .with_kind(ReadingKind::BodyTemperature),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::to_fahrenheit;

    #[test]
    fn converts_celsius_units() {
        assert!((to_fahrenheit(38.0, "°C") - 100.4).abs() < 1e-9);
        assert!((to_fahrenheit(38.0, "celsius") - 100.4).abs() < 1e-9);
        assert_eq!(to_fahrenheit(99.1, "°F"), 99.1);
    }
}
