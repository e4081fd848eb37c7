pub mod blood_pressure;
pub mod body_temperature;
pub mod glucose;
pub mod heart_rate;

use crate::VitalRule;

/// The built-in rule set, one rule per core reading kind.
pub fn default_rules() -> Vec<Box<dyn VitalRule>> {
    vec![
        Box::new(heart_rate::HeartRateRule::default()),
        Box::new(blood_pressure::BloodPressureRule::default()),
        Box::new(body_temperature::BodyTemperatureRule::default()),
        Box::new(glucose::GlucoseRule::default()),
    ]
}

/// Formats a measured value without a trailing `.0` for whole numbers.
pub(crate) fn format_value(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
