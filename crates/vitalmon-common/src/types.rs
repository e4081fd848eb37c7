use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use vitalmon_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.to_string(), "warning");
/// assert!(Severity::Critical > Severity::Info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Warning and critical alerts call for attention; info alerts do not.
    pub fn is_actionable(&self) -> bool {
        *self >= Severity::Warning
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// The vital sign a reading measures.
///
/// Kinds the engine has no rules for are carried as [`ReadingKind::Other`]
/// rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReadingKind {
    HeartRate,
    BloodPressure,
    GlucoseLevel,
    BodyTemperature,
    Other(String),
}

/// The four kinds a subject is expected to log every day.
pub const CORE_READING_KINDS: [ReadingKind; 4] = [
    ReadingKind::HeartRate,
    ReadingKind::BloodPressure,
    ReadingKind::GlucoseLevel,
    ReadingKind::BodyTemperature,
];

impl ReadingKind {
    pub fn as_str(&self) -> &str {
        match self {
            ReadingKind::HeartRate => "heartRate",
            ReadingKind::BloodPressure => "bloodPressure",
            ReadingKind::GlucoseLevel => "glucoseLevel",
            ReadingKind::BodyTemperature => "bodyTemperature",
            ReadingKind::Other(name) => name,
        }
    }

    /// Display label used in alert titles and emails.
    pub fn label(&self) -> &str {
        match self {
            ReadingKind::HeartRate => "Heart Rate",
            ReadingKind::BloodPressure => "Blood Pressure",
            ReadingKind::GlucoseLevel => "Glucose Level",
            ReadingKind::BodyTemperature => "Body Temperature",
            ReadingKind::Other(name) => name,
        }
    }

    pub fn default_unit(&self) -> &'static str {
        match self {
            ReadingKind::HeartRate => "bpm",
            ReadingKind::BloodPressure => "mmHg",
            ReadingKind::GlucoseLevel => "mg/dL",
            ReadingKind::BodyTemperature => "°F",
            ReadingKind::Other(_) => "",
        }
    }
}

impl From<String> for ReadingKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "heartRate" => ReadingKind::HeartRate,
            "bloodPressure" => ReadingKind::BloodPressure,
            "glucoseLevel" => ReadingKind::GlucoseLevel,
            "bodyTemperature" => ReadingKind::BodyTemperature,
            _ => ReadingKind::Other(s),
        }
    }
}

impl From<&str> for ReadingKind {
    fn from(s: &str) -> Self {
        ReadingKind::from(s.to_string())
    }
}

impl From<ReadingKind> for String {
    fn from(kind: ReadingKind) -> Self {
        match kind {
            ReadingKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The measured value of a reading.
///
/// Serializes as a bare number or as `{"systolic": .., "diastolic": ..}`,
/// the shapes the ingestion API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Scalar(f64),
    BloodPressure { systolic: f64, diastolic: f64 },
}

impl ReadingValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ReadingValue::Scalar(v) => Some(*v),
            ReadingValue::BloodPressure { .. } => None,
        }
    }

    /// Returns `(systolic, diastolic)` for blood-pressure values.
    pub fn as_blood_pressure(&self) -> Option<(f64, f64)> {
        match self {
            ReadingValue::BloodPressure {
                systolic,
                diastolic,
            } => Some((*systolic, *diastolic)),
            ReadingValue::Scalar(_) => None,
        }
    }
}

/// Errors raised while resolving a raw reading at the ingestion boundary.
#[derive(Debug, thiserror::Error)]
pub enum ReadingError {
    #[error("Reading: {kind} expects {expected}")]
    ShapeMismatch {
        kind: String,
        expected: &'static str,
    },

    #[error("Reading: {kind} value must be a finite number")]
    NonFinite { kind: String },
}

/// One timestamped vital-sign observation for a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: String,
    pub subject_id: String,
    pub kind: ReadingKind,
    pub value: ReadingValue,
    pub unit: String,
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    /// Resolves an untyped ingestion payload into a typed reading.
    ///
    /// Blood pressure must be an object with numeric `systolic` and
    /// `diastolic`; the core kinds otherwise take a bare number. Kinds
    /// without rules accept either shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use serde_json::json;
    /// use vitalmon_common::types::{Reading, ReadingValue};
    ///
    /// let r = Reading::from_raw("p-1", "bloodPressure", &json!({"systolic": 150, "diastolic": 85}), None, Utc::now()).unwrap();
    /// assert_eq!(r.value, ReadingValue::BloodPressure { systolic: 150.0, diastolic: 85.0 });
    /// assert_eq!(r.unit, "mmHg");
    /// assert!(Reading::from_raw("p-1", "bloodPressure", &json!(120), None, Utc::now()).is_err());
    /// ```
    pub fn from_raw(
        subject_id: &str,
        kind: &str,
        value: &Value,
        unit: Option<&str>,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, ReadingError> {
        let kind = ReadingKind::from(kind);
        let value = match &kind {
            ReadingKind::BloodPressure => parse_blood_pressure(&kind, value)?,
            ReadingKind::Other(_) => match value {
                Value::Object(_) => parse_blood_pressure(&kind, value)?,
                _ => parse_scalar(&kind, value)?,
            },
            _ => parse_scalar(&kind, value)?,
        };
        let unit = unit.unwrap_or_else(|| kind.default_unit()).to_string();
        Ok(Self {
            id: crate::id::next_id(),
            subject_id: subject_id.to_string(),
            kind,
            value,
            unit,
            observed_at,
        })
    }
}

fn finite(kind: &ReadingKind, v: Option<f64>) -> Result<f64, ReadingError> {
    match v {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ReadingError::NonFinite {
            kind: kind.to_string(),
        }),
    }
}

fn parse_scalar(kind: &ReadingKind, value: &Value) -> Result<ReadingValue, ReadingError> {
    if !value.is_number() {
        return Err(ReadingError::ShapeMismatch {
            kind: kind.to_string(),
            expected: "a number",
        });
    }
    Ok(ReadingValue::Scalar(finite(kind, value.as_f64())?))
}

fn parse_blood_pressure(kind: &ReadingKind, value: &Value) -> Result<ReadingValue, ReadingError> {
    let (Some(systolic), Some(diastolic)) = (value.get("systolic"), value.get("diastolic")) else {
        return Err(ReadingError::ShapeMismatch {
            kind: kind.to_string(),
            expected: "an object with systolic and diastolic",
        });
    };
    Ok(ReadingValue::BloodPressure {
        systolic: finite(kind, systolic.as_f64())?,
        diastolic: finite(kind, diastolic.as_f64())?,
    })
}

/// Which generator produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    Threshold,
    Pattern,
    MissedReading,
    PositiveReinforcement,
}

impl AlertSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSource::Threshold => "threshold",
            AlertSource::Pattern => "pattern",
            AlertSource::MissedReading => "missed_reading",
            AlertSource::PositiveReinforcement => "positive_reinforcement",
        }
    }
}

impl std::fmt::Display for AlertSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threshold" => Ok(AlertSource::Threshold),
            "pattern" => Ok(AlertSource::Pattern),
            "missed_reading" => Ok(AlertSource::MissedReading),
            "positive_reinforcement" => Ok(AlertSource::PositiveReinforcement),
            _ => Err(format!("unknown alert source: {s}")),
        }
    }
}

/// An unpersisted alert proposal produced by a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub source: AlertSource,
    pub related_kind: Option<ReadingKind>,
    pub observed_at: DateTime<Utc>,
}

impl AlertCandidate {
    pub fn new(
        severity: Severity,
        source: AlertSource,
        title: impl Into<String>,
        message: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            source,
            related_kind: None,
            observed_at,
        }
    }

    pub fn with_kind(mut self, kind: ReadingKind) -> Self {
        self.related_kind = Some(kind);
        self
    }
}

/// A persisted alert in a subject's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub subject_id: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub source: AlertSource,
    pub related_kind: Option<ReadingKind>,
    pub observed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub fingerprint: Option<String>,
}

/// Per-severity email switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityToggles {
    pub critical: bool,
    pub warning: bool,
    pub info: bool,
}

impl Default for SeverityToggles {
    fn default() -> Self {
        Self {
            critical: true,
            warning: true,
            info: false,
        }
    }
}

impl SeverityToggles {
    pub fn enabled(&self, severity: Severity) -> bool {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

/// A subject's notification settings, owned by the profile subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub email_notifications: bool,
    pub health_alerts: bool,
    pub email_alert_types: SeverityToggles,
    pub email_address: Option<String>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            health_alerts: true,
            email_alert_types: SeverityToggles::default(),
            email_address: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Dispatched,
    Skipped,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Dispatched => "dispatched",
            DeliveryStatus::Skipped => "skipped",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dispatched" => Ok(DeliveryStatus::Dispatched),
            "skipped" => Ok(DeliveryStatus::Skipped),
            "failed" => Ok(DeliveryStatus::Failed),
            _ => Err(format!("unknown delivery status: {s}")),
        }
    }
}

/// Outcome of one notification attempt for a persisted alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: String,
    pub alert_id: String,
    pub subject_id: String,
    pub severity: Severity,
    pub status: DeliveryStatus,
    /// Skip reason or transport error.
    pub detail: Option<String>,
    pub message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
