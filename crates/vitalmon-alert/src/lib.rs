//! Pure alert generators for vital-sign readings.
//!
//! The [`threshold::ThresholdEvaluator`] checks single readings against
//! per-kind [`VitalRule`]s. The [`pattern::PatternAnalyzer`],
//! [`missed::MissedReadingDetector`] and [`positive::PositiveReinforcement`]
//! look at a subject's recent [`history::ReadingHistory`]. None of them
//! touch storage; [`engine::EvaluationEngine`] composes them into one pass
//! and hands back candidates for the deduplication layer.

pub mod engine;
pub mod history;
pub mod missed;
pub mod pattern;
pub mod positive;
pub mod rules;
pub mod threshold;


use vitalmon_common::types::{AlertCandidate, Reading, ReadingKind};

/// A threshold rule for one kind of vital sign.
///
/// Implementations are registered in the [`threshold::ThresholdEvaluator`]
/// and evaluated for every reading whose kind matches. A rule yields at
/// most one candidate per reading; critical conditions are checked first
/// and short-circuit the warning checks.
pub trait VitalRule: Send + Sync {
    /// Unique identifier for this rule (e.g., `"heart-rate"`).
    fn id(&self) -> &str;

    /// The reading kind this rule applies to.
    fn kind(&self) -> ReadingKind;

    /// Evaluates one reading, returning a candidate when it is out of range.
    fn evaluate(&self, reading: &Reading) -> Option<AlertCandidate>;
}
