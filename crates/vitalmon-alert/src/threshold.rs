use crate::rules::default_rules;
use crate::VitalRule;
use vitalmon_common::types::{AlertCandidate, Reading};

pub struct ThresholdEvaluator {
    rules: Vec<Box<dyn VitalRule>>,
}

impl ThresholdEvaluator {
    pub fn new(rules: Vec<Box<dyn VitalRule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Box<dyn VitalRule>] {
        &self.rules
    }

    /// Get a rule by its ID.
    pub fn get_rule(&self, id: &str) -> Option<&dyn VitalRule> {
        self.rules.iter().find(|r| r.id() == id).map(|r| r.as_ref())
    }

    /// Evaluates one reading against every rule registered for its kind.
    ///
    /// Kinds without a rule yield nothing.
    pub fn evaluate(&self, reading: &Reading) -> Vec<AlertCandidate> {
        let mut matched = false;
        let mut candidates = Vec::new();

        for rule in self.rules.iter().filter(|r| r.kind() == reading.kind) {
            matched = true;
            if let Some(candidate) = rule.evaluate(reading) {
                candidates.push(candidate);
            }
        }

        if !matched {
            tracing::trace!(
                kind = %reading.kind,
                subject_id = %reading.subject_id,
                "No threshold rule for reading kind"
            );
        }

        candidates
    }
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
