//! PII detection
//!
//! Structured recognizers operate read-only and independently over the
//! same input; each exposes the [`Recognizer`] capability interface and is
//! held in an ordered collection. Soft detections arrive from an external
//! inference collaborator and are normalized in [`ner`].

pub mod checksum;
pub mod ner;
pub mod structured;

use crate::domain::Result;
use crate::models::Detection;
use crate::policy::Policy;

pub use ner::{InferenceProvider, TokenPrediction};
pub use structured::PatternRecognizer;

/// Capability interface for structured recognizers
pub trait Recognizer: Send + Sync {
    /// Diagnostic name
    fn name(&self) -> &str;

    /// Scan the text and return all candidates
    fn recognize(&self, text: &str) -> Result<Vec<Detection>>;
}

/// Build the recognizer collection for a policy: the built-in set plus one
/// recognizer per registered custom pattern
pub fn build_recognizers(policy: &Policy) -> Vec<Box<dyn Recognizer>> {
    let mut recognizers: Vec<Box<dyn Recognizer>> = structured::builtin_recognizers()
        .into_iter()
        .map(|r| Box::new(r) as Box<dyn Recognizer>)
        .collect();

    for custom in &policy.custom_patterns {
        recognizers.push(Box::new(PatternRecognizer::custom(
            custom.name.clone(),
            custom.regex.clone(),
            custom.pii_type,
        )));
    }

    recognizers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CustomPatternSpec, PolicyOverrides};

    #[test]
    fn test_builtin_collection() {
        let recognizers = build_recognizers(&Policy::default());
        let names: Vec<&str> = recognizers.iter().map(|r| r.name()).collect();

        assert!(names.contains(&"email"));
        assert!(names.contains(&"iban"));
        assert!(names.contains(&"credit_card"));
    }

    #[test]
    fn test_custom_patterns_appended() {
        let policy = Policy::merge(PolicyOverrides {
            custom_patterns: vec![CustomPatternSpec {
                name: "employee_id".to_string(),
                pattern: r"EMP-\d{6}".to_string(),
                pii_type: crate::models::PiiType::Person,
            }],
            ..Default::default()
        })
        .unwrap();

        let recognizers = build_recognizers(&policy);
        assert!(recognizers.iter().any(|r| r.name() == "employee_id"));
    }
}
