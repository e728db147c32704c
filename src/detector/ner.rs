//! Soft-detection normalizer
//!
//! Adapts token-level predictions from the external inference collaborator
//! into the common detection shape: maps model labels to PII types and
//! merges adjacent tokens into spans following the `B-`/`I-` convention.

use crate::domain::Result;
use crate::models::{Detection, DetectionSource, PiiType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Token-level prediction from the inference collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPrediction {
    /// Model label, e.g. `B-PER`, `I-LOC`, `ORG`, `O`
    pub label: String,
    /// Byte offset of the token start
    pub start: usize,
    /// Byte offset one past the token end
    pub end: usize,
    /// Token score (0.0 - 1.0)
    pub score: f32,
}

/// External entity-recognition inference collaborator
///
/// The pipeline awaits `predict` behind a timeout; failure or timeout
/// degrades the call to regex-only results.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run inference over the text
    async fn predict(&self, text: &str) -> Result<Vec<TokenPrediction>>;

    /// Version string recorded in result statistics
    fn model_version(&self) -> String;
}

/// BIO position of a token label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BioPrefix {
    Begin,
    Inside,
    Bare,
}

/// Split a label into its BIO prefix and mapped PII type
///
/// Prefixes are recognized only in upper case; the remaining label is
/// matched case-insensitively. Unmapped labels (including `O`) yield
/// `None` and the token is dropped.
fn map_label(label: &str) -> (BioPrefix, Option<PiiType>) {
    let (prefix, rest) = if let Some(rest) = label.strip_prefix("B-") {
        (BioPrefix::Begin, rest)
    } else if let Some(rest) = label.strip_prefix("I-") {
        (BioPrefix::Inside, rest)
    } else {
        (BioPrefix::Bare, label)
    };

    let pii_type = match rest.to_uppercase().as_str() {
        "PER" | "PERSON" => Some(PiiType::Person),
        "ORG" | "ORGANIZATION" => Some(PiiType::Organization),
        "LOC" | "LOCATION" | "GPE" => Some(PiiType::Location),
        "DATE" => Some(PiiType::DateOfBirth),
        "MISC" => Some(PiiType::Address),
        _ => None,
    };

    (prefix, pii_type)
}

struct OpenSpan {
    pii_type: PiiType,
    start: usize,
    end: usize,
    confidence: f32,
}

impl OpenSpan {
    fn close(self, text: &str) -> Option<Detection> {
        let slice = text.get(self.start..self.end)?;
        Some(Detection::new(
            self.pii_type,
            self.start,
            self.end,
            self.confidence,
            DetectionSource::Ner,
            slice,
        ))
    }
}

/// Normalize token predictions into merged detections
///
/// A merged span's confidence is the minimum of its constituent token
/// scores. An `I-` token not preceded by a same-type span defensively
/// starts a new span rather than being dropped; prefix-less labels behave
/// the same way. Tokens with invalid offsets are skipped.
pub fn normalize_predictions(predictions: &[TokenPrediction], text: &str) -> Vec<Detection> {
    let mut tokens: Vec<&TokenPrediction> = predictions
        .iter()
        .filter(|t| {
            t.start < t.end
                && t.end <= text.len()
                && text.is_char_boundary(t.start)
                && text.is_char_boundary(t.end)
        })
        .collect();
    tokens.sort_by_key(|t| (t.start, t.end));

    let mut detections = Vec::new();
    let mut current: Option<OpenSpan> = None;

    for token in tokens {
        let (prefix, mapped) = map_label(&token.label);
        let Some(pii_type) = mapped else {
            if let Some(span) = current.take() {
                detections.extend(span.close(text));
            }
            continue;
        };

        let continues = prefix != BioPrefix::Begin
            && current
                .as_ref()
                .is_some_and(|span| span.pii_type == pii_type && token.start >= span.end);

        if continues {
            if let Some(span) = current.as_mut() {
                span.end = token.end;
                span.confidence = span.confidence.min(token.score);
            }
        } else {
            if let Some(span) = current.take() {
                detections.extend(span.close(text));
            }
            current = Some(OpenSpan {
                pii_type,
                start: token.start,
                end: token.end,
                confidence: token.score,
            });
        }
    }

    if let Some(span) = current.take() {
        detections.extend(span.close(text));
    }

    detections
}
