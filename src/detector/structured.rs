//! Built-in structured recognizers
//!
//! One compiled pattern per identifier class, with an optional checksum
//! gate. Checksum-passing matches get high confidence; checksum-less
//! types get a fixed, slightly lower pattern-only confidence.

use super::checksum::{iban_valid, luhn_valid};
use super::Recognizer;
use crate::domain::Result;
use crate::models::{Detection, DetectionSource, PiiType};
use regex::Regex;

/// Confidence for checksum-validated matches
const CHECKSUM_CONFIDENCE: f32 = 0.95;
/// Confidence for pattern-only matches
const PATTERN_CONFIDENCE: f32 = 0.85;

/// Checksum gate applied after the structural match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChecksumKind {
    None,
    Iban,
    Luhn,
}

/// A single pattern-based recognizer
pub struct PatternRecognizer {
    name: String,
    regex: Regex,
    pii_type: PiiType,
    confidence: f32,
    checksum: ChecksumKind,
}

impl PatternRecognizer {
    fn builtin(name: &str, pattern: &str, pii_type: PiiType, checksum: ChecksumKind) -> Self {
        let confidence = match checksum {
            ChecksumKind::None => PATTERN_CONFIDENCE,
            _ => CHECKSUM_CONFIDENCE,
        };
        Self {
            name: name.to_string(),
            // built-in patterns are compile-time constants
            regex: Regex::new(pattern).expect("invalid built-in pattern"),
            pii_type,
            confidence,
            checksum,
        }
    }

    /// Recognizer for a caller-registered custom pattern
    pub fn custom(name: String, regex: Regex, pii_type: PiiType) -> Self {
        Self {
            name,
            regex,
            pii_type,
            confidence: PATTERN_CONFIDENCE,
            checksum: ChecksumKind::None,
        }
    }

    /// Apply the checksum gate; a failing checksum discards the match
    fn passes_checksum(&self, matched: &str) -> bool {
        match self.checksum {
            ChecksumKind::None => true,
            ChecksumKind::Iban => iban_valid(matched),
            ChecksumKind::Luhn => {
                let digits: String = matched.chars().filter(char::is_ascii_digit).collect();
                (13..=19).contains(&digits.len()) && luhn_valid(&digits)
            }
        }
    }
}

impl Recognizer for PatternRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, text: &str) -> Result<Vec<Detection>> {
        let mut detections = Vec::new();

        for matched in self.regex.find_iter(text) {
            if !self.passes_checksum(matched.as_str()) {
                continue;
            }
            detections.push(Detection::new(
                self.pii_type,
                matched.start(),
                matched.end(),
                self.confidence,
                DetectionSource::Regex,
                matched.as_str(),
            ));
        }

        Ok(detections)
    }
}

/// The built-in recognizer set
pub fn builtin_recognizers() -> Vec<PatternRecognizer> {
    vec![
        PatternRecognizer::builtin(
            "email",
            r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}",
            PiiType::Email,
            ChecksumKind::None,
        ),
        PatternRecognizer::builtin(
            "phone",
            r"\+?\d[\d\s()\-/.]{5,}\d",
            PiiType::Phone,
            ChecksumKind::None,
        ),
        PatternRecognizer::builtin(
            "iban",
            r"\b[A-Z]{2}\d{2}[A-Z0-9]{11,30}\b",
            PiiType::Iban,
            ChecksumKind::Iban,
        ),
        PatternRecognizer::builtin(
            "bic",
            r"\b[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}(?:[A-Z0-9]{3})?\b",
            PiiType::Bic,
            ChecksumKind::None,
        ),
        PatternRecognizer::builtin(
            "credit_card",
            r"\b(?:\d[ \-]?){12,18}\d\b",
            PiiType::CreditCard,
            ChecksumKind::Luhn,
        ),
        PatternRecognizer::builtin(
            "ip_address",
            r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
            PiiType::IpAddress,
            ChecksumKind::None,
        ),
        PatternRecognizer::builtin(
            "url",
            r#"https?://[^\s<>"']+"#,
            PiiType::Url,
            ChecksumKind::None,
        ),
    ]
}
