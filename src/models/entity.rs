//! PII types, detections, and result entities

use crate::enrich::SemanticAttribute;
use serde::{Deserialize, Serialize};

/// PII type enumeration
///
/// Structured types are found by pattern/checksum recognizers; soft types
/// come from the model-based inference provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiType {
    /// Email addresses
    Email,
    /// Telephone numbers
    Phone,
    /// International bank account numbers (mod-97 checksummed)
    Iban,
    /// Bank identifier codes (SWIFT)
    Bic,
    /// Payment card numbers (Luhn checksummed)
    CreditCard,
    /// IP addresses
    IpAddress,
    /// Web URLs
    Url,
    /// Person names
    Person,
    /// Organization names
    #[serde(rename = "ORG")]
    Organization,
    /// Geographic locations
    Location,
    /// Dates of birth
    DateOfBirth,
    /// Postal addresses
    Address,
}

impl PiiType {
    /// All known types, structured first
    pub fn all() -> &'static [PiiType] {
        &[
            Self::Email,
            Self::Phone,
            Self::Iban,
            Self::Bic,
            Self::CreditCard,
            Self::IpAddress,
            Self::Url,
            Self::Person,
            Self::Organization,
            Self::Location,
            Self::DateOfBirth,
            Self::Address,
        ]
    }

    /// Label used in placeholder tags and mapping keys
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Iban => "IBAN",
            Self::Bic => "BIC",
            Self::CreditCard => "CREDIT_CARD",
            Self::IpAddress => "IP_ADDRESS",
            Self::Url => "URL",
            Self::Person => "PERSON",
            Self::Organization => "ORG",
            Self::Location => "LOCATION",
            Self::DateOfBirth => "DATE_OF_BIRTH",
            Self::Address => "ADDRESS",
        }
    }

    /// Parse a tag or mapping-key label back into a type
    pub fn parse_label(s: &str) -> Option<PiiType> {
        match s.to_uppercase().as_str() {
            "EMAIL" => Some(Self::Email),
            "PHONE" => Some(Self::Phone),
            "IBAN" => Some(Self::Iban),
            "BIC" => Some(Self::Bic),
            "CREDIT_CARD" | "CARD" => Some(Self::CreditCard),
            "IP_ADDRESS" | "IP" => Some(Self::IpAddress),
            "URL" => Some(Self::Url),
            "PERSON" => Some(Self::Person),
            "ORG" | "ORGANIZATION" => Some(Self::Organization),
            "LOCATION" => Some(Self::Location),
            "DATE_OF_BIRTH" => Some(Self::DateOfBirth),
            "ADDRESS" => Some(Self::Address),
            _ => None,
        }
    }

    /// Whether this type is detected by structured recognizers
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Self::Email
                | Self::Phone
                | Self::Iban
                | Self::Bic
                | Self::CreditCard
                | Self::IpAddress
                | Self::Url
        )
    }
}

/// Detection source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectionSource {
    /// Pattern/checksum recognizer
    Regex,
    /// Model-based entity recognition
    Ner,
    /// Confirmed by both sources at the same span
    Hybrid,
}

/// A detection candidate produced during scanning
///
/// Transient: carries the matched substring only until it is consumed by
/// the merge resolver and mapping cryptography, and is never persisted.
#[derive(Debug, Clone)]
pub struct Detection {
    /// PII type
    pub pii_type: PiiType,
    /// Byte offset of the match start in the original text
    pub start: usize,
    /// Byte offset one past the match end (half-open)
    pub end: usize,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Source that produced this candidate
    pub source: DetectionSource,
    /// Matched substring
    pub text: String,
}

impl Detection {
    /// Create a new detection, clamping confidence into [0, 1]
    pub fn new(
        pii_type: PiiType,
        start: usize,
        end: usize,
        confidence: f32,
        source: DetectionSource,
        text: impl Into<String>,
    ) -> Self {
        Self {
            pii_type,
            start,
            end,
            confidence: confidence.clamp(0.0, 1.0),
            source,
            text: text.into(),
        }
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span is empty
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// An accepted, rendered PII entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// PII type
    #[serde(rename = "type")]
    pub pii_type: PiiType,
    /// Per-type identifier, starting at 1 per document
    pub id: u32,
    /// Byte offset of the span start in the original text
    pub start: usize,
    /// Byte offset one past the span end (half-open)
    pub end: usize,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Source that produced this entity
    pub source: DetectionSource,
    /// Optional semantic attribute added by the enricher
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub attribute: Option<SemanticAttribute>,
}

impl Entity {
    /// Mapping key of the form `TYPE:id`
    pub fn map_key(&self) -> String {
        format!("{}:{}", self.pii_type.label(), self.id)
    }
}
