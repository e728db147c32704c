//! Anonymization result and statistics

use super::entity::{Entity, PiiType};
use crate::crypto::EncryptedMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-call statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymizationStats {
    /// Number of entities per PII type
    pub counts_by_type: HashMap<PiiType, usize>,
    /// Total entity count
    pub total_entities: usize,
    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: u64,
    /// Version reported by the inference provider, if one ran
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub model_version: Option<String>,
    /// Leak scan verdict; absent when the scan is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub leak_scan_passed: Option<bool>,
    /// Set when the inference provider failed or timed out and the call
    /// fell back to regex-only results
    #[serde(default)]
    pub inference_degraded: bool,
}

/// Result of one anonymize call
///
/// The caller owns persistence of `pii_map`; Rehide retains nothing after
/// the call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymizationResult {
    /// Text with every accepted detection replaced by a placeholder tag
    pub anonymized_text: String,
    /// Accepted entities, pairwise non-overlapping, sorted by start
    pub entities: Vec<Entity>,
    /// Encrypted id-to-original mapping
    pub pii_map: EncryptedMap,
    /// Per-call statistics
    pub stats: AnonymizationStats,
    /// Timestamp of the anonymization
    pub timestamp: DateTime<Utc>,
}

impl AnonymizationResult {
    /// Build a result, deriving the per-type counts from the entity list
    pub fn new(
        anonymized_text: String,
        entities: Vec<Entity>,
        pii_map: EncryptedMap,
        processing_time_ms: u64,
        model_version: Option<String>,
        leak_scan_passed: Option<bool>,
        inference_degraded: bool,
    ) -> Self {
        let mut counts_by_type = HashMap::new();
        for entity in &entities {
            *counts_by_type.entry(entity.pii_type).or_insert(0) += 1;
        }

        let stats = AnonymizationStats {
            counts_by_type,
            total_entities: entities.len(),
            processing_time_ms,
            model_version,
            leak_scan_passed,
            inference_degraded,
        };

        Self {
            anonymized_text,
            entities,
            pii_map,
            stats,
            timestamp: Utc::now(),
        }
    }

    /// Whether any PII was detected
    pub fn has_entities(&self) -> bool {
        !self.entities.is_empty()
    }
}
