//! Integration tests for the anonymization pipeline with synthetic documents

use async_trait::async_trait;
use rehide::crypto::StaticKeyProvider;
use rehide::detector::{InferenceProvider, TokenPrediction};
use rehide::policy::PolicyOverrides;
use rehide::{AnonymizationEngine, DetectionSource, PiiType, Policy, RehideError};
use std::sync::Arc;

fn create_test_engine(policy: Policy) -> AnonymizationEngine {
    AnonymizationEngine::new(policy, Arc::new(StaticKeyProvider::new([7u8; 32])))
        .expect("Failed to create engine")
}

/// Replays a fixed prediction list regardless of input
struct ScriptedInference {
    predictions: Vec<TokenPrediction>,
}

#[async_trait]
impl InferenceProvider for ScriptedInference {
    async fn predict(&self, _text: &str) -> rehide::Result<Vec<TokenPrediction>> {
        Ok(self.predictions.clone())
    }

    fn model_version(&self) -> String {
        "scripted-test-1".to_string()
    }
}

#[tokio::test]
async fn test_structured_detection_end_to_end() {
    let engine = create_test_engine(Policy::default());
    let text = "Contact john@example.com or call +49 30 123456.";

    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert_eq!(result.entities.len(), 2);
    assert_eq!(result.entities[0].pii_type, PiiType::Email);
    assert_eq!(result.entities[1].pii_type, PiiType::Phone);
    assert_eq!(
        result.anonymized_text,
        "Contact <pii type=\"EMAIL\" id=\"1\"/> or call <pii type=\"PHONE\" id=\"1\"/>."
    );
    assert_eq!(result.stats.total_entities, 2);
    assert_eq!(result.stats.counts_by_type.get(&PiiType::Email), Some(&1));
    assert_eq!(result.stats.leak_scan_passed, Some(true));
}

#[tokio::test]
async fn test_checksummed_types_detected_with_high_confidence() {
    let engine = create_test_engine(Policy::default());
    let text = "IBAN DE89370400440532013000, card 4111111111111111";

    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    let types: Vec<PiiType> = result.entities.iter().map(|e| e.pii_type).collect();
    assert!(types.contains(&PiiType::Iban));
    assert!(types.contains(&PiiType::CreditCard));
    for entity in &result.entities {
        assert!(entity.confidence >= 0.95);
    }
}

#[tokio::test]
async fn test_invalid_checksums_rejected() {
    let engine = create_test_engine(Policy::default());
    // both fail their checksum, so neither is a detection
    let text = "IBAN DE00370400440532013000, card 4111111111111112";

    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert!(result
        .entities
        .iter()
        .all(|e| e.pii_type != PiiType::Iban && e.pii_type != PiiType::CreditCard));
}

#[tokio::test]
async fn test_roundtrip_restores_original_text() {
    let engine = create_test_engine(Policy::default());
    let text = "Mail jane@example.org, visit https://example.org/a, ip 10.0.0.1";

    let result = engine.anonymize(text).await.expect("Failed to anonymize");
    assert!(result.has_entities());
    assert!(!result.anonymized_text.contains("jane@example.org"));

    let restored = engine
        .rehydrate_encrypted(&result.anonymized_text, &result.pii_map)
        .expect("Failed to rehydrate");
    assert_eq!(restored, text);
}

#[tokio::test]
async fn test_id_reuse_for_repeated_values() {
    let policy = Policy::merge(PolicyOverrides {
        reuse_ids_for_repeated_pii: Some(true),
        ..Default::default()
    })
    .expect("Failed to merge policy");
    let engine = create_test_engine(policy);

    let text = "First jane@example.org, then jane@example.org, then bob@example.org";
    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert_eq!(result.entities.len(), 3);
    assert_eq!(result.entities[0].id, 1);
    assert_eq!(result.entities[1].id, 1);
    assert_eq!(result.entities[2].id, 2);

    let restored = engine
        .rehydrate_encrypted(&result.anonymized_text, &result.pii_map)
        .expect("Failed to rehydrate");
    assert_eq!(restored, text);
}

#[tokio::test]
async fn test_case_differing_repeats_get_distinct_ids() {
    let policy = Policy::merge(PolicyOverrides {
        reuse_ids_for_repeated_pii: Some(true),
        ..Default::default()
    })
    .expect("Failed to merge policy");
    let engine = create_test_engine(policy);

    // casing variants are different original values, so each needs its own
    // mapping entry or the first occurrence would rehydrate wrong
    let text = "First jane@example.org then JANE@EXAMPLE.ORG done";
    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert_eq!(result.entities.len(), 2);
    assert_eq!(result.entities[0].id, 1);
    assert_eq!(result.entities[1].id, 2);

    let restored = engine
        .rehydrate_encrypted(&result.anonymized_text, &result.pii_map)
        .expect("Failed to rehydrate");
    assert_eq!(restored, text);
}

#[tokio::test]
async fn test_repeated_values_get_distinct_ids_without_reuse() {
    let engine = create_test_engine(Policy::default());

    let text = "First jane@example.org, then jane@example.org";
    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert_eq!(result.entities.len(), 2);
    assert_eq!(result.entities[0].id, 1);
    assert_eq!(result.entities[1].id, 2);
}

#[tokio::test]
async fn test_ner_and_regex_sources_combined() {
    let text = "Angela Merkel can be reached at am@example.de";
    let inference = ScriptedInference {
        predictions: vec![
            TokenPrediction {
                label: "B-PER".to_string(),
                start: 0,
                end: 6,
                score: 0.98,
            },
            TokenPrediction {
                label: "I-PER".to_string(),
                start: 7,
                end: 13,
                score: 0.96,
            },
        ],
    };
    let engine =
        create_test_engine(Policy::default()).with_inference_provider(Arc::new(inference));

    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert_eq!(result.entities.len(), 2);
    assert_eq!(result.entities[0].pii_type, PiiType::Person);
    assert_eq!(result.entities[0].source, DetectionSource::Ner);
    // span confidence is the minimum over the merged tokens
    assert!((result.entities[0].confidence - 0.96).abs() < 1e-6);
    assert_eq!(result.entities[1].pii_type, PiiType::Email);
    assert!(result
        .anonymized_text
        .starts_with("<pii type=\"PERSON\" id=\"1\"/>"));
    assert_eq!(
        result.stats.model_version.as_deref(),
        Some("scripted-test-1")
    );
    assert!(!result.stats.inference_degraded);
}

#[tokio::test]
async fn test_custom_pattern_participates_in_pipeline() {
    use rehide::policy::CustomPatternSpec;

    let policy = Policy::merge(PolicyOverrides {
        custom_patterns: vec![CustomPatternSpec {
            name: "employee_id".to_string(),
            pattern: r"EMP-\d{6}".to_string(),
            pii_type: PiiType::Person,
        }],
        ..Default::default()
    })
    .expect("Failed to merge policy");
    let engine = create_test_engine(policy);

    let text = "Badge EMP-004711 checked in";
    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.entities[0].pii_type, PiiType::Person);

    let restored = engine
        .rehydrate_encrypted(&result.anonymized_text, &result.pii_map)
        .expect("Failed to rehydrate");
    assert_eq!(restored, text);
}

#[tokio::test]
async fn test_overlap_resolved_by_priority() {
    let text = "Write to john@example.com today";
    // a NER span covering the email must lose to the higher-priority EMAIL
    let inference = ScriptedInference {
        predictions: vec![TokenPrediction {
            label: "B-PER".to_string(),
            start: 9,
            end: 25,
            score: 0.99,
        }],
    };
    let engine =
        create_test_engine(Policy::default()).with_inference_provider(Arc::new(inference));

    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.entities[0].pii_type, PiiType::Email);
}

#[tokio::test]
async fn test_allowlist_suppresses_detection() {
    let policy = Policy::merge(PolicyOverrides {
        allowlist_terms: Some(vec!["support@example.com".to_string()]),
        ..Default::default()
    })
    .expect("Failed to merge policy");
    let engine = create_test_engine(policy);

    let text = "Route to support@example.com, escalate to jane@example.org";
    let result = engine.anonymize(text).await.expect("Failed to anonymize");

    assert_eq!(result.entities.len(), 1);
    assert!(result.anonymized_text.contains("support@example.com"));
    assert!(!result.anonymized_text.contains("jane@example.org"));
}

#[tokio::test]
async fn test_wrong_key_cannot_rehydrate() {
    let engine = create_test_engine(Policy::default());
    let result = engine
        .anonymize("mail jane@example.org")
        .await
        .expect("Failed to anonymize");

    let other = AnonymizationEngine::new(
        Policy::default(),
        Arc::new(StaticKeyProvider::new([8u8; 32])),
    )
    .expect("Failed to create engine");

    let err = other
        .rehydrate_encrypted(&result.anonymized_text, &result.pii_map)
        .expect_err("Decryption with the wrong key must fail");
    assert!(matches!(err, RehideError::InvalidKeyOrCorruptedMap));
}
