//! Main anonymization engine
//!
//! Orchestrates the pipeline: structured recognizers and the optional
//! inference provider produce candidates, the merge resolver reconciles
//! them, ids are allocated, the output is rendered, the mapping is
//! encrypted, and the leak scan verifies the result.
//!
//! # Degradation
//!
//! A failing individual recognizer is isolated: its failure is logged and
//! the other recognizers' contributions are kept. If the inference call
//! fails, times out, or is cancelled, the pipeline degrades to regex-only
//! results and records the degradation in the statistics rather than
//! failing the call.
//!
//! # Thread Safety
//!
//! The engine can be shared across async tasks via `Arc`. Id-allocation
//! state is the only mutable per-instance state; access is serialized with
//! a mutex that is never held across an await.

use crate::crypto::{self, EncryptedMap, KeyProvider, PiiMap};
use crate::detector::{self, InferenceProvider, Recognizer};
use crate::domain::{RehideError, Result};
use crate::enrich::{enrich_entities, SemanticLookup};
use crate::leak;
use crate::merge;
use crate::models::AnonymizationResult;
use crate::policy::Policy;
use crate::rehydrate;
use crate::render::{allocate_entities, render_text, IdAllocator};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default upper bound for one inference call
const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Main anonymization engine
pub struct AnonymizationEngine {
    policy: Policy,
    recognizers: Vec<Box<dyn Recognizer>>,
    inference: Option<Arc<dyn InferenceProvider>>,
    semantic: Option<Arc<dyn SemanticLookup>>,
    keys: Arc<dyn KeyProvider>,
    allocator: Mutex<IdAllocator>,
    inference_timeout: Duration,
}

impl AnonymizationEngine {
    /// Create an engine for a policy and key provider
    ///
    /// Builds the recognizer collection (built-ins plus the policy's
    /// custom patterns). Soft detection and semantic enrichment stay off
    /// until the corresponding collaborators are attached.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an inconsistent hand-constructed
    /// policy (empty type priority).
    pub fn new(policy: Policy, keys: Arc<dyn KeyProvider>) -> Result<Self> {
        if policy.type_priority.is_empty() {
            return Err(RehideError::Configuration(
                "type priority must not be empty".to_string(),
            ));
        }

        let recognizers = detector::build_recognizers(&policy);
        let allocator = Mutex::new(IdAllocator::new(policy.reuse_ids_for_repeated_pii));

        Ok(Self {
            policy,
            recognizers,
            inference: None,
            semantic: None,
            keys,
            allocator,
            inference_timeout: DEFAULT_INFERENCE_TIMEOUT,
        })
    }

    /// Attach the entity-recognition inference collaborator
    pub fn with_inference_provider(mut self, provider: Arc<dyn InferenceProvider>) -> Self {
        self.inference = Some(provider);
        self
    }

    /// Attach the semantic lookup collaborator
    pub fn with_semantic_lookup(mut self, lookup: Arc<dyn SemanticLookup>) -> Self {
        self.semantic = Some(lookup);
        self
    }

    /// Override the inference timeout
    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    /// Register an additional recognizer
    pub fn with_recognizer(mut self, recognizer: Box<dyn Recognizer>) -> Self {
        self.recognizers.push(recognizer);
        self
    }

    /// Anonymize one text
    ///
    /// # Errors
    ///
    /// Fails only when the mapping cannot be encrypted (key provider or
    /// cipher failure). Detection-side problems degrade instead.
    pub async fn anonymize(&self, text: &str) -> Result<AnonymizationResult> {
        let start = Instant::now();

        let mut candidates = Vec::new();
        for recognizer in &self.recognizers {
            match recognizer.recognize(text) {
                Ok(found) => candidates.extend(found),
                Err(e) => {
                    tracing::warn!(
                        recognizer = recognizer.name(),
                        error = %e,
                        "recognizer failed, keeping remaining sources"
                    );
                }
            }
        }

        let mut inference_degraded = false;
        let mut model_version = None;
        if let Some(provider) = &self.inference {
            if !self.policy.ner_types.is_empty() {
                match tokio::time::timeout(self.inference_timeout, provider.predict(text)).await {
                    Ok(Ok(predictions)) => {
                        model_version = Some(provider.model_version());
                        candidates.extend(detector::ner::normalize_predictions(
                            &predictions,
                            text,
                        ));
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "inference failed, degrading to regex-only");
                        inference_degraded = true;
                    }
                    Err(_) => {
                        tracing::warn!(
                            timeout_ms = self.inference_timeout.as_millis() as u64,
                            "inference timed out, degrading to regex-only"
                        );
                        inference_degraded = true;
                    }
                }
            }
        }

        let resolved = merge::resolve(candidates, &self.policy);
        tracing::debug!(candidates = resolved.len(), "merge resolved");

        let mut entities = {
            let mut allocator = self
                .allocator
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !self.policy.reuse_ids_for_repeated_pii {
                // without reuse, ids start at 1 for every document
                allocator.reset();
            }
            allocate_entities(&resolved, &mut allocator)
        };

        if self.policy.enable_semantic_masking {
            if let Some(lookup) = &self.semantic {
                enrich_entities(&mut entities, text, lookup);
            }
        }

        let anonymized_text = render_text(text, &entities, self.policy.enable_semantic_masking);

        // plaintext map lifetime is scoped to this call
        let map = crypto::build_map(&entities, text);
        let leak_scan_passed = self
            .policy
            .enable_leak_scan
            .then(|| leak::scan(&map, &anonymized_text));
        let pii_map = crypto::encrypt_map(&map, &self.keys)?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            entities = entities.len(),
            processing_time_ms,
            "anonymization complete"
        );

        Ok(AnonymizationResult::new(
            anonymized_text,
            entities,
            pii_map,
            processing_time_ms,
            model_version,
            leak_scan_passed,
            inference_degraded,
        ))
    }

    /// Decrypt an encrypted mapping with the engine's key provider
    pub fn decrypt_map(&self, encrypted: &EncryptedMap) -> Result<PiiMap> {
        crypto::decrypt_map(encrypted, &self.keys)
    }

    /// Decrypt a mapping and substitute placeholder tags in one step
    pub fn rehydrate_encrypted(&self, text: &str, encrypted: &EncryptedMap) -> Result<String> {
        let map = self.decrypt_map(encrypted)?;
        Ok(rehydrate::rehydrate(text, &map))
    }

    /// The engine's policy
    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}
