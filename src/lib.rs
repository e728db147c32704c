// Rehide - Reversible PII Anonymization
// Copyright (c) 2025 Rehide Contributors
// Licensed under the MIT License

//! # Rehide - Reversible PII Anonymization
//!
//! Rehide detects personally identifiable information (PII) in free text,
//! replaces each occurrence with a placeholder tag, and retains an encrypted
//! mapping so the original values can be restored (rehydrated) after the
//! placeholder text has passed through an external process — typically
//! machine translation — that preserves the tags verbatim.
//!
//! ## Pipeline
//!
//! 1. **Detection** - structured recognizers (pattern + checksum) and an
//!    optional model-based inference provider scan the input.
//! 2. **Merge** - candidates are filtered by the [`policy::Policy`] and
//!    reconciled into an ordered, non-overlapping entity list.
//! 3. **Rendering** - per-type ids are allocated and placeholder tags are
//!    stitched into the output text.
//! 4. **Encryption** - the id-to-original mapping is sealed with
//!    AES-256-GCM using a key obtained from the caller's key provider.
//! 5. **Rehydration** - a separate operation that substitutes tags back to
//!    originals from a decrypted mapping.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rehide::crypto::StaticKeyProvider;
//! use rehide::engine::AnonymizationEngine;
//! use rehide::policy::Policy;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), rehide::RehideError> {
//! let keys = Arc::new(StaticKeyProvider::new([0u8; 32]));
//! let engine = AnonymizationEngine::new(Policy::default(), keys)?;
//!
//! let result = engine.anonymize("Contact john@example.com").await?;
//! println!("{}", result.anonymized_text);
//!
//! let restored = engine.rehydrate_encrypted(&result.anonymized_text, &result.pii_map)?;
//! assert_eq!(restored, "Contact john@example.com");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`models`] - detections, entities, results, statistics
//! - [`policy`] - immutable policy value with explicit merge semantics
//! - [`detector`] - structured recognizers, checksums, NER normalization
//! - [`merge`] - policy filtering and overlap resolution
//! - [`render`] - id allocation and offset-stable tag rendering
//! - [`enrich`] - optional semantic attribute lookup
//! - [`crypto`] - encrypted mapping store (AES-256-GCM)
//! - [`leak`] - post-render leak scanning
//! - [`rehydrate`] - tag parsing and substitution
//! - [`engine`] - pipeline orchestration
//!
//! External collaborators (inference, key custody, semantic lookup tables)
//! are injected through traits; Rehide owns no network protocol or file
//! format of its own.

pub mod crypto;
pub mod detector;
pub mod domain;
pub mod engine;
pub mod enrich;
pub mod leak;
pub mod merge;
pub mod models;
pub mod policy;
pub mod rehydrate;
pub mod render;

pub use domain::{RehideError, Result};
pub use engine::AnonymizationEngine;
pub use models::{AnonymizationResult, Detection, DetectionSource, Entity, PiiType};
pub use policy::{Policy, PolicyOverrides};
