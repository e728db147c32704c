//! Data model for the anonymization pipeline
//!
//! Detections are transient scan candidates; entities are the exposed,
//! non-overlapping result items; results carry the rendered text, the
//! encrypted mapping, and per-call statistics.

pub mod entity;
pub mod result;

pub use entity::{Detection, DetectionSource, Entity, PiiType};
pub use result::{AnonymizationResult, AnonymizationStats};
