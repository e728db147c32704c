//! Merge resolver
//!
//! Reconciles candidates from all detection sources into an ordered,
//! non-overlapping list. The filter pass applies the policy (enabled
//! types, source routing, thresholds, allow/deny lists); overlap
//! resolution is a deterministic greedy interval sweep favoring the
//! earliest, highest-priority, highest-confidence candidate. Candidates
//! from different sources with identical spans collapse into a single
//! HYBRID entity.

use crate::models::{Detection, DetectionSource};
use crate::policy::Policy;
use std::cmp::Ordering;

/// Whether a candidate survives the policy filter
///
/// Allowlisted text is dropped unconditionally. Below-threshold candidates
/// are dropped unless their text matches a denylist pattern, which forces
/// retention regardless of threshold.
fn retained(candidate: &Detection, policy: &Policy) -> bool {
    if candidate.is_empty() {
        return false;
    }
    if policy.is_allowlisted(&candidate.text) {
        return false;
    }
    if !policy.enabled_types.contains(&candidate.pii_type) {
        return false;
    }
    if !policy.source_enabled(candidate.pii_type, candidate.source) {
        return false;
    }
    if candidate.confidence < policy.threshold_for(candidate.pii_type)
        && !policy.is_denylisted(&candidate.text)
    {
        return false;
    }
    true
}

/// Resolve candidates into an ordered, non-overlapping detection list
///
/// Sort order: start ascending, then type priority descending, then
/// confidence descending, then span length descending (the deterministic
/// tie-break for candidates equal on all prior keys: longer span wins).
/// The left-to-right sweep then rejects any candidate starting before the
/// end of the last accepted span. Earlier, higher-ranked candidates always
/// win over later or lower-ranked overlapping ones, even if the loser
/// covers a larger span - a deliberate tradeoff favoring precision of the
/// earliest high-confidence match over maximal coverage.
pub fn resolve(candidates: Vec<Detection>, policy: &Policy) -> Vec<Detection> {
    let mut survivors: Vec<Detection> = candidates
        .into_iter()
        .filter(|c| retained(c, policy))
        .collect();

    survivors.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| {
                policy
                    .priority_of(b.pii_type)
                    .cmp(&policy.priority_of(a.pii_type))
            })
            .then_with(|| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.end.cmp(&a.end))
    });

    let mut accepted: Vec<Detection> = Vec::new();
    for candidate in survivors {
        if let Some(last) = accepted.last_mut() {
            if candidate.start < last.end {
                // identical span seen by the other source confirms the
                // accepted entity rather than competing with it
                if candidate.start == last.start
                    && candidate.end == last.end
                    && candidate.pii_type == last.pii_type
                    && candidate.source != last.source
                {
                    last.source = DetectionSource::Hybrid;
                    last.confidence = last.confidence.max(candidate.confidence);
                }
                continue;
            }
        }
        accepted.push(candidate);
    }

    accepted
}
