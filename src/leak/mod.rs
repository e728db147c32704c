//! Leak scanner
//!
//! Post-hoc verification that no original value survives verbatim in the
//! rendered output. Runs against the plaintext table before it is
//! discarded; the verdict is advisory and never raises an error - the
//! caller decides whether to reject degraded output.

use crate::crypto::PiiMap;

/// Values shorter than this are trivial noise and skipped
const MIN_VALUE_CHARS: usize = 3;

/// Scan the rendered text for surviving original values
///
/// Returns `true` when no original value above the minimum length occurs
/// verbatim in the output.
pub fn scan(map: &PiiMap, rendered: &str) -> bool {
    let mut passed = true;
    for (key, value) in map {
        if value.chars().count() < MIN_VALUE_CHARS {
            continue;
        }
        if rendered.contains(value.as_str()) {
            // the value itself must not be logged
            tracing::warn!(key = %key, "original value survived in rendered output");
            passed = false;
        }
    }
    passed
}
