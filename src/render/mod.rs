//! Identifier allocation and placeholder rendering
//!
//! Ids are per-type counters starting at 1, optionally reused for repeated
//! identical values. Rendering computes every final span against the
//! immutable original text first and then builds the output once by
//! stitching original segments and placeholder tags; the source string is
//! never mutated in place, so offsets never drift mid-render.

use crate::models::{Detection, Entity, PiiType};
use std::collections::HashMap;

/// Placeholder tag textual form: a self-closing element carrying `type`,
/// `id`, and optional semantic attributes, in that order.
///
/// Example: `<pii type="EMAIL" id="1"/>`
pub const TAG_NAME: &str = "pii";

/// Per-type id allocator
///
/// With reuse enabled the allocator also remembers the exact values it has
/// assigned, so a repeated identical value keeps its id. Values differing
/// in any byte (casing included) get distinct ids, keeping every `TYPE:id`
/// key bound to exactly one original substring so rehydration restores
/// each occurrence verbatim. Access must be serialized by the caller when
/// one allocator is shared across calls.
#[derive(Debug, Default)]
pub struct IdAllocator {
    counters: HashMap<PiiType, u32>,
    seen: HashMap<(PiiType, String), u32>,
    reuse: bool,
}

impl IdAllocator {
    /// Create an allocator; `reuse` enables the seen-value table
    pub fn new(reuse: bool) -> Self {
        Self {
            counters: HashMap::new(),
            seen: HashMap::new(),
            reuse,
        }
    }

    /// Assign an id for a value of the given type
    pub fn assign(&mut self, pii_type: PiiType, text: &str) -> u32 {
        if self.reuse {
            let key = (pii_type, text.to_string());
            if let Some(id) = self.seen.get(&key) {
                return *id;
            }
            let id = self.next_id(pii_type);
            self.seen.insert(key, id);
            return id;
        }
        self.next_id(pii_type)
    }

    fn next_id(&mut self, pii_type: PiiType) -> u32 {
        let counter = self.counters.entry(pii_type).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Clear all counters and the seen-value table
    pub fn reset(&mut self) {
        self.counters.clear();
        self.seen.clear();
    }
}

/// Convert accepted detections into entities, assigning ids left to right
pub fn allocate_entities(detections: &[Detection], allocator: &mut IdAllocator) -> Vec<Entity> {
    detections
        .iter()
        .map(|d| Entity {
            pii_type: d.pii_type,
            id: allocator.assign(d.pii_type, &d.text),
            start: d.start,
            end: d.end,
            confidence: d.confidence,
            source: d.source,
            attribute: None,
        })
        .collect()
}

/// Render the placeholder tag for one entity
///
/// Semantic attributes are included only when semantic masking is enabled.
pub fn render_tag(entity: &Entity, semantic_masking: bool) -> String {
    match (semantic_masking, &entity.attribute) {
        (true, Some(attr)) => format!(
            "<{TAG_NAME} type=\"{}\" id=\"{}\" {}=\"{}\"/>",
            entity.pii_type.label(),
            entity.id,
            attr.tag_name(),
            attr.tag_value()
        ),
        _ => format!(
            "<{TAG_NAME} type=\"{}\" id=\"{}\"/>",
            entity.pii_type.label(),
            entity.id
        ),
    }
}

/// Build the anonymized text by stitching original segments and tags
///
/// `entities` must be non-overlapping and sorted by start, which the merge
/// resolver guarantees.
pub fn render_text(original: &str, entities: &[Entity], semantic_masking: bool) -> String {
    let mut output = String::with_capacity(original.len());
    let mut cursor = 0usize;

    for entity in entities {
        if let Some(segment) = original.get(cursor..entity.start) {
            output.push_str(segment);
        }
        output.push_str(&render_tag(entity, semantic_masking));
        cursor = entity.end;
    }
    if let Some(tail) = original.get(cursor..) {
        output.push_str(tail);
    }

    output
}
