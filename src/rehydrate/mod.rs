//! Rehydration
//!
//! Reverses placeholder tags back to original values from a decrypted
//! mapping. The input text has typically passed through an external
//! transformation (e.g. translation), so parsing is tolerant: attribute
//! order and unknown attributes are ignored, and a tag whose `TYPE:id` key
//! is absent from the map is left verbatim. Rehydration never errors.

use crate::crypto::PiiMap;
use crate::models::PiiType;
use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<pii\b[^>]*?/>").expect("invalid tag pattern"))
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*"([^"]*)""#).expect("invalid attr pattern")
    })
}

/// Extract the `TYPE:id` mapping key from one tag, reading only the
/// `type` and `id` attributes regardless of position
fn map_key_of(tag: &str) -> Option<String> {
    let mut type_label: Option<String> = None;
    let mut id: Option<u32> = None;

    for capture in attr_regex().captures_iter(tag) {
        let name = capture.get(1)?.as_str();
        let value = capture.get(2)?.as_str();
        match name {
            "type" => {
                // canonicalize known labels (e.g. the CARD alias) so the
                // key matches the one the anonymizer wrote
                let label = PiiType::parse_label(value)
                    .map(|t| t.label().to_string())
                    .unwrap_or_else(|| value.to_uppercase());
                type_label = Some(label);
            }
            "id" => {
                id = value.parse::<u32>().ok().filter(|n| *n > 0);
            }
            _ => {}
        }
    }

    Some(format!("{}:{}", type_label?, id?))
}

/// Replace each recognized placeholder tag with its mapped original value
pub fn rehydrate(text: &str, map: &PiiMap) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0usize;

    for matched in tag_regex().find_iter(text) {
        output.push_str(&text[cursor..matched.start()]);

        let replacement = map_key_of(matched.as_str()).and_then(|key| map.get(&key));
        match replacement {
            Some(value) => output.push_str(value),
            None => output.push_str(matched.as_str()),
        }

        cursor = matched.end();
    }
    output.push_str(&text[cursor..]);

    output
}
