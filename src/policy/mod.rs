//! Detection policy
//!
//! The policy is an immutable value constructed once and reused across
//! anonymize calls. Partial configuration is applied through an explicit
//! field-documented merge: every field overrides the default wholesale
//! except the confidence thresholds, which overlay the default table
//! key-by-key. All pattern compilation happens here, so malformed custom
//! or denylist patterns fail at setup time, before any text is scanned.

use crate::domain::{RehideError, Result};
use crate::models::{DetectionSource, PiiType};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Default confidence threshold for structured (pattern-detected) types
pub const DEFAULT_STRUCTURED_THRESHOLD: f32 = 0.5;
/// Default confidence threshold for soft (model-detected) types
pub const DEFAULT_SOFT_THRESHOLD: f32 = 0.7;

/// Custom identifier pattern, as supplied by the caller
#[derive(Debug, Clone, Deserialize)]
pub struct CustomPatternSpec {
    /// Diagnostic name, required non-empty
    pub name: String,
    /// Regex source
    pub pattern: String,
    /// PII type assigned to matches
    #[serde(rename = "type")]
    pub pii_type: PiiType,
}

/// Compiled custom identifier pattern
#[derive(Debug, Clone)]
pub struct CustomPattern {
    pub name: String,
    pub regex: Regex,
    pub pii_type: PiiType,
}

/// Partial policy configuration
///
/// Every `Some` field replaces the default wholesale; `confidence_thresholds`
/// is overlaid per key instead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyOverrides {
    pub enabled_types: Option<Vec<PiiType>>,
    pub regex_types: Option<Vec<PiiType>>,
    pub ner_types: Option<Vec<PiiType>>,
    pub confidence_thresholds: HashMap<PiiType, f32>,
    pub allowlist_terms: Option<Vec<String>>,
    pub denylist_patterns: Option<Vec<String>>,
    pub custom_patterns: Vec<CustomPatternSpec>,
    pub type_priority: Option<Vec<PiiType>>,
    pub reuse_ids_for_repeated_pii: Option<bool>,
    pub enable_semantic_masking: Option<bool>,
    pub enable_leak_scan: Option<bool>,
}

/// Immutable detection policy
#[derive(Debug, Clone)]
pub struct Policy {
    /// Types eligible for detection at all
    pub enabled_types: HashSet<PiiType>,
    /// Types routed to structured (regex) detection
    pub regex_types: HashSet<PiiType>,
    /// Types routed to model (NER) detection
    pub ner_types: HashSet<PiiType>,
    /// Per-type confidence thresholds
    pub confidence_thresholds: HashMap<PiiType, f32>,
    /// Terms never treated as PII (compared case-insensitively, stored lowercased)
    pub allowlist_terms: HashSet<String>,
    /// Patterns whose matches are retained even below threshold
    pub denylist_patterns: Vec<Regex>,
    /// Caller-registered identifier patterns
    pub custom_patterns: Vec<CustomPattern>,
    /// Priority order, low to high
    pub type_priority: Vec<PiiType>,
    /// Reuse ids for repeated identical values
    pub reuse_ids_for_repeated_pii: bool,
    /// Render semantic attributes into placeholder tags
    pub enable_semantic_masking: bool,
    /// Run the post-render leak scan
    pub enable_leak_scan: bool,
}

impl Default for Policy {
    fn default() -> Self {
        let mut confidence_thresholds = HashMap::new();
        for pii_type in PiiType::all() {
            let threshold = if pii_type.is_structured() {
                DEFAULT_STRUCTURED_THRESHOLD
            } else {
                DEFAULT_SOFT_THRESHOLD
            };
            confidence_thresholds.insert(*pii_type, threshold);
        }

        Self {
            enabled_types: PiiType::all().iter().copied().collect(),
            regex_types: PiiType::all()
                .iter()
                .copied()
                .filter(PiiType::is_structured)
                .collect(),
            ner_types: PiiType::all()
                .iter()
                .copied()
                .filter(|t| !t.is_structured())
                .collect(),
            confidence_thresholds,
            allowlist_terms: HashSet::new(),
            denylist_patterns: Vec::new(),
            custom_patterns: Vec::new(),
            type_priority: default_priority(),
            reuse_ids_for_repeated_pii: false,
            enable_semantic_masking: false,
            enable_leak_scan: true,
        }
    }
}

/// Default priority, ascending from generic soft types to highly specific
/// checksummed types
fn default_priority() -> Vec<PiiType> {
    vec![
        PiiType::Address,
        PiiType::Person,
        PiiType::Organization,
        PiiType::Location,
        PiiType::DateOfBirth,
        PiiType::Url,
        PiiType::IpAddress,
        PiiType::Phone,
        PiiType::Email,
        PiiType::Bic,
        PiiType::CreditCard,
        PiiType::Iban,
    ]
}

impl Policy {
    /// Merge partial overrides over the defaults
    ///
    /// # Errors
    ///
    /// Fails on a malformed denylist or custom pattern, an empty custom
    /// pattern name, an empty allowlist term, or an out-of-range threshold.
    pub fn merge(overrides: PolicyOverrides) -> Result<Self> {
        let mut policy = Policy::default();

        if let Some(types) = overrides.enabled_types {
            policy.enabled_types = types.into_iter().collect();
        }
        if let Some(types) = overrides.regex_types {
            policy.regex_types = types.into_iter().collect();
        }
        if let Some(types) = overrides.ner_types {
            policy.ner_types = types.into_iter().collect();
        }

        // Thresholds overlay the default table key-by-key
        for (pii_type, threshold) in overrides.confidence_thresholds {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(RehideError::Configuration(format!(
                    "threshold for {} out of range: {threshold}",
                    pii_type.label()
                )));
            }
            policy.confidence_thresholds.insert(pii_type, threshold);
        }

        if let Some(terms) = overrides.allowlist_terms {
            let mut allowlist = HashSet::new();
            for term in terms {
                if term.trim().is_empty() {
                    return Err(RehideError::Configuration(
                        "empty allowlist term".to_string(),
                    ));
                }
                allowlist.insert(term.to_lowercase());
            }
            policy.allowlist_terms = allowlist;
        }

        if let Some(patterns) = overrides.denylist_patterns {
            let mut compiled = Vec::with_capacity(patterns.len());
            for source in &patterns {
                let regex = Regex::new(source).map_err(|e| RehideError::Pattern {
                    name: "denylist".to_string(),
                    message: e.to_string(),
                })?;
                compiled.push(regex);
            }
            policy.denylist_patterns = compiled;
        }

        for spec in overrides.custom_patterns {
            if spec.name.trim().is_empty() {
                return Err(RehideError::Configuration(
                    "custom pattern name must not be empty".to_string(),
                ));
            }
            let regex = Regex::new(&spec.pattern).map_err(|e| RehideError::Pattern {
                name: spec.name.clone(),
                message: e.to_string(),
            })?;
            // registering a pattern for a type implies regex routing for it
            policy.enabled_types.insert(spec.pii_type);
            policy.regex_types.insert(spec.pii_type);
            policy.custom_patterns.push(CustomPattern {
                name: spec.name,
                regex,
                pii_type: spec.pii_type,
            });
        }

        if let Some(priority) = overrides.type_priority {
            if priority.is_empty() {
                return Err(RehideError::Configuration(
                    "type priority must not be empty".to_string(),
                ));
            }
            policy.type_priority = priority;
        }

        if let Some(reuse) = overrides.reuse_ids_for_repeated_pii {
            policy.reuse_ids_for_repeated_pii = reuse;
        }
        if let Some(semantic) = overrides.enable_semantic_masking {
            policy.enable_semantic_masking = semantic;
        }
        if let Some(leak) = overrides.enable_leak_scan {
            policy.enable_leak_scan = leak;
        }

        Ok(policy)
    }

    /// Priority rank of a type; higher wins in overlap resolution
    pub fn priority_of(&self, pii_type: PiiType) -> usize {
        self.type_priority
            .iter()
            .position(|t| *t == pii_type)
            // types missing from the order rank lowest
            .map_or(0, |pos| pos + 1)
    }

    /// Effective confidence threshold for a type
    pub fn threshold_for(&self, pii_type: PiiType) -> f32 {
        self.confidence_thresholds
            .get(&pii_type)
            .copied()
            .unwrap_or(if pii_type.is_structured() {
                DEFAULT_STRUCTURED_THRESHOLD
            } else {
                DEFAULT_SOFT_THRESHOLD
            })
    }

    /// Whether a detection source is enabled for a type
    pub fn source_enabled(&self, pii_type: PiiType, source: DetectionSource) -> bool {
        match source {
            DetectionSource::Regex => self.regex_types.contains(&pii_type),
            DetectionSource::Ner => self.ner_types.contains(&pii_type),
            DetectionSource::Hybrid => true,
        }
    }

    /// Whether the term is allowlisted (case-insensitive equality)
    pub fn is_allowlisted(&self, text: &str) -> bool {
        self.allowlist_terms.contains(&text.to_lowercase())
    }

    /// Whether the text matches any denylist pattern
    pub fn is_denylisted(&self, text: &str) -> bool {
        self.denylist_patterns.iter().any(|p| p.is_match(text))
    }
}

/// Custom pattern library loaded from TOML
///
/// ```toml
/// [patterns.employee_id]
/// pattern = "EMP-\\d{6}"
/// type = "PERSON"
/// ```
#[derive(Debug, Deserialize)]
struct PatternLibraryFile {
    patterns: HashMap<String, PatternLibraryEntry>,
}

#[derive(Debug, Deserialize)]
struct PatternLibraryEntry {
    pattern: String,
    #[serde(rename = "type")]
    pii_type: String,
}

/// Load custom pattern specs from a TOML pattern library
pub fn pattern_library_from_toml(content: &str) -> Result<Vec<CustomPatternSpec>> {
    let library: PatternLibraryFile = toml::from_str(content)?;

    let mut specs = Vec::with_capacity(library.patterns.len());
    for (name, entry) in library.patterns {
        let pii_type = PiiType::parse_label(&entry.pii_type).ok_or_else(|| {
            RehideError::Configuration(format!(
                "unknown PII type '{}' in pattern '{name}'",
                entry.pii_type
            ))
        })?;
        specs.push(CustomPatternSpec {
            name,
            pattern: entry.pattern,
            pii_type,
        });
    }
    // deterministic registration order regardless of TOML table iteration
    specs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(specs)
}

/// Load custom pattern specs from a TOML pattern library file
pub fn pattern_library_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<CustomPatternSpec>> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        RehideError::Configuration(format!(
            "failed to read pattern library {}: {e}",
            path.as_ref().display()
        ))
    })?;
    pattern_library_from_toml(&content)
}
