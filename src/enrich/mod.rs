//! Semantic enrichment
//!
//! Optional, purely additive attributes looked up from an external
//! collaborator: a gender category for person names and a scope category
//! for locations. Lookup failure or ambiguity degrades silently to "no
//! attribute" and never blocks the pipeline.

use crate::models::{Entity, PiiType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Gender category for PERSON entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Neutral,
}

impl Gender {
    /// Attribute value as rendered in placeholder tags
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Neutral => "neutral",
        }
    }
}

/// Scope category for LOCATION entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationScope {
    City,
    Country,
    Region,
}

impl LocationScope {
    /// Attribute value as rendered in placeholder tags
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Country => "country",
            Self::Region => "region",
        }
    }
}

/// A semantic attribute attached to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticAttribute {
    Gender(Gender),
    Scope(LocationScope),
}

impl SemanticAttribute {
    /// Tag attribute name (`gender` or `scope`)
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Gender(_) => "gender",
            Self::Scope(_) => "scope",
        }
    }

    /// Tag attribute value
    pub fn tag_value(&self) -> &'static str {
        match self {
            Self::Gender(g) => g.as_str(),
            Self::Scope(s) => s.as_str(),
        }
    }
}

/// External semantic lookup collaborator
///
/// Implementations resolve an entity's text to an optional attribute.
/// Returning `None` on any failure or ambiguity is the contract; the
/// enricher never changes span, type, or confidence.
pub trait SemanticLookup: Send + Sync {
    /// Look up an attribute for the given entity text and type
    fn enrich(&self, entity_text: &str, pii_type: PiiType) -> Option<SemanticAttribute>;
}

/// Attach attributes to PERSON and LOCATION entities in place
pub fn enrich_entities(
    entities: &mut [Entity],
    original_text: &str,
    lookup: &Arc<dyn SemanticLookup>,
) {
    for entity in entities.iter_mut() {
        if !matches!(entity.pii_type, PiiType::Person | PiiType::Location) {
            continue;
        }
        let Some(text) = original_text.get(entity.start..entity.end) else {
            continue;
        };
        entity.attribute = lookup.enrich(text, entity.pii_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectionSource;

    struct TableLookup;

    impl SemanticLookup for TableLookup {
        fn enrich(&self, entity_text: &str, pii_type: PiiType) -> Option<SemanticAttribute> {
            match (entity_text, pii_type) {
                ("Maria", PiiType::Person) => {
                    Some(SemanticAttribute::Gender(Gender::Female))
                }
                ("Berlin", PiiType::Location) => {
                    Some(SemanticAttribute::Scope(LocationScope::City))
                }
                _ => None,
            }
        }
    }

    fn entity(pii_type: PiiType, start: usize, end: usize) -> Entity {
        Entity {
            pii_type,
            id: 1,
            start,
            end,
            confidence: 0.9,
            source: DetectionSource::Ner,
            attribute: None,
        }
    }

    #[test]
    fn test_enrich_person_and_location() {
        let text = "Maria visited Berlin";
        let mut entities = vec![
            entity(PiiType::Person, 0, 5),
            entity(PiiType::Location, 14, 20),
        ];
        let lookup: Arc<dyn SemanticLookup> = Arc::new(TableLookup);

        enrich_entities(&mut entities, text, &lookup);

        assert_eq!(
            entities[0].attribute,
            Some(SemanticAttribute::Gender(Gender::Female))
        );
        assert_eq!(
            entities[1].attribute,
            Some(SemanticAttribute::Scope(LocationScope::City))
        );
    }

    #[test]
    fn test_unknown_value_degrades_to_none() {
        let text = "Bob visited Atlantis";
        let mut entities = vec![
            entity(PiiType::Person, 0, 3),
            entity(PiiType::Location, 12, 20),
        ];
        let lookup: Arc<dyn SemanticLookup> = Arc::new(TableLookup);

        enrich_entities(&mut entities, text, &lookup);

        assert_eq!(entities[0].attribute, None);
        assert_eq!(entities[1].attribute, None);
    }

    #[test]
    fn test_non_person_location_types_skipped() {
        let text = "Maria";
        let mut entities = vec![entity(PiiType::Email, 0, 5)];
        let lookup: Arc<dyn SemanticLookup> = Arc::new(TableLookup);

        enrich_entities(&mut entities, text, &lookup);

        assert_eq!(entities[0].attribute, None);
    }

    #[test]
    fn test_tag_name_value() {
        let attr = SemanticAttribute::Scope(LocationScope::Country);
        assert_eq!(attr.tag_name(), "scope");
        assert_eq!(attr.tag_value(), "country");
    }
}
