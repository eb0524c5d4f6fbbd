use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved extra attribute that moves a form into a nested frame.
pub const FRAME_ATTRIBUTE: &str = "frame";

// ============================================================================
// Form identity
// ============================================================================

/// Global identity of a form definition. The default group is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormKey {
    pub group: String,
    pub id: String,
}

impl FormKey {
    pub fn new(id: impl Into<String>) -> Self {
        FormKey {
            group: String::new(),
            id: id.into(),
        }
    }

    pub fn in_group(group: impl Into<String>, id: impl Into<String>) -> Self {
        FormKey {
            group: group.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for FormKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "'{}'", self.id)
        } else {
            write!(f, "'{}' (group '{}')", self.id, self.group)
        }
    }
}

// ============================================================================
// Cardinality
// ============================================================================

/// How many matches a definition expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Exactly one match.
    #[default]
    Required,
    /// Zero or one match.
    Optional,
    /// No match at all.
    Prohibited,
    /// One or more matches.
    RequiredMultiple,
    /// Any number of matches.
    OptionalMultiple,
}

/// Why a match count does not satisfy a [`Cardinality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityViolation {
    Absent,
    TooMany(usize),
    Prohibited,
}

impl Cardinality {
    pub fn is_multiple(self) -> bool {
        matches!(
            self,
            Cardinality::RequiredMultiple | Cardinality::OptionalMultiple
        )
    }

    pub fn check(self, count: usize) -> Result<(), CardinalityViolation> {
        match (self, count) {
            (Cardinality::Required | Cardinality::RequiredMultiple, 0) => {
                Err(CardinalityViolation::Absent)
            }
            (Cardinality::Required | Cardinality::Optional, n) if n > 1 => {
                Err(CardinalityViolation::TooMany(n))
            }
            (Cardinality::Prohibited, n) if n > 0 => Err(CardinalityViolation::Prohibited),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Definition tree
// ============================================================================

/// Root of a definition tree. Binds against a whole document (or a frame of
/// it, when the `frame` attribute is set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default)]
    pub group: String,

    pub id: String,

    /// Extra attributes, e.g. `frame`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

impl FormDefinition {
    pub fn key(&self) -> FormKey {
        FormKey::in_group(self.group.clone(), self.id.clone())
    }

    pub fn frame(&self) -> Option<&str> {
        self.attributes.get(FRAME_ATTRIBUTE).map(String::as_str)
    }
}

/// A child of a form or element definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeDefinition {
    Element(ElementDefinition),
    Attribute(AttributeDefinition),
    FormReference(FormReferenceDefinition),
}

/// Locates zero or more document elements with a CSS selector, scoped to
/// the parent element's match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDefinition {
    pub id: String,

    pub lookup: String,

    #[serde(default)]
    pub cardinality: Cardinality,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

/// Reads one attribute of the parent element. `lookup` is the attribute
/// name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: String,

    pub lookup: String,

    #[serde(default)]
    pub cardinality: Cardinality,
}

/// Embeds another form definition at this point of the tree. With a `frame`
/// attribute the referenced form is bound inside that frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormReferenceDefinition {
    /// Group of the referenced form, defaulting to the referencing form's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    pub id: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl FormReferenceDefinition {
    pub fn frame(&self) -> Option<&str> {
        self.attributes.get(FRAME_ATTRIBUTE).map(String::as_str)
    }

    /// Key of the referenced form, given the group it is referenced from.
    pub fn target(&self, referencing_group: &str) -> FormKey {
        FormKey::in_group(
            self.group
                .clone()
                .unwrap_or_else(|| referencing_group.to_string()),
            self.id.clone(),
        )
    }
}
