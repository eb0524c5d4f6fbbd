use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binding::error::BindingError;
use crate::definition::definition_model::{FormDefinition, FormKey, NodeDefinition};

/// On-disk shape of a definitions file (YAML or JSON).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionsFile {
    #[serde(default)]
    pub forms: Vec<FormDefinition>,
}

/// Immutable, validated set of form definitions, looked up by id or by
/// `(group, id)`.
#[derive(Debug, Clone, Default)]
pub struct FormDefinitions {
    forms: Vec<FormDefinition>,
    index: HashMap<FormKey, usize>,
}

impl FormDefinitions {
    /// Build and validate a definition set.
    pub fn new(forms: Vec<FormDefinition>) -> Result<Self, BindingError> {
        let mut index = HashMap::new();
        for (position, form) in forms.iter().enumerate() {
            if index.insert(form.key(), position).is_some() {
                return Err(BindingError::InvalidDefinition(format!(
                    "form {} is defined more than once",
                    form.key()
                )));
            }
        }

        let definitions = FormDefinitions { forms, index };
        definitions.validate()?;
        debug!(forms = definitions.forms.len(), "loaded form definitions");
        Ok(definitions)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, BindingError> {
        let file: DefinitionsFile = serde_yaml::from_str(content)?;
        Self::new(file.forms)
    }

    pub fn from_json_str(content: &str) -> Result<Self, BindingError> {
        let file: DefinitionsFile = serde_json::from_str(content)?;
        Self::new(file.forms)
    }

    pub fn load_yaml_file(path: impl AsRef<Path>) -> Result<Self, BindingError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Form in the default (empty) group.
    pub fn form(&self, id: &str) -> Result<&FormDefinition, BindingError> {
        self.get(&FormKey::new(id))
    }

    pub fn form_in_group(&self, group: &str, id: &str) -> Result<&FormDefinition, BindingError> {
        self.get(&FormKey::in_group(group, id))
    }

    pub fn get(&self, key: &FormKey) -> Result<&FormDefinition, BindingError> {
        self.index
            .get(key)
            .map(|&position| &self.forms[position])
            .ok_or_else(|| BindingError::FormNotFound { form: key.clone() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormDefinition> {
        self.forms.iter()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    // ========================================================================
    // Structural validation
    // ========================================================================

    fn validate(&self) -> Result<(), BindingError> {
        for form in &self.forms {
            validate_frame(form, "form", &form.id, form.frame())?;
            self.validate_nodes(form, &form.nodes, false)?;
        }

        let mut states = vec![VisitState::New; self.forms.len()];
        for position in 0..self.forms.len() {
            self.check_cycles(position, &mut states, &mut Vec::new())?;
        }
        Ok(())
    }

    fn validate_nodes(
        &self,
        form: &FormDefinition,
        nodes: &[NodeDefinition],
        inside_element: bool,
    ) -> Result<(), BindingError> {
        for node in nodes {
            match node {
                NodeDefinition::Element(element) => {
                    if element.lookup.trim().is_empty() {
                        return Err(BindingError::InvalidDefinition(format!(
                            "element '{}' in form {} has an empty lookup",
                            element.id,
                            form.key()
                        )));
                    }
                    self.validate_nodes(form, &element.nodes, true)?;
                }
                NodeDefinition::Attribute(attribute) => {
                    if !inside_element {
                        return Err(BindingError::InvalidDefinition(format!(
                            "attribute '{}' in form {} has no parent element",
                            attribute.id,
                            form.key()
                        )));
                    }
                    if attribute.cardinality.is_multiple() {
                        return Err(BindingError::InvalidDefinition(format!(
                            "attribute '{}' in form {} cannot have cardinality {:?}",
                            attribute.id,
                            form.key(),
                            attribute.cardinality
                        )));
                    }
                }
                NodeDefinition::FormReference(reference) => {
                    validate_frame(form, "form reference", &reference.id, reference.frame())?;
                    let target = reference.target(&form.group);
                    if !self.index.contains_key(&target) {
                        return Err(BindingError::InvalidDefinition(format!(
                            "form {} references undefined form {}",
                            form.key(),
                            target
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_cycles(
        &self,
        position: usize,
        states: &mut [VisitState],
        chain: &mut Vec<usize>,
    ) -> Result<(), BindingError> {
        match states[position] {
            VisitState::Done => return Ok(()),
            VisitState::InProgress => {
                let names: Vec<String> = chain
                    .iter()
                    .chain(std::iter::once(&position))
                    .map(|&p| self.forms[p].key().to_string())
                    .collect();
                return Err(BindingError::InvalidDefinition(format!(
                    "cyclic form references: {}",
                    names.join(" -> ")
                )));
            }
            VisitState::New => {}
        }

        states[position] = VisitState::InProgress;
        chain.push(position);

        let form = &self.forms[position];
        let mut targets = Vec::new();
        collect_references(&form.group, &form.nodes, &mut targets);
        for target in targets {
            if let Some(&next) = self.index.get(&target) {
                self.check_cycles(next, states, chain)?;
            }
        }

        chain.pop();
        states[position] = VisitState::Done;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    New,
    InProgress,
    Done,
}

/// A `frame` attribute must name a frame: an empty value cannot be switched
/// into.
fn validate_frame(
    form: &FormDefinition,
    kind: &str,
    id: &str,
    frame: Option<&str>,
) -> Result<(), BindingError> {
    match frame {
        Some(raw) if raw.trim().is_empty() => Err(BindingError::InvalidDefinition(format!(
            "{} '{}' in form {} has an empty frame attribute",
            kind,
            id,
            form.key()
        ))),
        _ => Ok(()),
    }
}

fn collect_references(group: &str, nodes: &[NodeDefinition], out: &mut Vec<FormKey>) {
    for node in nodes {
        match node {
            NodeDefinition::Element(element) => collect_references(group, &element.nodes, out),
            NodeDefinition::FormReference(reference) => out.push(reference.target(group)),
            NodeDefinition::Attribute(_) => {}
        }
    }
}
