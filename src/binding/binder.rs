use std::collections::HashMap;
use std::rc::Rc;

use ego_tree::NodeId;
use scraper::Selector;
use tracing::debug;

use crate::binding::bound_model::{BoundAttribute, BoundElement, BoundForm, BoundNode};
use crate::binding::error::BindingError;
use crate::definition::definition_model::{
    AttributeDefinition, CardinalityViolation, ElementDefinition, FormDefinition, FormKey,
    FormReferenceDefinition, NodeDefinition,
};
use crate::definition::registry::FormDefinitions;
use crate::frame::frame_path::FramePath;
use crate::source::binding_source::BindingSource;
use crate::source::navigator::SharedNavigator;
use crate::source::snapshot::DocumentSnapshot;

// ============================================================================
// Per-attempt state
// ============================================================================

/// State owned by a single bind attempt: the binding source and the
/// documents fetched so far, keyed by serialized frame path.
///
/// A context is created when an attempt starts and dropped when it ends, so
/// no document survives into the next attempt.
struct BindContext<'s> {
    source: &'s dyn BindingSource,
    navigator: Option<SharedNavigator>,
    documents: HashMap<String, Rc<DocumentSnapshot>>,
}

impl<'s> BindContext<'s> {
    fn new(source: &'s dyn BindingSource) -> Self {
        BindContext {
            source,
            navigator: source.navigator(),
            documents: HashMap::new(),
        }
    }

    /// Document for `frames`, fetched at most once per attempt.
    fn document(&mut self, frames: &FramePath) -> Result<Rc<DocumentSnapshot>, BindingError> {
        let key = frames.serialize();
        if let Some(document) = self.documents.get(&key) {
            return Ok(Rc::clone(document));
        }

        debug!(frames = %key, "fetching document");
        let document = Rc::new(self.source.document(frames)?);
        self.documents.insert(key, Rc::clone(&document));
        Ok(document)
    }
}

/// Where a group of sibling definitions is being resolved.
struct Scope<'a, 'd> {
    form: &'d FormDefinition,
    frames: &'a FramePath,
    document: &'a Rc<DocumentSnapshot>,
    /// Parent element, or `None` for the whole document.
    parent: Option<NodeId>,
}

// ============================================================================
// FormBinder
// ============================================================================

/// Resolves form definitions into bound trees. A single call is one bind
/// attempt; see [`crate::wait::retry`] for polling.
///
/// The binder holds no per-attempt state and may be reused freely, but a
/// live binding source must not be used from two binds at once.
#[derive(Debug, Clone, Copy)]
pub struct FormBinder<'d> {
    definitions: &'d FormDefinitions,
}

impl<'d> FormBinder<'d> {
    pub fn new(definitions: &'d FormDefinitions) -> Self {
        FormBinder { definitions }
    }

    pub fn definitions(&self) -> &'d FormDefinitions {
        self.definitions
    }

    pub fn bind(&self, source: &dyn BindingSource, id: &str) -> Result<BoundForm<'d>, BindingError> {
        let definition = self.definitions.form(id)?;
        self.bind_definition(source, definition)
    }

    pub fn bind_in_group(
        &self,
        source: &dyn BindingSource,
        group: &str,
        id: &str,
    ) -> Result<BoundForm<'d>, BindingError> {
        let definition = self.definitions.form_in_group(group, id)?;
        self.bind_definition(source, definition)
    }

    /// One bind attempt for an already resolved definition.
    pub fn bind_definition(
        &self,
        source: &dyn BindingSource,
        definition: &'d FormDefinition,
    ) -> Result<BoundForm<'d>, BindingError> {
        let mut context = BindContext::new(source);
        let frames = FramePath::root().append(definition.frame());
        let result = self.bind_form(&mut context, definition, frames, None);

        match &result {
            Ok(form) => debug!(
                form = %form.key(),
                frames = %form.frames(),
                documents = context.documents.len(),
                "bind attempt succeeded"
            ),
            Err(e) => debug!(form = %definition.key(), error = %e, "bind attempt failed"),
        }
        result
    }

    fn bind_form(
        &self,
        context: &mut BindContext<'_>,
        definition: &'d FormDefinition,
        frames: FramePath,
        parent: Option<NodeId>,
    ) -> Result<BoundForm<'d>, BindingError> {
        let document = context.document(&frames)?;
        let scope = Scope {
            form: definition,
            frames: &frames,
            document: &document,
            parent,
        };
        let nodes = self.bind_nodes(context, &scope, &definition.nodes)?;

        Ok(BoundForm {
            definition,
            frames,
            document,
            nodes,
        })
    }

    fn bind_nodes(
        &self,
        context: &mut BindContext<'_>,
        scope: &Scope<'_, 'd>,
        definitions: &'d [NodeDefinition],
    ) -> Result<Vec<BoundNode<'d>>, BindingError> {
        let mut nodes = Vec::new();
        for definition in definitions {
            match definition {
                NodeDefinition::Element(element) => {
                    let bound = self.bind_element(context, scope, element)?;
                    nodes.extend(bound.into_iter().map(BoundNode::Element));
                }
                NodeDefinition::Attribute(attribute) => {
                    if let Some(bound) = self.bind_attribute(scope, attribute)? {
                        nodes.push(BoundNode::Attribute(bound));
                    }
                }
                NodeDefinition::FormReference(reference) => {
                    let bound = self.bind_reference(context, scope, reference)?;
                    nodes.push(BoundNode::Form(bound));
                }
            }
        }
        Ok(nodes)
    }

    fn bind_element(
        &self,
        context: &mut BindContext<'_>,
        scope: &Scope<'_, 'd>,
        definition: &'d ElementDefinition,
    ) -> Result<Vec<BoundElement<'d>>, BindingError> {
        let form = scope.form.key();
        let selector =
            Selector::parse(&definition.lookup).map_err(|e| BindingError::InvalidLookup {
                form: form.clone(),
                element: definition.id.clone(),
                lookup: definition.lookup.clone(),
                reason: e.to_string(),
            })?;

        let matches = scope.document.select(scope.parent, &selector);
        debug!(
            form = %form,
            element = %definition.id,
            lookup = %definition.lookup,
            matches = matches.len(),
            "resolved element lookup"
        );

        definition
            .cardinality
            .check(matches.len())
            .map_err(|violation| match violation {
                CardinalityViolation::Absent => BindingError::ElementNotPresent {
                    form: form.clone(),
                    element: definition.id.clone(),
                },
                CardinalityViolation::TooMany(count) => BindingError::ElementPresentTooManyTimes {
                    form: form.clone(),
                    element: definition.id.clone(),
                    count,
                },
                CardinalityViolation::Prohibited => BindingError::ElementProhibited {
                    form: form.clone(),
                    element: definition.id.clone(),
                },
            })?;

        let mut bound = Vec::with_capacity(matches.len());
        for element in matches {
            let node_id = element.id();
            let child_scope = Scope {
                form: scope.form,
                frames: scope.frames,
                document: scope.document,
                parent: Some(node_id),
            };
            let nodes = self.bind_nodes(context, &child_scope, &definition.nodes)?;

            bound.push(BoundElement {
                definition,
                form: form.clone(),
                frames: scope.frames.clone(),
                document: Rc::clone(scope.document),
                node_id,
                css_selector: scope.document.css_selector(element),
                navigator: context.navigator.clone(),
                nodes,
            });
        }
        Ok(bound)
    }

    fn bind_attribute(
        &self,
        scope: &Scope<'_, 'd>,
        definition: &'d AttributeDefinition,
    ) -> Result<Option<BoundAttribute<'d>>, BindingError> {
        let form = scope.form.key();
        let owner = scope.parent.unwrap_or_else(|| scope.document.root());
        let value = scope.document.attribute(owner, &definition.lookup);

        let count = usize::from(value.is_some());
        definition
            .cardinality
            .check(count)
            .map_err(|violation| match violation {
                CardinalityViolation::Prohibited => BindingError::AttributeProhibited {
                    form: form.clone(),
                    attribute: definition.id.clone(),
                },
                _ => BindingError::AttributeNotPresent {
                    form: form.clone(),
                    attribute: definition.id.clone(),
                },
            })?;

        Ok(value.map(|value| BoundAttribute {
            definition,
            value: value.to_string(),
            absolute_value: scope.document.absolutize(value),
        }))
    }

    /// Nested forms re-enter the frame logic: a `frame` attribute on the
    /// reference moves the referenced form into that frame, where it is
    /// resolved against the frame's whole document. Without one it stays in
    /// the parent's document and scope.
    fn bind_reference(
        &self,
        context: &mut BindContext<'_>,
        scope: &Scope<'_, 'd>,
        reference: &'d FormReferenceDefinition,
    ) -> Result<BoundForm<'d>, BindingError> {
        let target: FormKey = reference.target(&scope.form.group);
        let definition = self.definitions.get(&target)?;

        let frames = scope.frames.append(reference.frame());
        let parent = if frames == *scope.frames {
            scope.parent
        } else {
            None
        };

        debug!(form = %scope.form.key(), reference = %target, frames = %frames, "binding form reference");
        self.bind_form(context, definition, frames, parent)
    }
}
