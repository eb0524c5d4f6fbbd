use std::rc::Rc;

use ego_tree::NodeId;

use crate::binding::error::BindingError;
use crate::definition::definition_model::{
    AttributeDefinition, ElementDefinition, FormDefinition, FormKey,
};
use crate::frame::frame_path::FramePath;
use crate::source::navigator::{ElementAction, SharedNavigator};
use crate::source::snapshot::DocumentSnapshot;

// ============================================================================
// Bound tree
// ============================================================================

/// A child of a bound form or element.
#[derive(Debug)]
pub enum BoundNode<'d> {
    Element(BoundElement<'d>),
    Attribute(BoundAttribute<'d>),
    Form(BoundForm<'d>),
}

/// A form definition resolved against one document snapshot.
#[derive(Debug)]
pub struct BoundForm<'d> {
    pub(crate) definition: &'d FormDefinition,
    pub(crate) frames: FramePath,
    pub(crate) document: Rc<DocumentSnapshot>,
    pub(crate) nodes: Vec<BoundNode<'d>>,
}

/// An element definition resolved to one concrete document element.
pub struct BoundElement<'d> {
    pub(crate) definition: &'d ElementDefinition,
    pub(crate) form: FormKey,
    pub(crate) frames: FramePath,
    pub(crate) document: Rc<DocumentSnapshot>,
    pub(crate) node_id: NodeId,
    pub(crate) css_selector: String,
    pub(crate) navigator: Option<SharedNavigator>,
    pub(crate) nodes: Vec<BoundNode<'d>>,
}

/// An attribute definition resolved to a value on its parent element.
#[derive(Debug)]
pub struct BoundAttribute<'d> {
    pub(crate) definition: &'d AttributeDefinition,
    pub(crate) value: String,
    pub(crate) absolute_value: Option<String>,
}

// ============================================================================
// BoundForm
// ============================================================================

impl<'d> BoundForm<'d> {
    pub fn definition(&self) -> &'d FormDefinition {
        self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn group(&self) -> &str {
        &self.definition.group
    }

    pub fn key(&self) -> FormKey {
        self.definition.key()
    }

    /// Frame path the form was resolved in.
    pub fn frames(&self) -> &FramePath {
        &self.frames
    }

    pub fn document(&self) -> &DocumentSnapshot {
        &self.document
    }

    pub fn nodes(&self) -> &[BoundNode<'d>] {
        &self.nodes
    }

    /// First bound element with this definition id, in document order,
    /// searching nested elements and referenced forms.
    pub fn element(&self, id: &str) -> Option<&BoundElement<'d>> {
        self.elements_with_id(id).into_iter().next()
    }

    /// Every bound element with this definition id.
    pub fn elements_with_id(&self, id: &str) -> Vec<&BoundElement<'d>> {
        let mut found = Vec::new();
        collect_elements(&self.nodes, id, &mut found);
        found
    }

    pub fn attribute(&self, id: &str) -> Option<&BoundAttribute<'d>> {
        find_attribute(&self.nodes, id)
    }

    /// Referenced forms bound under this one, with their own frame paths.
    pub fn forms(&self) -> Vec<&BoundForm<'d>> {
        let mut found = Vec::new();
        collect_forms(&self.nodes, &mut found);
        found
    }
}

// ============================================================================
// BoundElement
// ============================================================================

impl<'d> BoundElement<'d> {
    pub fn definition(&self) -> &'d ElementDefinition {
        self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Key of the form this element was bound in.
    pub fn form(&self) -> &FormKey {
        &self.form
    }

    pub fn frames(&self) -> &FramePath {
        &self.frames
    }

    pub fn nodes(&self) -> &[BoundNode<'d>] {
        &self.nodes
    }

    /// Selector that re-locates this element in the live page.
    pub fn css_selector(&self) -> &str {
        &self.css_selector
    }

    pub fn is_live(&self) -> bool {
        self.navigator.is_some()
    }

    /// Element as captured at bind time.
    pub fn node(&self) -> Option<scraper::ElementRef<'_>> {
        self.document.element(self.node_id)
    }

    pub fn tag_name(&self) -> String {
        self.node()
            .map(|node| node.value().name().to_string())
            .unwrap_or_default()
    }

    /// All text below the element, concatenated.
    pub fn text(&self) -> String {
        self.node()
            .map(|node| node.text().collect::<String>())
            .unwrap_or_default()
    }

    /// Text of the element's direct text children only.
    pub fn own_text(&self) -> String {
        let Some(node) = self.node() else {
            return String::new();
        };
        let mut text = String::new();
        for child in node.children() {
            if let Some(fragment) = child.value().as_text() {
                text.push_str(fragment);
            }
        }
        text
    }

    pub fn attribute_value(&self, name: &str) -> Option<String> {
        self.document
            .attribute(self.node_id, name)
            .map(str::to_string)
    }

    /// Attribute value resolved against the document location captured at
    /// bind time, for `href`, `src` and the like.
    pub fn absolute_attribute_value(&self, name: &str) -> Option<String> {
        let value = self.document.attribute(self.node_id, name)?;
        self.document.absolutize(value)
    }

    pub fn element(&self, id: &str) -> Option<&BoundElement<'d>> {
        self.elements_with_id(id).into_iter().next()
    }

    pub fn elements_with_id(&self, id: &str) -> Vec<&BoundElement<'d>> {
        let mut found = Vec::new();
        collect_elements(&self.nodes, id, &mut found);
        found
    }

    pub fn attribute(&self, id: &str) -> Option<&BoundAttribute<'d>> {
        find_attribute(&self.nodes, id)
    }

    pub fn click(&self) -> Result<(), BindingError> {
        self.perform(ElementAction::Click)
    }

    pub fn clear(&self) -> Result<(), BindingError> {
        self.perform(ElementAction::Clear)
    }

    pub fn type_text(&self, text: &str) -> Result<(), BindingError> {
        self.perform(ElementAction::Type(text.to_string()))
    }

    pub fn submit(&self) -> Result<(), BindingError> {
        self.perform(ElementAction::Submit)
    }

    /// Re-locate the live element and act on it. Nothing is cached between
    /// calls: the page may have changed since binding.
    fn perform(&self, action: ElementAction) -> Result<(), BindingError> {
        let navigator = self.navigator.as_ref().ok_or_else(|| {
            BindingError::Unsupported(format!(
                "cannot {} element '{}' of form {}: document is not live",
                action.name(),
                self.definition.id,
                self.form
            ))
        })?;
        let mut navigator = navigator
            .try_borrow_mut()
            .map_err(|_| BindingError::session(action.name(), "navigator is already in use"))?;

        self.frames.activate(&mut *navigator)?;
        navigator.perform(&self.css_selector, &action)
    }
}

impl std::fmt::Debug for BoundElement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundElement")
            .field("id", &self.definition.id)
            .field("form", &self.form)
            .field("frames", &self.frames)
            .field("css_selector", &self.css_selector)
            .field("live", &self.navigator.is_some())
            .field("nodes", &self.nodes)
            .finish()
    }
}

// ============================================================================
// BoundAttribute
// ============================================================================

impl<'d> BoundAttribute<'d> {
    pub fn definition(&self) -> &'d AttributeDefinition {
        self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Attribute name that was looked up.
    pub fn name(&self) -> &str {
        &self.definition.lookup
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn absolute_value(&self) -> Option<&str> {
        self.absolute_value.as_deref()
    }
}

// ============================================================================
// Tree search helpers
// ============================================================================

fn collect_elements<'a, 'd>(
    nodes: &'a [BoundNode<'d>],
    id: &str,
    found: &mut Vec<&'a BoundElement<'d>>,
) {
    for node in nodes {
        match node {
            BoundNode::Element(element) => {
                if element.definition.id == id {
                    found.push(element);
                }
                collect_elements(&element.nodes, id, found);
            }
            BoundNode::Form(form) => collect_elements(&form.nodes, id, found),
            BoundNode::Attribute(_) => {}
        }
    }
}

fn collect_forms<'a, 'd>(nodes: &'a [BoundNode<'d>], found: &mut Vec<&'a BoundForm<'d>>) {
    for node in nodes {
        match node {
            BoundNode::Element(element) => collect_forms(&element.nodes, found),
            BoundNode::Form(form) => {
                found.push(form);
                collect_forms(&form.nodes, found);
            }
            BoundNode::Attribute(_) => {}
        }
    }
}

fn find_attribute<'a, 'd>(nodes: &'a [BoundNode<'d>], id: &str) -> Option<&'a BoundAttribute<'d>> {
    nodes.iter().find_map(|node| match node {
        BoundNode::Attribute(attribute) if attribute.definition.id == id => Some(attribute),
        _ => None,
    })
}
