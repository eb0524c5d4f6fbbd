//! Declarative form binding for HTML pages.
//!
//! Form definitions describe named elements by CSS lookups. Binding resolves
//! them against a document, either fixed markup or a live browser page, and
//! produces a bound tree whose elements can be read and, for live pages,
//! clicked, cleared, typed into and submitted. Live binding polls until the
//! form shows up or a timeout expires.

pub mod binding;
pub mod browser;
pub mod config;
pub mod definition;
pub mod frame;
pub mod source;
pub mod wait;

pub use binding::binder::FormBinder;
pub use binding::bound_model::{BoundAttribute, BoundElement, BoundForm, BoundNode};
pub use binding::error::BindingError;
pub use binding::page_binder::PageBinder;
pub use config::binding_config::{BindingConfig, load_config};
pub use definition::definition_model::{
    AttributeDefinition, Cardinality, ElementDefinition, FormDefinition, FormKey,
    FormReferenceDefinition, NodeDefinition,
};
pub use definition::registry::FormDefinitions;
pub use frame::frame_path::{FrameDescriptor, FramePath};
pub use source::binding_source::{BindingSource, LiveBindingSource, StaticBindingSource};
pub use source::navigator::{ElementAction, Navigator, SharedNavigator};
pub use source::snapshot::DocumentSnapshot;
pub use wait::cancel::CancellationToken;
pub use wait::retry::{RetryController, WaitPolicy};
