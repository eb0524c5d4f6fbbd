use std::cell::RefCell;
use std::rc::Rc;

use crate::binding::error::BindingError;

/// An interaction performed on a live element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementAction {
    Click,
    Clear,
    Type(String),
    Submit,
}

impl ElementAction {
    pub fn name(&self) -> &'static str {
        match self {
            ElementAction::Click => "click",
            ElementAction::Clear => "clear",
            ElementAction::Type(_) => "type",
            ElementAction::Submit => "submit",
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            ElementAction::Type(text) => Some(text),
            _ => None,
        }
    }
}

/// A live, navigable page (a browser tab driven by some automation
/// protocol).
///
/// Frame switching is global state of the navigator: after
/// `switch_to_frame_*` every other call addresses that frame until the next
/// switch. Implementations are not reentrant and must not be shared across
/// threads while a bind is in progress.
pub trait Navigator {
    /// Markup of the currently active browsing context.
    fn page_source(&mut self) -> Result<String, BindingError>;

    /// Location of the currently active browsing context.
    fn current_url(&mut self) -> Result<String, BindingError>;

    /// Return to the top-level document.
    fn switch_to_default_content(&mut self) -> Result<(), BindingError>;

    fn switch_to_frame_index(&mut self, index: usize) -> Result<(), BindingError>;

    fn switch_to_frame_name(&mut self, name: &str) -> Result<(), BindingError>;

    /// Find the element matching `selector` in the active context right now
    /// and perform `action` on it.
    fn perform(&mut self, selector: &str, action: &ElementAction) -> Result<(), BindingError>;
}

/// Navigator handle shared between a binding source and the elements bound
/// from it.
pub type SharedNavigator = Rc<RefCell<dyn Navigator>>;
