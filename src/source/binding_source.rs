use std::rc::Rc;

use tracing::debug;
use url::Url;

use crate::binding::error::BindingError;
use crate::frame::frame_path::FramePath;
use crate::source::navigator::SharedNavigator;
use crate::source::snapshot::DocumentSnapshot;

/// Produces document snapshots for the binder, one per frame path.
pub trait BindingSource {
    /// Capture and parse the document found at `frames`.
    fn document(&self, frames: &FramePath) -> Result<DocumentSnapshot, BindingError>;

    /// Live navigator behind this source, if any. Bound elements use it to
    /// interact with the page; static sources return `None`.
    fn navigator(&self) -> Option<SharedNavigator>;
}

// ============================================================================
// Live source
// ============================================================================

/// Reads the current page from a live navigator.
#[derive(Clone)]
pub struct LiveBindingSource {
    navigator: SharedNavigator,
}

impl LiveBindingSource {
    pub fn new(navigator: SharedNavigator) -> Self {
        LiveBindingSource { navigator }
    }
}

impl BindingSource for LiveBindingSource {
    fn document(&self, frames: &FramePath) -> Result<DocumentSnapshot, BindingError> {
        // Activation and capture must happen under one borrow: the active
        // frame is global navigator state.
        let mut navigator = self
            .navigator
            .try_borrow_mut()
            .map_err(|_| BindingError::session("page_source", "navigator is already in use"))?;

        frames.activate(&mut *navigator)?;
        let markup = navigator.page_source()?;
        let location = navigator.current_url()?;

        let base_url = match Url::parse(&location) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(location = %location, error = %e, "current location is not a valid base URL");
                None
            }
        };

        debug!(frames = %frames, bytes = markup.len(), "captured live document");
        Ok(DocumentSnapshot::parse(&markup, base_url))
    }

    fn navigator(&self) -> Option<SharedNavigator> {
        Some(Rc::clone(&self.navigator))
    }
}

// ============================================================================
// Static source
// ============================================================================

/// Fixed markup with no navigator behind it.
///
/// Static documents have no frames: any non-root frame path is rejected with
/// [`BindingError::Unsupported`].
#[derive(Debug, Clone)]
pub struct StaticBindingSource {
    markup: String,
    base_url: Option<Url>,
}

impl StaticBindingSource {
    pub fn new(markup: impl Into<String>) -> Self {
        StaticBindingSource {
            markup: markup.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Convenience for a base URL given as text.
    pub fn with_location(self, location: &str) -> Result<Self, BindingError> {
        Ok(self.with_base_url(Url::parse(location)?))
    }
}

impl BindingSource for StaticBindingSource {
    fn document(&self, frames: &FramePath) -> Result<DocumentSnapshot, BindingError> {
        if !frames.is_root() {
            return Err(BindingError::Unsupported(format!(
                "static document has no frames, cannot resolve frame path {}",
                frames
            )));
        }
        Ok(DocumentSnapshot::parse(&self.markup, self.base_url.clone()))
    }

    fn navigator(&self) -> Option<SharedNavigator> {
        None
    }
}
