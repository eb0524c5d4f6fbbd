use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use form_binder::{
    BindingError, ElementAction, FrameDescriptor, FramePath, LiveBindingSource, Navigator,
    SharedNavigator,
};
use scraper::{Html, Selector};

/// An action the navigator received, with the element it landed on.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformedAction {
    pub frames: String,
    pub selector: String,
    pub action: ElementAction,
    /// `data-marker` of the element the selector matched at call time.
    pub target: Option<String>,
}

/// In-memory navigator serving one page per frame path.
///
/// Frames exist when a page is registered for their path. Every call is
/// recorded in `calls` so tests can assert on order and count.
pub struct ScriptedNavigator {
    pages: HashMap<String, String>,
    scheduled: Vec<(usize, String, String)>,
    url: String,
    active: Vec<FrameDescriptor>,
    pub calls: Vec<String>,
    pub actions: Vec<PerformedAction>,
}

impl ScriptedNavigator {
    pub fn new(url: &str, markup: &str) -> Self {
        let mut pages = HashMap::new();
        pages.insert("/".to_string(), markup.to_string());
        ScriptedNavigator {
            pages,
            scheduled: Vec::new(),
            url: url.to_string(),
            active: Vec::new(),
            calls: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn shared(self) -> Rc<RefCell<ScriptedNavigator>> {
        Rc::new(RefCell::new(self))
    }

    pub fn set_page(&mut self, frames: &str, markup: &str) {
        self.pages.insert(frames.to_string(), markup.to_string());
    }

    pub fn remove_page(&mut self, frames: &str) {
        self.pages.remove(frames);
    }

    /// Replace the page at `frames` once `fetches` page sources have been
    /// served.
    pub fn schedule_page(&mut self, fetches: usize, frames: &str, markup: &str) {
        self.scheduled
            .push((fetches, frames.to_string(), markup.to_string()));
    }

    pub fn source_fetches(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| call.starts_with("page_source"))
            .count()
    }

    fn active_key(&self) -> String {
        FramePath::from_descriptors(self.active.clone()).serialize()
    }

    fn enter(&mut self, frame: FrameDescriptor) -> Result<(), BindingError> {
        self.active.push(frame);
        if self.pages.contains_key(&self.active_key()) {
            return Ok(());
        }
        let missing = self.active.pop().map(|f| f.to_string()).unwrap_or_default();
        Err(BindingError::FrameNotPresent { frame: missing })
    }

    fn apply_schedule(&mut self) {
        let served = self.source_fetches();
        let (due, pending): (Vec<_>, Vec<_>) = self
            .scheduled
            .drain(..)
            .partition(|(after, _, _)| *after <= served);
        self.scheduled = pending;
        for (_, frames, markup) in due {
            self.pages.insert(frames, markup);
        }
    }
}

impl Navigator for ScriptedNavigator {
    fn page_source(&mut self) -> Result<String, BindingError> {
        self.apply_schedule();
        let key = self.active_key();
        self.calls.push(format!("page_source {}", key));
        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| BindingError::Session {
                command: "page_source".into(),
                message: format!("no page at {}", key),
            })
    }

    fn current_url(&mut self) -> Result<String, BindingError> {
        self.calls.push("current_url".to_string());
        Ok(self.url.clone())
    }

    fn switch_to_default_content(&mut self) -> Result<(), BindingError> {
        self.calls.push("switch_default".to_string());
        self.active.clear();
        Ok(())
    }

    fn switch_to_frame_index(&mut self, index: usize) -> Result<(), BindingError> {
        self.calls.push(format!("switch_frame {}", index));
        self.enter(FrameDescriptor::Indexed(index))
    }

    fn switch_to_frame_name(&mut self, name: &str) -> Result<(), BindingError> {
        self.calls.push(format!("switch_frame {}", name));
        self.enter(FrameDescriptor::Named(name.to_string()))
    }

    fn perform(&mut self, selector: &str, action: &ElementAction) -> Result<(), BindingError> {
        let key = self.active_key();
        self.calls.push(format!("{} {} {}", action.name(), key, selector));

        let markup = self.pages.get(&key).cloned().unwrap_or_default();
        let document = Html::parse_document(&markup);
        let parsed = Selector::parse(selector).map_err(|e| BindingError::Session {
            command: action.name().into(),
            message: e.to_string(),
        })?;
        let target = document
            .select(&parsed)
            .next()
            .ok_or_else(|| BindingError::Session {
                command: action.name().into(),
                message: format!("no element matches {}", selector),
            })?
            .value()
            .attr("data-marker")
            .map(str::to_string);

        self.actions.push(PerformedAction {
            frames: key,
            selector: selector.to_string(),
            action: action.clone(),
            target,
        });
        Ok(())
    }
}

pub fn live_source(navigator: &Rc<RefCell<ScriptedNavigator>>) -> LiveBindingSource {
    let shared: SharedNavigator = navigator.clone();
    LiveBindingSource::new(shared)
}
