use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Parsed document captured at one point in time, plus the location it was
/// captured from.
///
/// Elements are addressed by their tree node id so that bound nodes can keep
/// referring to them without borrowing the snapshot.
#[derive(Debug)]
pub struct DocumentSnapshot {
    html: Html,
    base_url: Option<Url>,
}

impl DocumentSnapshot {
    pub fn parse(markup: &str, base_url: Option<Url>) -> Self {
        DocumentSnapshot {
            html: Html::parse_document(markup),
            base_url,
        }
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Element previously returned by [`Self::select`].
    pub fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(node).and_then(ElementRef::wrap)
    }

    pub fn root(&self) -> NodeId {
        self.html.root_element().id()
    }

    /// Matches of `selector` in document order, under `scope` if given or in
    /// the whole document otherwise.
    pub fn select(&self, scope: Option<NodeId>, selector: &Selector) -> Vec<ElementRef<'_>> {
        match scope.and_then(|node| self.element(node)) {
            Some(scope) => scope.select(selector).collect(),
            None => self.html.select(selector).collect(),
        }
    }

    /// Value of `name` on the element `node`.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.value().attr(name)
    }

    /// Resolve a possibly relative URL against the base URL. Absolute values
    /// are returned unchanged; relative ones need a base URL.
    pub fn absolutize(&self, value: &str) -> Option<String> {
        if let Ok(absolute) = Url::parse(value) {
            return Some(absolute.to_string());
        }
        self.base_url
            .as_ref()
            .and_then(|base| base.join(value).ok())
            .map(|resolved| resolved.to_string())
    }

    /// Selector that finds `element` again in a fresh copy of the same
    /// document: `#id` when the element has a document-unique id, otherwise
    /// a `tag:nth-child(n)` chain from the nearest such ancestor (or the
    /// root).
    pub fn css_selector(&self, element: ElementRef<'_>) -> String {
        let mut current = element;
        let mut segments = Vec::new();

        loop {
            if let Some(id) = current.value().id().filter(|id| self.id_is_unique(id)) {
                segments.push(id_selector(id));
                break;
            }

            let tag = current.value().name();
            match current.parent().and_then(ElementRef::wrap) {
                Some(parent) => {
                    let position = 1 + current
                        .prev_siblings()
                        .filter(|sibling| sibling.value().is_element())
                        .count();
                    segments.push(format!("{}:nth-child({})", tag, position));
                    current = parent;
                }
                None => {
                    segments.push(tag.to_string());
                    break;
                }
            }
        }

        segments.reverse();
        segments.join(" > ")
    }

    fn id_is_unique(&self, id: &str) -> bool {
        self.html
            .tree
            .nodes()
            .filter_map(|node| node.value().as_element())
            .filter(|element| element.id() == Some(id))
            .count()
            == 1
    }
}

/// `#id` for plain identifiers, an attribute selector for anything that
/// would need escaping.
fn id_selector(id: &str) -> String {
    let plain = id
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        format!("#{}", id)
    } else {
        format!("[id=\"{}\"]", id.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
