use std::fmt;
use std::str::FromStr;

use crate::binding::error::BindingError;
use crate::source::navigator::Navigator;

/// One step into a nested browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameDescriptor {
    /// The n-th frame of the current context.
    Indexed(usize),
    /// The frame whose name or id attribute matches.
    Named(String),
}

impl FrameDescriptor {
    /// Parse a raw `frame` attribute value. Integers select by index,
    /// anything else selects by name.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(index) => FrameDescriptor::Indexed(index),
            Err(_) => FrameDescriptor::Named(raw.to_string()),
        }
    }

    /// Switch the navigator one level down into this frame.
    pub fn switch_to(&self, navigator: &mut dyn Navigator) -> Result<(), BindingError> {
        match self {
            FrameDescriptor::Indexed(index) => navigator.switch_to_frame_index(*index),
            FrameDescriptor::Named(name) => navigator.switch_to_frame_name(name),
        }
    }
}

impl FromStr for FrameDescriptor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FrameDescriptor::parse(s))
    }
}

impl fmt::Display for FrameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameDescriptor::Indexed(index) => write!(f, "{}", index),
            FrameDescriptor::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Ordered chain of frames from the top-level document down to the context
/// a form lives in. The empty path is the top-level document.
///
/// Paths are immutable: [`FramePath::append`] returns a new path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FramePath {
    frames: Vec<FrameDescriptor>,
}

impl FramePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_descriptors(frames: Vec<FrameDescriptor>) -> Self {
        FramePath { frames }
    }

    /// Child path for a definition's optional `frame` attribute. `None`
    /// yields a path equal to `self`.
    pub fn append(&self, frame: Option<&str>) -> FramePath {
        match frame {
            Some(raw) => self.with(FrameDescriptor::parse(raw)),
            None => self.clone(),
        }
    }

    pub fn with(&self, descriptor: FrameDescriptor) -> FramePath {
        let mut frames = self.frames.clone();
        frames.push(descriptor);
        FramePath { frames }
    }

    pub fn descriptors(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    pub fn is_root(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Stable textual key, `/` for the root and `/0/login` for nested paths.
    ///
    /// Segments are not escaped: a frame named `a/b` serializes the same as
    /// the two frames `a` and `b`. An empty frame name is written as `""` so
    /// that it never serializes like the top-level document.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Reset the navigator to the top-level document, then descend through
    /// every frame in order.
    pub fn activate(&self, navigator: &mut dyn Navigator) -> Result<(), BindingError> {
        navigator.switch_to_default_content()?;
        for frame in &self.frames {
            frame.switch_to(navigator)?;
        }
        Ok(())
    }
}

impl fmt::Display for FramePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return write!(f, "/");
        }
        for frame in &self.frames {
            match frame {
                FrameDescriptor::Named(name) if name.is_empty() => write!(f, "/\"\"")?,
                _ => write!(f, "/{}", frame)?,
            }
        }
        Ok(())
    }
}
