use thiserror::Error;

use crate::definition::definition_model::FormKey;

/// Everything that can go wrong while binding a form or interacting with a
/// bound element.
///
/// Errors fall into two families. Recoverable failures mean "not there yet"
/// and are retried by the wait loop until its deadline. Everything else is
/// raised to the caller immediately.
#[derive(Debug, Error)]
pub enum BindingError {
    /// No form definition with this key exists.
    #[error("Form {form} is not defined")]
    FormNotFound { form: FormKey },

    /// The wait loop ran out of time without recording a concrete failure.
    #[error("Form {form} is not present")]
    FormNotPresent { form: FormKey },

    /// A required element matched nothing.
    #[error("Element '{element}' is not present in form {form}")]
    ElementNotPresent { form: FormKey, element: String },

    /// A single-valued element matched more than once.
    #[error("Element '{element}' is present {count} times in form {form}, expected at most one")]
    ElementPresentTooManyTimes {
        form: FormKey,
        element: String,
        count: usize,
    },

    /// A prohibited element matched.
    #[error("Element '{element}' is prohibited but present in form {form}")]
    ElementProhibited { form: FormKey, element: String },

    /// A required attribute is missing on its parent element.
    #[error("Attribute '{attribute}' is not present in form {form}")]
    AttributeNotPresent { form: FormKey, attribute: String },

    /// A prohibited attribute is set on its parent element.
    #[error("Attribute '{attribute}' is prohibited but present in form {form}")]
    AttributeProhibited { form: FormKey, attribute: String },

    /// The lookup expression could not be parsed by the selector engine.
    #[error("Invalid lookup '{lookup}' for '{element}' in form {form}: {reason}")]
    InvalidLookup {
        form: FormKey,
        element: String,
        lookup: String,
        reason: String,
    },

    /// The navigator could not switch into a frame, usually because it has
    /// not been attached to the page yet.
    #[error("Frame '{frame}' is not present")]
    FrameNotPresent { frame: String },

    /// The operation needs a live navigator but the source is static.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The wait loop was cancelled while sleeping between attempts.
    #[error("Binding was cancelled")]
    Cancelled,

    /// The definition tree is structurally broken (detected at load time).
    #[error("Invalid form definition: {0}")]
    InvalidDefinition(String),

    /// The driver process could not be started.
    #[error("Failed to spawn driver '{command}': {source}")]
    DriverSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The navigator transport or protocol failed.
    #[error("Navigator session error ({command}): {message}")]
    Session { command: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl BindingError {
    /// Whether the wait loop should try again after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BindingError::ElementNotPresent { .. }
                | BindingError::ElementPresentTooManyTimes { .. }
                | BindingError::ElementProhibited { .. }
                | BindingError::AttributeNotPresent { .. }
                | BindingError::AttributeProhibited { .. }
                | BindingError::InvalidLookup { .. }
                | BindingError::FrameNotPresent { .. }
        )
    }

    pub(crate) fn session(command: &str, message: impl Into<String>) -> Self {
        BindingError::Session {
            command: command.to_string(),
            message: message.into(),
        }
    }
}
