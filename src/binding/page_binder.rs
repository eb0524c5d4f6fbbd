use tracing::info;

use crate::binding::binder::FormBinder;
use crate::binding::bound_model::BoundForm;
use crate::binding::error::BindingError;
use crate::config::binding_config::BindingConfig;
use crate::definition::definition_model::FormKey;
use crate::definition::registry::FormDefinitions;
use crate::source::binding_source::BindingSource;
use crate::wait::cancel::CancellationToken;
use crate::wait::retry::{RetryController, WaitPolicy};

/// Caller-facing entry point: binds forms against one source, waiting for
/// them to appear.
///
/// ```no_run
/// # use form_binder::{FormDefinitions, PageBinder, StaticBindingSource};
/// # fn demo(definitions: &FormDefinitions) -> Result<(), form_binder::BindingError> {
/// let source = StaticBindingSource::new("<form><input name='u'/></form>");
/// let binder = PageBinder::new(definitions, source);
/// let form = binder.bind("login")?;
/// let _user = form.element("username");
/// # Ok(())
/// # }
/// ```
pub struct PageBinder<'d, S> {
    binder: FormBinder<'d>,
    source: S,
    policy: WaitPolicy,
    cancel: CancellationToken,
}

impl<'d, S: BindingSource> PageBinder<'d, S> {
    pub fn new(definitions: &'d FormDefinitions, source: S) -> Self {
        PageBinder {
            binder: FormBinder::new(definitions),
            source,
            policy: WaitPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Binder using the wait settings of a config file.
    pub fn from_config(definitions: &'d FormDefinitions, source: S, config: &BindingConfig) -> Self {
        Self::new(definitions, source).with_policy(config.wait_policy())
    }

    /// Default wait settings for calls without an explicit policy.
    pub fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn binder(&self) -> &FormBinder<'d> {
        &self.binder
    }

    /// Wait for the form `id` of the default group.
    pub fn bind(&self, id: &str) -> Result<BoundForm<'d>, BindingError> {
        self.bind_with(&FormKey::new(id), &self.policy)
    }

    pub fn bind_in_group(&self, group: &str, id: &str) -> Result<BoundForm<'d>, BindingError> {
        self.bind_with(&FormKey::in_group(group, id), &self.policy)
    }

    /// Wait for a form with explicit timeout and poll interval.
    pub fn bind_with(&self, form: &FormKey, policy: &WaitPolicy) -> Result<BoundForm<'d>, BindingError> {
        self.process(form, policy, Ok)
    }

    /// Wait for a form and run `transform` on each successfully bound tree.
    /// A recoverable error from `transform` counts as a failed attempt and
    /// is retried like a binding failure.
    pub fn process<T, F>(
        &self,
        form: &FormKey,
        policy: &WaitPolicy,
        mut transform: F,
    ) -> Result<T, BindingError>
    where
        F: FnMut(BoundForm<'d>) -> Result<T, BindingError>,
    {
        // Unknown forms are fatal and never waited for.
        let definition = self.binder.definitions().get(form)?;

        let controller = RetryController::new(*policy, self.cancel.clone());
        let result = controller.run(form, || {
            let bound = self.binder.bind_definition(&self.source, definition)?;
            transform(bound)
        });

        if result.is_ok() {
            info!(form = %form, "form bound");
        }
        result
    }
}
