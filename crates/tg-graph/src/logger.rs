use tracing::Dispatch;
use tracing::subscriber::NoSubscriber;

/// Where an accumulator sends its diagnostics.
///
/// Holds an explicit [`Dispatch`] instead of relying on the process-wide
/// default. The default logger discards everything, even when the host
/// application has installed a global subscriber.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    #[must_use]
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    #[must_use]
    pub fn discard() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    #[must_use]
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.dispatch.is::<NoSubscriber>()
    }

    /// Run `f` with this logger as the current dispatcher.
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::discard()
    }
}
