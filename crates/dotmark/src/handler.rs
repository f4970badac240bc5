use crate::error::Error;
use crate::function::Function;
use std::cell::Cell;
use tracing::error;

/// Decides what happens when a call fails to expand. `recover` replaces the call's output with
/// a visible error marker.
pub trait ErrorHandler {
    fn handle(
        &self,
        error: &Error,
        function: Option<&Function>,
        recover: &mut dyn FnMut(&Error),
    ) -> Result<(), Error>;
}

/// Logs the error and keeps compiling.
#[derive(Debug, Default)]
pub struct LogErrorHandler {
    errors: Cell<usize>,
}

impl LogErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors handled so far.
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }
}

impl ErrorHandler for LogErrorHandler {
    fn handle(
        &self,
        error: &Error,
        function: Option<&Function>,
        recover: &mut dyn FnMut(&Error),
    ) -> Result<(), Error> {
        self.errors.set(self.errors.get() + 1);
        match function {
            Some(function) => {
                error!(function = %function.name, kind = %error.kind(), "{}", error)
            }
            None => error!(kind = %error.kind(), "{}", error),
        }
        recover(error);
        Ok(())
    }
}

/// Aborts the compilation on the first error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictErrorHandler;

impl ErrorHandler for StrictErrorHandler {
    fn handle(
        &self,
        error: &Error,
        _function: Option<&Function>,
        _recover: &mut dyn FnMut(&Error),
    ) -> Result<(), Error> {
        Err(error.clone())
    }
}
