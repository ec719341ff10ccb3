use thiserror::Error;

/// Everything that can go wrong while drawing.
///
/// Geometry problems (degenerate arcs, empty clips, zero-length dashes...) are
/// never reported as errors, they simply produce empty output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Surface dimensions exceed the supported range")]
    InvalidSize,
    #[error("Matrix is not invertible")]
    InvalidMatrix,
    #[error("Out of memory")]
    NoMemory,
    #[error("Input data is truncated or corrupt")]
    ReadError,
    #[error("restore() without a matching save()")]
    InvalidRestore,
    #[error("pop_group() without a matching push_group()")]
    InvalidPopGroup,
    #[error("No current point")]
    NoCurrentPoint,
    #[error("Invalid dash pattern")]
    InvalidDash,
    #[error("The target surface has already been finished")]
    SurfaceFinished,
}

pub type Result<T> = std::result::Result<T, Error>;

/// An error state that, once set, can not be cleared anymore.
///
/// Only the first error is remembered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Status(Option<Error>);

impl Status {
    pub(crate) fn set(&mut self, error: Error) {
        if self.0.is_none() {
            log::warn!("Entering error state: {error}");
            self.0 = Some(error);
        }
    }

    #[must_use]
    pub(crate) fn is_error(&self) -> bool {
        self.0.is_some()
    }

    pub(crate) fn get(&self) -> Result<()> {
        match self.0 {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Record the error of `result`, if any
    pub(crate) fn check<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.set(error);
                None
            },
        }
    }
}
