//! Error Types
//!
//! Every fallible operation in the crate returns [`Result`]. The reactive and
//! reconciliation layers never catch or retry: an error raised by a render
//! function, a computed definition or a backend call travels back out of the
//! `set` or mount call that triggered it, unchanged.

use thiserror::Error;

use crate::vdom::HostHandle;

/// Boxed error raised by user-supplied code (render functions, computeds).
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Errors produced by the Lumen runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// The store or instance options are malformed or incomplete.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A write kept re-triggering its own notification chain.
    #[error("recursion limit exceeded: notification nested {depth} levels deep")]
    RecursionLimitExceeded {
        /// Nesting depth at which the guard tripped.
        depth: usize,
    },

    /// The reconciler was handed a target it cannot patch against.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// A backend was asked to operate on a handle it never issued.
    #[error("unknown host handle {0:?}")]
    UnknownHandle(HostHandle),

    /// Failure raised by caller-supplied code.
    #[error("{0}")]
    Callback(BoxError),
}

impl Error {
    /// Wrap an arbitrary error raised from user code.
    pub fn callback<E>(err: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::Callback(Box::new(err))
    }

    /// Build a callback error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Callback(message.into().into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
