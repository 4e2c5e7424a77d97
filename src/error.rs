use thiserror::Error;

use std::num::TryFromIntError;

/// Errors produced by the acceleration core.
///
/// Every public entry point returns one of these five kinds; there is no
/// partial-success path. [`Error::Host`] is special: the core never
/// actually returns it to its own caller (instance materialization always
/// falls back to an unknown-object representation), but a [`ClassRegistry`]
/// implementation can use it to report a degraded construction outcome to
/// its own logging.
///
/// [`ClassRegistry`]: crate::typetree::ClassRegistry
#[derive(Debug, Error)]
pub enum Error {
    #[error("read of {needed} byte(s) at offset {offset} exceeds buffer of {available} byte(s)")]
    Bounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid argument: {message}")]
    Argument { message: String },

    #[error("schema violation at offset {offset} in node {node}: {message}")]
    Schema {
        offset: usize,
        node: String,
        message: String,
    },

    #[error("reference resolution failed: {message}")]
    Resolution { message: String },

    #[error("host class registry could not construct {class}: {message}")]
    Host { class: String, message: String },

    #[error("{source}")]
    TryFromInt {
        #[from]
        source: TryFromIntError,
    },
}

impl Error {
    pub(crate) fn bounds(offset: usize, needed: usize, available: usize) -> Self {
        Error::Bounds {
            offset,
            needed,
            available,
        }
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Error::Argument {
            message: message.into(),
        }
    }

    pub(crate) fn schema(offset: usize, node: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema {
            offset,
            node: node.into(),
            message: message.into(),
        }
    }

    pub(crate) fn resolution(message: impl Into<String>) -> Self {
        Error::Resolution {
            message: message.into(),
        }
    }
}
