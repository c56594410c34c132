//! Error types for request rendering.
//!
//! Rendering can only fail before any item is produced: once a [`Request`]
//! passes validation, the sequence is always computable. Cancellation by the
//! consumer is a normal termination path and is not represented here.
//!
//! [`Request`]: crate::Request

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that the renderer can report.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A numeric parameter was below its minimum of 1.
    #[error("{field} parameter must be >= 1, value {value} was given")]
    InvalidParameter { field: &'static str, value: i64 },
}

impl Error {
    /// The name of the offending request field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidParameter { field, .. } => field,
        }
    }
}
