use std::sync::Arc;

use snafu::Snafu;

/// A generic error type.
///
/// Failures raised by wrapped computations travel through suppliers as this type, untouched. Callers who need the
/// original error back can use [`downcast_ref`][anyhow::Error::downcast_ref].
pub type GenericError = anyhow::Error;

/// Supply error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum SupplyError {
    /// No value is, or ever will be, present.
    #[snafu(display("no value present"))]
    Absent,

    /// Another caller was computing the value, and that computation failed while this caller waited on it.
    ///
    /// The message is the failed computation's own.
    #[snafu(display("{}", message))]
    ComputationFailed {
        /// Message of the failed computation's error.
        message: Arc<str>,
    },
}

impl SupplyError {
    /// Converts this error into a [`GenericError`].
    pub fn into_generic(self) -> GenericError {
        GenericError::new(self)
    }
}

/// Adapter construction error.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum AdapterError {
    /// An opaque producer was given without a determinism classification to pair it with.
    #[snafu(display("determinism must be given when the producer does not report its own"))]
    MissingDeterminism,
}

/// Returns `true` if the given error signals the absent-value condition.
///
/// Context attached with `anyhow` does not hide the condition.
pub fn is_absent(error: &GenericError) -> bool {
    matches!(error.downcast_ref::<SupplyError>(), Some(SupplyError::Absent))
}
